use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use cotiza_core::domain::product::{Product, ProductId};

use crate::llm::{json_span, LlmClient};
use crate::text::{is_horsepower, tokenize};

/// Most candidates ever offered for one query.
pub const MAX_MATCHES: usize = 3;

/// Finds catalog products for a free-text query fragment.
#[async_trait]
pub trait ProductMatcher: Send + Sync {
    async fn match_exact(&self, catalog: &[Product], query: &str) -> Vec<Product>;
    async fn match_similar(&self, catalog: &[Product], query: &str) -> Vec<Product>;
}

/// Deterministic matcher over sku, description and technical data tokens.
#[derive(Clone, Copy, Debug, Default)]
pub struct KeywordProductMatcher;

fn product_tokens(product: &Product) -> HashSet<String> {
    let mut haystack = format!("{} {} {}", product.sku, product.description, product.technical_text());
    if let Some(cfm) = &product.cfm {
        haystack.push(' ');
        haystack.push_str(cfm);
        haystack.push_str(" cfm");
    }
    tokenize(&haystack).into_iter().collect()
}

fn token_weight(token: &str) -> usize {
    if is_horsepower(token) {
        2
    } else {
        1
    }
}

#[async_trait]
impl ProductMatcher for KeywordProductMatcher {
    async fn match_exact(&self, catalog: &[Product], query: &str) -> Vec<Product> {
        let wanted = tokenize(query);
        if wanted.is_empty() {
            return Vec::new();
        }

        catalog
            .iter()
            .filter(|product| {
                let tokens = product_tokens(product);
                wanted.iter().all(|token| tokens.contains(token))
            })
            .take(MAX_MATCHES)
            .cloned()
            .collect()
    }

    async fn match_similar(&self, catalog: &[Product], query: &str) -> Vec<Product> {
        let wanted = tokenize(query);
        let mut scored: Vec<(usize, &Product)> = catalog
            .iter()
            .map(|product| {
                let tokens = product_tokens(product);
                let score = wanted
                    .iter()
                    .filter(|token| tokens.contains(*token))
                    .map(|token| token_weight(token))
                    .sum();
                (score, product)
            })
            .filter(|(score, _)| *score > 0)
            .collect();

        // stable sort keeps catalog order between equal scores
        scored.sort_by(|left, right| right.0.cmp(&left.0));
        scored.into_iter().take(MAX_MATCHES).map(|(_, product)| product.clone()).collect()
    }
}

const EXACT_PROMPT: &str = "Eres un asistente virtual de ventas de compresores de aire. Busca \
en el catálogo los productos que coincidan con lo que pide el usuario, prestando atención al \
tipo de compresor (pistón, tornillo, scroll), la potencia del motor (HP), el volumen del tanque \
y el SKU si se menciona. Si no hay coincidencias exactas responde [].";

const SIMILAR_PROMPT: &str = "Eres un asistente virtual de ventas de compresores de aire. No hay \
coincidencias exactas para lo que pide el usuario. Sugiere productos parecidos: la potencia (HP) \
más cercana, el mismo tipo de compresor, un volumen de tanque aproximado o un SKU con patrón \
similar.";

/// Matcher that asks a chat model to pick catalog ids.
pub struct LlmProductMatcher {
    client: Arc<dyn LlmClient>,
}

impl LlmProductMatcher {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    async fn pick(&self, instructions: &str, catalog: &[Product], query: &str) -> Vec<Product> {
        if catalog.is_empty() {
            return Vec::new();
        }
        let prompt = build_prompt(instructions, catalog, query);
        match self.client.complete(&prompt).await {
            Ok(reply) => {
                let picked = products_from_reply(&reply, catalog);
                debug!(
                    event_name = "agent.matcher.llm_reply",
                    query,
                    picked = picked.len(),
                    "llm matcher reply parsed"
                );
                picked
            }
            Err(error) => {
                warn!(
                    event_name = "agent.matcher.llm_failed",
                    query,
                    error = %error,
                    "llm product match failed"
                );
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl ProductMatcher for LlmProductMatcher {
    async fn match_exact(&self, catalog: &[Product], query: &str) -> Vec<Product> {
        self.pick(EXACT_PROMPT, catalog, query).await
    }

    async fn match_similar(&self, catalog: &[Product], query: &str) -> Vec<Product> {
        self.pick(SIMILAR_PROMPT, catalog, query).await
    }
}

fn build_prompt(instructions: &str, catalog: &[Product], query: &str) -> String {
    let mut prompt = String::from(instructions);
    prompt.push_str("\n\nCatálogo (id | sku | descripción | datos técnicos | cfm):\n");
    for product in catalog {
        prompt.push_str(&format!(
            "{} | {} | {} | {} | {}\n",
            product.id,
            product.sku,
            product.description,
            product.technical_text().replace('\n', " "),
            product.cfm.as_deref().unwrap_or("-"),
        ));
    }
    prompt.push_str(&format!(
        "\nMensaje del usuario: \"{query}\"\n\nResponde solo con un array JSON de hasta \
         {MAX_MATCHES} ids del catálogo, por ejemplo [12, 40]."
    ));
    prompt
}

/// Maps the ids in a model reply back onto the catalog. Unknown ids are
/// dropped; any parse problem yields no products.
fn products_from_reply(reply: &str, catalog: &[Product]) -> Vec<Product> {
    let Some(span) = json_span(reply, '[', ']') else {
        return Vec::new();
    };
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(span) else {
        return Vec::new();
    };

    let mut picked: Vec<Product> = Vec::new();
    for item in items {
        let id = match &item {
            Value::Object(object) => object.get("id").and_then(id_from_value),
            other => id_from_value(other),
        };
        let Some(id) = id else { continue };
        if picked.iter().any(|product| product.id == id) {
            continue;
        }
        if let Some(product) = catalog.iter().find(|product| product.id == id) {
            picked.push(product.clone());
        }
        if picked.len() == MAX_MATCHES {
            break;
        }
    }
    picked
}

fn id_from_value(value: &Value) -> Option<ProductId> {
    match value {
        Value::Number(number) => number.as_i64().map(ProductId),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    use cotiza_core::domain::product::{Product, ProductId};

    use super::{
        products_from_reply, KeywordProductMatcher, LlmProductMatcher, ProductMatcher,
        MAX_MATCHES,
    };
    use crate::llm::LlmClient;

    fn product(id: i64, sku: &str, description: &str, technical: &str) -> Product {
        Product {
            id: ProductId(id),
            sku: sku.to_owned(),
            description: description.to_owned(),
            data_technical: Some(technical.to_owned()),
            sale: Some(Decimal::new(1_000, 0)),
            cfm: None,
        }
    }

    fn catalog() -> Vec<Product> {
        vec![
            product(1, "1001.2000-1", "Compresor de pistón 20 HP", "Potencia: 20 HP"),
            product(2, "1001.2500-1", "Compresor de tornillo 25 HP", "Potencia: 25 HP"),
            product(3, "2002.0100-4", "Tanque vertical 100 litros", "Volumen: 100 lts"),
            product(4, "1001.1500-2", "Compresor de pistón 15 HP", "Potencia: 15 HP"),
            product(5, "1001.2001-1", "Compresor silencioso 20 HP", "Potencia: 20 HP"),
        ]
    }

    #[tokio::test]
    async fn exact_requires_every_token() {
        let found = KeywordProductMatcher.match_exact(&catalog(), "compresor 20hp").await;
        let ids: Vec<i64> = found.iter().map(|product| product.id.0).collect();
        assert_eq!(ids, vec![1, 5]);

        let sku = KeywordProductMatcher.match_exact(&catalog(), "sku 2002.0100-4").await;
        assert!(sku.is_empty(), "`sku` itself is not part of any product");

        let bare_sku = KeywordProductMatcher.match_exact(&catalog(), "2002.0100-4").await;
        assert_eq!(bare_sku.first().map(|product| product.id), Some(ProductId(3)));
    }

    #[tokio::test]
    async fn similar_weights_horsepower_and_caps_results() {
        let found = KeywordProductMatcher.match_similar(&catalog(), "compresor tornillo 20 hp").await;
        let ids: Vec<i64> = found.iter().map(|product| product.id.0).collect();

        assert_eq!(found.len(), MAX_MATCHES);
        assert_eq!(ids, vec![1, 5, 2]);
    }

    #[tokio::test]
    async fn similar_is_empty_without_shared_tokens() {
        assert!(KeywordProductMatcher.match_similar(&catalog(), "bomba sumergible").await.is_empty());
    }

    #[test]
    fn reply_ids_map_onto_catalog() {
        let reply = "Te sugiero: [{\"id\": 3}, \"5\", 99, 3, 1, 2]";
        let ids: Vec<i64> =
            products_from_reply(reply, &catalog()).iter().map(|product| product.id.0).collect();
        assert_eq!(ids, vec![3, 5, 1]);

        assert!(products_from_reply("no encontré nada", &catalog()).is_empty());
        assert!(products_from_reply("[oops]", &catalog()).is_empty());
    }

    struct CapturingLlm {
        reply: Result<String, String>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmClient for CapturingLlm {
        async fn complete(&self, prompt: &str) -> Result<String> {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt.to_owned());
            }
            self.reply.clone().map_err(|error| anyhow!(error))
        }
    }

    #[tokio::test]
    async fn llm_matcher_lists_catalog_and_swallows_errors() {
        let llm = Arc::new(CapturingLlm { reply: Ok("[2]".to_owned()), prompts: Mutex::new(Vec::new()) });
        let matcher = LlmProductMatcher::new(llm.clone());

        let found = matcher.match_exact(&catalog(), "tornillo 25hp").await;
        assert_eq!(found.first().map(|product| product.id), Some(ProductId(2)));
        let prompts = llm.prompts.lock().expect("prompt lock").clone();
        assert!(prompts[0].contains("2 | 1001.2500-1 | Compresor de tornillo 25 HP"));
        assert!(prompts[0].contains("tornillo 25hp"));

        let failing = LlmProductMatcher::new(Arc::new(CapturingLlm {
            reply: Err("rate limited".to_owned()),
            prompts: Mutex::new(Vec::new()),
        }));
        assert!(failing.match_similar(&catalog(), "compresor").await.is_empty());
    }
}
