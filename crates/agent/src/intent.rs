use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use cotiza_core::domain::client::{normalize_ruc, NewClient};
use cotiza_core::domain::user::UserId;

use crate::llm::{json_span, LlmClient};
use crate::text::fold;

static STOCK_QUESTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(hay|tienen|queda|quedan).*(en stock|disponible|disponibles)")
        .expect("stock question pattern compiles")
});
static SKU_MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bsku\b|\d{3,}\.\d{4}-\d").expect("sku pattern compiles")
});
static HORSEPOWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+\s*hp\b").expect("horsepower pattern compiles"));

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StockIntent {
    StockQuery,
    ExistenceQuery,
    Other,
}

impl StockIntent {
    pub fn wants_search(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

/// Stock intent from keywords alone.
pub fn classify_stock_text(text: &str) -> StockIntent {
    let lower = text.to_lowercase();
    if STOCK_QUESTION.is_match(&lower) || lower.contains("stock") {
        StockIntent::StockQuery
    } else if SKU_MENTION.is_match(&lower)
        || lower.contains("compresor")
        || HORSEPOWER.is_match(&lower)
    {
        StockIntent::ExistenceQuery
    } else {
        StockIntent::Other
    }
}

/// Client data pulled out of a "registrar cliente" message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ClientFields {
    #[serde(default, deserialize_with = "optional_text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub ruc: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub contact_name: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub contact_email: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub contact_phone: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub address: Option<String>,
}

impl ClientFields {
    /// Digits of the tax id, when one was given.
    pub fn normalized_ruc(&self) -> Option<String> {
        self.ruc.as_deref().map(normalize_ruc).filter(|ruc| !ruc.is_empty())
    }

    pub fn into_new_client(self, owner: UserId) -> Option<NewClient> {
        let ruc = self.normalized_ruc()?;
        let mut client = NewClient::new(&ruc, owner);
        client.name = self.name;
        client.contact_name = self.contact_name;
        client.contact_email = self.contact_email;
        client.contact_phone = self.contact_phone;
        client.address = self.address;
        Some(client)
    }
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(text)) => Some(text.trim().to_owned()).filter(|text| !text.is_empty()),
        Some(Value::Number(number)) => Some(number.to_string()),
        _ => None,
    })
}

#[derive(Clone, Copy)]
enum Field {
    Name,
    Ruc,
    ContactName,
    ContactEmail,
    ContactPhone,
    Address,
}

const FIELD_KEYWORDS: &[(&str, Field)] = &[
    ("registrar cliente", Field::Name),
    ("nombre del contacto", Field::ContactName),
    ("correo del contacto", Field::ContactEmail),
    ("telefono del contacto", Field::ContactPhone),
    ("nombre del cliente", Field::Name),
    ("razon social", Field::Name),
    ("nombre", Field::Name),
    ("ruc", Field::Ruc),
    ("contacto", Field::ContactName),
    ("email", Field::ContactEmail),
    ("correo", Field::ContactEmail),
    ("telefono", Field::ContactPhone),
    ("celular", Field::ContactPhone),
    ("direccion", Field::Address),
];

/// Reads `Clave: valor` lines or comma separated parts such as
/// `registrar cliente ACME, ruc 20523408292, contacto Ana`.
pub fn parse_client_fields(text: &str) -> ClientFields {
    let mut fields = ClientFields::default();

    for part in text.split(['\n', ',']) {
        let part = part.trim();
        let folded = fold(part);
        let Some((keyword, field)) =
            FIELD_KEYWORDS.iter().find(|(keyword, _)| folded.starts_with(keyword))
        else {
            continue;
        };

        let value: String = part.chars().skip(keyword.chars().count()).collect();
        let value = value.trim_start_matches([':', '-', ' ', '\t']).trim();
        if value.is_empty() {
            continue;
        }
        let slot = match field {
            Field::Name => &mut fields.name,
            Field::Ruc => &mut fields.ruc,
            Field::ContactName => &mut fields.contact_name,
            Field::ContactEmail => &mut fields.contact_email,
            Field::ContactPhone => &mut fields.contact_phone,
            Field::Address => &mut fields.address,
        };
        slot.get_or_insert_with(|| value.to_owned());
    }

    fields
}

#[async_trait]
pub trait IntentClassifier: Send + Sync {
    async fn classify_stock_intent(&self, text: &str) -> StockIntent;
    /// `None` when nothing could be extracted.
    async fn extract_client_fields(&self, text: &str) -> Option<ClientFields>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct KeywordIntentClassifier;

#[async_trait]
impl IntentClassifier for KeywordIntentClassifier {
    async fn classify_stock_intent(&self, text: &str) -> StockIntent {
        classify_stock_text(text)
    }

    async fn extract_client_fields(&self, text: &str) -> Option<ClientFields> {
        Some(parse_client_fields(text))
    }
}

const EXTRACTION_PROMPT: &str = "Eres un asistente que interpreta mensajes de WhatsApp para \
registrar clientes. Devuelve solo un objeto JSON con las claves name, ruc, contact_name, \
contact_email, contact_phone y address (usa null si falta un dato). No agregues explicaciones.";

/// Classifier that keeps the keyword stock rules and asks the model to pull
/// client fields out of free text.
pub struct LlmIntentClassifier {
    client: Arc<dyn LlmClient>,
}

impl LlmIntentClassifier {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IntentClassifier for LlmIntentClassifier {
    async fn classify_stock_intent(&self, text: &str) -> StockIntent {
        classify_stock_text(text)
    }

    async fn extract_client_fields(&self, text: &str) -> Option<ClientFields> {
        let prompt = format!("{EXTRACTION_PROMPT}\n\nMensaje:\n\"\"\"\n{text}\n\"\"\"");
        let reply = match self.client.complete(&prompt).await {
            Ok(reply) => reply,
            Err(error) => {
                warn!(
                    event_name = "agent.intent.extraction_failed",
                    error = %error,
                    "client field extraction failed; using keyword parser"
                );
                return Some(parse_client_fields(text));
            }
        };

        match json_span(&reply, '{', '}').map(serde_json::from_str::<ClientFields>) {
            Some(Ok(fields)) => Some(fields),
            Some(Err(error)) => {
                warn!(
                    event_name = "agent.intent.extraction_failed",
                    error = %error,
                    "model reply is not a client object; using keyword parser"
                );
                Some(parse_client_fields(text))
            }
            None => Some(parse_client_fields(text)),
        }
    }
}
