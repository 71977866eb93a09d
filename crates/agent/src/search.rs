use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use cotiza_core::backend::BackendError;
use cotiza_core::domain::product::{Product, ProductId, StockLevel};
use cotiza_core::session::{BrowseSession, SessionState};
use cotiza_core::DomainError;

use crate::dialogue::{DialogueEngine, Turn};
use crate::matcher::MAX_MATCHES;
use crate::render;

static CLAUSE_SEPARATORS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" y | o |,|/|;").expect("clause separator pattern compiles"));

/// Splits a request such as `compresor 20hp y tanque 100 litros` into the
/// product queries it names. Fragments of two chars or fewer are dropped.
pub fn split_clauses(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    CLAUSE_SEPARATORS
        .split(&lower)
        .map(str::trim)
        .filter(|clause| clause.chars().count() > 2)
        .map(str::to_owned)
        .collect()
}

fn is_quoted(state: &SessionState, product_id: ProductId) -> bool {
    state.quotation().is_some_and(|quotation| quotation.contains_product(product_id))
}

impl DialogueEngine {
    pub(crate) async fn search_products(&self, turn: &Turn, state: &mut SessionState, text: &str) {
        for clause in split_clauses(text) {
            info!(
                event_name = "dialogue.search.clause",
                correlation_id = %turn.correlation_id,
                session_key = %turn.key,
                clause = %clause,
                "searching catalog"
            );
            if let Err(error) = self.search_clause(turn, state, &clause).await {
                warn!(
                    event_name = "dialogue.search.catalog_failed",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    error = %error,
                    "catalog search failed"
                );
                self.send_text(turn, render::GENERIC_ERROR).await;
                return;
            }
        }
    }

    async fn search_clause(
        &self,
        turn: &Turn,
        state: &mut SessionState,
        clause: &str,
    ) -> Result<(), BackendError> {
        let catalog = self.ports.catalog.list_products().await?;
        let mut exact = self.ports.matcher.match_exact(&catalog, clause).await;
        exact.truncate(MAX_MATCHES);

        if let [only] = exact.as_slice() {
            if is_quoted(state, only.id) {
                self.send(turn, render::already_quoted_single(clause)).await;
                return Ok(());
            }
        }

        if exact.is_empty() {
            let mut similar = self.ports.matcher.match_similar(&catalog, clause).await;
            similar.truncate(MAX_MATCHES);
            if similar.is_empty() {
                self.send(turn, render::nothing_similar(clause)).await;
                return Ok(());
            }

            let quotation = state.ensure_quotation(turn.user.id, true);
            quotation.browse = Some(BrowseSession::new(clause, similar));
            self.send(turn, render::no_exact_match(clause)).await;
            self.send(turn, render::offer_similar()).await;
            return Ok(());
        }

        for product in &exact {
            if is_quoted(state, product.id) {
                continue;
            }
            let stock = self.stock_for(turn, product).await;
            self.send(turn, render::product_card(product, stock.as_ref())).await;
            state.ensure_quotation(turn.user.id, true);
            self.send(turn, render::offer_quote(product)).await;
        }
        Ok(())
    }

    /// Stock lookups never abort a search; the card says stock is unknown.
    pub(crate) async fn stock_for(&self, turn: &Turn, product: &Product) -> Option<StockLevel> {
        match self.ports.catalog.stock(product.id).await {
            Ok(stock) => Some(stock),
            Err(error) => {
                warn!(
                    event_name = "dialogue.search.stock_failed",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    product_id = %product.id,
                    error = %error,
                    "stock lookup failed"
                );
                None
            }
        }
    }

    pub(crate) async fn quote_product(&self, turn: &Turn, state: &mut SessionState, product_id: ProductId) {
        let catalog = match self.ports.catalog.list_products().await {
            Ok(catalog) => catalog,
            Err(error) => {
                warn!(
                    event_name = "dialogue.quote.catalog_failed",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    error = %error,
                    "catalog lookup failed"
                );
                self.send_text(turn, render::GENERIC_ERROR).await;
                return;
            }
        };
        let Some(product) = catalog.into_iter().find(|product| product.id == product_id) else {
            self.send_text(turn, render::PRODUCT_NOT_FOUND).await;
            return;
        };

        let quotation = state.ensure_quotation(turn.user.id, true);
        if quotation.browse.as_ref().is_some_and(|browse| browse.contains(product_id)) {
            quotation.browse = None;
        }

        let added = match quotation.add_product(&product) {
            Ok(line) => render::product_added(line),
            Err(DomainError::DuplicateProduct(_)) => render::product_already_added(&product),
            Err(error) => {
                warn!(
                    event_name = "dialogue.quote.add_failed",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    error = %error,
                    "failed to add product"
                );
                self.send_text(turn, render::GENERIC_ERROR).await;
                return;
            }
        };
        info!(
            event_name = "dialogue.quote.product_added",
            correlation_id = %turn.correlation_id,
            session_key = %turn.key,
            product_id = %product_id,
            lines = quotation.lines().len(),
            "product quoted"
        );
        self.send(turn, added).await;
        self.send(turn, render::add_more_or_finish()).await;
    }
}
