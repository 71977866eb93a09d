use tracing::debug;

use cotiza_core::domain::product::ProductId;
use cotiza_core::session::{BrowseStep, SessionState};

use crate::dialogue::{DialogueEngine, Turn};
use crate::render;

impl DialogueEngine {
    /// Shows the first candidate at or after the cursor that is not yet quoted.
    pub(crate) async fn show_similar(&self, turn: &Turn, state: &mut SessionState) {
        let Some(quotation) = state.quotation_mut() else {
            self.send_text(turn, render::NO_SIMILAR_AVAILABLE).await;
            return;
        };
        let quoted: Vec<ProductId> = quotation.lines().iter().map(|line| line.product_id).collect();
        let Some(browse) = quotation.browse.as_mut() else {
            self.send_text(turn, render::NO_SIMILAR_AVAILABLE).await;
            return;
        };

        match browse.next_unquoted(|product_id| quoted.contains(&product_id)) {
            BrowseStep::Show { product, has_next } => {
                debug!(
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    product_id = %product.id,
                    has_next,
                    "showing similar product"
                );
                let stock = self.stock_for(turn, &product).await;
                self.send(turn, render::similar_card(&product, stock.as_ref(), has_next)).await;
            }
            BrowseStep::AllQuoted => {
                quotation.browse = None;
                self.send_text(turn, render::SIMILAR_ALL_QUOTED).await;
            }
            BrowseStep::Exhausted => {
                quotation.browse = None;
                self.send_text(turn, render::SIMILAR_EXHAUSTED).await;
            }
        }
    }

    pub(crate) async fn next_similar(&self, turn: &Turn, state: &mut SessionState) {
        match state.quotation_mut().and_then(|quotation| quotation.browse.as_mut()) {
            Some(browse) => browse.advance(),
            None => {
                self.send_text(turn, render::NO_SIMILAR_AVAILABLE).await;
                return;
            }
        }
        self.show_similar(turn, state).await;
    }

    pub(crate) async fn cancel_similar(&self, turn: &Turn, state: &mut SessionState) {
        if let Some(quotation) = state.quotation_mut() {
            quotation.browse = None;
        }
        self.send_text(turn, render::SIMILAR_CANCELLED).await;
    }
}
