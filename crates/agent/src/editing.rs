use tracing::{debug, info};

use cotiza_core::session::{
    CommitError, DeleteOutcome, Direction, EditField, EditSession, QuotationSession, SessionState,
};
use cotiza_core::DomainError;

use crate::dialogue::{DialogueEngine, Turn};
use crate::render;

impl DialogueEngine {
    pub(crate) async fn modify_quotation(&self, turn: &Turn, state: &mut SessionState) {
        let Some(quotation) = state.quotation_mut() else {
            self.send_text(turn, render::NO_LINES_TO_MODIFY).await;
            return;
        };
        if quotation.begin_edit(0).is_err() {
            self.send_text(turn, render::NO_LINES_TO_MODIFY).await;
            return;
        }
        self.show_line_editor(turn, quotation).await;
    }

    async fn show_line_editor(&self, turn: &Turn, quotation: &QuotationSession) {
        let Some((index, _)) = quotation.current_line() else {
            self.send_text(turn, render::NOT_EDITING).await;
            return;
        };
        for message in render::line_editor(quotation.lines(), index) {
            self.send(turn, message).await;
        }
    }

    pub(crate) async fn edit_field(
        &self,
        turn: &Turn,
        state: &mut SessionState,
        index: usize,
        field: EditField,
    ) {
        let Some(quotation) = state.quotation_mut() else {
            self.send_text(turn, render::LINE_GONE).await;
            return;
        };
        match quotation.select_field(index, field) {
            Ok(()) => self.send(turn, render::field_prompt(field)).await,
            Err(error) => {
                debug!(session_key = %turn.key, error = %error, "field selection refused");
                self.send_text(turn, render::LINE_GONE).await;
            }
        }
    }

    pub(crate) async fn delete_line(&self, turn: &Turn, state: &mut SessionState, index: usize) {
        let Some(quotation) = state.quotation_mut() else {
            self.send_text(turn, render::LINE_GONE).await;
            return;
        };
        match quotation.delete_line(index) {
            Ok(DeleteOutcome::Emptied(removed)) => {
                info!(
                    event_name = "dialogue.edit.line_deleted",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    product_id = %removed.product_id,
                    remaining = 0,
                    "quotation line deleted"
                );
                self.send_text(turn, render::LINE_DELETED_LAST).await;
            }
            Ok(DeleteOutcome::Remaining { removed, cursor }) => {
                info!(
                    event_name = "dialogue.edit.line_deleted",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    product_id = %removed.product_id,
                    remaining = quotation.lines().len(),
                    cursor,
                    "quotation line deleted"
                );
                self.send_text(turn, render::LINE_DELETED_CONTINUE).await;
                self.show_line_editor(turn, quotation).await;
            }
            Err(_) => self.send_text(turn, render::LINE_GONE).await,
        }
    }

    pub(crate) async fn select_line(&self, turn: &Turn, state: &mut SessionState, index: usize) {
        let selected = state.quotation_mut().map(|quotation| quotation.select_line(index).is_ok());
        if selected == Some(true) {
            self.send(turn, render::selected_line_options()).await;
        } else {
            self.send_text(turn, render::LINE_GONE).await;
        }
    }

    /// `editar_cantidad` without an index acts on the line picked by `edit_{i}`.
    pub(crate) async fn change_selected_quantity(&self, turn: &Turn, state: &mut SessionState) {
        let Some(quotation) = state.quotation_mut() else {
            self.send_text(turn, render::NO_SELECTION).await;
            return;
        };
        let Some(selection) = quotation.edit.as_ref().and_then(EditSession::selected) else {
            self.send_text(turn, render::NO_SELECTION).await;
            return;
        };
        if quotation.line(selection.index).map(|line| line.id) != Ok(selection.line_id) {
            quotation.edit = None;
            self.send_text(turn, render::STALE_SELECTION).await;
            return;
        }
        match quotation.select_field(selection.index, EditField::Quantity) {
            Ok(()) => self.send(turn, render::field_prompt(EditField::Quantity)).await,
            Err(_) => self.send_text(turn, render::STALE_SELECTION).await,
        }
    }

    pub(crate) async fn delete_selected(&self, turn: &Turn, state: &mut SessionState) {
        let Some(quotation) = state.quotation_mut() else {
            self.send_text(turn, render::NO_SELECTION).await;
            return;
        };
        match quotation.delete_selected() {
            Ok(removed) => {
                info!(
                    event_name = "dialogue.edit.line_deleted",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    product_id = %removed.product_id,
                    remaining = quotation.lines().len(),
                    "selected quotation line deleted"
                );
                self.send_text(turn, render::SELECTED_LINE_DELETED).await;
            }
            Err(DomainError::StaleSelection) => self.send_text(turn, render::STALE_SELECTION).await,
            Err(_) => self.send_text(turn, render::NO_SELECTION).await,
        }
    }

    /// Moving past either end re-renders the current line.
    pub(crate) async fn navigate(&self, turn: &Turn, state: &mut SessionState, direction: Direction) {
        let Some(quotation) = state.quotation_mut() else {
            self.send_text(turn, render::NOT_EDITING).await;
            return;
        };
        match quotation.navigate(direction) {
            Ok(_) | Err(DomainError::CursorAtBoundary(_)) => {
                self.show_line_editor(turn, quotation).await;
            }
            Err(_) => self.send_text(turn, render::NOT_EDITING).await,
        }
    }

    pub(crate) async fn commit_field(&self, turn: &Turn, quotation: &mut QuotationSession, text: &str) {
        match quotation.commit_field(text) {
            Ok((value, line)) => {
                info!(
                    event_name = "dialogue.edit.field_committed",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    product_id = %line.product_id,
                    value = ?value,
                    "quotation line updated"
                );
                quotation.edit = None;
                self.send(turn, render::field_updated(value)).await;
                self.send(turn, render::modify_or_confirm()).await;
            }
            Err(CommitError::Input(error)) => {
                debug!(session_key = %turn.key, error = %error, "field input rejected");
                self.send(turn, render::field_invalid(error.field)).await;
            }
            Err(CommitError::Domain(DomainError::StaleSelection)) => {
                self.send_text(turn, render::STALE_SELECTION).await;
            }
            Err(CommitError::Domain(_)) => self.send_text(turn, render::GENERIC_ERROR).await,
        }
    }
}
