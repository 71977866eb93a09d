use thiserror::Error;

use crate::{domain::product::ProductId, flows::FlowTransitionError};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("line index {index} is out of range for {len} line items")]
    LineIndexOutOfRange { index: usize, len: usize },
    #[error("quotation has no line items")]
    NoLineItems,
    #[error("product {0} is already part of the quotation")]
    DuplicateProduct(ProductId),
    #[error("no edit session is active")]
    NoEditSession,
    #[error("no line item is selected for editing")]
    NoSelection,
    #[error("selected line item changed since it was chosen")]
    StaleSelection,
    #[error("edit cursor is already at the {0} line item")]
    CursorAtBoundary(&'static str),
    #[error("header field `{0}` is missing")]
    MissingHeaderField(&'static str),
    #[error("another conversation is already active for this sender")]
    FlowConflict,
    #[error(transparent)]
    FlowTransition(#[from] FlowTransitionError),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("integration failure: {0}")]
    Integration(String),
}

impl ApplicationError {
    /// Text shown to the sender when a turn fails without a more specific reply.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Domain(DomainError::NoLineItems) => "❌ No hay productos en la cotización.",
            Self::Domain(_) | Self::Integration(_) => {
                "❌ Ocurrió un error al procesar tu solicitud."
            }
        }
    }
}
