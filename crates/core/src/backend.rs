//! Ports onto the quotation backend REST API.
//!
//! The server crate implements these over HTTP; tests use scripted fakes.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{
    client::{ClientLookup, ClientRecord, NewClient, OwnershipCheck},
    product::{Product, ProductId, StockLevel},
    quotation::{Currency, PaymentMethod, QuotationHeader, QuotationId, QuotationLineRecord},
    user::User,
};
use crate::errors::ApplicationError;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum BackendError {
    #[error("backend transport failure: {0}")]
    Transport(String),
    #[error("backend answered with status {status}")]
    Status { status: u16, body: Value },
    #[error("backend response could not be decoded: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Status { body, .. } => Some(body),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }

    /// Upstream validation text, preferring the field message for `ruc`.
    pub fn upstream_message(&self) -> String {
        let from_body = self.body().and_then(|body| {
            let ruc = body.pointer("/messages/ruc").and_then(|value| match value {
                Value::String(text) => Some(text.clone()),
                Value::Array(items) => items.iter().find_map(Value::as_str).map(str::to_owned),
                _ => None,
            });
            ruc.or_else(|| body.get("message").and_then(Value::as_str).map(str::to_owned))
        });
        from_body.unwrap_or_else(|| self.to_string())
    }
}

impl From<BackendError> for ApplicationError {
    fn from(value: BackendError) -> Self {
        Self::Integration(value.to_string())
    }
}

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_number(&self, number: &str) -> Result<Option<User>, BackendError>;
}

#[async_trait]
pub trait CatalogGateway: Send + Sync {
    async fn list_products(&self) -> Result<Vec<Product>, BackendError>;
    async fn stock(&self, product_id: ProductId) -> Result<StockLevel, BackendError>;
}

#[async_trait]
pub trait ClientGateway: Send + Sync {
    async fn verify_ownership(&self, ruc: &str, number: &str)
        -> Result<OwnershipCheck, BackendError>;
    async fn register(&self, client: &NewClient) -> Result<ClientRecord, BackendError>;
    async fn find_by_ruc(&self, ruc: &str) -> Result<Option<ClientLookup>, BackendError>;
}

#[async_trait]
pub trait ReferenceDataGateway: Send + Sync {
    async fn currencies(&self) -> Result<Vec<Currency>, BackendError>;
    async fn payment_methods(&self) -> Result<Vec<PaymentMethod>, BackendError>;
}

#[async_trait]
pub trait QuotationGateway: Send + Sync {
    /// `None` when the backend accepted the request without returning an id.
    async fn create_header(
        &self,
        header: &QuotationHeader,
    ) -> Result<Option<QuotationId>, BackendError>;
    async fn add_line(&self, line: &QuotationLineRecord) -> Result<(), BackendError>;
    fn document_url(&self, quotation_id: QuotationId) -> String;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::BackendError;

    #[test]
    fn upstream_message_prefers_ruc_field_message() {
        let error = BackendError::Status {
            status: 422,
            body: json!({"messages": {"ruc": "El RUC no es válido"}, "message": "Validation"}),
        };
        assert_eq!(error.upstream_message(), "El RUC no es válido");
    }

    #[test]
    fn upstream_message_falls_back_to_message_then_display() {
        let with_message = BackendError::Status {
            status: 500,
            body: json!({"message": "Token Decolecta inválido"}),
        };
        assert_eq!(with_message.upstream_message(), "Token Decolecta inválido");

        let bare = BackendError::Transport("connection refused".to_owned());
        assert_eq!(bare.upstream_message(), "backend transport failure: connection refused");
    }

    #[test]
    fn not_found_is_detected_from_status() {
        let error = BackendError::Status { status: 404, body: json!(null) };
        assert!(error.is_not_found());
        assert!(!BackendError::Decode("eof".to_owned()).is_not_found());
    }
}
