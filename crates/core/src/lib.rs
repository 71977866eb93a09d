pub mod audit;
pub mod backend;
pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod session;

pub use backend::{
    BackendError, CatalogGateway, ClientGateway, QuotationGateway, ReferenceDataGateway,
    UserDirectory,
};
pub use domain::client::{ClientId, ClientRecord, NewClient, OwnershipCheck};
pub use domain::product::{Product, ProductId, StockLevel};
pub use domain::quotation::{LineItem, LineItemId, QuotationId};
pub use domain::user::{User, UserId};
pub use errors::{ApplicationError, DomainError};
pub use flows::{HeaderFlow, HeaderStep};
pub use session::{QuotationSession, SessionKey, SessionState, SessionStore};
