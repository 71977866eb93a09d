pub mod appointment;
pub mod browse;
pub mod edit;
pub mod quotation;
pub mod store;

pub use appointment::{AppointmentProgress, AppointmentRecord, AppointmentSession, AppointmentStep};
pub use browse::{BrowseSession, BrowseStep};
pub use edit::{Direction, EditField, EditSession, EditStep, FieldInputError, FieldValue, Selection};
pub use quotation::{CommitError, DeleteOutcome, QuotationSession};
pub use store::{ConversationKind, SessionKey, SessionState, SessionStore};
