//! Dialogue engine for the cotiza sales assistant
//!
//! This crate holds the conversation logic that turns WhatsApp messages into
//! quotations:
//! - Routes every inbound message to exactly one handler (`dialogue`)
//! - Searches the catalog per clause and offers similar products (`search`, `browse`)
//! - Edits quotation lines through reply buttons (`editing`)
//! - Walks the header wizard and submits the quotation (`header`)
//! - Books appointments and registers clients (`appointment`, `registration`)
//!
//! # Architecture
//!
//! ```text
//! InboundMessage → DialogueEngine::handle → flow handler → Messenger
//!                                   │
//!                                   ├── IntentClassifier / ProductMatcher (keyword or LLM)
//!                                   └── backend gateways (cotiza-core ports)
//! ```
//!
//! # Model Boundary
//!
//! Language models only classify text, extract client fields and pick catalog
//! ids. Prices, line items and wizard transitions are decided by the session
//! types in `cotiza-core`.

pub mod appointment;
pub mod browse;
pub mod dialogue;
pub mod editing;
pub mod header;
pub mod intent;
pub mod llm;
pub mod matcher;
pub mod registration;
pub mod render;
pub mod search;
pub mod text;

pub use appointment::{
    AppointmentBook, AppointmentBookError, BookedAppointment, InMemoryAppointmentBook,
};
pub use dialogue::{Collaborators, DialogueEngine, Route};
pub use intent::{ClientFields, IntentClassifier, KeywordIntentClassifier, LlmIntentClassifier, StockIntent};
pub use llm::{LlmClient, Transcriber, TranscriptionError, UnsupportedTranscriber};
pub use matcher::{KeywordProductMatcher, LlmProductMatcher, ProductMatcher};
pub use search::split_clauses;
