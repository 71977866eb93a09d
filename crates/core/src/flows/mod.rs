pub mod engine;
pub mod states;

pub use engine::{FlowTransitionError, HeaderFlow};
pub use states::{HeaderAction, HeaderContext, HeaderEvent, HeaderStep, TransitionOutcome};
