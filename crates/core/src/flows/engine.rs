use thiserror::Error;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::flows::states::{
    HeaderAction, HeaderContext, HeaderEvent, HeaderStep, TransitionOutcome,
};

/// Transition table for the quotation header wizard.
///
/// The dialogue layer performs backend I/O first and then feeds the outcome
/// in as a [`HeaderEvent`]; the returned actions tell it which prompt to send
/// next or how to wind the session down.
#[derive(Clone, Debug, Default)]
pub struct HeaderFlow;

impl HeaderFlow {
    pub fn new() -> Self {
        Self
    }

    pub fn initial_state(&self) -> HeaderStep {
        HeaderStep::AwaitingTaxId
    }

    pub fn apply(
        &self,
        current: &HeaderStep,
        event: &HeaderEvent,
        context: &HeaderContext,
    ) -> Result<TransitionOutcome, FlowTransitionError> {
        transition_header(current, event, context)
    }

    pub fn apply_with_audit<S>(
        &self,
        current: &HeaderStep,
        event: &HeaderEvent,
        context: &HeaderContext,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<TransitionOutcome, FlowTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let result = self.apply(current, event, context);
        match &result {
            Ok(outcome) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "flow.header.transition_applied",
                        AuditCategory::Flow,
                        AuditOutcome::Success,
                    )
                    .with_metadata("from", outcome.from.as_str())
                    .with_metadata("to", outcome.to.as_str())
                    .with_metadata("event", format!("{:?}", outcome.event)),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit,
                        "flow.header.transition_rejected",
                        AuditCategory::Flow,
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FlowTransitionError {
    #[error("missing required fields before transition from {state:?}: {missing_fields:?}")]
    MissingRequiredFields { state: HeaderStep, missing_fields: Vec<String> },
    #[error("invalid transition from {state:?} using event {event:?}")]
    InvalidTransition { state: HeaderStep, event: HeaderEvent },
}

fn transition_header(
    current: &HeaderStep,
    event: &HeaderEvent,
    context: &HeaderContext,
) -> Result<TransitionOutcome, FlowTransitionError> {
    use HeaderAction::{
        ClearSession, ExitWizard, PresentCurrencies, PresentPaymentMethods, PromptAnotherTaxId,
        PromptConditions, SubmitQuotation,
    };
    use HeaderEvent::{
        Abandoned as AbandonRequested, ClientOwnedElsewhere, ClientRejected, ClientResolved,
        ConditionsCaptured, CurrencySelected, HeaderRejected, PaymentMethodSelected,
        SelectionRejected, SenderUnauthorized, Submitted, UpstreamFailed,
    };
    use HeaderStep::{
        Abandoned, AwaitingClientName, AwaitingConditions, AwaitingCurrency,
        AwaitingPaymentMethod, AwaitingTaxId, Completed,
    };

    let (to, actions) = match (current, event) {
        (AwaitingTaxId, ClientResolved) | (AwaitingClientName, ClientResolved) => {
            if context.client_id.is_none() {
                return Err(FlowTransitionError::MissingRequiredFields {
                    state: *current,
                    missing_fields: vec!["client_id".to_owned()],
                });
            }
            (AwaitingConditions, vec![PromptConditions])
        }
        (AwaitingTaxId, ClientOwnedElsewhere) => (AwaitingTaxId, vec![PromptAnotherTaxId]),
        (AwaitingTaxId, ClientRejected) => (AwaitingTaxId, Vec::new()),
        (AwaitingClientName, ClientRejected) => (AwaitingClientName, Vec::new()),
        (AwaitingTaxId, SenderUnauthorized) => (Abandoned, vec![ExitWizard]),
        (AwaitingConditions, ConditionsCaptured) => (AwaitingCurrency, vec![PresentCurrencies]),
        (AwaitingConditions, SelectionRejected) => (AwaitingConditions, vec![PromptConditions]),
        (AwaitingConditions, UpstreamFailed) => (AwaitingConditions, Vec::new()),
        (AwaitingCurrency, CurrencySelected) => {
            (AwaitingPaymentMethod, vec![PresentPaymentMethods])
        }
        (AwaitingCurrency, SelectionRejected) | (AwaitingCurrency, UpstreamFailed) => {
            (AwaitingCurrency, Vec::new())
        }
        (AwaitingPaymentMethod, PaymentMethodSelected) => {
            (AwaitingPaymentMethod, vec![SubmitQuotation])
        }
        (AwaitingPaymentMethod, SelectionRejected)
        | (AwaitingPaymentMethod, UpstreamFailed)
        | (AwaitingPaymentMethod, HeaderRejected) => (AwaitingPaymentMethod, Vec::new()),
        (AwaitingPaymentMethod, Submitted) => (Completed, vec![ClearSession]),
        (state, AbandonRequested) if !state.is_terminal() => (Abandoned, vec![ClearSession]),
        _ => {
            return Err(FlowTransitionError::InvalidTransition {
                state: *current,
                event: event.clone(),
            });
        }
    };

    Ok(TransitionOutcome { from: *current, to, event: event.clone(), actions })
}
