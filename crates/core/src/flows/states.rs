use serde::{Deserialize, Serialize};

use crate::domain::client::ClientId;

/// Steps of the quotation header wizard. The wire names are the ones the
/// sales team knows from the conversation logs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HeaderStep {
    AwaitingTaxId,
    AwaitingClientName,
    AwaitingConditions,
    AwaitingCurrency,
    AwaitingPaymentMethod,
    Completed,
    Abandoned,
}

impl HeaderStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingTaxId => "esperando_ruc",
            Self::AwaitingClientName => "esperando_nombre_cliente",
            Self::AwaitingConditions => "esperando_condiciones",
            Self::AwaitingCurrency => "esperando_moneda",
            Self::AwaitingPaymentMethod => "esperando_metodo_pago",
            Self::Completed => "completada",
            Self::Abandoned => "abandonada",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderEvent {
    ClientResolved,
    ClientOwnedElsewhere,
    ClientRejected,
    SenderUnauthorized,
    ConditionsCaptured,
    CurrencySelected,
    PaymentMethodSelected,
    SelectionRejected,
    UpstreamFailed,
    HeaderRejected,
    Submitted,
    Abandoned,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HeaderContext {
    pub client_id: Option<ClientId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeaderAction {
    PromptAnotherTaxId,
    PromptConditions,
    PresentCurrencies,
    PresentPaymentMethods,
    SubmitQuotation,
    ExitWizard,
    ClearSession,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: HeaderStep,
    pub to: HeaderStep,
    pub event: HeaderEvent,
    pub actions: Vec<HeaderAction>,
}
