//! Header wizard: tax id, conditions, currency and payment method, then
//! submission of the header and every line to the backend.
//!
//! Each step handler performs its I/O, replies, and reports a
//! [`HeaderEvent`]. The transition table in `cotiza-core` decides the next
//! step and which follow-up actions run.

use serde_json::Value;
use tracing::{info, warn};

use cotiza_core::audit::{AuditCategory, AuditEvent, AuditOutcome};
use cotiza_core::backend::BackendError;
use cotiza_core::domain::client::{normalize_ruc, AgentContact, NewClient, OwnershipCheck, OwnershipReason};
use cotiza_core::domain::quotation::{QuotationLineRecord, VALIDATION_TERM};
use cotiza_core::flows::{HeaderAction, HeaderContext, HeaderEvent, HeaderStep};
use cotiza_core::session::{QuotationSession, SessionState};
use cotiza_whatsapp::OutboundMessage;

use crate::dialogue::{DialogueEngine, Turn};
use crate::render;

const OWNED_BY_OTHER_AGENT: &str = "cliente_de_otro_asesor";

impl DialogueEngine {
    /// `confirmar_cotizacion`: opens the wizard, or repeats the pending prompt.
    pub(crate) async fn confirm_quotation(&self, turn: &Turn, state: &mut SessionState) {
        let Some(quotation) = state.quotation_mut() else {
            self.send_text(turn, render::NO_ACTIVE_QUOTATION).await;
            return;
        };
        if let Some(step) = quotation.step.filter(|step| !step.is_terminal()) {
            self.send(turn, step_prompt(quotation, step)).await;
            return;
        }

        quotation.enter_wizard(self.header_flow.initial_state());
        info!(
            event_name = "dialogue.header.started",
            correlation_id = %turn.correlation_id,
            session_key = %turn.key,
            lines = quotation.lines().len(),
            "header wizard started"
        );
        self.send(turn, render::start_header()).await;
    }

    /// Menu option 4: quotation that starts by naming a new client.
    pub(crate) async fn start_manual_quotation(&self, turn: &Turn, state: &mut SessionState) {
        let quotation = state.ensure_quotation(turn.user.id, false);
        if let Some(step) = quotation.step.filter(|step| !step.is_terminal()) {
            self.send(turn, step_prompt(quotation, step)).await;
            return;
        }
        quotation.enter_wizard(HeaderStep::AwaitingClientName);
        self.send_text(turn, render::CLIENT_NAME_PROMPT).await;
    }

    pub(crate) async fn cancel_quotation(&self, turn: &Turn, state: &mut SessionState) {
        let Some(quotation) = state.quotation() else {
            self.send_text(turn, render::NO_ACTIVE_QUOTATION).await;
            return;
        };
        if let Some(step) = quotation.step.filter(|step| !step.is_terminal()) {
            let context = HeaderContext { client_id: quotation.client_id };
            let audit = self.audit_context(turn, quotation.quotation_id);
            if let Err(error) = self.header_flow.apply_with_audit(
                &step,
                &HeaderEvent::Abandoned,
                &context,
                self.ports.audit.as_ref(),
                &audit,
            ) {
                warn!(
                    event_name = "dialogue.header.transition_rejected",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    error = %error,
                    "abandon transition rejected"
                );
            }
        }

        state.clear();
        info!(
            event_name = "dialogue.quotation.cancelled",
            correlation_id = %turn.correlation_id,
            session_key = %turn.key,
            "quotation cancelled"
        );
        self.send_text(turn, render::QUOTATION_CANCELLED).await;
    }

    /// Routes free text to the active wizard step.
    pub(crate) async fn header_input(&self, turn: &Turn, state: &mut SessionState, text: &str) {
        let Some(quotation) = state.quotation_mut() else {
            return;
        };
        let Some(step) = quotation.step else {
            return;
        };

        let event = match step {
            HeaderStep::AwaitingTaxId => self.resolve_tax_id(turn, quotation, text).await,
            HeaderStep::AwaitingClientName => self.register_named_client(turn, quotation, text).await,
            HeaderStep::AwaitingConditions => self.capture_conditions(turn, quotation, text).await,
            HeaderStep::AwaitingCurrency => self.select_currency(turn, quotation, text).await,
            HeaderStep::AwaitingPaymentMethod => self.select_payment_method(turn, quotation, text).await,
            HeaderStep::Completed | HeaderStep::Abandoned => {
                quotation.exit_wizard();
                return;
            }
        };
        self.advance(turn, state, step, event).await;
    }

    /// Applies `event` and runs the resulting actions. Submission feeds its
    /// own outcome back in, so one call can go from payment method to done.
    async fn advance(&self, turn: &Turn, state: &mut SessionState, from: HeaderStep, event: HeaderEvent) {
        let mut step = from;
        let mut pending = Some(event);

        while let Some(event) = pending.take() {
            let Some(quotation) = state.quotation_mut() else {
                return;
            };
            let context = HeaderContext { client_id: quotation.client_id };
            let audit = self.audit_context(turn, quotation.quotation_id);
            let outcome = match self.header_flow.apply_with_audit(
                &step,
                &event,
                &context,
                self.ports.audit.as_ref(),
                &audit,
            ) {
                Ok(outcome) => outcome,
                Err(error) => {
                    warn!(
                        event_name = "dialogue.header.transition_rejected",
                        correlation_id = %turn.correlation_id,
                        session_key = %turn.key,
                        step = step.as_str(),
                        error = %error,
                        "header transition rejected"
                    );
                    self.send_text(turn, render::GENERIC_ERROR).await;
                    return;
                }
            };

            info!(
                event_name = "dialogue.header.transition",
                correlation_id = %turn.correlation_id,
                session_key = %turn.key,
                from = outcome.from.as_str(),
                to = outcome.to.as_str(),
                event = ?outcome.event,
                "header step applied"
            );
            quotation.step = Some(outcome.to);
            step = outcome.to;

            let mut clear = false;
            for action in &outcome.actions {
                match action {
                    HeaderAction::PromptAnotherTaxId => {
                        self.send_text(turn, render::ANOTHER_RUC_PROMPT).await;
                    }
                    HeaderAction::PromptConditions => {
                        self.send_text(turn, render::CONDITIONS_PROMPT).await;
                    }
                    HeaderAction::PresentCurrencies => {
                        self.send(turn, render::currency_menu(&quotation.currency_options)).await;
                    }
                    HeaderAction::PresentPaymentMethods => {
                        let menu = render::payment_method_menu(&quotation.payment_method_options);
                        self.send(turn, menu).await;
                    }
                    HeaderAction::SubmitQuotation => {
                        pending = Some(self.submit(turn, quotation).await);
                    }
                    HeaderAction::ExitWizard => quotation.exit_wizard(),
                    HeaderAction::ClearSession => clear = true,
                }
            }
            if clear {
                state.clear();
                return;
            }
        }
    }

    async fn resolve_tax_id(&self, turn: &Turn, quotation: &mut QuotationSession, text: &str) -> HeaderEvent {
        let ruc = normalize_ruc(text);
        if ruc.is_empty() {
            self.send_text(turn, render::RUC_INVALID).await;
            return HeaderEvent::ClientRejected;
        }
        quotation.ruc = Some(ruc.clone());

        match self.ports.clients.verify_ownership(&ruc, turn.key.as_str()).await {
            Ok(check) => self.ownership_outcome(turn, quotation, &ruc, check).await,
            Err(error) => self.ownership_failure(turn, &error).await,
        }
    }

    async fn ownership_outcome(
        &self,
        turn: &Turn,
        quotation: &mut QuotationSession,
        ruc: &str,
        check: OwnershipCheck,
    ) -> HeaderEvent {
        if check.allowed && check.exists {
            if let Some(client) = check.client.as_ref() {
                quotation.client_id = Some(client.id);
                quotation.client_name = Some(client.name.clone());
                self.send(turn, render::client_found(client)).await;
                return HeaderEvent::ClientResolved;
            }
        }

        match check.reason {
            Some(OwnershipReason::OwnedByOtherAgent) if check.exists && !check.allowed => {
                self.send(turn, render::owned_by_other_agent(check.agent.as_ref())).await;
                HeaderEvent::ClientOwnedElsewhere
            }
            Some(OwnershipReason::NotRegistered) if !check.exists => {
                self.auto_register(turn, quotation, ruc).await
            }
            _ => {
                self.send_text(turn, render::RUC_UNVERIFIED).await;
                HeaderEvent::ClientRejected
            }
        }
    }

    async fn auto_register(&self, turn: &Turn, quotation: &mut QuotationSession, ruc: &str) -> HeaderEvent {
        self.send_text(turn, render::AUTO_REGISTERING).await;
        match self.ports.clients.register(&NewClient::new(ruc, turn.user.id)).await {
            Ok(client) => {
                info!(
                    event_name = "dialogue.header.client_registered",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    client_id = client.id.0,
                    "client registered from tax id"
                );
                quotation.client_id = Some(client.id);
                quotation.client_name = Some(client.name.clone());
                self.send(turn, render::client_auto_registered(&client)).await;
                HeaderEvent::ClientResolved
            }
            Err(error) => {
                warn!(
                    event_name = "dialogue.header.registration_failed",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    error = %error,
                    "automatic client registration failed"
                );
                self.send(turn, render::registration_failed_retry(&error.upstream_message())).await;
                HeaderEvent::ClientRejected
            }
        }
    }

    /// Maps ownership-check error statuses onto wizard events.
    async fn ownership_failure(&self, turn: &Turn, error: &BackendError) -> HeaderEvent {
        let reason = error.body().and_then(|body| body.get("reason")).and_then(Value::as_str);
        match (error.status(), reason) {
            (Some(403), Some(OWNED_BY_OTHER_AGENT)) => {
                let agent = error
                    .body()
                    .and_then(|body| body.get("asesor"))
                    .and_then(|value| serde_json::from_value::<AgentContact>(value.clone()).ok());
                self.send(turn, render::owned_by_other_agent(agent.as_ref())).await;
                HeaderEvent::ClientOwnedElsewhere
            }
            (Some(404), _) => {
                self.send_text(turn, render::SENDER_NOT_AUTHORIZED).await;
                HeaderEvent::SenderUnauthorized
            }
            (Some(422), _) => {
                self.send_text(turn, render::RUC_INVALID).await;
                HeaderEvent::ClientRejected
            }
            _ => {
                warn!(
                    event_name = "dialogue.header.ownership_check_failed",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    error = %error,
                    "ownership check failed"
                );
                self.send_text(turn, render::RUC_CHECK_FAILED).await;
                HeaderEvent::ClientRejected
            }
        }
    }

    async fn register_named_client(
        &self,
        turn: &Turn,
        quotation: &mut QuotationSession,
        text: &str,
    ) -> HeaderEvent {
        if text.is_empty() {
            self.send_text(turn, render::CLIENT_NAME_PROMPT).await;
            return HeaderEvent::ClientRejected;
        }

        let mut client = NewClient::new(quotation.ruc.as_deref().unwrap_or_default(), turn.user.id);
        client.name = Some(text.to_owned());
        match self.ports.clients.register(&client).await {
            Ok(record) => {
                quotation.client_id = Some(record.id);
                quotation.client_name = Some(record.name.clone());
                self.send(turn, render::client_registered_as(&record)).await;
                HeaderEvent::ClientResolved
            }
            Err(error) => {
                warn!(
                    event_name = "dialogue.header.registration_failed",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    error = %error,
                    "named client registration failed"
                );
                self.send(turn, render::registration_error(&error.upstream_message())).await;
                HeaderEvent::ClientRejected
            }
        }
    }

    async fn capture_conditions(
        &self,
        turn: &Turn,
        quotation: &mut QuotationSession,
        text: &str,
    ) -> HeaderEvent {
        if text.is_empty() {
            self.send_text(turn, render::CONDITIONS_EMPTY).await;
            return HeaderEvent::SelectionRejected;
        }

        match self.ports.reference.currencies().await {
            Ok(currencies) if !currencies.is_empty() => {
                quotation.conditions = Some(text.to_owned());
                quotation.validation = Some(VALIDATION_TERM.to_owned());
                quotation.currency_options = currencies;
                HeaderEvent::ConditionsCaptured
            }
            result => {
                warn!(
                    event_name = "dialogue.header.currencies_unavailable",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    error = ?result.err(),
                    "no currencies to offer"
                );
                self.send_text(turn, render::CURRENCIES_UNAVAILABLE).await;
                HeaderEvent::UpstreamFailed
            }
        }
    }

    async fn select_currency(
        &self,
        turn: &Turn,
        quotation: &mut QuotationSession,
        text: &str,
    ) -> HeaderEvent {
        let Some(currency_id) = quotation.pick_currency(text).map(|currency| currency.id) else {
            self.send_text(turn, render::CURRENCY_INVALID).await;
            return HeaderEvent::SelectionRejected;
        };

        match self.ports.reference.payment_methods().await {
            Ok(methods) if !methods.is_empty() => {
                quotation.currency_id = Some(currency_id);
                quotation.payment_method_options = methods;
                HeaderEvent::CurrencySelected
            }
            result => {
                warn!(
                    event_name = "dialogue.header.payment_methods_unavailable",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    error = ?result.err(),
                    "no payment methods to offer"
                );
                self.send_text(turn, render::PAYMENT_METHODS_UNAVAILABLE).await;
                HeaderEvent::UpstreamFailed
            }
        }
    }

    async fn select_payment_method(
        &self,
        turn: &Turn,
        quotation: &mut QuotationSession,
        text: &str,
    ) -> HeaderEvent {
        match quotation.pick_payment_method(text).map(|method| method.id) {
            Some(method_id) => {
                quotation.payment_method_id = Some(method_id);
                HeaderEvent::PaymentMethodSelected
            }
            None => {
                self.send_text(turn, render::PAYMENT_INVALID).await;
                HeaderEvent::SelectionRejected
            }
        }
    }

    /// Creates the header, then posts every line. A failed line is reported
    /// and skipped; the document link is sent regardless.
    async fn submit(&self, turn: &Turn, quotation: &mut QuotationSession) -> HeaderEvent {
        let header = match quotation.header() {
            Ok(header) => header,
            Err(error) => {
                warn!(
                    event_name = "dialogue.header.incomplete",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    error = %error,
                    "header is missing a field"
                );
                self.send_text(turn, render::HEADER_FAILED).await;
                return HeaderEvent::HeaderRejected;
            }
        };

        self.send(turn, render::generating_quotation(quotation.client_name.as_deref())).await;
        let quotation_id = match self.ports.quotations.create_header(&header).await {
            Ok(Some(quotation_id)) => quotation_id,
            Ok(None) => {
                warn!(
                    event_name = "dialogue.header.create_failed",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    "backend returned no quotation id"
                );
                self.send_text(turn, render::HEADER_FAILED).await;
                return HeaderEvent::HeaderRejected;
            }
            Err(error) => {
                warn!(
                    event_name = "dialogue.header.create_failed",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    error = %error,
                    "quotation header request failed"
                );
                self.send_text(turn, render::HEADER_FAILED).await;
                return HeaderEvent::HeaderRejected;
            }
        };
        quotation.quotation_id = Some(quotation_id);

        let lines = quotation.lines().to_vec();
        if lines.is_empty() {
            self.send_text(turn, render::NO_LINES_TO_SUBMIT).await;
        }
        let mut failed = 0usize;
        for line in &lines {
            let record = QuotationLineRecord::for_line(quotation_id, line);
            if let Err(error) = self.ports.quotations.add_line(&record).await {
                failed += 1;
                warn!(
                    event_name = "dialogue.header.line_failed",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    quotation_id = quotation_id.0,
                    product_id = %line.product_id,
                    error = %error,
                    "failed to add quotation line"
                );
                self.send(turn, render::line_submission_failed(line)).await;
            }
        }

        let url = self.ports.quotations.document_url(quotation_id);
        self.send(
            turn,
            render::quotation_document(&url, quotation_id, quotation.client_name.as_deref()),
        )
        .await;

        let outcome = if failed == 0 { AuditOutcome::Success } else { AuditOutcome::Failed };
        self.ports.audit.emit(
            AuditEvent::new(
                &self.audit_context(turn, Some(quotation_id)),
                "quotation.submitted",
                AuditCategory::Integration,
                outcome,
            )
            .with_metadata("lines_attempted", lines.len().to_string())
            .with_metadata("lines_failed", failed.to_string()),
        );
        info!(
            event_name = "dialogue.header.submitted",
            correlation_id = %turn.correlation_id,
            session_key = %turn.key,
            quotation_id = quotation_id.0,
            lines = lines.len(),
            failed,
            "quotation submitted"
        );
        HeaderEvent::Submitted
    }
}

fn step_prompt(quotation: &QuotationSession, step: HeaderStep) -> OutboundMessage {
    render::step_prompt(step, &quotation.currency_options, &quotation.payment_method_options)
}
