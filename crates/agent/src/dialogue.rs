use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use cotiza_core::audit::{AuditContext, AuditSink};
use cotiza_core::backend::{
    CatalogGateway, ClientGateway, QuotationGateway, ReferenceDataGateway, UserDirectory,
};
use cotiza_core::domain::quotation::QuotationId;
use cotiza_core::domain::user::User;
use cotiza_core::flows::HeaderFlow;
use cotiza_core::session::{
    ConversationKind, Direction, EditField, QuotationSession, SessionKey, SessionState,
    SessionStore,
};
use cotiza_whatsapp::{Action, InboundMessage, MessageKind, Messenger, OutboundMessage};

use crate::appointment::AppointmentBook;
use crate::intent::IntentClassifier;
use crate::llm::Transcriber;
use crate::matcher::ProductMatcher;
use crate::render;
use crate::text::fold;

/// Every port the engine talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub messenger: Arc<dyn Messenger>,
    pub users: Arc<dyn UserDirectory>,
    pub catalog: Arc<dyn CatalogGateway>,
    pub clients: Arc<dyn ClientGateway>,
    pub reference: Arc<dyn ReferenceDataGateway>,
    pub quotations: Arc<dyn QuotationGateway>,
    pub classifier: Arc<dyn IntentClassifier>,
    pub matcher: Arc<dyn ProductMatcher>,
    pub transcriber: Arc<dyn Transcriber>,
    pub appointments: Arc<dyn AppointmentBook>,
    pub audit: Arc<dyn AuditSink>,
}

/// Which handler consumed an inbound message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Unauthorized,
    IdentityUnavailable,
    Action(Action),
    UnknownAction,
    HeaderWizard,
    Appointment,
    FieldEdit,
    FreeSearch,
    StockQuery,
    ClientRegistration,
    WelcomeMenu,
    VoiceFailed,
    Ignored,
}

/// Sender of the message being handled.
pub(crate) struct Turn {
    pub to: String,
    pub key: SessionKey,
    pub user: User,
    pub correlation_id: String,
}

/// Drives one WhatsApp conversation per sender through search, line edits,
/// the quotation header wizard and appointment booking.
///
/// Precedence for each message, first match wins:
/// 1. reply-button selections
/// 2. an active header wizard (or appointment booking) takes the raw text
/// 3. a line item waiting for a new quantity, price or discount
/// 4. free product search mode
/// 5. stock intent classification, then the `registrar cliente` and `menu` commands
pub struct DialogueEngine {
    pub(crate) ports: Collaborators,
    sessions: Arc<SessionStore>,
    pub(crate) header_flow: HeaderFlow,
}

impl DialogueEngine {
    pub fn new(ports: Collaborators, sessions: Arc<SessionStore>) -> Self {
        Self { ports, sessions, header_flow: HeaderFlow::new() }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Processes one inbound message to completion. Never fails: every
    /// problem ends in a reply to the sender or a log line.
    pub async fn handle(&self, message: &InboundMessage) -> Route {
        let key = message.session_key();
        info!(
            event_name = "ingress.whatsapp.message_received",
            correlation_id = %message.message_id,
            session_key = %key,
            kind = message.kind.label(),
            "received whatsapp message"
        );

        if let Err(error) = self.ports.messenger.mark_read(&message.message_id).await {
            warn!(
                event_name = "egress.whatsapp.read_receipt_failed",
                correlation_id = %message.message_id,
                session_key = %key,
                error = %error,
                "failed to mark message as read"
            );
        }

        let user = match self.ports.users.find_by_number(key.as_str()).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                info!(
                    event_name = "dialogue.identity.rejected",
                    correlation_id = %message.message_id,
                    session_key = %key,
                    "sender is not an authorised user"
                );
                self.deliver(&message.from, &message.message_id, &key, render::unauthorized(key.as_str()))
                    .await;
                return Route::Unauthorized;
            }
            Err(error) => {
                warn!(
                    event_name = "dialogue.identity.lookup_failed",
                    correlation_id = %message.message_id,
                    session_key = %key,
                    error = %error,
                    "user lookup failed"
                );
                self.deliver(
                    &message.from,
                    &message.message_id,
                    &key,
                    OutboundMessage::text(render::GENERIC_ERROR),
                )
                .await;
                return Route::IdentityUnavailable;
            }
        };

        let turn = Turn {
            to: message.from.clone(),
            key,
            user,
            correlation_id: message.message_id.clone(),
        };

        let slot = self.sessions.slot(&turn.key).await;
        let mut state = slot.lock().await;
        state.touch(Utc::now());

        let route = match &message.kind {
            MessageKind::Interactive { option_id } => {
                self.on_interactive(&turn, &mut state, option_id).await
            }
            MessageKind::Text(body) => self.on_text(&turn, &mut state, body).await,
            MessageKind::Audio { media_id } => self.on_voice(&turn, &mut state, media_id).await,
            MessageKind::Unsupported { message_type } => {
                debug!(
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    message_type = %message_type,
                    "ignoring unsupported message type"
                );
                Route::Ignored
            }
        };

        info!(
            event_name = "dialogue.turn.completed",
            correlation_id = %turn.correlation_id,
            session_key = %turn.key,
            route = ?route,
            conversation = ?state.conversation(),
            "dialogue turn completed"
        );
        route
    }

    async fn on_interactive(&self, turn: &Turn, state: &mut SessionState, option_id: &str) -> Route {
        let action = match Action::parse(option_id) {
            Ok(action) => action,
            Err(error) => {
                info!(
                    event_name = "dialogue.action.unknown",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    error = %error,
                    "ignoring unknown reply-button id"
                );
                return Route::UnknownAction;
            }
        };

        if let Some(index) = action.line_index() {
            let len = state.quotation().map_or(0, |quotation| quotation.lines().len());
            if index >= len {
                info!(
                    event_name = "dialogue.action.stale_index",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    action = %action,
                    len,
                    "reply-button index is out of range"
                );
                self.send_text(turn, render::LINE_GONE).await;
                return Route::Action(action);
            }
        }

        if edits_lines(&action) && state.quotation().is_some_and(QuotationSession::wizard_active) {
            self.send_text(turn, render::FINISH_HEADER_FIRST).await;
            return Route::Action(action);
        }

        match action {
            Action::FinalizeQuotation => self.finalize_quotation(turn, state).await,
            Action::ModifyQuotation => self.modify_quotation(turn, state).await,
            Action::ConfirmQuotation => self.confirm_quotation(turn, state).await,
            Action::CancelQuotation => self.cancel_quotation(turn, state).await,
            Action::AddMore => self.add_more(turn, state).await,
            Action::ChangeSelectedQuantity => self.change_selected_quantity(turn, state).await,
            Action::DeleteSelected => self.delete_selected(turn, state).await,
            Action::ShowSimilar => self.show_similar(turn, state).await,
            Action::NextSimilar => self.next_similar(turn, state).await,
            Action::CancelSimilar => self.cancel_similar(turn, state).await,
            Action::PreviousLine => self.navigate(turn, state, Direction::Previous).await,
            Action::NextLine => self.navigate(turn, state, Direction::Next).await,
            Action::BookAppointment => self.book_appointment(turn, state).await,
            Action::StartManualQuotation => self.start_manual_quotation(turn, state).await,
            Action::EditQuantity(index) => self.edit_field(turn, state, index, EditField::Quantity).await,
            Action::EditPrice(index) => self.edit_field(turn, state, index, EditField::Price).await,
            Action::EditDiscount(index) => {
                self.edit_field(turn, state, index, EditField::Discount).await
            }
            Action::DeleteLine(index) => self.delete_line(turn, state, index).await,
            Action::SelectLine(index) => self.select_line(turn, state, index).await,
            Action::QuoteProduct(product_id) => self.quote_product(turn, state, product_id).await,
        }
        Route::Action(action)
    }

    async fn on_text(&self, turn: &Turn, state: &mut SessionState, raw: &str) -> Route {
        let text = raw.trim();

        if state.quotation().is_some_and(QuotationSession::wizard_active) {
            self.header_input(turn, state, text).await;
            return Route::HeaderWizard;
        }
        if state.conversation() == Some(ConversationKind::Appointment) {
            self.appointment_answer(turn, state, text).await;
            return Route::Appointment;
        }
        if let Some(quotation) =
            state.quotation_mut().filter(|quotation| quotation.awaiting_field().is_some())
        {
            self.commit_field(turn, quotation, text).await;
            return Route::FieldEdit;
        }
        if state.quotation().is_some_and(|quotation| quotation.free_search) {
            self.search_products(turn, state, text).await;
            return Route::FreeSearch;
        }

        let intent = self.ports.classifier.classify_stock_intent(text).await;
        debug!(
            correlation_id = %turn.correlation_id,
            session_key = %turn.key,
            intent = ?intent,
            "classified stock intent"
        );
        if intent.wants_search() {
            self.search_products(turn, state, text).await;
            return Route::StockQuery;
        }

        let folded = fold(text);
        if folded.starts_with("registrar cliente") {
            self.register_client_command(turn, text).await;
            return Route::ClientRegistration;
        }
        if folded == "menu" {
            self.send(turn, render::welcome_menu()).await;
            return Route::WelcomeMenu;
        }
        Route::Ignored
    }

    /// Voice notes are transcribed once and handled as text.
    async fn on_voice(&self, turn: &Turn, state: &mut SessionState, media_id: &str) -> Route {
        let audio = match self.ports.messenger.fetch_media(media_id).await {
            Ok(audio) => audio,
            Err(error) => {
                warn!(
                    event_name = "ingress.whatsapp.media_download_failed",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    error = %error,
                    "failed to download voice note"
                );
                self.send_text(turn, render::VOICE_ERROR).await;
                return Route::VoiceFailed;
            }
        };

        let transcript = match self.ports.transcriber.transcribe(audio).await {
            Ok(transcript) => transcript,
            Err(error) => {
                warn!(
                    event_name = "ingress.whatsapp.transcription_failed",
                    correlation_id = %turn.correlation_id,
                    session_key = %turn.key,
                    error = %error,
                    "failed to transcribe voice note"
                );
                self.send_text(turn, render::VOICE_ERROR).await;
                return Route::VoiceFailed;
            }
        };

        let transcript = transcript.trim();
        if transcript.is_empty() {
            self.send_text(turn, render::VOICE_EMPTY).await;
            return Route::VoiceFailed;
        }
        info!(
            event_name = "ingress.whatsapp.voice_transcribed",
            correlation_id = %turn.correlation_id,
            session_key = %turn.key,
            chars = transcript.chars().count(),
            "voice note transcribed"
        );
        self.on_text(turn, state, transcript).await
    }

    async fn finalize_quotation(&self, turn: &Turn, state: &mut SessionState) {
        let lines = state.quotation().map(QuotationSession::lines).unwrap_or_default();
        if lines.is_empty() {
            self.send_text(turn, render::NO_LINES).await;
            return;
        }
        self.send(turn, render::quotation_summary(lines)).await;
        self.send(turn, render::before_confirm()).await;
    }

    async fn add_more(&self, turn: &Turn, state: &mut SessionState) {
        let quotation = state.ensure_quotation(turn.user.id, true);
        if quotation.wizard_active() {
            self.send_text(turn, render::FINISH_HEADER_FIRST).await;
            return;
        }
        quotation.free_search = true;
        quotation.edit = None;
        self.send_text(turn, render::ADD_MORE_PROMPT).await;
    }

    pub(crate) fn audit_context(&self, turn: &Turn, quotation_id: Option<QuotationId>) -> AuditContext {
        AuditContext::new(
            turn.key.as_str(),
            quotation_id,
            turn.correlation_id.as_str(),
            turn.user.id.to_string(),
        )
    }

    pub(crate) async fn send(&self, turn: &Turn, message: OutboundMessage) {
        self.deliver(&turn.to, &turn.correlation_id, &turn.key, message).await;
    }

    pub(crate) async fn send_text(&self, turn: &Turn, body: &str) {
        self.send(turn, OutboundMessage::text(body)).await;
    }

    /// Outbound sends never change session state; failures are only logged.
    async fn deliver(&self, to: &str, correlation_id: &str, key: &SessionKey, message: OutboundMessage) {
        if let Err(error) = self.ports.messenger.send(to, &message).await {
            warn!(
                event_name = "egress.whatsapp.delivery_failed",
                correlation_id = %correlation_id,
                session_key = %key,
                error = %error,
                "failed to deliver whatsapp message"
            );
        }
    }
}

/// Actions that add or touch line items, refused while the header wizard runs.
fn edits_lines(action: &Action) -> bool {
    matches!(
        action,
        Action::QuoteProduct(_)
            | Action::ModifyQuotation
            | Action::ChangeSelectedQuantity
            | Action::DeleteSelected
            | Action::PreviousLine
            | Action::NextLine
            | Action::EditQuantity(_)
            | Action::EditPrice(_)
            | Action::EditDiscount(_)
            | Action::DeleteLine(_)
            | Action::SelectLine(_)
    )
}
