use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use crate::domain::user::UserId;
use crate::errors::DomainError;
use crate::session::appointment::AppointmentSession;
use crate::session::quotation::QuotationSession;

/// Sender identity normalized to bare digits, e.g. `51999888777`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn from_address(address: &str) -> Self {
        let trimmed = address.trim();
        let local = trimmed.strip_suffix("@c.us").unwrap_or(trimmed);
        let local = local.strip_prefix('+').unwrap_or(local);
        Self(local.chars().filter(|ch| !ch.is_whitespace()).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationKind {
    Appointment,
    Quotation,
}

/// Everything remembered about one sender between messages. At most one of
/// the appointment booking and the quotation is active at a time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    appointment: Option<AppointmentSession>,
    quotation: Option<QuotationSession>,
    last_activity: DateTime<Utc>,
}

impl SessionState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { appointment: None, quotation: None, last_activity: now }
    }

    pub fn conversation(&self) -> Option<ConversationKind> {
        if self.quotation.is_some() {
            Some(ConversationKind::Quotation)
        } else if self.appointment.is_some() {
            Some(ConversationKind::Appointment)
        } else {
            None
        }
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    pub fn is_empty(&self) -> bool {
        self.conversation().is_none()
    }

    pub fn clear(&mut self) {
        self.appointment = None;
        self.quotation = None;
    }

    pub fn quotation(&self) -> Option<&QuotationSession> {
        self.quotation.as_ref()
    }

    pub fn quotation_mut(&mut self) -> Option<&mut QuotationSession> {
        self.quotation.as_mut()
    }

    pub fn appointment_mut(&mut self) -> Option<&mut AppointmentSession> {
        self.appointment.as_mut()
    }

    /// Returns the active quotation, starting one when none exists.
    /// An unfinished appointment booking is dropped.
    pub fn ensure_quotation(&mut self, owner: UserId, free_search: bool) -> &mut QuotationSession {
        self.appointment = None;
        self.quotation.get_or_insert_with(|| QuotationSession::new(owner, free_search))
    }

    pub fn start_appointment(&mut self) -> Result<&mut AppointmentSession, DomainError> {
        if self.quotation.is_some() {
            return Err(DomainError::FlowConflict);
        }
        Ok(self.appointment.insert(AppointmentSession::new()))
    }
}

/// Per-sender conversation state.
///
/// Each sender gets its own async mutex so that two messages from the same
/// number are handled one after the other while different senders proceed
/// in parallel.
#[derive(Default)]
pub struct SessionStore {
    slots: RwLock<HashMap<SessionKey, Arc<Mutex<SessionState>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn slot(&self, key: &SessionKey) -> Arc<Mutex<SessionState>> {
        if let Some(slot) = self.slots.read().await.get(key) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().await;
        Arc::clone(
            slots
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(SessionState::new(Utc::now())))),
        )
    }

    pub async fn snapshot(&self, key: &SessionKey) -> Option<SessionState> {
        let slot = self.slots.read().await.get(key).cloned()?;
        let state = slot.lock().await;
        Some(state.clone())
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }

    /// Drops sessions idle for longer than `ttl` and slots holding no
    /// conversation. A slot still referenced outside the map belongs to an
    /// in-flight message and is left alone, locked or not.
    pub async fn evict_idle(&self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let mut slots = self.slots.write().await;
        let before = slots.len();
        slots.retain(|_, slot| {
            if Arc::strong_count(slot) > 1 {
                return true;
            }
            match slot.try_lock() {
                Ok(state) => !state.is_empty() && now - state.last_activity() <= ttl,
                Err(_) => true,
            }
        });
        before - slots.len()
    }
}
