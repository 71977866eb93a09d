use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use cotiza_core::session::{AppointmentProgress, AppointmentRecord, SessionKey, SessionState};

use crate::dialogue::{DialogueEngine, Turn};
use crate::render;

/// Completed booking as persisted by an [`AppointmentBook`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedAppointment {
    pub session_key: String,
    pub name: String,
    pub pet_name: String,
    pub pet_type: String,
    pub reason: String,
    pub booked_at: DateTime<Utc>,
}

impl BookedAppointment {
    pub fn new(key: &SessionKey, record: &AppointmentRecord) -> Self {
        Self {
            session_key: key.as_str().to_owned(),
            name: record.owner_name.clone(),
            pet_name: record.pet_name.clone(),
            pet_type: record.pet_type.clone(),
            reason: record.reason.clone(),
            booked_at: record.booked_at,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AppointmentBookError {
    #[error("appointment could not be stored: {0}")]
    Storage(String),
}

#[async_trait]
pub trait AppointmentBook: Send + Sync {
    async fn record(&self, appointment: &BookedAppointment) -> Result<(), AppointmentBookError>;
}

#[derive(Debug, Default)]
pub struct InMemoryAppointmentBook {
    entries: Mutex<Vec<BookedAppointment>>,
}

impl InMemoryAppointmentBook {
    pub fn entries(&self) -> Vec<BookedAppointment> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

#[async_trait]
impl AppointmentBook for InMemoryAppointmentBook {
    async fn record(&self, appointment: &BookedAppointment) -> Result<(), AppointmentBookError> {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(appointment.clone()),
            Err(poisoned) => poisoned.into_inner().push(appointment.clone()),
        }
        Ok(())
    }
}

impl DialogueEngine {
    pub(crate) async fn book_appointment(&self, turn: &Turn, state: &mut SessionState) {
        match state.start_appointment() {
            Ok(session) => {
                let step = session.step;
                self.send(turn, render::appointment_prompt(step)).await;
            }
            Err(_) => self.send_text(turn, render::APPOINTMENT_BLOCKED).await,
        }
    }

    pub(crate) async fn appointment_answer(&self, turn: &Turn, state: &mut SessionState, text: &str) {
        let Some(session) = state.appointment_mut() else {
            return;
        };

        match session.record_answer(text, Utc::now()) {
            AppointmentProgress::Next(step) => self.send(turn, render::appointment_prompt(step)).await,
            AppointmentProgress::Completed(record) => {
                state.clear();
                let booked = BookedAppointment::new(&turn.key, &record);
                if let Err(error) = self.ports.appointments.record(&booked).await {
                    warn!(
                        event_name = "dialogue.appointment.store_failed",
                        correlation_id = %turn.correlation_id,
                        session_key = %turn.key,
                        error = %error,
                        "failed to store appointment"
                    );
                } else {
                    info!(
                        event_name = "dialogue.appointment.booked",
                        correlation_id = %turn.correlation_id,
                        session_key = %turn.key,
                        "appointment booked"
                    );
                }
                self.send(turn, render::appointment_summary(&record)).await;
            }
        }
    }
}
