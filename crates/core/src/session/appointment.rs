use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStep {
    OwnerName,
    PetName,
    PetType,
    Reason,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub owner_name: String,
    pub pet_name: String,
    pub pet_type: String,
    pub reason: String,
    pub booked_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AppointmentProgress {
    Next(AppointmentStep),
    Completed(AppointmentRecord),
}

/// Four-question booking wizard reached from the welcome menu.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentSession {
    pub step: AppointmentStep,
    owner_name: Option<String>,
    pet_name: Option<String>,
    pet_type: Option<String>,
}

impl Default for AppointmentSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AppointmentSession {
    pub fn new() -> Self {
        Self { step: AppointmentStep::OwnerName, owner_name: None, pet_name: None, pet_type: None }
    }

    pub fn record_answer(&mut self, answer: &str, now: DateTime<Utc>) -> AppointmentProgress {
        let answer = answer.trim().to_owned();
        match self.step {
            AppointmentStep::OwnerName => {
                self.owner_name = Some(answer);
                self.step = AppointmentStep::PetName;
            }
            AppointmentStep::PetName => {
                self.pet_name = Some(answer);
                self.step = AppointmentStep::PetType;
            }
            AppointmentStep::PetType => {
                self.pet_type = Some(answer);
                self.step = AppointmentStep::Reason;
            }
            AppointmentStep::Reason => {
                return AppointmentProgress::Completed(AppointmentRecord {
                    owner_name: self.owner_name.clone().unwrap_or_default(),
                    pet_name: self.pet_name.clone().unwrap_or_default(),
                    pet_type: self.pet_type.clone().unwrap_or_default(),
                    reason: answer,
                    booked_at: now,
                });
            }
        }
        AppointmentProgress::Next(self.step)
    }
}
