use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cotiza_agent::{AppointmentBook, AppointmentBookError, BookedAppointment};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Appends one JSON object per completed appointment to a ledger file.
pub struct JsonlAppointmentBook {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlAppointmentBook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn storage(error: impl std::fmt::Display) -> AppointmentBookError {
    AppointmentBookError::Storage(error.to_string())
}

#[async_trait]
impl AppointmentBook for JsonlAppointmentBook {
    async fn record(&self, appointment: &BookedAppointment) -> Result<(), AppointmentBookError> {
        let mut line = serde_json::to_string(appointment).map_err(storage)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(storage)?;
        }
        let mut file =
            OpenOptions::new().create(true).append(true).open(&self.path).await.map_err(storage)?;
        file.write_all(line.as_bytes()).await.map_err(storage)?;
        file.flush().await.map_err(storage)
    }
}
