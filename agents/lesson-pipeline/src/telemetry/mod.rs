//! Telemetry module for the Lesson Pipeline
//!
//! One [`TelemetryEvent`](crate::contracts::TelemetryEvent) per job
//! execution, written as a JSON line to a channel that is never the job's
//! result channel (standard error or a dedicated file).
//!
//! - `emitter` - schema-checked, best-effort emission

pub mod emitter;

pub use emitter::TelemetryEmitter;

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::contracts::TelemetryEvent;

/// Telemetry errors
///
/// These never leave the emitter; they are logged and dropped.
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to serialize event: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Failed to write event: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Telemetry sink unavailable: {0}")]
    SinkUnavailable(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Where telemetry events go
#[derive(Debug, Clone, Default)]
pub enum TelemetrySink {
    /// JSON lines on standard error
    #[default]
    Stderr,
    /// JSON lines appended to a file
    File(PathBuf),
    /// In-process buffer, for tests and embedding
    Memory(Arc<Mutex<Vec<TelemetryEvent>>>),
}

impl TelemetrySink {
    pub fn from_path(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => TelemetrySink::File(path),
            None => TelemetrySink::Stderr,
        }
    }

    /// A memory sink and a handle to read back what it received
    pub fn memory() -> (Self, Arc<Mutex<Vec<TelemetryEvent>>>) {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        (TelemetrySink::Memory(Arc::clone(&buffer)), buffer)
    }

    pub(crate) fn write(&self, event: &TelemetryEvent) -> Result<()> {
        match self {
            TelemetrySink::Stderr => {
                let line = serde_json::to_string(event)?;
                let mut stderr = std::io::stderr().lock();
                writeln!(stderr, "{}", line)?;
            }
            TelemetrySink::File(path) => {
                let line = serde_json::to_string(event)?;
                let mut file = std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)?;
                writeln!(file, "{}", line)?;
            }
            TelemetrySink::Memory(buffer) => {
                buffer
                    .lock()
                    .map_err(|e| TelemetryError::SinkUnavailable(e.to_string()))?
                    .push(event.clone());
            }
        }
        Ok(())
    }
}
