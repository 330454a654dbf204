//! Best-effort telemetry emitter
//!
//! The payload is checked against the telemetry schema first. A failed check
//! prints the diagnostic to standard error and the event is written anyway;
//! a failed write is logged and dropped. Nothing here can change a job's
//! outcome.

use lesson_schema::Schema;

use super::{Result, TelemetryError, TelemetrySink};
use crate::contracts::{SchemaId, TelemetryEvent};

pub struct TelemetryEmitter {
    sink: TelemetrySink,
    schema: Option<&'static Schema>,
}

impl TelemetryEmitter {
    pub fn new(sink: TelemetrySink) -> Self {
        let schema = match SchemaId::TelemetryEvent.compiled() {
            Ok(schema) => Some(schema),
            Err(e) => {
                tracing::warn!(error = %e, "telemetry schema unavailable, events will not be checked");
                None
            }
        };
        Self { sink, schema }
    }

    pub fn sink(&self) -> &TelemetrySink {
        &self.sink
    }

    /// Emit one event; never fails
    pub fn emit(&self, event: &TelemetryEvent) {
        if let Err(e) = self.try_emit(event) {
            tracing::warn!(
                job_id = %event.job_id,
                error = %e,
                "Failed to emit telemetry event"
            );
        } else {
            tracing::debug!(
                job_id = %event.job_id,
                path = event.path.as_str(),
                status = %event.status,
                latency_ms = event.latency_ms,
                error_code = event.error_code.as_deref().unwrap_or(""),
                "emitted telemetry event"
            );
        }
    }

    fn try_emit(&self, event: &TelemetryEvent) -> Result<()> {
        if let Some(schema) = self.schema {
            let value = serde_json::to_value(event).map_err(TelemetryError::from)?;
            let report = schema.validate(&value);
            if !report.valid {
                eprintln!(
                    "telemetry event for job '{}' failed schema validation:\n{}",
                    event.job_id,
                    report.diagnostic()
                );
            }
        }
        self.sink.write(event)
    }
}
