use cotiza_core::audit::{AuditEvent, AuditSink};
use tracing::info;

/// Forwards audit events to the log stream.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        let quotation_id = event.quotation_id.map(|id| id.to_string()).unwrap_or_default();
        info!(
            event_name = %event.event_type,
            event_id = %event.event_id,
            correlation_id = %event.correlation_id,
            session_key = %event.session_key,
            quotation_id = %quotation_id,
            category = ?event.category,
            outcome = ?event.outcome,
            actor = %event.actor,
            metadata = ?event.metadata,
            "audit event"
        );
    }
}
