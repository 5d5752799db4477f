use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::warn;

/// Health check payloads.
pub mod health;
/// Room, queue and member projections.
pub mod room;
/// Field validators shared by HTTP and WebSocket input.
pub mod validation;
/// WebSocket protocol messages.
pub mod ws;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|err| {
            warn!(error = %err, "failed to format timestamp");
            "invalid-timestamp".into()
        })
}
