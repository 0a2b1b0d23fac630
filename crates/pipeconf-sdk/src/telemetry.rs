//! Step telemetry
//!
//! One event per step run carrying the run duration and an error code
//! (`"0"` success, `"1"` failure). Delivery is up to the [`TelemetrySink`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::info;

pub const ERROR_CODE_SUCCESS: &str = "0";
pub const ERROR_CODE_FAILURE: &str = "1";

/// Telemetry of one step run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TelemetryEvent {
    pub step: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub error_code: &'static str,
}

impl TelemetryEvent {
    pub(crate) fn new(
        step: impl Into<String>,
        started_at: DateTime<Utc>,
        duration: Duration,
        success: bool,
    ) -> Self {
        Self {
            step: step.into(),
            started_at,
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            error_code: if success {
                ERROR_CODE_SUCCESS
            } else {
                ERROR_CODE_FAILURE
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.error_code == ERROR_CODE_SUCCESS
    }
}

/// Receives step telemetry
pub trait TelemetrySink: Send + Sync {
    fn send(&self, event: &TelemetryEvent);
}

/// Drops every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn send(&self, _event: &TelemetryEvent) {}
}

/// Writes events to the log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn send(&self, event: &TelemetryEvent) {
        info!(
            step = %event.step,
            duration_ms = event.duration_ms,
            error_code = event.error_code,
            "Step telemetry"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_error_codes() {
        let ok =
            TelemetryEvent::new("karmaExecuteTests", Utc::now(), Duration::from_millis(1500), true);
        assert_eq!(ok.error_code, "0");
        assert_eq!(ok.duration_ms, 1500);
        assert!(ok.is_success());

        let failed = TelemetryEvent::new("karmaExecuteTests", Utc::now(), Duration::ZERO, false);
        assert_eq!(failed.error_code, "1");
        assert!(!failed.is_success());
    }

    #[test]
    fn test_event_serializes() {
        let event =
            TelemetryEvent::new("sonarExecuteScan", Utc::now(), Duration::from_millis(7), true);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["step"], "sonarExecuteScan");
        assert_eq!(json["duration_ms"], 7);
        assert_eq!(json["error_code"], "0");
    }
}
