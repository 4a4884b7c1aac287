//! Alert delivery (§4.9, §6). `AlertSink` is the injected collaborator the
//! Risk Monitor and Oracle Keeper push into; delivery is fire-and-forget —
//! a sink failure is logged and never propagated into the producing loop
//! (§7).

use crate::domain::Alert;
use crate::error::AlertSinkError;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{error, warn};
use uuid::Uuid;

#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, alert: &Alert) -> Result<(), AlertSinkError>;
}

/// Posts a PagerDuty Events v2 payload (§6 wire shape).
pub struct PagerDutyAlertSink {
    client: reqwest::Client,
    url: String,
    routing_key: String,
}

impl PagerDutyAlertSink {
    pub fn new(url: String, routing_key: String, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .expect("reqwest client config is valid"),
            url,
            routing_key,
        }
    }
}

#[async_trait]
impl AlertSink for PagerDutyAlertSink {
    async fn send(&self, alert: &Alert) -> Result<(), AlertSinkError> {
        let body = json!({
            "routing_key": self.routing_key,
            "event_action": "trigger",
            "dedup_key": alert.dedup_key(),
            "payload": {
                "summary": alert.message,
                "severity": alert.severity.pagerduty_severity(),
                "source": "sure-risk-engine",
                "custom_details": {
                    "kind": format!("{:?}", alert.kind),
                    "current_value": alert.current_value,
                    "limit_value": alert.limit_value,
                    "ts": alert.ts.to_rfc3339(),
                },
            },
        });

        let response = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AlertSinkError(format!("pagerduty request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(AlertSinkError(format!(
                "pagerduty returned status {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// No external dependency: logs the alert at a severity-appropriate level.
/// Used when no PagerDuty routing key is configured and in tests.
pub struct LoggingAlertSink;

#[async_trait]
impl AlertSink for LoggingAlertSink {
    async fn send(&self, alert: &Alert) -> Result<(), AlertSinkError> {
        match alert.severity {
            crate::domain::AlertSeverity::Critical | crate::domain::AlertSeverity::High => {
                error!(kind = ?alert.kind, value = alert.current_value, "{}", alert.message)
            }
            _ => warn!(kind = ?alert.kind, value = alert.current_value, "{}", alert.message),
        }
        Ok(())
    }
}

/// Wraps any `AlertSink` so delivery failures are logged rather than
/// returned; use at the call site where an alert is produced.
pub async fn deliver(sink: &dyn AlertSink, alert: &Alert) {
    if let Err(e) = sink.send(alert).await {
        error!(error = %e, alert_id = %Uuid::new_v4(), "failed to deliver alert");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AlertKind, AlertSeverity};

    #[tokio::test]
    async fn logging_sink_never_fails() {
        let sink = LoggingAlertSink;
        let alert = Alert::new(AlertKind::LtvBreach, AlertSeverity::High, "ltv high", 0.8, 0.7);
        assert!(sink.send(&alert).await.is_ok());
    }
}
