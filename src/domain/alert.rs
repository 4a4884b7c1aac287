use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    /// PagerDuty `payload.severity` values (§6); anything below High maps
    /// to "warning", Low maps to "info".
    pub fn pagerduty_severity(self) -> &'static str {
        match self {
            AlertSeverity::Critical => "critical",
            AlertSeverity::High | AlertSeverity::Medium => "warning",
            AlertSeverity::Low => "info",
        }
    }
}

/// Explicit tagged variants replacing the source's union-string alerts
/// (§9 "Dynamic typing"). Each carries the fields needed to independently
/// replay the threshold decision (§3 invariant on `Alert`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AlertKind {
    LtvBreach,
    ReserveRatioBreach,
    ConcentrationBreach { group: String },
    CorrelationRegimeBreach,
    PriceStale { asset: String, age_seconds: i64 },
    AllSourcesUnavailable { input: String },
    MultiplierClamped { product: String },
    OnChainWriteFailed { product: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    pub current_value: f64,
    pub limit_value: f64,
    pub ts: DateTime<Utc>,
}

impl Alert {
    pub fn new(
        kind: AlertKind,
        severity: AlertSeverity,
        message: impl Into<String>,
        current_value: f64,
        limit_value: f64,
    ) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
            current_value,
            limit_value,
            ts: Utc::now(),
        }
    }

    /// A stable key for deduplicating repeated alerts across restarts
    /// (§9 Open Questions: "alert idempotence ... a deduplication window
    /// is recommended"). Hashes the kind and the rounded current value so
    /// near-identical repeats within a polling cadence collapse together.
    pub fn dedup_key(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(format!("{:?}", self.kind));
        hasher.update((self.current_value.round() as i64).to_le_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_key_stable_for_same_kind_and_rounded_value() {
        let a = Alert::new(AlertKind::LtvBreach, AlertSeverity::High, "x", 0.71, 0.70);
        let b = Alert::new(AlertKind::LtvBreach, AlertSeverity::Critical, "y", 0.71, 0.70);
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn dedup_key_differs_across_kinds() {
        let a = Alert::new(AlertKind::LtvBreach, AlertSeverity::High, "x", 0.71, 0.70);
        let b = Alert::new(AlertKind::ReserveRatioBreach, AlertSeverity::High, "x", 0.71, 0.70);
        assert_ne!(a.dedup_key(), b.dedup_key());
    }
}
