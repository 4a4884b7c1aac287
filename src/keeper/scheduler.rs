//! Adaptive scheduling (§4.8 "Adaptive scheduling"): a single 5s timer
//! picks one of three strategies from how long it has been since the last
//! full sweep.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStrategy {
    /// All valid products, batched.
    Full,
    /// Top-N products by recent activity.
    Hot,
    /// Products with no update in longer than the hot threshold.
    Stale,
}

impl UpdateStrategy {
    /// Prometheus label value (`keeper_update_*_total{strategy=...}`).
    pub fn label(self) -> &'static str {
        match self {
            UpdateStrategy::Full => "full",
            UpdateStrategy::Hot => "hot",
            UpdateStrategy::Stale => "stale",
        }
    }
}

/// §4.8: `time_since_last_full > full_after_secs` selects `Full`,
/// `> hot_after_secs` selects `Hot`, otherwise `Stale`. No prior full sweep
/// (`last_full = None`) always selects `Full`.
pub fn select_strategy(now: DateTime<Utc>, last_full: Option<DateTime<Utc>>, full_after_secs: i64, hot_after_secs: i64) -> UpdateStrategy {
    let since_full = match last_full {
        None => return UpdateStrategy::Full,
        Some(t) => (now - t).num_seconds(),
    };
    if since_full > full_after_secs {
        UpdateStrategy::Full
    } else if since_full > hot_after_secs {
        UpdateStrategy::Hot
    } else {
        UpdateStrategy::Stale
    }
}
