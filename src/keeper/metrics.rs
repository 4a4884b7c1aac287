//! Keeper run-time metrics (§4.8, §9 "Global state"). A dependency-injected
//! handle, read by `src/metrics` for Prometheus export and by any status
//! endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

pub struct KeeperMetrics {
    successful_updates: AtomicU64,
    failed_updates: AtomicU64,
    last_update_time: RwLock<Option<DateTime<Utc>>>,
    last_error: RwLock<Option<String>>,
    avg_update_duration_secs: RwLock<f64>,
    consecutive_failures: AtomicU32,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeeperMetricsSnapshot {
    pub successful_updates: u64,
    pub failed_updates: u64,
    pub last_update_time: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub avg_update_duration_secs: f64,
    pub consecutive_failures: u32,
}

impl KeeperMetrics {
    pub fn new() -> Self {
        Self {
            successful_updates: AtomicU64::new(0),
            failed_updates: AtomicU64::new(0),
            last_update_time: RwLock::new(None),
            last_error: RwLock::new(None),
            avg_update_duration_secs: RwLock::new(0.0),
            consecutive_failures: AtomicU32::new(0),
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures.load(Ordering::Relaxed)
    }

    pub async fn record_product_success(&self, duration: Duration) {
        self.successful_updates.fetch_add(1, Ordering::Relaxed);
        *self.last_update_time.write().await = Some(Utc::now());
        let mut avg = self.avg_update_duration_secs.write().await;
        *avg = if *avg == 0.0 {
            duration.as_secs_f64()
        } else {
            *avg * 0.8 + duration.as_secs_f64() * 0.2
        };
    }

    pub async fn record_product_failure(&self, error: String) {
        self.failed_updates.fetch_add(1, Ordering::Relaxed);
        *self.last_error.write().await = Some(error);
    }

    /// Called once per iteration: resets the streak on any success, bumps
    /// it otherwise (§7 "Backoff: consecutive full-iteration failures").
    pub fn record_iteration_outcome(&self, had_success: bool) {
        if had_success {
            self.consecutive_failures.store(0, Ordering::Relaxed);
        } else {
            self.consecutive_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub async fn snapshot(&self) -> KeeperMetricsSnapshot {
        KeeperMetricsSnapshot {
            successful_updates: self.successful_updates.load(Ordering::Relaxed),
            failed_updates: self.failed_updates.load(Ordering::Relaxed),
            last_update_time: *self.last_update_time.read().await,
            last_error: self.last_error.read().await.clone(),
            avg_update_duration_secs: *self.avg_update_duration_secs.read().await,
            consecutive_failures: self.consecutive_failures(),
        }
    }
}

impl Default for KeeperMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn success_resets_failure_streak() {
        let metrics = KeeperMetrics::new();
        metrics.record_iteration_outcome(false);
        metrics.record_iteration_outcome(false);
        assert_eq!(metrics.consecutive_failures(), 2);
        metrics.record_iteration_outcome(true);
        assert_eq!(metrics.consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn snapshot_reflects_recorded_product_outcomes() {
        let metrics = KeeperMetrics::new();
        metrics.record_product_success(Duration::from_millis(50)).await;
        metrics.record_product_failure("boom".to_string()).await;
        let snap = metrics.snapshot().await;
        assert_eq!(snap.successful_updates, 1);
        assert_eq!(snap.failed_updates, 1);
        assert_eq!(snap.last_error.as_deref(), Some("boom"));
    }
}
