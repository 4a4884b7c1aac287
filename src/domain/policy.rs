use super::{Asset, Blockchain, CoverageType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PolicyStatus {
    Active,
    Expired,
    Claimed,
    Cancelled,
}

/// A parametric policy, owned by the policy store and read-only to the
/// engine (§3). `floor_price < trigger_price <= 1.0` and
/// `start_ts < expiry_ts` are maintained by the store; the engine trusts
/// them but `Policy::validate` is provided so tests and fixtures can check
/// the invariant directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub id: Uuid,
    pub coverage_type: CoverageType,
    pub chain: Blockchain,
    pub asset: Asset,
    pub coverage_amount_cents: u64,
    pub trigger_price: f64,
    pub floor_price: f64,
    pub start_ts: DateTime<Utc>,
    pub expiry_ts: DateTime<Utc>,
    pub status: PolicyStatus,
}

impl Policy {
    pub fn coverage_usd(&self) -> f64 {
        self.coverage_amount_cents as f64 / 100.0
    }

    pub fn duration_days(&self) -> f64 {
        (self.expiry_ts - self.start_ts).num_seconds() as f64 / 86_400.0
    }

    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        matches!(self.status, PolicyStatus::Active) && at >= self.start_ts && at < self.expiry_ts
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.floor_price < self.trigger_price && self.trigger_price <= 1.0) {
            return Err(format!(
                "invariant violated: floor_price ({}) < trigger_price ({}) <= 1.0",
                self.floor_price, self.trigger_price
            ));
        }
        if !(self.start_ts < self.expiry_ts) {
            return Err("invariant violated: start_ts < expiry_ts".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample() -> Policy {
        let now = Utc::now();
        Policy {
            id: Uuid::new_v4(),
            coverage_type: CoverageType::Depeg,
            chain: Blockchain::Ethereum,
            asset: Asset::Usdc,
            coverage_amount_cents: 10_000_000_00,
            trigger_price: 0.97,
            floor_price: 0.90,
            start_ts: now,
            expiry_ts: now + Duration::days(90),
            status: PolicyStatus::Active,
        }
    }

    #[test]
    fn valid_policy_passes() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn floor_must_be_below_trigger() {
        let mut p = sample();
        p.floor_price = 0.98;
        assert!(p.validate().is_err());
    }

    #[test]
    fn trigger_must_not_exceed_one() {
        let mut p = sample();
        p.trigger_price = 1.01;
        assert!(p.validate().is_err());
    }
}
