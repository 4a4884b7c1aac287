//! Policy store (§3 "owned by the policy store"; §5 "reader-writer gate").
//! Persistence itself is out of scope (§1) — this is the trait the engine
//! depends on plus an in-memory implementation used by tests and as a
//! default for environments with no external store wired in.

use crate::domain::Policy;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Read-mostly collaborator (§5): the monitor and keeper take read holds
/// every iteration; writes are comparatively rare (policy issuance,
/// expiry, claims).
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn all_policies(&self) -> Vec<Policy>;
    async fn get(&self, id: Uuid) -> Option<Policy>;
    async fn upsert(&self, policy: Policy);

    /// Per-asset price history, most recent last, used by the correlation
    /// matrix (§4.6). Implementations may return an empty vec for assets
    /// with no history yet.
    async fn price_history(&self, asset: crate::domain::Asset) -> Vec<f64>;
}

#[derive(Default)]
pub struct InMemoryPolicyStore {
    policies: RwLock<HashMap<Uuid, Policy>>,
    price_history: RwLock<HashMap<crate::domain::Asset, Vec<f64>>>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn seed_price_history(&self, asset: crate::domain::Asset, prices: Vec<f64>) {
        self.price_history.write().await.insert(asset, prices);
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn all_policies(&self) -> Vec<Policy> {
        self.policies.read().await.values().cloned().collect()
    }

    async fn get(&self, id: Uuid) -> Option<Policy> {
        self.policies.read().await.get(&id).cloned()
    }

    async fn upsert(&self, policy: Policy) {
        self.policies.write().await.insert(policy.id, policy);
    }

    async fn price_history(&self, asset: crate::domain::Asset) -> Vec<f64> {
        self.price_history.read().await.get(&asset).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Asset, Blockchain, CoverageType, PolicyStatus};
    use chrono::{Duration, Utc};

    fn sample_policy() -> Policy {
        let now = Utc::now();
        Policy {
            id: Uuid::new_v4(),
            coverage_type: CoverageType::Depeg,
            chain: Blockchain::Ethereum,
            asset: Asset::Usdc,
            coverage_amount_cents: 1_000_000,
            trigger_price: 0.97,
            floor_price: 0.90,
            start_ts: now,
            expiry_ts: now + Duration::days(90),
            status: PolicyStatus::Active,
        }
    }

    #[tokio::test]
    async fn upsert_then_get_round_trips() {
        let store = InMemoryPolicyStore::new();
        let policy = sample_policy();
        store.upsert(policy.clone()).await;
        let fetched = store.get(policy.id).await.unwrap();
        assert_eq!(fetched.id, policy.id);
        assert_eq!(store.all_policies().await.len(), 1);
    }
}
