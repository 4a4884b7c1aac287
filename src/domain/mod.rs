//! §3 Data Model. All reference data here (risk factors, tranche configs,
//! chain/asset/coverage tables) is process-owned and loaded at startup;
//! `MarketConditions`, `RiskSnapshot` and `HedgeCostBreakdown` are produced
//! downstream and flow through channels/caches with last-value semantics.

pub mod alert;
pub mod asset;
pub mod chain;
pub mod coverage;
pub mod market;
pub mod policy;
pub mod product;
pub mod risk;
pub mod risk_factors;
pub mod tranche;

pub use alert::{Alert, AlertKind, AlertSeverity};
pub use asset::{Asset, CorrelationGroup};
pub use chain::Blockchain;
pub use coverage::CoverageType;
pub use market::{ConsensusPrice, HedgeCostBreakdown, MarketConditions, MultiplierComponents, SwingPremium};
pub use policy::{Policy, PolicyStatus};
pub use product::{full_catalog, is_chain_stablecoin_compatible, is_product_compatible, valid_catalog, ProductKey};
pub use risk::{CorrelationRegime, RiskSnapshot, StressResult};
pub use risk_factors::StablecoinRiskFactors;
pub use tranche::{default_tranches, TrancheConfig, TrancheId};
