//! External Data Clients (§4.5, component C5). Each upstream sits behind a
//! small trait so the keeper, monitor and hedge fetcher can be exercised
//! against fixtures instead of live HTTP in tests (teacher pattern:
//! `services/blockchain_service.rs` wraps per-chain providers behind one
//! service; here each upstream gets its own trait instead of one god
//! object, since each has an independent failure mode).

pub mod bridge;
pub mod cex;
pub mod chain_metrics;
pub mod hedge_venues;
pub mod oracle;

pub use bridge::{BridgeHealthClient, HttpBridgeHealthClient};
pub use cex::{CexClient, HttpCexClient};
pub use chain_metrics::{ChainMetricsClient, HttpChainMetricsClient};
pub use hedge_venues::HttpHedgeMarketData;
pub use oracle::{OracleAggregator, PriceSource};
