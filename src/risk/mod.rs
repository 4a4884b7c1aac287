//! Risk Model and Risk Monitor (§4.6-4.7, components C6-C7).

pub mod model;
pub mod monitor;

pub use monitor::RiskMonitor;
