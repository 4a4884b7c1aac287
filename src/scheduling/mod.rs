//! Scheduling and resilience primitives (§4.9, component C9): retry with
//! backoff, a per-minute token bucket, and the fire-and-forget alert sink.
//! Shared by the external data clients, the hedge fetcher and the oracle
//! keeper rather than duplicated per subsystem.

pub mod alert_sink;
pub mod rate_limiter;
pub mod retry;

pub use alert_sink::{AlertSink, LoggingAlertSink, PagerDutyAlertSink};
pub use rate_limiter::RateLimiter;
pub use retry::with_backoff;
