use thiserror::Error;

/// Errors surfaced by external data/hedge-venue fetches (§4.5, §7).
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("request timed out")]
    Timeout,
    #[error("rate limited")]
    RateLimited,
    #[error("upstream returned status {0}")]
    Upstream(u16),
    #[error("failed to parse upstream response: {0}")]
    Parse(String),
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
}

/// Pure numeric failures in the risk model (§4.6, §7): insufficient data,
/// degenerate correlation, and similar. No I/O ever produces this error.
#[derive(Debug, Clone, Error)]
#[error("math error: {0}")]
pub struct MathError(pub String);

/// Missing required configuration at startup; fatal (§7).
#[derive(Debug, Clone, Error)]
#[error("configuration error: {0}")]
pub struct ConfigLoadError(pub String);

/// Signer/submission failures in the oracle keeper; non-fatal for the
/// keeper loop (§7, §4.8).
#[derive(Debug, Clone, Error)]
pub enum OnChainError {
    #[error("signer failed: {0}")]
    SignerFailure(String),
    #[error("insufficient gas")]
    InsufficientGas,
    #[error("transaction reverted with exit code {0}")]
    NonZeroExit(i32),
    #[error("confirmation not observed within the poll budget")]
    ConfirmationTimeout,
}

/// Alert-sink delivery failures; fire-and-forget, logged only, never
/// propagated into the producing loop (§7, §4.9).
#[derive(Debug, Clone, Error)]
#[error("alert sink error: {0}")]
pub struct AlertSinkError(pub String);

/// Top-level error type for the engine. Each subsystem error converts into
/// this via `#[from]` so call sites can use `?` uniformly while still being
/// able to match on the originating kind.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Math(#[from] MathError),
    #[error(transparent)]
    Config(#[from] ConfigLoadError),
    #[error(transparent)]
    OnChain(#[from] OnChainError),
    #[error(transparent)]
    AlertSink(#[from] AlertSinkError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(ConfigLoadError(err.to_string()))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Client(ClientError::Unavailable(err.to_string()))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Internal(format!("JSON error: {}", err))
    }
}

/// HTTP mapping for the thin REST shell (§7): client-facing subsystem
/// failures become 503s, a missing resource a 404, everything else a 500.
impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Client(_) | AppError::OnChain(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Math(_) | AppError::Config(_) | AppError::AlertSink(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, serde_json::json!({ "error": self.to_string() }).to_string()).into_response()
    }
}
