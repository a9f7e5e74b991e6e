//! Engine error taxonomy

use thiserror::Error;

/// Errors surfaced by the trading engine.
///
/// Exchange-side failures (`MalformedExchangeResponse`, `Exchange`,
/// `OrderSubmissionFailed`, `OrderNotConfirmed`) are recoverable: the
/// controller logs them and treats the affected order or cycle as skipped.
/// `InvalidDuration` is a contract violation and is returned to the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("unsupported candle duration: {0}")]
    InvalidDuration(String),

    #[error("malformed exchange response: {0}")]
    MalformedExchangeResponse(String),

    #[error("order submission failed: {0}")]
    OrderSubmissionFailed(String),

    #[error("order not confirmed before expiry: {0}")]
    OrderNotConfirmed(String),

    #[error("signal rejected by ledger alternation rule")]
    LedgerRejected,

    #[error("exchange request failed: {0}")]
    Exchange(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EngineError>;
