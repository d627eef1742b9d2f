//! Domain error types.
//!
//! Transport failures (retried by the request executor) are kept apart from
//! business failures (returned as absent results) and from validation
//! failures (rejected before any request is made).

use std::fmt;

/// A single transport-level failure observed while attempting a request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connect timeout: {0}")]
    ConnectTimeout(String),

    #[error("read timeout: {0}")]
    ReadTimeout(String),

    #[error("connection error: {0}")]
    Connect(String),

    /// The connection broke after the request started going out.
    #[error("connection dropped: {0}")]
    Disconnected(String),

    /// The status line arrived but the body could not be read.
    #[error("response body error: {0}")]
    Body(String),

    #[error("request error: {0}")]
    Request(String),
}

impl TransportError {
    /// Timeouts and connection-level errors are worth another attempt; anything
    /// else (a request that could not be built, a body that failed to decode)
    /// would fail the same way again.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectTimeout(_)
                | TransportError::ReadTimeout(_)
                | TransportError::Connect(_)
                | TransportError::Disconnected(_)
        )
    }

    /// True when the request never reached the broker, so resending it
    /// cannot duplicate a side effect.
    pub fn is_before_send(&self) -> bool {
        matches!(
            self,
            TransportError::ConnectTimeout(_) | TransportError::Connect(_)
        )
    }
}

/// Surfaced once the request executor stops retrying.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transport failure after {attempts} attempt(s): {cause}")]
pub struct TransportFailure {
    pub cause: TransportError,
    pub attempts: u32,
}

/// Errors produced by the market data gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Transport(#[from] TransportFailure),

    #[error("unsupported HTTP method: {method}")]
    UnsupportedMethod { method: String },

    #[error("malformed {what} payload: {reason}")]
    Malformed { what: &'static str, reason: String },
}

/// Which broker operation a business rejection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Token,
    CurrentPrice,
    ChartData,
    Balance,
    Order,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Token => "token",
            Operation::CurrentPrice => "current price",
            Operation::ChartData => "chart data",
            Operation::Balance => "balance",
            Operation::Order => "order",
        };
        f.write_str(name)
    }
}

/// Top-level error type for kistrader.
#[derive(Debug, thiserror::Error)]
pub enum TraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("authentication failed: {reason}")]
    Auth { reason: String },

    #[error("{operation} request rejected: {message}")]
    Rejected {
        operation: Operation,
        message: String,
    },

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&TraderError> for std::process::ExitCode {
    fn from(err: &TraderError) -> Self {
        let code: u8 = match err {
            TraderError::Io(_) => 1,
            TraderError::ConfigParse { .. }
            | TraderError::ConfigMissing { .. }
            | TraderError::ConfigInvalid { .. } => 2,
            TraderError::Auth { .. } => 3,
            TraderError::Gateway(_) | TraderError::Rejected { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
