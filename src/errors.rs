//! CCXT Runtime Error Hierarchy
//!
//! Every fault raised by the runtime travels as a `CcxtError` value, including
//! faults raised inside spawned tasks. Errors are `Clone` so a single load
//! failure can be delivered to every subscriber of that load.

use thiserror::Error;

/// 에러 분류
///
/// - Configuration: malformed endpoint descriptor config
/// - Dispatch: unknown operation, bad argument shape, unsupported feature
/// - Network: faults surfaced by the transport collaborator
/// - Load: a fault encountered during a market load cycle
/// - Cancelled: the caller (or the runtime) stopped waiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Dispatch,
    Network,
    Load,
    Cancelled,
}

/// Runtime error hierarchy
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CcxtError {
    // === Configuration ===
    /// Malformed endpoint descriptor or runtime configuration
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    // === Dispatch ===
    /// No operation or endpoint with this name exists
    #[error("Unknown operation: {name}")]
    UnknownOperation { name: String },

    /// Too many positional arguments for a non-variadic operation
    #[error("Arguments mismatch for {name}: expected at most {expected}, received {received}")]
    ArgumentsMismatch {
        name: String,
        expected: usize,
        received: usize,
    },

    /// Feature not supported by this exchange
    #[error("Not supported: {feature}")]
    NotSupported { feature: String },

    /// Symbol is not part of the published markets
    #[error("Bad symbol: {symbol}")]
    BadSymbol { symbol: String },

    /// A spawned operation panicked
    #[error("Task failed: {message}")]
    TaskFailed { message: String },

    // === Network ===
    /// Generic network error
    #[error("Network error: {url} - {message}")]
    NetworkError { url: String, message: String },

    /// Request timed out
    #[error("Request timeout: {url}")]
    RequestTimeout { url: String },

    /// Exchange answered with an error status
    #[error("Exchange error: {message}")]
    ExchangeError { message: String },

    /// Response could not be interpreted
    #[error("Bad response: {message}")]
    BadResponse { message: String },

    /// JSON parsing error
    #[error("JSON error: {message}")]
    JsonError { message: String },

    // === Load ===
    /// A market/currency load cycle failed
    #[error("Load failed: {source}")]
    LoadError {
        #[source]
        source: Box<CcxtError>,
    },

    // === Cancellation ===
    /// The wait was cancelled before a result arrived
    #[error("Cancelled: {operation}")]
    Cancelled { operation: String },
}

impl CcxtError {
    /// Wraps a fault encountered during a load cycle
    pub fn load(source: CcxtError) -> Self {
        match source {
            err @ CcxtError::LoadError { .. } => err,
            err => CcxtError::LoadError {
                source: Box::new(err),
            },
        }
    }

    pub fn cancelled(operation: impl Into<String>) -> Self {
        CcxtError::Cancelled {
            operation: operation.into(),
        }
    }

    pub fn not_supported(feature: impl Into<String>) -> Self {
        CcxtError::NotSupported {
            feature: feature.into(),
        }
    }

    /// Returns the taxonomy bucket of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CcxtError::ConfigurationError { .. } => ErrorKind::Configuration,
            CcxtError::UnknownOperation { .. }
            | CcxtError::ArgumentsMismatch { .. }
            | CcxtError::NotSupported { .. }
            | CcxtError::BadSymbol { .. }
            | CcxtError::TaskFailed { .. } => ErrorKind::Dispatch,
            CcxtError::NetworkError { .. }
            | CcxtError::RequestTimeout { .. }
            | CcxtError::ExchangeError { .. }
            | CcxtError::BadResponse { .. }
            | CcxtError::JsonError { .. } => ErrorKind::Network,
            CcxtError::LoadError { .. } => ErrorKind::Load,
            CcxtError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Returns the error code as a string constant
    pub fn code(&self) -> &'static str {
        match self {
            CcxtError::ConfigurationError { .. } => "CONFIGURATION_ERROR",
            CcxtError::UnknownOperation { .. } => "UNKNOWN_OPERATION",
            CcxtError::ArgumentsMismatch { .. } => "ARGUMENTS_MISMATCH",
            CcxtError::NotSupported { .. } => "NOT_SUPPORTED",
            CcxtError::BadSymbol { .. } => "BAD_SYMBOL",
            CcxtError::TaskFailed { .. } => "TASK_FAILED",
            CcxtError::NetworkError { .. } => "NETWORK_ERROR",
            CcxtError::RequestTimeout { .. } => "REQUEST_TIMEOUT",
            CcxtError::ExchangeError { .. } => "EXCHANGE_ERROR",
            CcxtError::BadResponse { .. } => "BAD_RESPONSE",
            CcxtError::JsonError { .. } => "JSON_ERROR",
            CcxtError::LoadError { .. } => "LOAD_ERROR",
            CcxtError::Cancelled { .. } => "CANCELLED",
        }
    }

    /// Returns the innermost cause, looking through load wrappers
    pub fn root_cause(&self) -> &CcxtError {
        match self {
            CcxtError::LoadError { source } => source.root_cause(),
            err => err,
        }
    }

    /// Returns true if this error is temporary and the operation can be retried
    pub fn is_retryable(&self) -> bool {
        match self {
            CcxtError::NetworkError { .. } | CcxtError::RequestTimeout { .. } => true,
            CcxtError::LoadError { source } => source.is_retryable(),
            _ => false,
        }
    }

    /// Returns true if this is a network-related error
    pub fn is_network_error(&self) -> bool {
        self.root_cause().kind() == ErrorKind::Network
    }
}

// === From implementations for common error types ===

impl From<serde_json::Error> for CcxtError {
    fn from(err: serde_json::Error) -> Self {
        CcxtError::JsonError {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for CcxtError {
    fn from(err: reqwest::Error) -> Self {
        let url = err.url().map(|u| u.to_string()).unwrap_or_default();
        if err.is_timeout() {
            CcxtError::RequestTimeout { url }
        } else if err.is_connect() {
            CcxtError::NetworkError {
                url,
                message: "Connection failed".into(),
            }
        } else if err.is_decode() {
            CcxtError::BadResponse {
                message: err.to_string(),
            }
        } else {
            CcxtError::NetworkError {
                url,
                message: err.to_string(),
            }
        }
    }
}

/// Result 타입 alias
pub type CcxtResult<T> = Result<T, CcxtError>;
