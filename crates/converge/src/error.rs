//! Error taxonomy for the convergence engine.
//!
//! Failures split into three layers: [`ClientError`] is what the
//! control-plane client surfaces from one API call, [`ReadinessError`]
//! is an advisory diagnostic from a per-resource readiness predicate,
//! and [`WaitError`] is the terminal result a convergence wait hands
//! back to the enclosing test.

use std::time::Duration;

use crate::client::Phase;

/// A failure surfaced by the control-plane client.
///
/// Whether a variant excuses a retry is decided by
/// [`ClientError::is_retryable`]; that classification is the single
/// chokepoint every polling loop consults before deciding to continue.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// The named resource does not exist.
    ///
    /// Never retryable on its own: callers decide whether absence is
    /// the desired state or just "not yet".
    #[error("resource not found")]
    NotFound,

    /// The API server reported an internal error.
    #[error("api server internal error: {0}")]
    InternalError(String),

    /// The request timed out on the client side.
    #[error("request timed out")]
    Timeout,

    /// The server gave up on the request before completing it.
    #[error("server-side timeout")]
    ServerTimeout,

    /// The server is shedding load.
    #[error("too many requests")]
    TooManyRequests,

    /// The connection was reset mid-request.
    #[error("connection reset by peer")]
    ConnectionReset,

    /// The response body ended before a complete payload arrived.
    #[error("response ended prematurely")]
    UnexpectedEof,

    /// The server asked the client to come back later.
    #[error("rate limited, retry after {0:?}")]
    RetryAfter(Duration),

    /// The query filter was rejected by the server.
    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    /// The caller is not allowed to perform the operation.
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    /// The response could not be decoded into a resource descriptor.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Anything the client could not map to a more specific variant.
    #[error("unhandled client error: {0}")]
    Other(String),
}

impl ClientError {
    /// Whether this failure is likely to resolve on retry.
    ///
    /// Transient server hiccups and explicit rate-limit hints are
    /// retryable; `NotFound` and programmer/client errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::InternalError(_)
            | Self::Timeout
            | Self::ServerTimeout
            | Self::TooManyRequests
            | Self::ConnectionReset
            | Self::UnexpectedEof => true,
            // an explicit retry-after header is a confirmation we should retry
            Self::RetryAfter(_) => true,
            Self::NotFound
            | Self::InvalidSelector(_)
            | Self::AuthorizationDenied(_)
            | Self::MalformedResponse(_)
            | Self::Other(_) => false,
        }
    }

    /// Server-suggested delay before the next attempt, if any.
    pub fn retry_hint(&self) -> Option<Duration> {
        match self {
            Self::RetryAfter(delay) => Some(*delay),
            _ => None,
        }
    }
}

/// Why a single resource was judged not ready.
///
/// Produced by per-resource readiness predicates for diagnostics; a
/// `ReadinessError` counts the resource as not ready but never aborts
/// the enclosing wait.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadinessError {
    /// The resource is in a different lifecycle phase than required.
    #[error("'{name}' is in phase {actual}, expected {expected}")]
    PhaseMismatch {
        name: String,
        expected: Phase,
        actual: Phase,
    },

    /// The required condition flag is absent or false.
    #[error("'{name}' does not have condition {condition} set to true")]
    ConditionNotTrue { name: String, condition: String },
}

/// Terminal result of a convergence wait.
#[derive(thiserror::Error, Debug)]
pub enum WaitError {
    /// The caller handed in input with no basis to succeed or fail.
    /// Programmer error; reported immediately, never retried.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A non-retryable client failure aborted the wait.
    #[error("control plane client error")]
    Client(#[from] ClientError),

    /// The budget ran out before the condition ever held.
    #[error("timed out after {timeout:?} waiting for {subject}; last observed: {last_observed}")]
    TimedOut {
        subject: String,
        timeout: Duration,
        last_observed: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_errors_are_retryable() {
        let transient = [
            ClientError::InternalError("boom".to_owned()),
            ClientError::Timeout,
            ClientError::ServerTimeout,
            ClientError::TooManyRequests,
            ClientError::ConnectionReset,
            ClientError::UnexpectedEof,
        ];
        for err in transient {
            assert!(err.is_retryable(), "{err} should be retryable");
        }
    }

    #[test]
    fn test_fatal_errors_are_not_retryable() {
        let fatal = [
            ClientError::InvalidSelector("bad key".to_owned()),
            ClientError::AuthorizationDenied("forbidden".to_owned()),
            ClientError::MalformedResponse("truncated json".to_owned()),
            ClientError::Other("???".to_owned()),
        ];
        for err in fatal {
            assert!(!err.is_retryable(), "{err} should be fatal");
        }
    }

    #[test]
    fn test_not_found_is_never_retryable() {
        assert!(!ClientError::NotFound.is_retryable());
    }

    #[test]
    fn test_retry_after_hint() {
        let err = ClientError::RetryAfter(Duration::from_secs(3));
        assert!(err.is_retryable());
        assert_eq!(err.retry_hint(), Some(Duration::from_secs(3)));
        assert_eq!(ClientError::Timeout.retry_hint(), None);
    }
}
