//! Backend error types for the resource backend abstraction layer.
//!
//! Every failure a backend can report is expressed as a [`BackendError`].
//! Errors returned by the API server itself carry a [`StatusReason`] so that
//! callers can classify them without knowing the transport.

use std::fmt;
use std::time::Duration;

/// Machine-readable reason attached to an API server failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusReason {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    AlreadyExists,
    Conflict,
    Gone,
    Invalid,
    UnsupportedMediaType,
    TooManyRequests,
    InternalError,
    ServiceUnavailable,
    /// The request could not be completed within the server-side deadline
    /// and the client may retry.
    ServerTimeout,
    /// The request timed out at the gateway or the server deadline elapsed.
    Timeout,
    Unknown,
}

impl StatusReason {
    /// Parses the `reason` field of a `Status` response body.
    #[must_use]
    pub fn from_reason(reason: &str) -> Self {
        match reason {
            "BadRequest" => Self::BadRequest,
            "Unauthorized" => Self::Unauthorized,
            "Forbidden" => Self::Forbidden,
            "NotFound" => Self::NotFound,
            "MethodNotAllowed" => Self::MethodNotAllowed,
            "AlreadyExists" => Self::AlreadyExists,
            "Conflict" => Self::Conflict,
            "Gone" => Self::Gone,
            "Invalid" => Self::Invalid,
            "UnsupportedMediaType" => Self::UnsupportedMediaType,
            "TooManyRequests" => Self::TooManyRequests,
            "InternalError" => Self::InternalError,
            "ServiceUnavailable" => Self::ServiceUnavailable,
            "ServerTimeout" => Self::ServerTimeout,
            "Timeout" => Self::Timeout,
            _ => Self::Unknown,
        }
    }

    /// Derives a reason from a bare HTTP status code.
    #[must_use]
    pub fn from_status_code(code: u16) -> Self {
        match code {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            405 => Self::MethodNotAllowed,
            409 => Self::Conflict,
            410 => Self::Gone,
            415 => Self::UnsupportedMediaType,
            422 => Self::Invalid,
            429 => Self::TooManyRequests,
            500 => Self::InternalError,
            503 => Self::ServiceUnavailable,
            504 => Self::Timeout,
            _ => Self::Unknown,
        }
    }

    /// Returns the wire name of this reason.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BadRequest => "BadRequest",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "NotFound",
            Self::MethodNotAllowed => "MethodNotAllowed",
            Self::AlreadyExists => "AlreadyExists",
            Self::Conflict => "Conflict",
            Self::Gone => "Gone",
            Self::Invalid => "Invalid",
            Self::UnsupportedMediaType => "UnsupportedMediaType",
            Self::TooManyRequests => "TooManyRequests",
            Self::InternalError => "InternalError",
            Self::ServiceUnavailable => "ServiceUnavailable",
            Self::ServerTimeout => "ServerTimeout",
            Self::Timeout => "Timeout",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for StatusReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur while talking to a resource backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// The API server answered with a failure status.
    #[error("API error {status} ({reason}): {message}")]
    Api {
        /// The HTTP status code of the response.
        status: u16,
        /// The classified failure reason.
        reason: StatusReason,
        /// Human readable message from the server.
        message: String,
        /// Delay the server asked the client to wait before retrying.
        retry_after: Option<Duration>,
    },

    /// The connection was reset by the peer mid-request.
    #[error("Connection reset: {message}")]
    ConnectionReset {
        /// Description of the reset.
        message: String,
    },

    /// The request did not complete within the client deadline.
    #[error("Request timed out: {message}")]
    Timeout {
        /// Description of the timeout.
        message: String,
    },

    /// Any other transport-level failure (DNS, refused connection, TLS).
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The backend handle could not be constructed from its configuration.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// The backend answered with a payload that could not be decoded.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Description of the decoding failure.
        message: String,
    },
}

impl BackendError {
    /// Creates a new `Api` error.
    #[must_use]
    pub fn api(status: u16, reason: StatusReason, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            reason,
            message: message.into(),
            retry_after: None,
        }
    }

    /// Creates a `NotFound` API error for the given resource type and name.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, name: impl fmt::Display) -> Self {
        Self::api(
            404,
            StatusReason::NotFound,
            format!("{resource} \"{name}\" not found"),
        )
    }

    /// Creates an `InternalError` API error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::api(500, StatusReason::InternalError, message)
    }

    /// Creates a `TooManyRequests` API error with an optional retry delay.
    #[must_use]
    pub fn too_many_requests(retry_after: Option<Duration>) -> Self {
        Self::Api {
            status: 429,
            reason: StatusReason::TooManyRequests,
            message: "too many requests, please try again later".to_string(),
            retry_after,
        }
    }

    /// Creates a new `ConnectionReset` error.
    #[must_use]
    pub fn connection_reset(message: impl Into<String>) -> Self {
        Self::ConnectionReset {
            message: message.into(),
        }
    }

    /// Creates a new client-side `Timeout` error.
    #[must_use]
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout {
            message: message.into(),
        }
    }

    /// Creates a new `Transport` error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidResponse` error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Attaches a server-suggested retry delay to an `Api` error.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn with_retry_after(self, delay: Duration) -> Self {
        match self {
            Self::Api {
                status,
                reason,
                message,
                ..
            } => Self::Api {
                status,
                reason,
                message,
                retry_after: Some(delay),
            },
            other => other,
        }
    }

    /// Returns the status reason for API errors.
    #[must_use]
    pub fn reason(&self) -> Option<StatusReason> {
        match self {
            Self::Api { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// Returns `true` if the requested object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.reason() == Some(StatusReason::NotFound)
    }

    /// Returns `true` if the connection was reset by the peer.
    #[must_use]
    pub fn is_connection_reset(&self) -> bool {
        matches!(self, Self::ConnectionReset { .. })
    }

    /// Returns `true` if the server reported an internal error.
    #[must_use]
    pub fn is_internal_error(&self) -> bool {
        self.reason() == Some(StatusReason::InternalError)
    }

    /// Returns `true` for server-reported and client-side timeouts.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. }) || self.reason() == Some(StatusReason::Timeout)
    }

    /// Returns `true` if the server is rate limiting the client.
    #[must_use]
    pub fn is_too_many_requests(&self) -> bool {
        match self {
            Self::Api { status, reason, .. } => {
                *status == 429 || *reason == StatusReason::TooManyRequests
            }
            _ => false,
        }
    }

    /// Returns the delay the server suggested before retrying, if any.
    ///
    /// Server timeouts always suggest a retry, with a zero delay when the
    /// server did not name one.
    #[must_use]
    pub fn suggests_client_delay(&self) -> Option<Duration> {
        match self {
            Self::Api {
                retry_after: Some(delay),
                ..
            } => Some(*delay),
            Self::Api {
                reason: StatusReason::ServerTimeout | StatusReason::Timeout,
                ..
            } => Some(Duration::ZERO),
            _ => None,
        }
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Api { reason, .. } => match reason {
                StatusReason::NotFound | StatusReason::Gone => ErrorCategory::NotFound,
                StatusReason::AlreadyExists | StatusReason::Conflict => ErrorCategory::Conflict,
                StatusReason::BadRequest
                | StatusReason::Invalid
                | StatusReason::MethodNotAllowed
                | StatusReason::UnsupportedMediaType => ErrorCategory::Validation,
                StatusReason::Unauthorized | StatusReason::Forbidden => ErrorCategory::Auth,
                StatusReason::TooManyRequests => ErrorCategory::Throttled,
                StatusReason::ServerTimeout
                | StatusReason::Timeout
                | StatusReason::ServiceUnavailable => ErrorCategory::Infrastructure,
                StatusReason::InternalError | StatusReason::Unknown => ErrorCategory::Internal,
            },
            Self::ConnectionReset { .. } | Self::Timeout { .. } | Self::Transport { .. } => {
                ErrorCategory::Infrastructure
            }
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::InvalidResponse { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of backend errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Object not found.
    NotFound,
    /// Conflicting write.
    Conflict,
    /// Request rejected as malformed.
    Validation,
    /// Authentication or authorization failure.
    Auth,
    /// Server-side rate limiting.
    Throttled,
    /// Infrastructure/connection error.
    Infrastructure,
    /// Backend handle misconfiguration.
    Configuration,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Validation => write!(f, "validation"),
            Self::Auth => write!(f, "auth"),
            Self::Throttled => write!(f, "throttled"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
