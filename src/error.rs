/// Error type returned by this crate.
///
/// Every public operation fails with exactly one of these variants. Errors
/// carry owned text rather than source errors so that outcomes of two calls
/// can be compared structurally.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SharpAiError {
    /// Call parameters rejected locally; nothing was sent.
    #[error("validation error: {0}")]
    Validation(String),
    /// Remote 400, or any other 4xx without a more specific mapping.
    #[error("bad request ({status}): {message}")]
    BadRequest { status: u16, message: String },
    /// Remote 401.
    #[error("authentication failed: {message}")]
    Authentication { message: String },
    /// Remote 403.
    #[error("authorization failed: {message}")]
    Authorization { message: String },
    /// Remote 404.
    #[error("resource not found: {message}")]
    ResourceNotFound { message: String },
    /// Remote 409 without a narrower discriminator.
    #[error("conflict ({status}): {message}")]
    Conflict { status: u16, message: String },
    /// The resource is in use by another operation.
    #[error("resource in use ({status}): {message}")]
    InUse { status: u16, message: String },
    /// The resource is inactive.
    #[error("resource inactive ({status}): {message}")]
    Inactive { status: u16, message: String },
    /// The resource still has children.
    #[error("resource not empty ({status}): {message}")]
    NotEmpty { status: u16, message: String },
    /// A requested range is out of bounds.
    #[error("invalid range ({status}): {message}")]
    InvalidRange { status: u16, message: String },
    /// Remote 429.
    #[error("rate limited: {message}")]
    RateLimited { message: String },
    /// Response body did not match the expected schema.
    #[error("deserialization error: {message}; body: {body}")]
    Deserialization {
        /// Parser or protocol message.
        message: String,
        /// Offending raw text.
        body: String,
    },
    /// An attempt exceeded the configured timeout.
    #[error("request timed out: {message}")]
    Timeout { message: String },
    /// Connection-level failure: refused, reset, DNS, aborted body.
    #[error("network error: {message}")]
    Network { message: String },
    /// Remote 5xx.
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
    /// Last failure of a call whose retry budget was spent.
    #[error("request failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Total number of transport attempts made.
        attempts: usize,
        /// Failure observed on the final attempt.
        last: Box<SharpAiError>,
    },
}

/// Failure category used for retry decisions and log fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    BadRequest,
    Authentication,
    Authorization,
    ResourceNotFound,
    Conflict,
    InUse,
    Inactive,
    NotEmpty,
    InvalidRange,
    RateLimited,
    Deserialization,
    Timeout,
    Network,
    Server,
    RetriesExhausted,
}

impl SharpAiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::BadRequest { .. } => ErrorKind::BadRequest,
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Authorization { .. } => ErrorKind::Authorization,
            Self::ResourceNotFound { .. } => ErrorKind::ResourceNotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::InUse { .. } => ErrorKind::InUse,
            Self::Inactive { .. } => ErrorKind::Inactive,
            Self::NotEmpty { .. } => ErrorKind::NotEmpty,
            Self::InvalidRange { .. } => ErrorKind::InvalidRange,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Deserialization { .. } => ErrorKind::Deserialization,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Network { .. } => ErrorKind::Network,
            Self::Server { .. } => ErrorKind::Server,
            Self::RetriesExhausted { .. } => ErrorKind::RetriesExhausted,
        }
    }

    /// Whether another attempt of the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Network | ErrorKind::Timeout | ErrorKind::Server | ErrorKind::RateLimited
        )
    }

    /// HTTP status behind this error, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest { status, .. }
            | Self::Conflict { status, .. }
            | Self::InUse { status, .. }
            | Self::Inactive { status, .. }
            | Self::NotEmpty { status, .. }
            | Self::InvalidRange { status, .. }
            | Self::Server { status, .. } => Some(*status),
            Self::Authentication { .. } => Some(401),
            Self::Authorization { .. } => Some(403),
            Self::ResourceNotFound { .. } => Some(404),
            Self::RateLimited { .. } => Some(429),
            Self::RetriesExhausted { last, .. } => last.status(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for SharpAiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout {
                message: err.to_string(),
            }
        } else if err.is_builder() {
            Self::Validation(format!("invalid request: {err}"))
        } else {
            Self::Network {
                message: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{ErrorKind, SharpAiError};

    #[test]
    fn transient_kinds_are_retryable() {
        let network = SharpAiError::Network {
            message: "connection reset".to_owned(),
        };
        let server = SharpAiError::Server {
            status: 502,
            message: "bad gateway".to_owned(),
        };
        let bad_request = SharpAiError::BadRequest {
            status: 400,
            message: "missing model".to_owned(),
        };

        let rate_limited = SharpAiError::RateLimited {
            message: "too many requests".to_owned(),
        };
        let timeout = SharpAiError::Timeout {
            message: "deadline elapsed".to_owned(),
        };

        assert!(network.is_retryable());
        assert!(server.is_retryable());
        assert!(rate_limited.is_retryable());
        assert!(timeout.is_retryable());
        assert_eq!(rate_limited.status(), Some(429));
        assert!(!bad_request.is_retryable());
        assert!(!SharpAiError::Validation("empty".to_owned()).is_retryable());
    }

    #[test]
    fn exhausted_error_exposes_inner_status() {
        let err = SharpAiError::RetriesExhausted {
            attempts: 4,
            last: Box::new(SharpAiError::Server {
                status: 503,
                message: "unavailable".to_owned(),
            }),
        };

        assert_eq!(err.kind(), ErrorKind::RetriesExhausted);
        assert!(!err.is_retryable());
        assert_eq!(err.status(), Some(503));
        assert!(err.to_string().contains("after 4 attempts"));
    }
}
