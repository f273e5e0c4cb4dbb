//! Upstream error taxonomy.

use std::fmt;

use thiserror::Error;

use crate::client::Endpoint;

/// Result of a single upstream call.
pub type UpstreamResult<T> = std::result::Result<T, UpstreamFailure>;

/// Errors raised while talking to the Technitium API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// Connection refused, DNS resolution failure, reset, etc.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request exceeded the configured timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Token rejected, either by HTTP status or by an `invalid-token` reply.
    #[error("authentication rejected: {0}")]
    Auth(String),

    /// Non-success HTTP status.
    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    /// Body is not JSON or does not have the expected shape.
    #[error("malformed response: {0}")]
    Decode(String),

    /// Envelope status other than `ok`.
    #[error("API returned status '{status}': {message}")]
    Api { status: String, message: String },
}

impl UpstreamError {
    /// Connection-level failure, including timeouts.
    pub fn is_transport(&self) -> bool {
        matches!(self, UpstreamError::Transport(_) | UpstreamError::Timeout(_))
    }

    /// The server answered, but not with a usable payload.
    pub fn is_protocol(&self) -> bool {
        !self.is_transport()
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, UpstreamError::Auth(_))
    }

    /// Replace every occurrence of `secret` in the error text with `REDACTED`.
    pub fn redact(self, secret: &str) -> Self {
        if secret.is_empty() {
            return self;
        }
        let scrub = |text: String| text.replace(secret, "REDACTED");
        match self {
            UpstreamError::Transport(msg) => UpstreamError::Transport(scrub(msg)),
            UpstreamError::Timeout(msg) => UpstreamError::Timeout(scrub(msg)),
            UpstreamError::Auth(msg) => UpstreamError::Auth(scrub(msg)),
            UpstreamError::Decode(msg) => UpstreamError::Decode(scrub(msg)),
            UpstreamError::Api { status, message } => UpstreamError::Api {
                status,
                message: scrub(message),
            },
            status @ UpstreamError::Status { .. } => status,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    /// The request URL carries the token (percent-encoded), so it is dropped.
    fn from(err: reqwest::Error) -> Self {
        let err = err.without_url();
        if err.is_timeout() {
            UpstreamError::Timeout(err.to_string())
        } else if err.is_decode() {
            UpstreamError::Decode(err.to_string())
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for UpstreamError {
    fn from(err: serde_json::Error) -> Self {
        UpstreamError::Decode(err.to_string())
    }
}

/// A failed upstream call, tagged with the endpoint that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFailure {
    pub endpoint: Endpoint,
    pub error: UpstreamError,
}

impl UpstreamFailure {
    pub fn new(endpoint: Endpoint, error: UpstreamError) -> Self {
        Self { endpoint, error }
    }
}

impl fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.endpoint, self.error)
    }
}

impl std::error::Error for UpstreamFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert!(UpstreamError::Transport("refused".into()).is_transport());
        assert!(UpstreamError::Timeout("10s".into()).is_transport());
        assert!(UpstreamError::Status { status: 500 }.is_protocol());
        assert!(UpstreamError::Decode("eof".into()).is_protocol());

        let auth = UpstreamError::Auth("invalid token".into());
        assert!(auth.is_auth());
        assert!(auth.is_protocol());
    }

    #[test]
    fn test_redact_token() {
        let err = UpstreamError::Transport(
            "error sending request for url (http://dns:5380/api/zones/list?token=s3cr3t)".into(),
        );
        let redacted = err.redact("s3cr3t");
        assert_eq!(
            redacted.to_string(),
            "transport error: error sending request for url (http://dns:5380/api/zones/list?token=REDACTED)"
        );
    }

    #[test]
    fn test_redact_empty_secret_is_noop() {
        let err = UpstreamError::Decode("expected value".into());
        assert_eq!(err.clone().redact(""), err);
    }

    #[test]
    fn test_failure_display() {
        let failure = UpstreamFailure::new(Endpoint::Zones, UpstreamError::Status { status: 503 });
        assert_eq!(failure.to_string(), "zones: unexpected HTTP status 503");
    }
}
