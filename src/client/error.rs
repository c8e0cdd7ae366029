//! HTTP client error types.

use derive_more::{Display, Error};
use serde::Deserialize;
use tracing::instrument;

/// What went wrong with a request.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum ClientErrorKind {
    /// The request never produced a response.
    #[display("network failure: {_0}")]
    NetworkFailure(String),

    /// The server answered with a non-success status.
    #[display("server rejected request ({status}): {reason}")]
    ServerRejection {
        /// HTTP status code.
        status: u16,
        /// Reason extracted from the error body.
        reason: String,
    },

    /// The response body did not match the expected shape.
    #[display("failed to decode response: {_0}")]
    Decode(String),
}

/// HTTP client error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Client error: {} at {}:{}", kind, file, line)]
pub struct ClientError {
    /// Error kind.
    pub kind: ClientErrorKind,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ClientError {
    /// Creates a new client error with caller location tracking.
    #[track_caller]
    #[instrument(skip(kind))]
    pub fn new(kind: ClientErrorKind) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// A network failure.
    #[track_caller]
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::NetworkFailure(message.into()))
    }

    /// A server rejection.
    #[track_caller]
    pub fn rejected(status: u16, reason: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::ServerRejection {
            status,
            reason: reason.into(),
        })
    }

    /// A decode failure.
    #[track_caller]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Decode(message.into()))
    }

    /// Text suitable for showing to the player.
    pub fn user_message(&self) -> String {
        match &self.kind {
            ClientErrorKind::ServerRejection { reason, .. } => reason.clone(),
            ClientErrorKind::NetworkFailure(message) => format!("Network error: {message}"),
            ClientErrorKind::Decode(message) => format!("Unexpected server response: {message}"),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::decode(err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}

/// Error body shapes the backend produces.
///
/// Handlers answer `{"error": ...}`; the exception mapper answers
/// `{"message": ..., "status": ..., "path": ...}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// Handler error text.
    #[serde(default)]
    pub error: Option<String>,
    /// Mapper error text.
    #[serde(default)]
    pub message: Option<String>,
}

/// Picks the user-facing reason for a rejected request.
///
/// Prefers `error`, then `message`, then the status text.
pub fn rejection_reason(body: &str, status: reqwest::StatusCode) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    parsed
        .error
        .filter(|text| !text.is_empty())
        .or(parsed.message.filter(|text| !text.is_empty()))
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .map(str::to_string)
                .unwrap_or_else(|| status.to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_rejection_reason_precedence() {
        assert_eq!(
            rejection_reason(r#"{"error":"Not your turn","message":"ignored"}"#, StatusCode::BAD_REQUEST),
            "Not your turn"
        );
        assert_eq!(
            rejection_reason(
                r#"{"timestamp":"now","message":"Invalid card","status":400,"path":"/game"}"#,
                StatusCode::BAD_REQUEST
            ),
            "Invalid card"
        );
        assert_eq!(rejection_reason("<html>", StatusCode::BAD_GATEWAY), "Bad Gateway");
    }

    #[test]
    fn test_location_tracking() {
        let err = ClientError::rejected(409, "Not your turn");
        assert!(err.file.ends_with("error.rs"));
        assert_eq!(err.user_message(), "Not your turn");
    }
}
