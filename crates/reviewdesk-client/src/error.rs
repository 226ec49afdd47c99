//! Error types for the reviewdesk client.

use reviewdesk_domain::api::ErrorBody;
use thiserror::Error;

/// Client operation errors
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with an error body
    #[error("{message} ({code}, HTTP {status})")]
    Api {
        /// HTTP status code
        status: u16,
        /// Machine-readable code from the server
        code: String,
        /// Human-readable message
        message: String,
    },

    /// Connection error (network, DNS, refused)
    #[error("Connection error: {0}")]
    Connection(String),

    /// An established live connection dropped
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// Any other HTTP failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// Response or frame could not be decoded
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Invalid client-side input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ClientError {
    /// Build an error from a non-success response body
    pub fn from_body(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(ErrorBody { error, code }) => ClientError::Api {
                status,
                code,
                message: error,
            },
            Err(_) => ClientError::Api {
                status,
                code: "http_error".to_string(),
                message: if body.is_empty() {
                    format!("HTTP {}", status)
                } else {
                    body.to_string()
                },
            },
        }
    }

    /// Server-side error code, if this came from the API
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            ClientError::Connection(e.to_string())
        } else if e.is_decode() {
            ClientError::Http(format!("Invalid response body: {}", e))
        } else {
            ClientError::Http(e.to_string())
        }
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        use tokio_tungstenite::tungstenite::Error as WsError;

        match e {
            WsError::ConnectionClosed | WsError::AlreadyClosed => {
                ClientError::ConnectionLost("closed".to_string())
            }
            WsError::Io(io) => ClientError::ConnectionLost(io.to_string()),
            WsError::Url(url) => ClientError::InvalidInput(url.to_string()),
            other => ClientError::Connection(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_error_body() {
        let err = ClientError::from_body(
            409,
            r#"{"error":"Cannot approve record with status: approved","code":"invalid_transition"}"#,
        );
        assert_eq!(err.code(), Some("invalid_transition"));
        assert_eq!(
            err.to_string(),
            "Cannot approve record with status: approved (invalid_transition, HTTP 409)"
        );
    }

    #[test]
    fn test_from_plain_body() {
        let err = ClientError::from_body(502, "");
        assert_eq!(err.code(), Some("http_error"));
        assert!(err.to_string().starts_with("HTTP 502"));
    }
}
