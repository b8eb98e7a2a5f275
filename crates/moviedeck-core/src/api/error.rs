use thiserror::Error;

use crate::auth::AuthError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized - token may be expired")]
    AuthorizationDenied { message: String },

    #[error("Network error: {message}")]
    TransportFailure { status: u16, message: String },

    #[error("Server error ({status}): {message}")]
    ServerFailure { status: u16, message: String },

    #[error("Request failed ({status}): {message}")]
    ClientFailure { status: u16, message: String },

    #[error("Session refresh failed: {0}")]
    RefreshFailure(#[source] AuthError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            return body.to_string();
        }
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
    }

    /// Map a non-success wire status to an error. An empty body falls back
    /// to the status's canonical reason.
    pub fn from_status(status: u16, body: &str) -> Self {
        let message = if body.trim().is_empty() {
            reqwest::StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .unwrap_or("")
                .to_string()
        } else {
            Self::truncate_body(body)
        };
        match status {
            401 => ApiError::AuthorizationDenied { message },
            0 | 504 => ApiError::TransportFailure { status, message },
            500..=599 => ApiError::ServerFailure { status, message },
            _ => ApiError::ClientFailure { status, message },
        }
    }

    /// Wire status of the failure; 0 when no response was received or the
    /// failure never reached the wire.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::AuthorizationDenied { .. } => 401,
            ApiError::TransportFailure { status, .. }
            | ApiError::ServerFailure { status, .. }
            | ApiError::ClientFailure { status, .. } => *status,
            ApiError::RefreshFailure(_) => 401,
            ApiError::InvalidRequest(_) | ApiError::InvalidResponse(_) => 0,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::AuthorizationDenied { message }
            | ApiError::TransportFailure { message, .. }
            | ApiError::ServerFailure { message, .. }
            | ApiError::ClientFailure { message, .. }
            | ApiError::InvalidRequest(message)
            | ApiError::InvalidResponse(message) => message,
            ApiError::RefreshFailure(_) => "",
        }
    }

    pub fn is_authorization_denied(&self) -> bool {
        matches!(self, ApiError::AuthorizationDenied { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::ClientFailure { status: 404, .. })
    }

    /// User-facing notification text for this failure, if it warrants one.
    ///
    /// A 401 reads like any other 4xx here. The auth stage only consults
    /// this table for 401s it does not recover from itself (refresh calls).
    pub fn user_message(&self) -> Option<String> {
        match self {
            ApiError::RefreshFailure(_)
            | ApiError::InvalidRequest(_)
            | ApiError::InvalidResponse(_) => return None,
            _ => {}
        }
        match self.status() {
            403 => Some(
                "Access forbidden. You don't have permission to access this resource.".to_string(),
            ),
            500 => Some("Server error. Please try again later.".to_string()),
            0 | 504 => Some("Network error. Please check your connection.".to_string()),
            400..=499 => {
                let message = self.message().trim();
                let message = if message.is_empty() { "Invalid request" } else { message };
                Some(format!("Request failed: {}", message))
            }
            _ => None,
        }
    }
}
