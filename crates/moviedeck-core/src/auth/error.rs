use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Login did not match a known user. Also reported when the identity
    /// list itself could not be read.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("No refresh token")]
    NoRefreshToken,

    #[error("Token backend error: {0}")]
    Backend(String),

    #[error("Session storage error: {0}")]
    Storage(String),
}
