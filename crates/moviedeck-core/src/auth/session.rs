use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::LocalStorage;

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Storage key for the logged-in username
pub const IDENTITY_KEY: &str = "user";

/// Access and refresh token issued together and replaced together.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialPair {
    pub access_token: String,
    pub refresh_token: String,
}

// Tokens stay out of debug output and logs
impl fmt::Debug for CredentialPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    pub credentials: Option<CredentialPair>,
    pub identity: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }
}

/// Passive persistence surface for the session.
///
/// Reads are open to anyone holding a reference; writes are crate-private so
/// that only the `SessionManager` mutates the session.
pub struct SessionStore {
    storage: Arc<dyn LocalStorage>,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.storage.get(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                warn!(key = key, error = %e, "Failed to read session value");
                None
            }
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.read(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read(REFRESH_TOKEN_KEY)
    }

    pub fn identity(&self) -> Option<String> {
        self.read(IDENTITY_KEY)
    }

    /// The stored credential pair, only if both halves are present.
    pub fn credentials(&self) -> Option<CredentialPair> {
        Some(CredentialPair {
            access_token: self.access_token()?,
            refresh_token: self.refresh_token()?,
        })
    }

    pub fn session(&self) -> Session {
        Session {
            credentials: self.credentials(),
            identity: self.identity(),
        }
    }

    pub(crate) fn write_credentials(&self, pair: &CredentialPair) -> Result<()> {
        self.storage.set_entries(&[
            (ACCESS_TOKEN_KEY, pair.access_token.as_str()),
            (REFRESH_TOKEN_KEY, pair.refresh_token.as_str()),
        ])
    }

    pub(crate) fn write_session(&self, pair: &CredentialPair, identity: &str) -> Result<()> {
        self.storage.set_entries(&[
            (ACCESS_TOKEN_KEY, pair.access_token.as_str()),
            (REFRESH_TOKEN_KEY, pair.refresh_token.as_str()),
            (IDENTITY_KEY, identity),
        ])
    }

    pub(crate) fn clear(&self) -> Result<()> {
        self.storage
            .remove_entries(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, IDENTITY_KEY])
    }
}
