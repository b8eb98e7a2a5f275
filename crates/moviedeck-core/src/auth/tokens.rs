//! Opaque token minting.
//!
//! There is no identity provider behind this: tokens are random strings with
//! no structure, and the mock backend accepts any refresh token it is given.

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;

use super::{AuthError, CredentialPair};

const TOKEN_PREFIX: &str = "mock_token_";

/// Random characters following the prefix
const TOKEN_RANDOM_LEN: usize = 26;

/// Mint a single opaque token.
pub fn generate_token() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_RANDOM_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}{}", TOKEN_PREFIX, suffix)
}

fn generate_pair() -> CredentialPair {
    CredentialPair {
        access_token: generate_token(),
        refresh_token: generate_token(),
    }
}

/// Backend that issues credential pairs on login and on refresh.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    async fn issue(&self, username: &str) -> Result<CredentialPair, AuthError>;

    async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, AuthError>;
}

/// Issuer that mints a fresh pair for every call and never fails.
#[derive(Debug, Clone, Default)]
pub struct MockTokenIssuer;

#[async_trait]
impl TokenIssuer for MockTokenIssuer {
    async fn issue(&self, _username: &str) -> Result<CredentialPair, AuthError> {
        Ok(generate_pair())
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<CredentialPair, AuthError> {
        Ok(generate_pair())
    }
}
