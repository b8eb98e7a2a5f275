//! Remembered login passwords.
//!
//! A successful `moviedeck login` saves the password in the OS keychain under
//! the username, so the next login can offer it instead of prompting.
//! `moviedeck logout --forget` removes it again. Session tokens never go
//! here; they live in the core's session storage.

use anyhow::{Context, Result};
use keyring::Entry;

/// Keychain service the passwords are filed under
const SERVICE_NAME: &str = "moviedeck";

pub struct CredentialStore;

impl CredentialStore {
    fn entry(username: &str) -> Result<Entry> {
        Entry::new(SERVICE_NAME, username).context("Failed to create keyring entry")
    }

    /// Remember `password` for `username`, replacing any earlier one.
    pub fn store(username: &str, password: &str) -> Result<()> {
        Self::entry(username)?
            .set_password(password)
            .context("Failed to store password in keychain")
    }

    pub fn get_password(username: &str) -> Result<String> {
        Self::entry(username)?
            .get_password()
            .context("Failed to retrieve password from keychain")
    }

    /// Forget the remembered password (`logout --forget`).
    pub fn delete(username: &str) -> Result<()> {
        Self::entry(username)?
            .delete_credential()
            .context("Failed to delete credential from keychain")
    }

    /// Whether login can offer a remembered password for `username`.
    pub fn has_credentials(username: &str) -> bool {
        Self::entry(username)
            .map(|entry| entry.get_password().is_ok())
            .unwrap_or(false)
    }
}
