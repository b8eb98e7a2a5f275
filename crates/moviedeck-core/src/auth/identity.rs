//! Sources for the fixed user list that login checks against.

use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub password: String,
}

impl UserRecord {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Exact match on both fields.
    pub fn matches(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// A single idempotent read of every known user.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    async fn users(&self) -> Result<Vec<UserRecord>>;
}

#[derive(Debug, Clone, Default)]
pub struct StaticIdentitySource {
    users: Vec<UserRecord>,
}

impl StaticIdentitySource {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl IdentitySource for StaticIdentitySource {
    async fn users(&self) -> Result<Vec<UserRecord>> {
        Ok(self.users.clone())
    }
}

/// Reads a JSON array of `{username, password}` records from disk.
#[derive(Debug, Clone)]
pub struct FileIdentitySource {
    path: PathBuf,
}

impl FileIdentitySource {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl IdentitySource for FileIdentitySource {
    async fn users(&self) -> Result<Vec<UserRecord>> {
        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read users file: {}", self.path.display()))?;
        let users: Vec<UserRecord> =
            serde_json::from_str(&contents).context("Failed to parse users file")?;
        Ok(users)
    }
}
