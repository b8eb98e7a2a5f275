//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `LocalStorage`: Durable key-value persistence (`FileStorage`, `MemoryStorage`)
//! - `SessionStore`: The credential pair and identity kept in local storage
//! - `IdentitySource`: The static user list that login is checked against
//! - `TokenIssuer`: Mints opaque access/refresh token pairs
//! - `SessionManager`: Login, logout and refresh transitions
//!
//! Tokens are random opaque strings. They never expire on their own; the
//! only way a session ends is logout or a failed refresh.

pub mod error;
pub mod identity;
pub mod manager;
pub mod session;
pub mod storage;
pub mod tokens;

pub use error::AuthError;
pub use identity::{FileIdentitySource, IdentitySource, StaticIdentitySource, UserRecord};
pub use manager::SessionManager;
pub use session::{CredentialPair, Session, SessionStore};
pub use storage::{FileStorage, LocalStorage, MemoryStorage};
pub use tokens::{generate_token, MockTokenIssuer, TokenIssuer};
