//! Core library for moviedeck.
//!
//! Browses a third-party movie catalog behind a mock login. The interesting
//! part is the request pipeline every catalog call passes through:
//!
//! - [`tracker::WorkTracker`] counts in-flight calls for the busy indicator
//! - [`pipeline::AuthStage`] attaches the session's bearer token, refreshes
//!   the session on a 401 and retries the call once
//! - [`auth::SessionManager`] owns login, logout and refresh, and is the only
//!   writer of the persisted session
//!
//! Front ends plug in through the [`notify::Notifier`] and
//! [`navigation::Navigator`] traits.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod navigation;
pub mod notify;
pub mod pipeline;
pub mod tracker;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiError, MovieClient};
pub use auth::{AuthError, SessionManager};
pub use config::Config;
pub use pipeline::Pipeline;
pub use tracker::WorkTracker;
