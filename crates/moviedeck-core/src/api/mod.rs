//! HTTP layer for the movie catalog.
//!
//! This module provides:
//! - `ApiRequest`/`ApiResponse`: replayable call descriptors
//! - `Transport`: the wire hop at the bottom of the request pipeline
//! - `MovieClient`: catalog queries issued through the pipeline
//!
//! Catalog requests carry the catalog's `api_key` as a query parameter;
//! the session's bearer token is added by the pipeline.

pub mod client;
pub mod error;
pub mod request;
pub mod transport;

pub use client::MovieClient;
pub use error::ApiError;
pub use request::{ApiRequest, ApiResponse};
pub use transport::{ReqwestTransport, Transport, DEFAULT_REQUEST_TIMEOUT_SECS};
