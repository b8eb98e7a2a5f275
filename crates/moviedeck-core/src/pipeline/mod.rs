//! The middleware chain every outbound API call passes through.
//!
//! Stages run in a fixed order around the transport:
//!
//! 1. `WorkTrackingStage` - counts the call as in flight for its whole life
//! 2. `AuthStage` - attaches the bearer token and recovers from 401s by
//!    refreshing the session and retrying once
//!
//! Calls to static assets skip both stages; calls to the login endpoint skip
//! the auth stage.

pub mod auth;
pub mod work;

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::{ApiError, ApiRequest, ApiResponse, Transport};
use crate::auth::SessionManager;
use crate::notify::Notifier;
use crate::tracker::WorkTracker;

pub use auth::AuthStage;
pub use work::WorkTrackingStage;

/// Path segment marking static asset requests
const ASSETS_SEGMENT: &str = "assets";

/// Path segment marking the login endpoint
const LOGIN_SEGMENT: &str = "login";

/// Path segment marking the token refresh endpoint
const REFRESH_SEGMENT: &str = "refresh";

pub fn is_asset_request(request: &ApiRequest) -> bool {
    request.has_path_segment(ASSETS_SEGMENT)
}

pub fn is_login_request(request: &ApiRequest) -> bool {
    request.has_path_segment(LOGIN_SEGMENT)
}

pub fn is_refresh_request(request: &ApiRequest) -> bool {
    request.has_path_segment(REFRESH_SEGMENT)
}

/// A composable unit wrapping call dispatch with pre/post behavior.
#[async_trait]
pub trait Middleware: Send + Sync {
    async fn handle(&self, request: ApiRequest, next: Next<'_>) -> Result<ApiResponse, ApiError>;
}

/// The remainder of the chain after the current stage.
///
/// `Next` is `Copy`, so a stage may run the rest of the chain more than once
/// (the auth stage does so for its single retry).
#[derive(Clone, Copy)]
pub struct Next<'a> {
    transport: &'a dyn Transport,
    middlewares: &'a [Arc<dyn Middleware>],
}

impl<'a> Next<'a> {
    pub async fn run(self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        match self.middlewares.split_first() {
            Some((current, rest)) => {
                let next = Next {
                    transport: self.transport,
                    middlewares: rest,
                };
                current.handle(request, next).await
            }
            None => self.transport.send(request).await,
        }
    }
}

pub struct Pipeline {
    transport: Arc<dyn Transport>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl Pipeline {
    pub fn builder(transport: Arc<dyn Transport>) -> PipelineBuilder {
        PipelineBuilder {
            transport,
            middlewares: Vec::new(),
        }
    }

    /// The standard chain: work tracking wrapping credential handling.
    pub fn standard(
        transport: Arc<dyn Transport>,
        tracker: Arc<WorkTracker>,
        session: Arc<SessionManager>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::builder(transport)
            .with(WorkTrackingStage::new(tracker))
            .with(AuthStage::new(session, notifier))
            .build()
    }

    pub async fn execute(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let next = Next {
            transport: self.transport.as_ref(),
            middlewares: &self.middlewares,
        };
        next.run(request).await
    }
}

pub struct PipelineBuilder {
    transport: Arc<dyn Transport>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl PipelineBuilder {
    /// Append a stage; earlier stages wrap later ones.
    pub fn with<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            transport: self.transport,
            middlewares: self.middlewares,
        }
    }
}
