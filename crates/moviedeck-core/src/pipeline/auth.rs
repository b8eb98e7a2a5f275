use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{is_asset_request, is_login_request, is_refresh_request, Middleware, Next};
use crate::api::{ApiError, ApiRequest, ApiResponse};
use crate::auth::SessionManager;
use crate::notify::Notifier;

pub const AUTHENTICATION_REQUIRED_MESSAGE: &str = "Authentication required. Please login again.";

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired. Please login again.";

/// Attaches the bearer token and recovers from authorization failures.
///
/// A 401 triggers one session refresh and one retry of the original request
/// with the new token. Whatever the retry returns is final, and a failed
/// retry ends the session. Other failures, including a 401 on the refresh
/// call itself, are announced through the notifier and passed on unchanged.
pub struct AuthStage {
    session: Arc<SessionManager>,
    notifier: Arc<dyn Notifier>,
}

impl AuthStage {
    pub fn new(session: Arc<SessionManager>, notifier: Arc<dyn Notifier>) -> Self {
        Self { session, notifier }
    }

    fn report(&self, err: &ApiError) {
        if let Some(message) = err.user_message() {
            self.notifier.show_error(&message);
        }
    }

    fn expire_session(&self) {
        self.notifier.show_error(SESSION_EXPIRED_MESSAGE);
        if self.session.is_authenticated() {
            self.session.logout();
        }
    }

    async fn recover(
        &self,
        request: ApiRequest,
        sent_token: Option<String>,
        original: ApiError,
        next: Next<'_>,
    ) -> Result<ApiResponse, ApiError> {
        if self.session.refresh_token().is_none() {
            warn!(url = %request.url, "Unauthorized and no refresh token available");
            self.notifier.show_error(AUTHENTICATION_REQUIRED_MESSAGE);
            self.session.logout();
            return Err(original);
        }

        let pair = match self.session.refresh_after(sent_token.as_deref()).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(url = %request.url, error = %e, "Session refresh failed");
                // The session manager has already logged out on this path
                self.expire_session();
                return Err(ApiError::RefreshFailure(e));
            }
        };

        debug!(url = %request.url, "Retrying request with refreshed token");
        let retry = request.with_bearer(&pair.access_token)?;
        // The retry's outcome is final; any failure here ends the session
        match next.run(retry).await {
            Ok(response) => Ok(response),
            Err(err) => {
                warn!(url = %request.url, status = err.status(), "Retried request failed");
                self.expire_session();
                Err(err)
            }
        }
    }
}

#[async_trait]
impl Middleware for AuthStage {
    async fn handle(&self, request: ApiRequest, next: Next<'_>) -> Result<ApiResponse, ApiError> {
        if is_asset_request(&request) || is_login_request(&request) {
            return next.run(request).await;
        }

        let token = self.session.access_token();
        let outgoing = match token.as_deref() {
            Some(token) => request.with_bearer(token)?,
            None => request.clone(),
        };

        match next.run(outgoing).await {
            Ok(response) => Ok(response),
            Err(err) if err.is_authorization_denied() && !is_refresh_request(&request) => {
                debug!(url = %request.url, "Request unauthorized, attempting refresh");
                self.recover(request, token, err, next).await
            }
            Err(err) => {
                debug!(url = %request.url, status = err.status(), "Request failed");
                self.report(&err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::Route;
    use crate::pipeline::Pipeline;
    use crate::testing::{
        ok_json, session_manager, unauthorized, CountingIssuer, RecordingNavigator,
        RecordingNotifier, ScriptedTransport,
    };
    use reqwest::Url;

    fn get(path: &str) -> ApiRequest {
        ApiRequest::get(Url::parse(&format!("https://api.example.com{}", path)).unwrap())
    }

    #[tokio::test]
    async fn test_attaches_current_token() {
        let transport = Arc::new(ScriptedTransport::new(vec![]));
        let session = session_manager(
            Arc::new(CountingIssuer::default()),
            Arc::new(RecordingNavigator::default()),
        );
        session.login("alice", "secret").await.unwrap();
        let pipeline = Pipeline::builder(transport.clone())
            .with(AuthStage::new(session.clone(), Arc::new(RecordingNotifier::default())))
            .build();

        let request = get("/movie/7");
        pipeline.execute(request.clone()).await.unwrap();

        let token = session.access_token().unwrap();
        assert_eq!(transport.requests()[0].bearer_token(), Some(token.as_str()));
        assert_eq!(request.bearer_token(), None);
    }

    #[tokio::test]
    async fn test_retry_server_failure_expires_session() {
        let transport = Arc::new(ScriptedTransport::new(vec![
            Err(unauthorized()),
            Err(ApiError::from_status(500, "")),
        ]));
        let navigator = Arc::new(RecordingNavigator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let session = session_manager(Arc::new(CountingIssuer::default()), navigator.clone());
        session.login("alice", "secret").await.unwrap();
        let pipeline = Pipeline::builder(transport.clone())
            .with(AuthStage::new(session.clone(), notifier.clone()))
            .build();

        let err = pipeline.execute(get("/movie/7")).await.unwrap_err();

        assert_eq!(err.status(), 500);
        assert_eq!(transport.requests().len(), 2);
        assert_eq!(notifier.errors(), vec![SESSION_EXPIRED_MESSAGE.to_string()]);
        assert!(!session.is_authenticated());
        assert_eq!(session.access_token(), None);
        assert_eq!(navigator.routes(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn test_refresh_call_401_is_reported_not_recovered() {
        let transport = Arc::new(ScriptedTransport::new(vec![Err(ApiError::from_status(
            401, "revoked",
        ))]));
        let navigator = Arc::new(RecordingNavigator::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let issuer = Arc::new(CountingIssuer::default());
        let session = session_manager(issuer.clone(), navigator.clone());
        session.login("alice", "secret").await.unwrap();
        let pipeline = Pipeline::builder(transport.clone())
            .with(AuthStage::new(session.clone(), notifier.clone()))
            .build();

        let err = pipeline.execute(get("/auth/refresh")).await.unwrap_err();

        assert!(err.is_authorization_denied());
        assert_eq!(transport.requests().len(), 1);
        assert_eq!(issuer.refreshes(), 0);
        assert_eq!(notifier.errors(), vec!["Request failed: revoked".to_string()]);
        assert!(session.is_authenticated());
        assert!(navigator.routes().is_empty());
    }

    #[tokio::test]
    async fn test_success_passes_through_untouched() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(ok_json(r#"{"page":1}"#))]));
        let notifier = Arc::new(RecordingNotifier::default());
        let session = session_manager(
            Arc::new(CountingIssuer::default()),
            Arc::new(RecordingNavigator::default()),
        );
        let pipeline = Pipeline::builder(transport)
            .with(AuthStage::new(session, notifier.clone()))
            .build();

        let response = pipeline.execute(get("/movie/popular")).await.unwrap();
        assert_eq!(response.text(), r#"{"page":1}"#);
        assert!(notifier.messages().is_empty());
    }
}
