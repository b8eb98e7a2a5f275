//! In-process collaborators shared by the unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::api::{ApiError, ApiRequest, ApiResponse, Transport};
use crate::auth::{
    generate_token, AuthError, CredentialPair, MemoryStorage, SessionManager,
    StaticIdentitySource, TokenIssuer, UserRecord,
};
use crate::navigation::{Navigator, Route};
use crate::notify::{Category, Notifier};

#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, Category, Duration)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .map(|(m, _, _)| m.clone())
            .collect()
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, c, _)| *c == Category::Error)
            .map(|(m, _, _)| m.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, category: Category, duration: Duration) {
        self.messages
            .lock()
            .unwrap()
            .push((message.to_string(), category, duration));
    }
}

/// Token issuer that counts its calls and can be told to fail or stall.
#[derive(Default)]
pub struct CountingIssuer {
    issues: AtomicUsize,
    refreshes: AtomicUsize,
    last_refresh_token: Mutex<Option<String>>,
    fail_refresh: bool,
    delay: Option<Duration>,
}

impl CountingIssuer {
    pub fn failing_refresh() -> Self {
        Self {
            fail_refresh: true,
            ..Self::default()
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn issues(&self) -> usize {
        self.issues.load(Ordering::SeqCst)
    }

    pub fn refreshes(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn last_refresh_token(&self) -> Option<String> {
        self.last_refresh_token.lock().unwrap().clone()
    }

    fn pair() -> CredentialPair {
        CredentialPair {
            access_token: generate_token(),
            refresh_token: generate_token(),
        }
    }
}

#[async_trait]
impl TokenIssuer for CountingIssuer {
    async fn issue(&self, _username: &str) -> Result<CredentialPair, AuthError> {
        self.issues.fetch_add(1, Ordering::SeqCst);
        Ok(Self::pair())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<CredentialPair, AuthError> {
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        *self.last_refresh_token.lock().unwrap() = Some(refresh_token.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_refresh {
            return Err(AuthError::Backend("refresh token revoked".to_string()));
        }
        Ok(Self::pair())
    }
}

type Handler = Box<dyn Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + Send + Sync>;

/// Transport that answers from a script and records what it was sent.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<ApiResponse, ApiError>>>,
    fallback: Handler,
    requests: Mutex<Vec<ApiRequest>>,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    /// Answer with each scripted outcome in turn, then with `200 {}`.
    pub fn new(script: Vec<Result<ApiResponse, ApiError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: Box::new(|_| Ok(ok_json("{}"))),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Answer every request with `handler`.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&ApiRequest) -> Result<ApiResponse, ApiError> + Send + Sync + 'static,
    {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.script.lock().unwrap().pop_front();
        match scripted {
            Some(outcome) => outcome,
            None => (self.fallback)(&request),
        }
    }
}

pub fn ok_json(body: &str) -> ApiResponse {
    ApiResponse::new(StatusCode::OK, body.as_bytes().to_vec())
}

pub fn unauthorized() -> ApiError {
    ApiError::from_status(401, "")
}

/// Session manager over in-memory storage knowing `alice`/`secret`.
pub fn session_manager(
    issuer: Arc<CountingIssuer>,
    navigator: Arc<RecordingNavigator>,
) -> Arc<SessionManager> {
    Arc::new(SessionManager::new(
        Arc::new(MemoryStorage::new()),
        Arc::new(StaticIdentitySource::new(vec![UserRecord::new(
            "alice", "secret",
        )])),
        issuer,
        navigator,
    ))
}
