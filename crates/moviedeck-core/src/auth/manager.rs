//! Session state transitions: login, logout and refresh.
//!
//! `SessionManager` is the only writer of the `SessionStore`. Everything else
//! (the request pipeline, front ends) reads through it or subscribes to the
//! authentication state.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};

use super::{
    AuthError, CredentialPair, IdentitySource, LocalStorage, Session, SessionStore, TokenIssuer,
};
use crate::navigation::{Navigator, Route};

pub struct SessionManager {
    store: SessionStore,
    identities: Arc<dyn IdentitySource>,
    issuer: Arc<dyn TokenIssuer>,
    navigator: Arc<dyn Navigator>,
    authenticated: watch::Sender<bool>,
    // Held for the whole of a refresh so concurrent refreshes queue up
    refresh_slot: Mutex<()>,
}

impl SessionManager {
    /// Create a manager over `storage`. A session persisted by an earlier run
    /// is picked up as-is.
    pub fn new(
        storage: Arc<dyn LocalStorage>,
        identities: Arc<dyn IdentitySource>,
        issuer: Arc<dyn TokenIssuer>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let store = SessionStore::new(storage);
        let restored = store.credentials().is_some();
        debug!(restored, "Session manager initialized");
        let (authenticated, _) = watch::channel(restored);

        Self {
            store,
            identities,
            issuer,
            navigator,
            authenticated,
            refresh_slot: Mutex::new(()),
        }
    }

    // ===== Reads =====

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn access_token(&self) -> Option<String> {
        self.store.access_token()
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.store.refresh_token()
    }

    pub fn identity(&self) -> Option<String> {
        self.store.identity()
    }

    pub fn session(&self) -> Session {
        self.store.session()
    }

    pub fn is_authenticated(&self) -> bool {
        *self.authenticated.borrow()
    }

    /// Observe authentication state changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.authenticated.subscribe()
    }

    fn set_authenticated(&self, value: bool) {
        self.authenticated.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    // ===== Transitions =====

    /// Check `username`/`password` against the identity list and start a
    /// new session.
    ///
    /// Every failure, including an unreadable identity list, is reported as
    /// `InvalidCredentials`. The stored session is untouched on failure.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let users = self.identities.users().await.map_err(|e| {
            warn!(error = %e, "Failed to load identity list");
            AuthError::InvalidCredentials
        })?;

        let user = users
            .into_iter()
            .find(|u| u.matches(username, password))
            .ok_or_else(|| {
                info!(username = username, "Login rejected");
                AuthError::InvalidCredentials
            })?;

        let pair = self.issuer.issue(&user.username).await.map_err(|e| {
            warn!(error = %e, "Token issuer failed during login");
            AuthError::InvalidCredentials
        })?;

        self.store
            .write_session(&pair, &user.username)
            .map_err(|e| {
                error!(error = %e, "Failed to persist session");
                AuthError::InvalidCredentials
            })?;
        self.set_authenticated(true);
        info!(username = %user.username, "Login successful");

        Ok(Session {
            credentials: Some(pair),
            identity: Some(user.username),
        })
    }

    /// End the session and send the user to the login view. Safe to call
    /// when already logged out.
    pub fn logout(&self) {
        if let Err(e) = self.store.clear() {
            error!(error = %e, "Failed to clear stored session");
        }
        self.set_authenticated(false);
        info!("Logged out");
        self.navigator.navigate(Route::Login);
    }

    /// Replace the credential pair using the stored refresh token.
    ///
    /// With no refresh token, or when the backend or storage fails, the
    /// session is logged out before the error is returned.
    pub async fn refresh(&self) -> Result<CredentialPair, AuthError> {
        let _slot = self.refresh_slot.lock().await;
        self.refresh_locked().await
    }

    /// Refresh on behalf of a request that was rejected while carrying
    /// `stale_access_token`.
    ///
    /// If a concurrent refresh already replaced that token, the current pair
    /// is returned without minting a new one, so N simultaneous rejections
    /// cost a single backend refresh.
    pub async fn refresh_after(
        &self,
        stale_access_token: Option<&str>,
    ) -> Result<CredentialPair, AuthError> {
        let _slot = self.refresh_slot.lock().await;
        if let Some(current) = self.store.credentials() {
            if stale_access_token != Some(current.access_token.as_str()) {
                debug!("Credentials already refreshed by a concurrent request");
                return Ok(current);
            }
        }
        self.refresh_locked().await
    }

    async fn refresh_locked(&self) -> Result<CredentialPair, AuthError> {
        let Some(refresh_token) = self.store.refresh_token() else {
            warn!("Refresh requested without a refresh token");
            self.logout();
            return Err(AuthError::NoRefreshToken);
        };

        let pair = match self.issuer.refresh(&refresh_token).await {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "Token refresh rejected");
                self.logout();
                return Err(e);
            }
        };

        if let Err(e) = self.store.write_credentials(&pair) {
            error!(error = %e, "Failed to persist refreshed credentials");
            self.logout();
            return Err(AuthError::Storage(e.to_string()));
        }
        self.set_authenticated(true);
        info!("Session refreshed");
        Ok(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{MemoryStorage, StaticIdentitySource, UserRecord};
    use crate::testing::{CountingIssuer, RecordingNavigator};
    use std::time::Duration;

    struct Fixture {
        manager: Arc<SessionManager>,
        storage: Arc<MemoryStorage>,
        navigator: Arc<RecordingNavigator>,
        issuer: Arc<CountingIssuer>,
    }

    fn fixture_with(issuer: CountingIssuer) -> Fixture {
        let storage = Arc::new(MemoryStorage::new());
        let navigator = Arc::new(RecordingNavigator::default());
        let issuer = Arc::new(issuer);
        let identities = Arc::new(StaticIdentitySource::new(vec![
            UserRecord::new("alice", "secret"),
            UserRecord::new("bob", "hunter2"),
        ]));
        let manager = Arc::new(SessionManager::new(
            storage.clone(),
            identities,
            issuer.clone(),
            navigator.clone(),
        ));
        Fixture {
            manager,
            storage,
            navigator,
            issuer,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(CountingIssuer::default())
    }

    #[tokio::test]
    async fn test_login_populates_session() {
        let f = fixture();
        let session = f.manager.login("alice", "secret").await.unwrap();

        assert_eq!(session.identity.as_deref(), Some("alice"));
        assert_eq!(f.manager.session(), session);
        assert!(f.manager.access_token().is_some());
        assert!(f.manager.refresh_token().is_some());
        assert_eq!(f.manager.identity().as_deref(), Some("alice"));
        assert!(f.manager.is_authenticated());
    }

    #[tokio::test]
    async fn test_login_wrong_password_leaves_store_unchanged() {
        let f = fixture();
        let err = f.manager.login("alice", "wrong").await.unwrap_err();

        assert_eq!(err, AuthError::InvalidCredentials);
        assert_eq!(f.storage.get("accessToken").unwrap(), None);
        assert_eq!(f.storage.get("refreshToken").unwrap(), None);
        assert_eq!(f.storage.get("user").unwrap(), None);
        assert!(!f.manager.is_authenticated());
        assert_eq!(f.issuer.issues(), 0);
    }

    #[tokio::test]
    async fn test_login_failing_identity_source_is_invalid_credentials() {
        let manager = SessionManager::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(crate::auth::FileIdentitySource::new("/nonexistent/users.json".into())),
            Arc::new(CountingIssuer::default()),
            Arc::new(RecordingNavigator::default()),
        );
        let err = manager.login("alice", "secret").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let f = fixture();
        f.manager.login("alice", "secret").await.unwrap();
        f.manager.logout();

        assert_eq!(f.manager.access_token(), None);
        assert_eq!(f.manager.refresh_token(), None);
        assert_eq!(f.manager.identity(), None);
        assert!(!f.manager.is_authenticated());
        assert_eq!(f.navigator.routes(), vec![Route::Login]);

        // Idempotent apart from the navigation signal
        f.manager.logout();
        assert!(!f.manager.is_authenticated());
        assert_eq!(f.navigator.routes(), vec![Route::Login, Route::Login]);
    }

    #[tokio::test]
    async fn test_refresh_replaces_pair_keeps_identity() {
        let f = fixture();
        let session = f.manager.login("alice", "secret").await.unwrap();
        let old = session.credentials.unwrap();

        let new = f.manager.refresh().await.unwrap();
        assert_ne!(new.access_token, old.access_token);
        assert_ne!(new.refresh_token, old.refresh_token);
        assert_eq!(f.manager.store().credentials(), Some(new));
        assert_eq!(f.manager.identity().as_deref(), Some("alice"));
        assert_eq!(f.issuer.refreshes(), 1);
        assert_eq!(f.issuer.last_refresh_token(), Some(old.refresh_token));
    }

    #[tokio::test]
    async fn test_refresh_without_token_logs_out() {
        let f = fixture();
        let err = f.manager.refresh().await.unwrap_err();

        assert_eq!(err, AuthError::NoRefreshToken);
        assert_eq!(f.navigator.routes(), vec![Route::Login]);
        assert_eq!(f.issuer.refreshes(), 0);
    }

    #[tokio::test]
    async fn test_refresh_backend_failure_logs_out_before_returning() {
        let f = fixture_with(CountingIssuer::failing_refresh());
        f.manager.login("alice", "secret").await.unwrap();

        let err = f.manager.refresh().await.unwrap_err();
        assert!(matches!(err, AuthError::Backend(_)));
        assert_eq!(f.manager.access_token(), None);
        assert_eq!(f.manager.identity(), None);
        assert!(!f.manager.is_authenticated());
        assert_eq!(f.navigator.routes(), vec![Route::Login]);
    }

    #[tokio::test]
    async fn test_subscribe_observes_transitions() {
        let f = fixture();
        let mut rx = f.manager.subscribe();
        assert!(!*rx.borrow_and_update());

        f.manager.login("bob", "hunter2").await.unwrap();
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());

        f.manager.logout();
        assert!(!*rx.borrow_and_update());
    }

    #[tokio::test]
    async fn test_restored_session_starts_authenticated() {
        let f = fixture();
        f.manager.login("alice", "secret").await.unwrap();

        let restored = SessionManager::new(
            f.storage.clone(),
            Arc::new(StaticIdentitySource::default()),
            Arc::new(CountingIssuer::default()),
            Arc::new(RecordingNavigator::default()),
        );
        assert!(restored.is_authenticated());
        assert_eq!(restored.identity().as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_refresh_after_coalesces_concurrent_callers() {
        let f = fixture_with(CountingIssuer::with_delay(Duration::from_millis(20)));
        let session = f.manager.login("alice", "secret").await.unwrap();
        let stale = session.credentials.unwrap().access_token;

        let refreshes = (0..5).map(|_| f.manager.refresh_after(Some(&stale)));
        let pairs: Vec<CredentialPair> = futures::future::join_all(refreshes)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(f.issuer.refreshes(), 1);
        assert!(pairs.iter().all(|p| p == &pairs[0]));
        assert_ne!(pairs[0].access_token, stale);
    }
}
