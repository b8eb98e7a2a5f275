//! Application wiring and command handlers.
//!
//! `App` builds the core's collaborators once (storage, session manager,
//! work-tracker, request pipeline, catalog client) and exposes one method
//! per command.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use moviedeck_core::api::{MovieClient, ReqwestTransport};
use moviedeck_core::auth::{FileIdentitySource, FileStorage, MockTokenIssuer, SessionManager};
use moviedeck_core::navigation::{Navigator, Route};
use moviedeck_core::notify::Notifier;
use moviedeck_core::{Config, Pipeline, WorkTracker};
use tracing::{debug, info, warn};

use crate::console::{ConsoleNavigator, ConsoleNotifier};
use crate::credentials::CredentialStore;
use crate::render;

pub struct App {
    pub config: Config,
    pub session: Arc<SessionManager>,
    pub tracker: Arc<WorkTracker>,
    movies: MovieClient,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Result<Self> {
        let data_dir = config.data_dir().unwrap_or_else(|_| PathBuf::from("./data"));
        debug!(?data_dir, "Data directory configured");

        let storage = Arc::new(FileStorage::open(&data_dir)?);
        debug!(path = %storage.path().display(), "Session storage opened");
        let users_path = config.users_path()?;
        debug!(?users_path, "Identity list configured");

        let notifier: Arc<dyn Notifier> =
            Arc::new(ConsoleNotifier::new(config.notification_duration()));
        let navigator: Arc<dyn Navigator> = Arc::new(ConsoleNavigator);

        let session = Arc::new(SessionManager::new(
            storage,
            Arc::new(FileIdentitySource::new(users_path)),
            Arc::new(MockTokenIssuer),
            navigator.clone(),
        ));
        debug!(authenticated = session.is_authenticated(), "Session loaded");

        let tracker = Arc::new(WorkTracker::new());
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout())?);
        let pipeline = Arc::new(Pipeline::standard(
            transport,
            tracker.clone(),
            session.clone(),
            notifier.clone(),
        ));
        let movies = MovieClient::new(
            pipeline,
            config.api_base_url.clone(),
            config.api_key.clone(),
        );

        Ok(Self {
            config,
            session,
            tracker,
            movies,
            notifier,
            navigator,
        })
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    pub async fn login(&mut self, username: Option<String>) -> Result<()> {
        let username = match username {
            Some(u) => u,
            None => self.prompt_username()?,
        };
        if username.is_empty() {
            bail!("Username required");
        }
        let password = Self::password_for(&username)?;

        match self.session.login(&username, &password).await {
            Ok(_) => {
                if let Err(e) = CredentialStore::store(&username, &password) {
                    warn!(error = %e, "Failed to store credentials");
                }
                self.config.last_username = Some(username.clone());
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                info!(username = %username, "Login successful");
                self.notifier.show_success(&format!("Welcome, {}!", username));
                Ok(())
            }
            Err(e) => {
                self.notifier.show_error("Invalid username or password");
                Err(e.into())
            }
        }
    }

    pub fn logout(&mut self, forget: bool) {
        if forget {
            if let Some(username) = self.session.identity().or_else(|| self.config.last_username.clone()) {
                if let Err(e) = CredentialStore::delete(&username) {
                    warn!(error = %e, "Failed to delete stored credentials");
                }
            }
        }
        self.session.logout();
        self.notifier.show_info("Logged out.");
    }

    pub fn whoami(&self) {
        match self.session.identity() {
            Some(user) if self.session.is_authenticated() => println!("Logged in as {}", user),
            _ => println!("Not logged in"),
        }
    }

    fn prompt_username(&self) -> Result<String> {
        match self.config.last_username {
            Some(ref last_user) => print!("Username [{}]: ", last_user),
            None => print!("Username: "),
        }
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim();

        match (input.is_empty(), &self.config.last_username) {
            (true, Some(last_user)) => Ok(last_user.clone()),
            _ => Ok(input.to_string()),
        }
    }

    fn password_for(username: &str) -> Result<String> {
        if CredentialStore::has_credentials(username) {
            print!("Use stored password? [Y/n]: ");
            io::stdout().flush()?;

            let mut input = String::new();
            io::stdin().read_line(&mut input)?;

            if input.trim().to_lowercase() != "n" {
                return CredentialStore::get_password(username);
            }
        }
        Ok(rpassword::prompt_password("Password: ")?)
    }

    /// Catalog views sit behind the login.
    fn require_login(&self) -> Result<()> {
        if !self.session.is_authenticated() {
            self.navigator.navigate(Route::Login);
            bail!("Not logged in");
        }
        Ok(())
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    pub async fn popular(&self, page: u32) -> Result<()> {
        self.require_login()?;
        let list = self.movies.popular(page).await?;
        print!("{}", render::movie_list("Popular", &list));
        Ok(())
    }

    pub async fn top_rated(&self, page: u32) -> Result<()> {
        self.require_login()?;
        let list = self.movies.top_rated(page).await?;
        print!("{}", render::movie_list("Top rated", &list));
        Ok(())
    }

    pub async fn search(&self, query: &str, page: u32) -> Result<()> {
        self.require_login()?;
        let query = query.trim();
        if query.is_empty() {
            bail!("Search query required");
        }
        let list = self.movies.search(query, page).await?;
        print!("{}", render::movie_list(&format!("Results for \"{}\"", query), &list));
        Ok(())
    }

    pub async fn movie(&self, id: &str) -> Result<()> {
        self.require_login()?;
        let detail = self.movies.resolve_movie(id, self.navigator.as_ref()).await?;
        print!("{}", render::movie_detail(&detail));
        Ok(())
    }
}
