//! CLI command handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use postpad_core::auth::AuthController;
use postpad_core::config::{COOKIE_STORAGE_KEY, Config, paths};
use postpad_core::forms::FieldError;
use postpad_core::gate::{AccessGate, GateDecision, Route};
use postpad_core::posts::PostManager;
use postpad_core::remote::HttpRemote;
use postpad_core::session::SessionStore;
use postpad_core::storage::{FileStorage, SessionStorage};

pub mod auth;
pub mod config;
pub mod posts;

/// Session store and remote client for one CLI invocation.
pub struct App {
    store: Arc<SessionStore>,
    remote: Arc<HttpRemote>,
}

impl App {
    /// Restores the persisted session and builds the HTTP client.
    pub fn open(config: &Config) -> Result<Self> {
        let storage: Arc<dyn SessionStorage> =
            Arc::new(FileStorage::new(paths::storage_dir()));
        let store = Arc::new(SessionStore::new(
            Arc::clone(&storage),
            config.session_key.clone(),
        ));
        store.restore();

        let mut remote = HttpRemote::new(&config.base_url)
            .with_context(|| format!("create client for {}", config.base_url))?;
        if config.persist_cookies {
            remote = remote.with_cookie_storage(storage, COOKIE_STORAGE_KEY);
        }

        Ok(Self {
            store,
            remote: Arc::new(remote),
        })
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn auth(&self) -> AuthController<HttpRemote> {
        AuthController::new(Arc::clone(&self.remote), Arc::clone(&self.store))
    }

    pub fn posts(&self) -> PostManager<HttpRemote> {
        PostManager::new(Arc::clone(&self.remote), Arc::clone(&self.store))
    }

    /// Evaluates the access gate for `route` against the restored session.
    pub fn gate(&self, route: Route) -> AccessGate {
        AccessGate::new(self.store.subscribe(), route)
    }

    /// Fails unless the dashboard is reachable.
    pub fn require_login(&self) -> Result<()> {
        match self.gate(Route::Dashboard).decision() {
            GateDecision::Admit => Ok(()),
            GateDecision::Redirect(_) | GateDecision::Pending => {
                anyhow::bail!("Not logged in. Run `postpad login` first.")
            }
        }
    }
}

/// Fails with every field message when the form is invalid.
pub fn check_form(errors: &[FieldError]) -> Result<()> {
    if errors.is_empty() {
        return Ok(());
    }
    let lines: Vec<String> = errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect();
    anyhow::bail!("{}", lines.join("\n"))
}
