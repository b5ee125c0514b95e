//! Auth controller: login, register and logout against the remote port.
//!
//! Every remote failure is converted into an `AuthOutcome`; nothing is
//! propagated to the caller as an error. The only side effects are Session
//! Store mutations and the caller-supplied navigation callback.

use std::sync::Arc;

use crate::gate::Route;
use crate::remote::{ErrorCode, RemoteAccess, RemoteError};
use crate::session::{Identity, SessionStore};

/// Which flow produced an outcome; selects the fallback notice text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    Login,
    Register,
}

/// Why an auth call failed, as far as the user needs to know.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// The server does not know this email.
    NotRegistered,
    /// Bad credentials, duplicate account, network or server error.
    Generic,
}

/// Result of `login` or `register`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthOutcome {
    pub action: AuthAction,
    pub success: bool,
    pub identity: Option<Identity>,
    /// Server-supplied message, if any.
    pub message: Option<String>,
    pub failure: Option<AuthFailure>,
}

impl AuthOutcome {
    fn succeeded(action: AuthAction, identity: Identity, message: Option<String>) -> Self {
        Self {
            action,
            success: true,
            identity: Some(identity),
            message,
            failure: None,
        }
    }

    fn failed(action: AuthAction, err: &RemoteError) -> Self {
        let failure = match err.code() {
            ErrorCode::UserNotRegistered => AuthFailure::NotRegistered,
            ErrorCode::Unauthorized | ErrorCode::Other => AuthFailure::Generic,
        };
        Self {
            action,
            success: false,
            identity: None,
            message: err.server_message().map(ToString::to_string),
            failure: Some(failure),
        }
    }

    /// User-facing message for a failed outcome; `None` on success.
    pub fn notice(&self) -> Option<String> {
        let failure = self.failure?;
        let text = match (self.action, failure) {
            (_, AuthFailure::NotRegistered) => "User not registered.".to_string(),
            (AuthAction::Login, AuthFailure::Generic) => "Login failed. Try again.".to_string(),
            (AuthAction::Register, AuthFailure::Generic) => self
                .message
                .clone()
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Registration failed. Try again.".to_string()),
        };
        Some(text)
    }
}

/// Drives authentication and keeps the Session Store in sync.
pub struct AuthController<R> {
    remote: Arc<R>,
    store: Arc<SessionStore>,
}

impl<R: RemoteAccess> AuthController<R> {
    pub fn new(remote: Arc<R>, store: Arc<SessionStore>) -> Self {
        Self { remote, store }
    }

    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        match self.remote.login(email, password).await {
            Ok(reply) => {
                self.store.set_identity(reply.user.clone());
                AuthOutcome::succeeded(AuthAction::Login, reply.user, reply.message)
            }
            Err(err) => {
                tracing::debug!(error = %err, "login failed");
                AuthOutcome::failed(AuthAction::Login, &err)
            }
        }
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> AuthOutcome {
        match self.remote.register(name, email, password).await {
            Ok(user) => {
                self.store.set_identity(user.clone());
                AuthOutcome::succeeded(AuthAction::Register, user, None)
            }
            Err(err) => {
                tracing::debug!(error = %err, "registration failed");
                AuthOutcome::failed(AuthAction::Register, &err)
            }
        }
    }

    /// Ends the session. The remote call is best-effort: the local session
    /// is cleared and `navigate` is called with the login route even if the
    /// server cannot be reached.
    pub async fn logout<F>(&self, navigate: F)
    where
        F: FnOnce(Route),
    {
        if let Err(err) = self.remote.logout().await {
            tracing::warn!(error = %err, "remote logout failed; clearing local session anyway");
        }
        self.store.clear();
        navigate(Route::Login);
    }
}
