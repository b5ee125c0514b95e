//! Access gate and client-side routes.
//!
//! `evaluate` is the pure guard. `AccessGate` binds it to a session
//! subscription so the decision follows every session change (e.g. a logout
//! while the dashboard is showing).

use tokio::sync::watch;

use crate::session::Session;

/// Client-side routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Login,
    Register,
    Dashboard,
    NotFound,
}

impl Route {
    /// Maps a location path to a route. `/` is the login entry.
    pub fn resolve(path: &str) -> Self {
        let trimmed = path.trim();
        let normalized = trimmed.trim_end_matches('/');
        match normalized {
            "" | "/login" => Self::Login,
            "/register" => Self::Register,
            "/dashboard" => Self::Dashboard,
            _ => Self::NotFound,
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::Login => "/login",
            Self::Register => "/register",
            Self::Dashboard => "/dashboard",
            Self::NotFound => "/404",
        }
    }

    /// Routes that require a signed-in user.
    pub fn is_protected(self) -> bool {
        matches!(self, Self::Dashboard)
    }

    /// Sign-in and sign-up pages, which bounce signed-in users to the dashboard.
    pub fn is_auth_entry(self) -> bool {
        matches!(self, Self::Login | Self::Register)
    }
}

/// Outcome of evaluating the gate for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Session still restoring: render a neutral placeholder, do not redirect.
    Pending,
    Admit,
    Redirect(Route),
}

/// Pure guard for entering `route` with `session`.
pub fn evaluate(session: &Session, route: Route) -> GateDecision {
    if session.loading {
        return GateDecision::Pending;
    }

    let signed_in = session.is_authenticated();
    if route.is_protected() && !signed_in {
        return GateDecision::Redirect(Route::Login);
    }
    if route.is_auth_entry() && signed_in {
        return GateDecision::Redirect(Route::Dashboard);
    }
    GateDecision::Admit
}

/// Gate bound to a session subscription.
#[derive(Debug)]
pub struct AccessGate {
    rx: watch::Receiver<Session>,
    route: Route,
    decision: GateDecision,
    unreported_redirect: Option<Route>,
}

impl AccessGate {
    pub fn new(mut rx: watch::Receiver<Session>, route: Route) -> Self {
        let session = rx.borrow_and_update().clone();
        let mut gate = Self {
            rx,
            route,
            decision: GateDecision::Pending,
            unreported_redirect: None,
        };
        gate.apply(&session);
        gate
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn decision(&self) -> GateDecision {
        self.decision
    }

    /// Re-evaluates if the session changed since the last evaluation.
    pub fn refresh(&mut self) -> GateDecision {
        if self.rx.has_changed().unwrap_or(false) {
            let session = self.rx.borrow_and_update().clone();
            self.apply(&session);
        }
        self.decision
    }

    /// Waits for the next session change and returns the new decision.
    /// Returns `None` once the session store is gone.
    pub async fn changed(&mut self) -> Option<GateDecision> {
        self.rx.changed().await.ok()?;
        let session = self.rx.borrow_and_update().clone();
        self.apply(&session);
        Some(self.decision)
    }

    /// Waits until the session has been restored, then returns the decision.
    pub async fn settled(&mut self) -> Option<GateDecision> {
        while self.decision == GateDecision::Pending {
            self.changed().await?;
        }
        Some(self.decision)
    }

    /// Returns a redirect target once per transition into a redirect.
    pub fn take_redirect(&mut self) -> Option<Route> {
        self.unreported_redirect.take()
    }

    /// Moves the gate to `route` (after following a redirect or a link).
    pub fn navigate(&mut self, route: Route) -> GateDecision {
        self.route = route;
        self.unreported_redirect = None;
        let session = self.rx.borrow_and_update().clone();
        self.apply(&session);
        self.decision
    }

    fn apply(&mut self, session: &Session) {
        let next = evaluate(session, self.route);
        if next != self.decision {
            self.unreported_redirect = match next {
                GateDecision::Redirect(target) => Some(target),
                GateDecision::Pending | GateDecision::Admit => None,
            };
        }
        self.decision = next;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::session::{Identity, SessionStore};
    use crate::storage::{MemoryStorage, SessionStorage};

    fn store() -> SessionStore {
        let storage: Arc<dyn SessionStorage> = Arc::new(MemoryStorage::new());
        SessionStore::new(storage, "user")
    }

    fn identity() -> Identity {
        Identity {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
        }
    }

    #[test]
    fn test_resolve_routes() {
        assert_eq!(Route::resolve("/"), Route::Login);
        assert_eq!(Route::resolve("/login"), Route::Login);
        assert_eq!(Route::resolve("/register/"), Route::Register);
        assert_eq!(Route::resolve("/dashboard"), Route::Dashboard);
        assert_eq!(Route::resolve("/nope"), Route::NotFound);
    }

    #[test]
    fn test_pending_while_loading() {
        let store = store();
        let gate = AccessGate::new(store.subscribe(), Route::Dashboard);
        assert_eq!(gate.decision(), GateDecision::Pending);
    }

    #[test]
    fn test_single_redirect_after_restore_without_identity() {
        let store = store();
        let mut gate = AccessGate::new(store.subscribe(), Route::Dashboard);
        assert_eq!(gate.take_redirect(), None);

        store.restore();
        assert_eq!(gate.refresh(), GateDecision::Redirect(Route::Login));
        assert_eq!(gate.take_redirect(), Some(Route::Login));
        assert_eq!(gate.take_redirect(), None);

        // No further redirects without a new transition.
        assert_eq!(gate.refresh(), GateDecision::Redirect(Route::Login));
        assert_eq!(gate.take_redirect(), None);
    }

    #[test]
    fn test_admit_then_redirect_on_logout() {
        let store = store();
        store.set_identity(identity());
        let mut gate = AccessGate::new(store.subscribe(), Route::Dashboard);
        assert_eq!(gate.decision(), GateDecision::Admit);

        store.clear();
        assert_eq!(gate.refresh(), GateDecision::Redirect(Route::Login));
        assert_eq!(gate.take_redirect(), Some(Route::Login));
    }

    #[test]
    fn test_auth_entry_bounces_signed_in_user() {
        let store = store();
        store.set_identity(identity());
        let mut gate = AccessGate::new(store.subscribe(), Route::Login);
        assert_eq!(gate.decision(), GateDecision::Redirect(Route::Dashboard));
        assert_eq!(gate.take_redirect(), Some(Route::Dashboard));
        assert_eq!(gate.navigate(Route::Dashboard), GateDecision::Admit);
    }

    #[test]
    fn test_not_found_always_admitted() {
        let store = store();
        store.restore();
        let gate = AccessGate::new(store.subscribe(), Route::NotFound);
        assert_eq!(gate.decision(), GateDecision::Admit);
    }

    #[tokio::test]
    async fn test_changed_follows_session() {
        let store = Arc::new(store());
        let mut gate = AccessGate::new(store.subscribe(), Route::Dashboard);

        let restorer = Arc::clone(&store);
        tokio::spawn(async move {
            restorer.restore();
        });

        assert_eq!(
            gate.settled().await,
            Some(GateDecision::Redirect(Route::Login))
        );
    }
}
