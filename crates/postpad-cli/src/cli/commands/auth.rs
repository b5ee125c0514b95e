//! Login, register, logout and whoami.

use anyhow::Result;
use postpad_core::auth::AuthOutcome;
use postpad_core::forms;
use postpad_core::gate::{GateDecision, Route};

use super::{App, check_form};

/// Returns true (after telling the user) when a session already exists.
fn already_signed_in(app: &App, route: Route) -> bool {
    let mut gate = app.gate(route);
    if gate.take_redirect() != Some(Route::Dashboard) {
        return false;
    }
    if let Some(identity) = app.store().identity() {
        println!("Already logged in as {} <{}>", identity.name, identity.email);
    }
    true
}

fn report(outcome: &AuthOutcome) -> Result<()> {
    if let Some(notice) = outcome.notice() {
        anyhow::bail!(notice);
    }
    if let Some(identity) = &outcome.identity {
        println!("Logged in as {} <{}>", identity.name, identity.email);
    }
    Ok(())
}

pub async fn login(app: &App, email: &str, password: &str) -> Result<()> {
    if already_signed_in(app, Route::Login) {
        return Ok(());
    }
    check_form(&forms::validate_login(email, password))?;

    let outcome = app.auth().login(email, password).await;
    report(&outcome)
}

pub async fn register(
    app: &App,
    name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<()> {
    if already_signed_in(app, Route::Register) {
        return Ok(());
    }
    check_form(&forms::validate_register(
        name,
        email,
        password,
        confirm_password,
    ))?;

    let outcome = app.auth().register(name, email, password).await;
    report(&outcome)
}

pub async fn logout(app: &App) -> Result<()> {
    app.auth()
        .logout(|route| tracing::debug!(path = route.path(), "navigate after logout"))
        .await;
    println!("Logged out.");
    Ok(())
}

pub fn whoami(app: &App) -> Result<()> {
    let gate = app.gate(Route::Dashboard);
    match (gate.decision(), app.store().identity()) {
        (GateDecision::Admit, Some(identity)) => {
            println!("{} <{}> ({})", identity.name, identity.email, identity.id);
            Ok(())
        }
        _ => anyhow::bail!("Not logged in."),
    }
}
