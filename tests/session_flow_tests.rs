//! Session lifecycle tests.
//!
//! These tests verify that:
//! 1. Login persists the token and flips the session to authenticated
//! 2. Logout clears both the store and the in-memory state
//! 3. The navigation gate follows the session through the full cycle

use eko_kampus_lib::nav::{NavFlow, NavigationGate};
use eko_kampus_lib::session::{SessionContext, SessionState};
use eko_kampus_lib::storage::TokenStore;

mod common;

fn fresh_session(name: &str) -> SessionContext {
    SessionContext::new(TokenStore::at(common::scratch_dir(name)))
}

#[test]
fn fresh_install_lands_in_auth_flow() {
    let session = fresh_session("fresh-install");
    let mut gate = NavigationGate::new();

    assert_eq!(gate.flow(), NavFlow::Loading);

    let settled = session.initialize();
    assert_eq!(settled, SessionState::Unauthenticated);
    assert_eq!(gate.observe(&settled), Some(NavFlow::AuthFlow));
}

#[test]
fn login_round_trips_through_store_and_gate() {
    let session = fresh_session("login-roundtrip");
    let mut gate = NavigationGate::new();
    gate.observe(&session.initialize());

    session.login("tok123").unwrap();

    assert_eq!(session.token().as_deref(), Some("tok123"));
    assert_eq!(gate.observe(&session.state()), Some(NavFlow::MainFlow));
}

#[test]
fn logout_returns_to_auth_flow() {
    let session = fresh_session("logout");
    let mut gate = NavigationGate::new();
    gate.observe(&session.initialize());

    session.login("tok123").unwrap();
    gate.observe(&session.state());

    session.logout().unwrap();

    assert_eq!(session.state(), SessionState::Unauthenticated);
    assert_eq!(gate.observe(&session.state()), Some(NavFlow::AuthFlow));
}

#[test]
fn double_logout_is_idempotent() {
    let session = fresh_session("double-logout");
    session.initialize();
    session.login("tok123").unwrap();

    session.logout().unwrap();
    let after_once = session.state();
    session.logout().unwrap();

    assert_eq!(session.state(), after_once);
}

#[tokio::test]
async fn watch_subscribers_converge_on_the_final_state() {
    let session = fresh_session("watchers");
    let mut first = session.subscribe();
    let mut second = session.subscribe();

    session.initialize();
    session.login("tok123").unwrap();

    first.changed().await.unwrap();
    second.changed().await.unwrap();

    let expected = SessionState::Authenticated("tok123".into());
    assert_eq!(*first.borrow_and_update(), expected);
    assert_eq!(*second.borrow_and_update(), expected);
}
