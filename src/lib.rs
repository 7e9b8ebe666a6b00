//! Eko-Kampüs Desktop Library
//!
//! Core modules for the desktop companion app.

pub mod api;
pub mod commands;
pub mod config;
pub mod logging;
pub mod nav;
pub mod reports;
pub mod session;
pub mod storage;

use std::sync::Mutex;
use api::ApiClient;
use nav::NavigationGate;
use session::SessionContext;

/// Application state shared across commands
pub struct AppState {
    pub session: SessionContext,
    pub api: ApiClient,
    pub nav: Mutex<NavigationGate>,
}
