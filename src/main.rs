//! Eko-Kampüs Desktop - Main Entry Point
//!
//! Desktop companion app for the Eko-Kampüs campus recycling platform.
//! The Rust core owns the session, token storage, and all API traffic;
//! the webview renders the screens.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use std::sync::Mutex;

use tauri::{Emitter, Manager};
use tracing::{error, info};

use eko_kampus_lib::{
    api::ApiClient,
    commands,
    config::Config,
    logging,
    nav::NavigationGate,
    session::SessionContext,
    storage::TokenStore,
    AppState,
};

fn main() {
    // Initialize logging
    logging::init();
    info!("Eko-Kampüs Desktop starting...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            eprintln!("Eko-Kampüs Desktop: {}", e);
            std::process::exit(1);
        }
    };

    let session = SessionContext::new(TokenStore::new());
    let api = ApiClient::new(&config.api_base_url, session.subscribe(), config.http_timeout);

    let app_state = AppState {
        session,
        api,
        nav: Mutex::new(NavigationGate::new()),
    };

    tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())

        .on_window_event(|window, event| match event {
            tauri::WindowEvent::CloseRequested { api, .. } => {
                window.hide().unwrap();
                api.prevent_close();
            }
            _ => {}
        })
        .manage(app_state)
        .invoke_handler(tauri::generate_handler![
            commands::bootstrap_session,
            commands::login,
            commands::register,
            commands::logout,
            commands::fetch_profile,
            commands::fetch_leaderboard,
            commands::fetch_tasks,
            commands::submit_waste_report,
            commands::fetch_issue_reports,
            commands::submit_issue_report,
            commands::minimize_window,
            commands::hide_to_tray,
            commands::close_window,
        ])
        .setup(|app| {
            let tray_menu = tauri::menu::Menu::with_items(app, &[
                &tauri::menu::MenuItem::with_id(app, "show", "Show", true, None::<&str>)?,
                &tauri::menu::MenuItem::with_id(app, "quit", "Quit", true, None::<&str>)?,
            ])?;

            tauri::tray::TrayIconBuilder::new()
                .icon(app.default_window_icon().unwrap().clone())
                .menu(&tray_menu)
                .on_menu_event(|app, event| match event.id().as_ref() {
                    "show" => {
                        if let Some(window) = app.get_webview_window("main") {
                            let _ = window.show();
                            let _ = window.set_focus();
                        }
                    }
                    "quit" => {
                        app.exit(0);
                    }
                    _ => {}
                })
                .on_tray_icon_event(|tray, event| match event {
                    tauri::tray::TrayIconEvent::Click {
                        button: tauri::tray::MouseButton::Left,
                        ..
                    } => {
                        let app = tray.app_handle();
                        if let Some(window) = app.get_webview_window("main") {
                            let _ = window.show();
                            let _ = window.set_focus();
                        }
                    }
                    _ => {}
                })
                .build(app)?;

            // Forward navigation-gate transitions to the frontend.
            let mut session_rx = app.state::<AppState>().session.subscribe();
            let handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                while session_rx.changed().await.is_ok() {
                    let session_state = session_rx.borrow_and_update().clone();
                    let state = handle.state::<AppState>();
                    let transition = state
                        .nav
                        .lock()
                        .ok()
                        .and_then(|mut nav| nav.observe(&session_state));

                    if let Some(flow) = transition {
                        info!("Navigation: {:?}", flow);
                        let _ = handle.emit("navigation", flow);
                    }
                }
            });

            info!("Application setup complete");
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("Error running Eko-Kampüs Desktop");
}
