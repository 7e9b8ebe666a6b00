//! Tauri Commands Module
//!
//! IPC commands exposed to the frontend, one group per screen.

use tauri::{command, AppHandle, State, WebviewWindow};
use serde::Serialize;
use tracing::{info, error, debug};

use crate::api::{
    ApiError, IssueReport, LeaderboardEntry, Profile, RegisterForm, RegisteredUser, TaskSummary,
    WasteReportReceipt,
};
use crate::nav::NavFlow;
use crate::reports::{DraftError, IssueDraft, WasteReportDraft};
use crate::storage::StorageError;
use crate::AppState;

// Response types for frontend

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub flow: NavFlow,
    pub authenticated: bool,
}

/// A task plus the client-computed completion flag.
#[derive(Debug, Serialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: TaskSummary,
    pub complete: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSubmission {
    pub created: IssueReport,
    /// Refreshed map pins; `None` when the post-submit re-fetch failed.
    pub reports: Option<Vec<IssueReport>>,
}

/// Error classes the frontend presents differently.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Validation,
    Permission,
    Auth,
    Network,
    Server,
    Storage,
}

/// Structured command failure.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<std::collections::HashMap<String, Vec<String>>>,
    pub retryable: bool,
}

impl From<ApiError> for CommandError {
    fn from(e: ApiError) -> Self {
        let retryable = e.is_retryable();
        let (kind, fields) = match &e {
            ApiError::Validation(fields) => (ErrorKind::Validation, Some(fields.clone())),
            ApiError::Auth(_) => (ErrorKind::Auth, None),
            ApiError::Timeout | ApiError::Network(_) => (ErrorKind::Network, None),
            ApiError::Server { .. } | ApiError::Parse(_) => (ErrorKind::Server, None),
        };
        Self {
            kind,
            message: e.to_string(),
            fields,
            retryable,
        }
    }
}

impl From<DraftError> for CommandError {
    fn from(e: DraftError) -> Self {
        let kind = match &e {
            DraftError::LocationUnavailable => ErrorKind::Permission,
            _ => ErrorKind::Validation,
        };
        let fields = match &e {
            DraftError::MissingField(field) => Some(std::collections::HashMap::from([(
                field.to_string(),
                vec![e.to_string()],
            )])),
            _ => None,
        };
        Self {
            kind,
            message: e.to_string(),
            fields,
            retryable: false,
        }
    }
}

impl From<StorageError> for CommandError {
    fn from(e: StorageError) -> Self {
        Self {
            kind: ErrorKind::Storage,
            message: e.to_string(),
            fields: None,
            retryable: false,
        }
    }
}

fn snapshot(state: &AppState) -> SessionSnapshot {
    let session_state = state.session.state();
    let flow = state
        .nav
        .lock()
        .map(|mut nav| {
            nav.observe(&session_state);
            nav.flow()
        })
        .unwrap_or(NavFlow::Loading);

    SessionSnapshot {
        flow,
        authenticated: session_state.is_authenticated(),
    }
}

// Commands

/// Settle the session from the token store and report the resulting flow.
#[command]
pub fn bootstrap_session(state: State<'_, AppState>) -> SessionSnapshot {
    debug!("Bootstrapping session");
    state.session.initialize();
    snapshot(&state)
}

/// Exchange credentials for a token and open the session.
#[command]
pub async fn login(
    email: String,
    password: String,
    state: State<'_, AppState>,
) -> Result<SessionSnapshot, CommandError> {
    info!("Login requested for: {}", email);

    let token = state.api.login(&email, &password).await.map_err(|e| {
        error!("Login rejected: {}", e);
        CommandError::from(e)
    })?;

    state.session.login(&token)?;
    Ok(snapshot(&state))
}

/// Create an account. The username is derived from the email local-part.
#[command]
pub async fn register(
    form: RegisterForm,
    state: State<'_, AppState>,
) -> Result<RegisteredUser, CommandError> {
    info!("Registration requested for: {}", form.email);
    Ok(state.api.register(&form).await?)
}

/// End the session and clear the stored token.
#[command]
pub async fn logout(state: State<'_, AppState>) -> Result<SessionSnapshot, CommandError> {
    info!("Logging out");
    state.session.logout()?;
    Ok(snapshot(&state))
}

/// Profile screen: name, email, and report counters.
#[command]
pub async fn fetch_profile(state: State<'_, AppState>) -> Result<Profile, CommandError> {
    Ok(state.api.profile().await?)
}

/// Leaderboard screen.
#[command]
pub async fn fetch_leaderboard(
    state: State<'_, AppState>,
) -> Result<Vec<LeaderboardEntry>, CommandError> {
    Ok(state.api.leaderboard().await?)
}

/// Bounty screen: open tasks with completion computed client-side.
#[command]
pub async fn fetch_tasks(state: State<'_, AppState>) -> Result<Vec<TaskView>, CommandError> {
    let tasks = state.api.tasks().await?;
    Ok(tasks
        .into_iter()
        .map(|task| TaskView {
            complete: task.is_complete(),
            task,
        })
        .collect())
}

/// Home screen: submit a waste disposal report.
///
/// Validation failures return before any network call; the frontend keeps
/// the draft for manual retry on any failure.
#[command]
pub async fn submit_waste_report(
    draft: WasteReportDraft,
    state: State<'_, AppState>,
) -> Result<WasteReportReceipt, CommandError> {
    draft.validate()?;
    Ok(state.api.create_waste_report(&draft).await?)
}

/// Detective screen: active issue pins for the map.
#[command]
pub async fn fetch_issue_reports(
    state: State<'_, AppState>,
) -> Result<Vec<IssueReport>, CommandError> {
    Ok(state.api.issue_reports().await?)
}

/// Detective screen: submit an environmental issue, then re-fetch the map
/// pins (best-effort; the submission stands even if the re-fetch fails).
#[command]
pub async fn submit_issue_report(
    draft: IssueDraft,
    state: State<'_, AppState>,
) -> Result<IssueSubmission, CommandError> {
    draft.validate()?;

    let created = state.api.create_issue_report(&draft).await?;

    let reports = match state.api.issue_reports().await {
        Ok(reports) => Some(reports),
        Err(e) => {
            debug!("Post-submit re-fetch failed: {}", e);
            None
        }
    };

    Ok(IssueSubmission { created, reports })
}

/// Minimize window
#[command]
pub fn minimize_window(window: WebviewWindow) {
    let _ = window.minimize();
}

/// Hide to system tray
#[command]
pub fn hide_to_tray(window: WebviewWindow) {
    let _ = window.hide();
}

/// Close window
#[command]
pub fn close_window(app: AppHandle) {
    app.exit(0);
}
