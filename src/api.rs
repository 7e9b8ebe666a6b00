//! API Client Module
//!
//! HTTP communication with the Eko-Kampüs backend. Every request reads the
//! session state and, when authenticated, carries the bearer token.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, debug};

use crate::reports::{IssueDraft, ProblemType, WasteReportDraft};
use crate::session::SessionState;

/// API client for the Eko-Kampüs backend
pub struct ApiClient {
    base_url: String,
    session: watch::Receiver<SessionState>,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a new API client bound to a session read handle.
    pub fn new(
        base_url: &str,
        session: watch::Receiver<SessionState>,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            client,
        }
    }

    /// Build a request for `path`, attaching the bearer token when the
    /// session is authenticated. The token is read from the session
    /// context, never from disk.
    pub fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut request = self.client.request(method, &url);

        if let SessionState::Authenticated(token) = &*self.session.borrow() {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        request
    }

    async fn execute<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await.map_err(ApiError::from_transport)?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ApiError::Parse(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_response(status, &body))
    }

    /// Register a new account. The username is the email's local part.
    pub async fn register(&self, form: &RegisterForm) -> Result<RegisteredUser, ApiError> {
        debug!("Registering account for: {}", form.email);

        let request = RegisterRequest::from_form(form);
        let created: RegisteredUser = self
            .execute(self.request(Method::POST, "auth/register/").json(&request))
            .await?;

        info!("Account created: {}", created.username);
        Ok(created)
    }

    /// Exchange credentials for a bearer token.
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        let response: LoginResponse = self
            .execute(
                self.request(Method::POST, "auth/login/")
                    .json(&LoginRequest { email, password }),
            )
            .await?;

        info!("Login accepted");
        Ok(response.token)
    }

    /// Fetch the signed-in user's profile.
    pub async fn profile(&self) -> Result<Profile, ApiError> {
        self.execute(self.request(Method::GET, "auth/me/")).await
    }

    /// Fetch the points leaderboard, ordered by rank.
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, ApiError> {
        self.execute(self.request(Method::GET, "auth/leaderboard/"))
            .await
    }

    /// Fetch the open daily tasks.
    pub async fn tasks(&self) -> Result<Vec<TaskSummary>, ApiError> {
        self.execute(self.request(Method::GET, "reports/tasks/"))
            .await
    }

    /// Submit a waste disposal report.
    pub async fn create_waste_report(
        &self,
        draft: &WasteReportDraft,
    ) -> Result<WasteReportReceipt, ApiError> {
        let location = draft.location.as_ref().ok_or_else(|| {
            ApiError::Parse("draft submitted without a validated location".into())
        })?;

        let request = WasteReportRequest {
            bin: &draft.bin_code,
            waste_category: draft.category,
            verification_method: draft.verification,
            latitude: location.latitude,
            longitude: location.longitude,
            client_timestamp: Utc::now(),
            photo_base64: draft.photo_base64.as_deref(),
        };

        info!("Submitting waste report for bin: {}", draft.bin_code);

        let receipt: WasteReportReceipt = self
            .execute(self.request(Method::POST, "reports/create/").json(&request))
            .await?;

        info!("Waste report accepted: {}", receipt.id);
        Ok(receipt)
    }

    /// Fetch the active environmental issues shown on the map.
    pub async fn issue_reports(&self) -> Result<Vec<IssueReport>, ApiError> {
        self.execute(self.request(Method::GET, "detective/reports/"))
            .await
    }

    /// Submit an environmental issue report.
    pub async fn create_issue_report(&self, draft: &IssueDraft) -> Result<IssueReport, ApiError> {
        let location = draft.location.as_ref().ok_or_else(|| {
            ApiError::Parse("draft submitted without a validated location".into())
        })?;

        let request = IssueReportRequest {
            problem_type: draft.problem_type,
            latitude: location.latitude,
            longitude: location.longitude,
            description: &draft.description,
            photo_base64: draft.photo_base64.as_deref(),
        };

        info!("Submitting issue report: {:?}", draft.problem_type);

        let created: IssueReport = self
            .execute(self.request(Method::POST, "detective/reports/").json(&request))
            .await?;

        info!("Issue report accepted: {}", created.id);
        Ok(created)
    }
}

// Request/Response types

/// Registration fields as entered on the register screen.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    username: &'a str,
    email: &'a str,
    first_name: &'a str,
    last_name: &'a str,
    password: &'a str,
}

impl<'a> RegisterRequest<'a> {
    fn from_form(form: &'a RegisterForm) -> Self {
        let username = form.email.split('@').next().unwrap_or(&form.email);
        Self {
            username,
            email: &form.email,
            first_name: &form.first_name,
            last_name: &form.last_name,
            password: &form.password,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisteredUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub waste_count: u32,
    pub issue_count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: i64,
    pub name: String,
    pub points: i64,
    pub rank: u32,
}

/// A daily task ("bounty") as served by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: i64,
    pub title: String,
    pub desc: String,
    pub target: u32,
    pub current: u32,
    pub reward: u32,
    pub icon: String,
}

impl TaskSummary {
    /// A task is complete once its progress reaches the target.
    pub fn is_complete(&self) -> bool {
        self.current >= self.target
    }
}

#[derive(Serialize)]
struct WasteReportRequest<'a> {
    bin: &'a str,
    waste_category: crate::reports::WasteCategory,
    verification_method: crate::reports::VerificationMethod,
    latitude: f64,
    longitude: f64,
    client_timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo_base64: Option<&'a str>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WasteReportReceipt {
    pub id: String,
    pub status: String,
    pub points_awarded: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct IssueReportRequest<'a> {
    problem_type: ProblemType,
    latitude: f64,
    longitude: f64,
    description: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    photo_base64: Option<&'a str>,
}

/// An environmental issue pin on the map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueReport {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub problem_type: ProblemType,
    pub problem_type_display: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
    pub status: String,
}

/// API errors
///
/// Non-2xx responses are split into classes the screens can act on:
/// field-level validation, auth rejection, and everything else. Transport
/// failures (timeout, unreachable) are the only retryable class.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(HashMap<String, Vec<String>>),

    #[error("Authentication rejected (HTTP {0})")]
    Auth(u16),

    #[error("Server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ApiError {
    fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(e.to_string())
        }
    }

    fn from_response(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return ApiError::Auth(status.as_u16());
        }

        if status == StatusCode::BAD_REQUEST {
            if let Some(fields) = parse_field_errors(body) {
                return ApiError::Validation(fields);
            }
        }

        ApiError::Server {
            status: status.as_u16(),
            message: parse_error_message(body),
        }
    }

    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Timeout | ApiError::Network(_) => true,
            ApiError::Server { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Field-level messages, when the backend returned them.
    pub fn field_errors(&self) -> Option<&HashMap<String, Vec<String>>> {
        match self {
            ApiError::Validation(fields) => Some(fields),
            _ => None,
        }
    }
}

/// Parse a DRF-style 400 body: an object mapping field names to a message
/// or a list of messages.
fn parse_field_errors(body: &str) -> Option<HashMap<String, Vec<String>>> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;

    let mut fields = HashMap::new();
    for (key, entry) in object {
        let messages: Vec<String> = match entry {
            serde_json::Value::String(message) => vec![message.clone()],
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => continue,
        };
        if !messages.is_empty() {
            fields.insert(key.clone(), messages);
        }
    }

    if fields.is_empty() {
        None
    } else {
        Some(fields)
    }
}

fn parse_error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|value| {
            value
                .get("detail")
                .or_else(|| value.get("error"))
                .and_then(|message| message.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "Unknown error".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_is_derived_from_email_local_part() {
        let form = RegisterForm {
            first_name: "Ayşe".into(),
            last_name: "Yılmaz".into(),
            email: "ayse@ogr.akdeniz.edu.tr".into(),
            password: "s3cret-pass".into(),
        };
        let request = RegisterRequest::from_form(&form);
        assert_eq!(request.username, "ayse");
    }

    #[test]
    fn task_completion_is_current_at_or_over_target() {
        let json = r#"[{"id":1,"title":"Recycle 5 items","desc":"","target":5,"current":5,"reward":20,"icon":"♻️"}]"#;
        let tasks: Vec<TaskSummary> = serde_json::from_str(json).unwrap();
        assert!(tasks[0].is_complete());

        let open = TaskSummary {
            current: 4,
            ..tasks[0].clone()
        };
        assert!(!open.is_complete());
    }

    #[test]
    fn drf_field_errors_become_validation() {
        let body = r#"{"email":["Sadece kampüs adresleri kabul edilir."],"password":["Too short."]}"#;
        let error = ApiError::from_response(StatusCode::BAD_REQUEST, body);

        let fields = error.field_errors().expect("expected field errors");
        assert_eq!(fields["email"].len(), 1);
        assert_eq!(fields["password"][0], "Too short.");
        assert!(!error.is_retryable());
    }

    #[test]
    fn unauthorized_maps_to_auth() {
        let error = ApiError::from_response(StatusCode::UNAUTHORIZED, "{}");
        assert!(matches!(error, ApiError::Auth(401)));
        assert!(!error.is_retryable());
    }

    #[test]
    fn detail_message_is_surfaced() {
        let error =
            ApiError::from_response(StatusCode::INTERNAL_SERVER_ERROR, r#"{"detail":"boom"}"#);
        match &error {
            ApiError::Server { status, message } => {
                assert_eq!(*status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(error.is_retryable());
    }

    #[test]
    fn unstructured_400_is_a_server_error() {
        let error = ApiError::from_response(StatusCode::BAD_REQUEST, "nope");
        assert!(matches!(error, ApiError::Server { status: 400, .. }));
    }
}
