//! Report Drafts Module
//!
//! Draft types for the two submission flows (waste disposal and
//! environmental issue) and the local validation that runs before any
//! network call.

use base64::Engine;
use serde::{Deserialize, Serialize};

/// Waste categories offered by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WasteCategory {
    Plastic,
    Paper,
    Glass,
    Organic,
}

/// How a waste report is verified server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationMethod {
    Photo,
    Qr,
    Both,
}

/// Environmental problem categories for the map flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemType {
    Littering,
    Overflowing,
    WrongSort,
    DamagedBin,
    Other,
}

/// A point on the campus map.
///
/// Drafts carry `Option<Coordinates>` because the webview may fail to
/// acquire a location fix (permission denied); that is a recoverable
/// condition, not a panic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    fn in_bounds(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude.abs() <= 90.0
            && self.longitude.abs() <= 180.0
    }
}

/// Pending "I disposed of waste" submission (Home screen).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WasteReportDraft {
    pub bin_code: String,
    pub category: WasteCategory,
    pub verification: VerificationMethod,
    pub location: Option<Coordinates>,
    pub photo_base64: Option<String>,
}

impl WasteReportDraft {
    /// Local validation. Runs before any network call; an invalid draft
    /// issues zero requests.
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.bin_code.trim().is_empty() {
            return Err(DraftError::MissingField("bin_code"));
        }
        let location = self.location.ok_or(DraftError::LocationUnavailable)?;
        if !location.in_bounds() {
            return Err(DraftError::CoordinatesOutOfRange);
        }
        if let Some(photo) = &self.photo_base64 {
            check_photo(photo)?;
        }
        Ok(())
    }
}

/// Pending "I spotted a problem" submission (Detective screen).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDraft {
    pub problem_type: ProblemType,
    pub description: String,
    pub location: Option<Coordinates>,
    pub photo_base64: Option<String>,
}

impl IssueDraft {
    pub fn validate(&self) -> Result<(), DraftError> {
        if self.description.trim().is_empty() {
            return Err(DraftError::MissingField("description"));
        }
        let location = self.location.ok_or(DraftError::LocationUnavailable)?;
        if !location.in_bounds() {
            return Err(DraftError::CoordinatesOutOfRange);
        }
        if let Some(photo) = &self.photo_base64 {
            check_photo(photo)?;
        }
        Ok(())
    }
}

/// The backend hashes and AI-screens the photo; an undecodable payload
/// would burn the submission, so it is checked here first.
fn check_photo(photo: &str) -> Result<(), DraftError> {
    let payload = photo
        .split_once(";base64,")
        .map(|(_, rest)| rest)
        .unwrap_or(photo);

    let decoded = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|e| DraftError::InvalidPhoto(e.to_string()))?;

    if decoded.is_empty() {
        return Err(DraftError::InvalidPhoto("empty photo payload".into()));
    }
    Ok(())
}

/// Draft validation errors
#[derive(Debug, thiserror::Error)]
pub enum DraftError {
    #[error("Required field is empty: {0}")]
    MissingField(&'static str),

    #[error("Location unavailable")]
    LocationUnavailable,

    #[error("Coordinates outside valid range")]
    CoordinatesOutOfRange,

    #[error("Photo payload is not valid base64: {0}")]
    InvalidPhoto(String),
}
