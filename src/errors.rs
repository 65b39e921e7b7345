//! Error type shared by every stage of a harvest run.
//!
//! Page-level stop conditions (empty page, repeated page, page cap) are not
//! errors and never show up here; see [`crate::pagination::Step`].

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, HarvestError>;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned http {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("browser session error: {0}")]
    Browser(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("credentials unavailable: {0}")]
    Credentials(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("input sheet '{sheet}' not found in spreadsheet {spreadsheet_id}")]
    InputSheetMissing {
        spreadsheet_id: String,
        sheet: String,
    },

    #[error("sheets api returned {status}: {body}")]
    Sheets { status: u16, body: String },
}

impl HarvestError {
    /// Errors that must stop the whole run before any page is fetched.
    ///
    /// Everything else is scoped to a single source item and recovered by the
    /// orchestrator.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Credentials(_)
                | Self::Config(_)
                | Self::Yaml(_)
                | Self::Token(_)
                | Self::InputSheetMissing { .. }
        )
    }
}
