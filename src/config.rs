//! Tunable harvest settings.
//!
//! Everything that differed between the old per-site scripts (row width,
//! comment cap, selectors) lives here instead of in code. Values come from an
//! optional YAML file, then CLI overrides, then [`HarvestConfig::validate`].
//!
//! ```yaml
//! row_width: 50
//! page_cap: 10
//! browser_delay_secs: 2
//! max_comments: 35
//! selectors:
//!   comment: "p.sc-169yn8p-10"
//! browser:
//!   headless: true
//! ```

use crate::cli::Cli;
use crate::errors::{HarvestError, Result};
use crate::outputs::rows::MIN_ROW_WIDTH;
use crate::pagination::DEFAULT_PAGE_CAP;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Total number of columns in every output row.
    pub row_width: usize,
    /// Pages fetched per resource at most.
    pub page_cap: usize,
    /// Pause between loading a comment page and reading its rendered content.
    pub browser_delay_secs: u64,
    /// Comments written per item; `None` keeps as many as the row fits.
    pub max_comments: Option<usize>,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    /// Initial row count of a freshly created output sheet.
    pub sheet_rows: usize,
    /// Written in place of a title or timestamp that could not be found.
    pub unavailable: String,
    pub selectors: Selectors,
    pub browser: BrowserSettings,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            row_width: 50,
            page_cap: DEFAULT_PAGE_CAP,
            browser_delay_secs: 2,
            max_comments: None,
            http_timeout_secs: 10,
            user_agent: "Mozilla/5.0".to_string(),
            sheet_rows: 1000,
            unavailable: "取得不可".to_string(),
            selectors: Selectors::default(),
            browser: BrowserSettings::default(),
        }
    }
}

/// CSS selectors used by the extractors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub title: String,
    /// Removed from the page title, e.g. the site name.
    pub title_suffix: String,
    pub published: String,
    pub article: String,
    pub paragraph: String,
    pub comment: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            title: "title".to_string(),
            title_suffix: " - Yahoo!ニュース".to_string(),
            published: "time".to_string(),
            article: "article".to_string(),
            paragraph: "p".to_string(),
            comment: "p.sc-169yn8p-10".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Chrome binary; found on `PATH` when unset.
    pub chrome_path: Option<PathBuf>,
    pub chrome_args: Vec<String>,
    pub navigation_timeout_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            chrome_args: Vec::new(),
            navigation_timeout_secs: 30,
        }
    }
}

impl HarvestConfig {
    /// Load from YAML when a path is given, defaults otherwise.
    #[instrument(level = "info", skip_all, fields(path = ?path))]
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = fs::read_to_string(path).await.map_err(|e| {
                    HarvestError::Config(format!("cannot read {}: {e}", path.display()))
                })?;
                let config = Self::from_yaml(&text)?;
                info!("Loaded configuration file");
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Apply the layout overrides given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(width) = cli.row_width {
            self.row_width = width;
        }
        if let Some(cap) = cli.page_cap {
            self.page_cap = cap;
        }
        if let Some(max) = cli.max_comments {
            self.max_comments = Some(max);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.row_width < MIN_ROW_WIDTH {
            return Err(HarvestError::Config(format!(
                "row_width must be at least {MIN_ROW_WIDTH}, got {}",
                self.row_width
            )));
        }
        if self.page_cap == 0 {
            return Err(HarvestError::Config("page_cap must be at least 1".into()));
        }
        if self.sheet_rows == 0 {
            return Err(HarvestError::Config("sheet_rows must be at least 1".into()));
        }
        Ok(())
    }

    pub fn browser_delay(&self) -> Duration {
        Duration::from_secs(self.browser_delay_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults_match_observed_layout() {
        let config = HarvestConfig::default();
        assert_eq!(config.row_width, 50);
        assert_eq!(config.page_cap, 10);
        assert_eq!(config.browser_delay(), Duration::from_secs(2));
        assert_eq!(config.max_comments, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_other_defaults() {
        let config = HarvestConfig::from_yaml(
            "row_width: 30\nmax_comments: 35\nselectors:\n  comment: div.comment\n",
        )
        .unwrap();
        assert_eq!(config.row_width, 30);
        assert_eq!(config.max_comments, Some(35));
        assert_eq!(config.selectors.comment, "div.comment");
        assert_eq!(config.selectors.article, "article");
        assert!(config.browser.headless);
    }

    #[test]
    fn test_bad_yaml_is_fatal() {
        let err = HarvestConfig::from_yaml("row_width: [").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_narrow_rows_are_rejected() {
        let config = HarvestConfig {
            row_width: 15,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(HarvestError::Config(_))));

        let config = HarvestConfig {
            page_cap: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "news_harvest",
            "--credentials-json",
            "{}",
            "--input-spreadsheet-id",
            "in",
            "--output-spreadsheet-id",
            "out",
            "--row-width",
            "30",
            "--max-comments",
            "12",
        ]);
        let mut config = HarvestConfig::default();
        config.apply_cli(&cli);
        assert_eq!(config.row_width, 30);
        assert_eq!(config.max_comments, Some(12));
        assert_eq!(config.page_cap, 10);
    }

    #[tokio::test]
    async fn test_missing_config_file_is_fatal() {
        let err = HarvestConfig::load(Some(Path::new("/nonexistent/harvest.yaml")))
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }
}
