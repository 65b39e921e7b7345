//! Command-line interface definitions for the harvester.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Spreadsheet ids and credentials can also be supplied via environment
//! variables, which is how scheduled CI runs provide them.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for a harvest run.
///
/// # Examples
///
/// ```sh
/// # Credentials from a key file, today's date key
/// news_harvest --credentials-file credentials.json \
///     --input-spreadsheet-id IN_ID --output-spreadsheet-id OUT_ID
///
/// # Credentials from the environment, re-running an earlier day
/// GOOGLE_SERVICE_ACCOUNT_CREDENTIALS="$(cat key.json)" \
///     news_harvest --input-spreadsheet-id IN_ID --output-spreadsheet-id OUT_ID --date-key 250101
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a service-account key file
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    pub credentials_file: Option<PathBuf>,

    /// Service-account key as an inline JSON string
    #[arg(long, env = "GOOGLE_SERVICE_ACCOUNT_CREDENTIALS", hide_env_values = true)]
    pub credentials_json: Option<String>,

    /// Spreadsheet holding the list of source URLs
    #[arg(long, env = "INPUT_SPREADSHEET_ID")]
    pub input_spreadsheet_id: String,

    /// Spreadsheet the harvested rows are written to
    #[arg(long, env = "OUTPUT_SPREADSHEET_ID")]
    pub output_spreadsheet_id: String,

    /// Input sheet name (defaults to the date key)
    #[arg(long)]
    pub input_sheet: Option<String>,

    /// 1-based column of the input sheet that holds the URLs
    #[arg(long, default_value_t = 3)]
    pub input_column: usize,

    /// Date key (YYMMDD) naming the input and output sheets; defaults to today
    #[arg(long)]
    pub date_key: Option<String>,

    /// Optional path to a YAML file with layout, selector and browser settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the number of columns per output row
    #[arg(long)]
    pub row_width: Option<usize>,

    /// Override the page cap per resource
    #[arg(long)]
    pub page_cap: Option<usize>,

    /// Override the number of comments written per item
    #[arg(long)]
    pub max_comments: Option<usize>,
}
