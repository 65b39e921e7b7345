//! # News Harvest
//!
//! Harvests multi-page article bodies and paged comment listings for a batch
//! of news URLs and lays them out as fixed-width rows in a spreadsheet.
//!
//! ## Usage
//!
//! ```sh
//! news_harvest --credentials-file credentials.json \
//!     --input-spreadsheet-id IN_ID --output-spreadsheet-id OUT_ID
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Setup**: Load config and credentials, authorize the spreadsheet client (fatal on failure)
//! 2. **Input**: Read the day's URL list from the input spreadsheet
//! 3. **Harvest**: Paginate each article over HTTP and its comments in a headless browser
//! 4. **Output**: Replace the day's output sheet and bulk-write the rows

use chrono::Local;
use clap::Parser;
use std::error::Error;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod auth;
mod cli;
mod config;
mod errors;
mod extractors;
mod fetchers;
mod models;
mod outputs;
mod pagination;
mod pipeline;
mod utils;

use auth::{CredentialSource, SHEETS_SCOPE};
use cli::Cli;
use config::HarvestConfig;
use errors::Result;
use extractors::article::ArticleExtractor;
use extractors::comments::CommentExtractor;
use fetchers::browser::BrowserSession;
use fetchers::http::HttpFetcher;
use outputs::rows::RowLayout;
use outputs::sheets::SheetsClient;
use pipeline::{RunContext, RunPlan, RunSummary};
use utils::{date_key, validate_date_key};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = Instant::now();
    info!("news_harvest starting up");

    let args = Cli::parse();
    debug!(?args.input_sheet, ?args.date_key, ?args.config, "Parsed CLI arguments");

    match run(&args).await {
        Ok(summary) => {
            let elapsed = start_time.elapsed();
            info!(
                items = summary.items,
                written = summary.written,
                skipped = summary.skipped,
                rows = summary.rows,
                ?elapsed,
                "Harvest complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, fatal = e.is_fatal(), "Harvest aborted");
            Err(e.into())
        }
    }
}

/// Build everything that must succeed before the first page is fetched.
async fn init_context(args: &Cli) -> Result<RunContext<SheetsClient>> {
    let mut config = HarvestConfig::load(args.config.as_deref()).await?;
    config.apply_cli(args);
    config.validate()?;

    let date_key = match args.date_key.as_deref() {
        Some(key) => validate_date_key(key)?,
        None => date_key(&Local::now()),
    };
    let plan = RunPlan {
        input_spreadsheet_id: args.input_spreadsheet_id.clone(),
        output_spreadsheet_id: args.output_spreadsheet_id.clone(),
        input_sheet: args.input_sheet.clone().unwrap_or_else(|| date_key.clone()),
        input_column: args.input_column,
        date_key,
    };
    info!(date_key = %plan.date_key, input_sheet = %plan.input_sheet, "Run plan ready");

    let layout = RowLayout::new(config.row_width, config.max_comments, &config.unavailable)?;
    let article_extractor = ArticleExtractor::new(&config.selectors)?;
    let comment_extractor = CommentExtractor::new(&config.selectors)?;

    let credentials = CredentialSource::from_options(
        args.credentials_file.as_deref(),
        args.credentials_json.as_deref(),
    )?;
    let key = credentials.load().await?;
    let api_http = reqwest::Client::new();
    let token = key.access_token(&api_http, SHEETS_SCOPE).await?;

    Ok(RunContext {
        config,
        plan,
        layout,
        article_extractor,
        comment_extractor,
        store: SheetsClient::new(api_http, token),
    })
}

async fn run(args: &Cli) -> Result<RunSummary> {
    let ctx = init_context(args).await?;

    let items = ctx.source_items().await?;
    if items.is_empty() {
        warn!("No source URLs to harvest");
        return Ok(RunSummary::default());
    }

    let http = HttpFetcher::new(&ctx.config.user_agent, ctx.config.http_timeout())?;

    // The browser is the only resource held across items; it is closed on
    // every path out of the harvest, including a failed one.
    let session = BrowserSession::launch(&ctx.config.browser, ctx.config.browser_delay()).await?;
    let outcome = ctx.harvest(&http, &session, &items).await;
    session.close().await;

    outcome
}
