//! Headless browser transport for script-rendered pages.
//!
//! A single [`BrowserSession`] is launched per run and one tab is reused for
//! every comment page. Each fetch navigates, pauses for the settle delay so
//! script-rendered content can appear, and only then reads the DOM. Fetches
//! are sequential, so the pause also keeps the source at one page per delay.
//!
//! The session is closed explicitly by the run function; if it is dropped
//! without closing (panic, early `?`), the protocol handler task is aborted
//! and the browser's own drop kills the child process.

use super::Fetcher;
use crate::config::BrowserSettings;
use crate::errors::{HarvestError, Result};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

/// Chrome flags needed to run headless inside containers and CI runners.
const BASE_CHROME_ARGS: &[&str] = &["--no-sandbox", "--disable-dev-shm-usage", "--disable-gpu"];

/// A launched browser with one reusable tab.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
    settle: Duration,
    closed: bool,
}

fn browser_err(e: impl std::fmt::Display) -> HarvestError {
    HarvestError::Browser(e.to_string())
}

impl BrowserSession {
    /// Launch the browser and open a blank tab. `settle` is the pause between
    /// navigating to a page and reading its content.
    #[instrument(level = "info", skip_all, fields(headless = settings.headless, ?settle))]
    pub async fn launch(settings: &BrowserSettings, settle: Duration) -> Result<Self> {
        let mut builder = BrowserConfig::builder();
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(ref path) = settings.chrome_path {
            builder = builder.chrome_executable(path);
        }
        for arg in BASE_CHROME_ARGS {
            builder = builder.arg(*arg);
        }
        for arg in &settings.chrome_args {
            builder = builder.arg(arg.as_str());
        }
        let config = builder.build().map_err(HarvestError::Browser)?;

        let (browser, mut events) = Browser::launch(config).await.map_err(browser_err)?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(browser_err(e));
            }
        };

        info!("Browser session started");
        Ok(Self {
            browser,
            page,
            handler,
            navigation_timeout: Duration::from_secs(settings.navigation_timeout_secs),
            settle,
            closed: false,
        })
    }

    /// Shut the browser down and wait for the child process to exit.
    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "Browser did not acknowledge close");
        }
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "Failed waiting for browser process");
        }
        self.handler.abort();
        self.closed = true;
        info!("Browser session closed");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!("Browser session dropped without close; aborting handler");
            self.handler.abort();
        }
    }
}

/// The two halves of a browser fetch, kept apart so the settle pause can sit
/// between them.
pub(crate) trait Tab {
    async fn navigate(&self, url: &str) -> Result<()>;

    async fn html(&self) -> Result<String>;
}

/// Navigate, let script-rendered content settle, then read the DOM.
pub(crate) async fn render<T: Tab>(tab: &T, url: &str, settle: Duration) -> Result<String> {
    tab.navigate(url).await?;
    if !settle.is_zero() {
        debug!(?settle, "Waiting for rendered content");
        sleep(settle).await;
    }
    tab.html().await
}

impl Tab for BrowserSession {
    async fn navigate(&self, url: &str) -> Result<()> {
        tokio::time::timeout(self.navigation_timeout, self.page.goto(url))
            .await
            .map_err(|_| {
                HarvestError::Browser(format!(
                    "navigation to {url} timed out after {:?}",
                    self.navigation_timeout
                ))
            })?
            .map_err(browser_err)?;
        Ok(())
    }

    async fn html(&self) -> Result<String> {
        self.page.content().await.map_err(browser_err)
    }
}

impl Fetcher for BrowserSession {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &str) -> Result<String> {
        let content = render(self, url, self.settle).await?;
        debug!(bytes = content.len(), "Rendered page");
        Ok(content)
    }
}
