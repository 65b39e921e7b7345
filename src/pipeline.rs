//! Batch orchestration.
//!
//! A run follows the same steps every time:
//! 1. **Input**: read the URL column of the input sheet for the date key
//! 2. **Output prep**: replace the output sheet for the date key and write the header
//! 3. **Harvest**: for each item, paginate the article, then the comments, then lay out rows
//! 4. **Publish**: write all data rows in one bulk update below the header
//!
//! Items are processed strictly one after another. A failure while harvesting
//! one item is logged and the item contributes no rows; it never stops the
//! batch.

use crate::config::HarvestConfig;
use crate::errors::Result;
use crate::extractors::article::ArticleExtractor;
use crate::extractors::comments::CommentExtractor;
use crate::fetchers::Fetcher;
use crate::models::{OutputRow, SourceItem};
use crate::outputs::rows::RowLayout;
use crate::outputs::sheets::{RowStore, SheetRef};
use crate::pagination::{PaginationLoop, article_page_url, comment_page_url};
use crate::utils::truncate_for_log;
use tracing::{error, info, instrument, warn};

/// First sheet row holding data; row 1 is the header.
const FIRST_DATA_ROW: usize = 2;

/// Where a run reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    pub input_spreadsheet_id: String,
    pub output_spreadsheet_id: String,
    pub input_sheet: String,
    /// 1-based URL column of the input sheet.
    pub input_column: usize,
    /// Date-derived key naming the output sheet.
    pub date_key: String,
}

/// A source item that produced no rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub index: usize,
    pub url: String,
    pub reason: String,
}

/// Rows of every item that succeeded, in input order, plus the failures.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub rows: Vec<OutputRow>,
    pub written: usize,
    pub failures: Vec<ItemFailure>,
}

/// Counts reported at the end of a run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub items: usize,
    pub written: usize,
    pub skipped: usize,
    pub rows: usize,
}

/// Runs both resources of each item and lays out the result.
pub struct Harvester<'a, A, C> {
    articles: PaginationLoop<'a, A, ArticleExtractor>,
    comments: PaginationLoop<'a, C, CommentExtractor>,
    layout: &'a RowLayout,
}

impl<'a, A, C> Harvester<'a, A, C>
where
    A: Fetcher,
    C: Fetcher,
{
    pub fn new(
        articles: PaginationLoop<'a, A, ArticleExtractor>,
        comments: PaginationLoop<'a, C, CommentExtractor>,
        layout: &'a RowLayout,
    ) -> Self {
        Self {
            articles,
            comments,
            layout,
        }
    }

    pub fn layout(&self) -> &RowLayout {
        self.layout
    }

    /// Harvest one item. Any fetch error aborts the item.
    #[instrument(level = "info", skip_all, fields(index = item.index, url = %item.url))]
    pub async fn process_item(&self, item: &SourceItem) -> Result<Vec<OutputRow>> {
        let article = self.articles.run(&item.url, article_page_url).await?;
        let title = article
            .first_page()
            .and_then(|p| p.title.as_deref())
            .unwrap_or_default();
        info!(
            pages = article.pages_fetched,
            stop = ?article.stop,
            title = %truncate_for_log(title, 60),
            "Article pages collected"
        );

        // Comments are collected even when the article yielded nothing.
        let comments = self.comments.run(&item.url, comment_page_url).await?;
        info!(
            pages = comments.pages_fetched,
            comments = comments.comment_count(),
            stop = ?comments.stop,
            "Comment pages collected"
        );

        Ok(self.layout.build(item, &article, &comments))
    }

    /// Harvest every item in order, isolating per-item failures.
    pub async fn process(&self, items: &[SourceItem]) -> BatchReport {
        let mut report = BatchReport::default();
        for item in items {
            info!(index = item.index, total = items.len(), url = %item.url, "Processing item");
            match self.process_item(item).await {
                Ok(rows) => {
                    report.rows.extend(rows);
                    report.written += 1;
                }
                Err(e) => {
                    error!(index = item.index, url = %item.url, error = %e, "Item failed; skipping");
                    report.failures.push(ItemFailure {
                        index: item.index,
                        url: item.url.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        report
    }
}

/// Everything a run needs that is built once at startup.
pub struct RunContext<S> {
    pub config: HarvestConfig,
    pub plan: RunPlan,
    pub layout: RowLayout,
    pub article_extractor: ArticleExtractor,
    pub comment_extractor: CommentExtractor,
    pub store: S,
}

impl<S> RunContext<S>
where
    S: RowStore,
{
    /// Fails fatally when the input sheet for the plan does not exist.
    pub async fn source_items(&self) -> Result<Vec<SourceItem>> {
        load_source_items(&self.store, &self.plan).await
    }

    /// Harvest `items`, fetching article pages through `articles` and comment
    /// pages through `comments`, and publish the rows.
    pub async fn harvest<A, C>(
        &self,
        articles: &A,
        comments: &C,
        items: &[SourceItem],
    ) -> Result<RunSummary>
    where
        A: Fetcher,
        C: Fetcher,
    {
        let harvester = Harvester::new(
            PaginationLoop::new(articles, &self.article_extractor, self.config.page_cap),
            PaginationLoop::new(comments, &self.comment_extractor, self.config.page_cap),
            &self.layout,
        );
        harvest_into(
            &self.store,
            &self.plan,
            &harvester,
            self.config.sheet_rows,
            items,
        )
        .await
    }
}

/// Read the URL column of the input sheet, skipping the header row.
#[instrument(level = "info", skip_all, fields(sheet = %plan.input_sheet))]
pub async fn load_source_items<S: RowStore>(store: &S, plan: &RunPlan) -> Result<Vec<SourceItem>> {
    let cells = store
        .read_column(
            &plan.input_spreadsheet_id,
            &plan.input_sheet,
            plan.input_column,
        )
        .await?;
    let items = SourceItem::from_cells(cells.into_iter().skip(1));
    info!(count = items.len(), "Found source URLs");
    Ok(items)
}

/// Replace the output sheet for the date key and write its header.
#[instrument(level = "info", skip_all, fields(sheet = %plan.date_key))]
pub async fn prepare_output<S: RowStore>(
    store: &S,
    plan: &RunPlan,
    layout: &RowLayout,
    sheet_rows: usize,
) -> Result<SheetRef> {
    let sheet = store
        .replace_sheet(
            &plan.output_spreadsheet_id,
            &plan.date_key,
            sheet_rows,
            layout.width(),
        )
        .await?;
    store
        .write_rows(&plan.output_spreadsheet_id, &sheet, 1, &[layout.header()])
        .await?;
    Ok(sheet)
}

/// Prepare the output sheet, harvest every item and write the rows in one
/// bulk update.
pub async fn harvest_into<S, A, C>(
    store: &S,
    plan: &RunPlan,
    harvester: &Harvester<'_, A, C>,
    sheet_rows: usize,
    items: &[SourceItem],
) -> Result<RunSummary>
where
    S: RowStore,
    A: Fetcher,
    C: Fetcher,
{
    let sheet = prepare_output(store, plan, harvester.layout(), sheet_rows).await?;

    let report = harvester.process(items).await;

    if report.rows.is_empty() {
        warn!("No data to write");
    } else {
        store
            .write_rows(
                &plan.output_spreadsheet_id,
                &sheet,
                FIRST_DATA_ROW,
                &report.rows,
            )
            .await?;
        info!(rows = report.rows.len(), sheet = %sheet.title, "All data written to output sheet");
    }

    for failure in &report.failures {
        warn!(
            index = failure.index,
            url = %failure.url,
            reason = %truncate_for_log(&failure.reason, 200),
            "Skipped item"
        );
    }

    Ok(RunSummary {
        items: items.len(),
        written: report.written,
        skipped: report.failures.len(),
        rows: report.rows.len(),
    })
}
