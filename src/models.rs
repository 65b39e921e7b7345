//! Data models for source items, extracted page content and output rows.
//!
//! This module defines the core data structures used throughout the application:
//! - [`SourceItem`]: One input URL with its stable 1-based index
//! - [`ArticlePage`] / [`CommentBatch`]: What an extractor pulls out of one page
//! - [`AggregationResult`]: Everything collected for one paginated resource
//! - [`Cell`] / [`OutputRow`]: Fixed-width rows handed to the spreadsheet sink
//!
//! The two page types carry their own duplicate predicate through
//! [`PageUnit`], which is how one pagination loop serves both resources.

use crate::pagination::PageUnit;
use serde::Serialize;

/// One unit of work: an input URL and its position in the input list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceItem {
    /// 1-based position, stable for the whole run.
    pub index: usize,
    /// The article URL as read from the input sheet.
    pub url: String,
}

impl SourceItem {
    /// Number a list of raw URL cells, dropping blanks.
    ///
    /// Indices are assigned after filtering so they stay contiguous.
    pub fn from_cells<I, S>(cells: I) -> Vec<SourceItem>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        cells
            .into_iter()
            .filter_map(|c| {
                let url = c.as_ref().trim();
                (!url.is_empty()).then(|| url.to_string())
            })
            .enumerate()
            .map(|(i, url)| SourceItem { index: i + 1, url })
            .collect()
    }
}

/// Content of one article page.
///
/// `title` and `published_at` are only looked up on page 1; on later pages
/// they are always `None`. A missing element on page 1 is also `None` and
/// gets replaced by the "unavailable" sentinel at layout time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArticlePage {
    pub title: Option<String>,
    pub published_at: Option<String>,
    /// Paragraph texts of the content container, newline-joined.
    pub body: String,
}

impl PageUnit for ArticlePage {
    fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// A page repeats when its whole body equals any page already kept,
    /// not just the previous one.
    fn repeats(&self, collected: &[Self]) -> bool {
        collected.iter().any(|page| page.body == self.body)
    }
}

/// Comment texts found on one comment page, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommentBatch {
    pub comments: Vec<String>,
}

impl PageUnit for CommentBatch {
    fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Only the first comment of the new batch is checked against every
    /// comment collected so far. A hit means the site re-served an old page,
    /// so the whole batch is discarded.
    fn repeats(&self, collected: &[Self]) -> bool {
        match self.comments.first() {
            Some(first) => collected
                .iter()
                .any(|batch| batch.comments.iter().any(|c| c == first)),
            None => false,
        }
    }
}

/// Why pagination of a resource ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Empty,
    Duplicate,
    CapReached,
}

/// Deduplicated pages of one resource, in fetch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationResult<U> {
    pub items: Vec<U>,
    /// Number of pages kept, not the number of fetch attempts.
    pub pages_fetched: usize,
    pub stop: StopReason,
}

impl AggregationResult<ArticlePage> {
    /// Page 1, when at least one page was kept.
    pub fn first_page(&self) -> Option<&ArticlePage> {
        self.items.first()
    }

    pub fn bodies(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|page| page.body.as_str())
    }
}

impl AggregationResult<CommentBatch> {
    /// All comments across kept batches, flattened in page order.
    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.items
            .iter()
            .flat_map(|batch| batch.comments.iter().map(String::as_str))
    }

    pub fn comment_count(&self) -> usize {
        self.items.iter().map(|batch| batch.comments.len()).sum()
    }
}

/// A single spreadsheet cell value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Text(String),
    Number(u64),
}

impl Cell {
    pub fn blank() -> Self {
        Cell::Text(String::new())
    }

    #[cfg(test)]
    pub fn is_blank(&self) -> bool {
        matches!(self, Cell::Text(s) if s.is_empty())
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

impl From<usize> for Cell {
    fn from(n: usize) -> Self {
        Cell::Number(n as u64)
    }
}

/// One fixed-width output record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OutputRow(pub Vec<Cell>);

impl OutputRow {
    /// A row of `width` empty cells.
    pub fn blank(width: usize) -> Self {
        OutputRow(vec![Cell::blank(); width])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}
