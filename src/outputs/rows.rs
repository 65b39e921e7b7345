//! Fixed-width row layout.
//!
//! Each source item becomes one primary row followed by one continuation row
//! per extra article body page:
//!
//! ```text
//! col   0      1      2     3          4       5..=13   14       15..width-1
//!       index  title  url   published  body 1  (blank)  count    comment, comment, ...
//!                                      body 2                          <- continuation
//!                                      body 3                          <- continuation
//! ```
//!
//! Comments that do not fit in the remaining columns are dropped; the count
//! column still reports everything that was collected.

use crate::errors::{HarvestError, Result};
use crate::models::{AggregationResult, ArticlePage, Cell, CommentBatch, OutputRow, SourceItem};

pub const COL_INDEX: usize = 0;
pub const COL_TITLE: usize = 1;
pub const COL_URL: usize = 2;
pub const COL_PUBLISHED: usize = 3;
pub const COL_BODY: usize = 4;
pub const COL_COMMENT_COUNT: usize = 14;
pub const COL_FIRST_COMMENT: usize = 15;

/// Narrowest row that still has room for one comment.
pub const MIN_ROW_WIDTH: usize = COL_FIRST_COMMENT + 1;

/// Builds output rows of a constant width.
#[derive(Debug, Clone)]
pub struct RowLayout {
    width: usize,
    max_comments: Option<usize>,
    unavailable: String,
}

impl RowLayout {
    pub fn new(width: usize, max_comments: Option<usize>, unavailable: &str) -> Result<Self> {
        if width < MIN_ROW_WIDTH {
            return Err(HarvestError::Config(format!(
                "row width {width} leaves no room for comments (minimum {MIN_ROW_WIDTH})"
            )));
        }
        Ok(Self {
            width,
            max_comments,
            unavailable: unavailable.to_string(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of comment columns actually written per item.
    pub fn comment_slots(&self) -> usize {
        let room = self.width - COL_FIRST_COMMENT;
        match self.max_comments {
            Some(max) => room.min(max),
            None => room,
        }
    }

    /// The single header row written above the data.
    pub fn header(&self) -> OutputRow {
        let mut row = OutputRow::blank(self.width);
        row.0[COL_INDEX] = Cell::from("No.");
        row.0[COL_TITLE] = Cell::from("タイトル");
        row.0[COL_URL] = Cell::from("URL");
        row.0[COL_PUBLISHED] = Cell::from("発行日時");
        row.0[COL_BODY] = Cell::from("本文");
        row.0[COL_COMMENT_COUNT] = Cell::from("コメント数");
        for cell in &mut row.0[COL_FIRST_COMMENT..] {
            *cell = Cell::from("コメント");
        }
        row
    }

    /// Lay out one item: the primary row, then continuation rows for body
    /// pages 2.. in page order.
    pub fn build(
        &self,
        item: &SourceItem,
        article: &AggregationResult<ArticlePage>,
        comments: &AggregationResult<CommentBatch>,
    ) -> Vec<OutputRow> {
        let first = article.first_page();
        let sentinel = || Cell::from(self.unavailable.as_str());
        let text_or_sentinel = |value: Option<&String>| match value {
            Some(v) => Cell::from(v.as_str()),
            None => sentinel(),
        };

        let mut primary = OutputRow::blank(self.width);
        primary.0[COL_INDEX] = Cell::from(item.index);
        primary.0[COL_TITLE] = text_or_sentinel(first.and_then(|p| p.title.as_ref()));
        primary.0[COL_URL] = Cell::from(item.url.as_str());
        primary.0[COL_PUBLISHED] = text_or_sentinel(first.and_then(|p| p.published_at.as_ref()));
        primary.0[COL_BODY] = text_or_sentinel(first.map(|p| &p.body));
        primary.0[COL_COMMENT_COUNT] = Cell::from(comments.comment_count());
        for (cell, comment) in primary.0[COL_FIRST_COMMENT..]
            .iter_mut()
            .zip(comments.comments().take(self.comment_slots()))
        {
            *cell = Cell::from(comment);
        }

        let mut rows = vec![primary];
        rows.extend(article.bodies().skip(1).map(|body| {
            let mut row = OutputRow::blank(self.width);
            row.0[COL_BODY] = Cell::from(body);
            row
        }));
        rows
    }
}
