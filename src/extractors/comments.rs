//! Comment listing extraction.

use super::{Extractor, compile, stripped_text};
use crate::config::Selectors;
use crate::errors::Result;
use crate::models::CommentBatch;
use scraper::{Html, Selector};

#[derive(Debug, Clone)]
pub struct CommentExtractor {
    comment: Selector,
}

impl CommentExtractor {
    pub fn new(selectors: &Selectors) -> Result<Self> {
        Ok(Self {
            comment: compile("comment", &selectors.comment)?,
        })
    }
}

impl Extractor for CommentExtractor {
    type Unit = CommentBatch;

    fn extract(&self, raw: &str, _page: usize) -> CommentBatch {
        let doc = Html::parse_document(raw);
        let comments = doc
            .select(&self.comment)
            .map(stripped_text)
            .filter(|c| !c.is_empty())
            .collect();
        CommentBatch { comments }
    }
}
