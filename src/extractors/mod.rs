//! Markup extractors.
//!
//! An [`Extractor`] turns raw page markup into one [`PageUnit`]. Extraction
//! never fails: missing elements degrade to `None` or empty content, and the
//! pagination loop treats empty content as the end of the resource.
//!
//! - [`article::ArticleExtractor`]: title, timestamp and paragraph text
//! - [`comments::CommentExtractor`]: comment texts in document order

pub mod article;
pub mod comments;

use crate::errors::{HarvestError, Result};
use crate::pagination::PageUnit;
use itertools::Itertools;
use scraper::{ElementRef, Selector};

/// Pure function of page markup to structured content.
pub trait Extractor {
    type Unit: PageUnit;

    /// Extract page `page` (1-based) of a resource.
    fn extract(&self, raw: &str, page: usize) -> Self::Unit;
}

/// Compile a configured selector, naming the setting on failure.
pub(crate) fn compile(name: &str, css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| HarvestError::Config(format!("invalid {name} selector '{css}': {e}")))
}

/// Text of an element and its descendants, trimmed at both ends, with every
/// inner whitespace run (including line breaks from markup) reduced to one
/// space. Words split across inline tags keep their separating spaces.
pub(crate) fn stripped_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().split_whitespace().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    #[test]
    fn test_stripped_text_keeps_word_boundaries() {
        let doc = Html::parse_fragment("<p>  Hello <b> big </b>\n world </p>");
        let p = compile("paragraph", "p").unwrap();
        let el = doc.select(&p).next().unwrap();
        assert_eq!(stripped_text(el), "Hello big world");
    }

    #[test]
    fn test_stripped_text_does_not_invent_spaces_inside_words() {
        let doc = Html::parse_fragment("<p>un<i>believ</i>able, <a href=\"#\">really</a>.</p>");
        let p = compile("paragraph", "p").unwrap();
        let el = doc.select(&p).next().unwrap();
        assert_eq!(stripped_text(el), "unbelievable, really.");
    }

    #[test]
    fn test_bad_selector_is_config_error() {
        let err = compile("comment", "p[[").unwrap_err();
        assert!(matches!(err, HarvestError::Config(ref m) if m.contains("comment")));
    }
}
