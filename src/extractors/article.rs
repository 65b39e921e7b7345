//! Article body page extraction.

use super::{Extractor, compile, stripped_text};
use crate::config::Selectors;
use crate::errors::Result;
use crate::models::ArticlePage;
use itertools::Itertools;
use scraper::{Html, Selector};

/// Pulls the title and timestamp (page 1 only) and the paragraph text of the
/// content container out of an article page.
#[derive(Debug, Clone)]
pub struct ArticleExtractor {
    title: Selector,
    title_suffix: String,
    published: Selector,
    container: Selector,
    paragraph: Selector,
}

impl ArticleExtractor {
    pub fn new(selectors: &Selectors) -> Result<Self> {
        Ok(Self {
            title: compile("title", &selectors.title)?,
            title_suffix: selectors.title_suffix.clone(),
            published: compile("published", &selectors.published)?,
            container: compile("article", &selectors.article)?,
            paragraph: compile("paragraph", &selectors.paragraph)?,
        })
    }

    fn title(&self, doc: &Html) -> Option<String> {
        let text = stripped_text(doc.select(&self.title).next()?);
        let text = if self.title_suffix.is_empty() {
            text
        } else {
            text.replace(&self.title_suffix, "")
        };
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }

    fn published(&self, doc: &Html) -> Option<String> {
        let text = stripped_text(doc.select(&self.published).next()?);
        (!text.is_empty()).then_some(text)
    }

    fn body(&self, doc: &Html) -> String {
        match doc.select(&self.container).next() {
            Some(container) => container
                .select(&self.paragraph)
                .map(stripped_text)
                .filter(|p| !p.is_empty())
                .join("\n"),
            None => String::new(),
        }
    }
}

impl Extractor for ArticleExtractor {
    type Unit = ArticlePage;

    fn extract(&self, raw: &str, page: usize) -> ArticlePage {
        let doc = Html::parse_document(raw);
        let (title, published_at) = if page == 1 {
            (self.title(&doc), self.published(&doc))
        } else {
            (None, None)
        };
        ArticlePage {
            title,
            published_at,
            body: self.body(&doc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html>
          <head><title>Rain expected across Kanto - Yahoo!ニュース</title></head>
          <body>
            <header><p>Site navigation</p></header>
            <time datetime="2025-01-01T09:00">1/1(水) 9:00</time>
            <article>
              <h1>Rain expected</h1>
              <p>First paragraph.</p>
              <div><p> Second <a href="/x">paragraph</a>. </p></div>
              <p>   </p>
            </article>
          </body>
        </html>
    "#;

    fn extractor() -> ArticleExtractor {
        ArticleExtractor::new(&Selectors::default()).unwrap()
    }

    #[test]
    fn test_first_page_has_title_date_and_paragraphs() {
        let page = extractor().extract(PAGE, 1);
        assert_eq!(page.title.as_deref(), Some("Rain expected across Kanto"));
        assert_eq!(page.published_at.as_deref(), Some("1/1(水) 9:00"));
        assert_eq!(page.body, "First paragraph.\nSecond paragraph.");
    }

    #[test]
    fn test_later_pages_skip_title_and_date() {
        let page = extractor().extract(PAGE, 2);
        assert!(page.title.is_none());
        assert!(page.published_at.is_none());
        assert!(!page.body.is_empty());
    }

    #[test]
    fn test_missing_elements_degrade_instead_of_failing() {
        let page = extractor().extract("<html><body><p>stray</p></body></html>", 1);
        assert!(page.title.is_none());
        assert!(page.published_at.is_none());
        assert_eq!(page.body, "");
    }

    #[test]
    fn test_garbage_input_yields_empty_page() {
        let page = extractor().extract("\u{0}<<<not html", 1);
        assert!(page.body.is_empty());
    }
}
