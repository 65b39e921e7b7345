//! The paginated-content aggregation loop.
//!
//! One [`PaginationLoop`] drives a [`Fetcher`] and an [`Extractor`] across the
//! sequential pages of a single resource (an article's body pages or its
//! comment listing) and decides when to stop:
//!
//! | Condition | Outcome |
//! |-----------|---------|
//! | page number above the cap | [`Step::StopCapReached`], nothing fetched |
//! | extractor found nothing | [`Step::StopEmpty`] |
//! | content repeats what was kept | [`Step::StopDuplicate`] |
//! | otherwise | [`Step::Continue`], the unit is kept |
//!
//! What counts as a repeat is decided by the unit type through [`PageUnit`].
//! Fetch errors are not stop conditions: they propagate to the caller and fail
//! the whole source item.

use crate::errors::Result;
use crate::extractors::Extractor;
use crate::fetchers::Fetcher;
use crate::models::{AggregationResult, StopReason};
use tracing::{debug, instrument};
use url::Url;

/// Default number of pages fetched per resource.
pub const DEFAULT_PAGE_CAP: usize = 10;

/// Emptiness and duplicate predicates of one page's extracted content.
pub trait PageUnit: Sized {
    /// Nothing worth keeping was found on the page.
    fn is_empty(&self) -> bool;

    /// The page re-serves content that was already kept.
    fn repeats(&self, collected: &[Self]) -> bool;
}

/// Outcome of one fetch-extract cycle.
#[derive(Debug, PartialEq, Eq)]
pub enum Step<U> {
    Continue(U),
    StopEmpty,
    StopDuplicate,
    StopCapReached,
}

/// Drives pagination of one resource type.
#[derive(Debug)]
pub struct PaginationLoop<'a, F, E> {
    fetcher: &'a F,
    extractor: &'a E,
    cap: usize,
}

impl<'a, F, E> PaginationLoop<'a, F, E>
where
    F: Fetcher,
    E: Extractor,
{
    pub fn new(fetcher: &'a F, extractor: &'a E, cap: usize) -> Self {
        Self {
            fetcher,
            extractor,
            cap,
        }
    }

    /// Fetch and extract page `page` of `resource`, and classify the result
    /// against the units kept so far.
    pub async fn step<P>(
        &self,
        resource: &str,
        page: usize,
        page_url: &P,
        collected: &[E::Unit],
    ) -> Result<Step<E::Unit>>
    where
        P: Fn(&str, usize) -> Result<String>,
    {
        if page > self.cap {
            return Ok(Step::StopCapReached);
        }

        let url = page_url(resource, page)?;
        let raw = self.fetcher.fetch(&url).await?;
        let unit = self.extractor.extract(&raw, page);

        if unit.is_empty() {
            Ok(Step::StopEmpty)
        } else if unit.repeats(collected) {
            Ok(Step::StopDuplicate)
        } else {
            Ok(Step::Continue(unit))
        }
    }

    /// Collect every page of `resource` until a stop condition is met.
    #[instrument(level = "info", skip_all, fields(%resource, cap = self.cap))]
    pub async fn run<P>(&self, resource: &str, page_url: P) -> Result<AggregationResult<E::Unit>>
    where
        P: Fn(&str, usize) -> Result<String>,
    {
        let mut items = Vec::new();
        let mut page = 1;

        let stop = loop {
            match self.step(resource, page, &page_url, &items).await? {
                Step::Continue(unit) => {
                    items.push(unit);
                    page += 1;
                }
                Step::StopEmpty => break StopReason::Empty,
                Step::StopDuplicate => break StopReason::Duplicate,
                Step::StopCapReached => break StopReason::CapReached,
            }
        };

        debug!(page, kept = items.len(), ?stop, "Pagination finished");
        Ok(AggregationResult {
            pages_fetched: items.len(),
            items,
            stop,
        })
    }
}

/// Address of article body page `page`: the bare URL for page 1, then the
/// same URL with `page=n` in the query.
pub fn article_page_url(base: &str, page: usize) -> Result<String> {
    if page <= 1 {
        return Ok(base.to_string());
    }
    let mut url = Url::parse(base)?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "page")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
        pairs.append_pair("page", &page.to_string());
    }
    Ok(url.to_string())
}

/// Address of comment page `page`: the `comments` sub-resource of the
/// article, always with an explicit page number.
pub fn comment_page_url(base: &str, page: usize) -> Result<String> {
    let mut url = Url::parse(base)?;
    url.set_fragment(None);
    url.set_query(None);
    url.path_segments_mut()
        .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
        .pop_if_empty()
        .push("comments");
    url.query_pairs_mut()
        .append_pair("page", &page.to_string());
    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::HarvestError;
    use crate::fetchers::testing::StubFetcher;
    use crate::models::{ArticlePage, CommentBatch};

    /// Treats the raw page as the article body.
    struct PlainBody;

    impl Extractor for PlainBody {
        type Unit = ArticlePage;

        fn extract(&self, raw: &str, _page: usize) -> ArticlePage {
            ArticlePage {
                body: raw.to_string(),
                ..Default::default()
            }
        }
    }

    /// Treats the raw page as `|`-separated comments.
    struct PipeComments;

    impl Extractor for PipeComments {
        type Unit = CommentBatch;

        fn extract(&self, raw: &str, _page: usize) -> CommentBatch {
            CommentBatch {
                comments: raw
                    .split('|')
                    .filter(|c| !c.is_empty())
                    .map(str::to_string)
                    .collect(),
            }
        }
    }

    fn numbered(base: &str, page: usize) -> Result<String> {
        Ok(format!("{base}/{page}"))
    }

    fn bodies(result: &AggregationResult<ArticlePage>) -> Vec<&str> {
        result.bodies().collect()
    }

    #[tokio::test]
    async fn test_stops_at_first_empty_page() {
        // pages 1..=3 have content, page 4 is empty
        let fetcher = StubFetcher::new(|url| {
            let n: usize = url.rsplit('/').next().unwrap().parse().unwrap();
            Ok(if n < 4 { format!("body {n}") } else { String::new() })
        });
        let pager = PaginationLoop::new(&fetcher, &PlainBody, DEFAULT_PAGE_CAP);

        let result = pager.run("r", numbered).await.unwrap();

        assert_eq!(result.pages_fetched, 3);
        assert_eq!(result.stop, StopReason::Empty);
        assert_eq!(fetcher.calls().len(), 4);
    }

    #[tokio::test]
    async fn test_cap_bounds_endless_resource() {
        let fetcher = StubFetcher::new(|url| Ok(format!("unique {url}")));
        let pager = PaginationLoop::new(&fetcher, &PlainBody, 4);

        let result = pager.run("r", numbered).await.unwrap();

        assert_eq!(result.pages_fetched, 4);
        assert_eq!(result.stop, StopReason::CapReached);
        // No fetch is made for the page past the cap.
        assert_eq!(fetcher.calls(), vec!["r/1", "r/2", "r/3", "r/4"]);
    }

    #[tokio::test]
    async fn test_article_page_repeating_any_earlier_page_stops() {
        let fetcher = StubFetcher::from_pages([
            ("r/1", "Hello"),
            ("r/2", "Other"),
            ("r/3", "Hello"),
            ("r/4", "Never reached"),
        ]);
        let pager = PaginationLoop::new(&fetcher, &PlainBody, DEFAULT_PAGE_CAP);

        let result = pager.run("r", numbered).await.unwrap();

        assert_eq!(bodies(&result), vec!["Hello", "Other"]);
        assert_eq!(result.pages_fetched, 2);
        assert_eq!(result.stop, StopReason::Duplicate);
    }

    #[tokio::test]
    async fn test_repeat_of_first_page_ends_before_later_content() {
        let fetcher = StubFetcher::from_pages([
            ("https://example/a/1", "Hello"),
            ("https://example/a/2", "Hello"),
            ("https://example/a/3", "World"),
        ]);
        let pager = PaginationLoop::new(&fetcher, &PlainBody, DEFAULT_PAGE_CAP);

        let result = pager.run("https://example/a", numbered).await.unwrap();

        // The repeated page ends pagination, so "World" is never fetched.
        assert_eq!(bodies(&result), vec!["Hello"]);
        assert_eq!(result.pages_fetched, 1);
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_comment_batch_with_seen_first_entry_is_discarded() {
        let fetcher = StubFetcher::from_pages([
            ("c/1", "a|b|c"),
            ("c/2", "d|e"),
            ("c/3", "b|fresh|more"),
        ]);
        let pager = PaginationLoop::new(&fetcher, &PipeComments, DEFAULT_PAGE_CAP);

        let result = pager.run("c", numbered).await.unwrap();

        assert_eq!(result.pages_fetched, 2);
        assert_eq!(result.stop, StopReason::Duplicate);
        assert_eq!(
            result.comments().collect::<Vec<_>>(),
            vec!["a", "b", "c", "d", "e"]
        );
    }

    #[tokio::test]
    async fn test_fetch_error_propagates() {
        let fetcher = StubFetcher::new(|url| {
            if url.ends_with("/2") {
                Err(HarvestError::Browser("tab crashed".into()))
            } else {
                Ok("page".to_string())
            }
        });
        let pager = PaginationLoop::new(&fetcher, &PlainBody, DEFAULT_PAGE_CAP);

        let err = pager.run("r", numbered).await.unwrap_err();
        assert!(matches!(err, HarvestError::Browser(_)));
    }

    #[tokio::test]
    async fn test_step_past_cap_does_not_fetch() {
        let fetcher = StubFetcher::new(|_| Ok("x".to_string()));
        let pager = PaginationLoop::new(&fetcher, &PlainBody, 2);

        let step = pager.step("r", 3, &numbered, &[]).await.unwrap();
        assert_eq!(step, Step::StopCapReached);
        assert!(fetcher.calls().is_empty());
    }

    #[test]
    fn test_article_page_urls() {
        let base = "https://news.example.jp/articles/abc";
        assert_eq!(article_page_url(base, 1).unwrap(), base);
        assert_eq!(
            article_page_url(base, 2).unwrap(),
            "https://news.example.jp/articles/abc?page=2"
        );
        assert_eq!(
            article_page_url("https://h/a?src=top&page=9", 3).unwrap(),
            "https://h/a?src=top&page=3"
        );
    }

    #[test]
    fn test_comment_page_urls() {
        assert_eq!(
            comment_page_url("https://news.example.jp/articles/abc", 1).unwrap(),
            "https://news.example.jp/articles/abc/comments?page=1"
        );
        assert_eq!(
            comment_page_url("https://news.example.jp/articles/abc/", 4).unwrap(),
            "https://news.example.jp/articles/abc/comments?page=4"
        );
        assert!(comment_page_url("not a url", 1).is_err());
    }
}
