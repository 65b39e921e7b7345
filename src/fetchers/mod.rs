//! Page fetch transports.
//!
//! Both transports return the raw page markup for a URL and are
//! interchangeable behind [`Fetcher`]:
//!
//! | Transport | Module | Used for |
//! |-----------|--------|----------|
//! | Plain HTTP | [`http`] | Article body pages |
//! | Headless browser tab | [`browser`] | Script-rendered comment pages |
//!
//! The browser transport pauses between navigation and reading the page, which
//! also paces comment fetches.

pub mod browser;
pub mod http;

use crate::errors::Result;

/// Retrieves raw page content for a URL.
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<String>;
}

#[cfg(test)]
pub mod testing {
    //! Scripted fetchers for exercising pagination without a network.

    use super::Fetcher;
    use crate::errors::Result;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Answers every fetch through a closure and records the requested URLs.
    pub struct StubFetcher {
        respond: Box<dyn Fn(&str) -> Result<String>>,
        calls: RefCell<Vec<String>>,
    }

    impl StubFetcher {
        pub fn new(respond: impl Fn(&str) -> Result<String> + 'static) -> Self {
            Self {
                respond: Box::new(respond),
                calls: RefCell::new(Vec::new()),
            }
        }

        /// Fixed pages by URL; any other URL yields an empty page.
        pub fn from_pages<'a>(pages: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
            let pages: HashMap<String, String> = pages
                .into_iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect();
            Self::new(move |url| Ok(pages.get(url).cloned().unwrap_or_default()))
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl Fetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            self.calls.borrow_mut().push(url.to_string());
            (self.respond)(url)
        }
    }
}
