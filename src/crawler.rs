//! # Link Discovery Crawler
//!
//! This module discovers candidate URLs from a seed page. It is a single-hop
//! discovery: the seed page is loaded once, rendered, and the anchors it contains
//! are turned into absolute URLs. Nothing is followed recursively.
//!
//! ## Key Components
//!
//! - `Crawler`: Orchestrates a `PageFetcher` and the link extractor for one seed URL
//! - `PageFetcher`: Loads a page and returns the rendered HTML
//! - `SpiderFetcher`: The spider-backed fetcher, optionally rendering with Chrome
//! - `extract_links`: Turns rendered HTML into the ordered list of link targets
//!
//! ## Known Limitations
//!
//! Rendering completion is detected with a fixed settle delay, not a readiness
//! signal. Links are not deduplicated; a page that repeats an anchor yields the
//! target more than once.

mod config;
mod error;
mod fetcher;
mod links;

pub use config::{CrawlerConfig, CrawlerConfigBuilder};
pub use error::CrawlError;
pub use fetcher::{PageFetcher, SpiderFetcher};
pub use links::{base_origin, extract_links};

use tracing::{info, instrument};
use url::Url;

/// Ordered absolute URLs discovered on a page, duplicates included
pub type CrawlResult = Vec<String>;

/// Single-page link discovery
#[derive(Debug, Clone)]
pub struct Crawler<F: PageFetcher> {
    fetcher: F,
}

impl Crawler<SpiderFetcher> {
    /// Create a crawler backed by spider with the given configuration
    pub fn with_config(config: CrawlerConfig) -> Self {
        Self::new(SpiderFetcher::new(config))
    }
}

impl<F: PageFetcher> Crawler<F> {
    /// Create a crawler around the given fetcher
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// Load `seed_url` and return the links found on it
    #[instrument(skip(self))]
    pub async fn crawl(&self, seed_url: &str) -> Result<CrawlResult, CrawlError> {
        let seed_url = seed_url.trim();
        if seed_url.is_empty() {
            return Err(CrawlError::EmptySeed);
        }

        let seed = Url::parse(seed_url)?;
        let origin =
            base_origin(&seed).ok_or_else(|| CrawlError::UnsupportedSeed(seed_url.to_string()))?;

        info!("Starting crawl for {}", seed);
        let html = self.fetcher.fetch_rendered(&seed).await?;
        let links = extract_links(&html, &origin);
        info!("Discovered {} links on {}", links.len(), seed);

        Ok(links)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    struct StaticFetcher {
        html: String,
    }

    impl PageFetcher for StaticFetcher {
        async fn fetch_rendered(&self, _url: &Url) -> Result<String, CrawlError> {
            Ok(self.html.clone())
        }
    }

    struct FailingFetcher;

    impl PageFetcher for FailingFetcher {
        async fn fetch_rendered(&self, url: &Url) -> Result<String, CrawlError> {
            Err(CrawlError::Navigation(format!("unreachable: {}", url)))
        }
    }

    struct SlowFetcher;

    impl PageFetcher for SlowFetcher {
        async fn fetch_rendered(&self, _url: &Url) -> Result<String, CrawlError> {
            Err(CrawlError::Timeout(Duration::from_millis(10)))
        }
    }

    #[tokio::test]
    async fn test_crawl_scenario() {
        let crawler = Crawler::new(StaticFetcher {
            html: r##"<html><body>
                <a href="#top">Top</a>
                <a href="/about">About</a>
                <a href="http://example.com/contact">Contact</a>
                <a href="mailto:a@b.com">Mail</a>
            </body></html>"##
                .to_string(),
        });

        let links = crawler.crawl("http://example.com").await.unwrap();
        assert_eq!(
            links,
            vec![
                "http://example.com/about".to_string(),
                "http://example.com/contact".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_origin_drops_seed_path() {
        let crawler = Crawler::new(StaticFetcher {
            html: r#"<a href="/pricing">Pricing</a>"#.to_string(),
        });

        let links = crawler.crawl("https://example.com/blog/post?id=3").await.unwrap();
        assert_eq!(links, vec!["https://example.com/pricing".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_seed_is_rejected() {
        let crawler = Crawler::new(FailingFetcher);
        assert!(matches!(crawler.crawl("  ").await, Err(CrawlError::EmptySeed)));
    }

    #[tokio::test]
    async fn test_invalid_seed_is_rejected() {
        let crawler = Crawler::new(FailingFetcher);
        assert!(matches!(
            crawler.crawl("not a url").await,
            Err(CrawlError::UrlParse(_))
        ));
        assert!(matches!(
            crawler.crawl("mailto:a@b.com").await,
            Err(CrawlError::UnsupportedSeed(_))
        ));
    }

    #[tokio::test]
    async fn test_navigation_failure_surfaces() {
        let crawler = Crawler::new(FailingFetcher);
        let err = crawler.crawl("https://example.com").await.unwrap_err();
        assert!(matches!(err, CrawlError::Navigation(_)));

        let crate_err: crate::Error = err.into();
        assert!(matches!(crate_err, crate::Error::Crawl(_)));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_crawl_timeout() {
        let crawler = Crawler::new(SlowFetcher);
        let err = crawler.crawl("https://example.com").await.unwrap_err();
        let crate_err: crate::Error = err.into();
        assert!(matches!(crate_err, crate::Error::CrawlTimeout(_)));
    }
}
