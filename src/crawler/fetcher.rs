//! Page fetching through a spider browser session

use std::future::Future;

use spider::website::Website;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::crawler::CrawlerConfig;
use crate::crawler::error::CrawlError;

/// Loads a page and returns its HTML after client-side rendering
pub trait PageFetcher: Send + Sync {
    /// Navigate to `url` and return the rendered HTML
    fn fetch_rendered(&self, url: &Url) -> impl Future<Output = Result<String, CrawlError>> + Send;
}

/// Fetcher backed by a single-page spider crawl
///
/// With the `chrome` feature the page is rendered in headless Chrome and given
/// `settle_delay` to finish client-side rendering; without it the raw HTTP
/// response is used.
#[derive(Debug, Clone, Default)]
pub struct SpiderFetcher {
    config: CrawlerConfig,
}

impl SpiderFetcher {
    /// Create a fetcher with the given configuration
    pub fn new(config: CrawlerConfig) -> Self {
        Self { config }
    }

    async fn render(&self, url: &str) -> Result<String, CrawlError> {
        let mut session = BrowserSession::launch(url, &self.config);
        let first_page = session.first_page()?;

        session.navigate().await;
        drop(session);

        let html = first_page
            .await
            .map_err(|e| CrawlError::Other(format!("Task join error: {}", e)))?
            .ok_or_else(|| CrawlError::Navigation(format!("No page received from {}", url)))?;

        if html.trim().is_empty() {
            return Err(CrawlError::Navigation(format!(
                "Empty document received from {}",
                url
            )));
        }
        Ok(html)
    }
}

impl PageFetcher for SpiderFetcher {
    #[instrument(skip(self), fields(url = %url))]
    async fn fetch_rendered(&self, url: &Url) -> Result<String, CrawlError> {
        let bound = self.config.timeout;
        match tokio::time::timeout(bound, self.render(url.as_str())).await {
            Ok(result) => result,
            Err(_) => {
                warn!("Navigation to {} exceeded {:?}", url, bound);
                Err(CrawlError::Timeout(bound))
            }
        }
    }
}

/// A spider session limited to one page
///
/// The session is released when the guard drops, on success, on navigation
/// failure and when the surrounding timeout cancels the future.
struct BrowserSession {
    website: Website,
}

impl BrowserSession {
    fn launch(url: &str, config: &CrawlerConfig) -> Self {
        let mut website = Website::new(url);
        website
            .configuration
            .with_respect_robots_txt(config.respect_robots_txt)
            .with_user_agent(Some(config.user_agent.as_str()))
            .with_depth(0)
            .with_limit(1);

        #[cfg(feature = "chrome")]
        website
            .configuration
            .with_wait_for_delay(Some(spider::features::chrome_common::WaitForDelay::new(
                Some(config.settle_delay),
            )));

        debug!("Launched session for {}", url);
        Self { website }
    }

    fn first_page(&mut self) -> Result<JoinHandle<Option<String>>, CrawlError> {
        let mut rx = self
            .website
            .subscribe(16)
            .ok_or_else(|| CrawlError::Other("Failed to subscribe to website".to_string()))?;

        Ok(tokio::spawn(async move {
            rx.recv().await.ok().map(|page| page.get_html())
        }))
    }

    async fn navigate(&mut self) {
        self.website.crawl().await;
        info!("Navigation finished");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.website.unsubscribe();
        debug!("Session closed");
    }
}
