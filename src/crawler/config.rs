//! # Crawler Configuration Module
//!
//! Configuration for single-page link discovery. The crawler loads one seed page,
//! lets client-side rendering settle for a fixed interval, and bounds the whole
//! session with a hard timeout.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: The configuration struct with crawler parameters
//! - `CrawlerConfigBuilder`: Builder pattern implementation for easier configuration

use std::time::Duration;

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Time given to client-side rendering after navigation.
    ///
    /// This is a heuristic, not a readiness signal: content rendered after the
    /// interval is missed.
    pub settle_delay: Duration,

    /// Hard upper bound on the whole browser session
    pub timeout: Duration,

    /// Whether to respect robots.txt
    pub respect_robots_txt: bool,

    /// User agent to use for requests
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(2),
            timeout: Duration::from_secs(30),
            respect_robots_txt: false,
            user_agent: format!("archivist-crawler/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the rendering settle delay
    pub fn settle_delay(mut self, settle_delay: Duration) -> Self {
        self.config.settle_delay = settle_delay;
        self
    }

    /// Set the session timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set whether to respect robots.txt
    pub fn respect_robots_txt(mut self, respect_robots_txt: bool) -> Self {
        self.config.respect_robots_txt = respect_robots_txt;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }
}
