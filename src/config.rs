//! # Configuration Module
//!
//! `ArchivistConfig` gathers the settings of every pipeline stage. Each part has
//! a usable `Default`; `from_env` overrides the commonly tuned values from
//! environment variables.
//!
//! | Variable | Setting |
//! |---|---|
//! | `ARCHIVIST_DATA_DIR` | root directory of the collections |
//! | `ARCHIVIST_TOP_K` | passages retrieved per query |
//! | `ARCHIVIST_CRAWL_TIMEOUT_SECS` | hard bound on a crawl |
//! | `ARCHIVIST_CRAWL_SETTLE_MS` | rendering settle delay |

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::crawler::CrawlerConfig;
use crate::error::{Error, Result};
use crate::index::IndexConfig;
use crate::ingest::NormalizerConfig;

/// Complete configuration of the pipeline
#[derive(Debug, Clone)]
pub struct ArchivistConfig {
    /// Directory holding one sub-directory per collection
    pub data_dir: PathBuf,

    pub crawler: CrawlerConfig,

    pub normalizer: NormalizerConfig,

    pub index: IndexConfig,
}

impl Default for ArchivistConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            crawler: CrawlerConfig::default(),
            normalizer: NormalizerConfig::default(),
            index: IndexConfig::default(),
        }
    }
}

impl ArchivistConfig {
    /// Create a new builder
    pub fn builder() -> ArchivistConfigBuilder {
        ArchivistConfigBuilder::new()
    }

    /// Defaults overridden by `ARCHIVIST_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(dir) = lookup("ARCHIVIST_DATA_DIR").filter(|v| !v.trim().is_empty()) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(top_k) = parse::<usize>(&lookup, "ARCHIVIST_TOP_K")? {
            config.index.top_k = top_k;
        }
        if let Some(secs) = parse::<u64>(&lookup, "ARCHIVIST_CRAWL_TIMEOUT_SECS")? {
            config.crawler.timeout = Duration::from_secs(secs);
        }
        if let Some(millis) = parse::<u64>(&lookup, "ARCHIVIST_CRAWL_SETTLE_MS")? {
            config.crawler.settle_delay = Duration::from_millis(millis);
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every query come back empty
    pub fn validate(&self) -> Result<()> {
        if self.index.top_k == 0 {
            return Err(Error::Validation("top_k must be at least 1".to_string()));
        }
        Ok(())
    }
}

fn parse<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Validation(format!("{} must be a number, got '{}'", key, value))),
    }
}

/// Builder for ArchivistConfig
#[derive(Debug, Default)]
pub struct ArchivistConfigBuilder {
    config: ArchivistConfig,
}

impl ArchivistConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the data directory
    pub fn data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = data_dir.into();
        self
    }

    /// Set the crawler configuration
    pub fn crawler(mut self, crawler: CrawlerConfig) -> Self {
        self.config.crawler = crawler;
        self
    }

    /// Set the normalizer configuration
    pub fn normalizer(mut self, normalizer: NormalizerConfig) -> Self {
        self.config.normalizer = normalizer;
        self
    }

    /// Set the index configuration
    pub fn index(mut self, index: IndexConfig) -> Self {
        self.config.index = index;
        self
    }

    /// Set the number of passages retrieved per query
    pub fn top_k(mut self, top_k: usize) -> Self {
        self.config.index.top_k = top_k;
        self
    }

    pub fn build(self) -> ArchivistConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ArchivistConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
        assert_eq!(config.index.top_k, 2);
        assert_eq!(config.crawler.settle_delay, Duration::from_secs(2));
        assert_eq!(config.normalizer.concurrency, 4);
    }

    #[test]
    fn test_env_overrides() {
        let config = ArchivistConfig::from_lookup(lookup(&[
            ("ARCHIVIST_DATA_DIR", "/var/lib/archivist"),
            ("ARCHIVIST_TOP_K", "5"),
            ("ARCHIVIST_CRAWL_TIMEOUT_SECS", "10"),
            ("ARCHIVIST_CRAWL_SETTLE_MS", "500"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/archivist"));
        assert_eq!(config.index.top_k, 5);
        assert_eq!(config.crawler.timeout, Duration::from_secs(10));
        assert_eq!(config.crawler.settle_delay, Duration::from_millis(500));
    }

    #[test]
    fn test_invalid_number() {
        let err = ArchivistConfig::from_lookup(lookup(&[("ARCHIVIST_TOP_K", "many")])).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_zero_top_k_is_rejected() {
        let err = ArchivistConfig::from_lookup(lookup(&[("ARCHIVIST_TOP_K", "0")])).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let config = ArchivistConfig::builder().top_k(0).build();
        assert!(matches!(config.validate(), Err(Error::Validation(_))));
        assert!(ArchivistConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ArchivistConfig::builder()
            .data_dir("/tmp/collections")
            .top_k(7)
            .build();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/collections"));
        assert_eq!(config.index.top_k, 7);
    }
}
