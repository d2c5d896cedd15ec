//! Cache configuration

use serde::Deserialize;
use serde::Serialize;

use super::MAX_CACHED_PAGES;
use crate::error::ConfigError;

/// Configuration for the server-side page cache.
///
/// # Example
///
/// ```
/// use datagrid_lib::cache::CacheConfig;
///
/// let config = CacheConfig::default()
///     .with_max_cached_pages(20)
///     .with_prefetch(false);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of pages held at once.
    ///
    /// Default: 10
    pub max_cached_pages: usize,

    /// Ask the backend for neighbouring pages alongside each fetch.
    ///
    /// Default: true
    pub prefetch: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_cached_pages: MAX_CACHED_PAGES,
            prefetch: true,
        }
    }
}

impl CacheConfig {
    /// Creates a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page capacity.
    pub fn with_max_cached_pages(mut self, pages: usize) -> Self {
        self.max_cached_pages = pages;
        self
    }

    /// Enables or disables neighbouring-page prefetch.
    pub fn with_prefetch(mut self, prefetch: bool) -> Self {
        self.prefetch = prefetch;
        self
    }

    /// The current page and the two after it must always fit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_cached_pages < 3 {
            return Err(ConfigError::invalid(format!(
                "max_cached_pages must be at least 3, got {}",
                self.max_cached_pages
            )));
        }
        Ok(())
    }
}
