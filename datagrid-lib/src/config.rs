//! Grid configuration

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use crate::cache::CacheConfig;
use crate::error::ConfigError;

/// Grid behaviour settings.
///
/// # Example
///
/// ```
/// use datagrid_lib::GridConfig;
///
/// let config = GridConfig::default()
///     .with_page_size(25)
///     .with_server_side_pagination(true);
///
/// assert_eq!(config.page_size, 25);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Rows per page.
    ///
    /// Default: 10
    pub page_size: u32,

    /// Page through the backend instead of slicing rows in memory.
    ///
    /// Default: false
    pub server_side_pagination: bool,

    /// Delay before the current page is refetched after a delete, in milliseconds.
    ///
    /// Default: 300
    pub refresh_delay_ms: u64,

    /// Refuse cell and row editing.
    ///
    /// Default: false
    pub edit_disabled: bool,

    /// Page cache settings.
    pub cache: CacheConfig,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            server_side_pagination: false,
            refresh_delay_ms: 300,
            edit_disabled: false,
            cache: CacheConfig::default(),
        }
    }
}

impl GridConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Enables or disables server-side pagination.
    pub fn with_server_side_pagination(mut self, enabled: bool) -> Self {
        self.server_side_pagination = enabled;
        self
    }

    /// Sets the post-delete refresh delay.
    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Disables editing.
    pub fn with_edit_disabled(mut self, disabled: bool) -> Self {
        self.edit_disabled = disabled;
        self
    }

    /// Sets the cache config.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Post-delete refresh delay.
    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    /// Checks value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::invalid("page_size must be at least 1"));
        }
        self.cache.validate()
    }

    /// Parses and validates a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GridConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a JSON config file; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            log::info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = GridConfig::from_json(r#"{"page_size": 25, "cache": {"prefetch": false}}"#).unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.refresh_delay(), Duration::from_millis(300));
        assert!(!config.cache.prefetch);
        assert_eq!(config.cache.max_cached_pages, 10);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(GridConfig::from_json(r#"{"page_size": 0}"#).is_err());
        assert!(GridConfig::from_json(r#"{"cache": {"max_cached_pages": 2}}"#).is_err());
        assert!(matches!(
            GridConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = GridConfig::load("/nonexistent/datagrid/grid.json").unwrap();
        assert_eq!(config, GridConfig::default());
    }
}
