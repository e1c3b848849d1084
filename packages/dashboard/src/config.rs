//! Dashboard configuration.
//!
//! Settings come from an optional TOML file, then environment variables
//! override individual fields:
//!
//! | Variable | Field |
//! |---|---|
//! | `FLOOD_IMPACT_RECORDS` | `records_path` |
//! | `FLOOD_IMPACT_GEOMETRIES` | `geometries_path` |
//! | `FLOOD_IMPACT_CACHE_CAPACITY` | `cache_capacity` |

use std::path::{Path, PathBuf};

use flood_impact_analytics::DEFAULT_CACHE_CAPACITY;
use flood_impact_dataset::DatasetPaths;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default location of the records artifact.
pub const DEFAULT_RECORDS_PATH: &str = "data/preprocessed/records.csv";

/// Default location of the geometries artifact.
pub const DEFAULT_GEOMETRIES_PATH: &str = "data/preprocessed/geometries.geojson";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config {}: {source}", .path.display())]
    Io {
        /// Path of the config file.
        path: PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for [`DashboardConfig`].
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment override could not be parsed.
    #[error("Invalid value '{value}' for {variable}")]
    InvalidEnv {
        /// Environment variable name.
        variable: &'static str,
        /// Rejected value.
        value: String,
    },

    /// The cache must hold at least one result.
    #[error("cache_capacity must be at least 1")]
    ZeroCacheCapacity,
}

/// Where the dataset lives and how much to cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Records CSV written by the preprocessing tool.
    pub records_path: PathBuf,
    /// Boundaries `GeoJSON` written by the preprocessing tool.
    pub geometries_path: PathBuf,
    /// Maximum number of cached aggregation results.
    pub cache_capacity: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            records_path: PathBuf::from(DEFAULT_RECORDS_PATH),
            geometries_path: PathBuf::from(DEFAULT_GEOMETRIES_PATH),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl DashboardConfig {
    /// Defaults with environment overrides applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an override is malformed or the resulting
    /// cache capacity is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|name| std::env::var(name).ok())
    }

    /// Reads a TOML file and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is unreadable or invalid, an
    /// override is malformed, or the cache capacity is zero.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        log::info!("Loading config from {}", path.display());
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)?.with_overrides(|name| std::env::var(name).ok())
    }

    /// Parses TOML. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is invalid or the cache capacity
    /// is zero.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides looked up by `lookup` (normally the process
    /// environment).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the capacity override is not a number or
    /// the resulting capacity is zero.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = lookup("FLOOD_IMPACT_RECORDS") {
            self.records_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("FLOOD_IMPACT_GEOMETRIES") {
            self.geometries_path = PathBuf::from(path);
        }
        if let Some(capacity) = lookup("FLOOD_IMPACT_CACHE_CAPACITY") {
            self.cache_capacity =
                capacity
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnv {
                        variable: "FLOOD_IMPACT_CACHE_CAPACITY",
                        value: capacity.clone(),
                    })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Checks field bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroCacheCapacity`] if `cache_capacity` is 0.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::ZeroCacheCapacity);
        }
        Ok(())
    }

    /// The dataset artifact locations.
    #[must_use]
    pub fn dataset_paths(&self) -> DatasetPaths {
        DatasetPaths {
            records: self.records_path.clone(),
            geometries: self.geometries_path.clone(),
        }
    }
}
