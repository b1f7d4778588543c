//! # Catalog Configuration Module
//!
//! Provides configuration management for the meme catalog.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `CatalogConfig`. Every setting has a default, so an empty builder yields a
//! usable in-memory configuration. `build()` validates the result and fails
//! fast on nonsensical values.
//!
//! ## Usage
//!
//! ### Explicit settings
//!
//! ```
//! use core_runtime::config::CatalogConfig;
//! use std::time::Duration;
//!
//! let config = CatalogConfig::builder()
//!     .database_url("sqlite:memes.db")
//!     .max_connections(8)
//!     .document_timeout(Duration::from_secs(2))
//!     .build()?;
//!
//! assert_eq!(config.max_connections, 8);
//! # Ok::<(), core_runtime::Error>(())
//! ```
//!
//! ### Environment overrides
//!
//! ```no_run
//! use core_runtime::config::CatalogConfig;
//!
//! // Reads MEMEBASE_DATABASE_URL, MEMEBASE_MAX_CONNECTIONS,
//! // MEMEBASE_DOCUMENT_TIMEOUT_MS and MEMEBASE_AGGREGATE_TIMEOUT_MS.
//! let config = CatalogConfig::builder().with_env()?.build()?;
//! # Ok::<(), core_runtime::Error>(())
//! ```

use crate::error::{Error, Result};
use std::str::FromStr;
use std::time::Duration;
use store_traits::TimeoutPolicy;

pub const ENV_DATABASE_URL: &str = "MEMEBASE_DATABASE_URL";
pub const ENV_MAX_CONNECTIONS: &str = "MEMEBASE_MAX_CONNECTIONS";
pub const ENV_DOCUMENT_TIMEOUT_MS: &str = "MEMEBASE_DOCUMENT_TIMEOUT_MS";
pub const ENV_AGGREGATE_TIMEOUT_MS: &str = "MEMEBASE_AGGREGATE_TIMEOUT_MS";

const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_DOCUMENT_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_AGGREGATE_TIMEOUT: Duration = Duration::from_secs(6);

/// Validated catalog configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Store connection URL (`sqlite:memes.db`, `sqlite::memory:`)
    pub database_url: String,

    /// Upper bound on pooled store connections
    pub max_connections: u32,

    /// Maximum wait for a pooled connection
    pub acquire_timeout: Duration,

    /// Budget for single-document reads and writes
    pub document_timeout: Duration,

    /// Budget for counting, listing and sampling
    pub aggregate_timeout: Duration,
}

impl CatalogConfig {
    /// Creates a new builder for constructing a `CatalogConfig`.
    pub fn builder() -> CatalogConfigBuilder {
        CatalogConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Database URL is not empty
    /// - At least one connection is allowed
    /// - No timeout is zero
    pub fn validate(&self) -> Result<()> {
        if self.database_url.trim().is_empty() {
            return Err(Error::Config("database_url cannot be empty".to_string()));
        }

        if self.max_connections == 0 {
            return Err(Error::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }

        for (name, value) in [
            ("acquire_timeout", self.acquire_timeout),
            ("document_timeout", self.document_timeout),
            ("aggregate_timeout", self.aggregate_timeout),
        ] {
            if value.is_zero() {
                return Err(Error::Config(format!("{} must be greater than 0", name)));
            }
        }

        Ok(())
    }

    /// Per-call store budgets derived from this configuration
    pub fn timeout_policy(&self) -> TimeoutPolicy {
        TimeoutPolicy::new(self.document_timeout, self.aggregate_timeout)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
            document_timeout: DEFAULT_DOCUMENT_TIMEOUT,
            aggregate_timeout: DEFAULT_AGGREGATE_TIMEOUT,
        }
    }
}

/// Builder for `CatalogConfig`
#[derive(Debug, Clone, Default)]
pub struct CatalogConfigBuilder {
    database_url: Option<String>,
    max_connections: Option<u32>,
    acquire_timeout: Option<Duration>,
    document_timeout: Option<Duration>,
    aggregate_timeout: Option<Duration>,
}

impl CatalogConfigBuilder {
    /// Sets the store connection URL.
    ///
    /// Default: `sqlite::memory:`
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Sets the maximum number of pooled connections.
    ///
    /// Default: 5
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = Some(max);
        self
    }

    /// Default: 30 seconds
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = Some(timeout);
        self
    }

    /// Sets the budget for single-document reads and writes.
    ///
    /// Default: 3 seconds
    pub fn document_timeout(mut self, timeout: Duration) -> Self {
        self.document_timeout = Some(timeout);
        self
    }

    /// Sets the budget for listing and sampling.
    ///
    /// Default: 6 seconds
    pub fn aggregate_timeout(mut self, timeout: Duration) -> Self {
        self.aggregate_timeout = Some(timeout);
        self
    }

    /// Overlay settings from the process environment.
    ///
    /// Unset variables leave the builder untouched; set but unparsable ones
    /// are an error.
    pub fn with_env(self) -> Result<Self> {
        self.with_lookup(|key| std::env::var(key).ok())
    }

    /// Overlay settings from an arbitrary key lookup.
    pub fn with_lookup<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_DATABASE_URL) {
            self.database_url = Some(url);
        }

        if let Some(raw) = lookup(ENV_MAX_CONNECTIONS) {
            self.max_connections = Some(parse_setting(ENV_MAX_CONNECTIONS, &raw)?);
        }

        if let Some(raw) = lookup(ENV_DOCUMENT_TIMEOUT_MS) {
            let ms: u64 = parse_setting(ENV_DOCUMENT_TIMEOUT_MS, &raw)?;
            self.document_timeout = Some(Duration::from_millis(ms));
        }

        if let Some(raw) = lookup(ENV_AGGREGATE_TIMEOUT_MS) {
            let ms: u64 = parse_setting(ENV_AGGREGATE_TIMEOUT_MS, &raw)?;
            self.aggregate_timeout = Some(Duration::from_millis(ms));
        }

        Ok(self)
    }

    /// Builds the `CatalogConfig`, applying defaults and validating.
    ///
    /// # Errors
    ///
    /// `Error::Config` naming the first invalid setting.
    pub fn build(self) -> Result<CatalogConfig> {
        let config = CatalogConfig {
            database_url: self
                .database_url
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            max_connections: self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS),
            acquire_timeout: self.acquire_timeout.unwrap_or(DEFAULT_ACQUIRE_TIMEOUT),
            document_timeout: self.document_timeout.unwrap_or(DEFAULT_DOCUMENT_TIMEOUT),
            aggregate_timeout: self.aggregate_timeout.unwrap_or(DEFAULT_AGGREGATE_TIMEOUT),
        };

        config.validate()?;

        Ok(config)
    }
}

fn parse_setting<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse()
        .map_err(|e| Error::Config(format!("{} has invalid value {:?}: {}", key, raw, e)))
}
