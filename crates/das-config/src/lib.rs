//! Static configuration for the DAS server.
//!
//! [`ServerConfig`] is built once at start-up and shared read-only by every
//! request. It names the data sources, their declared capabilities and
//! presentation settings, the per-source capability overrides, and the
//! logging setup.

mod capability;
mod defaults;
mod logging;
mod sources;

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use capability::{
    CapabilityDirective, CapabilityDirectiveParseError, CapabilityMatrix, CapabilityOverride,
    SourceCapabilities,
};
pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_SOURCE_VERSION, default_log_filter_string, default_log_format,
};
pub use logging::{LogFormat, LogFormatParseError, LogTarget};
pub use sources::DataSourceConfig;

/// Server-wide configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct ServerConfig {
    /// `tracing` filter expression.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Log output format.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
    /// Per-target levels applied on top of `log_filter`.
    #[serde(default)]
    pub log_targets: BTreeMap<LogTarget, String>,
    /// Stylesheet served when a source does not name its own.
    #[serde(default)]
    pub default_stylesheet: Option<String>,
    /// Capability overrides keyed by data source.
    #[serde(default)]
    pub capability_overrides: CapabilityMatrix,
    /// Data sources, in the order they are listed by the `dsn` command.
    #[serde(default)]
    pub data_sources: Vec<DataSourceConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            log_targets: BTreeMap::new(),
            default_stylesheet: None,
            capability_overrides: CapabilityMatrix::default(),
            data_sources: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Returns the configured log filter.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Returns `log_filter` extended with one directive per configured
    /// target level.
    #[must_use]
    pub fn log_directives(&self) -> String {
        std::iter::once(self.log_filter.clone())
            .chain(
                self.log_targets
                    .iter()
                    .map(|(target, level)| target.directive(level)),
            )
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Returns the configured log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Looks up a data source by identifier.
    #[must_use]
    pub fn data_source(&self, id: &str) -> Option<&DataSourceConfig> {
        self.data_sources.iter().find(|source| source.id == id)
    }

    /// Checks invariants serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for empty or duplicated source identifiers and
    /// for a zero entry-point limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for source in &self.data_sources {
            if source.id.trim().is_empty() {
                return Err(ConfigError::EmptySourceId);
            }
            if !seen.insert(source.id.as_str()) {
                return Err(ConfigError::DuplicateSourceId(source.id.clone()));
            }
            if source.max_entry_points == Some(0) {
                return Err(ConfigError::ZeroEntryPointLimit(source.id.clone()));
            }
        }
        Ok(())
    }
}

/// Errors reported by [`ServerConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A data source had a blank identifier.
    #[error("data source id must not be empty")]
    EmptySourceId,
    /// Two data sources shared an identifier.
    #[error("data source '{0}' is configured more than once")]
    DuplicateSourceId(String),
    /// A data source capped entry points at zero.
    #[error("data source '{0}' sets max_entry_points to 0")]
    ZeroEntryPointLimit(String),
}
