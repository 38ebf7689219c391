//! Read-only registry of the data sources a server answers for.
//!
//! The [`SourceRegistry`] is assembled once from the [`ServerConfig`] and the
//! backend instances registered against it, then shared across requests.
//! Registering a backend for a source the configuration does not name, or
//! registering the same source twice, is rejected.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use das_config::{ConfigError, DataSourceConfig, ServerConfig};
use thiserror::Error;
use tracing::{debug, warn};

use crate::capability::{CAPABILITY_TARGET, CapabilitySet, resolve_capabilities};
use crate::source::AnnotationSource;

/// Errors raised while assembling a [`SourceRegistry`].
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The configuration does not describe the source.
    #[error("data source '{0}' is not configured")]
    Unconfigured(String),
    /// A backend was registered twice for the same source.
    #[error("data source '{0}' is already registered")]
    Duplicate(String),
    /// The configuration itself is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A configured data source with its backend and resolved capabilities.
pub struct RegisteredSource {
    config: DataSourceConfig,
    backend: Arc<dyn AnnotationSource>,
    capabilities: CapabilitySet,
}

impl RegisteredSource {
    /// Source identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// Static configuration of the source.
    #[must_use]
    pub const fn config(&self) -> &DataSourceConfig {
        &self.config
    }

    /// Backend answering for the source.
    #[must_use]
    pub fn backend(&self) -> &dyn AnnotationSource {
        self.backend.as_ref()
    }

    /// Capabilities after declarations and overrides were resolved.
    #[must_use]
    pub const fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }
}

impl fmt::Debug for RegisteredSource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RegisteredSource")
            .field("config", &self.config)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// Data sources keyed by identifier, listed in configuration order.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: Vec<RegisteredSource>,
    index: HashMap<String, usize>,
}

impl SourceRegistry {
    /// Starts assembling a registry for `config`.
    #[must_use]
    pub fn builder(config: &ServerConfig) -> SourceRegistryBuilder<'_> {
        SourceRegistryBuilder {
            config,
            backends: HashMap::new(),
        }
    }

    /// Looks a source up by identifier.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&RegisteredSource> {
        self.index.get(id).and_then(|position| self.sources.get(*position))
    }

    /// Iterates over the sources in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredSource> {
        self.sources.iter()
    }

    /// Returns the number of registered sources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Returns `true` when no sources are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Builder returned by [`SourceRegistry::builder`].
pub struct SourceRegistryBuilder<'a> {
    config: &'a ServerConfig,
    backends: HashMap<String, Arc<dyn AnnotationSource>>,
}

impl SourceRegistryBuilder<'_> {
    /// Attaches the backend for a configured source.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Unconfigured`] for an identifier the
    /// configuration does not list and [`RegistryError::Duplicate`] when the
    /// source already has a backend.
    pub fn register(
        mut self,
        id: &str,
        backend: Arc<dyn AnnotationSource>,
    ) -> Result<Self, RegistryError> {
        if self.config.data_source(id).is_none() {
            return Err(RegistryError::Unconfigured(id.to_owned()));
        }
        if self.backends.contains_key(id) {
            return Err(RegistryError::Duplicate(id.to_owned()));
        }
        self.backends.insert(id.to_owned(), backend);
        Ok(self)
    }

    /// Resolves capabilities and freezes the registry.
    ///
    /// Configured sources without a backend are left out.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Config`] when the configuration is invalid.
    pub fn build(mut self) -> Result<SourceRegistry, RegistryError> {
        self.config.validate()?;
        let mut registry = SourceRegistry::default();
        for source_config in &self.config.data_sources {
            let Some(backend) = self.backends.remove(&source_config.id) else {
                warn!(
                    target: CAPABILITY_TARGET,
                    source = source_config.id.as_str(),
                    "configured data source has no backend; skipping"
                );
                continue;
            };
            let capabilities = resolve_capabilities(
                source_config,
                &backend.capabilities(),
                &self.config.capability_overrides,
            );
            let enabled: Vec<&str> = capabilities.enabled().map(|c| c.key()).collect();
            debug!(
                target: CAPABILITY_TARGET,
                source = source_config.id.as_str(),
                capabilities = ?enabled,
                "registered data source"
            );
            registry
                .index
                .insert(source_config.id.clone(), registry.sources.len());
            registry.sources.push(RegisteredSource {
                config: source_config.clone(),
                backend,
                capabilities,
            });
        }
        Ok(registry)
    }
}
