use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Directive applied to a data source capability during negotiation.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CapabilityOverride {
    /// Treat the capability as present even when the source does not declare it.
    Force,
    /// Treat the capability as absent regardless of what the source declares.
    Deny,
    /// Use whatever the source declares (default behaviour).
    #[default]
    Allow,
}

/// Errors produced when parsing [`CapabilityDirective`] values.
#[derive(Debug, Error)]
pub enum CapabilityDirectiveParseError {
    /// Source separator (`:`) was missing from the directive.
    #[error("directive '{0}' is missing the data source separator ':'")]
    MissingSource(String),
    /// Capability override assignment (`=`) was missing from the directive.
    #[error("directive '{0}' is missing the override assignment '='")]
    MissingDirective(String),
    /// The override directive could not be parsed.
    #[error("unsupported capability directive '{0}'")]
    InvalidDirective(String),
}

/// Declarative override for one capability of one data source.
///
/// The textual form is `<source>:<capability>=<override>`, for example
/// `ensembl:rows-for-feature=deny`. Capability tokens may themselves carry a
/// `das1:` prefix, so only the first `:` separates the source.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CapabilityDirective {
    /// Data source identifier.
    pub source: String,
    /// Capability token such as `feature-by-id`.
    pub capability: String,
    /// Override applied to the capability.
    pub directive: CapabilityOverride,
}

impl CapabilityDirective {
    /// Creates a new directive.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        capability: impl Into<String>,
        directive: CapabilityOverride,
    ) -> Self {
        Self {
            source: source.into(),
            capability: capability.into(),
            directive,
        }
    }
}

impl fmt::Display for CapabilityDirective {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{}:{}={}",
            self.source, self.capability, self.directive
        )
    }
}

impl FromStr for CapabilityDirective {
    type Err = CapabilityDirectiveParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let (source, rest) = input
            .split_once(':')
            .ok_or_else(|| CapabilityDirectiveParseError::MissingSource(input.to_owned()))?;
        let (capability, directive) = rest
            .rsplit_once('=')
            .ok_or_else(|| CapabilityDirectiveParseError::MissingDirective(input.to_owned()))?;
        let directive = CapabilityOverride::from_str(directive.trim())
            .map_err(|_| CapabilityDirectiveParseError::InvalidDirective(directive.to_owned()))?;
        Ok(Self::new(source, capability, directive))
    }
}

/// Overrides grouped by data source and capability.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct CapabilityMatrix {
    /// Mapping of data source identifiers to their overrides.
    #[serde(default)]
    pub sources: BTreeMap<String, SourceCapabilities>,
}

impl CapabilityMatrix {
    /// Builds a matrix from directives; later directives win.
    #[must_use]
    pub fn from_directives<'a, I>(directives: I) -> Self
    where
        I: IntoIterator<Item = &'a CapabilityDirective>,
    {
        let mut matrix = Self::default();
        for directive in directives {
            matrix.set_override(
                directive.source.clone(),
                directive.capability.clone(),
                directive.directive,
            );
        }
        matrix
    }

    /// Stores or updates an override for a capability.
    pub fn set_override(
        &mut self,
        source: impl Into<String>,
        capability: impl Into<String>,
        directive: CapabilityOverride,
    ) {
        let source = normalise_key(&source.into());
        let capability = normalise_key(&capability.into());
        let entry = self.sources.entry(source).or_default();
        entry.overrides.insert(capability, directive);
    }

    /// Retrieves an override for a capability, when present.
    ///
    /// Keys are compared after trimming and lowercasing, including keys
    /// that arrived through deserialisation.
    #[must_use]
    pub fn override_for(&self, source: &str, capability: &str) -> Option<CapabilityOverride> {
        let source = normalise_key(source);
        let capability = normalise_key(capability);
        self.sources
            .iter()
            .filter(|(key, _)| normalise_key(key) == source)
            .flat_map(|(_, caps)| caps.overrides.iter())
            .filter(|(key, _)| normalise_key(key) == capability)
            .map(|(_, directive)| *directive)
            .last()
    }

    /// Returns `true` when no overrides are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.values().all(|caps| caps.overrides.is_empty())
    }
}

/// Capability overrides scoped to a single data source.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct SourceCapabilities {
    /// Overrides keyed by capability token.
    #[serde(default)]
    pub overrides: BTreeMap<String, CapabilityOverride>,
}

fn normalise_key(key: &str) -> String {
    key.trim().to_lowercase()
}
