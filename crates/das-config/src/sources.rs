use serde::{Deserialize, Serialize};
use url::Url;

use crate::defaults::DEFAULT_SOURCE_VERSION;

/// Static description of one data source served by the server.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DataSourceConfig {
    /// Identifier used in request paths (`/das/<id>/features`).
    pub id: String,
    /// Display name; the identifier is reported when absent.
    #[serde(default)]
    pub name: Option<String>,
    /// Version of the annotations.
    #[serde(default)]
    pub version: Option<String>,
    /// Reference server the annotations are mapped onto.
    #[serde(default)]
    pub mapmaster: Option<Url>,
    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Capability tokens declared for the source in addition to those the
    /// backend declares itself.
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Stylesheet served for the source.
    #[serde(default)]
    pub stylesheet: Option<String>,
    /// Whether the deprecated `dna` command is answered.
    #[serde(default)]
    pub dna_command_enabled: bool,
    /// Whether `types` responses list types with no features on a segment.
    #[serde(default)]
    pub include_types_with_zero_count: bool,
    /// Upper bound on entry points returned by one request.
    #[serde(default)]
    pub max_entry_points: Option<usize>,
}

impl DataSourceConfig {
    /// Creates a source description with default settings.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            version: None,
            mapmaster: None,
            description: None,
            capabilities: Vec::new(),
            stylesheet: None,
            dna_command_enabled: false,
            include_types_with_zero_count: false,
            max_entry_points: None,
        }
    }

    /// Name reported to clients.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Version reported to clients.
    #[must_use]
    pub fn reported_version(&self) -> &str {
        self.version.as_deref().unwrap_or(DEFAULT_SOURCE_VERSION)
    }
}
