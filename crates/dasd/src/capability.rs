//! Capability tokens and per-source resolution.
//!
//! A data source declares which optional operations it implements. The
//! server configuration may declare more and may force or deny individual
//! tokens. [`resolve_capabilities`] folds those inputs into a
//! [`CapabilitySet`] that the dispatcher consults before each optional call.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use das_config::{CapabilityMatrix, CapabilityOverride, DataSourceConfig};
use strum::{Display, EnumString, IntoStaticStr};
use tracing::warn;

pub(crate) const CAPABILITY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::capability");

const DAS_PREFIX: &str = "das1:";

/// Optional behaviour a data source may support.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumString, Display, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Capability {
    /// Answers the `features` command.
    #[strum(serialize = "features")]
    Features,
    /// Answers the `types` command.
    #[strum(serialize = "types")]
    Types,
    /// Serves reference sequence; marks the source as a reference server.
    #[strum(serialize = "sequence")]
    Sequence,
    /// Answers the `entry_points` command.
    #[strum(serialize = "entry_points")]
    EntryPoints,
    /// Serves a stylesheet.
    #[strum(serialize = "stylesheet")]
    Stylesheet,
    /// Looks features up by identifier.
    #[strum(serialize = "feature-by-id")]
    FeatureById,
    /// Applies a row window while fetching features.
    #[strum(serialize = "rows-for-feature")]
    RowsForFeature,
    /// Delegates `query=` expressions to a search index.
    #[strum(serialize = "advanced-search")]
    AdvancedSearch,
    /// Restricts feature and sequence retrieval to coordinates.
    #[strum(serialize = "range-queries")]
    RangeQueries,
    /// Resolves `link` requests.
    #[strum(serialize = "link")]
    Link,
    /// Answers the `structure` command.
    #[strum(serialize = "structure")]
    Structure,
    /// Answers the `alignment` command.
    #[strum(serialize = "alignment")]
    Alignment,
    /// Reports unknown segments explicitly.
    #[strum(serialize = "unknown-segment")]
    UnknownSegment,
    /// Reports unknown feature identifiers explicitly.
    #[strum(serialize = "unknown-feature")]
    UnknownFeature,
    /// Reports segments with invalid coordinates explicitly.
    #[strum(serialize = "error-segment")]
    ErrorSegment,
    /// Honours the `maxbins` hint.
    #[strum(serialize = "maxbins")]
    Maxbins,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Self; 16] = [
        Self::Features,
        Self::Types,
        Self::Sequence,
        Self::EntryPoints,
        Self::Stylesheet,
        Self::FeatureById,
        Self::RowsForFeature,
        Self::AdvancedSearch,
        Self::RangeQueries,
        Self::Link,
        Self::Structure,
        Self::Alignment,
        Self::UnknownSegment,
        Self::UnknownFeature,
        Self::ErrorSegment,
        Self::Maxbins,
    ];

    /// Returns the token used in configuration and overrides.
    #[must_use]
    pub fn key(self) -> &'static str {
        self.into()
    }

    /// Parses a token, accepting an optional `das1:` prefix.
    #[must_use]
    pub fn parse_token(token: &str) -> Option<Self> {
        let trimmed = token.trim();
        let bare = match trimmed.get(..DAS_PREFIX.len()) {
            Some(prefix) if prefix.eq_ignore_ascii_case(DAS_PREFIX) => {
                trimmed.get(DAS_PREFIX.len()..).unwrap_or_default()
            }
            _ => trimmed,
        };
        Self::from_str(bare).ok()
    }
}

/// Where a capability's availability came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilitySource {
    /// Declared by the backend implementation.
    SourceDeclared,
    /// Declared in the data source configuration.
    ConfigDeclared,
    /// Enabled by a force override.
    ForcedOverride,
    /// Disabled by a deny override.
    DeniedOverride,
    /// Nobody declared it.
    Undeclared,
}

impl fmt::Display for CapabilitySource {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SourceDeclared => "declared by source",
            Self::ConfigDeclared => "declared in configuration",
            Self::ForcedOverride => "forced by override",
            Self::DeniedOverride => "denied by override",
            Self::Undeclared => "undeclared",
        };
        formatter.write_str(label)
    }
}

/// Effective state of one capability after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapabilityState {
    /// Capability being described.
    pub capability: Capability,
    /// Whether the dispatcher may rely on it.
    pub enabled: bool,
    /// Why it is (un)available.
    pub source: CapabilitySource,
}

impl CapabilityState {
    /// Constructs a new capability state.
    #[must_use]
    pub const fn new(capability: Capability, enabled: bool, source: CapabilitySource) -> Self {
        Self {
            capability,
            enabled,
            source,
        }
    }
}

/// Resolved capabilities of one data source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    states: BTreeMap<Capability, CapabilityState>,
}

impl CapabilitySet {
    /// Builds a set where exactly `capabilities` are enabled, as declared by
    /// the source.
    #[must_use]
    pub fn declared(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        let states = capabilities
            .into_iter()
            .map(|capability| {
                (
                    capability,
                    CapabilityState::new(capability, true, CapabilitySource::SourceDeclared),
                )
            })
            .collect();
        Self { states }
    }

    /// Returns `true` when the capability is enabled.
    #[must_use]
    pub fn supports(&self, capability: Capability) -> bool {
        self.state(capability).enabled
    }

    /// Returns `true` for reference sources, which serve sequence.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.supports(Capability::Sequence)
    }

    /// Returns the state for the requested capability.
    #[must_use]
    pub fn state(&self, capability: Capability) -> CapabilityState {
        match self.states.get(&capability) {
            Some(state) => *state,
            None => CapabilityState::new(capability, false, CapabilitySource::Undeclared),
        }
    }

    /// Enabled capabilities, in declaration order.
    pub fn enabled(&self) -> impl Iterator<Item = Capability> + '_ {
        self.states
            .values()
            .filter(|state| state.enabled)
            .map(|state| state.capability)
    }
}

/// Resolves the capabilities of a data source from what the backend declares,
/// what the configuration declares, and the configured overrides.
#[must_use]
pub fn resolve_capabilities(
    config: &DataSourceConfig,
    backend_declared: &[Capability],
    overrides: &CapabilityMatrix,
) -> CapabilitySet {
    let config_declared: Vec<Capability> = config
        .capabilities
        .iter()
        .filter_map(|token| {
            let parsed = Capability::parse_token(token);
            if parsed.is_none() {
                warn!(
                    target: CAPABILITY_TARGET,
                    source = config.id.as_str(),
                    token = token.as_str(),
                    "ignoring unrecognised capability token"
                );
            }
            parsed
        })
        .collect();

    let states = Capability::ALL
        .into_iter()
        .map(|capability| {
            let state = resolve_state(
                &config.id,
                capability,
                backend_declared,
                &config_declared,
                overrides,
            );
            (capability, state)
        })
        .collect();
    CapabilitySet { states }
}

fn resolve_state(
    source_id: &str,
    capability: Capability,
    backend_declared: &[Capability],
    config_declared: &[Capability],
    overrides: &CapabilityMatrix,
) -> CapabilityState {
    let prefixed = format!("{DAS_PREFIX}{}", capability.key());
    let directive = overrides
        .override_for(source_id, capability.key())
        .or_else(|| overrides.override_for(source_id, &prefixed));
    match directive {
        Some(CapabilityOverride::Force) => {
            return CapabilityState::new(capability, true, CapabilitySource::ForcedOverride);
        }
        Some(CapabilityOverride::Deny) => {
            return CapabilityState::new(capability, false, CapabilitySource::DeniedOverride);
        }
        None | Some(CapabilityOverride::Allow) => {}
    }

    if backend_declared.contains(&capability) {
        CapabilityState::new(capability, true, CapabilitySource::SourceDeclared)
    } else if config_declared.contains(&capability) {
        CapabilityState::new(capability, true, CapabilitySource::ConfigDeclared)
    } else {
        CapabilityState::new(capability, false, CapabilitySource::Undeclared)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::bare("feature-by-id", Some(Capability::FeatureById))]
    #[case::prefixed("das1:rows-for-feature", Some(Capability::RowsForFeature))]
    #[case::upper_prefix("DAS1:Sequence", Some(Capability::Sequence))]
    #[case::padded("  entry_points ", Some(Capability::EntryPoints))]
    #[case::unknown("writeback", None)]
    fn parses_tokens(#[case] token: &str, #[case] expected: Option<Capability>) {
        assert_eq!(Capability::parse_token(token), expected);
    }

    #[test]
    fn keys_round_trip_through_parse() {
        for capability in Capability::ALL {
            assert_eq!(Capability::parse_token(capability.key()), Some(capability));
        }
    }

    #[test]
    fn merges_declarations_and_overrides() {
        let mut config = DataSourceConfig::new("ensembl");
        config.capabilities = vec!["das1:feature-by-id".into(), "bogus".into()];
        let mut overrides = CapabilityMatrix::default();
        overrides.set_override("ensembl", "rows-for-feature", CapabilityOverride::Deny);
        overrides.set_override("ensembl", "das1:maxbins", CapabilityOverride::Force);

        let set = resolve_capabilities(
            &config,
            &[Capability::Features, Capability::RowsForFeature],
            &overrides,
        );

        assert_eq!(
            set.state(Capability::Features).source,
            CapabilitySource::SourceDeclared
        );
        assert_eq!(
            set.state(Capability::FeatureById).source,
            CapabilitySource::ConfigDeclared
        );
        assert_eq!(
            set.state(Capability::RowsForFeature),
            CapabilityState::new(
                Capability::RowsForFeature,
                false,
                CapabilitySource::DeniedOverride
            )
        );
        assert!(set.supports(Capability::Maxbins));
        assert!(!set.supports(Capability::Sequence));
        assert!(!set.is_reference());
    }
}
