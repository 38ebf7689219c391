use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Output format for the server's structured logs.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, for log shippers.
    #[default]
    Json,
    /// Single-line human-readable events.
    Compact,
}

/// Error returned when a [`LogFormat`] or [`LogTarget`] name is not
/// recognised.
pub type LogFormatParseError = strum::ParseError;

/// Event targets the engine logs under, each tunable on its own.
///
/// `dispatch` carries request routing, segment resolution and pagination
/// decisions. `capability` carries registry start-up and capability
/// negotiation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Deserialize,
    Serialize,
    EnumString,
    EnumIter,
    Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogTarget {
    /// Command routing and resolution.
    Dispatch,
    /// Capability negotiation.
    Capability,
}

impl LogTarget {
    /// Full `tracing` target path used in filter directives.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Dispatch => "dasd::dispatch",
            Self::Capability => "dasd::capability",
        }
    }

    /// Filter directive raising or lowering this target to `level`.
    #[must_use]
    pub fn directive(self, level: &str) -> String {
        format!("{}={level}", self.path())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use strum::IntoEnumIterator;

    use super::*;

    #[rstest]
    #[case::json("json", LogFormat::Json)]
    #[case::compact("Compact", LogFormat::Compact)]
    fn parses_log_formats(#[case] text: &str, #[case] expected: LogFormat) {
        assert_eq!(text.parse::<LogFormat>(), Ok(expected));
    }

    #[test]
    fn rejects_unknown_log_formats() {
        assert!("pretty".parse::<LogFormat>().is_err());
    }

    #[rstest]
    #[case::dispatch(LogTarget::Dispatch, "debug", "dasd::dispatch=debug")]
    #[case::capability(LogTarget::Capability, "warn", "dasd::capability=warn")]
    fn builds_target_directives(
        #[case] target: LogTarget,
        #[case] level: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(target.directive(level), expected);
    }

    #[test]
    fn target_paths_share_the_engine_prefix() {
        for target in LogTarget::iter() {
            assert_eq!(target.path(), format!("dasd::{target}"));
        }
    }
}
