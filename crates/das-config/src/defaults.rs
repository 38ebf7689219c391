use crate::logging::LogFormat;

/// Log filter applied when the configuration does not name one.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Version reported for a data source that does not declare one.
pub const DEFAULT_SOURCE_VERSION: &str = "1.0";

/// Owned log filter value for serde defaults.
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Logging format used when none is configured.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
