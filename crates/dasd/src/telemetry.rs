//! Structured logging for the DAS engine.
//!
//! Dispatch and registry events are emitted under the targets named by
//! [`LogTarget`]. The configured `log_filter` sets the baseline and
//! `log_targets` raises or lowers each target on top of it, so resolution
//! can be traced at `debug` while capability negotiation stays at `warn`.

use std::io::{self, IsTerminal};

use das_config::{LogFormat, LogTarget, ServerConfig};
use once_cell::sync::OnceCell;
use strum::IntoEnumIterator;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, time::UtcTime};

use crate::capability::CAPABILITY_TARGET;

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Proof that the global subscriber is installed.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The combined filter directives do not parse.
    #[error("invalid log filter '{directives}': {message}")]
    Filter {
        /// Directives as handed to the filter parser.
        directives: String,
        /// Parser message.
        message: String,
    },
    /// Another subscriber already owns the global default.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the global subscriber described by `config`.
///
/// Only the first successful call installs anything; later calls return a
/// handle straight away.
///
/// # Examples
///
/// ```rust
/// use das_config::{LogFormat, LogTarget, ServerConfig};
///
/// # fn main() -> Result<(), dasd::telemetry::TelemetryError> {
/// let config = ServerConfig {
///     log_filter: "dasd=debug".into(),
///     log_format: LogFormat::Compact,
///     ..ServerConfig::default()
/// };
/// let _handle = dasd::telemetry::initialise(&config)?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the filter or a per-target level
/// does not parse, and
/// [`TelemetryError::Subscriber`] when a foreign subscriber is already set.
pub fn initialise(config: &ServerConfig) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| TelemetryHandle)
}

fn filter_for(config: &ServerConfig) -> Result<EnvFilter, TelemetryError> {
    let directives = config.log_directives();
    EnvFilter::try_new(&directives).map_err(|error| TelemetryError::Filter {
        message: error.to_string(),
        directives,
    })
}

fn install_subscriber(config: &ServerConfig) -> Result<(), TelemetryError> {
    let filter = filter_for(config)?;
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;
    tracing::info!(
        target: CAPABILITY_TARGET,
        format = %config.log_format(),
        targets = ?LogTarget::iter().map(LogTarget::path).collect::<Vec<_>>(),
        "telemetry installed"
    );
    Ok(())
}
