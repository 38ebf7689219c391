//! DAS command dispatch.
//!
//! A [`CommandRequest`] names a command, an optional data source and a raw
//! query string. The [`Dispatcher`] parses the command, looks the source up in
//! the [`SourceRegistry`], and hands the query to the command's handler, which
//! returns a typed [`CommandResponse`] for the serializer.
//!
//! ## Failures
//!
//! Handlers fail with [`DasError`], whose [`DasError::status`] gives the DAS
//! status code to report. Failures confined to one requested segment do not
//! fail the request; they are reported per segment as
//! [`SegmentReporter::Unknown`] or [`SegmentReporter::Error`].

mod entry_points;
mod errors;
mod features;
mod merge;
mod metadata;
mod paginate;
mod reporter;
mod request;
mod resolve;
mod router;
mod sequence;
mod structure;
mod types;

use std::sync::Arc;

use das_config::ServerConfig;
use serde::Serialize;
use tracing::debug;
use url::Url;

pub use self::entry_points::EntryPointsReport;
pub use self::errors::{DasError, DasStatus};
pub use self::features::FeaturesReport;
pub use self::merge::{MergeError, MergeKind, merge};
pub use self::metadata::DsnEntry;
pub use self::reporter::{FoundSegment, SegmentReporter};
pub use self::request::CommandRequest;
pub use self::router::Command;
pub use self::sequence::SequenceReporter;
pub use self::types::{TypeCount, TypesReport, TypesSegment};
pub(crate) use self::router::DISPATCH_TARGET;
use crate::registry::{RegisteredSource, SourceRegistry};
use crate::source::{ExternalDocument, FeatureSearcher};

/// Typed result of a successful command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", content = "body", rename_all = "snake_case")]
pub enum CommandResponse {
    /// Registered data sources.
    Dsn(Vec<DsnEntry>),
    /// Annotated segments.
    Features(FeaturesReport),
    /// Feature type counts.
    Types(TypesReport),
    /// Sequences, for both `sequence` and `dna`.
    Sequence(Vec<SequenceReporter>),
    /// A window of entry points.
    EntryPoints(EntryPointsReport),
    /// Name of the stylesheet to serve.
    Stylesheet(String),
    /// Target of a `link` request.
    Link(Url),
    /// Structure document from the backend.
    Structure(ExternalDocument),
    /// Alignment document from the backend.
    Alignment(ExternalDocument),
}

/// Routes DAS commands to their handlers.
///
/// The dispatcher holds only shared, immutable state and can serve
/// concurrent requests from one instance.
#[derive(Clone)]
pub struct Dispatcher {
    config: Arc<ServerConfig>,
    registry: Arc<SourceRegistry>,
    searcher: Option<Arc<dyn FeatureSearcher>>,
}

impl Dispatcher {
    /// Creates a dispatcher without a search index.
    #[must_use]
    pub fn new(config: Arc<ServerConfig>, registry: Arc<SourceRegistry>) -> Self {
        Self {
            config,
            registry,
            searcher: None,
        }
    }

    /// Installs the search index used for `query=` expressions.
    #[must_use]
    pub fn with_searcher(mut self, searcher: Arc<dyn FeatureSearcher>) -> Self {
        self.searcher = Some(searcher);
        self
    }

    /// Registered data sources.
    #[must_use]
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Executes one command.
    ///
    /// # Errors
    ///
    /// Returns [`DasError`] when the command, the data source, or the
    /// arguments are invalid, or when the data source fails.
    pub fn dispatch(&self, request: &CommandRequest) -> Result<CommandResponse, DasError> {
        let command = Command::parse(request.command())?;
        debug!(
            target: DISPATCH_TARGET,
            command = command.as_str(),
            dsn = request.dsn(),
            "routing command"
        );
        let query = request.query();
        if command.is_server_level() {
            return metadata::dsn(&self.registry, query).map(CommandResponse::Dsn);
        }

        let dsn = request.dsn().ok_or_else(|| {
            DasError::bad_data_source(format!("none given for {}", command.as_str()))
        })?;
        let source = self
            .registry
            .get(dsn)
            .ok_or_else(|| DasError::bad_data_source(dsn))?;
        self.dispatch_to_source(command, source, query)
    }

    fn dispatch_to_source(
        &self,
        command: Command,
        source: &RegisteredSource,
        query: &str,
    ) -> Result<CommandResponse, DasError> {
        match command {
            Command::Dsn => metadata::dsn(&self.registry, query).map(CommandResponse::Dsn),
            Command::Features => features::handle(source, self.searcher.as_deref(), query)
                .map(CommandResponse::Features),
            Command::Types => types::handle(source, query).map(CommandResponse::Types),
            Command::Sequence | Command::Dna => {
                sequence::handle(source, command, query).map(CommandResponse::Sequence)
            }
            Command::EntryPoints => {
                entry_points::handle(source, query).map(CommandResponse::EntryPoints)
            }
            Command::Stylesheet => {
                metadata::stylesheet(source, self.config.default_stylesheet.as_deref(), query)
                    .map(CommandResponse::Stylesheet)
            }
            Command::Link => metadata::link(source, query).map(CommandResponse::Link),
            Command::Structure => {
                structure::structure(source, query).map(CommandResponse::Structure)
            }
            Command::Alignment => {
                structure::alignment(source, query).map(CommandResponse::Alignment)
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Dispatcher")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("searcher", &self.searcher.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests;
