//! The `sequence` and `dna` commands.

use das_types::{Coordinates, SegmentQuery, Sequence};
use serde::Serialize;
use tracing::debug;

use super::errors::DasError;
use super::request::parse_sequence_query;
use super::resolve::{OUT_OF_BOUNDS, violates_bounds};
use super::router::{Command, DISPATCH_TARGET};
use crate::capability::Capability;
use crate::registry::RegisteredSource;
use crate::source::SourceError;

/// Sequence reported for one requested segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SequenceReporter {
    /// Residues for the requested range.
    Found {
        /// The residues.
        sequence: Sequence,
    },
    /// The segment could not be served.
    Error {
        /// Segment as requested.
        query: SegmentQuery,
        /// Explanation for the client.
        reason: String,
    },
}

pub(crate) fn handle(
    source: &RegisteredSource,
    command: Command,
    query: &str,
) -> Result<Vec<SequenceReporter>, DasError> {
    let capabilities = source.capabilities();
    if !capabilities.is_reference() {
        return Err(DasError::unimplemented(format!(
            "data source '{}' does not serve sequence",
            source.id()
        )));
    }
    if command == Command::Dna && !source.config().dna_command_enabled {
        return Err(DasError::unimplemented(format!(
            "data source '{}' does not answer the dna command",
            source.id()
        )));
    }

    let ranged = capabilities.supports(Capability::RangeQueries);
    parse_sequence_query(query)?
        .into_iter()
        .map(|segment| fetch(source, segment, ranged))
        .collect()
}

fn fetch(
    source: &RegisteredSource,
    query: SegmentQuery,
    ranged: bool,
) -> Result<SequenceReporter, DasError> {
    let backend = source.backend();
    let fetched = match query.coordinates() {
        Some(coordinates) if ranged => backend.sequence_in_range(query.segment_id(), coordinates),
        _ => backend.sequence(query.segment_id()),
    };
    let sequence = match fetched {
        Ok(sequence) => sequence,
        Err(SourceError::BadReference { message, .. } | SourceError::Coordinate { message, .. }) => {
            debug!(
                target: DISPATCH_TARGET,
                segment = query.segment_id(),
                "sequence unavailable"
            );
            return Ok(SequenceReporter::Error {
                query,
                reason: message,
            });
        }
        Err(error) => return Err(error.into()),
    };

    let Some(requested) = query.coordinates() else {
        return Ok(SequenceReporter::Found { sequence });
    };
    let bounds = Coordinates::new(sequence.start(), sequence.stop());
    if violates_bounds(requested, Some(bounds)) {
        return Ok(out_of_bounds(query));
    }
    match sequence.subsequence(requested.start, requested.stop.min(bounds.stop)) {
        Some(sequence) => Ok(SequenceReporter::Found { sequence }),
        None => Ok(out_of_bounds(query)),
    }
}

fn out_of_bounds(query: SegmentQuery) -> SequenceReporter {
    SequenceReporter::Error {
        query,
        reason: OUT_OF_BOUNDS.to_owned(),
    }
}
