//! The `entry_points` command.

use das_types::EntryPoint;
use serde::Serialize;

use super::errors::DasError;
use super::request::parse_entry_points_query;
use crate::registry::RegisteredSource;

/// Response to an `entry_points` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryPointsReport {
    /// Version of the entry point listing.
    pub version: String,
    /// Number of entry points the source holds.
    pub total: usize,
    /// First row returned, 1-based.
    pub start: usize,
    /// Last row returned.
    pub end: usize,
    /// The entry points in the window.
    pub entry_points: Vec<EntryPoint>,
}

pub(crate) fn handle(
    source: &RegisteredSource,
    query: &str,
) -> Result<EntryPointsReport, DasError> {
    let rows = parse_entry_points_query(query)?;
    let backend = source.backend();
    let total = backend.total_entry_points()?;

    let start = rows.map_or(1, |rows| rows.start());
    let mut stop = rows.map_or(total, |rows| rows.end().min(total));
    if let Some(limit) = source.config().max_entry_points {
        stop = stop.min((start + limit).saturating_sub(1));
    }
    if start > total {
        return Err(DasError::bad_arguments(format!(
            "entry point rows start at {start} but the source holds {total}"
        )));
    }

    let mut entry_points = backend.entry_points(start, stop)?;
    let version = backend.entry_point_version()?.ok_or_else(|| {
        DasError::data_source(format!(
            "data source '{}' reports no entry point version",
            source.id()
        ))
    })?;

    entry_points.truncate((stop + 1).saturating_sub(start));
    let end = if entry_points.is_empty() {
        stop
    } else {
        start + entry_points.len() - 1
    };
    Ok(EntryPointsReport {
        version,
        total,
        start,
        end,
        entry_points,
    })
}
