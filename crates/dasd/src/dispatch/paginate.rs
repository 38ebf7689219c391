//! Row windows applied after resolution.
//!
//! When no backend call honoured the requested `rows`, the window is applied
//! here over the concatenated reportable features of every found segment, in
//! encounter order. Rows are 1-based and inclusive.

use das_types::{AnnotatedSegment, RowRange};

use super::resolve::Resolution;

/// Result of applying a row window.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Paginated {
    pub(crate) resolutions: Vec<Resolution>,
    /// Number of features scanned across all found segments.
    pub(crate) total_features: usize,
}

/// Keeps only the rows inside `rows`.
///
/// Segments without a row in the window are dropped, segments straddling a
/// window edge are replaced by a trimmed copy that still reports the original
/// total, and markers pass through untouched.
pub(crate) fn paginate(resolutions: Vec<Resolution>, rows: RowRange) -> Paginated {
    let mut scanned = 0_usize;
    let mut kept = Vec::with_capacity(resolutions.len());

    for resolution in resolutions {
        let Resolution::Found { segment, query } = resolution else {
            kept.push(resolution);
            continue;
        };
        let offset = scanned;
        scanned += segment.reportable_features().len();
        if let Some(segment) = rows
            .relative_to(offset)
            .and_then(|window| trim(&segment, window))
        {
            kept.push(Resolution::Found { segment, query });
        }
    }

    Paginated {
        resolutions: kept,
        total_features: scanned,
    }
}

/// Keeps rows `rows` of one segment, counted from its first reportable
/// feature.
///
/// Returns `None` when no row of the segment falls inside the window. A
/// trimmed copy still reports the untrimmed total.
pub(crate) fn trim(segment: &AnnotatedSegment, rows: RowRange) -> Option<AnnotatedSegment> {
    let features = segment.reportable_features();
    let last = rows.end().min(features.len());
    if rows.start() > last {
        return None;
    }
    if rows.start() == 1 && last == features.len() {
        return Some(segment.clone());
    }
    let window = features
        .get(rows.start() - 1..last)
        .unwrap_or_default()
        .iter()
        .map(|feature| (*feature).clone())
        .collect();
    Some(segment.with_features(window, Some(segment.total_feature_count())))
}
