//! Combining segment collections obtained by different routes.
//!
//! A `features` request naming both segments and feature identifiers resolves
//! each independently and then intersects the results. Segments pair up by
//! identifier; within a pair, features pair up by feature identifier.

use std::collections::HashSet;

use das_types::{AnnotatedSegment, Coordinates, Feature};
use thiserror::Error;

use super::resolve::Resolution;

/// How two collections combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeKind {
    /// Keep segments and features present on both sides.
    And,
    /// Keep segments and features present on either side.
    Or,
}

/// Raised when two segments paired for merging disagree on their identity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot merge segment '{left}' with segment '{right}'")]
pub struct MergeError {
    /// Identifier of the left-hand segment.
    pub left: String,
    /// Identifier of the right-hand segment.
    pub right: String,
}

/// Merges two segment collections.
///
/// # Errors
///
/// Returns [`MergeError`] if a paired segment reports a different identifier.
pub fn merge(
    left: &[AnnotatedSegment],
    right: &[AnnotatedSegment],
    kind: MergeKind,
) -> Result<Vec<AnnotatedSegment>, MergeError> {
    let mut merged = Vec::new();
    for segment in left {
        match partner(right, segment.segment_id()) {
            Some(other) => merged.push(merge_pair(segment, other, kind)?),
            None if kind == MergeKind::Or => merged.push(segment.clone()),
            None => {}
        }
    }
    if kind == MergeKind::Or {
        merged.extend(
            right
                .iter()
                .filter(|segment| partner(left, segment.segment_id()).is_none())
                .cloned(),
        );
    }
    Ok(merged)
}

/// Merges two resolution lists.
///
/// Found segments combine as in [`merge`]. Unknown, error and unknown-feature
/// markers keep their position on the left; markers from the right follow.
pub(crate) fn merge_resolutions(
    left: Vec<Resolution>,
    right: Vec<Resolution>,
    kind: MergeKind,
) -> Result<Vec<Resolution>, MergeError> {
    let right_segments: Vec<AnnotatedSegment> = right
        .iter()
        .filter_map(Resolution::segment)
        .cloned()
        .collect();
    let left_ids: HashSet<String> = left
        .iter()
        .filter_map(Resolution::segment)
        .map(|segment| segment.segment_id().to_owned())
        .collect();

    let mut merged = Vec::with_capacity(left.len() + right.len());
    for resolution in left {
        match resolution {
            Resolution::Found { segment, query } => {
                match partner(&right_segments, segment.segment_id()) {
                    Some(other) => merged.push(Resolution::Found {
                        segment: merge_pair(&segment, other, kind)?,
                        query,
                    }),
                    None if kind == MergeKind::Or => {
                        merged.push(Resolution::Found { segment, query });
                    }
                    None => {}
                }
            }
            marker => merged.push(marker),
        }
    }
    for resolution in right {
        let keep = match resolution.segment() {
            Some(segment) => kind == MergeKind::Or && !left_ids.contains(segment.segment_id()),
            None => true,
        };
        if keep {
            merged.push(resolution);
        }
    }
    Ok(merged)
}

fn partner<'a>(segments: &'a [AnnotatedSegment], id: &str) -> Option<&'a AnnotatedSegment> {
    segments.iter().find(|segment| segment.segment_id() == id)
}

fn merge_pair(
    left: &AnnotatedSegment,
    right: &AnnotatedSegment,
    kind: MergeKind,
) -> Result<AnnotatedSegment, MergeError> {
    if left.segment_id() != right.segment_id() {
        return Err(MergeError {
            left: left.segment_id().to_owned(),
            right: right.segment_id().to_owned(),
        });
    }
    let left_features = left.reportable_features();
    let right_features = right.reportable_features();
    let right_ids: HashSet<&str> = right_features
        .iter()
        .map(|feature| feature.feature_id.as_str())
        .collect();

    let features: Vec<Feature> = match kind {
        MergeKind::And => left_features
            .into_iter()
            .filter(|feature| right_ids.contains(feature.feature_id.as_str()))
            .cloned()
            .collect(),
        MergeKind::Or => {
            let left_ids: HashSet<&str> = left_features
                .iter()
                .map(|feature| feature.feature_id.as_str())
                .collect();
            let extra = right_features
                .into_iter()
                .filter(|feature| !left_ids.contains(feature.feature_id.as_str()));
            left_features.into_iter().chain(extra).cloned().collect()
        }
    };

    let bounds = match (left.bounds(), right.bounds()) {
        (Some(a), Some(b)) => Some(Coordinates::new(a.start.min(b.start), a.stop.max(b.stop))),
        _ => None,
    };
    Ok(left
        .with_features(features, left.reported_total())
        .with_bounds(bounds))
}
