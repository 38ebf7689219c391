//! The `types` command.

use std::collections::BTreeMap;

use das_types::{Coordinates, FeatureRequestFilter, FeatureType, SegmentQuery};
use serde::Serialize;

use super::errors::DasError;
use super::request::TypesQuery;
use super::resolve::{Resolution, Resolver};
use crate::registry::RegisteredSource;
use crate::source::SourceError;

/// A feature type and how many features carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    /// The type.
    pub feature_type: FeatureType,
    /// Number of features; absent when the source cannot count.
    pub count: Option<usize>,
}

/// Type counts for one requested segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypesSegment {
    /// The segment was found.
    Found {
        /// Segment identifier.
        segment_id: String,
        /// Range the counts cover.
        range: Option<Coordinates>,
        /// Annotation version.
        version: String,
        /// Per-type counts, ordered by type.
        types: Vec<TypeCount>,
    },
    /// The source does not know the segment.
    Unknown {
        /// Segment as requested.
        query: SegmentQuery,
    },
    /// The segment exists but could not be counted.
    Error {
        /// Segment as requested.
        query: SegmentQuery,
        /// Explanation for the client.
        reason: String,
    },
}

/// Response to a `types` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum TypesReport {
    /// Every type across the whole source.
    Source {
        /// Types with their source-wide counts.
        types: Vec<TypeCount>,
    },
    /// Types on each requested segment.
    Segments {
        /// One entry per requested segment.
        segments: Vec<TypesSegment>,
    },
}

pub(crate) fn handle(source: &RegisteredSource, query: &str) -> Result<TypesReport, DasError> {
    let TypesQuery { segments, type_ids } = TypesQuery::parse(query)?;
    let wanted = |feature_type: &FeatureType| {
        type_ids.is_empty() || type_ids.iter().any(|id| id == feature_type.id())
    };

    if segments.is_empty() {
        let types = source
            .backend()
            .types()?
            .into_iter()
            .filter(|feature_type| wanted(feature_type))
            .map(|feature_type| {
                let count = count_for_type(source, &feature_type)?;
                Ok(TypeCount {
                    feature_type,
                    count,
                })
            })
            .collect::<Result<_, DasError>>()?;
        return Ok(TypesReport::Source { types });
    }

    let seeded: BTreeMap<FeatureType, usize> = if source.config().include_types_with_zero_count {
        source
            .backend()
            .types()?
            .into_iter()
            .filter(|feature_type| wanted(feature_type))
            .map(|feature_type| (feature_type, 0))
            .collect()
    } else {
        BTreeMap::new()
    };

    let outcome = Resolver::for_source(source).segments(
        &segments,
        &FeatureRequestFilter::default(),
        true,
    )?;
    let segments = outcome
        .resolutions
        .into_iter()
        .filter_map(|resolution| match resolution {
            Resolution::Found { segment, query } => {
                let range = query.as_ref().and_then(SegmentQuery::coordinates);
                let features = match range {
                    Some(range) => segment.features_in_range(range.start, range.stop),
                    None => segment.reportable_features(),
                };
                let mut counts = seeded.clone();
                for feature in features.into_iter().filter(|f| wanted(&f.feature_type)) {
                    *counts.entry(feature.feature_type.clone()).or_default() += 1;
                }
                Some(TypesSegment::Found {
                    segment_id: segment.segment_id().to_owned(),
                    range: range.or_else(|| segment.bounds()),
                    version: segment.version().to_owned(),
                    types: counts
                        .into_iter()
                        .map(|(feature_type, count)| TypeCount {
                            feature_type,
                            count: Some(count),
                        })
                        .collect(),
                })
            }
            Resolution::Unknown(query) => Some(TypesSegment::Unknown { query }),
            Resolution::Error { query, reason } => Some(TypesSegment::Error { query, reason }),
            Resolution::UnknownFeature(_) => None,
        })
        .collect();
    Ok(TypesReport::Segments { segments })
}

fn count_for_type(
    source: &RegisteredSource,
    feature_type: &FeatureType,
) -> Result<Option<usize>, DasError> {
    match source.backend().total_count_for_type(feature_type) {
        Ok(count) => Ok(Some(count)),
        Err(SourceError::Unimplemented { .. }) => Ok(None),
        Err(error) => Err(error.into()),
    }
}
