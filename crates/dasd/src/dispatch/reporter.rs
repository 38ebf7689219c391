//! Per-segment report values handed to the serializer.

use das_types::{AnnotatedSegment, Coordinates, Feature, FeatureRequestFilter, SegmentQuery};
use serde::Serialize;

use super::resolve::Resolution;

/// Outcome reported for one requested segment or feature identifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SegmentReporter {
    /// The segment was found.
    Found(FoundSegment),
    /// The source does not know the segment.
    Unknown {
        /// Segment as requested.
        query: SegmentQuery,
    },
    /// The segment exists but the request could not be answered.
    Error {
        /// Segment as requested.
        query: SegmentQuery,
        /// Explanation for the client.
        reason: String,
    },
    /// No feature carries the identifier.
    UnknownFeature {
        /// Identifier as requested.
        feature_id: String,
    },
}

impl SegmentReporter {
    /// Identifier of the segment or feature this report describes.
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Found(found) => &found.segment_id,
            Self::Unknown { query } | Self::Error { query, .. } => query.segment_id(),
            Self::UnknownFeature { feature_id } => feature_id,
        }
    }

    /// Returns the found segment, if any.
    #[must_use]
    pub const fn as_found(&self) -> Option<&FoundSegment> {
        match self {
            Self::Found(found) => Some(found),
            _ => None,
        }
    }
}

/// A found segment with the features the client asked for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoundSegment {
    /// Segment identifier.
    pub segment_id: String,
    /// Bounds the source reported for the segment.
    pub bounds: Option<Coordinates>,
    /// Range the client requested, when it named one.
    pub requested: Option<Coordinates>,
    /// Annotation version.
    pub version: String,
    /// Human-readable label.
    pub label: Option<String>,
    /// Segment type, such as `Chromosome`.
    pub segment_type: Option<String>,
    /// Features the source holds for the segment, before any window.
    pub total_features: usize,
    /// Reportable features inside the requested range that pass the filter.
    pub features: Vec<Feature>,
}

impl FoundSegment {
    /// Builds the report for `segment` as answered for `query`.
    #[must_use]
    pub fn new(
        segment: &AnnotatedSegment,
        query: Option<&SegmentQuery>,
        filter: &FeatureRequestFilter,
    ) -> Self {
        let requested = query.and_then(SegmentQuery::coordinates);
        let in_range = match requested {
            Some(range) => segment.features_in_range(range.start, range.stop),
            None => segment.reportable_features(),
        };
        let features = in_range
            .into_iter()
            .filter(|feature| filter.admits(feature))
            .cloned()
            .collect();
        Self {
            segment_id: segment.segment_id().to_owned(),
            bounds: segment.bounds(),
            requested,
            version: segment.version().to_owned(),
            label: segment.label().map(str::to_owned),
            segment_type: segment.segment_type().map(str::to_owned),
            total_features: segment.total_feature_count(),
            features,
        }
    }

    /// Range to report: the requested one, else the segment's own bounds.
    #[must_use]
    pub fn reported_range(&self) -> Option<Coordinates> {
        self.requested.or(self.bounds)
    }
}

/// Converts resolutions into reports.
///
/// A found segment without an originating query is matched to the first
/// requested query whose identifier equals its own, ignoring ASCII case.
pub(crate) fn report(
    resolutions: Vec<Resolution>,
    requested: &[SegmentQuery],
    filter: &FeatureRequestFilter,
) -> Vec<SegmentReporter> {
    resolutions
        .into_iter()
        .map(|resolution| match resolution {
            Resolution::Found { segment, query } => {
                let query = query.or_else(|| {
                    requested
                        .iter()
                        .find(|q| q.segment_id().eq_ignore_ascii_case(segment.segment_id()))
                        .cloned()
                });
                SegmentReporter::Found(FoundSegment::new(&segment, query.as_ref(), filter))
            }
            Resolution::Unknown(query) => SegmentReporter::Unknown { query },
            Resolution::Error { query, reason } => SegmentReporter::Error { query, reason },
            Resolution::UnknownFeature(feature_id) => {
                SegmentReporter::UnknownFeature { feature_id }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use das_types::{Feature, FeatureType};
    use serde_json::json;

    use super::*;
    use crate::tests::support::{feature, segment_with};

    fn annotated() -> AnnotatedSegment {
        let variant = FeatureType::new("snp").expect("valid type");
        AnnotatedSegment::builder("chr1", "36")
            .bounds(1, 1_000)
            .feature(feature("e1", 10, 20))
            .feature(feature("e2", 500, 600))
            .feature(Feature::non_positional("note", variant))
            .build()
            .expect("valid segment")
    }

    fn ids(found: &FoundSegment) -> Vec<&str> {
        found
            .features
            .iter()
            .map(|feature| feature.feature_id.as_str())
            .collect()
    }

    #[test]
    fn restricts_to_requested_range_keeping_non_positional() {
        let query = SegmentQuery::new("chr1")
            .expect("valid id")
            .with_coordinates(Coordinates::new(1, 100));
        let found = FoundSegment::new(&annotated(), Some(&query), &FeatureRequestFilter::default());
        assert_eq!(ids(&found), ["e1", "note"]);
        assert_eq!(found.total_features, 3);
        assert_eq!(found.reported_range(), Some(Coordinates::new(1, 100)));
    }

    #[test]
    fn applies_type_filter_after_range() {
        let mut filter = FeatureRequestFilter::default();
        filter.add_type_id("exon");
        let found = FoundSegment::new(&annotated(), None, &filter);
        assert_eq!(ids(&found), ["e1", "e2"]);
        assert_eq!(found.reported_range(), Some(Coordinates::new(1, 1_000)));
    }

    #[test]
    fn matches_found_segments_to_queries_ignoring_case() {
        let query = SegmentQuery::new("CHR1")
            .expect("valid id")
            .with_coordinates(Coordinates::new(5, 15));
        let resolutions = vec![Resolution::Found {
            segment: segment_with("chr1", 1, 100, &["a"]),
            query: None,
        }];

        let reports = report(resolutions, &[query], &FeatureRequestFilter::default());

        let found = reports[0].as_found().expect("found");
        assert_eq!(found.requested, Some(Coordinates::new(5, 15)));
    }

    #[test]
    fn serializes_markers_with_a_kind_tag() {
        let reports = report(
            vec![
                Resolution::Unknown(SegmentQuery::new("Z").expect("valid id")),
                Resolution::UnknownFeature("f9".to_owned()),
            ],
            &[],
            &FeatureRequestFilter::default(),
        );

        let value = serde_json::to_value(&reports).expect("serializable");

        assert_eq!(value[0]["kind"], json!("unknown"));
        assert_eq!(value[0]["query"]["segment_id"], json!("Z"));
        assert_eq!(value[1], json!({"kind": "unknown_feature", "feature_id": "f9"}));
    }
}
