//! Segment and feature-identifier resolution against one data source.
//!
//! The resolver walks the requested segments in order, keeps a running count
//! of the features already seen so a row window can be shifted onto each
//! segment, validates explicit coordinates against the returned segment, and
//! classifies backend failures.
//!
//! A windowed call the backend does not implement is replaced by the plain
//! call, and the returned segment is trimmed to the same window here.

use das_types::{AnnotatedSegment, Coordinates, FeatureRequestFilter, RowRange, SegmentQuery};
use tracing::debug;

use super::errors::DasError;
use super::paginate::trim;
use super::router::DISPATCH_TARGET;
use crate::capability::{Capability, CapabilitySet};
use crate::registry::RegisteredSource;
use crate::source::{AnnotationSource, FeatureLookup, SourceError};

/// Reason attached to segments whose requested coordinates do not fit.
pub(crate) const OUT_OF_BOUNDS: &str = "start and stop out of segment bounds";

/// Classification of one requested segment or feature identifier.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Resolution {
    /// The source returned the segment.
    Found {
        segment: AnnotatedSegment,
        /// Query the segment answers, absent for identifier lookups.
        query: Option<SegmentQuery>,
    },
    /// The source does not know the segment.
    Unknown(SegmentQuery),
    /// The segment exists but the request cannot be answered for it.
    Error { query: SegmentQuery, reason: String },
    /// No feature carries the identifier.
    UnknownFeature(String),
}

impl Resolution {
    pub(crate) const fn segment(&self) -> Option<&AnnotatedSegment> {
        match self {
            Self::Found { segment, .. } => Some(segment),
            _ => None,
        }
    }
}

/// Resolutions plus whether the row window was already applied to them.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ResolveOutcome {
    pub(crate) resolutions: Vec<Resolution>,
    pub(crate) window_honoured: bool,
    /// Features counted while shifting the window, dropped segments included.
    pub(crate) scanned_features: usize,
}

/// Resolves requests against one backend under its effective capabilities.
pub(crate) struct Resolver<'a> {
    backend: &'a dyn AnnotationSource,
    capabilities: &'a CapabilitySet,
}

impl<'a> Resolver<'a> {
    pub(crate) const fn new(
        backend: &'a dyn AnnotationSource,
        capabilities: &'a CapabilitySet,
    ) -> Self {
        Self {
            backend,
            capabilities,
        }
    }

    pub(crate) fn for_source(source: &'a RegisteredSource) -> Self {
        Self::new(source.backend(), source.capabilities())
    }

    /// Resolves `queries` in request order.
    ///
    /// With `handle_unknown`, unknown segments and coordinate rejections
    /// become markers; otherwise they propagate.
    pub(crate) fn segments(
        &self,
        queries: &[SegmentQuery],
        filter: &FeatureRequestFilter,
        handle_unknown: bool,
    ) -> Result<ResolveOutcome, DasError> {
        let maxbins = self.maxbins(filter);
        let rows = self.window(filter);
        let mut outcome = ResolveOutcome::default();
        let mut current = 0_usize;

        for query in queries {
            let ranged = self.ranged(query);
            let fetched = match rows.map(|window| window.relative_to(current)) {
                Some(Some(window)) => self.fetch_windowed(query.segment_id(), ranged, maxbins, window),
                Some(None) => {
                    debug!(
                        target: DISPATCH_TARGET,
                        segment = query.segment_id(),
                        "row window ends before segment; fetching for validation only"
                    );
                    self.backend
                        .features(query.segment_id(), maxbins)
                        .map(Fetched::past_window)
                }
                None => self
                    .fetch(query.segment_id(), ranged, maxbins)
                    .map(Fetched::unwindowed),
            };

            let fetched = match fetched {
                Ok(fetched) => fetched,
                Err(error) => {
                    outcome
                        .resolutions
                        .push(self.classify(query, error, handle_unknown)?);
                    continue;
                }
            };

            current += fetched.segment.total_feature_count();
            outcome.scanned_features = current;
            outcome.window_honoured |= fetched.honoured;
            let bounds = fetched.segment.bounds();
            if query
                .coordinates()
                .is_some_and(|requested| violates_bounds(requested, bounds))
            {
                debug!(
                    target: DISPATCH_TARGET,
                    segment = query.segment_id(),
                    "requested coordinates fall outside the segment"
                );
                outcome.resolutions.push(Resolution::Error {
                    query: query.clone(),
                    reason: OUT_OF_BOUNDS.to_owned(),
                });
                continue;
            }
            if fetched.dropped {
                continue;
            }
            outcome.resolutions.push(Resolution::Found {
                segment: fetched.segment,
                query: Some(query.clone()),
            });
        }
        Ok(outcome)
    }

    /// Looks up the feature identifiers held by `filter`.
    pub(crate) fn feature_ids(
        &self,
        filter: &FeatureRequestFilter,
    ) -> Result<ResolveOutcome, DasError> {
        let ids = filter.feature_ids();
        let maxbins = self.maxbins(filter);
        let (lookups, window_honoured) = match self.window(filter) {
            Some(rows) => match self.backend.features_by_id_in_rows(ids, maxbins, rows) {
                Ok(lookups) => (lookups, true),
                Err(error) if error.is_unimplemented() => {
                    debug!(
                        target: DISPATCH_TARGET,
                        "windowed identifier lookup unimplemented; falling back"
                    );
                    (self.backend.features_by_id(ids, maxbins)?, false)
                }
                Err(error) => return Err(error.into()),
            },
            None => (self.backend.features_by_id(ids, maxbins)?, false),
        };

        let resolutions: Vec<Resolution> = lookups
            .into_iter()
            .map(|lookup| match lookup {
                FeatureLookup::Found(segment) => Resolution::Found {
                    segment,
                    query: None,
                },
                FeatureLookup::Unknown(id) => Resolution::UnknownFeature(id),
            })
            .collect();
        let scanned_features = resolutions
            .iter()
            .filter_map(Resolution::segment)
            .map(AnnotatedSegment::total_feature_count)
            .sum();
        Ok(ResolveOutcome {
            resolutions,
            window_honoured,
            scanned_features,
        })
    }

    fn maxbins(&self, filter: &FeatureRequestFilter) -> Option<u32> {
        filter
            .maxbins()
            .filter(|_| self.capabilities.supports(Capability::Maxbins))
    }

    fn window(&self, filter: &FeatureRequestFilter) -> Option<RowRange> {
        filter
            .rows()
            .filter(|_| self.capabilities.supports(Capability::RowsForFeature))
    }

    fn ranged(&self, query: &SegmentQuery) -> Option<Coordinates> {
        query
            .coordinates()
            .filter(|_| self.capabilities.supports(Capability::RangeQueries))
    }

    fn fetch(
        &self,
        segment_id: &str,
        ranged: Option<Coordinates>,
        maxbins: Option<u32>,
    ) -> Result<AnnotatedSegment, SourceError> {
        match ranged {
            Some(coordinates) => self
                .backend
                .features_in_range(segment_id, coordinates, maxbins),
            None => self.backend.features(segment_id, maxbins),
        }
    }

    fn fetch_windowed(
        &self,
        segment_id: &str,
        ranged: Option<Coordinates>,
        maxbins: Option<u32>,
        rows: RowRange,
    ) -> Result<Fetched, SourceError> {
        let windowed = match ranged {
            Some(coordinates) => self
                .backend
                .features_in_range_rows(segment_id, coordinates, maxbins, rows),
            None => self.backend.features_in_rows(segment_id, maxbins, rows),
        };
        match windowed {
            Ok(segment) => Ok(Fetched::windowed(segment)),
            Err(error) if error.is_unimplemented() => {
                debug!(
                    target: DISPATCH_TARGET,
                    segment = segment_id,
                    "windowed retrieval unimplemented; trimming locally"
                );
                self.fetch(segment_id, ranged, maxbins)
                    .map(|segment| Fetched::trimmed(segment, rows))
            }
            Err(error) => Err(error),
        }
    }

    fn classify(
        &self,
        query: &SegmentQuery,
        error: SourceError,
        handle_unknown: bool,
    ) -> Result<Resolution, DasError> {
        let resolution = match error {
            SourceError::BadReference { message, .. } if handle_unknown => {
                if self.capabilities.is_reference() {
                    Resolution::Error {
                        query: query.clone(),
                        reason: message,
                    }
                } else {
                    Resolution::Unknown(query.clone())
                }
            }
            SourceError::Coordinate { .. } if handle_unknown => Resolution::Unknown(query.clone()),
            other => return Err(other.into()),
        };
        debug!(
            target: DISPATCH_TARGET,
            segment = query.segment_id(),
            unknown = matches!(resolution, Resolution::Unknown(_)),
            "classified unresolved segment"
        );
        Ok(resolution)
    }
}

struct Fetched {
    segment: AnnotatedSegment,
    honoured: bool,
    dropped: bool,
}

impl Fetched {
    const fn unwindowed(segment: AnnotatedSegment) -> Self {
        Self {
            segment,
            honoured: false,
            dropped: false,
        }
    }

    const fn windowed(segment: AnnotatedSegment) -> Self {
        Self {
            segment,
            honoured: true,
            dropped: false,
        }
    }

    /// Applies `rows` to a segment the backend returned whole.
    fn trimmed(segment: AnnotatedSegment, rows: RowRange) -> Self {
        match trim(&segment, rows) {
            Some(kept) => Self::windowed(kept),
            None => Self::past_window(segment),
        }
    }

    const fn past_window(segment: AnnotatedSegment) -> Self {
        Self {
            segment,
            honoured: false,
            dropped: true,
        }
    }
}

/// Returns `true` when `requested` cannot be answered from an object
/// spanning `bounds`.
///
/// Both coordinates must be positive with `start <= stop`. Known bounds must
/// contain the requested start, and the requested stop must not end before
/// the bounds begin.
pub(crate) fn violates_bounds(requested: Coordinates, bounds: Option<Coordinates>) -> bool {
    if !requested.is_well_formed() {
        return true;
    }
    bounds.is_some_and(|bounds| {
        requested.start < bounds.start
            || requested.start > bounds.stop
            || requested.stop < bounds.start
    })
}
