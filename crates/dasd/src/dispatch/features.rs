//! The `features` command.
//!
//! Segments and feature identifiers are resolved independently, intersected
//! when both are given, windowed when the client asked for rows the backend
//! did not already apply, and finally restricted by the request filter.

use das_types::{AnnotatedSegment, FeatureRequestFilter, RowRange};
use serde::Serialize;
use tracing::debug;

use super::errors::DasError;
use super::merge::{MergeKind, merge_resolutions};
use super::paginate::paginate;
use super::reporter::{SegmentReporter, report};
use super::request::FeaturesQuery;
use super::resolve::{Resolution, ResolveOutcome, Resolver};
use super::router::DISPATCH_TARGET;
use crate::capability::Capability;
use crate::registry::RegisteredSource;
use crate::source::FeatureSearcher;

/// Response to a `features` request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeaturesReport {
    /// One report per found, unknown or failed segment.
    pub segments: Vec<SegmentReporter>,
    /// Whether the client asked for categorised output.
    pub categorize: bool,
    /// Row window the response covers.
    pub rows: Option<RowRange>,
    /// Whether the row window was applied.
    pub paginated: bool,
    /// Features available across the request when a window was applied.
    pub total_features: Option<usize>,
}

impl FeaturesReport {
    fn new(segments: Vec<SegmentReporter>, filter: &FeatureRequestFilter) -> Self {
        Self {
            segments,
            categorize: filter.categorize(),
            rows: filter.rows(),
            paginated: filter.is_paginated(),
            total_features: filter.total_features(),
        }
    }
}

pub(crate) fn handle(
    source: &RegisteredSource,
    searcher: Option<&dyn FeatureSearcher>,
    query: &str,
) -> Result<FeaturesReport, DasError> {
    let FeaturesQuery {
        segments,
        mut filter,
    } = FeaturesQuery::parse(query)?;
    let capabilities = source.capabilities();

    if let Some(searcher) = searcher.filter(|_| {
        capabilities.supports(Capability::AdvancedSearch) && filter.advanced_query().is_some()
    }) {
        debug!(
            target: DISPATCH_TARGET,
            source = source.id(),
            "delegating features request to the search index"
        );
        let resolutions = searcher
            .search(source.id(), &filter)?
            .into_iter()
            .map(|segment| Resolution::Found {
                segment,
                query: None,
            })
            .collect();
        return Ok(FeaturesReport::new(
            report(resolutions, &segments, &filter),
            &filter,
        ));
    }

    let resolver = Resolver::for_source(source);
    let by_segment = if segments.is_empty() {
        None
    } else {
        Some(resolver.segments(&segments, &filter, true)?)
    };
    let by_feature =
        if filter.feature_ids().is_empty() || !capabilities.supports(Capability::FeatureById) {
            None
        } else {
            Some(resolver.feature_ids(&filter)?)
        };

    let outcome = match (by_segment, by_feature) {
        (Some(left), Some(right)) => {
            let resolutions =
                merge_resolutions(left.resolutions, right.resolutions, MergeKind::And)?;
            let scanned_features = resolutions
                .iter()
                .filter_map(Resolution::segment)
                .map(AnnotatedSegment::total_feature_count)
                .sum();
            ResolveOutcome {
                resolutions,
                window_honoured: left.window_honoured || right.window_honoured,
                scanned_features,
            }
        }
        (Some(outcome), None) | (None, Some(outcome)) => outcome,
        (None, None) => {
            return Err(DasError::bad_arguments(
                "features needs a segment, or a feature_id the source can look up",
            ));
        }
    };

    let resolutions = apply_window(outcome, &mut filter);
    Ok(FeaturesReport::new(
        report(resolutions, &segments, &filter),
        &filter,
    ))
}

fn apply_window(outcome: ResolveOutcome, filter: &mut FeatureRequestFilter) -> Vec<Resolution> {
    let ResolveOutcome {
        resolutions,
        window_honoured,
        scanned_features,
    } = outcome;
    let Some(rows) = filter.rows() else {
        return resolutions;
    };
    filter.mark_paginated();
    if window_honoured {
        filter.set_total_features(scanned_features);
        return resolutions;
    }
    debug!(
        target: DISPATCH_TARGET,
        rows = %rows,
        "no backend applied the row window; paginating"
    );
    let paginated = paginate(resolutions, rows);
    filter.set_total_features(paginated.total_features);
    paginated.resolutions
}

#[cfg(test)]
mod tests;
