//! Features command tests.

use std::sync::Arc;

use das_config::DataSourceConfig;
use rstest::rstest;

use super::*;
use crate::capability::Capability;
use crate::dispatch::errors::DasStatus;
use crate::registry::SourceRegistry;
use crate::tests::support::{MockSearcher, RecordingSource, registry_with, segment_with};

const SOURCE: &str = "genes";

fn registry(backend: RecordingSource) -> (Arc<RecordingSource>, SourceRegistry) {
    let backend = Arc::new(backend);
    let (_, registry) = registry_with(DataSourceConfig::new(SOURCE), backend.clone());
    (backend, registry)
}

fn run(registry: &SourceRegistry, query: &str) -> Result<FeaturesReport, DasError> {
    let source = registry.get(SOURCE).expect("registered source");
    handle(source, None, query)
}

fn layout(report: &FeaturesReport) -> Vec<(String, Vec<String>)> {
    report
        .segments
        .iter()
        .map(|reporter| match reporter {
            SegmentReporter::Found(found) => (
                found.segment_id.clone(),
                found
                    .features
                    .iter()
                    .map(|feature| feature.feature_id.clone())
                    .collect(),
            ),
            other => (format!("marker:{}", other.id()), Vec::new()),
        })
        .collect()
}

fn entry(id: &str, features: &[&str]) -> (String, Vec<String>) {
    (
        id.to_owned(),
        features.iter().map(|f| (*f).to_owned()).collect(),
    )
}

fn two_segments() -> RecordingSource {
    RecordingSource::new()
        .with_segment(segment_with("S1", 1, 100, &["a", "b", "c"]))
        .with_segment(segment_with("S2", 1, 100, &["d", "e"]))
}

#[test]
fn paginates_when_no_backend_honours_rows() {
    let (_, registry) = registry(two_segments());

    let report = run(&registry, "segment=S1;segment=S2;rows=2-4").expect("features");

    assert_eq!(
        layout(&report),
        [entry("S1", &["b", "c"]), entry("S2", &["d"])]
    );
    assert!(report.paginated);
    assert_eq!(report.total_features, Some(5));
    let totals: Vec<usize> = report
        .segments
        .iter()
        .filter_map(SegmentReporter::as_found)
        .map(|found| found.total_features)
        .collect();
    assert_eq!(totals, [3, 2]);
}

#[test]
fn trusts_a_backend_that_honours_rows() {
    let (backend, registry) = registry(
        two_segments()
            .windowed()
            .declaring(&[Capability::RowsForFeature]),
    );

    let report = run(&registry, "segment=S1;segment=S2;rows=2-4").expect("features");

    assert_eq!(
        layout(&report),
        [entry("S1", &["b", "c"]), entry("S2", &["d"])]
    );
    assert!(report.paginated);
    assert_eq!(report.total_features, Some(5));
    assert_eq!(
        backend.calls(),
        ["features_in_rows:S1", "features_in_rows:S2"]
    );
}

#[test]
fn windows_rows_when_the_declared_capability_is_unimplemented() {
    let (backend, registry) = registry(
        RecordingSource::new()
            .declaring(&[Capability::RowsForFeature])
            .with_segment(segment_with("S1", 1, 100, &["a", "b", "c", "d", "e"]))
            .with_segment(segment_with("S2", 1, 100, &["f", "g"])),
    );

    let report = run(&registry, "segment=S1;segment=S2;rows=1-2").expect("features");

    assert_eq!(layout(&report), [entry("S1", &["a", "b"])]);
    assert!(report.paginated);
    assert_eq!(report.total_features, Some(7));
    assert_eq!(
        backend.calls(),
        ["features_in_rows:S1", "features:S1", "features:S2"]
    );
}

#[test]
fn windows_rows_across_windowed_and_refusing_segments() {
    let (backend, registry) = registry(
        two_segments()
            .windowed()
            .refusing_rows("S2")
            .declaring(&[Capability::RowsForFeature]),
    );

    let report = run(&registry, "segment=S1;segment=S2;rows=2-4").expect("features");

    assert_eq!(
        layout(&report),
        [entry("S1", &["b", "c"]), entry("S2", &["d"])]
    );
    assert!(report.paginated);
    assert_eq!(report.total_features, Some(5));
    assert_eq!(
        backend.calls(),
        ["features_in_rows:S1", "features_in_rows:S2", "features:S2"]
    );
}

#[test]
fn ignores_segment_fragments_without_a_full_range() {
    let (backend, registry) = registry(two_segments());

    let report = run(&registry, "segment=S1;segment=S2:5").expect("features");

    assert_eq!(layout(&report), [entry("S1", &["a", "b", "c"])]);
    assert_eq!(backend.calls(), ["features:S1"]);
}

#[test]
fn intersects_segment_and_identifier_results() {
    let (_, registry) = registry(
        RecordingSource::new()
            .by_id()
            .declaring(&[Capability::FeatureById])
            .with_segment(segment_with("A", 1, 100, &["f1", "f2"]))
            .with_segment(segment_with("B", 1, 100, &["f3"])),
    );

    let report = run(&registry, "segment=A;segment=B;feature_id=f2").expect("features");

    assert_eq!(layout(&report), [entry("A", &["f2"])]);
}

#[test]
fn reports_unknown_segments_and_identifiers() {
    let (_, registry) = registry(
        RecordingSource::new()
            .by_id()
            .declaring(&[Capability::FeatureById])
            .with_segment(segment_with("A", 1, 100, &["f1"])),
    );

    let by_segment = run(&registry, "segment=A;segment=nowhere").expect("features");
    let by_id = run(&registry, "feature_id=ghost").expect("features");

    assert_eq!(
        layout(&by_segment),
        [entry("A", &["f1"]), entry("marker:nowhere", &[])]
    );
    assert!(matches!(
        by_id.segments.as_slice(),
        [SegmentReporter::UnknownFeature { feature_id }] if feature_id == "ghost"
    ));
}

#[rstest]
#[case::nothing_to_resolve("type=exon")]
#[case::identifiers_without_capability("feature_id=f1")]
#[case::empty("")]
fn rejects_requests_with_nothing_to_resolve(#[case] query: &str) {
    let (_, registry) = registry(two_segments());
    let error = run(&registry, query).expect_err("bad arguments");
    assert_eq!(error.status(), DasStatus::BadCommandArguments);
}

#[test]
fn filters_reported_features_by_type() {
    let (_, registry) = registry(two_segments());
    let report = run(&registry, "segment=S1;type=snp").expect("features");
    assert_eq!(layout(&report), [entry("S1", &[])]);
    assert!(!report.paginated);
    assert_eq!(report.total_features, None);
}

#[test]
fn delegates_advanced_queries_to_the_searcher() {
    let (backend, registry) = registry(
        two_segments().declaring(&[Capability::AdvancedSearch]),
    );
    let mut searcher = MockSearcher::new();
    searcher
        .expect_search()
        .once()
        .return_once(|source_id, filter| {
            assert_eq!(source_id, SOURCE);
            assert_eq!(filter.advanced_query(), Some("gene:BRCA2"));
            Ok(vec![segment_with("S9", 1, 10, &["hit"])])
        });
    let source = registry.get(SOURCE).expect("registered source");

    let searcher: &dyn FeatureSearcher = &searcher;

    let report =
        handle(source, Some(searcher), "segment=S1;query=gene:BRCA2").expect("features");

    assert_eq!(layout(&report), [entry("S9", &["hit"])]);
    assert!(backend.calls().is_empty());
}

#[test]
fn ignores_the_searcher_without_the_capability() {
    let (backend, registry) = registry(two_segments());
    let mut searcher = MockSearcher::new();
    searcher.expect_search().never();
    let source = registry.get(SOURCE).expect("registered source");

    let searcher: &dyn FeatureSearcher = &searcher;

    let report =
        handle(source, Some(searcher), "segment=S1;query=gene:BRCA2").expect("features");

    assert_eq!(layout(&report), [entry("S1", &["a", "b", "c"])]);
    assert_eq!(backend.calls(), ["features:S1"]);
}
