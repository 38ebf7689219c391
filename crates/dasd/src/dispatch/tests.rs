//! End-to-end dispatch over an in-memory data source.

use std::sync::Arc;

use das_config::DataSourceConfig;
use das_types::{EntryPoint, Sequence};
use rstest::rstest;
use serde_json::json;
use url::Url;

use super::*;
use crate::capability::Capability;
use crate::memory::InMemorySource;
use crate::tests::support::{registry_with, segment};

const SOURCE: &str = "genes";

fn dispatcher(config: DataSourceConfig, backend: InMemorySource) -> Dispatcher {
    let (server, registry) = registry_with(config, Arc::new(backend));
    Dispatcher::new(Arc::new(server), Arc::new(registry))
}

fn annotated() -> InMemorySource {
    InMemorySource::new()
        .with_segment(segment("A", 1, 100, 4))
        .with_segment(segment("B", 200, 300, 2))
}

fn reference() -> InMemorySource {
    InMemorySource::new()
        .with_capabilities([Capability::Sequence])
        .with_sequence(Sequence::new("chr1", "1", "ACGTACGT").expect("valid sequence"))
}

fn run(dispatcher: &Dispatcher, command: &str, query: &str) -> Result<CommandResponse, DasError> {
    dispatcher.dispatch(&CommandRequest::for_source(SOURCE, command, query))
}

fn status_of(result: Result<CommandResponse, DasError>) -> u16 {
    result.expect_err("command should fail").status().code()
}

#[rstest]
#[case::unknown_command("writeback", SOURCE, 400)]
#[case::unknown_source("features", "nowhere", 401)]
fn rejects_unroutable_requests(#[case] command: &str, #[case] dsn: &str, #[case] code: u16) {
    let dispatcher = dispatcher(DataSourceConfig::new(SOURCE), annotated());
    let result = dispatcher.dispatch(&CommandRequest::for_source(dsn, command, "segment=A"));
    assert_eq!(status_of(result), code);
}

#[test]
fn source_commands_need_a_source() {
    let dispatcher = dispatcher(DataSourceConfig::new(SOURCE), annotated());
    let result = dispatcher.dispatch(&CommandRequest::for_server("features", "segment=A"));
    assert_eq!(status_of(result), 401);
}

#[test]
fn lists_registered_sources() {
    let mut config = DataSourceConfig::new(SOURCE);
    config.name = Some("Gene models".into());
    config.version = Some("36".into());
    let dispatcher = dispatcher(config, annotated());

    let response = dispatcher
        .dispatch(&CommandRequest::from_path("/das/dsn", None).expect("valid path"))
        .expect("dsn answers");

    let CommandResponse::Dsn(entries) = response else {
        panic!("expected a dsn listing");
    };
    assert_eq!(
        entries,
        [DsnEntry {
            id: SOURCE.into(),
            version: "36".into(),
            name: "Gene models".into(),
            mapmaster: None,
            description: None,
        }]
    );
}

#[test]
fn dsn_takes_no_arguments() {
    let dispatcher = dispatcher(DataSourceConfig::new(SOURCE), annotated());
    let result = dispatcher.dispatch(&CommandRequest::for_server("dsn", "segment=A"));
    assert_eq!(status_of(result), 402);
}

#[test]
fn prefers_the_source_stylesheet() {
    let mut config = DataSourceConfig::new(SOURCE);
    config.stylesheet = Some("genes.xml".into());
    let dispatcher = dispatcher(config, annotated());

    let response = run(&dispatcher, "stylesheet", "").expect("stylesheet answers");

    assert_eq!(response, CommandResponse::Stylesheet("genes.xml".into()));
    assert_eq!(
        serde_json::to_value(&response).expect("serializable"),
        json!({"command": "stylesheet", "body": "genes.xml"})
    );
}

#[test]
fn falls_back_to_the_server_stylesheet() {
    let (mut server, registry) =
        registry_with(DataSourceConfig::new(SOURCE), Arc::new(annotated()));
    server.default_stylesheet = Some("default.xml".into());
    let dispatcher = Dispatcher::new(Arc::new(server), Arc::new(registry));

    let response = run(&dispatcher, "stylesheet", "").expect("stylesheet answers");

    assert_eq!(response, CommandResponse::Stylesheet("default.xml".into()));
}

#[test]
fn reports_a_missing_stylesheet() {
    let dispatcher = dispatcher(DataSourceConfig::new(SOURCE), annotated());
    assert_eq!(status_of(run(&dispatcher, "stylesheet", "")), 404);
}

#[test]
fn resolves_links() {
    let base = Url::parse("https://example.org/das/").expect("valid url");
    let dispatcher = dispatcher(
        DataSourceConfig::new(SOURCE),
        annotated().with_link_base(base),
    );

    let response = run(&dispatcher, "link", "field=feature;id=Af1").expect("link answers");

    let CommandResponse::Link(url) = response else {
        panic!("expected a link");
    };
    assert_eq!(url.as_str(), "https://example.org/das/feature/Af1");
}

#[test]
fn links_are_unimplemented_without_a_base() {
    let dispatcher = dispatcher(DataSourceConfig::new(SOURCE), annotated());
    assert_eq!(status_of(run(&dispatcher, "link", "field=type;id=exon")), 501);
}

#[test]
fn structure_requires_the_capability() {
    let document = json!({"pdb": "1abc"});
    let backend = annotated().with_structure("1abc", document.clone());

    let plain = dispatcher(DataSourceConfig::new(SOURCE), backend.clone());
    assert_eq!(status_of(run(&plain, "structure", "query=1abc")), 501);

    let capable = dispatcher(
        DataSourceConfig::new(SOURCE),
        backend.with_capabilities([Capability::Structure]),
    );
    let response = run(&capable, "structure", "query=1abc").expect("structure answers");
    assert_eq!(response, CommandResponse::Structure(document));
}

#[test]
fn alignment_passes_the_document_through() {
    let mut config = DataSourceConfig::new(SOURCE);
    config.capabilities = vec!["das1:alignment".into()];
    let document = json!({"rows": 2});
    let dispatcher = dispatcher(config, annotated().with_alignment("aln1", document.clone()));

    let response =
        run(&dispatcher, "alignment", "query=aln1;rows=1-2").expect("alignment answers");

    assert_eq!(response, CommandResponse::Alignment(document));
}

#[test]
fn sequence_needs_a_reference_source() {
    let dispatcher = dispatcher(DataSourceConfig::new(SOURCE), annotated());
    assert_eq!(status_of(run(&dispatcher, "sequence", "segment=A")), 501);
}

#[test]
fn serves_sequence_windows() {
    let dispatcher = dispatcher(DataSourceConfig::new(SOURCE), reference());

    let response =
        run(&dispatcher, "sequence", "segment=chr1:3,6;segment=chr1:10,12;segment=chrX")
            .expect("sequence answers");

    let CommandResponse::Sequence(reports) = response else {
        panic!("expected sequences");
    };
    let summary: Vec<String> = reports
        .iter()
        .map(|report| match report {
            SequenceReporter::Found { sequence } => sequence.residues().to_owned(),
            SequenceReporter::Error { reason, .. } => format!("error: {reason}"),
        })
        .collect();
    assert_eq!(
        summary,
        [
            "GTAC".to_owned(),
            format!("error: {}", resolve::OUT_OF_BOUNDS),
            "error: no sequence held".to_owned(),
        ]
    );
}

#[rstest]
#[case::disabled(false, true)]
#[case::enabled(true, false)]
fn dna_follows_the_source_setting(#[case] enabled: bool, #[case] rejected: bool) {
    let mut config = DataSourceConfig::new(SOURCE);
    config.dna_command_enabled = enabled;
    let dispatcher = dispatcher(config, reference());

    let result = run(&dispatcher, "dna", "segment=chr1");

    assert_eq!(result.is_err(), rejected);
}

fn chromosomes(count: usize) -> InMemorySource {
    (1..=count).fold(InMemorySource::new(), |source, n| {
        source.with_entry_point(EntryPoint::new(format!("chr{n}")))
    })
}

#[test]
fn clamps_entry_point_windows() {
    let mut config = DataSourceConfig::new(SOURCE);
    config.max_entry_points = Some(2);
    let dispatcher = dispatcher(config, chromosomes(5).with_entry_point_version("7"));

    let response = run(&dispatcher, "entry_points", "rows=2-9").expect("entry points answer");

    let CommandResponse::EntryPoints(report) = response else {
        panic!("expected entry points");
    };
    assert_eq!((report.total, report.start, report.end), (5, 2, 3));
    let ids: Vec<&str> = report
        .entry_points
        .iter()
        .map(|entry| entry.segment_id.as_str())
        .collect();
    assert_eq!(ids, ["chr2", "chr3"]);
    assert_eq!(report.version, "7");
}

#[rstest]
#[case::past_the_end("rows=6-7", 402)]
#[case::malformed("rows=a-b", 402)]
fn rejects_bad_entry_point_windows(#[case] query: &str, #[case] code: u16) {
    let dispatcher = dispatcher(
        DataSourceConfig::new(SOURCE),
        chromosomes(5).with_entry_point_version("7"),
    );
    assert_eq!(status_of(run(&dispatcher, "entry_points", query)), code);
}

#[test]
fn entry_points_need_a_version() {
    let dispatcher = dispatcher(DataSourceConfig::new(SOURCE), chromosomes(3));
    assert_eq!(status_of(run(&dispatcher, "entry_points", "")), 500);
}

#[test]
fn summarises_types_across_the_source() {
    let dispatcher = dispatcher(DataSourceConfig::new(SOURCE), annotated());

    let response = run(&dispatcher, "types", "").expect("types answer");

    let CommandResponse::Types(TypesReport::Source { types }) = response else {
        panic!("expected a source summary");
    };
    let counts: Vec<(&str, Option<usize>)> = types
        .iter()
        .map(|entry| (entry.feature_type.id(), entry.count))
        .collect();
    assert_eq!(counts, [("exon", Some(6))]);
}

#[test]
fn counts_types_per_segment() {
    let dispatcher = dispatcher(DataSourceConfig::new(SOURCE), annotated());

    let response = run(&dispatcher, "types", "segment=A:1,2;segment=Z").expect("types answer");

    let CommandResponse::Types(TypesReport::Segments { segments }) = response else {
        panic!("expected per-segment counts");
    };
    match segments.as_slice() {
        [TypesSegment::Found { segment_id, types, .. }, TypesSegment::Unknown { query }] => {
            assert_eq!(segment_id, "A");
            assert_eq!(types.len(), 1);
            assert_eq!(types[0].count, Some(2));
            assert_eq!(query.segment_id(), "Z");
        }
        other => panic!("unexpected segments: {other:?}"),
    }
}

#[test]
fn pages_features_end_to_end() {
    let dispatcher = dispatcher(
        DataSourceConfig::new(SOURCE),
        annotated().with_capabilities([Capability::RowsForFeature]),
    );

    let response =
        run(&dispatcher, "FEATURES", "segment=A;segment=B;rows=4-5").expect("features answer");

    let CommandResponse::Features(report) = response else {
        panic!("expected features");
    };
    let ids: Vec<Vec<String>> = report
        .segments
        .iter()
        .filter_map(SegmentReporter::as_found)
        .map(|found| found.features.iter().map(|f| f.feature_id.clone()).collect())
        .collect();
    assert_eq!(ids, [vec!["Af4".to_owned()], vec!["Bf1".to_owned()]]);
    assert!(report.paginated);
    assert_eq!(report.total_features, Some(6));
}
