//! Shared fixtures: a scripted backend that records every call it receives.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, Mutex};

use das_config::{DataSourceConfig, ServerConfig};
use das_types::{
    AnnotatedSegment, Coordinates, Feature, FeatureRequestFilter, FeatureType, RowRange,
};
use mockall::mock;

use crate::capability::Capability;
use crate::registry::SourceRegistry;
use crate::source::{AnnotationSource, FeatureLookup, FeatureSearcher, SourceError};

mock! {
    pub Searcher {}
    impl FeatureSearcher for Searcher {
        fn search(
            &self,
            source_id: &str,
            filter: &FeatureRequestFilter,
        ) -> Result<Vec<AnnotatedSegment>, SourceError>;
    }
}

pub(crate) const VERSION: &str = "36";

/// Builds a server configuration listing `source` and a registry holding
/// `backend` for it.
pub(crate) fn registry_with(
    source: DataSourceConfig,
    backend: Arc<dyn AnnotationSource>,
) -> (ServerConfig, SourceRegistry) {
    let id = source.id.clone();
    let config = ServerConfig {
        data_sources: vec![source],
        ..ServerConfig::default()
    };
    let registry = SourceRegistry::builder(&config)
        .register(&id, backend)
        .expect("configured source")
        .build()
        .expect("valid registry");
    (config, registry)
}

/// Builds a feature of type `exon` spanning `start..=stop`.
pub(crate) fn feature(id: &str, start: i64, stop: i64) -> Feature {
    let kind = FeatureType::new("exon")
        .expect("valid type")
        .with_category("transcription");
    Feature::new(id, kind, start, stop)
}

/// Builds a bounded segment carrying `count` features named `<id>f<n>`.
pub(crate) fn segment(id: &str, start: i64, stop: i64, count: usize) -> AnnotatedSegment {
    let features = (1..=count).map(|n| {
        let offset = i64::try_from(n).expect("small count");
        feature(&format!("{id}f{n}"), start + offset - 1, start + offset - 1)
    });
    AnnotatedSegment::builder(id, VERSION)
        .bounds(start, stop)
        .features(features)
        .build()
        .expect("valid segment")
}

/// Builds a bounded segment carrying exactly the named features.
pub(crate) fn segment_with(id: &str, start: i64, stop: i64, ids: &[&str]) -> AnnotatedSegment {
    AnnotatedSegment::builder(id, VERSION)
        .bounds(start, stop)
        .features(ids.iter().map(|fid| feature(fid, start, start)))
        .build()
        .expect("valid segment")
}

/// Keeps rows `rows` of `segment`, reporting the full count as the total.
pub(crate) fn window(segment: &AnnotatedSegment, rows: RowRange) -> AnnotatedSegment {
    let total = segment.total_feature_count();
    let kept = segment
        .reportable_features()
        .into_iter()
        .skip(rows.start() - 1)
        .take(rows.len())
        .cloned()
        .collect();
    segment.with_features(kept, Some(total))
}

/// Backend whose behaviour is scripted per segment and which records calls
/// as `method:segment` strings.
#[derive(Default)]
pub(crate) struct RecordingSource {
    segments: HashMap<String, AnnotatedSegment>,
    coordinate_rejections: HashSet<String>,
    broken: HashSet<String>,
    refused_rows: HashSet<String>,
    declared: Vec<Capability>,
    windowed: bool,
    ranged: bool,
    by_id: bool,
    calls: Mutex<Vec<String>>,
}

impl RecordingSource {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_segment(mut self, segment: AnnotatedSegment) -> Self {
        self.segments
            .insert(segment.segment_id().to_owned(), segment);
        self
    }

    pub(crate) fn rejecting_coordinates(mut self, segment_id: &str) -> Self {
        self.coordinate_rejections.insert(segment_id.to_owned());
        self
    }

    pub(crate) fn broken(mut self, segment_id: &str) -> Self {
        self.broken.insert(segment_id.to_owned());
        self
    }

    /// Answers windowed calls for `segment_id` as unimplemented even when
    /// the source is otherwise windowed.
    pub(crate) fn refusing_rows(mut self, segment_id: &str) -> Self {
        self.refused_rows.insert(segment_id.to_owned());
        self
    }

    pub(crate) fn declaring(mut self, capabilities: &[Capability]) -> Self {
        self.declared = capabilities.to_vec();
        self
    }

    pub(crate) const fn windowed(mut self) -> Self {
        self.windowed = true;
        self
    }

    pub(crate) const fn ranged(mut self) -> Self {
        self.ranged = true;
        self
    }

    pub(crate) const fn by_id(mut self) -> Self {
        self.by_id = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    fn record(&self, method: &str, target: &str) {
        self.calls
            .lock()
            .expect("calls lock")
            .push(format!("{method}:{target}"));
    }

    fn lookup(&self, segment_id: &str) -> Result<AnnotatedSegment, SourceError> {
        if self.broken.contains(segment_id) {
            return Err(SourceError::failure("backend offline"));
        }
        self.segments
            .get(segment_id)
            .cloned()
            .ok_or_else(|| SourceError::bad_reference(segment_id, "no such segment"))
    }

    fn lookup_ranged(&self, segment_id: &str) -> Result<AnnotatedSegment, SourceError> {
        if self.coordinate_rejections.contains(segment_id) {
            return Err(SourceError::coordinate(segment_id, "rejected"));
        }
        self.lookup(segment_id)
    }

    fn lookup_ids(&self, feature_ids: &BTreeSet<String>) -> Vec<FeatureLookup> {
        feature_ids
            .iter()
            .map(|id| {
                let mut holders: Vec<&AnnotatedSegment> = self
                    .segments
                    .values()
                    .filter(|segment| segment.find_feature(id).is_some())
                    .collect();
                holders.sort_by(|a, b| a.segment_id().cmp(b.segment_id()));
                match holders.first() {
                    Some(segment) => {
                        let matched = segment.find_feature(id).cloned().into_iter().collect();
                        FeatureLookup::Found(segment.with_features(matched, None))
                    }
                    None => FeatureLookup::Unknown(id.clone()),
                }
            })
            .collect()
    }
}

impl AnnotationSource for RecordingSource {
    fn capabilities(&self) -> Vec<Capability> {
        self.declared.clone()
    }

    fn features(
        &self,
        segment_id: &str,
        _maxbins: Option<u32>,
    ) -> Result<AnnotatedSegment, SourceError> {
        self.record("features", segment_id);
        self.lookup(segment_id)
    }

    fn features_in_rows(
        &self,
        segment_id: &str,
        _maxbins: Option<u32>,
        rows: RowRange,
    ) -> Result<AnnotatedSegment, SourceError> {
        self.record("features_in_rows", segment_id);
        if !self.windowed || self.refused_rows.contains(segment_id) {
            return Err(SourceError::unimplemented("features_in_rows"));
        }
        self.lookup(segment_id).map(|segment| window(&segment, rows))
    }

    fn features_in_range(
        &self,
        segment_id: &str,
        _coordinates: Coordinates,
        _maxbins: Option<u32>,
    ) -> Result<AnnotatedSegment, SourceError> {
        self.record("features_in_range", segment_id);
        if !self.ranged {
            return Err(SourceError::unimplemented("features_in_range"));
        }
        self.lookup_ranged(segment_id)
    }

    fn features_in_range_rows(
        &self,
        segment_id: &str,
        _coordinates: Coordinates,
        _maxbins: Option<u32>,
        rows: RowRange,
    ) -> Result<AnnotatedSegment, SourceError> {
        self.record("features_in_range_rows", segment_id);
        if !(self.ranged && self.windowed) {
            return Err(SourceError::unimplemented("features_in_range_rows"));
        }
        self.lookup_ranged(segment_id)
            .map(|segment| window(&segment, rows))
    }

    fn features_by_id(
        &self,
        feature_ids: &BTreeSet<String>,
        _maxbins: Option<u32>,
    ) -> Result<Vec<FeatureLookup>, SourceError> {
        self.record("features_by_id", &feature_ids.len().to_string());
        if !self.by_id {
            return Err(SourceError::unimplemented("features_by_id"));
        }
        Ok(self.lookup_ids(feature_ids))
    }

    fn types(&self) -> Result<Vec<FeatureType>, SourceError> {
        self.record("types", "*");
        Ok(vec![FeatureType::new("exon").expect("valid type")])
    }
}
