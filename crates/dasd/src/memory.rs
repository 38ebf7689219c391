//! In-memory data source.
//!
//! [`InMemorySource`] answers every optional operation from data held in
//! memory. Which operations the dispatcher relies on is still governed by the
//! capabilities the source is built with, so one instance can stand in for a
//! plain, range-capable or window-capable backend.

use std::collections::{BTreeSet, HashMap};

use das_types::{
    AnnotatedSegment, Coordinates, EntryPoint, Feature, FeatureType, RowRange, Sequence,
};
use url::Url;

use crate::capability::Capability;
use crate::source::{
    AlignmentQuery, AnnotationSource, ExternalDocument, FeatureLookup, LinkField, SourceError,
    StructureQuery,
};

/// Data source backed by in-memory collections.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    capabilities: Vec<Capability>,
    segments: Vec<AnnotatedSegment>,
    sequences: HashMap<String, Sequence>,
    types: Vec<FeatureType>,
    entry_points: Vec<EntryPoint>,
    entry_point_version: Option<String>,
    link_base: Option<Url>,
    structures: HashMap<String, ExternalDocument>,
    alignments: HashMap<String, ExternalDocument>,
}

impl InMemorySource {
    /// Creates an empty source declaring no capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares the optional operations the dispatcher may use.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    /// Adds an annotated segment, replacing one with the same identifier.
    #[must_use]
    pub fn with_segment(mut self, segment: AnnotatedSegment) -> Self {
        self.segments
            .retain(|held| held.segment_id() != segment.segment_id());
        self.segments.push(segment);
        self
    }

    /// Adds a reference sequence.
    #[must_use]
    pub fn with_sequence(mut self, sequence: Sequence) -> Self {
        self.sequences
            .insert(sequence.segment_id().to_owned(), sequence);
        self
    }

    /// Lists a feature type explicitly. Without any, the types in use are
    /// listed.
    #[must_use]
    pub fn with_type(mut self, feature_type: FeatureType) -> Self {
        self.types.push(feature_type);
        self
    }

    /// Adds an entry point.
    #[must_use]
    pub fn with_entry_point(mut self, entry_point: EntryPoint) -> Self {
        self.entry_points.push(entry_point);
        self
    }

    /// Sets the version reported for the entry point listing.
    #[must_use]
    pub fn with_entry_point_version(mut self, version: impl Into<String>) -> Self {
        self.entry_point_version = Some(version.into());
        self
    }

    /// Resolves `link` requests to `<base><field>/<id>`.
    #[must_use]
    pub fn with_link_base(mut self, base: Url) -> Self {
        self.link_base = Some(base);
        self
    }

    /// Adds a structure document under `id`.
    #[must_use]
    pub fn with_structure(mut self, id: impl Into<String>, document: ExternalDocument) -> Self {
        self.structures.insert(id.into(), document);
        self
    }

    /// Adds an alignment document under `id`.
    #[must_use]
    pub fn with_alignment(mut self, id: impl Into<String>, document: ExternalDocument) -> Self {
        self.alignments.insert(id.into(), document);
        self
    }

    fn segment(&self, segment_id: &str) -> Result<&AnnotatedSegment, SourceError> {
        self.segments
            .iter()
            .find(|segment| segment.segment_id() == segment_id)
            .ok_or_else(|| SourceError::bad_reference(segment_id, "segment is not annotated"))
    }

    fn ranged(
        &self,
        segment_id: &str,
        coordinates: Coordinates,
    ) -> Result<AnnotatedSegment, SourceError> {
        let segment = self.segment(segment_id)?;
        if let Some(bounds) = segment.bounds() {
            if coordinates.start > bounds.stop || coordinates.stop < bounds.start {
                return Err(SourceError::coordinate(
                    segment_id,
                    format!("{}-{} lies outside the segment", coordinates.start, coordinates.stop),
                ));
            }
        }
        let features = segment
            .features_in_range(coordinates.start, coordinates.stop)
            .into_iter()
            .cloned()
            .collect();
        Ok(segment.with_features(features, None))
    }

    fn lookup(&self, feature_ids: &BTreeSet<String>) -> Vec<FeatureLookup> {
        let mut matched: Vec<(usize, Vec<Feature>)> = Vec::new();
        let mut unknown = Vec::new();
        for id in feature_ids {
            let hit = self
                .segments
                .iter()
                .enumerate()
                .find_map(|(index, segment)| segment.find_feature(id).map(|f| (index, f.clone())));
            match hit {
                Some((index, feature)) => match matched.iter_mut().find(|(i, _)| *i == index) {
                    Some((_, features)) => features.push(feature),
                    None => matched.push((index, vec![feature])),
                },
                None => unknown.push(FeatureLookup::Unknown(id.clone())),
            }
        }
        matched.sort_by_key(|(index, _)| *index);
        matched
            .into_iter()
            .filter_map(|(index, features)| {
                self.segments
                    .get(index)
                    .map(|segment| FeatureLookup::Found(segment.with_features(features, None)))
            })
            .chain(unknown)
            .collect()
    }
}

/// Keeps rows `rows` of `segment`, reporting the untrimmed count as total.
fn window(segment: &AnnotatedSegment, rows: RowRange) -> AnnotatedSegment {
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

impl AnnotationSource for InMemorySource {
    fn capabilities(&self) -> Vec<Capability> {
        self.capabilities.clone()
    }

    fn features(
        &self,
        segment_id: &str,
        _maxbins: Option<u32>,
    ) -> Result<AnnotatedSegment, SourceError> {
        self.segment(segment_id).cloned()
    }

    fn features_in_rows(
        &self,
        segment_id: &str,
        _maxbins: Option<u32>,
        rows: RowRange,
    ) -> Result<AnnotatedSegment, SourceError> {
        self.segment(segment_id)
            .map(|segment| window(segment, rows))
    }

    fn features_in_range(
        &self,
        segment_id: &str,
        coordinates: Coordinates,
        _maxbins: Option<u32>,
    ) -> Result<AnnotatedSegment, SourceError> {
        self.ranged(segment_id, coordinates)
    }

    fn features_in_range_rows(
        &self,
        segment_id: &str,
        coordinates: Coordinates,
        _maxbins: Option<u32>,
        rows: RowRange,
    ) -> Result<AnnotatedSegment, SourceError> {
        self.ranged(segment_id, coordinates)
            .map(|segment| window(&segment, rows))
    }

    fn features_by_id(
        &self,
        feature_ids: &BTreeSet<String>,
        _maxbins: Option<u32>,
    ) -> Result<Vec<FeatureLookup>, SourceError> {
        Ok(self.lookup(feature_ids))
    }

    fn features_by_id_in_rows(
        &self,
        feature_ids: &BTreeSet<String>,
        _maxbins: Option<u32>,
        rows: RowRange,
    ) -> Result<Vec<FeatureLookup>, SourceError> {
        let mut offset = 0_usize;
        let mut windowed = Vec::new();
        for lookup in self.lookup(feature_ids) {
            let FeatureLookup::Found(segment) = lookup else {
                windowed.push(lookup);
                continue;
            };
            let count = segment.total_feature_count();
            match rows.relative_to(offset) {
                Some(relative) if relative.start() <= count => {
                    windowed.push(FeatureLookup::Found(window(&segment, relative)));
                }
                _ => {}
            }
            offset += count;
        }
        Ok(windowed)
    }

    fn types(&self) -> Result<Vec<FeatureType>, SourceError> {
        if !self.types.is_empty() {
            return Ok(self.types.clone());
        }
        let in_use: BTreeSet<FeatureType> = self
            .segments
            .iter()
            .flat_map(AnnotatedSegment::reportable_features)
            .map(|feature| feature.feature_type.clone())
            .collect();
        Ok(in_use.into_iter().collect())
    }

    fn total_count_for_type(&self, feature_type: &FeatureType) -> Result<usize, SourceError> {
        Ok(self
            .segments
            .iter()
            .flat_map(AnnotatedSegment::reportable_features)
            .filter(|feature| feature.feature_type.id() == feature_type.id())
            .count())
    }

    fn sequence(&self, segment_id: &str) -> Result<Sequence, SourceError> {
        self.sequences
            .get(segment_id)
            .cloned()
            .ok_or_else(|| SourceError::bad_reference(segment_id, "no sequence held"))
    }

    fn sequence_in_range(
        &self,
        segment_id: &str,
        coordinates: Coordinates,
    ) -> Result<Sequence, SourceError> {
        let sequence = self.sequence(segment_id)?;
        let stop = coordinates.stop.min(sequence.stop());
        sequence
            .subsequence(coordinates.start, stop)
            .ok_or_else(|| {
                SourceError::coordinate(
                    segment_id,
                    format!("{}-{} lies outside the sequence", coordinates.start, coordinates.stop),
                )
            })
    }

    fn total_entry_points(&self) -> Result<usize, SourceError> {
        Ok(self.entry_points.len())
    }

    fn entry_points(&self, start: usize, stop: usize) -> Result<Vec<EntryPoint>, SourceError> {
        let from = start.saturating_sub(1);
        let to = stop.min(self.entry_points.len());
        Ok(self
            .entry_points
            .get(from..to)
            .map(<[EntryPoint]>::to_vec)
            .unwrap_or_default())
    }

    fn entry_point_version(&self) -> Result<Option<String>, SourceError> {
        Ok(self.entry_point_version.clone())
    }

    fn link_url(&self, field: LinkField, id: &str) -> Result<Url, SourceError> {
        let base = self
            .link_base
            .as_ref()
            .ok_or(SourceError::unimplemented("link_url"))?;
        base.join(&format!("{field}/{id}"))
            .map_err(|error| SourceError::failure_with_source("cannot build link", error))
    }

    fn structure(&self, query: &StructureQuery) -> Result<ExternalDocument, SourceError> {
        self.structures
            .get(&query.query)
            .cloned()
            .ok_or_else(|| SourceError::bad_reference(&query.query, "structure not held"))
    }

    fn alignment(&self, query: &AlignmentQuery) -> Result<ExternalDocument, SourceError> {
        self.alignments
            .get(&query.query)
            .cloned()
            .ok_or_else(|| SourceError::bad_reference(&query.query, "alignment not held"))
    }
}
