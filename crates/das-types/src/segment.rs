//! Annotated segments returned by data sources.

use serde::Serialize;

use crate::component::ComponentTree;
use crate::error::ModelError;
use crate::feature::Feature;
use crate::query::Coordinates;

/// A segment together with the features annotated on it.
///
/// Derived copies produced by trimming or merging are new values built via
/// [`AnnotatedSegment::with_features`]; the original is never altered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedSegment {
    segment_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<i64>,
    version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    segment_type: Option<String>,
    features: Vec<Feature>,
    #[serde(skip)]
    components: Option<ComponentTree>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_features: Option<usize>,
}

impl AnnotatedSegment {
    /// Starts building a segment with the given identifier and version.
    #[must_use]
    pub fn builder(segment_id: impl Into<String>, version: impl Into<String>) -> AnnotatedSegmentBuilder {
        AnnotatedSegmentBuilder {
            segment_id: segment_id.into(),
            version: version.into(),
            bounds: None,
            label: None,
            segment_type: None,
            features: Vec::new(),
            components: None,
            total_features: None,
        }
    }

    /// Segment identifier.
    #[must_use]
    pub fn segment_id(&self) -> &str {
        &self.segment_id
    }

    /// First base of the segment, when known.
    #[must_use]
    pub const fn start(&self) -> Option<i64> {
        self.start
    }

    /// Last base of the segment, when known.
    #[must_use]
    pub const fn stop(&self) -> Option<i64> {
        self.stop
    }

    /// Both bounds, when the segment reports them.
    #[must_use]
    pub fn bounds(&self) -> Option<Coordinates> {
        self.start
            .zip(self.stop)
            .map(|(start, stop)| Coordinates::new(start, stop))
    }

    /// Version string of the annotation.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Segment type, such as `chromosome`.
    #[must_use]
    pub fn segment_type(&self) -> Option<&str> {
        self.segment_type.as_deref()
    }

    /// Plain features, without component features.
    #[must_use]
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Component graph rooted at the segment itself.
    #[must_use]
    pub const fn components(&self) -> Option<&ComponentTree> {
        self.components.as_ref()
    }

    /// Every feature a client sees: plain features followed by the reportable
    /// component features.
    #[must_use]
    pub fn reportable_features(&self) -> Vec<&Feature> {
        let mut all: Vec<&Feature> = self.features.iter().collect();
        if let Some(tree) = &self.components {
            all.extend(tree.reportable_features());
        }
        all
    }

    /// Reportable features overlapping `start..=stop`.
    ///
    /// Non-positional features are always included.
    #[must_use]
    pub fn features_in_range(&self, start: i64, stop: i64) -> Vec<&Feature> {
        self.reportable_features()
            .into_iter()
            .filter(|f| f.is_non_positional() || f.overlaps(start, stop))
            .collect()
    }

    /// Total number of features the source holds for this segment.
    ///
    /// Defaults to the number of reportable features when the source did not
    /// report a separate total, as happens for unwindowed results.
    #[must_use]
    pub fn total_feature_count(&self) -> usize {
        self.total_features
            .unwrap_or_else(|| self.reportable_features().len())
    }

    /// Total reported alongside a windowed result, if any.
    #[must_use]
    pub const fn reported_total(&self) -> Option<usize> {
        self.total_features
    }

    /// Looks up a feature by identifier among plain and component features.
    #[must_use]
    pub fn find_feature(&self, feature_id: &str) -> Option<&Feature> {
        self.features
            .iter()
            .find(|f| f.feature_id == feature_id)
            .or_else(|| {
                self.components
                    .as_ref()
                    .and_then(|tree| tree.find(feature_id))
                    .map(|found| found.feature)
            })
    }

    /// Returns a copy carrying `features` in place of the current ones.
    ///
    /// The copy has no component graph; component features that should
    /// survive must be part of `features`.
    #[must_use]
    pub fn with_features(&self, features: Vec<Feature>, total_features: Option<usize>) -> Self {
        Self {
            segment_id: self.segment_id.clone(),
            start: self.start,
            stop: self.stop,
            version: self.version.clone(),
            label: self.label.clone(),
            segment_type: self.segment_type.clone(),
            features,
            components: None,
            total_features,
        }
    }

    /// Returns a copy with different bounds.
    #[must_use]
    pub fn with_bounds(mut self, bounds: Option<Coordinates>) -> Self {
        self.start = bounds.map(|b| b.start);
        self.stop = bounds.map(|b| b.stop);
        self
    }
}

/// Builder for [`AnnotatedSegment`].
#[derive(Debug, Clone)]
pub struct AnnotatedSegmentBuilder {
    segment_id: String,
    version: String,
    bounds: Option<Coordinates>,
    label: Option<String>,
    segment_type: Option<String>,
    features: Vec<Feature>,
    components: Option<ComponentTree>,
    total_features: Option<usize>,
}

impl AnnotatedSegmentBuilder {
    /// Sets the segment bounds.
    #[must_use]
    pub fn bounds(mut self, start: i64, stop: i64) -> Self {
        self.bounds = Some(Coordinates::new(start, stop));
        self
    }

    /// Sets the display label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the segment type.
    #[must_use]
    pub fn segment_type(mut self, segment_type: impl Into<String>) -> Self {
        self.segment_type = Some(segment_type.into());
        self
    }

    /// Appends a plain feature.
    #[must_use]
    pub fn feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    /// Appends several plain features.
    #[must_use]
    pub fn features(mut self, features: impl IntoIterator<Item = Feature>) -> Self {
        self.features.extend(features);
        self
    }

    /// Attaches the component graph.
    #[must_use]
    pub fn components(mut self, components: ComponentTree) -> Self {
        self.components = Some(components);
        self
    }

    /// Records the total number of features the source holds, for windowed
    /// results that carry only a slice.
    #[must_use]
    pub fn total_features(mut self, total: usize) -> Self {
        self.total_features = Some(total);
        self
    }

    /// Finishes the segment.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptySegmentId`] when the identifier is empty.
    pub fn build(self) -> Result<AnnotatedSegment, ModelError> {
        if self.segment_id.is_empty() {
            return Err(ModelError::EmptySegmentId);
        }
        Ok(AnnotatedSegment {
            segment_id: self.segment_id,
            start: self.bounds.map(|b| b.start),
            stop: self.bounds.map(|b| b.stop),
            version: self.version,
            label: self.label,
            segment_type: self.segment_type,
            features: self.features,
            components: self.components,
            total_features: self.total_features,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;
    use crate::feature::FeatureType;

    fn feature(id: &str, start: i64, stop: i64) -> Feature {
        Feature::new(id, FeatureType::new("exon").expect("valid type"), start, stop)
    }

    #[fixture]
    fn segment() -> AnnotatedSegment {
        let mut tree = ComponentTree::new(feature("chr1", 1, 1000));
        tree.add_sub_component(tree.root(), feature("clone-a", 1, 400))
            .expect("root exists");
        AnnotatedSegment::builder("chr1", "v1")
            .bounds(1, 1000)
            .feature(feature("f1", 10, 20))
            .feature(feature("f2", 500, 600))
            .feature(Feature::non_positional(
                "note",
                FeatureType::new("remark").expect("valid type"),
            ))
            .components(tree)
            .build()
            .expect("valid segment")
    }

    #[rstest]
    fn counts_component_features_in_default_total(segment: AnnotatedSegment) {
        assert_eq!(segment.total_feature_count(), 5);
    }

    #[rstest]
    fn range_keeps_overlapping_and_non_positional(segment: AnnotatedSegment) {
        let ids: Vec<_> = segment
            .features_in_range(450, 700)
            .into_iter()
            .map(|f| f.feature_id.as_str())
            .collect();
        assert_eq!(ids, ["f2", "note", "chr1"]);
    }

    #[rstest]
    fn finds_component_features_by_id(segment: AnnotatedSegment) {
        assert!(segment.find_feature("clone-a").is_some());
        assert!(segment.find_feature("f9").is_none());
    }

    #[rstest]
    fn derived_copy_keeps_original_untouched(segment: AnnotatedSegment) {
        let trimmed = segment.with_features(vec![feature("f1", 10, 20)], Some(5));
        assert_eq!(trimmed.total_feature_count(), 5);
        assert_eq!(trimmed.reportable_features().len(), 1);
        assert_eq!(segment.features().len(), 3);
    }

    #[test]
    fn rejects_empty_identifier() {
        let result = AnnotatedSegment::builder("", "v1").build();
        assert_eq!(result, Err(ModelError::EmptySegmentId));
    }
}
