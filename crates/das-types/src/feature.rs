//! Features and their classification.

use serde::Serialize;

use crate::error::ModelError;

/// Type attached to a feature, optionally grouped into a category.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FeatureType {
    id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cv_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

impl FeatureType {
    /// Creates a feature type with the given identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptyTypeId`] when `id` is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ModelError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ModelError::EmptyTypeId);
        }
        Ok(Self {
            id,
            category: None,
            cv_id: None,
            label: None,
        })
    }

    /// Sets the category the type belongs to.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the controlled-vocabulary identifier.
    #[must_use]
    pub fn with_cv_id(mut self, cv_id: impl Into<String>) -> Self {
        self.cv_id = Some(cv_id.into());
        self
    }

    /// Sets the human-readable label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Type identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Category identifier, if any.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Controlled-vocabulary identifier, if any.
    #[must_use]
    pub fn cv_id(&self) -> Option<&str> {
        self.cv_id.as_deref()
    }

    /// Display label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

/// Method used to produce a feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Method {
    /// Method identifier.
    pub id: String,
    /// Display label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Controlled-vocabulary identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_id: Option<String>,
}

/// Strand a feature lies on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Orientation {
    /// Forward strand (`+`).
    #[serde(rename = "+")]
    Forward,
    /// Reverse strand (`-`).
    #[serde(rename = "-")]
    Reverse,
    /// Strand is irrelevant (`0`).
    #[default]
    #[serde(rename = "0")]
    NotApplicable,
}

/// Reading frame of a coding feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Frame 0.
    #[serde(rename = "0")]
    Zero,
    /// Frame 1.
    #[serde(rename = "1")]
    One,
    /// Frame 2.
    #[serde(rename = "2")]
    Two,
    /// Not a coding feature (`-`).
    #[default]
    #[serde(rename = "-")]
    NotApplicable,
}

/// A single annotation on a segment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    /// Identifier, unique within a data source.
    pub feature_id: String,
    /// Display label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Feature classification.
    pub feature_type: FeatureType,
    /// Method that produced the annotation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,
    /// First base, or `0` for a non-positional feature.
    pub start: i64,
    /// Last base, or `0` for a non-positional feature.
    pub stop: i64,
    /// Score, when meaningful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    /// Strand.
    pub orientation: Orientation,
    /// Reading frame.
    pub phase: Phase,
    /// Free-text notes.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
    /// Identifiers of the features this one is part of.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
    /// Identifiers of the features this one is assembled from.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parts: Vec<String>,
}

impl Feature {
    /// Creates a feature spanning `start..=stop`.
    #[must_use]
    pub fn new(feature_id: impl Into<String>, feature_type: FeatureType, start: i64, stop: i64) -> Self {
        Self {
            feature_id: feature_id.into(),
            label: None,
            feature_type,
            method: None,
            start,
            stop,
            score: None,
            orientation: Orientation::default(),
            phase: Phase::default(),
            notes: Vec::new(),
            parents: Vec::new(),
            parts: Vec::new(),
        }
    }

    /// Creates a feature with no position on the segment.
    #[must_use]
    pub fn non_positional(feature_id: impl Into<String>, feature_type: FeatureType) -> Self {
        Self::new(feature_id, feature_type, 0, 0)
    }

    /// Sets the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Sets the method.
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the strand.
    #[must_use]
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Returns `true` for annotations that apply to the whole segment.
    #[must_use]
    pub const fn is_non_positional(&self) -> bool {
        self.start == 0 && self.stop == 0
    }

    /// Returns `true` when the feature overlaps `start..=stop`.
    #[must_use]
    pub const fn overlaps(&self, start: i64, stop: i64) -> bool {
        (stop >= self.start && stop <= self.stop)
            || (start >= self.start && start <= self.stop)
            || (start <= self.start && stop >= self.stop)
    }
}
