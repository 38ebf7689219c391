//! Reference sequences and entry points.

use serde::Serialize;

use crate::error::ModelError;
use crate::feature::Orientation;

/// Residues of a reference segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sequence {
    segment_id: String,
    start: i64,
    stop: i64,
    version: String,
    residues: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<String>,
}

impl Sequence {
    /// Creates a sequence spanning `1..=residues.len()`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptySegmentId`] when the identifier is empty.
    pub fn new(
        segment_id: impl Into<String>,
        version: impl Into<String>,
        residues: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let segment_id = segment_id.into();
        if segment_id.is_empty() {
            return Err(ModelError::EmptySegmentId);
        }
        let residues = residues.into();
        let stop = i64::try_from(residues.len()).unwrap_or(i64::MAX);
        Ok(Self {
            segment_id,
            start: 1,
            stop,
            version: version.into(),
            residues,
            label: None,
        })
    }

    /// Sets the display label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Segment identifier.
    #[must_use]
    pub fn segment_id(&self) -> &str {
        &self.segment_id
    }

    /// First base held.
    #[must_use]
    pub const fn start(&self) -> i64 {
        self.start
    }

    /// Last base held.
    #[must_use]
    pub const fn stop(&self) -> i64 {
        self.stop
    }

    /// Version of the sequence.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Residue string.
    #[must_use]
    pub fn residues(&self) -> &str {
        &self.residues
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Residues for `start..=stop`, or `None` when the range falls outside
    /// the held bases.
    #[must_use]
    pub fn subsequence(&self, start: i64, stop: i64) -> Option<Self> {
        if start < self.start || stop > self.stop || start > stop {
            return None;
        }
        let from = usize::try_from(start - self.start).ok()?;
        let to = usize::try_from(stop - self.start + 1).ok()?;
        let residues = self.residues.get(from..to)?;
        Some(Self {
            segment_id: self.segment_id.clone(),
            start,
            stop,
            version: self.version.clone(),
            residues: residues.to_owned(),
            label: self.label.clone(),
        })
    }
}

/// A top-level segment clients can start browsing from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryPoint {
    /// Segment identifier.
    pub segment_id: String,
    /// First base, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    /// Last base, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<i64>,
    /// Strand of the segment.
    pub orientation: Orientation,
    /// Segment type, such as `chromosome`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment_type: Option<String>,
    /// Free-text description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the segment is assembled from sub-parts.
    pub has_subparts: bool,
    /// Version of the segment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl EntryPoint {
    /// Creates an entry point with only an identifier.
    #[must_use]
    pub fn new(segment_id: impl Into<String>) -> Self {
        Self {
            segment_id: segment_id.into(),
            start: None,
            stop: None,
            orientation: Orientation::default(),
            segment_type: None,
            description: None,
            has_subparts: false,
            version: None,
        }
    }

    /// Sets the bounds.
    #[must_use]
    pub fn with_bounds(mut self, start: i64, stop: i64) -> Self {
        self.start = Some(start);
        self.stop = Some(stop);
        self
    }
}
