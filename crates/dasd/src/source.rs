//! Backend data source interface.
//!
//! Every data source implements [`AnnotationSource`]. Only plain feature
//! retrieval and type listing are mandatory; the remaining operations default
//! to [`SourceError::Unimplemented`]. A source advertises the optional
//! operations it really implements through [`AnnotationSource::capabilities`],
//! and the dispatcher checks the resolved [`CapabilitySet`] before calling
//! them.
//!
//! [`CapabilitySet`]: crate::capability::CapabilitySet

use std::collections::BTreeSet;
use std::error::Error as StdError;

use das_types::{
    AnnotatedSegment, Coordinates, EntryPoint, FeatureRequestFilter, FeatureType, RowRange,
    Sequence,
};
use strum::{Display, EnumString};
use thiserror::Error;
use url::Url;

use crate::capability::Capability;

/// Opaque document returned by the `structure` and `alignment` commands.
pub type ExternalDocument = serde_json::Value;

/// Failures reported by a data source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The segment is not known to the source.
    #[error("unknown segment '{segment_id}': {message}")]
    BadReference {
        /// Requested segment.
        segment_id: String,
        /// Backend explanation.
        message: String,
    },
    /// The coordinates fall outside the segment.
    #[error("invalid coordinates for segment '{segment_id}': {message}")]
    Coordinate {
        /// Requested segment.
        segment_id: String,
        /// Backend explanation.
        message: String,
    },
    /// The source does not implement the operation.
    #[error("operation '{operation}' is not implemented by this source")]
    Unimplemented {
        /// Name of the trait method.
        operation: &'static str,
    },
    /// Any other backend failure.
    #[error("{message}")]
    Failure {
        /// Backend explanation.
        message: String,
        /// Underlying error, when there is one.
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl SourceError {
    /// Creates an unknown segment error.
    pub fn bad_reference(segment_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BadReference {
            segment_id: segment_id.into(),
            message: message.into(),
        }
    }

    /// Creates a coordinate error.
    pub fn coordinate(segment_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Coordinate {
            segment_id: segment_id.into(),
            message: message.into(),
        }
    }

    /// Creates an unimplemented-operation error.
    #[must_use]
    pub const fn unimplemented(operation: &'static str) -> Self {
        Self::Unimplemented { operation }
    }

    /// Creates a generic failure.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a generic failure wrapping an underlying error.
    pub fn failure_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Failure {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns `true` for [`SourceError::Unimplemented`].
    #[must_use]
    pub const fn is_unimplemented(&self) -> bool {
        matches!(self, Self::Unimplemented { .. })
    }
}

/// Outcome of looking one feature identifier up.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureLookup {
    /// The segment holding the feature, restricted to the matching features.
    Found(AnnotatedSegment),
    /// No feature carries this identifier.
    Unknown(String),
}

/// Field a `link` request resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LinkField {
    /// A feature category.
    Category,
    /// A feature.
    Feature,
    /// An annotation method.
    Method,
    /// An alignment target.
    Target,
    /// A feature type.
    Type,
}

/// Arguments of a `structure` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructureQuery {
    /// Structure identifier.
    pub query: String,
    /// Chains to include; empty means all.
    pub chains: Vec<String>,
    /// Models to include; empty means all.
    pub models: Vec<String>,
}

/// Arguments of an `alignment` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlignmentQuery {
    /// Alignment identifier.
    pub query: String,
    /// Subjects to align against.
    pub subjects: Vec<String>,
    /// Coordinate system of the subjects.
    pub subject_coord_sys: Option<String>,
    /// Window over alignment rows.
    pub rows: Option<RowRange>,
    /// Window over alignment columns.
    pub cols: Option<RowRange>,
}

/// A DAS data source.
pub trait AnnotationSource: Send + Sync {
    /// Optional operations this source implements.
    fn capabilities(&self) -> Vec<Capability> {
        Vec::new()
    }

    /// Returns every feature on a segment.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::BadReference`] for an unknown segment.
    fn features(
        &self,
        segment_id: &str,
        maxbins: Option<u32>,
    ) -> Result<AnnotatedSegment, SourceError>;

    /// Returns the features of a segment that fall in a row window.
    ///
    /// The returned segment reports the full feature count as its total.
    ///
    /// # Errors
    ///
    /// As [`AnnotationSource::features`]; unimplemented by default.
    fn features_in_rows(
        &self,
        _segment_id: &str,
        _maxbins: Option<u32>,
        _rows: RowRange,
    ) -> Result<AnnotatedSegment, SourceError> {
        Err(SourceError::unimplemented("features_in_rows"))
    }

    /// Returns the features of a segment overlapping `coordinates`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Coordinate`] for coordinates the source rejects;
    /// unimplemented by default.
    fn features_in_range(
        &self,
        _segment_id: &str,
        _coordinates: Coordinates,
        _maxbins: Option<u32>,
    ) -> Result<AnnotatedSegment, SourceError> {
        Err(SourceError::unimplemented("features_in_range"))
    }

    /// Range-restricted retrieval with a row window.
    ///
    /// # Errors
    ///
    /// As [`AnnotationSource::features_in_range`].
    fn features_in_range_rows(
        &self,
        _segment_id: &str,
        _coordinates: Coordinates,
        _maxbins: Option<u32>,
        _rows: RowRange,
    ) -> Result<AnnotatedSegment, SourceError> {
        Err(SourceError::unimplemented("features_in_range_rows"))
    }

    /// Looks features up by identifier.
    ///
    /// # Errors
    ///
    /// Unimplemented by default.
    fn features_by_id(
        &self,
        _feature_ids: &BTreeSet<String>,
        _maxbins: Option<u32>,
    ) -> Result<Vec<FeatureLookup>, SourceError> {
        Err(SourceError::unimplemented("features_by_id"))
    }

    /// Identifier lookup with a row window.
    ///
    /// # Errors
    ///
    /// Unimplemented by default.
    fn features_by_id_in_rows(
        &self,
        _feature_ids: &BTreeSet<String>,
        _maxbins: Option<u32>,
        _rows: RowRange,
    ) -> Result<Vec<FeatureLookup>, SourceError> {
        Err(SourceError::unimplemented("features_by_id_in_rows"))
    }

    /// Lists every feature type the source annotates with.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Failure`] when the backend cannot answer.
    fn types(&self) -> Result<Vec<FeatureType>, SourceError>;

    /// Counts features of one type across the whole source.
    ///
    /// # Errors
    ///
    /// Unimplemented by default, which callers treat as "count unknown".
    fn total_count_for_type(&self, _feature_type: &FeatureType) -> Result<usize, SourceError> {
        Err(SourceError::unimplemented("total_count_for_type"))
    }

    /// Returns the whole sequence of a reference segment.
    ///
    /// # Errors
    ///
    /// Unimplemented by default.
    fn sequence(&self, _segment_id: &str) -> Result<Sequence, SourceError> {
        Err(SourceError::unimplemented("sequence"))
    }

    /// Returns part of the sequence of a reference segment.
    ///
    /// # Errors
    ///
    /// Unimplemented by default.
    fn sequence_in_range(
        &self,
        _segment_id: &str,
        _coordinates: Coordinates,
    ) -> Result<Sequence, SourceError> {
        Err(SourceError::unimplemented("sequence_in_range"))
    }

    /// Number of entry points the source exposes.
    ///
    /// # Errors
    ///
    /// Unimplemented by default.
    fn total_entry_points(&self) -> Result<usize, SourceError> {
        Err(SourceError::unimplemented("total_entry_points"))
    }

    /// Entry points `start..=stop`, 1-based.
    ///
    /// # Errors
    ///
    /// Unimplemented by default.
    fn entry_points(&self, _start: usize, _stop: usize) -> Result<Vec<EntryPoint>, SourceError> {
        Err(SourceError::unimplemented("entry_points"))
    }

    /// Version of the entry point listing.
    ///
    /// # Errors
    ///
    /// Unimplemented by default.
    fn entry_point_version(&self) -> Result<Option<String>, SourceError> {
        Err(SourceError::unimplemented("entry_point_version"))
    }

    /// Resolves a `link` request to a URL.
    ///
    /// # Errors
    ///
    /// Unimplemented by default.
    fn link_url(&self, _field: LinkField, _id: &str) -> Result<Url, SourceError> {
        Err(SourceError::unimplemented("link_url"))
    }

    /// Answers a `structure` request.
    ///
    /// # Errors
    ///
    /// Unimplemented by default.
    fn structure(&self, _query: &StructureQuery) -> Result<ExternalDocument, SourceError> {
        Err(SourceError::unimplemented("structure"))
    }

    /// Answers an `alignment` request.
    ///
    /// # Errors
    ///
    /// Unimplemented by default.
    fn alignment(&self, _query: &AlignmentQuery) -> Result<ExternalDocument, SourceError> {
        Err(SourceError::unimplemented("alignment"))
    }
}

/// External search index for `query=` expressions.
pub trait FeatureSearcher: Send + Sync {
    /// Runs the advanced query held by `filter` against one data source.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Failure`] when the index cannot answer.
    fn search(
        &self,
        source_id: &str,
        filter: &FeatureRequestFilter,
    ) -> Result<Vec<AnnotatedSegment>, SourceError>;
}
