use thiserror::Error;

/// Errors raised when constructing model values from invalid input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A segment identifier was empty.
    #[error("segment id must not be empty")]
    EmptySegmentId,
    /// A segment identifier contained `:` or whitespace.
    #[error("segment id '{0}' must not contain ':' or whitespace")]
    InvalidSegmentId(String),
    /// A feature type identifier was empty.
    #[error("feature type id must not be empty")]
    EmptyTypeId,
    /// A row window was not positive or was inverted.
    #[error("row window {start}-{end} must be positive with start <= end")]
    InvalidRowRange {
        /// First requested row.
        start: i64,
        /// Last requested row.
        end: i64,
    },
    /// The row window of a filter was assigned twice.
    #[error("row window has already been set")]
    RowsAlreadySet,
    /// A component index did not belong to the tree it was used with.
    #[error("component {0} does not exist in this tree")]
    UnknownComponent(usize),
}
