//! Segment queries and row windows requested by clients.

use std::fmt;

use serde::Serialize;

use crate::error::ModelError;

/// Coordinate pair attached to a segment query.
///
/// The values are kept exactly as the client sent them. Negative or inverted
/// pairs are representable so the engine can report them as error segments
/// instead of rejecting the whole request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinates {
    /// First requested base, inclusive.
    pub start: i64,
    /// Last requested base, inclusive.
    pub stop: i64,
}

impl Coordinates {
    /// Creates a coordinate pair.
    #[must_use]
    pub const fn new(start: i64, stop: i64) -> Self {
        Self { start, stop }
    }

    /// Returns `true` when both bounds are positive and ordered.
    #[must_use]
    pub const fn is_well_formed(self) -> bool {
        self.start > 0 && self.stop > 0 && self.start <= self.stop
    }
}

/// A request for one segment, optionally restricted to a coordinate range.
///
/// Start and stop are either both present or both absent, which the single
/// optional [`Coordinates`] field enforces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SegmentQuery {
    segment_id: String,
    #[serde(flatten)]
    coordinates: Option<Coordinates>,
}

impl SegmentQuery {
    /// Creates a query for a whole segment.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptySegmentId`] for an empty identifier and
    /// [`ModelError::InvalidSegmentId`] when it contains `:` or whitespace.
    pub fn new(segment_id: impl Into<String>) -> Result<Self, ModelError> {
        let segment_id = segment_id.into();
        if segment_id.is_empty() {
            return Err(ModelError::EmptySegmentId);
        }
        if segment_id.chars().any(|c| c == ':' || c.is_whitespace()) {
            return Err(ModelError::InvalidSegmentId(segment_id));
        }
        Ok(Self {
            segment_id,
            coordinates: None,
        })
    }

    /// Restricts the query to the given coordinates.
    #[must_use]
    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }

    /// Identifier of the requested segment.
    #[must_use]
    pub fn segment_id(&self) -> &str {
        &self.segment_id
    }

    /// Requested coordinates, when the query is range-restricted.
    #[must_use]
    pub const fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    /// Requested start coordinate.
    #[must_use]
    pub fn start(&self) -> Option<i64> {
        self.coordinates.map(|c| c.start)
    }

    /// Requested stop coordinate.
    #[must_use]
    pub fn stop(&self) -> Option<i64> {
        self.coordinates.map(|c| c.stop)
    }
}

impl fmt::Display for SegmentQuery {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.coordinates {
            Some(Coordinates { start, stop }) => {
                write!(formatter, "{}:{start},{stop}", self.segment_id)
            }
            None => formatter.write_str(&self.segment_id),
        }
    }
}

/// A 1-based inclusive window over a sequence of rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RowRange {
    start: usize,
    end: usize,
}

impl RowRange {
    /// Creates a window from client-supplied bounds.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRowRange`] unless `1 <= start <= end`.
    pub fn new(start: i64, end: i64) -> Result<Self, ModelError> {
        let invalid = || ModelError::InvalidRowRange { start, end };
        let first = usize::try_from(start).map_err(|_| invalid())?;
        let last = usize::try_from(end).map_err(|_| invalid())?;
        if first == 0 || first > last {
            return Err(invalid());
        }
        Ok(Self {
            start: first,
            end: last,
        })
    }

    /// First row of the window.
    #[must_use]
    pub const fn start(self) -> usize {
        self.start
    }

    /// Last row of the window.
    #[must_use]
    pub const fn end(self) -> usize {
        self.end
    }

    /// Number of rows the window spans.
    #[must_use]
    pub const fn len(self) -> usize {
        self.end - self.start + 1
    }

    /// Always `false`: a window holds at least one row.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        false
    }

    /// Re-expresses the window relative to a block starting after `offset`
    /// rows.
    ///
    /// Returns `None` when the window closes before the block begins.
    #[must_use]
    pub fn relative_to(self, offset: usize) -> Option<Self> {
        if self.end <= offset {
            return None;
        }
        Some(Self {
            start: self.start.saturating_sub(offset).max(1),
            end: self.end - offset,
        })
    }
}

impl fmt::Display for RowRange {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}-{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::empty("", ModelError::EmptySegmentId)]
    #[case::colon("chr1:5", ModelError::InvalidSegmentId("chr1:5".into()))]
    #[case::space("chr 1", ModelError::InvalidSegmentId("chr 1".into()))]
    fn rejects_malformed_segment_ids(#[case] id: &str, #[case] expected: ModelError) {
        assert_eq!(SegmentQuery::new(id), Err(expected));
    }

    #[test]
    fn displays_in_request_form() {
        let query = SegmentQuery::new("chr1")
            .expect("valid id")
            .with_coordinates(Coordinates::new(-5, 20));
        assert_eq!(query.to_string(), "chr1:-5,20");
        assert_eq!(query.start(), Some(-5));
    }

    #[rstest]
    #[case::zero_start(0, 4)]
    #[case::negative(-1, 4)]
    #[case::inverted(5, 4)]
    fn rejects_invalid_windows(#[case] start: i64, #[case] end: i64) {
        assert_eq!(
            RowRange::new(start, end),
            Err(ModelError::InvalidRowRange { start, end })
        );
    }

    #[rstest]
    #[case::untouched(0, Some((3, 8)))]
    #[case::clipped_start(4, Some((1, 4)))]
    #[case::past_window(8, None)]
    fn shifts_window_past_an_offset(#[case] offset: usize, #[case] expected: Option<(usize, usize)>) {
        let window = RowRange::new(3, 8).expect("valid window");
        let shifted = window.relative_to(offset).map(|w| (w.start(), w.end()));
        assert_eq!(shifted, expected);
    }
}
