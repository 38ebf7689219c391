//! Request descriptors and DAS query-string parsing.
//!
//! A DAS query string is a `;`-separated list of fragments. Fragments are
//! either segment references (`segment=chr1:100,200`) or `key=value` pairs.
//! Each command accepts its own subset of keys; unknown keys are ignored.

use std::borrow::Cow;

use das_types::{Coordinates, FeatureRequestFilter, RowRange, SegmentQuery};
use percent_encoding::percent_decode_str;

use super::errors::DasError;
use crate::source::{AlignmentQuery, LinkField, StructureQuery};

const PATH_ROOT: &str = "das";
const SEGMENT_PREFIX: &str = "segment=";

/// One DAS command addressed to a data source or to the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    dsn: Option<String>,
    command: String,
    query: String,
}

impl CommandRequest {
    /// Creates a request for a command on a data source.
    pub fn for_source(
        dsn: impl Into<String>,
        command: impl Into<String>,
        query: impl Into<String>,
    ) -> Self {
        Self {
            dsn: Some(dsn.into()),
            command: command.into(),
            query: query.into(),
        }
    }

    /// Creates a request for a server-level command such as `dsn`.
    pub fn for_server(command: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            dsn: None,
            command: command.into(),
            query: query.into(),
        }
    }

    /// Builds a request from a path of the form `/das/dsn` or
    /// `/das/<source>/<command>`.
    ///
    /// # Errors
    ///
    /// Returns [`DasError::BadCommand`] when the path has any other shape.
    pub fn from_path(path: &str, query: Option<&str>) -> Result<Self, DasError> {
        let parts: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|part| !part.is_empty())
            .collect();
        let query = query.unwrap_or_default();
        match parts.as_slice() {
            [root, command] if *root == PATH_ROOT => Ok(Self::for_server(*command, query)),
            [root, dsn, command] if *root == PATH_ROOT => {
                Ok(Self::for_source(*dsn, *command, query))
            }
            _ => Err(DasError::bad_command(path)),
        }
    }

    /// Data source the command addresses, if any.
    #[must_use]
    pub fn dsn(&self) -> Option<&str> {
        self.dsn.as_deref()
    }

    /// Command name as sent by the client.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Raw query string.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// Parsed arguments of a `features` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct FeaturesQuery {
    pub(crate) segments: Vec<SegmentQuery>,
    pub(crate) filter: FeatureRequestFilter,
}

impl FeaturesQuery {
    pub(crate) fn parse(query: &str) -> Result<Self, DasError> {
        if query.trim().is_empty() {
            return Err(DasError::bad_arguments(
                "features needs at least one segment or feature_id",
            ));
        }
        let mut parsed = Self::default();
        for fragment in fragments(query) {
            if let Some(segment) = parse_segment_fragment(fragment) {
                parsed.segments.push(segment);
                continue;
            }
            let (key, value) = split_pair(fragment, query)?;
            match key {
                "type" => parsed.filter.add_type_id(decode_component(value)?),
                "category" => parsed.filter.add_category_id(decode_component(value)?),
                "categorize" => parsed.filter.set_categorize(value != "no"),
                "feature_id" => parsed.filter.add_feature_id(decode_component(value)?),
                "query" => parsed.filter.set_advanced_query(value),
                "maxbins" => {
                    let maxbins = value.parse::<u32>().map_err(|_| {
                        DasError::bad_arguments(format!("maxbins must be numeric: {query}"))
                    })?;
                    parsed.filter.set_maxbins(maxbins);
                }
                "rows" => parsed.filter.set_rows(parse_row_window(value, query)?)?,
                _ => {}
            }
        }
        Ok(parsed)
    }
}

/// Parsed arguments of a `types` request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TypesQuery {
    pub(crate) segments: Vec<SegmentQuery>,
    pub(crate) type_ids: Vec<String>,
}

impl TypesQuery {
    pub(crate) fn parse(query: &str) -> Result<Self, DasError> {
        let mut parsed = Self::default();
        for fragment in fragments(query) {
            if let Some(segment) = parse_segment_fragment(fragment) {
                parsed.segments.push(segment);
                continue;
            }
            let (key, value) = split_pair(fragment, query)?;
            if key == "type" {
                parsed.type_ids.push(decode_component(value)?);
            }
        }
        Ok(parsed)
    }
}

/// Segment references of a `sequence` or `dna` request.
pub(crate) fn parse_sequence_query(query: &str) -> Result<Vec<SegmentQuery>, DasError> {
    let segments: Vec<SegmentQuery> = fragments(query)
        .map(|fragment| parse_segment_fragment(fragment).ok_or_else(|| malformed_segment(fragment)))
        .collect::<Result<_, _>>()?;
    if segments.is_empty() {
        return Err(DasError::bad_arguments(
            "sequence needs at least one segment",
        ));
    }
    Ok(segments)
}

/// Row window of an `entry_points` request; `None` when the query is empty.
pub(crate) fn parse_entry_points_query(query: &str) -> Result<Option<RowRange>, DasError> {
    if query.trim().is_empty() {
        return Ok(None);
    }
    let value = query
        .strip_prefix("rows=")
        .ok_or_else(|| DasError::bad_arguments(format!("entry_points accepts only rows: {query}")))?;
    parse_row_window(value, query).map(Some)
}

/// Field and identifier of a `link` request.
pub(crate) fn parse_link_query(query: &str) -> Result<(LinkField, String), DasError> {
    let parts: Vec<&str> = query.split(';').collect();
    if parts.len() < 2 {
        return Err(DasError::bad_arguments(format!(
            "link needs both field and id: {query}"
        )));
    }
    let mut field = None;
    let mut id = None;
    for part in parts {
        let (key, value) = split_pair(part, query)?;
        match key {
            "field" => {
                field = Some(value.parse::<LinkField>().map_err(|_| {
                    DasError::bad_arguments(format!("unsupported link field '{value}'"))
                })?);
            }
            "id" => id = Some(value.to_owned()),
            _ => {}
        }
    }
    match (field, id) {
        (Some(field), Some(id)) => Ok((field, id)),
        _ => Err(DasError::bad_arguments(format!(
            "link needs both field and id: {query}"
        ))),
    }
}

pub(crate) fn parse_structure_query(query: &str) -> Result<StructureQuery, DasError> {
    let mut parsed = StructureQuery::default();
    let mut target = None;
    for fragment in fragments(query) {
        let (key, value) = split_pair(fragment, query)?;
        match key {
            "query" => target = Some(value.to_owned()),
            "chain" => parsed.chains.push(value.to_owned()),
            "model" => parsed.models.push(value.to_owned()),
            _ => {}
        }
    }
    parsed.query = target.ok_or_else(|| {
        DasError::bad_arguments(format!("structure needs a query argument: {query}"))
    })?;
    Ok(parsed)
}

pub(crate) fn parse_alignment_query(query: &str) -> Result<AlignmentQuery, DasError> {
    let mut parsed = AlignmentQuery::default();
    let mut target = None;
    for fragment in fragments(query) {
        let (key, value) = split_pair(fragment, query)?;
        match key {
            "query" => target = Some(value.to_owned()),
            "subject" => parsed.subjects.push(value.to_owned()),
            "subjectcoordsys" => parsed.subject_coord_sys = Some(value.to_owned()),
            "rows" => parsed.rows = Some(parse_row_window(value, query)?),
            "cols" => parsed.cols = Some(parse_row_window(value, query)?),
            _ => {}
        }
    }
    parsed.query = target.ok_or_else(|| {
        DasError::bad_arguments(format!("alignment needs a query argument: {query}"))
    })?;
    Ok(parsed)
}

/// Parses `segment=<id>` or `segment=<id>:<start>,<stop>`.
///
/// Returns `None` when the fragment is not a well-formed segment reference.
pub(crate) fn parse_segment_fragment(fragment: &str) -> Option<SegmentQuery> {
    let body = fragment.strip_prefix(SEGMENT_PREFIX)?;
    match body.split_once(':') {
        None => SegmentQuery::new(body).ok(),
        Some((id, range)) => {
            let (start, stop) = range.split_once(',')?;
            let coordinates = Coordinates::new(parse_signed(start)?, parse_signed(stop)?);
            SegmentQuery::new(id)
                .ok()
                .map(|query| query.with_coordinates(coordinates))
        }
    }
}

/// Parses `<start>-<end>` into a validated window. Either bound may carry a
/// leading `-`, which then fails validation.
pub(crate) fn parse_row_window(value: &str, query: &str) -> Result<RowRange, DasError> {
    let (start, end) = split_signed_pair(value).ok_or_else(|| {
        DasError::bad_arguments(format!(
            "rows must look like <start>-<end> with integer bounds: {query}"
        ))
    })?;
    RowRange::new(start, end).map_err(DasError::from)
}

/// Decodes a URL-encoded value, treating `+` as a space.
pub(crate) fn decode_component(value: &str) -> Result<String, DasError> {
    let spaced = value.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(Cow::into_owned)
        .map_err(|error| {
            DasError::bad_arguments(format!("'{value}' does not decode to UTF-8: {error}"))
        })
}

fn fragments(query: &str) -> impl Iterator<Item = &str> {
    query.split(';').filter(|fragment| !fragment.is_empty())
}

fn split_pair<'a>(fragment: &'a str, query: &str) -> Result<(&'a str, &'a str), DasError> {
    let mut parts = fragment.split('=');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(value), None) if !value.is_empty() => Ok((key, value)),
        _ => Err(DasError::bad_arguments(format!(
            "'{fragment}' is not a key=value pair in: {query}"
        ))),
    }
}

fn malformed_segment(fragment: &str) -> DasError {
    DasError::bad_arguments(format!("malformed segment reference '{fragment}'"))
}

fn split_signed_pair(value: &str) -> Option<(i64, i64)> {
    let separator = value.get(1..)?.find('-')? + 1;
    let start = parse_signed(value.get(..separator)?)?;
    let end = parse_signed(value.get(separator + 1..)?)?;
    Some((start, end))
}

fn parse_signed(text: &str) -> Option<i64> {
    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}
