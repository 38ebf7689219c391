//! Commands describing sources rather than their annotations: `dsn`,
//! `stylesheet` and `link`.

use serde::Serialize;
use url::Url;

use super::errors::DasError;
use super::request::parse_link_query;
use crate::registry::{RegisteredSource, SourceRegistry};

/// One data source as listed by the `dsn` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DsnEntry {
    /// Source identifier.
    pub id: String,
    /// Annotation version.
    pub version: String,
    /// Display name.
    pub name: String,
    /// Reference server the annotations map onto.
    pub mapmaster: Option<Url>,
    /// Free-text description.
    pub description: Option<String>,
}

pub(crate) fn dsn(registry: &SourceRegistry, query: &str) -> Result<Vec<DsnEntry>, DasError> {
    reject_arguments("dsn", query)?;
    if registry.is_empty() {
        return Err(DasError::data_source("no data sources are registered"));
    }
    Ok(registry
        .iter()
        .map(|source| {
            let config = source.config();
            DsnEntry {
                id: config.id.clone(),
                version: config.reported_version().to_owned(),
                name: config.display_name().to_owned(),
                mapmaster: config.mapmaster.clone(),
                description: config.description.clone(),
            }
        })
        .collect())
}

pub(crate) fn stylesheet(
    source: &RegisteredSource,
    default_stylesheet: Option<&str>,
    query: &str,
) -> Result<String, DasError> {
    reject_arguments("stylesheet", query)?;
    source
        .config()
        .stylesheet
        .as_deref()
        .or(default_stylesheet)
        .map(str::to_owned)
        .ok_or_else(|| {
            DasError::bad_stylesheet(format!("no stylesheet for data source '{}'", source.id()))
        })
}

pub(crate) fn link(source: &RegisteredSource, query: &str) -> Result<Url, DasError> {
    let (field, id) = parse_link_query(query)?;
    Ok(source.backend().link_url(field, &id)?)
}

fn reject_arguments(command: &str, query: &str) -> Result<(), DasError> {
    if query.trim().is_empty() {
        Ok(())
    } else {
        Err(DasError::bad_arguments(format!(
            "{command} takes no arguments: {query}"
        )))
    }
}
