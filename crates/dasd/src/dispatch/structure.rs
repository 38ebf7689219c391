//! The `structure` and `alignment` commands.
//!
//! Both pass the backend's document through untouched.

use super::errors::DasError;
use super::request::{parse_alignment_query, parse_structure_query};
use crate::capability::Capability;
use crate::registry::RegisteredSource;
use crate::source::ExternalDocument;

pub(crate) fn structure(
    source: &RegisteredSource,
    query: &str,
) -> Result<ExternalDocument, DasError> {
    require(source, Capability::Structure)?;
    let query = parse_structure_query(query)?;
    Ok(source.backend().structure(&query)?)
}

pub(crate) fn alignment(
    source: &RegisteredSource,
    query: &str,
) -> Result<ExternalDocument, DasError> {
    require(source, Capability::Alignment)?;
    let query = parse_alignment_query(query)?;
    Ok(source.backend().alignment(&query)?)
}

fn require(source: &RegisteredSource, capability: Capability) -> Result<(), DasError> {
    if source.capabilities().supports(capability) {
        Ok(())
    } else {
        Err(DasError::unimplemented(format!(
            "data source '{}' does not support {}",
            source.id(),
            capability.key()
        )))
    }
}
