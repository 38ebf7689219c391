//! Command dispatch and segment resolution for a DAS annotation server.
//!
//! The crate sits between a transport and the data sources it serves. The
//! transport turns each HTTP request into a [`CommandRequest`] and renders the
//! typed [`CommandResponse`] (or the [`DasError`] status) it gets back; the
//! data sources implement [`AnnotationSource`]. Everything in between lives
//! here:
//!
//! - the [`SourceRegistry`] of configured sources and their resolved
//!   [`CapabilitySet`]s,
//! - query parsing and command routing in the [`dispatch`] module,
//! - segment resolution, which prefers backend row windows and range queries
//!   when a source advertises them and otherwise fetches whole segments,
//! - merging of segment-based and identifier-based results, and
//! - pagination of the merged result when the backend could not window it.
//!
//! ## Capabilities
//!
//! A capability is only relied upon once it is enabled in the resolved set.
//! Backends declare what they implement, the configuration may declare more,
//! and per-source overrides can force or deny individual tokens. Optional
//! backend calls that still report "unimplemented" fall back to the plain
//! retrieval path.
//!
//! ## Concurrency
//!
//! A [`Dispatcher`] holds only shared, immutable state. Each request works on
//! its own filter and results, so one instance can serve any number of threads.

mod capability;
pub mod dispatch;
pub mod memory;
mod registry;
mod source;
pub mod telemetry;

pub use capability::{
    Capability, CapabilitySet, CapabilitySource, CapabilityState, resolve_capabilities,
};
pub use dispatch::{CommandRequest, CommandResponse, DasError, DasStatus, Dispatcher};
pub use memory::InMemorySource;
pub use registry::{RegisteredSource, RegistryError, SourceRegistry, SourceRegistryBuilder};
pub use source::{
    AlignmentQuery, AnnotationSource, ExternalDocument, FeatureLookup, FeatureSearcher, LinkField,
    SourceError, StructureQuery,
};
pub use telemetry::{TelemetryError, TelemetryHandle};

#[cfg(test)]
mod tests;
