//! Value types shared by the DAS command engine and its data sources.
//!
//! The crate models what a data source hands back to the engine
//! ([`AnnotatedSegment`], [`Feature`], [`Sequence`], [`EntryPoint`]) and what a
//! client asks for ([`SegmentQuery`], [`RowRange`], [`FeatureRequestFilter`]).
//! Every type here is a plain value: trimming, merging, and windowing produce
//! new values rather than mutating shared ones, so instances can cross thread
//! boundaries freely.
//!
//! Component features (assemblies built from smaller features) live in an
//! arena-backed [`ComponentTree`] so that deep or cyclic assemblies can be
//! searched without recursion.

mod component;
mod error;
mod feature;
mod filter;
mod query;
mod segment;
mod sequence;

pub use component::{ComponentId, ComponentMatch, ComponentTree};
pub use error::ModelError;
pub use feature::{Feature, FeatureType, Method, Orientation, Phase};
pub use filter::FeatureRequestFilter;
pub use query::{Coordinates, RowRange, SegmentQuery};
pub use segment::{AnnotatedSegment, AnnotatedSegmentBuilder};
pub use sequence::{EntryPoint, Sequence};
