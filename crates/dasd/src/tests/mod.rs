//! Shared fixtures and behavioural suites for the dispatch engine.

pub(crate) mod support;
