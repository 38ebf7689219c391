//! Request-scoped feature filter.

use std::collections::BTreeSet;

use crate::error::ModelError;
use crate::feature::Feature;
use crate::query::RowRange;

/// Filters and paging state accumulated while parsing a `features` request.
///
/// One filter lives for one request. The engine sets [`paginated`] once a
/// resolution step has already applied the row window, which stops the
/// window being applied twice.
///
/// [`paginated`]: FeatureRequestFilter::is_paginated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRequestFilter {
    type_ids: BTreeSet<String>,
    category_ids: BTreeSet<String>,
    feature_ids: BTreeSet<String>,
    advanced_query: Option<String>,
    maxbins: Option<u32>,
    rows: Option<RowRange>,
    categorize: bool,
    paginated: bool,
    total_features: Option<usize>,
}

impl Default for FeatureRequestFilter {
    fn default() -> Self {
        Self {
            type_ids: BTreeSet::new(),
            category_ids: BTreeSet::new(),
            feature_ids: BTreeSet::new(),
            advanced_query: None,
            maxbins: None,
            rows: None,
            categorize: true,
            paginated: false,
            total_features: None,
        }
    }
}

impl FeatureRequestFilter {
    /// Adds a feature type identifier.
    pub fn add_type_id(&mut self, id: impl Into<String>) {
        self.type_ids.insert(id.into());
    }

    /// Adds a feature category identifier.
    pub fn add_category_id(&mut self, id: impl Into<String>) {
        self.category_ids.insert(id.into());
    }

    /// Adds a feature identifier.
    pub fn add_feature_id(&mut self, id: impl Into<String>) {
        self.feature_ids.insert(id.into());
    }

    /// Stores the advanced search expression.
    pub fn set_advanced_query(&mut self, query: impl Into<String>) {
        self.advanced_query = Some(query.into());
    }

    /// Stores the requested number of bins.
    pub const fn set_maxbins(&mut self, maxbins: u32) {
        self.maxbins = Some(maxbins);
    }

    /// Stores the row window.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::RowsAlreadySet`] if a window is already present.
    pub const fn set_rows(&mut self, rows: RowRange) -> Result<(), ModelError> {
        if self.rows.is_some() {
            return Err(ModelError::RowsAlreadySet);
        }
        self.rows = Some(rows);
        Ok(())
    }

    /// Sets whether features are grouped by category in the output.
    pub const fn set_categorize(&mut self, categorize: bool) {
        self.categorize = categorize;
    }

    /// Records that the row window has already been applied.
    pub const fn mark_paginated(&mut self) {
        self.paginated = true;
    }

    /// Records the number of features counted across the whole result.
    pub const fn set_total_features(&mut self, total: usize) {
        self.total_features = Some(total);
    }

    /// Requested feature type identifiers.
    #[must_use]
    pub const fn type_ids(&self) -> &BTreeSet<String> {
        &self.type_ids
    }

    /// Requested category identifiers.
    #[must_use]
    pub const fn category_ids(&self) -> &BTreeSet<String> {
        &self.category_ids
    }

    /// Requested feature identifiers.
    #[must_use]
    pub const fn feature_ids(&self) -> &BTreeSet<String> {
        &self.feature_ids
    }

    /// Advanced search expression.
    #[must_use]
    pub fn advanced_query(&self) -> Option<&str> {
        self.advanced_query.as_deref()
    }

    /// Requested number of bins.
    #[must_use]
    pub const fn maxbins(&self) -> Option<u32> {
        self.maxbins
    }

    /// Requested row window.
    #[must_use]
    pub const fn rows(&self) -> Option<RowRange> {
        self.rows
    }

    /// Whether features are grouped by category.
    #[must_use]
    pub const fn categorize(&self) -> bool {
        self.categorize
    }

    /// Whether the row window has already been applied.
    #[must_use]
    pub const fn is_paginated(&self) -> bool {
        self.paginated
    }

    /// Features counted across the whole result, once paginated.
    #[must_use]
    pub const fn total_features(&self) -> Option<usize> {
        self.total_features
    }

    /// Returns `true` when `feature` passes the type, category, and feature
    /// identifier restrictions. An empty restriction admits everything.
    #[must_use]
    pub fn admits(&self, feature: &Feature) -> bool {
        let kind = &feature.feature_type;
        let type_ok = self.type_ids.is_empty() || self.type_ids.contains(kind.id());
        let category_ok = self.category_ids.is_empty()
            || kind
                .category()
                .is_some_and(|category| self.category_ids.contains(category));
        let feature_ok =
            self.feature_ids.is_empty() || self.feature_ids.contains(&feature.feature_id);
        type_ok && category_ok && feature_ok
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::feature::FeatureType;

    fn exon() -> Feature {
        let kind = FeatureType::new("exon")
            .expect("valid type")
            .with_category("transcription");
        Feature::new("e1", kind, 1, 10)
    }

    #[rstest]
    #[case::unrestricted(&[], &[], &[], true)]
    #[case::type_match(&["exon"], &[], &[], true)]
    #[case::type_miss(&["intron"], &[], &[], false)]
    #[case::category_match(&[], &["transcription"], &[], true)]
    #[case::category_miss(&[], &["variation"], &[], false)]
    #[case::feature_miss(&[], &[], &["e2"], false)]
    fn admits_by_restriction(
        #[case] types: &[&str],
        #[case] categories: &[&str],
        #[case] features: &[&str],
        #[case] expected: bool,
    ) {
        let mut filter = FeatureRequestFilter::default();
        types.iter().for_each(|t| filter.add_type_id(*t));
        categories.iter().for_each(|c| filter.add_category_id(*c));
        features.iter().for_each(|f| filter.add_feature_id(*f));
        assert_eq!(filter.admits(&exon()), expected);
    }

    #[test]
    fn accepts_rows_only_once() {
        let mut filter = FeatureRequestFilter::default();
        let rows = RowRange::new(1, 5).expect("valid window");
        assert!(filter.set_rows(rows).is_ok());
        assert_eq!(filter.set_rows(rows), Err(ModelError::RowsAlreadySet));
    }

    #[test]
    fn categorizes_by_default() {
        assert!(FeatureRequestFilter::default().categorize());
    }
}
