//! Filter engine: search text plus facet selections over a role collection.
//!
//! Values selected within one facet combine with OR; facets combine with
//! AND. An unset facet admits everything. [`apply_filters`] is a pure
//! function of its inputs and always returns the result in sort order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::sort::{SortSpec, sort_roles};
use crate::{AdjudicationStatus, FunctionTag, Role, ScanHistoryEntry};

/// Selected values of one facet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacetSelection<K: Ord>(BTreeSet<K>);

impl<K: Ord> Default for FacetSelection<K> {
    fn default() -> Self {
        Self(BTreeSet::new())
    }
}

impl<K: Ord> FacetSelection<K> {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, value: K) -> bool {
        self.0.insert(value)
    }

    pub fn remove(&mut self, value: &K) -> bool {
        self.0.remove(value)
    }

    /// Add the value if absent, remove it if present.
    pub fn toggle(&mut self, value: K) {
        if !self.0.remove(&value) {
            self.0.insert(value);
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn contains(&self, value: &K) -> bool {
        self.0.contains(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.0.iter()
    }

    /// True when nothing is selected or any of `values` is selected.
    pub fn admits<'a, Q>(&self, values: impl IntoIterator<Item = &'a Q>) -> bool
    where
        K: std::borrow::Borrow<Q>,
        Q: Ord + ?Sized + 'a,
    {
        self.0.is_empty() || values.into_iter().any(|v| self.0.contains(v))
    }
}

impl<K: Ord> FromIterator<K> for FacetSelection<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// User-selected filter state for a role view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub search: String,
    pub statuses: FacetSelection<AdjudicationStatus>,
    pub categories: FacetSelection<String>,
    pub sources: FacetSelection<String>,
    /// Function-tag codes.
    pub tags: FacetSelection<String>,
    pub documents: FacetSelection<String>,
    /// `Some(true)`: at least one tag. `Some(false)`: untagged only.
    pub has_tags: Option<bool>,
    /// Keep roles whose confidence is strictly below this value.
    pub confidence_below: Option<f64>,
    pub sort: Option<SortSpec>,
}

impl FilterCriteria {
    /// Whether any filter (not sort) narrows the collection.
    pub fn is_active(&self) -> bool {
        !self.search.trim().is_empty()
            || !self.statuses.is_empty()
            || !self.categories.is_empty()
            || !self.sources.is_empty()
            || !self.tags.is_empty()
            || !self.documents.is_empty()
            || self.has_tags.is_some()
            || self.confidence_below.is_some()
    }

    /// Reset every filter, keeping the sort.
    pub fn clear_filters(&mut self) {
        *self = Self {
            sort: self.sort,
            ..Self::default()
        };
    }

    pub fn matches(&self, role: &Role) -> bool {
        self.matches_search(role)
            && self.statuses.admits([&role.status])
            && self.categories.admits([role.category.as_str()])
            && self.sources.admits([role.source.as_str()])
            && self
                .tags
                .admits(role.function_tags.iter().map(|t| t.code.as_str()))
            && self
                .documents
                .admits(role.documents.iter().map(String::as_str))
            && self
                .has_tags
                .is_none_or(|wanted| wanted == !role.function_tags.is_empty())
            && self
                .confidence_below
                .is_none_or(|limit| role.confidence < limit)
    }

    fn matches_search(&self, role: &Role) -> bool {
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        let hit = |s: &str| s.to_lowercase().contains(&needle);
        hit(&role.name)
            || hit(&role.category)
            || hit(&role.description)
            || role.aliases.iter().any(|a| hit(a))
            || role.documents.iter().any(|d| hit(d))
    }
}

/// Filter and sort a role collection. The input is not modified.
pub fn apply_filters(roles: &[Role], criteria: &FilterCriteria) -> Vec<Role> {
    let mut out: Vec<Role> = roles
        .iter()
        .filter(|r| criteria.matches(r))
        .cloned()
        .collect();
    sort_roles(&mut out, criteria.sort);
    out
}

/// Distinct values available to each facet dropdown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetOptions {
    pub categories: Vec<String>,
    pub sources: Vec<String>,
    pub tags: Vec<FunctionTag>,
    pub documents: Vec<String>,
}

/// Collect facet options. Documents come from scan history when it is
/// non-empty, otherwise from the roles themselves.
pub fn facet_options(roles: &[Role], history: &[ScanHistoryEntry]) -> FacetOptions {
    let non_empty = |s: &&String| !s.is_empty();
    let categories: BTreeSet<String> = roles.iter().map(|r| &r.category).filter(non_empty).cloned().collect();
    let sources: BTreeSet<String> = roles.iter().map(|r| &r.source).filter(non_empty).cloned().collect();

    let mut tags: Vec<FunctionTag> = Vec::new();
    for tag in roles.iter().flat_map(|r| &r.function_tags) {
        if !tags.iter().any(|t| t.code == tag.code) {
            tags.push(tag.clone());
        }
    }
    tags.sort_by(|a, b| a.code.cmp(&b.code));

    let documents: BTreeSet<String> = if history.is_empty() {
        roles.iter().flat_map(|r| &r.documents).filter(non_empty).cloned().collect()
    } else {
        history.iter().map(|h| &h.filename).filter(non_empty).cloned().collect()
    };

    FacetOptions {
        categories: categories.into_iter().collect(),
        sources: sources.into_iter().collect(),
        tags,
        documents: documents.into_iter().collect(),
    }
}
