//! Sort order for role collections.
//!
//! The default order is a comparator chain: responsibility count descending,
//! then document count descending. A user-chosen field takes priority with
//! its own direction, and the default chain breaks its ties. All sorts are
//! stable, so equal roles keep their input order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CoreError, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    Category,
    Status,
    ResponsibilityCount,
    DocumentCount,
    MentionCount,
    Confidence,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Category => "category",
            Self::Status => "status",
            Self::ResponsibilityCount => "responsibility_count",
            Self::DocumentCount => "document_count",
            Self::MentionCount => "mention_count",
            Self::Confidence => "confidence",
        }
    }

    /// Direction used when the user picks this field without choosing one.
    /// Text sorts ascending, counts descending.
    pub fn natural_direction(self) -> SortDirection {
        match self {
            Self::Name | Self::Category | Self::Status => SortDirection::Ascending,
            _ => SortDirection::Descending,
        }
    }

    fn compare(self, a: &Role, b: &Role) -> Ordering {
        match self {
            Self::Name => cmp_text(&a.name, &b.name),
            Self::Category => cmp_text(&a.category, &b.category),
            Self::Status => a.status.cmp(&b.status),
            Self::ResponsibilityCount => a.responsibility_count.cmp(&b.responsibility_count),
            Self::DocumentCount => a.document_count.cmp(&b.document_count),
            Self::MentionCount => a.mention_count.cmp(&b.mention_count),
            Self::Confidence => a.confidence.total_cmp(&b.confidence),
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "name" => Ok(Self::Name),
            "category" => Ok(Self::Category),
            "status" => Ok(Self::Status),
            "responsibility_count" | "responsibilities" => Ok(Self::ResponsibilityCount),
            "document_count" | "documents" => Ok(Self::DocumentCount),
            "mention_count" | "mentions" => Ok(Self::MentionCount),
            "confidence" => Ok(Self::Confidence),
            other => Err(CoreError::UnknownSortField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            Self::Ascending => ord,
            Self::Descending => ord.reverse(),
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

/// A user-chosen sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// Sort by `field` in its natural direction.
    pub fn by(field: SortField) -> Self {
        Self::new(field, field.natural_direction())
    }
}

/// Case-insensitive text comparison with a byte-order tie-break.
fn cmp_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Default chain: responsibility count desc, then document count desc.
pub fn default_order(a: &Role, b: &Role) -> Ordering {
    b.responsibility_count
        .cmp(&a.responsibility_count)
        .then_with(|| b.document_count.cmp(&a.document_count))
}

/// Compare two roles under an optional user sort.
pub fn compare_roles(a: &Role, b: &Role, sort: Option<SortSpec>) -> Ordering {
    match sort {
        Some(spec) => spec
            .direction
            .apply(spec.field.compare(a, b))
            .then_with(|| default_order(a, b)),
        None => default_order(a, b),
    }
}

/// Stable in-place sort.
pub fn sort_roles(roles: &mut [Role], sort: Option<SortSpec>) {
    roles.sort_by(|a, b| compare_roles(a, b, sort));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(name: &str, responsibilities: u32, documents: u32) -> Role {
        Role {
            name: name.into(),
            responsibility_count: responsibilities,
            document_count: documents,
            ..Default::default()
        }
    }

    fn names(roles: &[Role]) -> Vec<&str> {
        roles.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn default_chain_uses_document_count_tiebreak() {
        let mut roles = vec![role("A", 5, 0), role("B", 9, 0), role("C", 9, 2)];
        sort_roles(&mut roles, None);
        assert_eq!(names(&roles), vec!["C", "B", "A"]);
    }

    #[test]
    fn default_chain_is_stable() {
        let mut roles = vec![role("first", 3, 1), role("second", 3, 1), role("third", 3, 1)];
        sort_roles(&mut roles, None);
        assert_eq!(names(&roles), vec!["first", "second", "third"]);
    }

    #[test]
    fn user_sort_takes_priority() {
        let mut roles = vec![role("beta", 9, 0), role("Alpha", 1, 0), role("gamma", 5, 0)];
        sort_roles(&mut roles, Some(SortSpec::by(SortField::Name)));
        assert_eq!(names(&roles), vec!["Alpha", "beta", "gamma"]);

        sort_roles(
            &mut roles,
            Some(SortSpec::new(SortField::Name, SortDirection::Descending)),
        );
        assert_eq!(names(&roles), vec!["gamma", "beta", "Alpha"]);
    }

    #[test]
    fn user_sort_ties_fall_back_to_default_chain() {
        let mut roles = vec![role("x", 1, 0), role("y", 7, 0)];
        roles[0].category = "Engineering".into();
        roles[1].category = "Engineering".into();
        sort_roles(&mut roles, Some(SortSpec::by(SortField::Category)));
        assert_eq!(names(&roles), vec!["y", "x"]);
    }

    #[test]
    fn confidence_ascending() {
        let mut roles = vec![role("hi", 0, 0), role("lo", 0, 0)];
        roles[0].confidence = 0.9;
        roles[1].confidence = 0.4;
        sort_roles(
            &mut roles,
            Some(SortSpec::new(SortField::Confidence, SortDirection::Ascending)),
        );
        assert_eq!(names(&roles), vec!["lo", "hi"]);
    }

    #[test]
    fn parse_sort_field() {
        assert_eq!("responsibility-count".parse::<SortField>().unwrap(), SortField::ResponsibilityCount);
        assert_eq!("Mentions".parse::<SortField>().unwrap(), SortField::MentionCount);
        assert!("size".parse::<SortField>().is_err());
    }

    #[test]
    fn direction_toggle() {
        assert_eq!(SortDirection::Ascending.toggled(), SortDirection::Descending);
        assert_eq!(SortDirection::default().toggled(), SortDirection::Ascending);
    }
}
