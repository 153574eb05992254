//! Shared review types exchanged between the AEGIS backend and the client.
//!
//! Backend payloads are loosely shaped: any field may be absent or `null`.
//! Every field here defaults at the deserialization boundary (numbers to
//! `0`, strings to `""`, lists to empty) so downstream code never has to
//! check for missing values.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::CoreError;

/// Deserialize `null` as the type's default.
///
/// `#[serde(default)]` covers a missing key; this covers an explicit null.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Adjudication state of a role.
///
/// Every state can move to every other state; there is no terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjudicationStatus {
    #[default]
    Pending,
    Confirmed,
    Rejected,
    Deliverable,
}

impl AdjudicationStatus {
    pub const ALL: [AdjudicationStatus; 4] = [
        AdjudicationStatus::Pending,
        AdjudicationStatus::Confirmed,
        AdjudicationStatus::Deliverable,
        AdjudicationStatus::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
            Self::Deliverable => "deliverable",
        }
    }

    /// Human label used for column headers and badges.
    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::Rejected => "Rejected",
            Self::Deliverable => "Deliverable",
        }
    }

    /// Whether a reviewer has made a decision.
    pub fn is_reviewed(self) -> bool {
        self != Self::Pending
    }
}

impl fmt::Display for AdjudicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdjudicationStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" | "confirm" => Ok(Self::Confirmed),
            "rejected" | "reject" => Ok(Self::Rejected),
            "deliverable" => Ok(Self::Deliverable),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

/// Unknown status strings decode as `Pending`.
impl<'de> Deserialize<'de> for AdjudicationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(raw.parse().unwrap_or_default())
    }
}

/// A function tag attached to a role. Identity is the `code`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionTag {
    #[serde(default, deserialize_with = "null_as_default")]
    pub code: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub color: String,
}

/// A role extracted from one or more scanned documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default, alias = "role_name", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub aliases: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub documents: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub responsibility_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mention_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub document_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: AdjudicationStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub function_tags: Vec<FunctionTag>,
}

impl Role {
    /// A role with only a name set; everything else defaulted.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn has_tag(&self, code: &str) -> bool {
        self.function_tags.iter().any(|t| t.code == code)
    }
}

/// One adjudication decision as persisted by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(default, deserialize_with = "null_as_default")]
    pub role_name: String,
    #[serde(rename = "action", alias = "status", default, deserialize_with = "null_as_default")]
    pub status: AdjudicationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Decision {
    pub fn new(role_name: impl Into<String>, status: AdjudicationStatus) -> Self {
        Self {
            role_name: role_name.into(),
            status,
            notes: None,
        }
    }
}

/// Aggregate review counts shown in the dashboard header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub pending: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reviewed: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub rejected: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confirmed: u32,
}

impl ReviewStats {
    /// Compute stats from a local role collection.
    pub fn from_roles<'a>(roles: impl IntoIterator<Item = &'a Role>) -> Self {
        let mut stats = Self::default();
        for role in roles {
            stats.total += 1;
            match role.status {
                AdjudicationStatus::Pending => stats.pending += 1,
                AdjudicationStatus::Confirmed => stats.confirmed += 1,
                AdjudicationStatus::Rejected => stats.rejected += 1,
                AdjudicationStatus::Deliverable => {}
            }
            if role.status.is_reviewed() {
                stats.reviewed += 1;
            }
        }
        stats
    }

    /// Fraction of roles reviewed, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.reviewed) / f64::from(self.total)
        }
    }
}

/// One document scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanHistoryEntry {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub filename: String,
    /// ISO 8601 timestamp string; parse with [`scanned_at`](Self::scanned_at).
    #[serde(default, deserialize_with = "null_as_default")]
    pub scan_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub role_count: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub issue_count: u32,
}

impl ScanHistoryEntry {
    /// Parse `scan_time`, accepting RFC 3339 or a naive `YYYY-MM-DDTHH:MM:SS`
    /// timestamp (interpreted as UTC).
    pub fn scanned_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.scan_time.trim();
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(ts.with_timezone(&Utc));
        }
        ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }
}

/// Role → documents join table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleDocumentMatrix {
    #[serde(default, deserialize_with = "null_as_default")]
    pub documents: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub connections: BTreeMap<String, Vec<String>>,
}

impl RoleDocumentMatrix {
    /// Fill in `documents` for roles whose payload omitted them.
    ///
    /// Roles that already list documents are left alone.
    pub fn attach_documents(&self, roles: &mut [Role]) {
        for role in roles.iter_mut().filter(|r| r.documents.is_empty()) {
            if let Some(docs) = self.connections.get(&role.name) {
                role.documents = docs.clone();
                if role.document_count == 0 {
                    role.document_count = docs.len() as u32;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_missing_fields_default() {
        let role: Role = serde_json::from_str(r#"{"role_name": "Project Manager"}"#).unwrap();
        assert_eq!(role.name, "Project Manager");
        assert_eq!(role.category, "");
        assert_eq!(role.responsibility_count, 0);
        assert_eq!(role.confidence, 0.0);
        assert_eq!(role.status, AdjudicationStatus::Pending);
        assert!(role.function_tags.is_empty());
    }

    #[test]
    fn role_null_fields_default() {
        let json = r#"{
            "name": "Engineer",
            "category": null,
            "documents": null,
            "responsibility_count": null,
            "status": null
        }"#;
        let role: Role = serde_json::from_str(json).unwrap();
        assert_eq!(role.category, "");
        assert!(role.documents.is_empty());
        assert_eq!(role.responsibility_count, 0);
        assert_eq!(role.status, AdjudicationStatus::Pending);
    }

    #[test]
    fn unknown_status_decodes_as_pending() {
        let role: Role = serde_json::from_str(r#"{"name": "X", "status": "archived"}"#).unwrap();
        assert_eq!(role.status, AdjudicationStatus::Pending);
    }

    #[test]
    fn status_decodes_known_and_unknown_values() {
        let decoded: Vec<AdjudicationStatus> =
            serde_json::from_str(r#"["rejected", "DELIVERABLE", "on-hold", "pending"]"#).unwrap();
        assert_eq!(
            decoded,
            vec![
                AdjudicationStatus::Rejected,
                AdjudicationStatus::Deliverable,
                AdjudicationStatus::Pending,
                AdjudicationStatus::Pending,
            ]
        );
        let decision: Decision =
            serde_json::from_str(r#"{"role_name": "PM", "action": "confirmed"}"#).unwrap();
        assert_eq!(decision.status, AdjudicationStatus::Confirmed);
        assert!(AdjudicationStatus::Pending < AdjudicationStatus::Deliverable);
    }

    #[test]
    fn status_parse_accepts_verbs() {
        assert_eq!("confirm".parse::<AdjudicationStatus>().unwrap(), AdjudicationStatus::Confirmed);
        assert_eq!(" Rejected ".parse::<AdjudicationStatus>().unwrap(), AdjudicationStatus::Rejected);
        assert!("maybe".parse::<AdjudicationStatus>().is_err());
    }

    #[test]
    fn decision_serializes_status_as_action() {
        let decision = Decision::new("Safety Officer", AdjudicationStatus::Deliverable);
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["role_name"], "Safety Officer");
        assert_eq!(json["action"], "deliverable");
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn stats_from_roles() {
        let mut roles = vec![Role::named("A"), Role::named("B"), Role::named("C")];
        roles[1].status = AdjudicationStatus::Confirmed;
        roles[2].status = AdjudicationStatus::Deliverable;
        let stats = ReviewStats::from_roles(&roles);
        assert_eq!(stats.total, 3);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.confirmed, 1);
        assert_eq!(stats.reviewed, 2);
        assert!((stats.progress() - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn scan_time_formats() {
        let mut entry = ScanHistoryEntry {
            scan_time: "2026-02-21T10:00:00Z".into(),
            ..Default::default()
        };
        assert!(entry.scanned_at().is_some());
        entry.scan_time = "2026-02-21 10:00:00.123".into();
        assert!(entry.scanned_at().is_some());
        entry.scan_time = "yesterday".into();
        assert!(entry.scanned_at().is_none());
    }

    #[test]
    fn matrix_fills_missing_documents() {
        let mut matrix = RoleDocumentMatrix::default();
        matrix
            .connections
            .insert("Engineer".into(), vec!["spec.docx".into(), "plan.pdf".into()]);
        let mut roles = vec![Role::named("Engineer"), Role::named("Auditor")];
        roles[1].documents = vec!["audit.pdf".into()];
        matrix.attach_documents(&mut roles);
        assert_eq!(roles[0].documents.len(), 2);
        assert_eq!(roles[0].document_count, 2);
        assert_eq!(roles[1].documents, vec!["audit.pdf".to_string()]);
    }
}
