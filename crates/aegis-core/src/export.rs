//! CSV and JSON export of role collections.

use crate::{CoreError, Role};

/// Column order for CSV export.
pub const CSV_HEADERS: &[&str] = &[
    "Role Name",
    "Category",
    "Source",
    "Status",
    "Responsibilities",
    "Mentions",
    "Documents",
    "Confidence",
    "Aliases",
    "Function Tags",
    "Document Names",
    "Description",
];

/// Separator for list-valued cells.
const LIST_SEP: &str = "; ";

/// Quote a CSV field when it contains a delimiter, quote, or line break.
/// Embedded quotes are doubled.
pub fn csv_escape(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn csv_row<I, S>(cells: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    cells
        .into_iter()
        .map(|c| csv_escape(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Render roles as CSV text with a header row. Lines end in `\r\n`.
pub fn roles_to_csv(roles: &[Role]) -> String {
    let mut out = csv_row(CSV_HEADERS.iter().copied());
    out.push_str("\r\n");
    for role in roles {
        let tags: Vec<&str> = role.function_tags.iter().map(|t| t.code.as_str()).collect();
        let cells = [
            role.name.clone(),
            role.category.clone(),
            role.source.clone(),
            role.status.as_str().to_string(),
            role.responsibility_count.to_string(),
            role.mention_count.to_string(),
            role.document_count.to_string(),
            format!("{:.2}", role.confidence),
            role.aliases.join(LIST_SEP),
            tags.join(LIST_SEP),
            role.documents.join(LIST_SEP),
            role.description.clone(),
        ];
        out.push_str(&csv_row(cells));
        out.push_str("\r\n");
    }
    out
}

/// Render roles as a pretty-printed JSON array.
pub fn roles_to_json(roles: &[Role]) -> Result<String, CoreError> {
    Ok(serde_json::to_string_pretty(roles)?)
}

/// Export format selectable by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }

    pub fn render(self, roles: &[Role]) -> Result<String, CoreError> {
        match self {
            Self::Csv => Ok(roles_to_csv(roles)),
            Self::Json => roles_to_json(roles),
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(CoreError::UnknownFormat(other.to_string())),
        }
    }
}

/// Default download filename, e.g. `aegis_roles_2026-02-21.csv`.
pub fn export_filename(format: ExportFormat, date: chrono::NaiveDate) -> String {
    format!("aegis_roles_{}.{}", date.format("%Y-%m-%d"), format.extension())
}
