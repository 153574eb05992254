//! Terminal output for roles, review stats, and scan history.
//!
//! Cards are grouped by section with aligned labels; lists are compact
//! tables truncated to the terminal-friendly widths below.

use aegis_core::{AdjudicationStatus, ReviewStats, Role, ScanHistoryEntry};

const MAX_LIST_ITEMS: usize = 10;
const NAME_WIDTH: usize = 36;
const CATEGORY_WIDTH: usize = 20;

// ── Role card ──

/// Print one role as a vertical card. `status` overrides the role's own
/// status (the adjudication lookup wins over the roles payload).
pub fn print_role_card(role: &Role, status: AdjudicationStatus) {
    for line in card_lines(role, status) {
        println!("{line}");
    }
}

fn card_lines(role: &Role, status: AdjudicationStatus) -> Vec<String> {
    let mut out = vec![format!("=== {} ===", role.name)];
    if !role.description.is_empty() {
        out.push(role.description.clone());
    }
    out.push(String::new());

    out.push("Classification".into());
    push_field(&mut out, "status", status.label());
    push_field(&mut out, "category", &role.category);
    push_field(&mut out, "source", &role.source);
    if role.confidence > 0.0 {
        push_field(&mut out, "confidence", &format!("{:.2}", role.confidence));
    }
    out.push(String::new());

    out.push("Counts".into());
    push_field(&mut out, "responsibilities", &role.responsibility_count.to_string());
    push_field(&mut out, "document count", &role.document_count.to_string());
    push_field(&mut out, "mentions", &role.mention_count.to_string());
    out.push(String::new());

    let tags: Vec<String> = role
        .function_tags
        .iter()
        .map(|t| {
            if t.name.is_empty() || t.name == t.code {
                t.code.clone()
            } else {
                format!("{} ({})", t.code, t.name)
            }
        })
        .collect();
    if !role.aliases.is_empty() || !role.documents.is_empty() || !tags.is_empty() {
        out.push("Relationships".into());
        push_list(&mut out, "aliases", &role.aliases);
        push_list(&mut out, "function tags", &tags);
        push_list(&mut out, "documents", &role.documents);
        out.push(String::new());
    }
    out
}

fn push_field(out: &mut Vec<String>, label: &str, value: &str) {
    if !value.is_empty() {
        out.push(format!("  {label:<26} {value}"));
    }
}

fn push_list(out: &mut Vec<String>, label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    let shown = items.len().min(MAX_LIST_ITEMS);
    let mut value = items[..shown].join(", ");
    if items.len() > shown {
        value.push_str(&format!(" ... and {} more", items.len() - shown));
    }
    push_field(out, label, &value);
}

// ── Role table ──

/// Print roles as one row each, with the effective status per row.
pub fn print_role_table(roles: &[Role], status_of: impl Fn(&Role) -> AdjudicationStatus) {
    println!(
        "{:<NAME_WIDTH$} {:<CATEGORY_WIDTH$} {:<12} {:>5} {:>5} {:>5}",
        "ROLE", "CATEGORY", "STATUS", "RESP", "DOCS", "CONF"
    );
    for role in roles {
        println!(
            "{:<NAME_WIDTH$} {:<CATEGORY_WIDTH$} {:<12} {:>5} {:>5} {:>5.2}",
            truncate(&role.name, NAME_WIDTH),
            truncate(&role.category, CATEGORY_WIDTH),
            status_of(role).as_str(),
            role.responsibility_count,
            role.document_count,
            role.confidence,
        );
    }
}

/// Cut `s` to at most `width` characters, marking the cut with `…`.
fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

// ── Stats & history ──

pub fn print_stats(stats: &ReviewStats) {
    println!("Review progress");
    println!("  {:<26} {}", "total", stats.total);
    println!("  {:<26} {}", "pending", stats.pending);
    println!("  {:<26} {}", "reviewed", stats.reviewed);
    println!("  {:<26} {}", "confirmed", stats.confirmed);
    println!("  {:<26} {}", "rejected", stats.rejected);
    println!("  {:<26} {:.0}%", "progress", stats.progress() * 100.0);
}

pub fn print_history(entries: &[ScanHistoryEntry]) {
    println!(
        "{:>6}  {:<20}  {:<NAME_WIDTH$} {:>6} {:>6}",
        "ID", "SCANNED", "FILE", "ROLES", "ISSUES"
    );
    for entry in entries {
        let scanned = entry
            .scanned_at()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| entry.scan_time.clone());
        println!(
            "{:>6}  {:<20}  {:<NAME_WIDTH$} {:>6} {:>6}",
            entry.id,
            truncate(&scanned, 20),
            truncate(&entry.filename, NAME_WIDTH),
            entry.role_count,
            entry.issue_count,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core::FunctionTag;

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn card_uses_override_status_and_skips_empty_sections() {
        let mut role = Role::named("Safety Officer");
        role.responsibility_count = 4;
        let lines = card_lines(&role, AdjudicationStatus::Confirmed);
        assert_eq!(lines[0], "=== Safety Officer ===");
        assert!(lines.iter().any(|l| l.contains("status") && l.contains("Confirmed")));
        assert!(!lines.iter().any(|l| l == "Relationships"));
    }

    #[test]
    fn card_lists_are_truncated() {
        let mut role = Role::named("PM");
        role.documents = (0..12).map(|i| format!("doc{i}.docx")).collect();
        role.function_tags = vec![FunctionTag {
            code: "MGT".into(),
            name: "Management".into(),
            color: String::new(),
        }];
        let lines = card_lines(&role, AdjudicationStatus::Pending);
        let docs = lines.iter().find(|l| l.trim_start().starts_with("documents ")).unwrap();
        assert!(docs.ends_with("... and 2 more"), "{docs}");
        assert!(lines.iter().any(|l| l.contains("MGT (Management)")));
    }
}
