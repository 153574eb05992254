//! Renderers: pure functions from a filtered role collection to markup.
//!
//! Each view mode regenerates the whole container on every call. Interactive
//! elements carry `data-action` plus `data-role`, `data-status`, `data-tag`,
//! `data-field` or `data-mode` attributes; the [`EventDelegator`](crate::EventDelegator)
//! turns those into intents, so rendering never attaches handlers.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write;

use aegis_core::{AdjudicationStatus, Role, SortField};

use crate::ViewMode;
use crate::markup::{attr, css_color, escape};

const EMPTY_FILTERED: &str = "No roles match the current filters";
const EMPTY_SOURCE: &str = "No roles have been extracted yet";
const UNCATEGORIZED: &str = "Uncategorized";

/// Everything a renderer reads besides the roles themselves.
#[derive(Debug, Default, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Decision overrides from the adjudication lookup, keyed by role name.
    pub badges: Option<&'a HashMap<String, AdjudicationStatus>>,
    pub selection: Option<&'a BTreeSet<String>>,
    /// Whether any filter is narrowing the collection.
    pub filter_active: bool,
    /// Size of the unfiltered collection.
    pub total: usize,
}

impl RenderContext<'_> {
    fn status_of(&self, role: &Role) -> AdjudicationStatus {
        self.badges
            .and_then(|b| b.get(&role.name).copied())
            .unwrap_or(role.status)
    }

    fn is_selected(&self, role: &Role) -> bool {
        self.selection.is_some_and(|s| s.contains(&role.name))
    }
}

/// Render `roles` in the given mode.
pub fn render(mode: ViewMode, roles: &[Role], ctx: &RenderContext<'_>) -> String {
    if roles.is_empty() {
        return render_empty(ctx);
    }
    match mode {
        ViewMode::Table => render_table(roles, ctx),
        ViewMode::Card => render_cards(roles, ctx),
        ViewMode::Kanban => render_kanban(roles, ctx),
        ViewMode::Tree => render_tree(roles, ctx),
    }
}

/// Empty-state message for the current context.
pub fn empty_message(ctx: &RenderContext<'_>) -> &'static str {
    if ctx.filter_active && ctx.total > 0 {
        EMPTY_FILTERED
    } else {
        EMPTY_SOURCE
    }
}

fn render_empty(ctx: &RenderContext<'_>) -> String {
    let mut out = String::from("<div class=\"empty-state\">");
    let _ = write!(out, "<p>{}</p>", empty_message(ctx));
    if empty_message(ctx) == EMPTY_FILTERED {
        out.push_str("<button data-action=\"clear-filters\">Clear filters</button>");
    }
    out.push_str("</div>");
    out
}

// ── Shared fragments ──

fn badge(status: AdjudicationStatus) -> String {
    format!(
        "<span class=\"badge badge-{}\">{}</span>",
        status.as_str(),
        status.label()
    )
}

fn tags(role: &Role) -> String {
    let mut out = String::from("<span class=\"tags\">");
    for tag in &role.function_tags {
        let _ = write!(
            out,
            "<span class=\"tag\" style=\"background:{}\" title=\"{}\">{}<button{}{}{}>&times;</button></span>",
            css_color(&tag.color),
            escape(&tag.name),
            escape(&tag.code),
            attr("data-action", "remove-tag"),
            attr("data-role", &role.name),
            attr("data-tag", &tag.code),
        );
    }
    out.push_str("</span>");
    out
}

fn status_buttons(role: &Role, current: AdjudicationStatus) -> String {
    let mut out = String::from("<span class=\"actions\">");
    for status in AdjudicationStatus::ALL.into_iter().filter(|s| *s != current) {
        let _ = write!(
            out,
            "<button{}{}{}>{}</button>",
            attr("data-action", "set-status"),
            attr("data-role", &role.name),
            attr("data-status", status.as_str()),
            status.label()
        );
    }
    out.push_str("</span>");
    out
}

fn checkbox(role: &Role, ctx: &RenderContext<'_>) -> String {
    format!(
        "<input type=\"checkbox\"{}{}{}>",
        attr("data-action", "toggle-select"),
        attr("data-role", &role.name),
        if ctx.is_selected(role) { " checked" } else { "" }
    )
}

// ── Table ──

const TABLE_COLUMNS: &[(&str, Option<SortField>)] = &[
    ("Role", Some(SortField::Name)),
    ("Category", Some(SortField::Category)),
    ("Responsibilities", Some(SortField::ResponsibilityCount)),
    ("Documents", Some(SortField::DocumentCount)),
    ("Status", Some(SortField::Status)),
    ("Tags", None),
    ("Actions", None),
];

fn render_table(roles: &[Role], ctx: &RenderContext<'_>) -> String {
    let mut out = String::from("<table class=\"roles-table\" data-view=\"table\"><thead><tr><th></th>");
    for (label, field) in TABLE_COLUMNS {
        match field {
            Some(f) => {
                let _ = write!(
                    out,
                    "<th{}{}>{label}</th>",
                    attr("data-action", "sort"),
                    attr("data-field", f.as_str())
                );
            }
            None => {
                let _ = write!(out, "<th>{label}</th>");
            }
        }
    }
    out.push_str("</tr></thead><tbody>");
    for role in roles {
        let status = ctx.status_of(role);
        let _ = write!(
            out,
            "<tr{}{}><td>{}</td><td class=\"role-name\">{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            attr("data-role", &role.name),
            if ctx.is_selected(role) { " class=\"selected\"" } else { "" },
            checkbox(role, ctx),
            escape(&role.name),
            escape(&role.category),
            role.responsibility_count,
            role.document_count,
            badge(status),
            tags(role),
            status_buttons(role, status),
        );
    }
    out.push_str("</tbody></table>");
    out
}

// ── Cards ──

fn render_cards(roles: &[Role], ctx: &RenderContext<'_>) -> String {
    let mut out = String::from("<div class=\"role-cards\" data-view=\"card\">");
    for role in roles {
        let status = ctx.status_of(role);
        let _ = write!(
            out,
            "<div class=\"role-card{}\"{}><div class=\"card-header\">{}<h3>{}</h3>{}</div>",
            if ctx.is_selected(role) { " selected" } else { "" },
            attr("data-role", &role.name),
            checkbox(role, ctx),
            escape(&role.name),
            badge(status),
        );
        if !role.category.is_empty() {
            let _ = write!(out, "<div class=\"category\">{}</div>", escape(&role.category));
        }
        if !role.description.is_empty() {
            let _ = write!(out, "<p class=\"description\">{}</p>", escape(&role.description));
        }
        let _ = write!(
            out,
            "<div class=\"stats\">{} responsibilities &middot; {} documents &middot; {} mentions</div>",
            role.responsibility_count, role.document_count, role.mention_count
        );
        if !role.aliases.is_empty() {
            let aliases: Vec<String> = role.aliases.iter().map(|a| escape(a)).collect();
            let _ = write!(out, "<div class=\"aliases\">Also: {}</div>", aliases.join(", "));
        }
        out.push_str(&tags(role));
        out.push_str(&status_buttons(role, status));
        out.push_str("</div>");
    }
    out.push_str("</div>");
    out
}

// ── Kanban ──

/// Column order on the board.
const KANBAN_COLUMNS: [AdjudicationStatus; 4] = [
    AdjudicationStatus::Pending,
    AdjudicationStatus::Confirmed,
    AdjudicationStatus::Deliverable,
    AdjudicationStatus::Rejected,
];

fn render_kanban(roles: &[Role], ctx: &RenderContext<'_>) -> String {
    let mut out = String::from("<div class=\"kanban-board\" data-view=\"kanban\">");
    for column in KANBAN_COLUMNS {
        let cards: Vec<&Role> = roles.iter().filter(|r| ctx.status_of(r) == column).collect();
        let _ = write!(
            out,
            "<div class=\"kanban-column\"{}{}><h4>{} <span class=\"count\">{}</span></h4>",
            attr("data-drop-action", "drop"),
            attr("data-status", column.as_str()),
            column.label(),
            cards.len()
        );
        for role in cards {
            let _ = write!(
                out,
                "<div class=\"kanban-card\" draggable=\"true\"{}><strong>{}</strong><small>{}</small>{}</div>",
                attr("data-role", &role.name),
                escape(&role.name),
                escape(&role.category),
                tags(role),
            );
        }
        out.push_str("</div>");
    }
    out.push_str("</div>");
    out
}

// ── Hierarchy tree ──

fn render_tree(roles: &[Role], ctx: &RenderContext<'_>) -> String {
    // Categories alphabetically; roles keep their filtered order within a group.
    let mut groups: BTreeMap<&str, Vec<&Role>> = BTreeMap::new();
    for role in roles {
        let key = if role.category.is_empty() {
            UNCATEGORIZED
        } else {
            role.category.as_str()
        };
        groups.entry(key).or_default().push(role);
    }

    let mut out = String::from("<ul class=\"role-tree\" data-view=\"tree\">");
    for (category, members) in groups {
        let _ = write!(
            out,
            "<li class=\"tree-node\"><details open><summary>{} <span class=\"count\">{}</span></summary><ul>",
            escape(category),
            members.len()
        );
        for role in members {
            let _ = write!(
                out,
                "<li class=\"tree-leaf\"{}>{}{} {}</li>",
                attr("data-role", &role.name),
                checkbox(role, ctx),
                escape(&role.name),
                badge(ctx.status_of(role)),
            );
        }
        out.push_str("</ul></details></li>");
    }
    out.push_str("</ul>");
    out
}
