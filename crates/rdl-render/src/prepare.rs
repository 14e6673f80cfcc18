//! Render preparation
//!
//! A [`PreparedReport`] is built once per loaded definition and shared as
//! `Arc<PreparedReport>` by every render of that report. It holds what can
//! be decided without data: the hierarchy index of each Tablix, which body
//! rows repeat per data row, and which textboxes act as toggle items.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use log::debug;
use rdl_model::{HierarchyIndex, ItemKind, Report, ReportItem, Tablix, TablixMember};
use rdl_parser::{is_expression, parse_expression};

/// Per-Tablix layout facts
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedTablix {
    pub rows: HierarchyIndex,
    pub columns: HierarchyIndex,
    /// Per body row: contains a field reference outside any aggregate
    pub repeating: Vec<bool>,
    /// Leading header columns emitted for row members
    pub row_header_columns: usize,
    /// Header rows emitted for column members
    pub column_header_rows: usize,
}

impl PreparedTablix {
    pub fn prepare(tablix: &Tablix) -> Self {
        let rows = HierarchyIndex::build(&tablix.row_hierarchy);
        let columns = HierarchyIndex::build(&tablix.column_hierarchy);
        let repeating = tablix
            .body
            .rows
            .iter()
            .map(|row| {
                row.cells
                    .iter()
                    .filter_map(|cell| cell.contents.as_ref())
                    .any(item_references_bare_field)
            })
            .collect();
        let row_header_columns = if any_header(&tablix.row_hierarchy) {
            rows.max_depth()
        } else {
            0
        };
        let column_header_rows = if any_header(&tablix.column_hierarchy) {
            columns.max_depth()
        } else {
            0
        };

        Self {
            rows,
            columns,
            repeating,
            row_header_columns,
            column_header_rows,
        }
    }

    pub fn is_repeating(&self, body_row: usize) -> bool {
        self.repeating.get(body_row).copied().unwrap_or(false)
    }
}

/// A report definition with its render-time index
#[derive(Debug)]
pub struct PreparedReport {
    report: Arc<Report>,
    tablixes: HashMap<String, PreparedTablix>,
    toggle_sources: HashSet<String>,
}

impl PreparedReport {
    pub fn prepare(report: Arc<Report>) -> Arc<Self> {
        let mut tablixes = HashMap::new();
        let mut toggle_sources = HashSet::new();

        for item in report.all_items() {
            if let Some(toggle) = item.toggle_item() {
                toggle_sources.insert(toggle.to_string());
            }
            if let ItemKind::Tablix(tablix) = &item.kind {
                collect_member_toggles(
                    tablix.row_hierarchy.iter().chain(&tablix.column_hierarchy),
                    &mut toggle_sources,
                );
                tablixes.insert(item.name.clone(), PreparedTablix::prepare(tablix));
            }
        }
        debug!(
            "Prepared report '{}': {} tablix(es), {} toggle item(s)",
            report.name,
            tablixes.len(),
            toggle_sources.len()
        );

        Arc::new(Self {
            report,
            tablixes,
            toggle_sources,
        })
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn shared_report(&self) -> Arc<Report> {
        Arc::clone(&self.report)
    }

    /// Layout facts of a Tablix, by item name
    pub fn tablix(&self, name: &str) -> Option<&PreparedTablix> {
        self.tablixes.get(name)
    }

    /// Whether some item or member names `name` as its toggle item
    pub fn is_toggle_source(&self, name: &str) -> bool {
        self.toggle_sources.contains(name)
    }
}

fn any_header(members: &[TablixMember]) -> bool {
    members
        .iter()
        .any(|m| m.header.is_some() || any_header(&m.children))
}

fn collect_member_toggles<'a>(
    members: impl Iterator<Item = &'a TablixMember>,
    out: &mut HashSet<String>,
) {
    for member in members {
        if let Some(toggle) = member.visibility.as_ref().and_then(|v| v.toggle_item.as_ref()) {
            out.insert(toggle.clone());
        }
        collect_member_toggles(member.children.iter(), out);
    }
}

/// Whether an item (or anything inside it) shows a per-row field value
fn item_references_bare_field(item: &ReportItem) -> bool {
    let own = match &item.kind {
        ItemKind::Textbox(textbox) => textbox.runs.iter().any(|run| text_references_bare_field(run)),
        ItemKind::Image(image) => text_references_bare_field(&image.value),
        _ => false,
    };
    own || item
        .child_items()
        .into_iter()
        .filter(|child| !matches!(child.kind, ItemKind::Tablix(_)))
        .any(item_references_bare_field)
}

fn text_references_bare_field(text: &str) -> bool {
    is_expression(text)
        && parse_expression(text).is_ok_and(|expr| expr.references_bare_field())
}
