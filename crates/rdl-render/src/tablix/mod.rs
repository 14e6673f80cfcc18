//! Tablix rendering
//!
//! A Tablix renders as one HTML table. Column members expand first into
//! column slots. Row members then expand depth-first: a grouped member
//! partitions its scope into sorted instances, a static member renders once
//! in the scope it inherits, and a leaf member emits its body row. Row
//! headers are prepended afterwards with a rowspan covering every row their
//! member produced.
//!
//! A body row that references a field outside any aggregate repeats once
//! per row of its scope when no group encloses it; under a group it
//! renders once per group instance.

mod columns;
mod grouping;

use std::fmt::Write;

use log::debug;
use rdl_eval::{EvaluationContext, Globals};
use rdl_model::{DataRow, MemberId, ReportItem, Tablix, TablixMember, TablixRow};

pub use columns::{ColumnLayout, ColumnSlot};
pub use grouping::{GroupInstance, RowOrdinals};

use crate::error::RenderResult;
use crate::html::{escape_text, pt};
use crate::items::Placement;
use crate::pagination::page_window;
use crate::prepare::PreparedTablix;
use crate::scope::RenderScope;
use crate::visibility::instance_key;

/// One emitted `<tr>`
#[derive(Debug, Clone)]
struct OutputRow {
    height: f64,
    cells: Vec<String>,
}

/// Rows a row member renders over
#[derive(Debug, Clone, Copy)]
struct RowScope<'s, 'r> {
    rows: &'s [&'r DataRow],
    /// Inside a group instance
    grouped: bool,
    /// Key of the enclosing group instance
    instance: Option<&'s str>,
}

struct TablixPass<'p, 'a, 'r> {
    scope: &'p RenderScope<'a>,
    name: &'p str,
    tablix: &'p Tablix,
    prepared: &'p PreparedTablix,
    columns: ColumnLayout<'r>,
    ordinals: RowOrdinals,
}

impl RenderScope<'_> {
    pub fn render_tablix(
        &self,
        name: &str,
        tablix: &Tablix,
        ctx: &EvaluationContext<'_>,
    ) -> RenderResult<String> {
        let fallback;
        let prepared = match self.prepared.tablix(name) {
            Some(prepared) => prepared,
            None => {
                fallback = PreparedTablix::prepare(tablix);
                &fallback
            }
        };

        let dataset = tablix.dataset_name.as_deref().filter(|n| !n.is_empty());
        let inherits = match (dataset, ctx.active_dataset) {
            (None, _) => true,
            (Some(own), Some(active)) => own.eq_ignore_ascii_case(active),
            (Some(_), None) => false,
        };
        let all_rows: Vec<&DataRow> = match (ctx.scope_rows.filter(|_| inherits), dataset) {
            (Some(rows), _) => rows.to_vec(),
            (None, Some(name)) => self.data.rows(name).map(|r| r.iter().collect()).unwrap_or_default(),
            (None, None) => self.data.only().map(|(_, r)| r.iter().collect()).unwrap_or_default(),
        };

        if all_rows.is_empty() {
            if let Some(message) = &tablix.no_rows_message {
                let text = self.evaluate_text(message, ctx, "")?;
                return Ok(format!("<div class=\"rdl-norows\">{}</div>", escape_text(&text)));
            }
        }

        let requested = self.pages.page(name);
        let (window, page, total_pages) = match self.options.page_size {
            Some(size) => {
                let total = all_rows.len().div_ceil(size).max(1);
                (page_window(all_rows.len(), requested, size), requested.min(total), total)
            }
            None => (0..all_rows.len(), requested, self.globals.total_pages.max(requested)),
        };
        debug!(
            "Tablix '{}': {} of {} row(s), page {}/{}",
            name,
            window.len(),
            all_rows.len(),
            page,
            total_pages
        );

        let globals = Globals {
            page_number: page,
            total_pages,
            ..self.globals.clone()
        };
        let mut tablix_ctx = ctx.with_globals(&globals);
        if let Some(dataset) = dataset {
            tablix_ctx = tablix_ctx.with_dataset(dataset);
        }
        let rows = &all_rows[window];
        let scoped = tablix_ctx.with_scope(rows);

        let mut pass = TablixPass {
            scope: self,
            name,
            tablix,
            prepared,
            columns: ColumnLayout::default(),
            ordinals: RowOrdinals::new(&all_rows),
        };
        pass.columns = pass.expand_columns(rows, &scoped)?;

        let top = RowScope {
            rows,
            grouped: false,
            instance: None,
        };
        let mut body = Vec::new();
        if tablix.row_hierarchy.is_empty() {
            for ordinal in 0..tablix.body.rows.len() {
                pass.emit_body_row(ordinal, top, &scoped, &mut body)?;
            }
        } else {
            pass.render_members(&tablix.row_hierarchy, prepared.rows.roots(), top, &scoped, &mut body)?;
        }

        pass.assemble(body, &scoped)
    }
}

impl<'r> TablixPass<'_, '_, 'r> {
    fn render_members(
        &self,
        members: &[TablixMember],
        ids: &[MemberId],
        scope: RowScope<'_, '_>,
        ctx: &EvaluationContext<'_>,
        out: &mut Vec<OutputRow>,
    ) -> RenderResult<()> {
        for (member, &id) in members.iter().zip(ids) {
            let Some(group) = &member.group else {
                if self.scope.is_visible(member.visibility.as_ref(), ctx, scope.instance)? {
                    self.render_member(member, id, scope, ctx, out)?;
                }
                continue;
            };

            let instances = self.scope.group_rows(group, scope.rows, &self.ordinals, ctx)?;
            let instances = self.scope.sort_instances(&member.sort_expressions, instances, ctx)?;
            for group_instance in &instances {
                let key = instance_key(self.name, id, &group_instance.key_text);
                let instance_ctx = group_instance.context(ctx);
                if !self.scope.is_visible(member.visibility.as_ref(), &instance_ctx, scope.instance)? {
                    continue;
                }
                let inner = RowScope {
                    rows: &group_instance.rows,
                    grouped: true,
                    instance: Some(&key),
                };
                self.render_member(member, id, inner, &instance_ctx, out)?;
            }
        }
        Ok(())
    }

    fn render_member(
        &self,
        member: &TablixMember,
        id: MemberId,
        scope: RowScope<'_, '_>,
        ctx: &EvaluationContext<'_>,
        out: &mut Vec<OutputRow>,
    ) -> RenderResult<()> {
        let start = out.len();
        if member.is_leaf() {
            if let Some(ordinal) = self.prepared.rows.leaf_ordinal(id) {
                self.emit_body_row(ordinal, scope, ctx, out)?;
            }
        } else {
            self.render_members(&member.children, self.prepared.rows.children(id), scope, ctx, out)?;
        }

        let depth = self.prepared.rows.depth(id);
        let header_columns = self.prepared.row_header_columns;
        let produced = out.len() - start;
        if depth < header_columns && produced > 0 {
            let col_span = if member.is_leaf() { header_columns - depth } else { 1 };
            let content = self.header_content(member, ctx, scope.instance)?;
            out[start]
                .cells
                .insert(0, header_cell("rdl-row-header", produced, col_span, &content));
        }
        Ok(())
    }

    fn emit_body_row(
        &self,
        ordinal: usize,
        scope: RowScope<'_, '_>,
        ctx: &EvaluationContext<'_>,
        out: &mut Vec<OutputRow>,
    ) -> RenderResult<()> {
        let Some(row) = self.tablix.body.rows.get(ordinal) else {
            debug!("Tablix '{}' has no body row {}", self.name, ordinal);
            return Ok(());
        };

        if self.prepared.is_repeating(ordinal) && !scope.grouped {
            for (index, data_row) in scope.rows.iter().enumerate() {
                let row_ctx = ctx.with_scope(scope.rows).with_row(data_row, index + 1);
                out.push(self.body_row(row, scope, &row_ctx, Some(data_row))?);
            }
        } else {
            out.push(self.body_row(row, scope, ctx, None)?);
        }
        Ok(())
    }

    fn body_row(
        &self,
        row: &TablixRow,
        scope: RowScope<'_, '_>,
        ctx: &EvaluationContext<'_>,
        current: Option<&DataRow>,
    ) -> RenderResult<OutputRow> {
        let slots = &self.columns.slots;
        let mut cells = Vec::with_capacity(slots.len());
        let mut index = 0;
        while index < slots.len() {
            let slot = &slots[index];
            let cell = row.cells.get(slot.body_column);
            let span = cell
                .map_or(1, |c| c.col_span.max(1))
                .min(slots.len() - index);
            let content = match cell.and_then(|c| c.contents.as_ref()) {
                Some(item) => self.cell_content(item, slot, scope, ctx, current)?,
                None => String::new(),
            };
            cells.push(header_cell("rdl-cell", 1, span, &content));
            index += span;
        }
        Ok(OutputRow {
            height: row.height,
            cells,
        })
    }

    /// A body cell evaluates over the rows its row scope shares with its
    /// column instance
    fn cell_content(
        &self,
        item: &ReportItem,
        slot: &ColumnSlot<'r>,
        scope: RowScope<'_, '_>,
        ctx: &EvaluationContext<'_>,
        current: Option<&DataRow>,
    ) -> RenderResult<String> {
        if slot.rows.is_none() {
            return self.scope.render_item(item, ctx, scope.instance, Placement::InCell);
        }

        let shared: Vec<&DataRow> = match current {
            Some(row) => vec![row],
            None => scope.rows.to_vec(),
        }
        .into_iter()
        .filter(|row| slot.contains(row))
        .collect();
        if shared.is_empty() {
            return Ok(String::new());
        }

        let mut cell_ctx = ctx.with_scope(&shared);
        if let Some(row) = current {
            cell_ctx = cell_ctx.with_row(row, ctx.row_number);
        }
        self.scope.render_item(item, &cell_ctx, scope.instance, Placement::InCell)
    }

    fn header_content(
        &self,
        member: &TablixMember,
        ctx: &EvaluationContext<'_>,
        instance: Option<&str>,
    ) -> RenderResult<String> {
        match member.header.as_ref().and_then(|h| h.contents.as_ref()) {
            Some(item) => self.scope.render_item(item, ctx, instance, Placement::InCell),
            None => Ok(String::new()),
        }
    }

    /// Corner cells per header row. Covered positions are skipped.
    fn corner(&self, ctx: &EvaluationContext<'_>) -> RenderResult<Vec<Vec<String>>> {
        let header_rows = self.prepared.column_header_rows;
        let header_columns = self.prepared.row_header_columns;
        let mut rows = vec![Vec::new(); header_rows];
        if header_rows == 0 || header_columns == 0 {
            return Ok(rows);
        }
        if self.tablix.corner.is_empty() {
            rows[0].push(header_cell("rdl-corner", header_rows, header_columns, ""));
            return Ok(rows);
        }

        let mut covered = vec![vec![false; header_columns]; header_rows];
        for (r, cells) in self.tablix.corner.iter().take(header_rows).enumerate() {
            for (c, cell) in cells.iter().take(header_columns).enumerate() {
                if covered[r][c] {
                    continue;
                }
                let row_span = cell.row_span.max(1).min(header_rows - r);
                let col_span = cell.col_span.max(1).min(header_columns - c);
                for line in covered.iter_mut().skip(r).take(row_span) {
                    for slot in line.iter_mut().skip(c).take(col_span) {
                        *slot = true;
                    }
                }
                let content = match &cell.contents {
                    Some(item) => self.scope.render_item(item, ctx, None, Placement::InCell)?,
                    None => String::new(),
                };
                rows[r].push(header_cell("rdl-corner", row_span, col_span, &content));
            }
        }
        Ok(rows)
    }

    fn assemble(&self, body: Vec<OutputRow>, ctx: &EvaluationContext<'_>) -> RenderResult<String> {
        let mut html = String::from(
            "<table class=\"rdl-table\" cellspacing=\"0\" cellpadding=\"0\" style=\"border-collapse:collapse\">",
        );

        html.push_str("<colgroup>");
        let mut widths = vec![0.0; self.prepared.row_header_columns];
        collect_header_widths(&self.tablix.row_hierarchy, 0, &mut widths);
        widths.extend(self.columns.slots.iter().map(|slot| {
            self.tablix
                .body
                .columns
                .get(slot.body_column)
                .copied()
                .unwrap_or_default()
        }));
        for width in widths {
            if width > 0.0 {
                let _ = write!(html, "<col style=\"width:{}\"/>", pt(width));
            } else {
                html.push_str("<col/>");
            }
        }
        html.push_str("</colgroup>");

        let corner = self.corner(ctx)?;
        for (index, cells) in self.columns.header_rows.iter().enumerate() {
            html.push_str("<tr class=\"rdl-header-row\">");
            for cell in corner.get(index).into_iter().flatten().chain(cells) {
                html.push_str(cell);
            }
            html.push_str("</tr>");
        }

        for row in body {
            let _ = write!(html, "<tr style=\"height:{}\">", pt(row.height));
            for cell in row.cells {
                html.push_str(&cell);
            }
            html.push_str("</tr>");
        }

        html.push_str("</table>");
        Ok(html)
    }
}

fn header_cell(class: &str, row_span: usize, col_span: usize, content: &str) -> String {
    let mut cell = format!("<td class=\"{}\"", class);
    if row_span > 1 {
        let _ = write!(cell, " rowspan=\"{}\"", row_span);
    }
    if col_span > 1 {
        let _ = write!(cell, " colspan=\"{}\"", col_span);
    }
    let _ = write!(cell, ">{}</td>", content);
    cell
}

/// Widest header per depth of a row hierarchy
fn collect_header_widths(members: &[TablixMember], depth: usize, widths: &mut [f64]) {
    for member in members {
        if let (Some(header), Some(width)) = (&member.header, widths.get_mut(depth)) {
            *width = width.max(header.size);
        }
        collect_header_widths(&member.children, depth + 1, widths);
    }
}
