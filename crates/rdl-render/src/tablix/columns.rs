//! Column hierarchy expansion
//!
//! Column members expand left to right into slots. A slot is one output
//! column: the body column it renders plus, under a column group, the rows
//! of that group instance. Body cells later evaluate over the rows their
//! row scope shares with the slot.

use rdl_eval::EvaluationContext;
use rdl_model::{DataRow, MemberId, TablixMember};

use super::{header_cell, TablixPass};
use crate::error::RenderResult;
use crate::visibility::instance_key;

#[derive(Debug, Clone)]
pub struct ColumnSlot<'r> {
    /// Body column rendered in this slot
    pub body_column: usize,
    /// Rows of the enclosing column group instance, `None` outside any group
    pub rows: Option<Vec<&'r DataRow>>,
}

impl ColumnSlot<'_> {
    pub fn unrestricted(body_column: usize) -> Self {
        Self {
            body_column,
            rows: None,
        }
    }

    /// Whether `row` belongs to this slot's column instance
    pub fn contains(&self, row: &DataRow) -> bool {
        match &self.rows {
            Some(rows) => rows.iter().any(|candidate| std::ptr::eq(*candidate, row)),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ColumnLayout<'r> {
    pub slots: Vec<ColumnSlot<'r>>,
    /// Header cell markup per header row, left to right
    pub header_rows: Vec<Vec<String>>,
}

impl TablixPass<'_, '_, '_> {
    pub(super) fn expand_columns<'r>(
        &self,
        rows: &[&'r DataRow],
        ctx: &EvaluationContext<'_>,
    ) -> RenderResult<ColumnLayout<'r>> {
        let mut layout = ColumnLayout {
            slots: Vec::new(),
            header_rows: vec![Vec::new(); self.prepared.column_header_rows],
        };

        if self.tablix.column_hierarchy.is_empty() {
            let widest_row = self.tablix.body.rows.iter().map(|r| r.cells.len()).max();
            let count = self.tablix.body.columns.len().max(widest_row.unwrap_or(0));
            layout.slots = (0..count).map(ColumnSlot::unrestricted).collect();
            return Ok(layout);
        }

        self.expand_members(
            &self.tablix.column_hierarchy,
            self.prepared.columns.roots(),
            rows,
            None,
            None,
            ctx,
            &mut layout,
        )?;
        Ok(layout)
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_members<'r>(
        &self,
        members: &[TablixMember],
        ids: &[MemberId],
        rows: &[&'r DataRow],
        restriction: Option<&[&'r DataRow]>,
        instance: Option<&str>,
        ctx: &EvaluationContext<'_>,
        layout: &mut ColumnLayout<'r>,
    ) -> RenderResult<()> {
        for (member, &id) in members.iter().zip(ids) {
            let Some(group) = &member.group else {
                if self.scope.is_visible(member.visibility.as_ref(), ctx, instance)? {
                    self.expand_member(member, id, rows, restriction, instance, ctx, layout)?;
                }
                continue;
            };

            let source = restriction.unwrap_or(rows);
            let instances = self.scope.group_rows(group, source, &self.ordinals, ctx)?;
            let instances = self.scope.sort_instances(&member.sort_expressions, instances, ctx)?;
            let axis = format!("{}/columns", self.name);
            for group_instance in &instances {
                let key = instance_key(&axis, id, &group_instance.key_text);
                let instance_ctx = group_instance.context(ctx);
                if !self.scope.is_visible(member.visibility.as_ref(), &instance_ctx, instance)? {
                    continue;
                }
                self.expand_member(
                    member,
                    id,
                    rows,
                    Some(group_instance.rows.as_slice()),
                    Some(&key),
                    &instance_ctx,
                    layout,
                )?;
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn expand_member<'r>(
        &self,
        member: &TablixMember,
        id: MemberId,
        rows: &[&'r DataRow],
        restriction: Option<&[&'r DataRow]>,
        instance: Option<&str>,
        ctx: &EvaluationContext<'_>,
        layout: &mut ColumnLayout<'r>,
    ) -> RenderResult<()> {
        let start = layout.slots.len();
        if member.is_leaf() {
            let body_column = self.prepared.columns.leaf_ordinal(id).unwrap_or_default();
            layout.slots.push(ColumnSlot {
                body_column,
                rows: restriction.map(<[_]>::to_vec),
            });
        } else {
            self.expand_members(
                &member.children,
                self.prepared.columns.children(id),
                rows,
                restriction,
                instance,
                ctx,
                layout,
            )?;
        }

        let depth = self.prepared.columns.depth(id);
        let header_rows = self.prepared.column_header_rows;
        let span = layout.slots.len() - start;
        if depth < header_rows && span > 0 {
            let row_span = if member.is_leaf() { header_rows - depth } else { 1 };
            let content = self.header_content(member, ctx, instance)?;
            layout.header_rows[depth].push(header_cell("rdl-column-header", row_span, span, &content));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_membership_is_by_identity() {
        let rows = [DataRow::new().with("a", 1), DataRow::new().with("a", 1)];
        let slot = ColumnSlot {
            body_column: 0,
            rows: Some(vec![&rows[0]]),
        };
        assert!(slot.contains(&rows[0]));
        assert!(!slot.contains(&rows[1]));
        assert!(ColumnSlot::unrestricted(0).contains(&rows[1]));
    }
}
