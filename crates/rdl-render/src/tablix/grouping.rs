//! Group partitioning and instance ordering

use std::collections::HashMap;
use std::ptr;

use indexmap::IndexMap;
use log::trace;
use rdl_eval::EvaluationContext;
use rdl_model::{DataRow, Group, SortExpression};
use rdl_types::{ReportValue, ValueType};

use crate::comparator::{sort_by_keys, SortKey, SortKeyComparator};
use crate::error::RenderResult;
use crate::scope::RenderScope;

/// Separator between the parts of a multi-expression group key
const KEY_SEPARATOR: char = '\u{1f}';

/// Position of each row in the unwindowed row set of a tablix
#[derive(Debug, Default)]
pub struct RowOrdinals(HashMap<*const DataRow, usize>);

impl RowOrdinals {
    pub fn new(rows: &[&DataRow]) -> Self {
        Self(
            rows.iter()
                .enumerate()
                .map(|(index, row)| (ptr::from_ref::<DataRow>(*row), index))
                .collect(),
        )
    }

    pub fn get(&self, row: &DataRow) -> Option<usize> {
        self.0.get(&ptr::from_ref(row)).copied()
    }
}

/// Rows sharing one group key
#[derive(Debug, Clone)]
pub struct GroupInstance<'r> {
    pub key: Vec<ReportValue>,
    /// Text form of the key, stable across requests and pages. Non-string
    /// parts carry their type, so `1` and `"1"` differ.
    pub key_text: String,
    pub rows: Vec<&'r DataRow>,
    /// 1-based position of the instance's first row in the parent scope
    pub row_number: usize,
}

impl GroupInstance<'_> {
    /// Evaluation context of the instance: its rows in scope, first row current
    pub fn context<'c>(&'c self, parent: &EvaluationContext<'c>) -> EvaluationContext<'c> {
        let ctx = parent.with_scope(&self.rows);
        match self.rows.first() {
            Some(first) => ctx.with_row(first, self.row_number),
            None => ctx,
        }
    }
}

impl RenderScope<'_> {
    /// Partition `rows` by the group's expressions, in first-appearance order.
    /// A details group yields one instance per row, keyed by the row's
    /// position in `ordinals`.
    pub fn group_rows<'r>(
        &self,
        group: &Group,
        rows: &[&'r DataRow],
        ordinals: &RowOrdinals,
        ctx: &EvaluationContext<'_>,
    ) -> RenderResult<Vec<GroupInstance<'r>>> {
        if group.is_details() {
            return Ok(rows
                .iter()
                .enumerate()
                .map(|(index, row)| GroupInstance {
                    key: Vec::new(),
                    key_text: ordinals.get(row).unwrap_or(index).to_string(),
                    rows: vec![*row],
                    row_number: index + 1,
                })
                .collect());
        }

        let mut buckets: IndexMap<Vec<(ValueType, String)>, GroupInstance<'r>> = IndexMap::new();
        for (index, row) in rows.iter().enumerate() {
            let row_ctx = ctx.with_scope(rows).with_row(row, index + 1);
            let key = group
                .expressions
                .iter()
                .map(|expr| self.evaluate(expr, &row_ctx))
                .collect::<RenderResult<Vec<_>>>()?;
            let bucket: Vec<(ValueType, String)> =
                key.iter().map(|v| (v.value_type(), v.to_text())).collect();

            buckets
                .entry(bucket)
                .or_insert_with(|| GroupInstance {
                    key_text: key_text(&key),
                    key,
                    rows: Vec::new(),
                    row_number: index + 1,
                })
                .rows
                .push(row);
        }
        trace!("Group '{}': {} instance(s)", group.name, buckets.len());
        Ok(buckets.into_values().collect())
    }

    /// Order instances by the member's sort expressions, evaluated once per
    /// instance. The sort is stable: ties keep first-appearance order.
    pub fn sort_instances<'r>(
        &self,
        sorts: &[SortExpression],
        instances: Vec<GroupInstance<'r>>,
        ctx: &EvaluationContext<'_>,
    ) -> RenderResult<Vec<GroupInstance<'r>>> {
        let Some(comparator) = SortKeyComparator::chain(sorts.iter().map(|s| s.direction)) else {
            return Ok(instances);
        };

        let mut keyed: Vec<(SortKey, GroupInstance<'r>)> = Vec::with_capacity(instances.len());
        for instance in instances {
            let key = {
                let instance_ctx = instance.context(ctx);
                sorts
                    .iter()
                    .map(|sort| self.evaluate(&sort.value, &instance_ctx))
                    .collect::<RenderResult<SortKey>>()?
            };
            keyed.push((key, instance));
        }
        sort_by_keys(&mut keyed, &comparator);
        Ok(keyed.into_iter().map(|(_, instance)| instance).collect())
    }
}

fn key_text(key: &[ReportValue]) -> String {
    key.iter()
        .map(|value| match value {
            ReportValue::String(text) => text.clone(),
            other => format!("{}:{}", other.value_type().name(), other.to_text()),
        })
        .collect::<Vec<_>>()
        .join(&KEY_SEPARATOR.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_key_text_tags_non_strings() {
        assert_eq!(key_text(&[ReportValue::string("West")]), "West");
        assert_ne!(
            key_text(&[ReportValue::Integer(1)]),
            key_text(&[ReportValue::string("1")])
        );
        assert_ne!(key_text(&[ReportValue::Null]), key_text(&[ReportValue::string("")]));
    }
}
