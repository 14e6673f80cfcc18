//! Aggregate Functions
//!
//! Implements: Count, CountDistinct, CountRows, Sum, Avg, Min, Max, First,
//! Last, RowNumber
//!
//! An aggregate runs its argument once per row of its scope:
//!
//! 1. the dataset named by the quoted scope argument, when it names one
//! 2. the rows of the enclosing group instance
//! 3. the active dataset
//! 4. the only dataset of the request
//!
//! Rows are visited in scope order, so `First`/`Last` follow the group's
//! sort.

use std::collections::HashSet;

use log::debug;
use rdl_ast::{AggregateExpr, BuiltinFunction};
use rdl_model::DataRow;
use rdl_types::{to_f64, ReportValue};

use crate::context::EvaluationContext;
use crate::engine::ReportEngine;
use crate::error::EvalResult;
use crate::operators::sort_compare;

/// Rows an aggregate runs over
#[derive(Debug, Clone, Default)]
pub struct AggregateScope<'a> {
    pub rows: Vec<&'a DataRow>,
    /// Dataset the rows come from, when known
    pub dataset: Option<&'a str>,
}

impl<'a> AggregateScope<'a> {
    pub fn resolve(explicit: Option<&'a str>, ctx: &EvaluationContext<'a>) -> Self {
        if let Some(name) = explicit {
            if let Some(rows) = ctx.data.rows(name) {
                return Self {
                    rows: rows.iter().collect(),
                    dataset: Some(name),
                };
            }
            if ctx.dataset(name).is_some() {
                return Self {
                    rows: Vec::new(),
                    dataset: Some(name),
                };
            }
            debug!("Aggregate scope '{}' is not a dataset, using the current scope", name);
        }

        if let Some(rows) = ctx.scope_rows {
            return Self {
                rows: rows.to_vec(),
                dataset: ctx.active_dataset,
            };
        }

        if let Some(name) = ctx.active_dataset {
            return Self {
                rows: ctx.data.rows(name).map(|r| r.iter().collect()).unwrap_or_default(),
                dataset: Some(name),
            };
        }

        match ctx.data.only() {
            Some((name, rows)) => Self {
                rows: rows.iter().collect(),
                dataset: Some(name),
            },
            None => Self::default(),
        }
    }
}

impl ReportEngine {
    /// Evaluate an aggregate call
    pub fn eval_aggregate(&self, agg: &AggregateExpr, ctx: &EvaluationContext<'_>) -> EvalResult<ReportValue> {
        match agg.function {
            BuiltinFunction::RowNumber => return Ok(ReportValue::Integer(ctx.row_number as i64)),
            BuiltinFunction::CountRows => {
                let scope = AggregateScope::resolve(agg.scope.as_deref(), ctx);
                return Ok(ReportValue::Integer(scope.rows.len() as i64));
            }
            _ => {}
        }

        let Some(argument) = &agg.argument else {
            return Ok(ReportValue::Null);
        };
        let scope = AggregateScope::resolve(agg.scope.as_deref(), ctx);
        let explicit = agg.scope.as_deref();

        let mut values = Vec::with_capacity(scope.rows.len());
        for (index, row) in scope.rows.iter().enumerate() {
            let mut row_ctx = ctx.with_scope(&scope.rows).with_row(row, index + 1);
            if let Some(dataset) = scope.dataset {
                row_ctx = row_ctx.with_dataset(dataset);
            }
            if let Some(name) = explicit {
                row_ctx = row_ctx.with_aggregate_scope(name);
            }
            values.push(self.eval(argument, &row_ctx)?);
        }

        Ok(reduce(agg.function, values))
    }
}

/// Fold per-row values into the aggregate's result
pub fn reduce(function: BuiltinFunction, values: Vec<ReportValue>) -> ReportValue {
    let present = || values.iter().filter(|v| !v.is_null());

    match function {
        BuiltinFunction::Count => ReportValue::Integer(present().count() as i64),
        BuiltinFunction::CountDistinct => {
            let distinct: HashSet<String> = present().map(ReportValue::to_text).collect();
            ReportValue::Integer(distinct.len() as i64)
        }
        BuiltinFunction::Sum => sum(&values),
        BuiltinFunction::Avg => {
            let numbers: Vec<f64> = present().filter_map(to_f64).collect();
            match numbers.len() {
                0 => ReportValue::Null,
                n => ReportValue::Double(numbers.iter().sum::<f64>() / n as f64),
            }
        }
        BuiltinFunction::Min => present()
            .min_by(|a, b| sort_compare(a, b))
            .cloned()
            .unwrap_or(ReportValue::Null),
        BuiltinFunction::Max => present()
            .max_by(|a, b| sort_compare(a, b))
            .cloned()
            .unwrap_or(ReportValue::Null),
        BuiltinFunction::First => values.first().cloned().unwrap_or(ReportValue::Null),
        BuiltinFunction::Last => values.last().cloned().unwrap_or(ReportValue::Null),
        other => {
            debug!("{} is not a value aggregate", other.name());
            ReportValue::Null
        }
    }
}

/// Integer while every term is an Integer and the total fits, else Double
fn sum(values: &[ReportValue]) -> ReportValue {
    let terms: Vec<&ReportValue> = values.iter().filter(|v| !v.is_null()).collect();

    let integers: Option<i64> = terms.iter().try_fold(0i64, |acc, v| match v {
        ReportValue::Integer(i) => acc.checked_add(*i),
        _ => None,
    });
    if let Some(total) = integers.filter(|_| !terms.is_empty()) {
        return ReportValue::Integer(total);
    }

    let numbers: Vec<f64> = terms.iter().filter_map(|v| to_f64(v)).collect();
    if numbers.is_empty() {
        ReportValue::Null
    } else {
        ReportValue::Double(numbers.iter().sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn ints(values: &[i64]) -> Vec<ReportValue> {
        values.iter().map(|i| ReportValue::Integer(*i)).collect()
    }

    #[test]
    fn test_sum_stays_integer() {
        assert_eq!(reduce(BuiltinFunction::Sum, ints(&[1, 2, 3])), ReportValue::Integer(6));
        assert!(matches!(
            reduce(BuiltinFunction::Sum, vec![ReportValue::Integer(1), ReportValue::Double(0.5)]),
            ReportValue::Double(_)
        ));
        assert!(matches!(
            reduce(BuiltinFunction::Sum, ints(&[i64::MAX, 1])),
            ReportValue::Double(_)
        ));
        assert_eq!(reduce(BuiltinFunction::Sum, vec![]), ReportValue::Null);
    }

    #[test]
    fn test_counts_skip_nothing() {
        let values = vec![
            ReportValue::string("a"),
            ReportValue::Null,
            ReportValue::string("a"),
            ReportValue::string("b"),
        ];
        assert_eq!(reduce(BuiltinFunction::Count, values.clone()), ReportValue::Integer(3));
        assert_eq!(reduce(BuiltinFunction::CountDistinct, values), ReportValue::Integer(2));
    }

    #[test]
    fn test_min_max_first_last() {
        let values = vec![
            ReportValue::Null,
            ReportValue::Integer(5),
            ReportValue::Double(2.5),
            ReportValue::Integer(9),
        ];
        assert_eq!(reduce(BuiltinFunction::Min, values.clone()), ReportValue::Double(2.5));
        assert_eq!(reduce(BuiltinFunction::Max, values.clone()), ReportValue::Integer(9));
        assert_eq!(reduce(BuiltinFunction::First, values.clone()), ReportValue::Null);
        assert_eq!(reduce(BuiltinFunction::Last, values.clone()), ReportValue::Integer(9));
        assert_eq!(reduce(BuiltinFunction::Avg, values), ReportValue::Double(16.5 / 3.0));
    }
}
