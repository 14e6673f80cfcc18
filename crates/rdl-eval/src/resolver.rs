//! Field, parameter and global resolution
//!
//! `Fields!X.Value` is looked up in this order:
//!
//! 1. the active dataset's calculated field `X`, evaluated recursively
//! 2. a calculated field `X` of any other dataset
//! 3. the current row
//! 4. the first row in scope (group rows, else the active dataset)
//! 5. the first row of the dataset named by the enclosing aggregate's scope
//!
//! Declared fields may read a differently named source column. Names
//! compare case-insensitively everywhere.

use log::debug;
use rdl_ast::{FieldProperty, FieldRef, GlobalVariable, ParameterProperty, ParameterRef};
use rdl_model::DataRow;
use rdl_types::ReportValue;

use crate::context::EvaluationContext;
use crate::engine::ReportEngine;
use crate::error::EvalResult;

impl ReportEngine {
    /// Evaluate `Fields!X.Value` or `Fields!X.IsMissing`
    pub fn resolve_field(&self, field: &FieldRef, ctx: &EvaluationContext<'_>) -> EvalResult<ReportValue> {
        let found = self.lookup_field(&field.name, ctx)?;
        Ok(match field.property {
            FieldProperty::Value => found.unwrap_or_else(|| {
                debug!("Field '{}' not found, using Nothing", field.name);
                ReportValue::Null
            }),
            FieldProperty::IsMissing => ReportValue::Boolean(found.is_none()),
        })
    }

    fn lookup_field(&self, name: &str, ctx: &EvaluationContext<'_>) -> EvalResult<Option<ReportValue>> {
        let active = ctx.active_definition();

        if let Some(expression) = active.and_then(|ds| ds.calculated_field(name)) {
            return self.evaluate(expression, &ctx.enter()?).map(Some);
        }

        for dataset in ctx.datasets {
            if active.is_some_and(|a| std::ptr::eq(a, dataset)) {
                continue;
            }
            if let Some(expression) = dataset.calculated_field(name) {
                let inner = ctx.enter()?.with_dataset(&dataset.name);
                return self.evaluate(expression, &inner).map(Some);
            }
        }

        let column = active
            .and_then(|ds| ds.field(name))
            .map(|f| f.source_column());
        let read = |row: &DataRow| {
            column
                .and_then(|c| row.get(c))
                .or_else(|| row.get(name))
                .cloned()
        };

        if let Some(value) = ctx.current_row.and_then(read) {
            return Ok(Some(value));
        }

        let first_in_scope = ctx
            .scope_rows
            .and_then(|rows| rows.first().copied())
            .or_else(|| ctx.active_rows().and_then(|rows| rows.first()));
        if let Some(value) = first_in_scope.and_then(read) {
            return Ok(Some(value));
        }

        Ok(ctx
            .aggregate_scope
            .and_then(|scope| ctx.data.rows(scope))
            .and_then(|rows| rows.first())
            .and_then(read))
    }

    /// Evaluate `Parameters!X.Value`, `.Label` or `.Count`
    pub fn resolve_parameter(&self, param: &ParameterRef, ctx: &EvaluationContext<'_>) -> ReportValue {
        let Some(value) = ctx.parameters.get(&param.name) else {
            debug!("Parameter '{}' not supplied", param.name);
            return match param.property {
                ParameterProperty::Count => ReportValue::Integer(0),
                _ => ReportValue::Null,
            };
        };
        match param.property {
            ParameterProperty::Value => value.value(),
            ParameterProperty::Label => value.label(),
            ParameterProperty::Count => ReportValue::Integer(value.count() as i64),
        }
    }

    pub fn resolve_global(&self, global: GlobalVariable, ctx: &EvaluationContext<'_>) -> ReportValue {
        let globals = ctx.globals;
        match global {
            GlobalVariable::ExecutionTime => ReportValue::DateTime(globals.execution_time),
            GlobalVariable::ReportName => ReportValue::String(globals.report_name.clone()),
            GlobalVariable::PageNumber => ReportValue::Integer(globals.page_number as i64),
            GlobalVariable::TotalPages => ReportValue::Integer(globals.total_pages as i64),
            GlobalVariable::Language => ReportValue::String(globals.language.clone()),
            GlobalVariable::UserId => ReportValue::String(globals.user_id.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{EvaluationEnvironment, Globals, ParameterValue, Parameters};
    use pretty_assertions::assert_eq;
    use rdl_model::{DataSet, Field};

    fn sales() -> DataSet {
        DataSet {
            name: "Sales".to_string(),
            fields: vec![
                Field {
                    name: "Amount".to_string(),
                    data_field: Some("amt".to_string()),
                    value: None,
                },
                Field {
                    name: "Doubled".to_string(),
                    data_field: None,
                    value: Some("=Fields!Amount.Value * 2".to_string()),
                },
            ],
            ..DataSet::default()
        }
    }

    #[test]
    fn test_declared_field_reads_source_column() {
        let env = EvaluationEnvironment::new()
            .with_dataset(sales(), vec![DataRow::new().with("amt", 21)]);
        let engine = ReportEngine::new();
        let ctx = env.context().with_dataset("Sales");
        assert_eq!(engine.evaluate("=Fields!amount.Value", &ctx).unwrap(), ReportValue::Integer(21));
        assert_eq!(engine.evaluate("=Fields!Doubled.Value", &ctx).unwrap(), ReportValue::Integer(42));
    }

    #[test]
    fn test_is_missing() {
        let env = EvaluationEnvironment::new()
            .with_dataset(sales(), vec![DataRow::new().with("amt", 1)]);
        let engine = ReportEngine::new();
        let ctx = env.context();
        assert_eq!(
            engine.evaluate("=Fields!Nope.IsMissing", &ctx).unwrap(),
            ReportValue::Boolean(true)
        );
        assert_eq!(
            engine.evaluate("=Fields!amt.IsMissing", &ctx).unwrap(),
            ReportValue::Boolean(false)
        );
    }

    #[test]
    fn test_parameters_and_globals() {
        let env = EvaluationEnvironment::new()
            .with_parameters(Parameters::new().with(
                "Region",
                ParameterValue::single("E").with_labels(vec!["East".into()]),
            ))
            .with_globals(Globals::for_report("Sales"));
        let engine = ReportEngine::new();
        let ctx = env.context();
        assert_eq!(engine.evaluate("=Parameters!region.Label", &ctx).unwrap(), ReportValue::string("East"));
        assert_eq!(engine.evaluate("=Parameters!Other.Value", &ctx).unwrap(), ReportValue::Null);
        assert_eq!(engine.evaluate("=Parameters!Other.Count", &ctx).unwrap(), ReportValue::Integer(0));
        assert_eq!(engine.evaluate("=Globals!ReportName", &ctx).unwrap(), ReportValue::string("Sales"));
        assert_eq!(engine.evaluate("=User!Language", &ctx).unwrap(), ReportValue::string("en-US"));
    }
}
