//! Name resolution and aggregate tests
//!
//! Covers:
//! - Field lookup order (calculated fields, current row, scope rows)
//! - Case-insensitive field and parameter names
//! - Aggregates over dataset, group and explicit scopes
//! - Recursion limits on self-referencing calculated fields

use pretty_assertions::assert_eq;
use rdl_eval::{EvalError, EvaluationEnvironment, ParameterValue, Parameters, ReportEngine};
use rdl_model::{DataRow, DataSet, Field};
use rdl_types::ReportValue;
use rstest::rstest;

// ============================================================================
// Test Helpers
// ============================================================================

fn field(name: &str) -> Field {
    Field {
        name: name.to_string(),
        ..Field::default()
    }
}

fn calculated(name: &str, expression: &str) -> Field {
    Field {
        name: name.to_string(),
        data_field: None,
        value: Some(expression.to_string()),
    }
}

fn dataset(name: &str, fields: Vec<Field>) -> DataSet {
    DataSet {
        name: name.to_string(),
        fields,
        ..DataSet::default()
    }
}

fn sale(dept: &str, amt: i64) -> DataRow {
    DataRow::new().with("Dept", dept).with("Amount", amt)
}

fn sales_env() -> EvaluationEnvironment {
    EvaluationEnvironment::new()
        .with_dataset(
            dataset("Sales", vec![field("Dept"), field("Amount")]),
            vec![sale("B", 1), sale("A", 2), sale("A", 1)],
        )
        .with_dataset(
            dataset("Returns", vec![field("Amount")]),
            vec![DataRow::new().with("Amount", 10), DataRow::new().with("Amount", 5)],
        )
}

// ============================================================================
// Fields
// ============================================================================

#[rstest]
#[case("=Fields!Dept.Value")]
#[case("=Fields!dept.Value")]
#[case("=fields!DEPT.value")]
fn test_field_names_ignore_case(#[case] text: &str) {
    let env = sales_env();
    let engine = ReportEngine::new();
    let rows = env.data.rows("Sales").unwrap();
    let ctx = env.context().with_dataset("Sales").with_row(&rows[1], 2);
    assert_eq!(engine.evaluate(text, &ctx).unwrap(), ReportValue::string("A"));
}

#[test]
fn test_calculated_field_wins_over_raw_column() {
    let env = EvaluationEnvironment::new().with_dataset(
        dataset("Orders", vec![field("Price"), calculated("Total", "=Fields!Price.Value * 3")]),
        vec![DataRow::new().with("Price", 4).with("Total", 999)],
    );
    let engine = ReportEngine::new();
    let rows = env.data.rows("Orders").unwrap();
    let ctx = env.context().with_dataset("Orders").with_row(&rows[0], 1);
    assert_eq!(engine.evaluate("=Fields!Total.Value", &ctx).unwrap(), ReportValue::Integer(12));
}

#[test]
fn test_field_falls_back_to_first_row() {
    let env = sales_env();
    let engine = ReportEngine::new();
    let ctx = env.context().with_dataset("Sales");
    assert_eq!(engine.evaluate("=Fields!Dept.Value", &ctx).unwrap(), ReportValue::string("B"));
}

#[test]
fn test_unknown_field_is_missing() {
    let env = sales_env();
    let engine = ReportEngine::new();
    let ctx = env.context().with_dataset("Sales");
    assert_eq!(engine.evaluate("=Fields!Region.Value", &ctx).unwrap(), ReportValue::Null);
    assert_eq!(engine.evaluate("=Fields!Region.IsMissing", &ctx).unwrap(), ReportValue::Boolean(true));
    assert_eq!(engine.evaluate("=Fields!Dept.IsMissing", &ctx).unwrap(), ReportValue::Boolean(false));
}

#[test]
fn test_self_referencing_calculated_field_hits_limit() {
    let env = EvaluationEnvironment::new().with_dataset(
        dataset("Loop", vec![calculated("Next", "=Fields!Next.Value + 1")]),
        vec![DataRow::new()],
    );
    let engine = ReportEngine::new();
    let ctx = env.context().with_dataset("Loop");
    assert_eq!(engine.evaluate("=Fields!Next.Value", &ctx), Err(EvalError::RecursionLimit));
}

// ============================================================================
// Parameters
// ============================================================================

#[test]
fn test_parameter_properties() {
    let parameters = Parameters::new()
        .with(
            "Region",
            ParameterValue::single("NW").with_labels(vec!["North West".to_string()]),
        )
        .with(
            "Years",
            ParameterValue::multi([ReportValue::Integer(2023), ReportValue::Integer(2024)]),
        );
    let env = EvaluationEnvironment::new().with_parameters(parameters);
    let engine = ReportEngine::new();
    let ctx = env.context();

    assert_eq!(engine.evaluate("=Parameters!region.Value", &ctx).unwrap(), ReportValue::string("NW"));
    assert_eq!(engine.evaluate("=Parameters!Region.Label", &ctx).unwrap(), ReportValue::string("North West"));
    assert_eq!(engine.evaluate("=Parameters!Years.Count", &ctx).unwrap(), ReportValue::Integer(2));
    assert_eq!(engine.evaluate("=Parameters!Missing.Value", &ctx).unwrap(), ReportValue::Null);
}

// ============================================================================
// Aggregates
// ============================================================================

#[rstest]
#[case("=Sum(Fields!Amount.Value)", ReportValue::Integer(4))]
#[case("=Count(Fields!Dept.Value)", ReportValue::Integer(3))]
#[case("=CountDistinct(Fields!Dept.Value)", ReportValue::Integer(2))]
#[case("=First(Fields!Dept.Value)", ReportValue::string("B"))]
#[case("=Last(Fields!Amount.Value)", ReportValue::Integer(1))]
#[case("=Max(Fields!Amount.Value)", ReportValue::Integer(2))]
#[case("=CountRows()", ReportValue::Integer(3))]
fn test_aggregates_over_active_dataset(#[case] text: &str, #[case] expected: ReportValue) {
    let env = sales_env();
    let engine = ReportEngine::new();
    let ctx = env.context().with_dataset("Sales");
    assert_eq!(engine.evaluate(text, &ctx).unwrap(), expected);
}

#[test]
fn test_aggregate_honours_dataset_scope() {
    let env = sales_env();
    let engine = ReportEngine::new();
    let ctx = env.context().with_dataset("Sales");
    assert_eq!(
        engine.evaluate(r#"=Sum(Fields!Amount.Value, "Returns")"#, &ctx).unwrap(),
        ReportValue::Integer(15)
    );
    assert_eq!(
        engine.evaluate(r#"=Sum(Fields!Amount.Value, "returns") - Sum(Fields!Amount.Value)"#, &ctx).unwrap(),
        ReportValue::Integer(11)
    );
}

#[test]
fn test_aggregate_over_group_scope() {
    let env = sales_env();
    let engine = ReportEngine::new();
    let rows = env.data.rows("Sales").unwrap();
    let group: Vec<&DataRow> = rows.iter().filter(|r| r.get("Dept") == Some(&ReportValue::string("A"))).collect();
    let ctx = env.context().with_dataset("Sales").with_scope(&group);

    assert_eq!(engine.evaluate("=Sum(Fields!Amount.Value)", &ctx).unwrap(), ReportValue::Integer(3));
    assert_eq!(engine.evaluate("=Avg(Fields!Amount.Value)", &ctx).unwrap(), ReportValue::Double(1.5));
    assert_eq!(engine.evaluate("=Fields!Dept.Value & Count(Fields!Amount.Value)", &ctx).unwrap(), ReportValue::string("A2"));
}

#[test]
fn test_row_number_follows_current_row() {
    let env = sales_env();
    let engine = ReportEngine::new();
    let rows = env.data.rows("Sales").unwrap();
    let ctx = env.context().with_dataset("Sales").with_row(&rows[2], 3);
    assert_eq!(engine.evaluate("=RowNumber()", &ctx).unwrap(), ReportValue::Integer(3));
}

#[test]
fn test_only_dataset_is_default_scope() {
    let env = EvaluationEnvironment::new().with_dataset(
        dataset("Solo", vec![field("N")]),
        vec![DataRow::new().with("N", 2), DataRow::new().with("N", 5)],
    );
    let engine = ReportEngine::new();
    assert_eq!(engine.evaluate("=Sum(Fields!N.Value)", &env.context()).unwrap(), ReportValue::Integer(7));
}
