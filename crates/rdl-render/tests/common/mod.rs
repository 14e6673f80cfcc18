//! Shared fixtures for rendering tests

#![allow(dead_code)]

use chrono::NaiveDate;
use rdl_model::{
    DataRow, DataSet, Field, Group, ItemKind, Report, ReportData, ReportItem, ReportRegistry,
    SortExpression, Tablix, TablixBody, TablixCell, TablixHeader, TablixMember, TablixRow,
};
use rdl_render::{PreparedReport, RenderOptions, RenderOutcome, RenderRequest, RenderResult, ReportRenderer};

pub fn options() -> RenderOptions {
    let noon = NaiveDate::from_ymd_opt(2024, 3, 15)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap();
    RenderOptions::default().with_execution_time(noon)
}

pub fn sale(dept: &str, amount: i64) -> DataRow {
    DataRow::new().with("Dept", dept).with("Amount", amount)
}

pub fn dataset(name: &str, fields: &[&str]) -> DataSet {
    DataSet {
        name: name.to_string(),
        fields: fields
            .iter()
            .map(|f| Field {
                name: f.to_string(),
                ..Field::default()
            })
            .collect(),
        ..DataSet::default()
    }
}

pub fn body_row(cells: &[(&str, &str)]) -> TablixRow {
    TablixRow {
        height: 12.0,
        cells: cells
            .iter()
            .map(|(name, value)| TablixCell::new(ReportItem::textbox(*name, *value)))
            .collect(),
    }
}

/// Sales by department: a sorted Dept group holding sorted detail rows and
/// a total row
pub fn sales_tablix() -> Tablix {
    let details = TablixMember::grouped(Group::details("Details"))
        .with_sort(SortExpression::ascending("=Fields!Amount.Value"));
    let dept = TablixMember::grouped(Group::new("Dept", vec!["=Fields!Dept.Value".into()]))
        .with_sort(SortExpression::ascending("=Fields!Dept.Value"))
        .with_header(TablixHeader::new(40.0, ReportItem::textbox("DeptHeader", "=Fields!Dept.Value")))
        .with_children(vec![details, TablixMember::static_member()]);

    Tablix {
        dataset_name: Some("Sales".into()),
        body: TablixBody {
            columns: vec![60.0],
            rows: vec![
                body_row(&[("Amount", "=Fields!Amount.Value")]),
                body_row(&[("Total", "=Sum(Fields!Amount.Value)")]),
            ],
        },
        row_hierarchy: vec![dept],
        column_hierarchy: vec![TablixMember::static_member()],
        ..Tablix::default()
    }
}

pub fn report_with(name: &str, tablix: Tablix) -> Report {
    let mut report = Report::new(name);
    report.data_sets.push(dataset("Sales", &["Dept", "Amount"]));
    report
        .body
        .items
        .push(ReportItem::new("Table", ItemKind::Tablix(Box::new(tablix))));
    report
}

pub fn sales_data(rows: Vec<DataRow>) -> ReportData {
    ReportData::new().with("Sales", rows)
}

pub fn render_with(
    registry: ReportRegistry,
    report: Report,
    data: &ReportData,
    request: &RenderRequest,
    options: RenderOptions,
) -> RenderResult<RenderOutcome> {
    let report = registry.register_report(report);
    let prepared = PreparedReport::prepare(report);
    ReportRenderer::new(registry)
        .with_options(options)
        .render(&prepared, data, request)
}

pub fn render(report: Report, data: &ReportData, request: &RenderRequest) -> RenderResult<RenderOutcome> {
    render_with(ReportRegistry::new(), report, data, request, options())
}

pub fn render_html(report: Report, data: &ReportData) -> String {
    render(report, data, &RenderRequest::new())
        .unwrap()
        .html()
        .to_string()
}

/// Text of every rendered item named `name`, in document order, with inner
/// markup removed
pub fn texts(html: &str, name: &str) -> Vec<String> {
    let marker = format!("data-name=\"{}\"", name);
    html.match_indices(&marker)
        .filter_map(|(at, _)| {
            let rest = &html[at..];
            let open = rest.find('>')?;
            let close = rest.find("</div>")?;
            Some(strip_tags(&rest[open + 1..close]))
        })
        .collect()
}

fn strip_tags(fragment: &str) -> String {
    let mut out = String::new();
    let mut in_tag = false;
    for c in fragment.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            c if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
