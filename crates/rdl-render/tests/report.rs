//! Report rendering tests
//!
//! Covers:
//! - Visibility toggles by item name and by group instance
//! - Configuration failures (unregistered data sources and sub-reports)
//! - Incomplete parameters
//! - Conversion failures reaching the caller
//! - Page navigation round trips
//! - Sub-reports, rectangles, images and lines

mod common;

use common::{render, render_html, render_with, options, report_with, sale, sales_data, sales_tablix, texts};
use pretty_assertions::assert_eq;
use rdl_diagnostics::{RDL0301, RDL0302};
use rdl_model::{
    DataRow, DataSource, EmbeddedImage, Image, ImageSource, ItemKind, ParameterDataType, Position, QueryParameter, Rectangle,
    Report, ReportData, ReportItem, ReportParameter, ReportRegistry, Subreport, Visibility,
};
use rdl_render::{instance_key, MetadataEntry, Navigate, RenderOutcome, RenderRequest, TABLIX_PAGE_KEY};

fn textbox_report(items: Vec<ReportItem>) -> Report {
    let mut report = Report::new("Items");
    report.body.items = items;
    report
}

// ============================================================================
// Toggles
// ============================================================================

#[test]
fn test_hidden_item_shows_when_toggled() {
    let report = || {
        textbox_report(vec![
            ReportItem::textbox("g1", "Details"),
            ReportItem::textbox("Secret", "shown")
                .at(Position::new(20.0, 0.0, 50.0, 10.0))
                .with_visibility(Visibility::hidden().toggled_by("g1")),
        ])
    };

    let collapsed = render_html(report(), &ReportData::new());
    assert!(texts(&collapsed, "Secret").is_empty());
    assert!(collapsed.contains("data-toggle=\"g1\" aria-expanded=\"false\">+</a>"));

    let request = RenderRequest::new().with_toggle("g1");
    let expanded = render(report(), &ReportData::new(), &request).unwrap();
    assert_eq!(texts(expanded.html(), "Secret"), vec!["shown"]);
    assert!(expanded.html().contains("aria-expanded=\"true\">-</a>"));
}

#[test]
fn test_hidden_without_toggle_item_stays_hidden() {
    let report = textbox_report(vec![ReportItem::textbox("Secret", "x").with_visibility(Visibility::hidden())]);
    let request = RenderRequest::new().with_toggle("Secret");
    let outcome = render(report, &ReportData::new(), &request).unwrap();
    assert!(texts(outcome.html(), "Secret").is_empty());
}

#[test]
fn test_hidden_expression_is_evaluated() {
    let visibility = Visibility {
        hidden: Some("=Parameters!Compact.Value = \"yes\"".into()),
        toggle_item: None,
    };
    let mut report = textbox_report(vec![ReportItem::textbox("Detail", "x").with_visibility(visibility)]);
    report.parameters.push(ReportParameter::new("Compact"));

    let shown = render(
        report.clone(),
        &ReportData::new(),
        &RenderRequest::new().with_parameter("Compact", "no"),
    )
    .unwrap();
    assert_eq!(texts(shown.html(), "Detail"), vec!["x"]);

    let hidden = render(report, &ReportData::new(), &RenderRequest::new().with_parameter("Compact", "yes")).unwrap();
    assert!(texts(hidden.html(), "Detail").is_empty());
}

fn collapsible_sales() -> Report {
    let mut tablix = sales_tablix();
    let dept = &mut tablix.row_hierarchy[0];
    dept.children[0].visibility = Some(Visibility::hidden().toggled_by("DeptHeader"));
    report_with("Sales", tablix)
}

#[test]
fn test_group_instance_toggle_expands_one_group() {
    let data = sales_data(vec![sale("A", 1), sale("B", 2), sale("A", 3)]);

    let collapsed = render_html(collapsible_sales(), &data);
    assert!(texts(&collapsed, "Amount").is_empty());
    assert_eq!(texts(&collapsed, "Total"), vec!["4", "2"]);

    // The Dept member is the first in pre-order
    let key_a = instance_key("Table", 0, "A");
    assert!(collapsed.contains(&format!("data-toggle=\"{}\"", key_a)));

    let request = RenderRequest::new().with_toggle(key_a.clone());
    let expanded = render(collapsible_sales(), &data, &request).unwrap();
    assert_eq!(texts(expanded.html(), "Amount"), vec!["1", "3"]);
    assert!(expanded
        .html()
        .contains(&format!("data-toggle=\"{}\" aria-expanded=\"true\"", key_a)));
}

#[test]
fn test_toggle_item_name_expands_every_group() {
    let data = sales_data(vec![sale("A", 1), sale("B", 2)]);
    let request = RenderRequest::new().with_toggle("DeptHeader").with_toggle("DeptHeader");
    let outcome = render(collapsible_sales(), &data, &request).unwrap();
    assert_eq!(texts(outcome.html(), "Amount"), vec!["1", "2"]);
}

// ============================================================================
// Configuration and Input
// ============================================================================

#[test]
fn test_unregistered_data_source_fails_render() {
    let mut report = report_with("Sales", sales_tablix());
    report.data_sets[0].query.data_source_name = "Warehouse".into();

    let err = render(report.clone(), &ReportData::new(), &RenderRequest::new()).unwrap_err();
    assert!(err.is_configuration());
    assert_eq!(err.code(), RDL0301);

    let registry = ReportRegistry::new();
    registry.register_data_source(DataSource {
        name: "Warehouse".into(),
        ..DataSource::default()
    });
    let outcome = render_with(registry, report, &sales_data(vec![sale("A", 1)]), &RenderRequest::new(), options());
    assert!(outcome.unwrap().is_rendered());
}

#[test]
fn test_unregistered_subreport_fails_render() {
    let subreport = Subreport {
        report_name: "Missing".into(),
        parameters: Vec::new(),
        no_rows_message: None,
    };
    let report = textbox_report(vec![ReportItem::new("Child", ItemKind::Subreport(subreport))]);
    let err = render(report, &ReportData::new(), &RenderRequest::new()).unwrap_err();
    assert_eq!(err.code(), RDL0302);
}

#[test]
fn test_incomplete_parameters_return_form() {
    let mut report = textbox_report(vec![ReportItem::textbox("Title", "=Parameters!Region.Value")]);
    report.parameters.push(ReportParameter {
        prompt: Some("Region".into()),
        ..ReportParameter::new("Region")
    });

    let outcome = render(report.clone(), &ReportData::new(), &RenderRequest::new()).unwrap();
    let RenderOutcome::IncompleteParameters { form } = outcome else {
        panic!("expected the parameter form");
    };
    assert!(form.contains("<label for=\"rdl-param-Region\">Region</label>"));
    assert!(!form.contains("rdl-run"));

    let outcome = render(report, &ReportData::new(), &RenderRequest::new().with_parameter("Region", "NW")).unwrap();
    assert_eq!(texts(outcome.html(), "Title"), vec!["NW"]);
}

#[test]
fn test_conversion_failure_reaches_caller() {
    let report = textbox_report(vec![ReportItem::textbox("Bad", "=CInt(\"abc\")")]);
    let err = render(report, &ReportData::new(), &RenderRequest::new()).unwrap_err();
    assert!(err.is_conversion_failure());
}

#[test]
fn test_malformed_expressions_render_empty() {
    let report = textbox_report(vec![
        ReportItem::textbox("Broken", "=Left(\"abc\")"),
        ReportItem::textbox("Dangling", "=1 +").at(Position::new(20.0, 0.0, 10.0, 10.0)),
    ]);
    let html = render_html(report, &ReportData::new());
    assert_eq!(texts(&html, "Broken"), vec![""]);
    assert_eq!(texts(&html, "Dangling"), vec![""]);
}

#[test]
fn test_untranslatable_like_pattern_renders_empty() {
    let mut report = textbox_report(vec![
        ReportItem::textbox("Bad", "=\"a\" Like \"[z-a]\""),
        ReportItem::textbox("FromParameter", "=\"a\" Like Parameters!Pattern.Value")
            .at(Position::new(20.0, 0.0, 10.0, 10.0)),
        ReportItem::textbox("Wide", "=Space(1000000000000)").at(Position::new(40.0, 0.0, 10.0, 10.0)),
    ]);
    report.parameters.push(ReportParameter::new("Pattern"));

    let request = RenderRequest::new().with_parameter("Pattern", "[abc");
    let outcome = render(report, &ReportData::new(), &request).unwrap();
    assert_eq!(texts(outcome.html(), "Bad"), vec![""]);
    assert_eq!(texts(outcome.html(), "FromParameter"), vec![""]);
    assert_eq!(texts(outcome.html(), "Wide"), vec![""]);
}

// ============================================================================
// Navigation
// ============================================================================

#[test]
fn test_next_starts_from_page_one() {
    let request = RenderRequest::new().with_navigate(Navigate::next("T1"));
    let response = render(textbox_report(Vec::new()), &ReportData::new(), &request)
        .unwrap()
        .into_response()
        .unwrap();
    assert_eq!(response.metadata, vec![MetadataEntry::page("T1", 2)]);
    assert_eq!(response.metadata[0].key, TABLIX_PAGE_KEY);
}

#[test]
fn test_prev_floors_at_one() {
    let request = RenderRequest::new()
        .with_metadata(vec![MetadataEntry::page("T1", 1)])
        .with_navigate(Navigate::prev("T1"));
    let response = render(textbox_report(Vec::new()), &ReportData::new(), &request)
        .unwrap()
        .into_response()
        .unwrap();
    assert_eq!(response.metadata, vec![MetadataEntry::page("T1", 1)]);
}

// ============================================================================
// Items
// ============================================================================

#[test]
fn test_items_render_in_spatial_order() {
    let report = textbox_report(vec![
        ReportItem::textbox("Second", "b").at(Position::new(40.0, 0.0, 50.0, 10.0)),
        ReportItem::textbox("First", "a").at(Position::new(0.0, 0.0, 50.0, 10.0)),
    ]);
    let html = render_html(report, &ReportData::new());
    let first = html.find("data-name=\"First\"").unwrap();
    let second = html.find("data-name=\"Second\"").unwrap();
    assert!(first < second);
    assert!(html.contains("position:absolute;top:40pt;"));
}

#[test]
fn test_rectangle_line_and_image() {
    let rectangle = Rectangle {
        items: vec![ReportItem::textbox("Inner", "inside")],
    };
    let image = Image {
        source: ImageSource::Embedded,
        value: "Logo".into(),
        mime_type: None,
    };
    let mut report = textbox_report(vec![
        ReportItem::new("Box", ItemKind::Rectangle(rectangle)),
        ReportItem::new("Rule", ItemKind::Line).at(Position::new(30.0, 0.0, 100.0, 0.0)),
        ReportItem::new("Logo", ItemKind::Image(image)).at(Position::new(60.0, 0.0, 20.0, 20.0)),
    ]);
    report.embedded_images.push(EmbeddedImage {
        name: "Logo".into(),
        mime_type: "image/png".into(),
        data: "iVBORw0KGgo=".into(),
    });

    let html = render_html(report, &ReportData::new());
    assert_eq!(texts(&html, "Inner"), vec!["inside"]);
    assert!(html.contains("border-top:1pt solid black;"));
    assert!(html.contains("src=\"data:image/png;base64,iVBORw0KGgo=\""));
}

fn detail_report() -> Report {
    let mut detail = Report::new("Detail");
    detail.data_sets.push(common::dataset("Lines", &["Item"]));
    detail.parameters.push(ReportParameter::new("Order"));
    detail.body.items.push(ReportItem::textbox(
        "Heading",
        "=\"Order \" & Parameters!Order.Value & \": \" & Count(Fields!Item.Value, \"Lines\")",
    ));
    detail
}

#[test]
fn test_subreport_renders_with_own_parameters_and_rows() {
    let registry = ReportRegistry::new();
    registry.register_report(detail_report());

    let subreport = Subreport {
        report_name: "Detail".into(),
        parameters: vec![QueryParameter {
            name: "Order".into(),
            value: "=Parameters!Id.Value * 10".into(),
        }],
        no_rows_message: Some("No lines".into()),
    };
    let mut report = textbox_report(vec![ReportItem::new("Child", ItemKind::Subreport(subreport))]);
    report.parameters.push(ReportParameter {
        data_type: ParameterDataType::Integer,
        default_values: vec!["7".into()],
        ..ReportParameter::new("Id")
    });

    let lines = vec![DataRow::new().with("Item", "bolt"), DataRow::new().with("Item", "nut")];
    let data = ReportData::new().with("Detail/Lines", lines);
    let outcome = render_with(registry.clone(), report.clone(), &data, &RenderRequest::new(), options()).unwrap();
    assert_eq!(texts(outcome.html(), "Heading"), vec!["Order 70: 2"]);
    assert!(outcome.html().contains("class=\"rdl-subreport\""));

    let empty = render_with(registry, report, &ReportData::new(), &RenderRequest::new(), options()).unwrap();
    assert!(empty.html().contains("<div class=\"rdl-norows\">No lines</div>"));
}
