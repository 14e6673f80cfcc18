//! End-to-end tests of the command implementations against files on disk

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use rdl::cli::output::OutputFormat;
use rdl::cli::{params, render, validate};
use tempfile::TempDir;

const SALES_RDL: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<Report>
  <DataSources>
    <DataSource Name="Main"><ConnectionProperties><DataProvider>JSON</DataProvider></ConnectionProperties></DataSource>
  </DataSources>
  <DataSets>
    <DataSet Name="Sales">
      <Query><DataSourceName>Main</DataSourceName><CommandText>sales</CommandText></Query>
      <Fields>
        <Field Name="Dept"><DataField>Dept</DataField></Field>
        <Field Name="Amount"><DataField>Amount</DataField></Field>
      </Fields>
    </DataSet>
  </DataSets>
  <ReportParameters>
    <ReportParameter Name="Region">
      <DataType>String</DataType>
      <Prompt>Region</Prompt>
    </ReportParameter>
  </ReportParameters>
  <Body>
    <ReportItems>
      <Textbox Name="Title"><Value>="Sales for " &amp; Parameters!Region.Value</Value></Textbox>
      <Textbox Name="Total">
        <Value>=Sum(Fields!Amount.Value, "Sales")</Value>
        <Top>0.5in</Top><Left>0in</Left><Height>0.25in</Height><Width>2in</Width>
      </Textbox>
    </ReportItems>
    <Height>1in</Height>
  </Body>
  <Width>6in</Width>
</Report>"#;

const SALES_JSON: &str = r#"{ "Sales": [
  { "Dept": "A", "Amount": 3 },
  { "Dept": "B", "Amount": 4 }
] }"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Sales.rdl"), SALES_RDL).unwrap();
        fs::write(dir.path().join("sales.json"), SALES_JSON).unwrap();
        Self { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).unwrap()
    }
}

fn render_config(ws: &Workspace, params: Vec<String>) -> render::RenderConfig {
    render::RenderConfig {
        file: ws.path("Sales.rdl"),
        data: Some(ws.path("sales.json")),
        request: None,
        params,
        toggles: Vec::new(),
        next: None,
        prev: None,
        page_size: None,
        report_paths: Vec::new(),
        format: OutputFormat::Text,
        output_file: Some(ws.path("out.html")),
    }
}

#[tokio::test]
async fn test_render_writes_html() {
    let ws = Workspace::new();
    render::render(render_config(&ws, vec!["Region=NW".to_string()]))
        .await
        .unwrap();

    let html = ws.read("out.html");
    assert!(html.contains("Sales for NW"));
    assert!(html.contains(">7<"));
    assert!(html.starts_with("<div class=\"rdl-report\""));
}

#[tokio::test]
async fn test_render_without_parameters_writes_form() {
    let ws = Workspace::new();
    render::render(render_config(&ws, Vec::new())).await.unwrap();

    let html = ws.read("out.html");
    assert!(html.contains("<form class=\"rdl-parameters\""));
    assert!(!html.contains("Sales for"));
}

#[tokio::test]
async fn test_render_json_carries_metadata() {
    let ws = Workspace::new();
    let config = render::RenderConfig {
        format: OutputFormat::Json,
        next: Some("Table".to_string()),
        ..render_config(&ws, vec!["Region=NW".to_string()])
    };
    render::render(config).await.unwrap();

    let response: serde_json::Value = serde_json::from_str(&ws.read("out.html")).unwrap();
    assert_eq!(response["metadata"][0]["objectName"], "Table");
    assert_eq!(response["metadata"][0]["value"], "2");
}

#[tokio::test]
async fn test_params_form_output() {
    let ws = Workspace::new();
    let config = params::ParamsConfig {
        file: ws.path("Sales.rdl"),
        params: vec!["Region=NW".to_string()],
        form: true,
        report_paths: Vec::new(),
        format: OutputFormat::Text,
        output_file: Some(ws.path("form.html")),
    };
    params::params(config).await.unwrap();

    let form = ws.read("form.html");
    assert!(form.contains("value=\"NW\""));
    assert!(form.contains("rdl-run"));
}

fn validate_files(files: &[&Path], strict: bool) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(validate::validate(validate::ValidateConfig {
        files: files.iter().map(|f| f.to_path_buf()).collect(),
        strict,
        report_paths: Vec::new(),
    }))
}

#[test]
fn test_validate_accepts_good_report() {
    let ws = Workspace::new();
    assert!(validate_files(&[&ws.path("Sales.rdl")], true).is_ok());
}

#[test]
fn test_validate_rejects_malformed_xml() {
    let ws = Workspace::new();
    fs::write(ws.path("Broken.rdl"), "<Report><Body></Report>").unwrap();
    assert!(validate_files(&[&ws.path("Sales.rdl"), &ws.path("Broken.rdl")], false).is_err());
}

#[test]
fn test_strict_validation_fails_on_warnings() {
    let ws = Workspace::new();
    let rdl = SALES_RDL.replace("=Sum(Fields!Amount.Value, \"Sales\")", "=Sum(Fields!Amount.Value");
    fs::write(ws.path("Loose.rdl"), rdl).unwrap();

    assert!(validate_files(&[&ws.path("Loose.rdl")], false).is_ok());
    assert!(validate_files(&[&ws.path("Loose.rdl")], true).is_err());
}
