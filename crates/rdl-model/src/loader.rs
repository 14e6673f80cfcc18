//! RDL loader
//!
//! Reads an RDL document (2008 through 2016 schemas, and the older layout
//! without `ReportSections`) into a [`Report`]. The XML is first read into a
//! small element tree, which is then walked to populate the definition.
//! Elements the renderer has no use for are skipped.

use std::path::Path;

use log::debug;
use quick_xml::events::{BytesRef, BytesStart, Event};
use quick_xml::Reader;
use rdl_diagnostics::{ErrorCode, RdlError, RDL0100, RDL0101, RDL0102, RDL0103, RDL0401};

use crate::definition::{
    Body, DataSet, DataSource, EmbeddedImage, Field, Group, Image, ImageSource, ItemKind,
    PageSettings, ParameterDataType, Position, Query, QueryParameter, Rectangle, Report,
    ReportItem, ReportParameter, SortDirection, SortExpression, Style, Subreport, Tablix,
    TablixBody, TablixCell, TablixCornerCell, TablixHeader, TablixMember, TablixRow, Textbox,
    ValidValue, Visibility,
};
use crate::units::parse_size;

/// Error type for report loading
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("XML parse error: {0}")]
    Xml(String),

    #[error("Missing required element: {0}")]
    Missing(String),

    #[error("Invalid size '{value}' in <{element}>")]
    InvalidSize { element: String, value: String },

    #[error("Invalid value '{value}' in <{element}>")]
    InvalidValue { element: String, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Xml(_) => RDL0100,
            Self::Missing(_) => RDL0101,
            Self::InvalidSize { .. } => RDL0102,
            Self::InvalidValue { .. } => RDL0103,
            Self::Io(_) => RDL0401,
        }
    }
}

impl From<LoadError> for RdlError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::Io(_) => RdlError::system(err.code(), err.to_string()),
            _ => RdlError::load(err.code(), err.to_string()),
        }
    }
}

type LoadResult<T> = Result<T, LoadError>;

fn xml_error(err: impl std::fmt::Display) -> LoadError {
    LoadError::Xml(err.to_string())
}

/// Load a report definition from RDL text
pub fn load_report(name: &str, xml: &str) -> LoadResult<Report> {
    let root = read_tree(xml)?;
    if root.name != "Report" {
        return Err(LoadError::Missing("Report".to_string()));
    }
    let report = read_report(name, &root)?;
    debug!(
        "Loaded report '{}': {} data set(s), {} parameter(s), {} body item(s)",
        report.name,
        report.data_sets.len(),
        report.parameters.len(),
        report.body.items.len()
    );
    Ok(report)
}

/// Load a report definition from a file; the report is named after the file stem
pub fn load_report_file(path: impl AsRef<Path>) -> LoadResult<Report> {
    let path = path.as_ref();
    let xml = std::fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    load_report(&name, &xml)
}

// === Element tree ===

#[derive(Debug, Default)]
struct Node {
    name: String,
    attributes: Vec<(String, String)>,
    text: String,
    children: Vec<Node>,
}

impl Node {
    fn open(start: &BytesStart<'_>) -> LoadResult<Self> {
        let mut node = Node {
            name: String::from_utf8_lossy(start.local_name().as_ref()).into_owned(),
            ..Node::default()
        };
        for attr in start.attributes() {
            let attr = attr.map_err(xml_error)?;
            let key = String::from_utf8_lossy(attr.key.local_name().as_ref()).into_owned();
            let value = attr.unescape_value().map_err(xml_error)?.into_owned();
            node.attributes.push((key, value));
        }
        Ok(node)
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn name_attr(&self) -> String {
        self.attr("Name").unwrap_or_default().to_string()
    }

    fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Every node reached by following `path`, fanning out at each step
    fn all_at(&self, path: &[&str]) -> Vec<&Node> {
        let mut current = vec![self];
        for step in path {
            current = current
                .into_iter()
                .flat_map(|node| node.children.iter().filter(move |c| c.name == *step))
                .collect();
        }
        current
    }

    fn text_of(&self, name: &str) -> Option<String> {
        self.child(name).map(|c| c.text.clone())
    }

    /// Child text, treating an empty element as absent
    fn non_empty_text(&self, name: &str) -> Option<String> {
        self.text_of(name).filter(|t| !t.is_empty())
    }

    fn size_of(&self, name: &str) -> LoadResult<f64> {
        match self.child(name) {
            None => Ok(0.0),
            Some(node) => parse_size(&node.text).ok_or_else(|| LoadError::InvalidSize {
                element: name.to_string(),
                value: node.text.clone(),
            }),
        }
    }

    fn bool_of(&self, name: &str) -> LoadResult<bool> {
        match self.child(name) {
            None => Ok(false),
            Some(node) => match node.text.to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" | "" => Ok(false),
                _ => Err(LoadError::InvalidValue {
                    element: name.to_string(),
                    value: node.text.clone(),
                }),
            },
        }
    }

    fn usize_of(&self, name: &str, default: usize) -> LoadResult<usize> {
        match self.child(name) {
            None => Ok(default),
            Some(node) => node
                .text
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| LoadError::InvalidValue {
                    element: name.to_string(),
                    value: node.text.clone(),
                }),
        }
    }
}

fn read_tree(xml: &str) -> LoadResult<Node> {
    let mut reader = Reader::from_str(xml);
    let mut stack = vec![Node::default()];
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => stack.push(Node::open(&e)?),
            Ok(Event::Empty(e)) => {
                let node = Node::open(&e)?;
                current(&mut stack)?.children.push(node);
            }
            Ok(Event::End(_)) => {
                let mut node = stack.pop().ok_or_else(|| xml_error("unbalanced end tag"))?;
                node.text = node.text.trim().to_string();
                current(&mut stack)?.children.push(node);
            }
            Ok(Event::Text(e)) => {
                let text = e.decode().map_err(xml_error)?;
                current(&mut stack)?.text.push_str(&text);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                current(&mut stack)?.text.push_str(&text);
            }
            Ok(Event::GeneralRef(e)) => {
                let text = resolve_reference(&e)?;
                current(&mut stack)?.text.push_str(&text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(LoadError::Xml(format!(
                    "{} (at byte {})",
                    e,
                    reader.error_position()
                )));
            }
        }
        buf.clear();
    }

    if stack.len() != 1 {
        return Err(xml_error("unexpected end of document"));
    }
    stack
        .pop()
        .and_then(|document| document.children.into_iter().next())
        .ok_or_else(|| LoadError::Missing("Report".to_string()))
}

fn current(stack: &mut [Node]) -> LoadResult<&mut Node> {
    stack
        .last_mut()
        .ok_or_else(|| xml_error("content outside the document element"))
}

fn resolve_reference(reference: &BytesRef<'_>) -> LoadResult<String> {
    if let Some(ch) = reference.resolve_char_ref().map_err(xml_error)? {
        return Ok(ch.to_string());
    }
    let name = reference.decode().map_err(xml_error)?;
    quick_xml::escape::resolve_predefined_entity(&name)
        .map(str::to_string)
        .ok_or_else(|| LoadError::Xml(format!("unknown entity &{};", name)))
}

// === Report ===

fn read_report(name: &str, root: &Node) -> LoadResult<Report> {
    // RDL 2010+ nests layout in the first report section
    let section = root
        .child("ReportSections")
        .and_then(|s| s.child("ReportSection"))
        .unwrap_or(root);

    let body = match section.child("Body") {
        Some(node) => Body {
            height: node.size_of("Height")?,
            items: read_items(node.child("ReportItems"))?,
        },
        None => Body::default(),
    };

    let page = match section.child("Page") {
        Some(node) => PageSettings {
            height: node.size_of("PageHeight")?,
            width: node.size_of("PageWidth")?,
        },
        None => PageSettings::default(),
    };

    Ok(Report {
        name: name.to_string(),
        language: root.non_empty_text("Language"),
        width: section.size_of("Width")?,
        page,
        data_sources: root
            .all_at(&["DataSources", "DataSource"])
            .into_iter()
            .map(read_data_source)
            .collect(),
        data_sets: root
            .all_at(&["DataSets", "DataSet"])
            .into_iter()
            .map(read_data_set)
            .collect::<LoadResult<_>>()?,
        parameters: root
            .all_at(&["ReportParameters", "ReportParameter"])
            .into_iter()
            .map(read_parameter)
            .collect::<LoadResult<_>>()?,
        embedded_images: root
            .all_at(&["EmbeddedImages", "EmbeddedImage"])
            .into_iter()
            .map(|node| EmbeddedImage {
                name: node.name_attr(),
                mime_type: node.text_of("MIMEType").unwrap_or_default(),
                data: node
                    .text_of("ImageData")
                    .unwrap_or_default()
                    .split_whitespace()
                    .collect(),
            })
            .collect(),
        body,
    })
}

fn read_data_source(node: &Node) -> DataSource {
    let connection = node.child("ConnectionProperties");
    DataSource {
        name: node.name_attr(),
        reference: node.non_empty_text("DataSourceReference"),
        data_provider: connection.and_then(|c| c.non_empty_text("DataProvider")),
        connect_string: connection.and_then(|c| c.non_empty_text("ConnectString")),
    }
}

fn read_data_set(node: &Node) -> LoadResult<DataSet> {
    let name = node.name_attr();
    let query = node
        .child("Query")
        .ok_or_else(|| LoadError::Missing(format!("DataSet '{}'/Query", name)))?;

    Ok(DataSet {
        query: Query {
            data_source_name: query.text_of("DataSourceName").unwrap_or_default(),
            command_text: query.text_of("CommandText").unwrap_or_default(),
            parameters: read_name_values(query.all_at(&["QueryParameters", "QueryParameter"])),
        },
        fields: node
            .all_at(&["Fields", "Field"])
            .into_iter()
            .map(|field| Field {
                name: field.name_attr(),
                data_field: field.non_empty_text("DataField"),
                value: field.non_empty_text("Value"),
            })
            .collect(),
        name,
    })
}

fn read_name_values(nodes: Vec<&Node>) -> Vec<QueryParameter> {
    nodes
        .into_iter()
        .map(|node| QueryParameter {
            name: node.name_attr(),
            value: node.text_of("Value").unwrap_or_default(),
        })
        .collect()
}

fn read_parameter(node: &Node) -> LoadResult<ReportParameter> {
    let data_type = match node.text_of("DataType") {
        None => ParameterDataType::default(),
        Some(text) => {
            ParameterDataType::from_name(&text).ok_or_else(|| LoadError::InvalidValue {
                element: "DataType".to_string(),
                value: text,
            })?
        }
    };

    Ok(ReportParameter {
        name: node.name_attr(),
        data_type,
        prompt: node.non_empty_text("Prompt"),
        nullable: node.bool_of("Nullable")?,
        allow_blank: node.bool_of("AllowBlank")?,
        multi_value: node.bool_of("MultiValue")?,
        hidden: node.bool_of("Hidden")?,
        default_values: node
            .all_at(&["DefaultValue", "Values", "Value"])
            .into_iter()
            .map(|v| v.text.clone())
            .collect(),
        valid_values: node
            .all_at(&["ValidValues", "ParameterValues", "ParameterValue"])
            .into_iter()
            .map(|v| ValidValue {
                value: v.text_of("Value").unwrap_or_default(),
                label: v.non_empty_text("Label"),
            })
            .collect(),
    })
}

// === Report items ===

fn read_items(container: Option<&Node>) -> LoadResult<Vec<ReportItem>> {
    let Some(container) = container else {
        return Ok(Vec::new());
    };
    let mut items = Vec::new();
    for node in &container.children {
        if let Some(item) = read_item(node)? {
            items.push(item);
        }
    }
    Ok(items)
}

fn read_item(node: &Node) -> LoadResult<Option<ReportItem>> {
    let kind = match node.name.as_str() {
        "Textbox" => ItemKind::Textbox(read_textbox(node)?),
        "Tablix" => ItemKind::Tablix(Box::new(read_tablix(node)?)),
        "Rectangle" => ItemKind::Rectangle(Rectangle {
            items: read_items(node.child("ReportItems"))?,
        }),
        "Image" => ItemKind::Image(read_image(node)?),
        "Line" => ItemKind::Line,
        "Subreport" => ItemKind::Subreport(Subreport {
            report_name: node.text_of("ReportName").unwrap_or_default(),
            parameters: read_name_values(node.all_at(&["Parameters", "Parameter"])),
            no_rows_message: node.non_empty_text("NoRowsMessage"),
        }),
        other => {
            debug!("Skipping unsupported report item <{}>", other);
            return Ok(None);
        }
    };

    Ok(Some(ReportItem {
        name: node.name_attr(),
        position: Position {
            top: node.size_of("Top")?,
            left: node.size_of("Left")?,
            width: node.size_of("Width")?,
            height: node.size_of("Height")?,
        },
        visibility: node.child("Visibility").map(|v| Visibility {
            hidden: v.non_empty_text("Hidden"),
            toggle_item: v.non_empty_text("ToggleItem"),
        }),
        style: node.child("Style").map(read_style).unwrap_or_default(),
        kind,
    }))
}

fn read_style(node: &Node) -> Style {
    let mut style = Style::new();
    for child in &node.children {
        if child.children.is_empty() {
            style.insert(child.name.clone(), child.text.clone());
        } else {
            // <Border><Color>Black</Color></Border> → Border.Color
            for leaf in child.children.iter().filter(|c| c.children.is_empty()) {
                style.insert(format!("{}.{}", child.name, leaf.name), leaf.text.clone());
            }
        }
    }
    style
}

fn read_textbox(node: &Node) -> LoadResult<Textbox> {
    let mut runs: Vec<String> = node
        .all_at(&["Paragraphs", "Paragraph", "TextRuns", "TextRun", "Value"])
        .into_iter()
        .map(|v| v.text.clone())
        .collect();
    if runs.is_empty() {
        runs.extend(node.text_of("Value"));
    }
    Ok(Textbox {
        runs,
        can_grow: node.bool_of("CanGrow")?,
    })
}

fn read_image(node: &Node) -> LoadResult<Image> {
    let source = match node.text_of("Source").as_deref() {
        None | Some("Embedded") => ImageSource::Embedded,
        Some("External") => ImageSource::External,
        Some("Database") => ImageSource::Database,
        Some(other) => {
            return Err(LoadError::InvalidValue {
                element: "Source".to_string(),
                value: other.to_string(),
            });
        }
    };
    Ok(Image {
        source,
        value: node.text_of("Value").unwrap_or_default(),
        mime_type: node.non_empty_text("MIMEType"),
    })
}

// === Tablix ===

fn read_tablix(node: &Node) -> LoadResult<Tablix> {
    let body = node
        .child("TablixBody")
        .ok_or_else(|| LoadError::Missing(format!("Tablix '{}'/TablixBody", node.name_attr())))?;

    let columns = body
        .all_at(&["TablixColumns", "TablixColumn"])
        .into_iter()
        .map(|c| c.size_of("Width"))
        .collect::<LoadResult<_>>()?;

    let rows = body
        .all_at(&["TablixRows", "TablixRow"])
        .into_iter()
        .map(|row| {
            Ok(TablixRow {
                height: row.size_of("Height")?,
                cells: row
                    .all_at(&["TablixCells", "TablixCell"])
                    .into_iter()
                    .map(read_cell)
                    .collect::<LoadResult<_>>()?,
            })
        })
        .collect::<LoadResult<_>>()?;

    let corner = node
        .all_at(&["TablixCorner", "TablixCornerRows", "TablixCornerRow"])
        .into_iter()
        .map(|row| {
            row.children_named("TablixCornerCell")
                .map(|cell| {
                    let Some(contents) = cell.child("CellContents") else {
                        return Ok(TablixCornerCell::default());
                    };
                    Ok(TablixCornerCell {
                        contents: read_cell_item(contents)?,
                        row_span: contents.usize_of("RowSpan", 1)?,
                        col_span: contents.usize_of("ColSpan", 1)?,
                    })
                })
                .collect::<LoadResult<Vec<_>>>()
        })
        .collect::<LoadResult<_>>()?;

    Ok(Tablix {
        dataset_name: node.non_empty_text("DataSetName"),
        body: TablixBody { columns, rows },
        column_hierarchy: read_members(node.child("TablixColumnHierarchy"))?,
        row_hierarchy: read_members(node.child("TablixRowHierarchy"))?,
        corner,
        no_rows_message: node.non_empty_text("NoRowsMessage"),
    })
}

fn read_cell(node: &Node) -> LoadResult<TablixCell> {
    let Some(contents) = node.child("CellContents") else {
        return Ok(TablixCell::default());
    };
    Ok(TablixCell {
        contents: read_cell_item(contents)?,
        col_span: contents.usize_of("ColSpan", 1)?,
    })
}

/// The first report item inside a `CellContents`
fn read_cell_item(contents: &Node) -> LoadResult<Option<ReportItem>> {
    for child in &contents.children {
        if let Some(item) = read_item(child)? {
            return Ok(Some(item));
        }
    }
    Ok(None)
}

fn read_members(hierarchy: Option<&Node>) -> LoadResult<Vec<TablixMember>> {
    let Some(hierarchy) = hierarchy else {
        return Ok(Vec::new());
    };
    hierarchy
        .all_at(&["TablixMembers", "TablixMember"])
        .into_iter()
        .map(read_member)
        .collect()
}

fn read_member(node: &Node) -> LoadResult<TablixMember> {
    let group = node.child("Group").map(|g| Group {
        name: g.name_attr(),
        expressions: g
            .all_at(&["GroupExpressions", "GroupExpression"])
            .into_iter()
            .map(|e| e.text.clone())
            .filter(|e| !e.is_empty())
            .collect(),
    });

    let sort_expressions = node
        .all_at(&["SortExpressions", "SortExpression"])
        .into_iter()
        .map(|sort| {
            let direction = match sort.text_of("Direction") {
                None => SortDirection::Ascending,
                Some(text) => {
                    SortDirection::from_name(&text).ok_or_else(|| LoadError::InvalidValue {
                        element: "Direction".to_string(),
                        value: text,
                    })?
                }
            };
            Ok(SortExpression {
                value: sort.text_of("Value").unwrap_or_default(),
                direction,
            })
        })
        .collect::<LoadResult<_>>()?;

    let header = match node.child("TablixHeader") {
        Some(h) => Some(TablixHeader {
            size: h.size_of("Size")?,
            contents: match h.child("CellContents") {
                Some(contents) => read_cell_item(contents)?,
                None => None,
            },
        }),
        None => None,
    };

    Ok(TablixMember {
        group,
        sort_expressions,
        header,
        visibility: node.child("Visibility").map(|v| Visibility {
            hidden: v.non_empty_text("Hidden"),
            toggle_item: v.non_empty_text("ToggleItem"),
        }),
        children: read_members(Some(node))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_entities_and_cdata() {
        let xml = r#"<Report><Body><ReportItems>
            <Textbox Name="T"><Value>="a &amp; b" &amp; "&#65;"</Value></Textbox>
            <Textbox Name="C"><Value><![CDATA[x < y]]></Value></Textbox>
            </ReportItems></Body></Report>"#;
        let report = load_report("R", xml).unwrap();
        let runs: Vec<&str> = report
            .body
            .items
            .iter()
            .map(|i| i.as_textbox().unwrap().runs[0].as_str())
            .collect();
        assert_eq!(runs, vec![r#"="a & b" & "A""#, "x < y"]);
    }

    #[test]
    fn test_all_at_fans_out_and_outlives_path() {
        let root = read_tree("<R><A><B>1</B><B>2</B></A><C/><A><B>3</B></A></R>").unwrap();
        let nodes = {
            let path = vec!["A".to_string(), "B".to_string()];
            let steps: Vec<&str> = path.iter().map(String::as_str).collect();
            root.all_at(&steps)
        };
        let texts: Vec<&str> = nodes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
        assert!(root.all_at(&["A", "Missing"]).is_empty());
    }

    #[test]
    fn test_wrong_root() {
        let err = load_report("R", "<Other/>").unwrap_err();
        assert!(matches!(err, LoadError::Missing(_)));
        assert_eq!(RdlError::from(err).code(), RDL0101);
    }

    #[test]
    fn test_malformed_xml() {
        let err = load_report("R", "<Report><Body></Report>").unwrap_err();
        assert_eq!(err.code(), RDL0100);
    }

    #[test]
    fn test_invalid_size() {
        let xml = r#"<Report><Body><Height>tall</Height></Body></Report>"#;
        assert!(matches!(
            load_report("R", xml),
            Err(LoadError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_unknown_items_are_skipped() {
        let xml = r#"<Report><Body><ReportItems>
            <Chart Name="C"/><Line Name="L"/>
            </ReportItems></Body></Report>"#;
        let report = load_report("R", xml).unwrap();
        assert_eq!(report.body.items.len(), 1);
        assert_eq!(report.body.items[0].kind, ItemKind::Line);
    }

    #[test]
    fn test_style_flattening() {
        let xml = r#"<Report><Body><ReportItems>
            <Textbox Name="T"><Value>x</Value>
              <Style><FontWeight>Bold</FontWeight><Border><Style>Solid</Style></Border></Style>
            </Textbox></ReportItems></Body></Report>"#;
        let report = load_report("R", xml).unwrap();
        let style = &report.body.items[0].style;
        assert_eq!(style.get("FontWeight").map(String::as_str), Some("Bold"));
        assert_eq!(style.get("Border.Style").map(String::as_str), Some("Solid"));
    }
}
