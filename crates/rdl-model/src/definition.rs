//! Report definition tree
//!
//! The tree is built once by the loader (or by hand in tests) and is
//! read-only afterwards. Children are owned by their parent; cross
//! references (data set names, toggle items, sub-report names) are plain
//! strings resolved at render time. All positions and sizes are in points.

use indexmap::IndexMap;
use rdl_types::ValueType;
use serde::{Deserialize, Serialize};

/// Inline style properties, in declaration order (`FontWeight` → `Bold`)
pub type Style = IndexMap<String, String>;

/// A loaded report definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub name: String,
    pub language: Option<String>,
    pub width: f64,
    pub page: PageSettings,
    pub data_sources: Vec<DataSource>,
    pub data_sets: Vec<DataSet>,
    pub parameters: Vec<ReportParameter>,
    pub embedded_images: Vec<EmbeddedImage>,
    pub body: Body,
}

impl Report {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn data_set(&self, name: &str) -> Option<&DataSet> {
        self.data_sets
            .iter()
            .find(|ds| ds.name.eq_ignore_ascii_case(name))
    }

    pub fn data_source(&self, name: &str) -> Option<&DataSource> {
        self.data_sources
            .iter()
            .find(|ds| ds.name.eq_ignore_ascii_case(name))
    }

    pub fn parameter(&self, name: &str) -> Option<&ReportParameter> {
        self.parameters
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }

    pub fn embedded_image(&self, name: &str) -> Option<&EmbeddedImage> {
        self.embedded_images.iter().find(|img| img.name == name)
    }

    /// Every report item in the body, depth first, including items nested in
    /// rectangles and Tablix cells
    pub fn all_items(&self) -> Vec<&ReportItem> {
        let mut out = Vec::new();
        for item in &self.body.items {
            item.collect_into(&mut out);
        }
        out
    }

    /// Find an item anywhere in the body by name
    pub fn find_item(&self, name: &str) -> Option<&ReportItem> {
        self.all_items().into_iter().find(|item| item.name == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSettings {
    pub height: f64,
    pub width: f64,
}

/// A connection the report's data sets execute against
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub name: String,
    /// Name of a shared data source registered with the host
    pub reference: Option<String>,
    pub data_provider: Option<String>,
    pub connect_string: Option<String>,
}

impl DataSource {
    pub fn is_shared(&self) -> bool {
        self.reference.is_some()
    }
}

/// A named query and its field list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataSet {
    pub name: String,
    pub query: Query,
    pub fields: Vec<Field>,
}

impl DataSet {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
    }

    /// Expression text of a calculated field
    pub fn calculated_field(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(|f| f.value.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub data_source_name: String,
    pub command_text: String,
    pub parameters: Vec<QueryParameter>,
}

/// A `Name` / value-expression pair (query parameters, sub-report parameters)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParameter {
    pub name: String,
    pub value: String,
}

/// A data set field. A field with a `value` expression is calculated;
/// otherwise it maps to the source column `data_field` (or its own name).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_field: Option<String>,
    pub value: Option<String>,
}

impl Field {
    pub fn is_calculated(&self) -> bool {
        self.value.is_some()
    }

    /// Column name to read from a data row
    pub fn source_column(&self) -> &str {
        self.data_field.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParameterDataType {
    #[default]
    String,
    Boolean,
    Integer,
    Float,
    DateTime,
}

impl ParameterDataType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" => Some(Self::String),
            "boolean" => Some(Self::Boolean),
            "integer" => Some(Self::Integer),
            "float" => Some(Self::Float),
            "datetime" => Some(Self::DateTime),
            _ => None,
        }
    }

    pub const fn value_type(&self) -> ValueType {
        match self {
            Self::String => ValueType::String,
            Self::Boolean => ValueType::Boolean,
            Self::Integer => ValueType::Integer,
            Self::Float => ValueType::Double,
            Self::DateTime => ValueType::DateTime,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportParameter {
    pub name: String,
    pub data_type: ParameterDataType,
    pub prompt: Option<String>,
    pub nullable: bool,
    pub allow_blank: bool,
    pub multi_value: bool,
    pub hidden: bool,
    /// Literal values or `=` expressions
    pub default_values: Vec<String>,
    pub valid_values: Vec<ValidValue>,
}

impl ReportParameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn has_default(&self) -> bool {
        !self.default_values.is_empty()
    }

    pub fn display_prompt(&self) -> &str {
        self.prompt.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidValue {
    pub value: String,
    pub label: Option<String>,
}

impl ValidValue {
    pub fn label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedImage {
    pub name: String,
    pub mime_type: String,
    /// Base64 image bytes
    pub data: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub height: f64,
    pub items: Vec<ReportItem>,
}

/// Offset and size within the containing item, in points
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl Position {
    pub const fn new(top: f64, left: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Whether `self` starts strictly below the bottom edge of `other`
    pub fn is_below(&self, other: &Position) -> bool {
        self.top > other.bottom()
    }
}

/// Declared visibility of an item or member
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Visibility {
    /// `true`/`false` or an `=` expression
    pub hidden: Option<String>,
    /// Name of the textbox that toggles this item
    pub toggle_item: Option<String>,
}

impl Visibility {
    pub fn hidden() -> Self {
        Self {
            hidden: Some("true".to_string()),
            toggle_item: None,
        }
    }

    pub fn toggled_by(mut self, item: impl Into<String>) -> Self {
        self.toggle_item = Some(item.into());
        self
    }
}

/// A positioned report item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportItem {
    pub name: String,
    pub position: Position,
    pub visibility: Option<Visibility>,
    pub style: Style,
    pub kind: ItemKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemKind {
    Textbox(Textbox),
    Tablix(Box<Tablix>),
    Rectangle(Rectangle),
    Image(Image),
    Line,
    Subreport(Subreport),
}

impl ItemKind {
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Textbox(_) => "Textbox",
            Self::Tablix(_) => "Tablix",
            Self::Rectangle(_) => "Rectangle",
            Self::Image(_) => "Image",
            Self::Line => "Line",
            Self::Subreport(_) => "Subreport",
        }
    }
}

impl ReportItem {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            position: Position::default(),
            visibility: None,
            style: Style::new(),
            kind,
        }
    }

    /// Single-run textbox
    pub fn textbox(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, ItemKind::Textbox(Textbox::new(value)))
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_style(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.style.insert(name.into(), value.into());
        self
    }

    pub fn toggle_item(&self) -> Option<&str> {
        self.visibility.as_ref().and_then(|v| v.toggle_item.as_deref())
    }

    pub fn as_textbox(&self) -> Option<&Textbox> {
        match &self.kind {
            ItemKind::Textbox(tb) => Some(tb),
            _ => None,
        }
    }

    pub fn as_tablix(&self) -> Option<&Tablix> {
        match &self.kind {
            ItemKind::Tablix(t) => Some(t),
            _ => None,
        }
    }

    /// Items directly contained by this one
    pub fn child_items(&self) -> Vec<&ReportItem> {
        match &self.kind {
            ItemKind::Rectangle(rect) => rect.items.iter().collect(),
            ItemKind::Tablix(tablix) => tablix.contained_items(),
            _ => Vec::new(),
        }
    }

    fn collect_into<'a>(&'a self, out: &mut Vec<&'a ReportItem>) {
        out.push(self);
        for child in self.child_items() {
            child.collect_into(out);
        }
    }
}

/// Text content made of one or more runs, each literal text or an expression
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Textbox {
    pub runs: Vec<String>,
    pub can_grow: bool,
}

impl Textbox {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            runs: vec![value.into()],
            can_grow: false,
        }
    }

    /// Whether any run is an expression
    pub fn has_expression(&self) -> bool {
        self.runs.iter().any(|r| r.trim_start().starts_with('='))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    pub items: Vec<ReportItem>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageSource {
    #[default]
    Embedded,
    External,
    Database,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub source: ImageSource,
    /// Embedded image name, URL, or (for database images) a field expression
    pub value: String,
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subreport {
    pub report_name: String,
    pub parameters: Vec<QueryParameter>,
    pub no_rows_message: Option<String>,
}

/// Grid layout bound to a data set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tablix {
    pub dataset_name: Option<String>,
    pub body: TablixBody,
    pub column_hierarchy: Vec<TablixMember>,
    pub row_hierarchy: Vec<TablixMember>,
    pub corner: Vec<Vec<TablixCornerCell>>,
    pub no_rows_message: Option<String>,
}

impl Tablix {
    /// Items inside body cells, headers and the corner
    pub fn contained_items(&self) -> Vec<&ReportItem> {
        let mut out: Vec<&ReportItem> = self
            .body
            .rows
            .iter()
            .flat_map(|row| row.cells.iter())
            .filter_map(|cell| cell.contents.as_ref())
            .collect();
        out.extend(
            self.corner
                .iter()
                .flatten()
                .filter_map(|cell| cell.contents.as_ref()),
        );
        for member in self.row_hierarchy.iter().chain(&self.column_hierarchy) {
            member.collect_header_items(&mut out);
        }
        out
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TablixBody {
    /// Column widths
    pub columns: Vec<f64>,
    pub rows: Vec<TablixRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TablixRow {
    pub height: f64,
    pub cells: Vec<TablixCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablixCell {
    pub contents: Option<ReportItem>,
    pub col_span: usize,
}

impl Default for TablixCell {
    fn default() -> Self {
        Self {
            contents: None,
            col_span: 1,
        }
    }
}

impl TablixCell {
    pub fn new(contents: ReportItem) -> Self {
        Self {
            contents: Some(contents),
            col_span: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablixCornerCell {
    pub contents: Option<ReportItem>,
    pub row_span: usize,
    pub col_span: usize,
}

impl Default for TablixCornerCell {
    fn default() -> Self {
        Self {
            contents: None,
            row_span: 1,
            col_span: 1,
        }
    }
}

/// Node of a row or column hierarchy
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TablixMember {
    pub group: Option<Group>,
    pub sort_expressions: Vec<SortExpression>,
    pub header: Option<TablixHeader>,
    pub visibility: Option<Visibility>,
    pub children: Vec<TablixMember>,
}

impl TablixMember {
    /// A static member, rendered once in the enclosing scope
    pub fn static_member() -> Self {
        Self::default()
    }

    pub fn grouped(group: Group) -> Self {
        Self {
            group: Some(group),
            ..Self::default()
        }
    }

    pub fn with_children(mut self, children: Vec<TablixMember>) -> Self {
        self.children = children;
        self
    }

    pub fn with_sort(mut self, sort: SortExpression) -> Self {
        self.sort_expressions.push(sort);
        self
    }

    pub fn with_header(mut self, header: TablixHeader) -> Self {
        self.header = Some(header);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn is_static(&self) -> bool {
        self.group.is_none()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    fn collect_header_items<'a>(&'a self, out: &mut Vec<&'a ReportItem>) {
        if let Some(item) = self.header.as_ref().and_then(|h| h.contents.as_ref()) {
            out.push(item);
        }
        for child in &self.children {
            child.collect_header_items(out);
        }
    }
}

/// Grouping of a member. A group without expressions is a details group:
/// one instance per row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub expressions: Vec<String>,
}

impl Group {
    pub fn new(name: impl Into<String>, expressions: Vec<String>) -> Self {
        Self {
            name: name.into(),
            expressions,
        }
    }

    pub fn details(name: impl Into<String>) -> Self {
        Self::new(name, Vec::new())
    }

    pub fn is_details(&self) -> bool {
        self.expressions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "ascending" => Some(Self::Ascending),
            "descending" => Some(Self::Descending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SortExpression {
    pub value: String,
    pub direction: SortDirection,
}

impl SortExpression {
    pub fn ascending(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn descending(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            direction: SortDirection::Descending,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TablixHeader {
    pub size: f64,
    pub contents: Option<ReportItem>,
}

impl TablixHeader {
    pub fn new(size: f64, contents: ReportItem) -> Self {
        Self {
            size,
            contents: Some(contents),
        }
    }
}
