//! HTML output helpers
//!
//! Markup is assembled into a `String` with `fmt::Write`. Every piece of
//! report data passes through [`escape_text`] or [`escape_attr`] first.

use std::fmt::Write;

use rdl_model::{Position, Style};

/// Style properties copied into inline CSS, RDL name to CSS name
const PASS_THROUGH: &[(&str, &str)] = &[
    ("Color", "color"),
    ("BackgroundColor", "background-color"),
    ("FontFamily", "font-family"),
    ("FontSize", "font-size"),
    ("FontWeight", "font-weight"),
    ("FontStyle", "font-style"),
    ("TextAlign", "text-align"),
    ("VerticalAlign", "vertical-align"),
    ("TextDecoration", "text-decoration"),
    ("PaddingLeft", "padding-left"),
    ("PaddingRight", "padding-right"),
    ("PaddingTop", "padding-top"),
    ("PaddingBottom", "padding-bottom"),
    ("Border.Style", "border-style"),
    ("Border.Color", "border-color"),
    ("Border.Width", "border-width"),
];

pub fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn escape_attr(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Points with trailing zeros dropped: `12pt`, `7.5pt`
pub fn pt(value: f64) -> String {
    let mut text = format!("{:.2}", value);
    while text.ends_with('0') {
        text.pop();
    }
    if text.ends_with('.') {
        text.pop();
    }
    format!("{}pt", text)
}

/// Absolute placement inside the containing item
pub fn position_css(position: &Position) -> String {
    format!(
        "position:absolute;top:{};left:{};width:{};height:{};",
        pt(position.top),
        pt(position.left),
        pt(position.width),
        pt(position.height)
    )
}

/// Inline CSS for the pass-through style properties. `resolve` turns a
/// declared value (possibly an `=` expression) into its text.
pub fn style_css(style: &Style, mut resolve: impl FnMut(&str) -> String) -> String {
    let mut css = String::new();
    for (rdl, property) in PASS_THROUGH {
        let Some(declared) = style.get(*rdl) else {
            continue;
        };
        let value = resolve(declared);
        let value = value.trim();
        if value.is_empty() || value.contains(';') || value.eq_ignore_ascii_case("default") {
            continue;
        }
        let value = match *property {
            "font-weight" => font_weight(value),
            _ => value,
        };
        let _ = write!(css, "{}:{};", property, value);
    }
    css
}

fn font_weight(value: &str) -> &str {
    match value.to_ascii_lowercase().as_str() {
        "thin" => "100",
        "extralight" => "200",
        "light" => "300",
        "normal" => "400",
        "medium" => "500",
        "semibold" => "600",
        "bold" => "700",
        "extrabold" => "800",
        "heavy" => "900",
        _ => value,
    }
}

/// `<tag attr="..." ...>` with escaped attribute values; empty values are
/// left out
pub fn open_tag(tag: &str, attrs: &[(&str, &str)]) -> String {
    let mut out = format!("<{}", tag);
    for (name, value) in attrs {
        if !value.is_empty() {
            let _ = write!(out, " {}=\"{}\"", name, escape_attr(value));
        }
    }
    out.push('>');
    out
}
