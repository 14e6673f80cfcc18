//! Report item output
//!
//! Free-floating items (the body, rectangle contents, sub-report bodies)
//! are absolutely positioned and emitted in spatial order. Items inside a
//! Tablix cell fill their cell instead.

use std::fmt::Write;

use log::debug;
use rdl_eval::EvaluationContext;
use rdl_model::{Image, ImageSource, ItemKind, Position, ReportItem, Textbox};

use crate::comparator::spatial_order;
use crate::error::RenderResult;
use crate::html::{escape_attr, escape_text, open_tag, position_css, pt, style_css};
use crate::scope::RenderScope;

/// How an item is placed in its container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// At its declared offset inside a positioned container
    Absolute,
    /// Filling a Tablix cell
    InCell,
}

impl<'a> RenderScope<'a> {
    /// Render sibling items in spatial order
    pub fn render_items(
        &self,
        items: &[ReportItem],
        ctx: &EvaluationContext<'_>,
        instance: Option<&str>,
    ) -> RenderResult<String> {
        let positions: Vec<Position> = items.iter().map(|item| item.position).collect();
        let mut out = String::new();
        for index in spatial_order(&positions) {
            out.push_str(&self.render_item(&items[index], ctx, instance, Placement::Absolute)?);
        }
        Ok(out)
    }

    pub fn render_item(
        &self,
        item: &ReportItem,
        ctx: &EvaluationContext<'_>,
        instance: Option<&str>,
        placement: Placement,
    ) -> RenderResult<String> {
        if !self.is_visible(item.visibility.as_ref(), ctx, instance)? {
            debug!("Item '{}' hidden", item.name);
            return Ok(String::new());
        }

        let mut css = match placement {
            Placement::Absolute => position_css(&item.position),
            Placement::InCell => String::new(),
        };
        let mut failure = None;
        css.push_str(&style_css(&item.style, |value| {
            self.evaluate_text(value, ctx, "").unwrap_or_else(|err| {
                if failure.is_none() {
                    failure = Some(err);
                }
                String::new()
            })
        }));
        if let Some(err) = failure {
            return Err(err);
        }

        match &item.kind {
            ItemKind::Textbox(textbox) => self.render_textbox(item, textbox, &css, ctx, instance),
            ItemKind::Tablix(tablix) => {
                let table = self.render_tablix(&item.name, tablix, ctx)?;
                Ok(wrap("rdl-tablix", &item.name, &css, &table))
            }
            ItemKind::Rectangle(rect) => {
                let css = match placement {
                    Placement::InCell => format!("position:relative;height:{};{}", pt(item.position.height), css),
                    Placement::Absolute => css,
                };
                let inner = self.render_items(&rect.items, ctx, instance)?;
                Ok(wrap("rdl-rectangle", &item.name, &css, &inner))
            }
            ItemKind::Image(image) => self.render_image(item, image, &css, ctx),
            ItemKind::Line => Ok(render_line(item, &css)),
            ItemKind::Subreport(subreport) => {
                let inner = self.render_subreport(&item.name, subreport, ctx)?;
                Ok(wrap("rdl-subreport", &item.name, &css, &inner))
            }
        }
    }

    fn render_textbox(
        &self,
        item: &ReportItem,
        textbox: &Textbox,
        css: &str,
        ctx: &EvaluationContext<'_>,
        instance: Option<&str>,
    ) -> RenderResult<String> {
        let format = match item.style.get("Format") {
            Some(format) => self.evaluate_text(format, ctx, "")?,
            None => String::new(),
        };

        let mut text = String::new();
        for run in &textbox.runs {
            text.push_str(&self.evaluate_text(run, ctx, &format)?);
        }

        let mut inner = String::new();
        if self.prepared.is_toggle_source(&item.name) {
            inner.push_str(&self.toggle_control(&item.name, instance));
        }
        inner.push_str(&escape_text(&text).replace('\n', "<br/>"));
        Ok(wrap("rdl-textbox", &item.name, css, &inner))
    }

    fn render_image(
        &self,
        item: &ReportItem,
        image: &Image,
        css: &str,
        ctx: &EvaluationContext<'_>,
    ) -> RenderResult<String> {
        let src = match image.source {
            ImageSource::Embedded => {
                let name = self.evaluate_text(&image.value, ctx, "")?;
                match self.prepared.report().embedded_image(&name) {
                    Some(embedded) => format!("data:{};base64,{}", embedded.mime_type, embedded.data),
                    None => {
                        debug!("Embedded image '{}' not found", name);
                        String::new()
                    }
                }
            }
            ImageSource::External => self.evaluate_text(&image.value, ctx, "")?,
            ImageSource::Database => {
                let data = self.evaluate_text(&image.value, ctx, "")?;
                let mime = image.mime_type.as_deref().unwrap_or("image/png");
                if data.is_empty() {
                    String::new()
                } else {
                    format!("data:{};base64,{}", mime, data)
                }
            }
        };
        let img = format!(
            "<img src=\"{}\" alt=\"{}\"/>",
            escape_attr(&src),
            escape_attr(&item.name)
        );
        Ok(wrap("rdl-image", &item.name, css, &img))
    }
}

fn render_line(item: &ReportItem, css: &str) -> String {
    let border = |key: &str, default: &str| {
        item.style
            .get(key)
            .filter(|v| !v.trim_start().starts_with('='))
            .cloned()
            .unwrap_or_else(|| default.to_string())
    };
    let mut css = css.to_string();
    let _ = write!(
        css,
        "border-top:{} {} {};",
        border("Border.Width", "1pt"),
        border("Border.Style", "solid"),
        border("Border.Color", "black")
    );
    wrap("rdl-line", &item.name, &css, "")
}

fn wrap(class: &str, name: &str, css: &str, inner: &str) -> String {
    format!(
        "{}{}</div>",
        open_tag("div", &[("class", class), ("data-name", name), ("style", css)]),
        inner
    )
}
