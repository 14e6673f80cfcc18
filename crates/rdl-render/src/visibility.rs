//! Visibility and toggles
//!
//! An item or member declared hidden becomes visible when its toggle item
//! has been expanded: the toggle item's name is in the request's toggle set,
//! or, inside a group instance, that instance's key is. A textbox that
//! serves as a toggle item renders an expand/collapse control carrying the
//! key it expands.

use log::debug;
use rdl_eval::EvaluationContext;
use rdl_model::Visibility;
use rdl_types::is_truthy;
use uuid::Uuid;

use crate::error::RenderResult;
use crate::html::escape_attr;
use crate::scope::RenderScope;

/// Deterministic key of one group instance (`KeyGuid`)
pub fn instance_key(tablix: &str, member: usize, group_key: &str) -> String {
    let name = format!("{}/{}/{}", tablix, member, group_key);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

impl RenderScope<'_> {
    /// Whether an item or member shows, given its enclosing group instance
    pub fn is_visible(
        &self,
        visibility: Option<&Visibility>,
        ctx: &EvaluationContext<'_>,
        instance: Option<&str>,
    ) -> RenderResult<bool> {
        let Some(visibility) = visibility else {
            return Ok(true);
        };
        if !self.declared_hidden(visibility, ctx)? {
            return Ok(true);
        }
        Ok(self.is_toggled(visibility, instance))
    }

    fn declared_hidden(&self, visibility: &Visibility, ctx: &EvaluationContext<'_>) -> RenderResult<bool> {
        let Some(hidden) = visibility.hidden.as_deref() else {
            return Ok(false);
        };
        let value = self.evaluate(hidden, ctx)?;
        Ok(is_truthy(&value))
    }

    fn is_toggled(&self, visibility: &Visibility, instance: Option<&str>) -> bool {
        let Some(toggle) = visibility.toggle_item.as_deref() else {
            return false;
        };
        let toggled = self.is_expanded(toggle) || instance.is_some_and(|key| self.is_expanded(key));
        if toggled {
            debug!("Hidden item expanded by toggle '{}'", toggle);
        }
        toggled
    }

    /// Expand/collapse control for a toggle textbox
    pub fn toggle_control(&self, textbox: &str, instance: Option<&str>) -> String {
        let key = instance.unwrap_or(textbox);
        let expanded = self.is_expanded(key);
        format!(
            "<a class=\"rdl-toggle\" href=\"#\" data-toggle=\"{}\" aria-expanded=\"{}\">{}</a>",
            escape_attr(key),
            expanded,
            if expanded { "-" } else { "+" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_instance_key_is_deterministic() {
        let a = instance_key("T1", 2, "A");
        assert_eq!(a, instance_key("T1", 2, "A"));
        assert_ne!(a, instance_key("T1", 2, "B"));
        assert_ne!(a, instance_key("T2", 2, "A"));
        assert_eq!(a.len(), 36);
    }
}
