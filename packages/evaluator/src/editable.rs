//! # Editable components
//!
//! Wraps a renderer with the markup the authoring host needs: a wrapper
//! element carrying the resource path and type, and an empty-state
//! placeholder when the component has nothing to show.
//!
//! Outside the editor a component can opt out of the wrapper entirely with
//! `aemNoDecoration`.

use crate::render::{RenderContext, RenderResult, Renderer, RendererHandle};
use crate::vdom::VNode;
use pagekit_common::constants::*;
use pagekit_common::Props;
use std::rc::Rc;

/// Caller-supplied emptiness predicate; expected to be side-effect free
pub type IsEmptyFn = Rc<dyn Fn(&Props) -> bool>;

/// Configuration of [`with_editable`]
#[derive(Clone, Default)]
pub struct EditConfig {
    /// Label shown on the placeholder overlay
    pub empty_label: Option<String>,
    pub is_empty: Option<IsEmptyFn>,
    /// Resource type announced to the host
    pub resource_type: Option<String>,
}

impl EditConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn empty_label(mut self, label: impl Into<String>) -> Self {
        self.empty_label = Some(label.into());
        self
    }

    pub fn is_empty(mut self, predicate: impl Fn(&Props) -> bool + 'static) -> Self {
        self.is_empty = Some(Rc::new(predicate));
        self
    }

    pub fn resource_type(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }
}

impl std::fmt::Debug for EditConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditConfig")
            .field("empty_label", &self.empty_label)
            .field("is_empty", &self.is_empty.is_some())
            .field("resource_type", &self.resource_type)
            .finish()
    }
}

/// Renderer decorated with edit affordances
pub struct Editable {
    wrapped: RendererHandle,
    config: EditConfig,
}

impl Editable {
    pub fn new(wrapped: RendererHandle, config: EditConfig) -> Self {
        Self { wrapped, config }
    }

    /// Attributes announcing the component to the host; empty outside the editor
    pub fn edit_attributes(&self, props: &Props, editor_mode: bool) -> Vec<(&'static str, String)> {
        if !editor_mode {
            return Vec::new();
        }

        vec![
            (DATA_PATH_ATTR, props.cq_path().to_string()),
            (
                DATA_RESOURCE_TYPE_ATTR,
                self.config.resource_type.clone().unwrap_or_default(),
            ),
        ]
    }

    pub fn use_empty_placeholder(&self, props: &Props, editor_mode: bool) -> bool {
        editor_mode
            && self
                .config
                .is_empty
                .as_ref()
                .map(|is_empty| is_empty(props))
                .unwrap_or(false)
    }

    pub fn empty_placeholder(&self) -> VNode {
        let node = VNode::element("div").with_attr("class", PLACEHOLDER_CLASS_NAMES);
        match &self.config.empty_label {
            Some(label) => node.with_attr(DATA_EMPTY_TEXT_ATTR, label.clone()),
            None => node,
        }
    }
}

/// Own classes then container classes, always separated by one space
pub fn class_name(props: &Props) -> String {
    format!(
        "{} {}",
        props.get_str(CSS_CLASS_NAMES).unwrap_or(""),
        props.container_class().unwrap_or("")
    )
}

impl Renderer for Editable {
    fn render(&self, props: &Props, ctx: &RenderContext<'_>) -> RenderResult<VNode> {
        let editor_mode = ctx.editor_mode;
        let component = self.wrapped.render(props, ctx)?;

        if !editor_mode && props.get_bool(NO_DECORATION) {
            return Ok(component);
        }

        let class_name = class_name(props);
        let mut wrapper = VNode::element("div")
            .with_attrs(self.edit_attributes(props, editor_mode))
            .with_attr("class", class_name.clone())
            .with_key(class_name)
            .with_child(component);

        if self.use_empty_placeholder(props, editor_mode) {
            wrapper = wrapper.with_child(self.empty_placeholder());
        }

        Ok(wrapper)
    }
}

/// Wrap a renderer with edit affordances.
///
/// Without a config the component is never considered empty.
pub fn with_editable(renderer: RendererHandle, config: Option<EditConfig>) -> RendererHandle {
    let config = config.unwrap_or_else(|| EditConfig::new().is_empty(|_| false));
    Rc::new(Editable::new(renderer, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ComponentMapping;
    use crate::render::{renderer_fn, StaticHost};
    use serde_json::json;

    fn inner() -> RendererHandle {
        renderer_fn(|props, _| Ok(VNode::element("p").with_child(VNode::text(props.get_str("text").unwrap_or("")))))
    }

    fn render(renderer: &RendererHandle, props: &Props, editor_mode: bool) -> VNode {
        let mapping = ComponentMapping::new();
        let ctx = RenderContext::new(&mapping, &StaticHost, editor_mode);
        renderer.render(props, &ctx).unwrap()
    }

    fn placeholders(node: &VNode) -> usize {
        node.find_by_class(PLACEHOLDER_CLASS_NAMES).len()
    }

    #[test]
    fn test_placeholder_in_editor_when_empty() {
        let editable = with_editable(
            inner(),
            Some(EditConfig::new().empty_label("Text").is_empty(|_| true)),
        );
        let node = render(&editable, &Props::new(), true);

        assert_eq!(placeholders(&node), 1);
        let placeholder = node.find_by_class(PLACEHOLDER_CLASS_NAMES)[0];
        assert_eq!(placeholder.attr(DATA_EMPTY_TEXT_ATTR), Some("Text"));
    }

    #[test]
    fn test_no_placeholder_outside_editor() {
        let editable = with_editable(inner(), Some(EditConfig::new().is_empty(|_| true)));
        let node = render(&editable, &Props::new(), false);
        assert_eq!(placeholders(&node), 0);
    }

    #[test]
    fn test_no_placeholder_without_predicate() {
        let editable = with_editable(inner(), Some(EditConfig::new()));
        let node = render(&editable, &Props::new(), true);
        assert_eq!(placeholders(&node), 0);

        let editable = with_editable(inner(), None);
        let node = render(&editable, &Props::new(), true);
        assert_eq!(placeholders(&node), 0);
    }

    #[test]
    fn test_no_decoration_outside_editor_returns_wrapped_output() {
        let editable = with_editable(inner(), None);
        let props = Props::new().with(NO_DECORATION, true).with("text", "hi");

        let node = render(&editable, &props, false);
        assert_eq!(node.tag(), Some("p"));

        let node = render(&editable, &props, true);
        assert_eq!(node.tag(), Some("div"));
        assert_eq!(node.children()[0].tag(), Some("p"));
    }

    #[test]
    fn test_edit_attributes_only_in_editor() {
        let editable = with_editable(inner(), Some(EditConfig::new().resource_type("app/text")));
        let props = Props::new().with(CQ_PATH, "/content/page/text");

        let node = render(&editable, &props, true);
        assert_eq!(node.attr(DATA_PATH_ATTR), Some("/content/page/text"));
        assert_eq!(node.attr(DATA_RESOURCE_TYPE_ATTR), Some("app/text"));

        let node = render(&editable, &props, false);
        assert_eq!(node.attr(DATA_PATH_ATTR), None);
        assert_eq!(node.attr(DATA_RESOURCE_TYPE_ATTR), None);

        let editable = with_editable(inner(), None);
        let node = render(&editable, &props, true);
        assert_eq!(node.attr(DATA_RESOURCE_TYPE_ATTR), Some(""));
    }

    #[test]
    fn test_class_name_spacing() {
        assert_eq!(class_name(&Props::new()), " ");
        assert_eq!(class_name(&Props::new().with(CSS_CLASS_NAMES, "own")), "own ");
        assert_eq!(
            class_name(&Props::new().with(CONTAINER_PROPS, json!({ "class": "col" }))),
            " col"
        );
        assert_eq!(
            class_name(
                &Props::new()
                    .with(CSS_CLASS_NAMES, "own")
                    .with(CONTAINER_PROPS, json!({ "class": "col" }))
            ),
            "own col"
        );
    }
}
