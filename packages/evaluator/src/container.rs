//! # Container resolution
//!
//! Turns a container model's ordered child keys into renderer bindings.
//!
//! ## Resolution order
//!
//! For each key of `:itemsOrder`, in order and without deduplication:
//!
//! 1. keys missing from `:items` are skipped
//! 2. the child model is flattened by the props transform
//! 3. children without a string discriminant are skipped
//! 4. children whose discriminant has no mapping are skipped
//! 5. the child path is `join(parent_path, key)`
//! 6. [`ContainerHooks::shape_child_props`] adds layout metadata
//!
//! Skips leave a gap in the output and are never errors. Renderer failures
//! are not caught here.

use crate::mapping::ComponentMapping;
use crate::render::{ChildBinding, RenderContext, RenderResult, Renderer};
use crate::vdom::VNode;
use pagekit_common::constants::*;
use pagekit_common::{path, to_props, Model, Props};
use serde_json::{Map, Value};
use tracing::{debug, instrument};

/// Model→props transform used for every child
pub type PropsTransform = fn(&Model) -> Props;

/// Extension points of a container.
///
/// Implementors override the provided methods to inject layout metadata
/// without touching the resolution order.
pub trait ContainerHooks {
    /// Props nested under `containerProps` for the child at `item_path`
    fn shape_child_props(&self, _item: &Model, _key: &str, _item_path: &str, props: &Props) -> Props {
        props.clone()
    }

    /// Class names of the container's own wrapper element
    fn container_class_names(&self, _props: &Props) -> String {
        CONTAINER_CLASS_NAMES.to_string()
    }

    /// Class names of the edit-mode placeholder appended after the children
    fn placeholder_class_names(&self) -> &str {
        NEW_SECTION_CLASS_NAMES
    }
}

/// Hooks that keep every default
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHooks;

impl ContainerHooks for DefaultHooks {}

/// Resolves ordered child keys against a child map
pub struct ContainerResolver<'a> {
    mapping: &'a ComponentMapping,
    hooks: &'a dyn ContainerHooks,
    transform: PropsTransform,
}

impl<'a> ContainerResolver<'a> {
    pub fn new(mapping: &'a ComponentMapping, hooks: &'a dyn ContainerHooks) -> Self {
        Self {
            mapping,
            hooks,
            transform: to_props,
        }
    }

    pub fn with_transform(mut self, transform: PropsTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Lazily resolve `items_order` against `items`
    pub fn resolve<'b>(
        &'b self,
        items_order: &'b [String],
        items: &'b Map<String, Value>,
        parent_path: &'b str,
        editor_mode: bool,
    ) -> impl Iterator<Item = ChildBinding> + 'b {
        items_order
            .iter()
            .filter_map(move |key| self.resolve_one(key, items, parent_path, editor_mode))
    }

    fn resolve_one(
        &self,
        key: &str,
        items: &Map<String, Value>,
        parent_path: &str,
        editor_mode: bool,
    ) -> Option<ChildBinding> {
        let Some(item) = items.get(key).and_then(Value::as_object) else {
            debug!(key = %key, "Skipping order entry missing from items");
            return None;
        };
        let item = Model::from(item.clone());

        let props = (self.transform)(&item);

        let Some(discriminant) = props.discriminant().filter(|d| !d.is_empty()) else {
            debug!(key = %key, "Skipping item without a type");
            return None;
        };

        let Some(renderer) = self.mapping.resolve(discriminant) else {
            debug!(key = %key, type_key = %discriminant, "Skipping unmapped item type");
            return None;
        };

        let item_path = path::join(parent_path, key);
        let extra_props = self.hooks.shape_child_props(&item, key, &item_path, &props);

        Some(ChildBinding {
            key: key.to_string(),
            renderer,
            props,
            path: item_path,
            editor_mode,
            extra_props,
        })
    }
}

/// Attributes of the container's wrapper element.
///
/// The data path is only emitted in editor mode.
pub fn container_attributes(
    cq_path: &str,
    class_names: &str,
    editor_mode: bool,
) -> Vec<(&'static str, String)> {
    let mut attrs = vec![("class", class_names.to_string())];
    if editor_mode {
        attrs.push((DATA_PATH_ATTR, cq_path.to_string()));
    }
    attrs
}

/// Edit-mode placeholder marking where new children can be dropped
pub fn container_placeholder(cq_path: &str, class_names: &str) -> VNode {
    VNode::element("div")
        .with_attr("class", class_names)
        .with_attr(DATA_PATH_ATTR, format!("{}/*", cq_path))
}

/// Renderer for container models.
///
/// Reads `cqItems`/`cqItemsOrder`/`cqPath` from its props and renders every
/// resolvable child through the context's host.
#[derive(Debug, Default, Clone)]
pub struct Container<H: ContainerHooks = DefaultHooks> {
    hooks: H,
}

impl Container<DefaultHooks> {
    pub fn new() -> Self {
        Self { hooks: DefaultHooks }
    }
}

impl<H: ContainerHooks> Container<H> {
    pub fn with_hooks(hooks: H) -> Self {
        Self { hooks }
    }

    /// Render the children only, in resolution order
    pub fn render_children(&self, props: &Props, ctx: &RenderContext<'_>) -> RenderResult<Vec<VNode>> {
        let items = props
            .get(CQ_ITEMS)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let items_order = props.as_container_model().items_order();

        let resolver = ContainerResolver::new(ctx.mapping, &self.hooks);
        let children = resolver
            .resolve(&items_order, &items, props.cq_path(), ctx.editor_mode)
            .map(|binding| ctx.host.render_child(&binding, ctx))
            .collect::<RenderResult<Vec<_>>>()?;
        Ok(children)
    }
}

impl<H: ContainerHooks> Renderer for Container<H> {
    #[instrument(skip_all, fields(path = %props.cq_path(), depth = ctx.depth))]
    fn render(&self, props: &Props, ctx: &RenderContext<'_>) -> RenderResult<VNode> {
        let cq_path = props.cq_path();
        let children = self.render_children(props, ctx)?;
        debug!(children = children.len(), "Resolved container children");

        let class_names = self.hooks.container_class_names(props);
        let mut node = VNode::element("div")
            .with_attrs(container_attributes(cq_path, &class_names, ctx.editor_mode))
            .with_children(children);

        if ctx.editor_mode {
            node = node.with_child(container_placeholder(
                cq_path,
                self.hooks.placeholder_class_names(),
            ));
        }

        Ok(node)
    }
}

/// Responsive grid layout hooks.
///
/// The grid model carries a `columnClassNames` map from child key to the
/// column classes of that child; those land in the child's
/// `containerProps.class`.
#[derive(Debug, Default, Clone)]
pub struct GridHooks {
    column_class_names: Map<String, Value>,
    grid_class_names: String,
}

impl GridHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hooks configured from a grid's own props
    pub fn from_props(props: &Props) -> Self {
        Self {
            column_class_names: props
                .get(COLUMN_CLASS_NAMES)
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            grid_class_names: props.get_str("gridClassNames").unwrap_or("").to_string(),
        }
    }
}

impl ContainerHooks for GridHooks {
    fn shape_child_props(&self, _item: &Model, key: &str, _item_path: &str, _props: &Props) -> Props {
        let class = self
            .column_class_names
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or("");
        Props::new().with("class", class)
    }

    fn container_class_names(&self, _props: &Props) -> String {
        if self.grid_class_names.is_empty() {
            CONTAINER_CLASS_NAMES.to_string()
        } else {
            format!("{} {}", CONTAINER_CLASS_NAMES, self.grid_class_names)
        }
    }

    fn placeholder_class_names(&self) -> &str {
        "aem-Grid-newComponent"
    }
}

/// Renderer for responsive grid models; hooks are derived from each grid's props
#[derive(Debug, Default, Clone, Copy)]
pub struct ResponsiveGrid;

impl Renderer for ResponsiveGrid {
    fn render(&self, props: &Props, ctx: &RenderContext<'_>) -> RenderResult<VNode> {
        Container::with_hooks(GridHooks::from_props(props)).render(props, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{renderer_fn, StaticHost};
    use serde_json::json;

    fn mapping() -> ComponentMapping {
        ComponentMapping::new().with(
            "text",
            renderer_fn(|props, _| {
                Ok(VNode::element("p")
                    .with_attr("data-path", props.cq_path())
                    .with_child(VNode::text(props.get_str("value").unwrap_or(""))))
            }),
        )
    }

    fn items(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn order(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_end_to_end_resolution() {
        let mapping = mapping();
        let hooks = DefaultHooks;
        let resolver = ContainerResolver::new(&mapping, &hooks);
        let items = items(json!({
            "a": { ":type": "text", "value": "hi" },
            "b": { ":type": "text", "value": "never" },
            "c": { ":type": "unknown" }
        }));
        let order = order(&["a", "c"]);

        let bindings: Vec<ChildBinding> = resolver.resolve(&order, &items, "/content/page", false).collect();

        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].key, "a");
        assert_eq!(bindings[0].path, path::join("/content/page", "a"));
        assert_eq!(bindings[0].props.get_str("value"), Some("hi"));
    }

    #[test]
    fn test_order_preserved_and_duplicates_kept() {
        let mapping = mapping();
        let hooks = DefaultHooks;
        let resolver = ContainerResolver::new(&mapping, &hooks);
        let items = items(json!({
            "x": { ":type": "text" },
            "y": { ":type": "text" },
            "z": { "value": "no type" }
        }));
        let order = order(&["y", "missing", "x", "z", "y"]);

        let keys: Vec<String> = resolver
            .resolve(&order, &items, "", true)
            .map(|b| b.key)
            .collect();

        assert_eq!(keys, vec!["y", "x", "y"]);
    }

    #[test]
    fn test_default_hook_is_identity() {
        let mapping = mapping();
        let hooks = DefaultHooks;
        let resolver = ContainerResolver::new(&mapping, &hooks);
        let items = items(json!({ "a": { ":type": "text", "value": "v" } }));
        let order = order(&["a"]);

        let binding = resolver.resolve(&order, &items, "", false).next().unwrap();
        assert_eq!(binding.extra_props, binding.props);
        assert_eq!(binding.path, "a");
    }

    #[test]
    fn test_container_renders_placeholder_only_in_editor() {
        let mapping = mapping();
        let props = to_props(
            &Model::from_value(json!({
                ":path": "/content/page/root",
                ":itemsOrder": ["a"],
                ":items": { "a": { ":type": "text", "value": "hi" } }
            }))
            .unwrap(),
        );

        let ctx = RenderContext::new(&mapping, &StaticHost, true);
        let node = Container::new().render(&props, &ctx).unwrap();
        assert_eq!(node.attr(DATA_PATH_ATTR), Some("/content/page/root"));
        assert_eq!(node.children().len(), 2);
        let placeholder = &node.children()[1];
        assert_eq!(placeholder.attr("class"), Some(NEW_SECTION_CLASS_NAMES));
        assert_eq!(placeholder.attr(DATA_PATH_ATTR), Some("/content/page/root/*"));

        let ctx = RenderContext::new(&mapping, &StaticHost, false);
        let node = Container::new().render(&props, &ctx).unwrap();
        assert_eq!(node.attr(DATA_PATH_ATTR), None);
        assert_eq!(node.attr("class"), Some(CONTAINER_CLASS_NAMES));
        assert_eq!(node.children().len(), 1);
        assert_eq!(node.children()[0].attr("data-path"), Some("/content/page/root/a"));
    }

    #[test]
    fn test_grid_hooks_inject_column_classes() {
        let props = Props::new()
            .with(COLUMN_CLASS_NAMES, json!({ "a": "aem-GridColumn--default--6" }))
            .with("gridClassNames", "aem-Grid--12");
        let hooks = GridHooks::from_props(&props);

        let shaped = hooks.shape_child_props(&Model::new(), "a", "/p/a", &Props::new());
        assert_eq!(shaped.get_str("class"), Some("aem-GridColumn--default--6"));

        let shaped = hooks.shape_child_props(&Model::new(), "b", "/p/b", &Props::new());
        assert_eq!(shaped.get_str("class"), Some(""));

        assert_eq!(hooks.container_class_names(&props), "aem-container aem-Grid--12");
    }
}
