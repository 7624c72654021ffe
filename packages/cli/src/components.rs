//! Built-in component mapping used by the command line renderer

use pagekit_common::Props;
use pagekit_evaluator::{
    renderer_fn, with_editable, ComponentMapping, Container, EditConfig, RendererHandle,
    ResponsiveGrid, VNode,
};
use std::rc::Rc;

pub const PAGE_TYPE: &str = "pagekit/components/page";
pub const CONTAINER_TYPE: &str = "pagekit/components/container";
pub const GRID_TYPE: &str = "wcm/foundation/components/responsivegrid";
pub const TEXT_TYPE: &str = "pagekit/components/text";
pub const TITLE_TYPE: &str = "pagekit/components/title";
pub const IMAGE_TYPE: &str = "pagekit/components/image";

pub fn builtin_mapping() -> ComponentMapping {
    ComponentMapping::new()
        .with(PAGE_TYPE, Rc::new(Container::new()))
        .with(CONTAINER_TYPE, Rc::new(Container::new()))
        .with(GRID_TYPE, Rc::new(ResponsiveGrid))
        .with(
            TEXT_TYPE,
            with_editable(
                text(),
                Some(
                    EditConfig::new()
                        .empty_label("Text")
                        .resource_type(TEXT_TYPE)
                        .is_empty(|props| blank(props, "text")),
                ),
            ),
        )
        .with(
            TITLE_TYPE,
            with_editable(
                title(),
                Some(
                    EditConfig::new()
                        .empty_label("Title")
                        .resource_type(TITLE_TYPE)
                        .is_empty(|props| blank(props, "text")),
                ),
            ),
        )
        .with(
            IMAGE_TYPE,
            with_editable(
                image(),
                Some(
                    EditConfig::new()
                        .empty_label("Image")
                        .resource_type(IMAGE_TYPE)
                        .is_empty(|props| blank(props, "src")),
                ),
            ),
        )
}

fn blank(props: &Props, key: &str) -> bool {
    props.get_str(key).map_or(true, |value| value.trim().is_empty())
}

fn text() -> RendererHandle {
    renderer_fn(|props, _| {
        Ok(VNode::element("p").with_child(VNode::text(props.get_str("text").unwrap_or(""))))
    })
}

fn title() -> RendererHandle {
    renderer_fn(|props, _| {
        // `type` holds the heading level, h1 through h6
        let tag = match props.get_str("type") {
            Some(level @ ("h1" | "h2" | "h3" | "h4" | "h5" | "h6")) => level,
            _ => "h1",
        };
        Ok(VNode::element(tag).with_child(VNode::text(props.get_str("text").unwrap_or(""))))
    })
}

fn image() -> RendererHandle {
    renderer_fn(|props, _| {
        Ok(VNode::element("img")
            .with_attr("src", props.get_str("src").unwrap_or(""))
            .with_attr("alt", props.get_str("alt").unwrap_or("")))
    })
}
