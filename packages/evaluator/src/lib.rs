pub mod container;
pub mod editable;
pub mod html;
pub mod mapping;
pub mod render;
pub mod vdom;

pub use container::{
    container_attributes, container_placeholder, Container, ContainerHooks, ContainerResolver,
    DefaultHooks, GridHooks, PropsTransform, ResponsiveGrid,
};
pub use editable::{class_name, with_editable, EditConfig, Editable, IsEmptyFn};
pub use html::{to_html, HtmlOptions};
pub use mapping::ComponentMapping;
pub use render::{
    renderer_fn, ChildBinding, ChildHost, RenderContext, RenderError, RenderResult, Renderer,
    RendererHandle, StaticHost, DEFAULT_MAX_DEPTH,
};
pub use vdom::VNode;
