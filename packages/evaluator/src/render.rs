//! Renderer seam and the context threaded through a render pass.

use crate::mapping::ComponentMapping;
use crate::vdom::VNode;
use pagekit_common::constants::{CONTAINER_PROPS, CQ_PATH, IS_IN_EDITOR};
use pagekit_common::Props;
use std::rc::Rc;
use thiserror::Error;

pub type RenderResult<T> = Result<T, RenderError>;

/// Default limit on nested container resolution
pub const DEFAULT_MAX_DEPTH: usize = 64;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RenderError {
    #[error("Maximum render depth {max_depth} exceeded at '{path}'")]
    DepthExceeded { max_depth: usize, path: String },

    #[error("Renderer for '{component}' failed: {message}")]
    Renderer { component: String, message: String },
}

/// A component able to display the props of one discriminant.
///
/// Rendering is synchronous and side-effect free apart from mounting
/// children through the context's host.
pub trait Renderer {
    fn render(&self, props: &Props, ctx: &RenderContext<'_>) -> RenderResult<VNode>;
}

/// Shared handle to a renderer, as stored in a [`ComponentMapping`]
pub type RendererHandle = Rc<dyn Renderer>;

struct FnRenderer<F>(F);

impl<F> Renderer for FnRenderer<F>
where
    F: Fn(&Props, &RenderContext<'_>) -> RenderResult<VNode>,
{
    fn render(&self, props: &Props, ctx: &RenderContext<'_>) -> RenderResult<VNode> {
        (self.0)(props, ctx)
    }
}

/// Wrap a closure as a renderer handle
pub fn renderer_fn<F>(f: F) -> RendererHandle
where
    F: Fn(&Props, &RenderContext<'_>) -> RenderResult<VNode> + 'static,
{
    Rc::new(FnRenderer(f))
}

/// One resolved child of a container, ready to be mounted
#[derive(Clone)]
pub struct ChildBinding {
    pub key: String,
    pub renderer: RendererHandle,
    /// Output of the model→props transform
    pub props: Props,
    pub path: String,
    pub editor_mode: bool,
    /// Layout metadata from the container's shaping hook
    pub extra_props: Props,
}

impl ChildBinding {
    /// Props the child renderer receives before any model synchronization
    pub fn child_props(&self) -> Props {
        let mut props = self.props.clone();
        props.insert(CQ_PATH, self.path.clone());
        props.insert(IS_IN_EDITOR, self.editor_mode);
        props.insert(
            CONTAINER_PROPS,
            serde_json::Value::Object(self.extra_props.fields().clone()),
        );
        props
    }
}

impl std::fmt::Debug for ChildBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChildBinding")
            .field("key", &self.key)
            .field("path", &self.path)
            .field("editor_mode", &self.editor_mode)
            .field("props", &self.props)
            .field("extra_props", &self.extra_props)
            .finish_non_exhaustive()
    }
}

/// Mounts and renders the children a container resolves.
///
/// The static host renders bindings as they are; a synchronizing host keeps
/// one live model binding per child path.
pub trait ChildHost {
    fn render_child(&self, binding: &ChildBinding, ctx: &RenderContext<'_>) -> RenderResult<VNode>;
}

/// Renders each binding directly from its resolved props
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticHost;

impl ChildHost for StaticHost {
    fn render_child(&self, binding: &ChildBinding, ctx: &RenderContext<'_>) -> RenderResult<VNode> {
        let nested = ctx.nested(&binding.path)?;
        binding.renderer.render(&binding.child_props(), &nested)
    }
}

/// State of one render pass
#[derive(Clone, Copy)]
pub struct RenderContext<'a> {
    pub mapping: &'a ComponentMapping,
    pub host: &'a dyn ChildHost,
    pub editor_mode: bool,
    pub depth: usize,
    pub max_depth: usize,
}

impl<'a> RenderContext<'a> {
    pub fn new(mapping: &'a ComponentMapping, host: &'a dyn ChildHost, editor_mode: bool) -> Self {
        Self {
            mapping,
            host,
            editor_mode,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Context for a child one level down; fails past the depth limit
    pub fn nested(&self, path: &str) -> RenderResult<RenderContext<'a>> {
        if self.depth >= self.max_depth {
            return Err(RenderError::DepthExceeded {
                max_depth: self.max_depth,
                path: path.to_string(),
            });
        }

        Ok(RenderContext {
            depth: self.depth + 1,
            ..*self
        })
    }
}
