//! # Synchronized rendering host
//!
//! [`SyncedHost`] is the [`ChildHost`] used when rendering against a live
//! model service. Every child a container resolves is mounted once, keyed
//! by its path, and rendered from its synchronizer's current props. Children
//! that disappear from a render pass are unmounted when the pass ends, which
//! releases their listeners.

use crate::errors::EditorError;
use crate::events::EventChannel;
use crate::provider::{with_model, ModelConfig, ModelProvider, SyncInputs, UpdateCallback};
use crate::service::ModelService;
use pagekit_common::{to_props, Props};
use pagekit_evaluator::{
    ChildBinding, ChildHost, ComponentMapping, RenderContext, RenderResult, VNode,
    DEFAULT_MAX_DEPTH,
};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;
use tracing::{debug, info};

/// A mounted node and the key it was mounted under; a changed key remounts
struct Mounted {
    provider: Rc<ModelProvider>,
    type_key: Option<String>,
    container_class: Option<String>,
}

pub struct SyncedHost {
    service: Rc<dyn ModelService>,
    config: ModelConfig,
    events: Option<EventChannel>,
    mounted: RefCell<BTreeMap<String, Mounted>>,
    seen: RefCell<HashSet<String>>,
    dirty: Rc<Cell<bool>>,
    max_depth: usize,
}

impl SyncedHost {
    pub fn new(service: Rc<dyn ModelService>) -> Self {
        Self {
            service,
            config: ModelConfig::default(),
            events: None,
            mounted: RefCell::new(BTreeMap::new()),
            seen: RefCell::new(HashSet::new()),
            dirty: Rc::new(Cell::new(false)),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_events(mut self, events: EventChannel) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Whether any mounted node adopted changed data since the last render
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Paths of all mounted nodes, sorted
    pub fn mounted_paths(&self) -> Vec<String> {
        self.mounted.borrow().keys().cloned().collect()
    }

    pub fn provider(&self, path: &str) -> Option<Rc<ModelProvider>> {
        self.mounted.borrow().get(path).map(|m| m.provider.clone())
    }

    /// Mount (or reuse) the root node at `root_path` and render the whole tree.
    ///
    /// The root's renderer is picked from the mapping by the root model's
    /// type, read from its synchronized props.
    pub fn render_root(
        &self,
        root_path: &str,
        mapping: &ComponentMapping,
        editor_mode: bool,
    ) -> Result<VNode, EditorError> {
        self.dirty.set(false);
        self.seen.borrow_mut().clear();

        let seed = self
            .service
            .get_cached(root_path)
            .map(|model| to_props(&model))
            .unwrap_or_default();
        let Some(type_key) = seed.discriminant().map(str::to_string) else {
            return Err(EditorError::UntypedRoot(root_path.to_string()));
        };
        let renderer = mapping
            .resolve(&type_key)
            .ok_or_else(|| EditorError::UnmappedRoot(type_key.clone()))?;

        let binding = ChildBinding {
            key: root_path.to_string(),
            renderer,
            props: seed,
            path: root_path.to_string(),
            editor_mode,
            extra_props: Props::new(),
        };

        let ctx = RenderContext::new(mapping, self, editor_mode).with_max_depth(self.max_depth);
        let provider = self.mount_binding(&binding);
        let node = provider.render(&ctx)?;

        self.sweep();
        Ok(node)
    }

    /// Unmount every node
    pub fn unmount_all(&self) {
        let mounted = std::mem::take(&mut *self.mounted.borrow_mut());
        for (path, node) in mounted {
            debug!(path = %path, "Unmounting node");
            node.provider.synchronizer().unmount();
        }
    }

    fn mount_binding(&self, binding: &ChildBinding) -> Rc<ModelProvider> {
        self.seen.borrow_mut().insert(binding.path.clone());
        let type_key = binding.props.discriminant().map(str::to_string);
        let seed = binding.child_props();
        let container_class = seed.container_class().map(str::to_string);

        if let Some(existing) = self.mounted.borrow().get(&binding.path) {
            if existing.type_key == type_key && existing.container_class == container_class {
                return existing.provider.clone();
            }
        }

        let dirty = self.dirty.clone();
        let on_update: UpdateCallback = Rc::new(move |path: &str| {
            debug!(path = %path, "Node props changed");
            dirty.set(true);
        });

        let provider = Rc::new(with_model(binding.renderer.clone(), self.config).mount(
            self.service.clone(),
            SyncInputs::at(binding.path.clone()).with_props(seed),
            self.events.clone(),
            Some(on_update),
        ));

        debug!(
            path = %binding.path,
            type_key = ?type_key,
            container_class = ?container_class,
            "Mounted node"
        );
        let replaced = self.mounted.borrow_mut().insert(
            binding.path.clone(),
            Mounted {
                provider: provider.clone(),
                type_key,
                container_class,
            },
        );
        if let Some(replaced) = replaced {
            replaced.provider.synchronizer().unmount();
        }

        provider
    }

    /// Unmount nodes not rendered in the pass that just finished
    fn sweep(&self) {
        let seen = self.seen.borrow();
        let stale: Vec<String> = self
            .mounted
            .borrow()
            .keys()
            .filter(|path| !seen.contains(*path))
            .cloned()
            .collect();

        if stale.is_empty() {
            return;
        }

        info!(count = stale.len(), "Unmounting nodes no longer in the tree");
        let mut mounted = self.mounted.borrow_mut();
        for path in stale {
            if let Some(node) = mounted.remove(&path) {
                node.provider.synchronizer().unmount();
            }
        }
    }
}

impl ChildHost for SyncedHost {
    fn render_child(&self, binding: &ChildBinding, ctx: &RenderContext<'_>) -> RenderResult<VNode> {
        let nested = ctx.nested(&binding.path)?;
        let provider = self.mount_binding(binding);
        provider.render(&nested)
    }
}

impl Drop for SyncedHost {
    fn drop(&mut self) {
        self.unmount_all();
    }
}
