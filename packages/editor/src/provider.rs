//! # Model synchronization
//!
//! A [`ModelSynchronizer`] binds one rendered node to the model at its path
//! and keeps the node's props current for the node's whole lifetime.
//!
//! ## Mount protocol
//!
//! ```text
//! canonical path ── none ──▶ Unbound (no fetch, no listener)
//!      │
//!      ▼
//! seed props from inputs
//!      │
//!      ▼
//! cache read (sync) ── hit ──▶ Synced
//!      │ miss
//!      ▼
//! fetch (async, if injecting) ──▶ Pending ──▶ Synced | unchanged
//!      │
//!      ▼
//! register one listener for the path ──▶ Listening, if still Unbound
//! ```
//!
//! The cache read completes before any fetch is issued, so resident data is
//! on screen at first paint without a round trip.
//!
//! ## Lifetime
//!
//! Each synchronizer owns exactly one listener binding and is the only one
//! to remove it. Teardown removes the binding under the path it was
//! registered with, bumps the generation counter and marks the node
//! disposed; fetch completions carry the generation they were issued under
//! and are discarded when it no longer matches.
//!
//! Fetches are spawned with [`tokio::task::spawn_local`], so mounting must
//! happen inside a [`tokio::task::LocalSet`].

use crate::events::{emit, EventChannel, HostEvent};
use crate::service::{FetchOptions, Listener, ListenerId, ModelService};
use pagekit_common::constants::CQ_PATH;
use pagekit_common::{path, to_props, Model, Props};
use pagekit_evaluator::{RenderContext, RenderResult, RendererHandle, VNode};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, instrument, warn};

/// Props key a parent can use to force a reload for one child
pub const CQ_FORCE_RELOAD: &str = "cqForceReload";

/// Configuration of [`with_model`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelConfig {
    /// Ask the service to bypass its cache when fetching
    pub force_reload: bool,
    /// Fetch the node's model on mount when it is not resident
    pub inject_props_on_init: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            force_reload: false,
            inject_props_on_init: true,
        }
    }
}

/// Where a node lives and what it starts out with
#[derive(Debug, Clone, Default)]
pub struct SyncInputs {
    pub explicit_path: Option<String>,
    pub page_path: Option<String>,
    pub item_path: Option<String>,
    /// Seed props, shown until a model is adopted
    pub props: Props,
}

impl SyncInputs {
    pub fn at(explicit_path: impl Into<String>) -> Self {
        Self {
            explicit_path: Some(explicit_path.into()),
            ..Default::default()
        }
    }

    pub fn page(page_path: impl Into<String>, item_path: Option<String>) -> Self {
        Self {
            page_path: Some(page_path.into()),
            item_path,
            ..Default::default()
        }
    }

    pub fn with_props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    pub fn canonical_path(&self) -> Option<String> {
        path::canonical(
            self.explicit_path.as_deref(),
            self.page_path.as_deref(),
            self.item_path.as_deref(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No path to synchronize with
    Unbound,
    /// Listening at a path, nothing adopted and no fetch issued
    Listening,
    /// A fetch was issued and nothing has been adopted since
    Pending,
    /// Props reflect a model from the cache or a fetch
    Synced,
    /// Unmounted; the listener has been released
    Disposed,
}

/// The exact registration a synchronizer holds with the model service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerBinding {
    pub path: String,
    pub id: ListenerId,
}

/// Called with the node's path whenever adopted data changed its props
pub type UpdateCallback = Rc<dyn Fn(&str)>;

struct SyncCore {
    props: Props,
    path: Option<String>,
    state: SyncState,
    binding: Option<ListenerBinding>,
    generation: u64,
    content_ready_sent: bool,
}

struct Shared {
    core: RefCell<SyncCore>,
    service: Rc<dyn ModelService>,
    config: ModelConfig,
    events: Option<EventChannel>,
    on_update: Option<UpdateCallback>,
}

impl Shared {
    /// Cache first; on a miss fetch when `fetch_on_miss`
    fn update_data(self: &Rc<Self>, fetch_on_miss: bool) {
        let (model_path, generation) = {
            let core = self.core.borrow();
            if core.state == SyncState::Disposed {
                return;
            }
            match &core.path {
                Some(model_path) => (model_path.clone(), core.generation),
                None => return,
            }
        };

        if self.adopt(self.service.get_cached(&model_path), generation) {
            debug!(path = %model_path, "Adopted cached model");
            return;
        }

        if fetch_on_miss {
            self.fetch(model_path, generation);
        }
    }

    fn fetch(self: &Rc<Self>, model_path: String, generation: u64) {
        let options = FetchOptions {
            force_reload: self.config.force_reload,
        };
        debug!(path = %model_path, force_reload = options.force_reload, "Fetching model");

        self.core.borrow_mut().state = SyncState::Pending;
        let request = self.service.get(&model_path, options);
        let weak = Rc::downgrade(self);

        tokio::task::spawn_local(async move {
            let result = request.await;

            let Some(shared) = weak.upgrade() else {
                debug!(path = %model_path, "Fetch completed after node was dropped");
                return;
            };

            // Empty data and failures leave the last-known-good props in place
            match result {
                Ok(data) => {
                    shared.adopt(data, generation);
                }
                Err(error) => {
                    warn!(path = %model_path, error = %error, "Model fetch failed");
                }
            }
        });
    }

    /// Merge a non-empty model into the props. Returns whether data was present
    /// and current.
    fn adopt(&self, data: Option<Model>, generation: u64) -> bool {
        let Some(model) = data.filter(|m| !m.is_empty()) else {
            return false;
        };

        let (changed, notify, model_path) = {
            let mut core = self.core.borrow_mut();
            if core.state == SyncState::Disposed || core.generation != generation {
                debug!(generation, current = core.generation, "Discarding stale model");
                return false;
            }

            let mut next = core.props.clone();
            next.merge(to_props(&model));
            let changed = next != core.props;
            core.props = next;
            core.state = SyncState::Synced;

            let notify = self.config.inject_props_on_init && !core.content_ready_sent;
            if notify {
                core.content_ready_sent = true;
            }

            (changed, notify, core.path.clone().unwrap_or_default())
        };

        if notify {
            emit(self.events.as_ref(), HostEvent::AsyncContentLoaded);
        }
        if changed {
            if let Some(on_update) = &self.on_update {
                on_update(&model_path);
            }
        }

        true
    }

    fn register(self: &Rc<Self>) {
        let model_path = {
            let core = self.core.borrow();
            if core.binding.is_some() || core.state == SyncState::Disposed {
                return;
            }
            match &core.path {
                Some(model_path) => model_path.clone(),
                None => return,
            }
        };

        let weak: Weak<Shared> = Rc::downgrade(self);
        let listener: Listener = Rc::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.update_data(true);
            }
        });

        let id = self.service.add_listener(&model_path, listener);
        debug!(path = %model_path, id = id.0, "Registered model listener");
        let mut core = self.core.borrow_mut();
        if core.state == SyncState::Unbound {
            core.state = SyncState::Listening;
        }
        core.binding = Some(ListenerBinding {
            path: model_path,
            id,
        });
    }

    fn release(&self) {
        let binding = self.core.borrow_mut().binding.take();
        if let Some(binding) = binding {
            if !self.service.remove_listener(&binding.path, binding.id) {
                warn!(path = %binding.path, id = binding.id.0, "Listener was already gone");
            }
        }
    }
}

/// Per-node synchronization state machine
pub struct ModelSynchronizer {
    shared: Rc<Shared>,
}

/// Builder for a [`ModelSynchronizer`]
pub struct SyncBuilder {
    service: Rc<dyn ModelService>,
    config: ModelConfig,
    events: Option<EventChannel>,
    on_update: Option<UpdateCallback>,
}

impl SyncBuilder {
    pub fn config(mut self, config: ModelConfig) -> Self {
        self.config = config;
        self
    }

    pub fn events(mut self, events: Option<EventChannel>) -> Self {
        self.events = events;
        self
    }

    pub fn on_update(mut self, on_update: UpdateCallback) -> Self {
        self.on_update = Some(on_update);
        self
    }

    pub fn mount(self, inputs: SyncInputs) -> ModelSynchronizer {
        ModelSynchronizer::mount_with(self, inputs)
    }
}

impl ModelSynchronizer {
    pub fn builder(service: Rc<dyn ModelService>) -> SyncBuilder {
        SyncBuilder {
            service,
            config: ModelConfig::default(),
            events: None,
            on_update: None,
        }
    }

    /// Mount with the default configuration and no host channel
    pub fn mount(service: Rc<dyn ModelService>, inputs: SyncInputs) -> Self {
        Self::builder(service).mount(inputs)
    }

    #[instrument(skip_all, fields(path = tracing::field::Empty))]
    fn mount_with(builder: SyncBuilder, inputs: SyncInputs) -> Self {
        let model_path = inputs.canonical_path();
        tracing::Span::current().record("path", model_path.as_deref().unwrap_or(""));

        let config = ModelConfig {
            force_reload: builder.config.force_reload || inputs.props.get_bool(CQ_FORCE_RELOAD),
            ..builder.config
        };

        let mut props = inputs.props;
        if let Some(model_path) = &model_path {
            props.insert(CQ_PATH, model_path.clone());
        }

        let shared = Rc::new(Shared {
            core: RefCell::new(SyncCore {
                props,
                path: model_path.clone(),
                state: SyncState::Unbound,
                binding: None,
                generation: 0,
                content_ready_sent: false,
            }),
            service: builder.service,
            config,
            events: builder.events,
            on_update: builder.on_update,
        });

        if model_path.is_none() {
            debug!("No path to synchronize; staying unbound");
            return Self { shared };
        }

        shared.update_data(config.inject_props_on_init);
        shared.register();

        Self { shared }
    }

    pub fn state(&self) -> SyncState {
        self.shared.core.borrow().state
    }

    pub fn path(&self) -> Option<String> {
        self.shared.core.borrow().path.clone()
    }

    pub fn props(&self) -> Props {
        self.shared.core.borrow().props.clone()
    }

    pub fn binding(&self) -> Option<ListenerBinding> {
        self.shared.core.borrow().binding.clone()
    }

    pub fn is_registered(&self) -> bool {
        self.shared.core.borrow().binding.is_some()
    }

    pub fn config(&self) -> ModelConfig {
        self.shared.config
    }

    /// Re-run the cache-then-fetch update, as a change notification would
    pub fn refresh(&self) {
        self.shared.update_data(true);
    }

    /// Point the node at a new location.
    ///
    /// When the canonical path changes the old binding is released under
    /// its registered path, in-flight fetches are invalidated and the mount
    /// protocol runs again for the new path.
    pub fn relocate(&self, inputs: &SyncInputs) {
        let next_path = inputs.canonical_path();
        {
            let core = self.shared.core.borrow();
            if core.state == SyncState::Disposed || core.path == next_path {
                return;
            }
        }

        debug!(from = ?self.path(), to = ?next_path, "Relocating synchronizer");
        self.shared.release();

        {
            let mut core = self.shared.core.borrow_mut();
            core.generation += 1;
            core.path = next_path.clone();
            core.state = SyncState::Unbound;
            match &next_path {
                Some(model_path) => {
                    core.props.insert(CQ_PATH, model_path.clone());
                }
                None => {
                    core.props.remove(CQ_PATH);
                }
            }
        }

        if next_path.is_some() {
            self.shared.update_data(self.shared.config.inject_props_on_init);
            self.shared.register();
        }
    }

    /// Release the listener and reject any late fetch. Idempotent.
    pub fn unmount(&self) {
        {
            let mut core = self.shared.core.borrow_mut();
            if core.state == SyncState::Disposed {
                return;
            }
            core.state = SyncState::Disposed;
            core.generation += 1;
        }
        self.shared.release();
        debug!(path = ?self.path(), "Unmounted synchronizer");
    }
}

impl Drop for ModelSynchronizer {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl std::fmt::Debug for ModelSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let core = self.shared.core.borrow();
        f.debug_struct("ModelSynchronizer")
            .field("path", &core.path)
            .field("state", &core.state)
            .field("binding", &core.binding)
            .field("generation", &core.generation)
            .finish()
    }
}

/// A renderer paired with the synchronizer feeding its props
pub struct ModelProvider {
    sync: ModelSynchronizer,
    renderer: RendererHandle,
}

impl ModelProvider {
    pub fn render(&self, ctx: &RenderContext<'_>) -> RenderResult<VNode> {
        let props = self.sync.props();
        self.renderer.render(&props, ctx)
    }

    pub fn synchronizer(&self) -> &ModelSynchronizer {
        &self.sync
    }

    pub fn props(&self) -> Props {
        self.sync.props()
    }
}

/// Mount point produced by [`with_model`]
#[derive(Clone)]
pub struct WithModel {
    renderer: RendererHandle,
    config: ModelConfig,
}

impl WithModel {
    pub fn config(&self) -> ModelConfig {
        self.config
    }

    /// Run the mount protocol and return the live provider
    pub fn mount(
        &self,
        service: Rc<dyn ModelService>,
        inputs: SyncInputs,
        events: Option<EventChannel>,
        on_update: Option<UpdateCallback>,
    ) -> ModelProvider {
        let mut builder = ModelSynchronizer::builder(service)
            .config(self.config)
            .events(events);
        if let Some(on_update) = on_update {
            builder = builder.on_update(on_update);
        }

        ModelProvider {
            sync: builder.mount(inputs),
            renderer: self.renderer.clone(),
        }
    }
}

/// Wrap a renderer so that it is fed from the model service
pub fn with_model(renderer: RendererHandle, config: ModelConfig) -> WithModel {
    WithModel { renderer, config }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryModelStore;
    use serde_json::json;
    use tokio::task::LocalSet;

    fn model(value: serde_json::Value) -> Model {
        Model::from_value(value).unwrap()
    }

    fn service(store: &MemoryModelStore) -> Rc<dyn ModelService> {
        Rc::new(store.clone())
    }

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();
        assert!(!config.force_reload);
        assert!(config.inject_props_on_init);
    }

    #[tokio::test]
    async fn test_no_path_stays_unbound() {
        LocalSet::new()
            .run_until(async {
                let store = MemoryModelStore::new();
                let sync = ModelSynchronizer::mount(
                    service(&store),
                    SyncInputs::default().with_props(Props::new().with("text", "seed")),
                );

                assert_eq!(sync.state(), SyncState::Unbound);
                assert_eq!(sync.path(), None);
                assert_eq!(sync.props().get_str("text"), Some("seed"));
                assert_eq!(store.fetch_count(), 0);
                assert_eq!(store.listener_count(), 0);
            })
            .await;
    }

    #[tokio::test]
    async fn test_cache_hit_is_synced_before_any_await() {
        LocalSet::new()
            .run_until(async {
                let store = MemoryModelStore::new();
                store.insert_cached("/p/a", model(json!({ ":type": "text", "text": "cached" })));

                let sync = ModelSynchronizer::mount(service(&store), SyncInputs::at("/p/a"));

                assert_eq!(sync.state(), SyncState::Synced);
                assert_eq!(sync.props().get_str("text"), Some("cached"));
                assert_eq!(sync.props().cq_path(), "/p/a");
                assert_eq!(store.fetch_count(), 0);
                assert_eq!(store.listener_count_at("/p/a"), 1);
            })
            .await;
    }

    #[tokio::test]
    async fn test_stale_fetch_after_relocate_is_discarded() {
        LocalSet::new()
            .run_until(async {
                let store = MemoryModelStore::new();
                store.insert_remote("/old", model(json!({ "text": "old" })));
                store.hold_fetches();

                let sync = ModelSynchronizer::mount(service(&store), SyncInputs::at("/old"));
                assert_eq!(sync.state(), SyncState::Pending);

                sync.relocate(&SyncInputs::at("/new"));
                store.release_fetches();
                tokio::task::yield_now().await;
                tokio::task::yield_now().await;

                assert_eq!(sync.path().as_deref(), Some("/new"));
                assert_eq!(sync.props().get_str("text"), None);
                assert_eq!(store.listener_count_at("/old"), 0);
                assert_eq!(store.listener_count_at("/new"), 1);
            })
            .await;
    }
}
