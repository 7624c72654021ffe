//! # In-memory model store
//!
//! A [`ModelService`] backed by two maps: a local cache, answered
//! synchronously, and a "remote" side served through asynchronous fetches.
//!
//! Lookups fall back to the nearest stored ancestor and descend through its
//! `:items`, so loading a page model makes every node below it resident.
//!
//! The store also records fetches and can fail or hold them, which is what
//! the synchronizer tests observe.

use crate::errors::{ModelError, ModelResult};
use crate::service::{FetchOptions, Listener, ListenerId, ModelService};
use futures::future::LocalBoxFuture;
use futures::FutureExt;
use pagekit_common::{path, Model};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;
use tokio::sync::watch;
use tracing::debug;

/// One recorded call to [`ModelService::get`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub path: String,
    pub force_reload: bool,
}

struct StoreInner {
    cache: RefCell<HashMap<String, Model>>,
    remote: RefCell<HashMap<String, Model>>,
    listeners: RefCell<BTreeMap<ListenerId, (String, Listener)>>,
    next_listener_id: Cell<u64>,
    fetches: RefCell<Vec<FetchCall>>,
    failing: RefCell<HashSet<String>>,
    /// Fetches wait until this is `true`
    gate: watch::Sender<bool>,
}

/// Cheaply cloneable handle to a shared in-memory store
#[derive(Clone)]
pub struct MemoryModelStore {
    inner: Rc<StoreInner>,
}

impl MemoryModelStore {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            inner: Rc::new(StoreInner {
                cache: RefCell::new(HashMap::new()),
                remote: RefCell::new(HashMap::new()),
                listeners: RefCell::new(BTreeMap::new()),
                next_listener_id: Cell::new(0),
                fetches: RefCell::new(Vec::new()),
                failing: RefCell::new(HashSet::new()),
                gate,
            }),
        }
    }

    /// Make a model resident in the local cache
    pub fn insert_cached(&self, model_path: &str, model: Model) {
        self.inner
            .cache
            .borrow_mut()
            .insert(path::sanitize(model_path), model);
    }

    /// Make a model available to fetches only
    pub fn insert_remote(&self, model_path: &str, model: Model) {
        self.inner
            .remote
            .borrow_mut()
            .insert(path::sanitize(model_path), model);
    }

    /// External mutation: store the model on both sides and notify every
    /// listener at `model_path` or below it.
    pub fn put(&self, model_path: &str, model: Model) {
        let model_path = path::sanitize(model_path);
        debug!(path = %model_path, "Model changed");

        // Entries below the changed path would shadow the new model on lookup
        for side in [&self.inner.cache, &self.inner.remote] {
            let mut side = side.borrow_mut();
            side.retain(|stored, _| !is_within(stored, &model_path));
            side.insert(model_path.clone(), model.clone());
        }

        self.notify(&model_path);
    }

    /// Drop every cached entry; remote models stay fetchable
    pub fn clear_cache(&self) {
        self.inner.cache.borrow_mut().clear();
    }

    /// Make fetches for `model_path` fail until [`recover`](Self::recover)
    pub fn fail_fetches(&self, model_path: &str) {
        self.inner
            .failing
            .borrow_mut()
            .insert(path::sanitize(model_path));
    }

    pub fn recover(&self, model_path: &str) {
        self.inner.failing.borrow_mut().remove(&path::sanitize(model_path));
    }

    /// Park all fetches until [`release_fetches`](Self::release_fetches)
    pub fn hold_fetches(&self) {
        self.inner.gate.send_replace(false);
    }

    pub fn release_fetches(&self) {
        self.inner.gate.send_replace(true);
    }

    /// Invoke the listeners registered at `model_path` or below it
    pub fn notify(&self, model_path: &str) {
        // Listeners may re-enter the store, so no borrow is held while they run
        let targets: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .values()
            .filter(|(listener_path, _)| is_within(listener_path, model_path))
            .map(|(_, listener)| listener.clone())
            .collect();

        debug!(path = %model_path, listeners = targets.len(), "Notifying listeners");
        for listener in targets {
            listener();
        }
    }

    pub fn fetch_calls(&self) -> Vec<FetchCall> {
        self.inner.fetches.borrow().clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.inner.fetches.borrow().len()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    pub fn listener_count_at(&self, model_path: &str) -> usize {
        self.inner
            .listeners
            .borrow()
            .values()
            .filter(|(listener_path, _)| listener_path == model_path)
            .count()
    }

    fn lookup(map: &HashMap<String, Model>, model_path: &str) -> Option<Model> {
        let model_path = path::sanitize(model_path);
        if let Some(model) = map.get(&model_path) {
            return Some(model.clone());
        }

        let found = path::ancestors(&model_path).skip(1).find_map(|ancestor| {
            let root = map.get(ancestor)?;
            let relative = model_path[ancestor.len()..].trim_start_matches('/');
            root.descendant(relative)
        });
        found
    }
}

impl Default for MemoryModelStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelService for MemoryModelStore {
    fn get_cached(&self, model_path: &str) -> Option<Model> {
        Self::lookup(&self.inner.cache.borrow(), model_path)
    }

    fn get(&self, model_path: &str, options: FetchOptions) -> LocalBoxFuture<'static, ModelResult<Option<Model>>> {
        let model_path = path::sanitize(model_path);
        self.inner.fetches.borrow_mut().push(FetchCall {
            path: model_path.clone(),
            force_reload: options.force_reload,
        });

        let inner = self.inner.clone();
        async move {
            let mut gate = inner.gate.subscribe();
            // The sender lives in `inner`, so the channel cannot close here
            let _ = gate.wait_for(|open| *open).await;

            if inner.failing.borrow().contains(&model_path) {
                return Err(ModelError::Fetch {
                    path: model_path,
                    message: "service unavailable".to_string(),
                });
            }

            if !options.force_reload {
                if let Some(model) = MemoryModelStore::lookup(&inner.cache.borrow(), &model_path) {
                    return Ok(Some(model));
                }
            }

            let found = MemoryModelStore::lookup(&inner.remote.borrow(), &model_path);
            if let Some(model) = &found {
                inner.cache.borrow_mut().insert(model_path, model.clone());
            }
            Ok(found)
        }
        .boxed_local()
    }

    fn add_listener(&self, model_path: &str, listener: Listener) -> ListenerId {
        let id = ListenerId(self.inner.next_listener_id.get());
        self.inner.next_listener_id.set(id.0 + 1);
        self.inner
            .listeners
            .borrow_mut()
            .insert(id, (model_path.to_string(), listener));
        id
    }

    fn remove_listener(&self, model_path: &str, id: ListenerId) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        match listeners.get(&id) {
            Some((registered, _)) if registered == model_path => {
                listeners.remove(&id);
                true
            }
            _ => false,
        }
    }
}

fn is_within(candidate: &str, root: &str) -> bool {
    candidate == root
        || candidate
            .strip_prefix(root)
            .map(|rest| rest.starts_with('/') || root.ends_with('/'))
            .unwrap_or(false)
}
