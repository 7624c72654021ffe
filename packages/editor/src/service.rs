//! # Model service port
//!
//! The content service is an external collaborator. Synchronizers only see
//! it through [`ModelService`]: a synchronous cache read, an asynchronous
//! fetch and path-keyed change listeners.
//!
//! Everything runs on one thread; futures are `!Send` and listeners are
//! plain `Rc` callbacks.

use crate::errors::ModelResult;
use futures::future::LocalBoxFuture;
use pagekit_common::Model;
use std::rc::Rc;

/// Callback fired when the model at a path changes
pub type Listener = Rc<dyn Fn()>;

/// Handle identifying one registered listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Options of a single fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Bypass the service's cache
    pub force_reload: bool,
}

pub trait ModelService {
    /// Model already resident for `path`, without any I/O
    fn get_cached(&self, path: &str) -> Option<Model>;

    /// Fetch the model for `path`. `Ok(None)` means the service has nothing there.
    fn get(&self, path: &str, options: FetchOptions) -> LocalBoxFuture<'static, ModelResult<Option<Model>>>;

    fn add_listener(&self, path: &str, listener: Listener) -> ListenerId;

    /// Remove a listener registered under exactly `path`; returns whether one was removed
    fn remove_listener(&self, path: &str, id: ListenerId) -> bool;
}
