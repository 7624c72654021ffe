//! # Pagekit Editor
//!
//! Live synchronization between rendered nodes and the content model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ evaluator: model → renderer bindings → VDOM │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: one synchronizer per mounted node   │
//! │  - cache read before first paint            │
//! │  - async fetch on cache miss                │
//! │  - change listener per node path            │
//! │  - host notification once content is ready  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ model service: cache, fetch, listeners      │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pagekit_editor::{MemoryModelStore, SyncedHost};
//! use std::rc::Rc;
//!
//! let store = MemoryModelStore::new();
//! store.insert_cached("/content/page", page_model);
//!
//! let local = tokio::task::LocalSet::new();
//! local.run_until(async {
//!     let host = SyncedHost::new(Rc::new(store.clone()));
//!     let vdom = host.render_root("/content/page", &mapping, false)?;
//! }).await;
//! ```

mod errors;
mod events;
mod host;
mod provider;
mod service;
mod store;

pub use errors::{EditorError, ModelError, ModelResult};
pub use events::{event_channel, EventChannel, HostEvent};
pub use host::SyncedHost;
pub use provider::{
    with_model, ListenerBinding, ModelConfig, ModelProvider, ModelSynchronizer, SyncBuilder,
    SyncInputs, SyncState, UpdateCallback, WithModel, CQ_FORCE_RELOAD,
};
pub use service::{FetchOptions, Listener, ListenerId, ModelService};
pub use store::{FetchCall, MemoryModelStore};

// Re-export common types for convenience
pub use pagekit_common::{Model, Props};
pub use pagekit_evaluator::{ComponentMapping, VNode};
