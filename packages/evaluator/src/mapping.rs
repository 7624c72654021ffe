/// Component mapping
///
/// Registry from a model's type discriminant to the renderer that displays it.
/// A miss is an expected outcome: content may reference types the front end
/// does not implement yet.

use crate::render::RendererHandle;
use std::collections::HashMap;
use tracing::debug;

#[derive(Clone, Default)]
pub struct ComponentMapping {
    renderers: HashMap<String, RendererHandle>,
}

impl ComponentMapping {
    pub fn new() -> Self {
        Self {
            renderers: HashMap::new(),
        }
    }

    /// Map a discriminant to a renderer. Re-registering overwrites.
    pub fn register(&mut self, type_key: impl Into<String>, renderer: RendererHandle) {
        let type_key = type_key.into();
        if self.renderers.insert(type_key.clone(), renderer).is_some() {
            debug!(type_key = %type_key, "Overwriting component mapping");
        } else {
            debug!(type_key = %type_key, "Registering component mapping");
        }
    }

    /// Builder form of [`register`](Self::register)
    pub fn with(mut self, type_key: impl Into<String>, renderer: RendererHandle) -> Self {
        self.register(type_key, renderer);
        self
    }

    pub fn resolve(&self, type_key: &str) -> Option<RendererHandle> {
        self.renderers.get(type_key).cloned()
    }

    pub fn contains(&self, type_key: &str) -> bool {
        self.renderers.contains_key(type_key)
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }

    /// Registered discriminants, sorted
    pub fn types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.renderers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl std::fmt::Debug for ComponentMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentMapping")
            .field("types", &self.types())
            .finish()
    }
}
