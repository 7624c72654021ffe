//! Content models and the flat props derived from them.
//!
//! A [`Model`] is one node of the remote content tree exactly as the content
//! service delivers it. [`Props`] is the flattened view handed to renderers;
//! [`to_props`] is the only way to get from one to the other.

use crate::constants::*;
use crate::error::CommonError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One node of the remote content tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Model(Map<String, Value>);

impl Model {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a model from an arbitrary JSON value; only objects are models
    pub fn from_value(value: Value) -> Result<Self, CommonError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(CommonError::NotAnObject {
                path: String::new(),
            }),
        }
    }

    pub fn from_json(source: &str) -> Result<Self, CommonError> {
        let value: Value = serde_json::from_str(source)?;
        Self::from_value(value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Type discriminant, if present and a string
    pub fn discriminant(&self) -> Option<&str> {
        self.0.get(TYPE_PROP).and_then(Value::as_str)
    }

    /// Ordered child keys; non-string entries are ignored
    pub fn items_order(&self) -> Vec<String> {
        self.0
            .get(ITEMS_ORDER_PROP)
            .and_then(Value::as_array)
            .map(|keys| {
                keys.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Child model by key, if the child map holds an object under it
    pub fn item(&self, key: &str) -> Option<Model> {
        self.0
            .get(ITEMS_PROP)
            .and_then(Value::as_object)
            .and_then(|items| items.get(key))
            .and_then(Value::as_object)
            .map(|child| Model(child.clone()))
    }

    /// Walk down `:items` along a relative path such as `root/text`
    pub fn descendant(&self, relative: &str) -> Option<Model> {
        let mut current = self.clone();
        for segment in relative.split('/').filter(|s| !s.is_empty()) {
            current = current.item(segment)?;
        }
        Some(current)
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Model {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Flat property bag handed to renderers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Props(Map<String, Value>);

impl Props {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Missing or non-boolean values read as `false`
    pub fn get_bool(&self, key: &str) -> bool {
        self.0.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Overlay `other` on top of `self`; keys in `other` win
    pub fn merge(&mut self, other: Props) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }

    /// Discriminant carried through the transform
    pub fn discriminant(&self) -> Option<&str> {
        self.get_str(CQ_TYPE)
    }

    pub fn cq_path(&self) -> &str {
        self.get_str(CQ_PATH).unwrap_or("")
    }

    /// Class names supplied by the enclosing container
    pub fn container_class(&self) -> Option<&str> {
        self.0
            .get(CONTAINER_PROPS)
            .and_then(Value::as_object)
            .and_then(|props| props.get("class"))
            .and_then(Value::as_str)
    }

    /// The child map and order, rebuilt as a model for recursive resolution
    pub fn as_container_model(&self) -> Model {
        let mut model = Model::new();
        if let Some(items) = self.0.get(CQ_ITEMS) {
            model.insert(ITEMS_PROP, items.clone());
        }
        if let Some(order) = self.0.get(CQ_ITEMS_ORDER) {
            model.insert(ITEMS_ORDER_PROP, order.clone());
        }
        model
    }
}

impl From<Map<String, Value>> for Props {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Flatten a model into props.
///
/// Reserved `:name` fields become `cqName` (`:type` → `cqType`,
/// `:itemsOrder` → `cqItemsOrder`); everything else is copied verbatim.
pub fn to_props(model: &Model) -> Props {
    let mut props = Map::with_capacity(model.0.len());

    for (key, value) in &model.0 {
        let prop_key = match key.strip_prefix(':') {
            Some(rest) => format!("cq{}", capitalize(rest)),
            None => key.clone(),
        };
        props.insert(prop_key, value.clone());
    }

    Props(props)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
