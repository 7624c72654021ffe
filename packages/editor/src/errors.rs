//! Error types for the editor

use thiserror::Error;

/// Failure reported by a model service fetch
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Model not found at '{0}'")]
    NotFound(String),

    #[error("Fetch failed for '{path}': {message}")]
    Fetch { path: String, message: String },
}

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Render error: {0}")]
    Render(#[from] pagekit_evaluator::RenderError),

    #[error("Invalid model: {0}")]
    Common(#[from] pagekit_common::CommonError),

    #[error("No renderer mapped for root type '{0}'")]
    UnmappedRoot(String),

    #[error("Root model at '{0}' has no type")]
    UntypedRoot(String),
}
