pub mod render;
pub mod types;

pub use render::{render, RenderArgs};
pub use types::{types, TypesArgs};
