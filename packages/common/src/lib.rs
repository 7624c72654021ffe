pub mod constants;
pub mod error;
pub mod model;
pub mod path;
pub mod result;

pub use constants::*;
pub use error::*;
pub use model::*;
pub use result::*;
