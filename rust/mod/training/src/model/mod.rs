mod document;
mod quiz;

pub use document::*;
pub use quiz::*;
