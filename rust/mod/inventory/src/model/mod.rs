mod movement;
mod product;

pub use movement::*;
pub use product::*;
