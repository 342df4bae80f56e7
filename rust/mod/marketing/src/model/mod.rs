mod campaign;
mod content;
mod report;

pub use campaign::*;
pub use content::*;
pub use report::*;
