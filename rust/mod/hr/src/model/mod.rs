mod attendance;
mod contract;
mod payroll;

pub use attendance::*;
pub use contract::*;
pub use payroll::*;
