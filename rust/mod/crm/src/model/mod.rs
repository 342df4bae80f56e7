mod appointment;
mod call;
mod customer;
mod import;
mod sales;

pub use appointment::*;
pub use call::*;
pub use customer::*;
pub use import::*;
pub use sales::*;
