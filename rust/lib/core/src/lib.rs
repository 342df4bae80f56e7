mod code_enum;
pub mod error;
pub mod module;
pub mod principal;
pub mod table;
pub mod types;

pub use error::ServiceError;
pub use module::Module;
pub use principal::{Principal, Role, Team};
pub use table::{transaction, Filter, Table};
pub use types::{merge_patch, new_id, now_rfc3339, today, ListParams, ListResult};
