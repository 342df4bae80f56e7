pub mod schema;
mod movements;
mod products;

use std::sync::Arc;

use clinic_core::{Principal, Role, ServiceError, Table};
use clinic_sql::SQLStore;

pub(crate) const PRODUCTS: Table = Table::new("inv_products", "product");
pub(crate) const LOGS: Table = Table::new("inv_logs", "inventory log");

/// Roles allowed to change stock and the catalogue.
const WRITERS: [Role; 2] = [Role::Manager, Role::Warehouse];

/// Products and stock movements.
pub struct InventoryService {
    pub(crate) sql: Arc<dyn SQLStore>,
}

impl InventoryService {
    /// Create the service, initializing the schema.
    pub fn new(sql: Arc<dyn SQLStore>) -> Result<Arc<Self>, ServiceError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self { sql }))
    }
}

pub(crate) fn require_writer(caller: &Principal) -> Result<(), ServiceError> {
    caller.require(&WRITERS)
}

pub(crate) fn page(limit: Option<usize>, offset: Option<usize>) -> (usize, usize) {
    (limit.unwrap_or(50).clamp(1, 500), offset.unwrap_or(0))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use clinic_core::{Principal, Role};
    use clinic_sql::SqliteStore;

    use super::InventoryService;

    pub fn service() -> Arc<InventoryService> {
        InventoryService::new(Arc::new(SqliteStore::open_in_memory().unwrap())).unwrap()
    }

    pub fn who(role: Role) -> Principal {
        Principal {
            staff_id: "w1".into(),
            name: "W1".into(),
            role,
            team: None,
        }
    }
}
