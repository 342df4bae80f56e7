use clinic_core::ServiceError;
use clinic_sql::SQLStore;

/// Initialize the SQLite schema for inventory.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    sql.exec_batch(
        "CREATE TABLE IF NOT EXISTS inv_products (
            id TEXT PRIMARY KEY,
            sku TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            category TEXT,
            quantity INTEGER NOT NULL,
            min_quantity INTEGER NOT NULL,
            active INTEGER NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS inv_logs (
            id TEXT PRIMARY KEY,
            product_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            created_at TEXT NOT NULL,
            data TEXT NOT NULL,
            FOREIGN KEY (product_id) REFERENCES inv_products(id)
        );
        CREATE INDEX IF NOT EXISTS idx_inv_logs_product ON inv_logs(product_id, created_at);",
    )?;
    Ok(())
}
