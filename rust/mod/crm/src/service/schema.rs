use clinic_core::ServiceError;
use clinic_sql::SQLStore;

/// Initialize the SQLite schema for all crm resources.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    sql.exec_batch(
        "CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            phone TEXT NOT NULL UNIQUE,
            status TEXT NOT NULL,
            source TEXT NOT NULL,
            rank TEXT NOT NULL,
            total_spent INTEGER NOT NULL DEFAULT 0,
            assigned_to TEXT,
            created_by TEXT NOT NULL,
            created_on TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_customers_assigned ON customers(assigned_to);
        CREATE INDEX IF NOT EXISTS idx_customers_created_by ON customers(created_by);
        CREATE INDEX IF NOT EXISTS idx_customers_status ON customers(status);
        CREATE INDEX IF NOT EXISTS idx_customers_spent ON customers(total_spent);

        CREATE TABLE IF NOT EXISTS call_logs (
            id TEXT PRIMARY KEY,
            customer_id TEXT NOT NULL,
            staff_id TEXT NOT NULL,
            called_at TEXT NOT NULL,
            call_date TEXT NOT NULL,
            outcome TEXT NOT NULL,
            data TEXT NOT NULL,
            FOREIGN KEY (customer_id) REFERENCES customers(id) ON DELETE CASCADE
        );
        CREATE INDEX IF NOT EXISTS idx_calls_staff ON call_logs(staff_id, call_date);
        CREATE INDEX IF NOT EXISTS idx_calls_customer ON call_logs(customer_id);

        CREATE TABLE IF NOT EXISTS services (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS appointments (
            id TEXT PRIMARY KEY,
            customer_id TEXT NOT NULL,
            service_id TEXT,
            scheduled_at TEXT NOT NULL,
            ends_at TEXT NOT NULL,
            scheduled_date TEXT NOT NULL,
            status TEXT NOT NULL,
            created_by TEXT NOT NULL,
            created_on TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (customer_id) REFERENCES customers(id) ON DELETE CASCADE,
            FOREIGN KEY (service_id) REFERENCES services(id)
        );
        CREATE INDEX IF NOT EXISTS idx_appointments_when ON appointments(scheduled_at);
        CREATE INDEX IF NOT EXISTS idx_appointments_customer ON appointments(customer_id);
        CREATE INDEX IF NOT EXISTS idx_appointments_creator ON appointments(created_by, created_on);

        CREATE TABLE IF NOT EXISTS orders (
            id TEXT PRIMARY KEY,
            customer_id TEXT NOT NULL,
            appointment_id TEXT UNIQUE,
            service_id TEXT NOT NULL,
            consultant_id TEXT,
            telesale_id TEXT,
            order_date TEXT NOT NULL,
            total_amount INTEGER NOT NULL,
            actual_revenue INTEGER NOT NULL,
            debt INTEGER NOT NULL,
            is_paid INTEGER NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (customer_id) REFERENCES customers(id),
            FOREIGN KEY (service_id) REFERENCES services(id),
            FOREIGN KEY (appointment_id) REFERENCES appointments(id)
        );
        CREATE INDEX IF NOT EXISTS idx_orders_customer ON orders(customer_id, is_paid);
        CREATE INDEX IF NOT EXISTS idx_orders_date ON orders(order_date);
        CREATE INDEX IF NOT EXISTS idx_orders_consultant ON orders(consultant_id);
        CREATE INDEX IF NOT EXISTS idx_orders_telesale ON orders(telesale_id);",
    )?;
    Ok(())
}
