use clinic_core::ServiceError;
use clinic_sql::SQLStore;

/// Initialize the staff table.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    sql.exec_batch(
        "CREATE TABLE IF NOT EXISTS staff (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            role TEXT NOT NULL,
            team TEXT,
            active INTEGER NOT NULL DEFAULT 1,
            password_hash TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_staff_role ON staff(role);
        CREATE INDEX IF NOT EXISTS idx_staff_team ON staff(team, active);",
    )?;
    Ok(())
}
