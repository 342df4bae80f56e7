use clinic_core::ServiceError;
use clinic_sql::SQLStore;

/// Initialize the SQLite schema for all hr resources.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    sql.exec_batch(
        "CREATE TABLE IF NOT EXISTS hr_contracts (
            id TEXT PRIMARY KEY,
            staff_id TEXT NOT NULL,
            active INTEGER NOT NULL,
            start_date TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_contracts_staff ON hr_contracts(staff_id, active);

        CREATE TABLE IF NOT EXISTS hr_attendance (
            id TEXT PRIMARY KEY,
            staff_id TEXT NOT NULL,
            work_date TEXT NOT NULL,
            status TEXT NOT NULL,
            data TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (staff_id, work_date)
        );

        CREATE TABLE IF NOT EXISTS hr_salary_slips (
            id TEXT PRIMARY KEY,
            staff_id TEXT NOT NULL,
            month TEXT NOT NULL,
            status TEXT NOT NULL,
            data TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (staff_id, month)
        );",
    )?;
    Ok(())
}
