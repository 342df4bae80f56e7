use clinic_core::ServiceError;
use clinic_sql::SQLStore;

/// Initialize the SQLite schema for training.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), ServiceError> {
    sql.exec_batch(
        "CREATE TABLE IF NOT EXISTS training_documents (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            category TEXT,
            published INTEGER NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS training_questions (
            id TEXT PRIMARY KEY,
            document_id TEXT,
            category TEXT,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (document_id) REFERENCES training_documents(id) ON DELETE SET NULL
        );

        CREATE TABLE IF NOT EXISTS training_quizzes (
            id TEXT PRIMARY KEY,
            staff_id TEXT NOT NULL,
            submitted INTEGER NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS training_attempts (
            id TEXT PRIMARY KEY,
            staff_id TEXT NOT NULL,
            passed INTEGER NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_training_attempts_staff ON training_attempts(staff_id, created_at);",
    )?;
    Ok(())
}
