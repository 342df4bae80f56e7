use thiserror::Error;

#[derive(Error, Debug)]
pub enum SQLError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("connection error: {0}")]
    Connection(String),

    /// A UNIQUE / FOREIGN KEY / CHECK constraint rejected the statement.
    #[error("constraint violation: {0}")]
    Constraint(String),

    /// The transaction body asked for a rollback.
    #[error("transaction aborted")]
    Aborted,
}

impl SQLError {
    /// Classify a rusqlite error raised while executing a statement.
    pub(crate) fn from_exec(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::SqliteFailure(ref code, _)
                if code.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                SQLError::Constraint(e.to_string())
            }
            other => SQLError::Execution(other.to_string()),
        }
    }
}
