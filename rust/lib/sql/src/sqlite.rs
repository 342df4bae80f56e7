use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::ValueRef;
use rusqlite::Connection;
use tracing::{debug, warn};

use crate::error::SQLError;
use crate::traits::{Executor, Row, SQLStore, Value};

/// SqliteStore is a SQLStore implementation backed by rusqlite (bundled SQLite).
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a SQLite database at the given path.
    pub fn open(path: &Path) -> Result<Self, SQLError> {
        let conn = Connection::open(path).map_err(|e| SQLError::Connection(e.to_string()))?;

        // WAL for concurrent readers; foreign keys are off by default in SQLite.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .map_err(|e| SQLError::Connection(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite database (useful for tests).
    pub fn open_in_memory() -> Result<Self, SQLError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SQLError::Connection(e.to_string()))?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| SQLError::Connection(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Lock the connection. A holder that panicked mid-transaction leaves
    /// the lock poisoned; the open transaction is rolled back and the
    /// connection reused.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SQLError> {
        match self.conn.lock() {
            Ok(conn) => Ok(conn),
            Err(poisoned) => {
                let conn = poisoned.into_inner();
                warn!("recovering sqlite connection after a panic");
                if !conn.is_autocommit() {
                    conn.execute_batch("ROLLBACK")
                        .map_err(|e| SQLError::Connection(format!("rollback after panic: {e}")))?;
                }
                self.conn.clear_poison();
                Ok(conn)
            }
        }
    }
}

impl Executor for SqliteStore {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        let conn = self.lock()?;
        run_query(&conn, sql, params)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        let conn = self.lock()?;
        run_exec(&conn, sql, params)
    }

    fn exec_batch(&self, sql: &str) -> Result<(), SQLError> {
        self.lock()?
            .execute_batch(sql)
            .map_err(SQLError::from_exec)
    }
}

impl SQLStore for SqliteStore {
    fn transaction(
        &self,
        body: &mut dyn FnMut(&dyn Executor) -> Result<(), SQLError>,
    ) -> Result<(), SQLError> {
        let conn = self.lock()?;
        conn.execute_batch("BEGIN IMMEDIATE")
            .map_err(SQLError::from_exec)?;

        let tx = Locked { conn: &conn };
        match body(&tx) {
            Ok(()) => conn.execute_batch("COMMIT").map_err(SQLError::from_exec),
            Err(e) => {
                debug!("rolling back transaction: {e}");
                // The original error is more useful than a rollback failure.
                let _ = conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }
}

/// Executor over a connection whose lock is already held by a transaction.
struct Locked<'a> {
    conn: &'a Connection,
}

impl Executor for Locked<'_> {
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
        run_query(self.conn, sql, params)
    }

    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
        run_exec(self.conn, sql, params)
    }

    fn exec_batch(&self, sql: &str) -> Result<(), SQLError> {
        self.conn.execute_batch(sql).map_err(SQLError::from_exec)
    }
}

/// Convert our Value enum to rusqlite's ToSql.
fn bind_params(params: &[Value]) -> Vec<&dyn rusqlite::types::ToSql> {
    params
        .iter()
        .map(|v| -> &dyn rusqlite::types::ToSql {
            match v {
                Value::Null => &rusqlite::types::Null,
                Value::Integer(i) => i,
                Value::Real(f) => f,
                Value::Text(s) => s,
                Value::Blob(b) => b,
            }
        })
        .collect()
}

fn run_query(conn: &Connection, sql: &str, params: &[Value]) -> Result<Vec<Row>, SQLError> {
    let bound = bind_params(params);

    let mut stmt = conn
        .prepare_cached(sql)
        .map_err(|e| SQLError::Query(e.to_string()))?;

    let column_names: Vec<String> = stmt
        .column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let rows = stmt
        .query_map(bound.as_slice(), |row| {
            let mut columns = Vec::with_capacity(column_names.len());
            for (i, name) in column_names.iter().enumerate() {
                columns.push((name.clone(), owned_value(row.get_ref(i)?)));
            }
            Ok(Row { columns })
        })
        .map_err(|e| SQLError::Query(e.to_string()))?;

    let mut result = Vec::new();
    for row in rows {
        result.push(row.map_err(|e| SQLError::Query(e.to_string()))?);
    }
    Ok(result)
}

fn run_exec(conn: &Connection, sql: &str, params: &[Value]) -> Result<u64, SQLError> {
    let bound = bind_params(params);
    let affected = conn
        .execute(sql, bound.as_slice())
        .map_err(SQLError::from_exec)?;
    Ok(affected as u64)
}

fn owned_value(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}
