//! JSON-document tables.
//!
//! Every record lives in a `data` TEXT column as JSON. A handful of extra
//! columns mirror the fields that are filtered, sorted or aggregated on; they
//! are written alongside `data` on every insert/update. Tables need at least
//! `id TEXT PRIMARY KEY` and `data TEXT NOT NULL`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use clinic_sql::{Executor, SQLError, SQLStore, Value};

use crate::{ListResult, ServiceError};

/// A typed handle on one JSON-document table.
#[derive(Debug, Clone, Copy)]
pub struct Table {
    name: &'static str,
    label: &'static str,
}

impl Table {
    /// `name` is the SQL table, `label` the singular noun used in errors.
    pub const fn new(name: &'static str, label: &'static str) -> Self {
        Self { name, label }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Insert a record with its indexed columns.
    pub fn insert<E, T>(
        &self,
        db: &E,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), ServiceError>
    where
        E: Executor + ?Sized,
        T: Serialize,
    {
        let json = serde_json::to_string(record)?;

        let mut cols = vec!["id", "data"];
        let mut placeholders = vec!["?1".to_string(), "?2".to_string()];
        let mut params = vec![Value::Text(id.to_string()), Value::Text(json)];

        for (i, (col, val)) in indexes.iter().enumerate() {
            cols.push(col);
            placeholders.push(format!("?{}", i + 3));
            params.push(val.clone());
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.name,
            cols.join(", "),
            placeholders.join(", "),
        );

        db.exec(&sql, &params).map_err(|e| match e {
            SQLError::Constraint(msg) => {
                ServiceError::Conflict(format!("{} conflicts with an existing record: {msg}", self.label))
            }
            other => other.into(),
        })?;
        Ok(())
    }

    /// Get a record by id.
    pub fn get<E, T>(&self, db: &E, id: &str) -> Result<T, ServiceError>
    where
        E: Executor + ?Sized,
        T: DeserializeOwned,
    {
        self.find(db, id)?
            .ok_or_else(|| ServiceError::NotFound(format!("{} '{}' not found", self.label, id)))
    }

    /// Get a record by id, `None` when absent.
    pub fn find<E, T>(&self, db: &E, id: &str) -> Result<Option<T>, ServiceError>
    where
        E: Executor + ?Sized,
        T: DeserializeOwned,
    {
        let sql = format!("SELECT data FROM {} WHERE id = ?1", self.name);
        let rows = db.query(&sql, &[Value::Text(id.to_string())])?;
        match rows.first() {
            Some(row) => Ok(Some(decode(row)?)),
            None => Ok(None),
        }
    }

    /// Replace a record's JSON and indexed columns.
    pub fn update<E, T>(
        &self,
        db: &E,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), ServiceError>
    where
        E: Executor + ?Sized,
        T: Serialize,
    {
        let json = serde_json::to_string(record)?;

        let mut sets = vec!["data = ?1".to_string()];
        let mut params = vec![Value::Text(json)];
        for (i, (col, val)) in indexes.iter().enumerate() {
            sets.push(format!("{} = ?{}", col, i + 2));
            params.push(val.clone());
        }
        let id_idx = params.len() + 1;
        params.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            self.name,
            sets.join(", "),
            id_idx,
        );
        let affected = db.exec(&sql, &params)?;
        if affected == 0 {
            return Err(ServiceError::NotFound(format!("{} '{}' not found", self.label, id)));
        }
        Ok(())
    }

    /// Delete a record by id.
    pub fn delete<E>(&self, db: &E, id: &str) -> Result<(), ServiceError>
    where
        E: Executor + ?Sized,
    {
        let sql = format!("DELETE FROM {} WHERE id = ?1", self.name);
        let affected = db.exec(&sql, &[Value::Text(id.to_string())]).map_err(|e| match e {
            SQLError::Constraint(_) => ServiceError::Conflict(format!(
                "{} '{}' is still referenced by other records",
                self.label, id
            )),
            other => other.into(),
        })?;
        if affected == 0 {
            return Err(ServiceError::NotFound(format!("{} '{}' not found", self.label, id)));
        }
        Ok(())
    }

    /// Count records matching `filter`.
    pub fn count<E>(&self, db: &E, filter: &Filter) -> Result<usize, ServiceError>
    where
        E: Executor + ?Sized,
    {
        let (where_sql, params) = filter.build(1);
        let sql = format!("SELECT COUNT(*) AS cnt FROM {}{}", self.name, where_sql);
        let rows = db.query(&sql, &params)?;
        Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as usize)
    }

    /// One page of records matching `filter`, plus the total match count.
    pub fn list<E, T>(
        &self,
        db: &E,
        filter: &Filter,
        order_by: &str,
        limit: usize,
        offset: usize,
    ) -> Result<ListResult<T>, ServiceError>
    where
        E: Executor + ?Sized,
        T: DeserializeOwned + Serialize,
    {
        let total = self.count(db, filter)?;

        let (where_sql, mut params) = filter.build(1);
        let limit_idx = params.len() + 1;
        params.push(Value::Integer(limit as i64));
        params.push(Value::Integer(offset as i64));

        let sql = format!(
            "SELECT data FROM {}{} ORDER BY {} LIMIT ?{} OFFSET ?{}",
            self.name,
            where_sql,
            order_by,
            limit_idx,
            limit_idx + 1,
        );
        let rows = db.query(&sql, &params)?;
        let items = rows.iter().map(decode).collect::<Result<Vec<T>, _>>()?;
        Ok(ListResult { items, total })
    }

    /// All records matching `filter`.
    pub fn select<E, T>(&self, db: &E, filter: &Filter, order_by: &str) -> Result<Vec<T>, ServiceError>
    where
        E: Executor + ?Sized,
        T: DeserializeOwned,
    {
        let (where_sql, params) = filter.build(1);
        let sql = format!("SELECT data FROM {}{} ORDER BY {}", self.name, where_sql, order_by);
        let rows = db.query(&sql, &params)?;
        rows.iter().map(decode).collect()
    }
}

fn decode<T: DeserializeOwned>(row: &clinic_sql::Row) -> Result<T, ServiceError> {
    let data = row
        .get_str("data")
        .ok_or_else(|| ServiceError::Storage("missing data column".into()))?;
    serde_json::from_str(data).map_err(|e| ServiceError::Storage(format!("bad record json: {e}")))
}

/// A conjunction of WHERE conditions over indexed columns.
///
/// Fragments use bare `?` markers; [`Filter::build`] numbers them.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    clauses: Vec<String>,
    params: Vec<Value>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(self, col: &str, v: impl Into<Value>) -> Self {
        self.raw(format!("{col} = ?"), vec![v.into()])
    }

    /// `col = v` when `v` is present, otherwise no condition.
    pub fn eq_opt<V: Into<Value>>(self, col: &str, v: Option<V>) -> Self {
        match v {
            Some(v) => self.eq(col, v),
            None => self,
        }
    }

    pub fn ne(self, col: &str, v: impl Into<Value>) -> Self {
        self.raw(format!("{col} <> ?"), vec![v.into()])
    }

    pub fn gte(self, col: &str, v: impl Into<Value>) -> Self {
        self.raw(format!("{col} >= ?"), vec![v.into()])
    }

    pub fn lt(self, col: &str, v: impl Into<Value>) -> Self {
        self.raw(format!("{col} < ?"), vec![v.into()])
    }

    pub fn lte(self, col: &str, v: impl Into<Value>) -> Self {
        self.raw(format!("{col} <= ?"), vec![v.into()])
    }

    /// Case-insensitive substring match on any of `cols`. `%` and `_` in
    /// `needle` match literally.
    pub fn search(self, cols: &[&str], needle: &str) -> Self {
        let mut pattern = String::from("%");
        for ch in needle.trim().to_lowercase().chars() {
            if matches!(ch, '%' | '_' | '\\') {
                pattern.push('\\');
            }
            pattern.push(ch);
        }
        pattern.push('%');
        let fragment = cols
            .iter()
            .map(|c| format!("LOWER({c}) LIKE ? ESCAPE '\\'"))
            .collect::<Vec<_>>()
            .join(" OR ");
        let params = cols.iter().map(|_| Value::Text(pattern.clone())).collect();
        self.raw(format!("({fragment})"), params)
    }

    /// Matches when any `(col, value)` pair is equal.
    pub fn any_eq(self, pairs: &[(&str, Value)]) -> Self {
        if pairs.is_empty() {
            return self.raw("0 = 1".to_string(), vec![]);
        }
        let fragment = pairs
            .iter()
            .map(|(c, _)| format!("{c} = ?"))
            .collect::<Vec<_>>()
            .join(" OR ");
        let params = pairs.iter().map(|(_, v)| v.clone()).collect();
        self.raw(format!("({fragment})"), params)
    }

    /// Append a fragment using bare `?` markers for `params`.
    pub fn raw(mut self, fragment: String, params: Vec<Value>) -> Self {
        self.clauses.push(fragment);
        self.params.extend(params);
        self
    }

    /// Render `" WHERE ..."` (or empty) with placeholders numbered from `first`.
    pub fn build(&self, first: usize) -> (String, Vec<Value>) {
        if self.clauses.is_empty() {
            return (String::new(), Vec::new());
        }
        let mut next = first;
        let mut sql = String::from(" WHERE ");
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            for ch in clause.chars() {
                if ch == '?' {
                    sql.push_str(&format!("?{next}"));
                    next += 1;
                } else {
                    sql.push(ch);
                }
            }
        }
        (sql, self.params.clone())
    }
}

/// Run `body` atomically on a single connection.
///
/// Any error from `body` rolls the transaction back and is returned as is.
pub fn transaction<T>(
    db: &dyn SQLStore,
    body: impl FnOnce(&dyn Executor) -> Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    let mut body = Some(body);
    let mut outcome: Option<Result<T, ServiceError>> = None;

    let committed = db.transaction(&mut |tx| {
        let run = body.take().ok_or(SQLError::Aborted)?;
        let out = run(tx);
        let failed = out.is_err();
        outcome = Some(out);
        if failed {
            Err(SQLError::Aborted)
        } else {
            Ok(())
        }
    });

    match outcome {
        Some(Err(e)) => Err(e),
        Some(Ok(v)) => {
            committed?;
            Ok(v)
        }
        None => Err(committed
            .err()
            .map(ServiceError::from)
            .unwrap_or_else(|| ServiceError::Internal("transaction body did not run".into()))),
    }
}
