//! Database handles backed by SQLite.
//!
//! A handle owns one connection. Statements take positional `?` parameters and
//! rows come back as ordered `(column, value)` lists; converting to script objects
//! happens at the method layer.

use parking_lot::Mutex;
use rusqlite::types::{Value, ValueRef};
use rusqlite::{params_from_iter, Connection};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database '{0}' is closed")]
    Closed(String),
    #[error("unsupported database driver '{0}'")]
    UnsupportedDriver(String),
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// One result row, columns in select order.
pub type Row = Vec<(String, Value)>;

/// An open database connection.
pub struct DatabaseHandle {
    pub driver: String,
    pub dsn: String,
    conn: Mutex<Option<Connection>>,
}

impl DatabaseHandle {
    /// Open `dsn` with `driver`. `":memory:"` opens a private in-memory database.
    pub fn open(driver: &str, dsn: &str) -> Result<Self, DatabaseError> {
        let conn = match driver {
            "sqlite" | "sqlite3" if dsn == ":memory:" => Connection::open_in_memory()?,
            "sqlite" | "sqlite3" => Connection::open(dsn)?,
            other => return Err(DatabaseError::UnsupportedDriver(other.to_string())),
        };
        tracing::debug!(driver, dsn, "database opened");
        Ok(Self {
            driver: driver.to_string(),
            dsn: dsn.to_string(),
            conn: Mutex::new(Some(conn)),
        })
    }

    fn with<T>(&self, f: impl FnOnce(&Connection) -> rusqlite::Result<T>) -> Result<T, DatabaseError> {
        let conn = self.conn.lock();
        let conn = conn.as_ref().ok_or_else(|| DatabaseError::Closed(self.dsn.clone()))?;
        Ok(f(conn)?)
    }

    /// Run a statement that returns no rows; the number of rows changed.
    pub fn exec(&self, sql: &str, params: Vec<Value>) -> Result<usize, DatabaseError> {
        self.with(|conn| conn.execute(sql, params_from_iter(params)))
    }

    /// Run several statements separated by `;`, without parameters.
    pub fn exec_batch(&self, sql: &str) -> Result<(), DatabaseError> {
        self.with(|conn| conn.execute_batch(sql))
    }

    pub fn query(&self, sql: &str, params: Vec<Value>) -> Result<Vec<Row>, DatabaseError> {
        self.with(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
            let mut rows = stmt.query(params_from_iter(params))?;
            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut record = Vec::with_capacity(names.len());
                for (i, name) in names.iter().enumerate() {
                    record.push((name.clone(), owned(row.get_ref(i)?)));
                }
                out.push(record);
            }
            Ok(out)
        })
    }

    pub fn last_insert_id(&self) -> Result<i64, DatabaseError> {
        self.with(|conn| Ok(conn.last_insert_rowid()))
    }

    /// True while the connection is open and answers a trivial query.
    pub fn ping(&self) -> bool {
        self.with(|conn| conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)))
            .is_ok()
    }

    pub fn close(&self) {
        if self.conn.lock().take().is_some() {
            tracing::debug!(dsn = %self.dsn, "database closed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.conn.lock().is_none()
    }
}

fn owned(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(n) => Value::Integer(n),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(text) => Value::Text(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_exec_and_query_in_memory() {
        let db = DatabaseHandle::open("sqlite3", ":memory:").unwrap();
        db.exec_batch("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT, price REAL)")
            .unwrap();
        let changed = db
            .exec(
                "INSERT INTO items (name, price) VALUES (?, ?)",
                vec![Value::Text("bolt".into()), Value::Real(0.25)],
            )
            .unwrap();
        assert_eq!(changed, 1);
        assert_eq!(db.last_insert_id().unwrap(), 1);

        let rows = db.query("SELECT name, price FROM items WHERE id = ?", vec![Value::Integer(1)]).unwrap();
        assert_eq!(
            rows,
            vec![vec![
                ("name".to_string(), Value::Text("bolt".into())),
                ("price".to_string(), Value::Real(0.25)),
            ]]
        );
    }

    #[test]
    fn test_closed_handle_and_unknown_driver() {
        let db = DatabaseHandle::open("sqlite", ":memory:").unwrap();
        assert!(db.ping());
        db.close();
        assert!(db.is_closed());
        assert!(!db.ping());
        assert!(matches!(db.exec("SELECT 1", vec![]), Err(DatabaseError::Closed(_))));
        assert!(matches!(
            DatabaseHandle::open("postgres", "host=localhost"),
            Err(DatabaseError::UnsupportedDriver(_))
        ));
    }
}
