use crate::adapters::loaders::ensure_source;
use crate::domain::model::Record;
use crate::domain::ports::DataLoader;
use crate::utils::error::{ImportError, Result};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use serde_json::Value;
use std::path::PathBuf;

/// 以唯讀方式執行 SELECT，欄位依位置對應 `keys`
#[derive(Debug, Clone)]
pub struct Sqlite3DataLoader {
    path: PathBuf,
    query: String,
    keys: Vec<String>,
}

impl Sqlite3DataLoader {
    pub fn new(path: impl Into<PathBuf>, query: impl Into<String>, keys: Vec<String>) -> Self {
        Self {
            path: path.into(),
            query: query.into(),
            keys,
        }
    }
}

impl DataLoader for Sqlite3DataLoader {
    fn load(&self) -> Result<Vec<Record>> {
        if self.query.trim().is_empty() {
            return Err(ImportError::ConfigError {
                message: "sqlite import requires a query".to_string(),
            });
        }
        if self.keys.is_empty() {
            return Err(ImportError::ConfigError {
                message: "sqlite import requires at least one key".to_string(),
            });
        }
        ensure_source(&self.path)?;

        let sqlite_err = |e: rusqlite::Error| ImportError::format("sqlite", e);

        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(sqlite_err)?;

        let mut stmt = conn.prepare(&self.query).map_err(sqlite_err)?;
        let column_count = stmt.column_count();
        let mut rows = stmt.query([]).map_err(sqlite_err)?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().map_err(sqlite_err)? {
            let mut values = Vec::with_capacity(column_count);
            for index in 0..column_count {
                let value = row.get_ref(index).map_err(sqlite_err)?;
                values.push(sql_value(value, index)?);
            }
            records.push(Record::from_pairs(&self.keys, values));
        }

        tracing::debug!(
            "Loaded {} sqlite rows from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    fn format_name(&self) -> &'static str {
        "sqlite"
    }
}

fn sql_value(value: ValueRef<'_>, column: usize) -> Result<Value> {
    match value {
        ValueRef::Null => Ok(Value::Null),
        ValueRef::Integer(i) => Ok(Value::from(i)),
        ValueRef::Real(f) => Ok(serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null)),
        ValueRef::Text(bytes) => std::str::from_utf8(bytes)
            .map(|s| Value::String(s.to_string()))
            .map_err(|e| ImportError::format("sqlite", format!("column {}: {}", column, e))),
        ValueRef::Blob(_) => Err(ImportError::format(
            "sqlite",
            format!("column {} is a BLOB, which cannot be imported", column),
        )),
    }
}
