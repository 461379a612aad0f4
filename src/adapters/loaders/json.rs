use crate::adapters::loaders::open_source;
use crate::domain::model::Record;
use crate::domain::ports::DataLoader;
use crate::utils::error::{ImportError, Result};
use serde_json::Value;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

/// 頂層為物件陣列的 JSON 檔
#[derive(Debug, Clone)]
pub struct JsonDataLoader {
    path: PathBuf,
}

impl JsonDataLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataLoader for JsonDataLoader {
    fn load(&self) -> Result<Vec<Record>> {
        let reader = BufReader::new(open_source(&self.path)?);
        let document: Value =
            serde_json::from_reader(reader).map_err(|e| ImportError::format("json", e))?;

        let items = match document {
            Value::Array(items) => items,
            other => {
                return Err(ImportError::format(
                    "json",
                    format!("expected an array of objects, found {}", kind_of(&other)),
                ))
            }
        };

        items
            .into_iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(data) => Ok(Record { data }),
                other => Err(ImportError::format(
                    "json",
                    format!("element {} is {}, not an object", index, kind_of(&other)),
                )),
            })
            .collect()
    }

    fn format_name(&self) -> &'static str {
        "json"
    }
}

/// 每行一個 JSON 物件
#[derive(Debug, Clone)]
pub struct JsonlDataLoader {
    path: PathBuf,
}

impl JsonlDataLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataLoader for JsonlDataLoader {
    fn load(&self) -> Result<Vec<Record>> {
        let reader = BufReader::new(open_source(&self.path)?);
        let mut records = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| match e.kind() {
                std::io::ErrorKind::InvalidData => ImportError::format("jsonl", e),
                _ => ImportError::IoError(e),
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let line_no = index + 1;
            match serde_json::from_str::<Value>(&line) {
                Ok(Value::Object(data)) => records.push(Record { data }),
                Ok(other) => {
                    return Err(ImportError::format(
                        "jsonl",
                        format!("line {} is {}, not an object", line_no, kind_of(&other)),
                    ))
                }
                Err(e) => {
                    return Err(ImportError::format(
                        "jsonl",
                        format!("line {}: {}", line_no, e),
                    ))
                }
            }
        }

        Ok(records)
    }

    fn format_name(&self) -> &'static str {
        "jsonl"
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
