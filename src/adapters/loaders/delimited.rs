use crate::adapters::loaders::open_source;
use crate::domain::model::Record;
use crate::domain::ports::DataLoader;
use crate::utils::error::{ImportError, Result};
use std::io::Read;
use std::path::PathBuf;

/// 帶引號規則的 CSV，第一列為表頭
#[derive(Debug, Clone)]
pub struct CsvDataLoader {
    path: PathBuf,
    separator: u8,
}

impl CsvDataLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            separator: b',',
        }
    }

    pub fn with_separator(mut self, separator: u8) -> Self {
        self.separator = separator;
        self
    }
}

impl DataLoader for CsvDataLoader {
    fn load(&self) -> Result<Vec<Record>> {
        let file = open_source(&self.path)?;
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.separator)
            .flexible(true)
            .from_reader(file);

        let header: Vec<String> = reader
            .headers()
            .map_err(|e| ImportError::format("csv", e))?
            .iter()
            .map(str::to_string)
            .collect();

        if header.is_empty() {
            return Err(ImportError::format("csv", "missing header row"));
        }

        let mut records = Vec::new();
        for result in reader.records() {
            let row = result.map_err(|e| ImportError::format("csv", e))?;
            records.push(Record::from_pairs(&header, row.iter()));
        }

        tracing::debug!(
            "Loaded {} csv rows from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    fn format_name(&self) -> &'static str {
        "csv"
    }
}

/// 純文字分隔檔：直接依分隔符切割，不處理引號
#[derive(Debug, Clone)]
pub struct TxtDataLoader {
    path: PathBuf,
    separator: char,
}

impl TxtDataLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            separator: ',',
        }
    }

    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }
}

impl DataLoader for TxtDataLoader {
    fn load(&self) -> Result<Vec<Record>> {
        let mut content = String::new();
        open_source(&self.path)?
            .read_to_string(&mut content)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::InvalidData => ImportError::format("txt", e),
                _ => ImportError::IoError(e),
            })?;

        let mut lines = content.lines().filter(|line| !line.trim().is_empty());
        let header: Vec<&str> = lines
            .next()
            .ok_or_else(|| ImportError::format("txt", "missing header row"))?
            .split(self.separator)
            .collect();

        let records: Vec<Record> = lines
            .map(|line| Record::from_pairs(&header, line.split(self.separator)))
            .collect();

        tracing::debug!(
            "Loaded {} txt rows from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    fn format_name(&self) -> &'static str {
        "txt"
    }
}
