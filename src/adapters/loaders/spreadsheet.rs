use crate::adapters::loaders::ensure_source;
use crate::domain::model::{value_text, Record};
use crate::domain::ports::DataLoader;
use crate::utils::error::{ImportError, Result};
use calamine::{open_workbook, Data, DataType, Range, Reader, Xlsx, XlsxError};
use serde_json::Value;
use std::path::PathBuf;

/// 讀取第一個工作表，保留儲存格型別
#[derive(Debug, Clone)]
pub struct XlsxDataLoader {
    path: PathBuf,
}

impl XlsxDataLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn first_sheet(&self) -> Result<Range<Data>> {
        ensure_source(&self.path)?;

        let mut workbook: Xlsx<_> =
            open_workbook(&self.path).map_err(|e: XlsxError| ImportError::format("xlsx", e))?;

        match workbook.worksheet_range_at(0) {
            Some(Ok(range)) => Ok(range),
            Some(Err(e)) => Err(ImportError::format("xlsx", e)),
            None => Err(ImportError::format("xlsx", "workbook has no worksheets")),
        }
    }
}

impl DataLoader for XlsxDataLoader {
    fn load(&self) -> Result<Vec<Record>> {
        let range = self.first_sheet()?;
        let records = records_from_range(&range)?;
        tracing::debug!(
            "Loaded {} spreadsheet rows from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    fn format_name(&self) -> &'static str {
        "xlsx-raw"
    }
}

/// 將非空白的試算表值全部轉成字串，讓只接受文字的規則也能套用
#[derive(Debug, Clone)]
pub struct XlsxStrDataLoaderAdapter<L: DataLoader = XlsxDataLoader> {
    adaptee: L,
}

impl XlsxStrDataLoaderAdapter<XlsxDataLoader> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            adaptee: XlsxDataLoader::new(path),
        }
    }
}

impl<L: DataLoader> XlsxStrDataLoaderAdapter<L> {
    pub fn wrapping(adaptee: L) -> Self {
        Self { adaptee }
    }
}

impl<L: DataLoader> DataLoader for XlsxStrDataLoaderAdapter<L> {
    fn load(&self) -> Result<Vec<Record>> {
        let records = self
            .adaptee
            .load()?
            .into_iter()
            .map(stringify_record)
            .collect();
        Ok(records)
    }

    fn format_name(&self) -> &'static str {
        "xlsx"
    }
}

fn stringify_record(record: Record) -> Record {
    let data = record
        .data
        .into_iter()
        // 空白儲存格維持 null，與 xlsx-raw 一樣無法通過必填檢查
        .map(|(key, value)| (key, value_text(&value).map_or(Value::Null, Value::String)))
        .collect();
    Record { data }
}

/// 第一列為表頭；完全空白的列略過
pub(crate) fn records_from_range(range: &Range<Data>) -> Result<Vec<Record>> {
    let mut rows = range.rows();
    let header: Vec<String> = rows
        .next()
        .ok_or_else(|| ImportError::format("xlsx", "sheet has no header row"))?
        .iter()
        .map(|cell| cell.to_string())
        .collect();

    let records = rows
        .filter(|row| !row.iter().all(|cell| matches!(cell, Data::Empty)))
        .map(|row| Record::from_pairs(&header, row.iter().map(cell_value)))
        .collect();

    Ok(records)
}

pub(crate) fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::Int(i) => Value::from(*i),
        // xlsx 以浮點數儲存所有數字，整數值還原為整數
        Data::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Value::from(*f as i64),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Data::String(s) => Value::String(s.clone()),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(_) => cell
            .as_datetime()
            .map(|dt| Value::String(dt.format("%Y-%m-%d %H:%M:%S").to_string()))
            .unwrap_or(Value::Null),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(e) => Value::String(e.to_string()),
    }
}
