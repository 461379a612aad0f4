pub mod delimited;
pub mod json;
pub mod spreadsheet;
pub mod sqlite;

pub use delimited::{CsvDataLoader, TxtDataLoader};
pub use json::{JsonDataLoader, JsonlDataLoader};
pub use spreadsheet::{XlsxDataLoader, XlsxStrDataLoaderAdapter};
pub use sqlite::Sqlite3DataLoader;

use crate::utils::error::{ImportError, Result};
use std::fs::File;
use std::path::Path;

/// 來源必須是可讀取的一般檔案
pub(crate) fn ensure_source(path: &Path) -> Result<()> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ImportError::not_found(path))
    }
}

pub(crate) fn open_source(path: &Path) -> Result<File> {
    ensure_source(path)?;
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ImportError::not_found(path),
        _ => ImportError::IoError(e),
    })
}
