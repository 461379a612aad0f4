use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::core::factory::ImportFormat;
use crate::utils::error::Result;

/// 上傳內容暫存檔；drop 時刪除
#[derive(Debug)]
pub struct UploadedFile {
    file: NamedTempFile,
}

impl UploadedFile {
    pub fn persist_in(dir: &Path, format: ImportFormat, contents: &[u8]) -> Result<Self> {
        let suffix = match format {
            ImportFormat::XlsxRaw => ".xlsx".to_string(),
            other => format!(".{}", other.name()),
        };

        let mut file = tempfile::Builder::new()
            .prefix("upload-")
            .suffix(&suffix)
            .tempfile_in(dir)?;
        file.write_all(contents)?;
        file.flush()?;

        tracing::debug!(
            "Stored {} byte upload at {}",
            contents.len(),
            file.path().display()
        );
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

impl Drop for UploadedFile {
    fn drop(&mut self) {
        tracing::debug!("Removing upload {}", self.file.path().display());
    }
}
