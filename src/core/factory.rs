use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::adapters::loaders::{
    CsvDataLoader, JsonDataLoader, JsonlDataLoader, Sqlite3DataLoader, TxtDataLoader,
    XlsxDataLoader, XlsxStrDataLoaderAdapter,
};
use crate::core::converter::ModelConverter;
use crate::core::validator::ConstraintValidator;
use crate::domain::constraints::ConstraintSet;
use crate::domain::model::DomainModel;
use crate::domain::ports::{Converter, DataFactory, DataLoader, Validator};
use crate::utils::error::{ImportError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_required_field, validate_separator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportFormat {
    Csv,
    Txt,
    Json,
    Jsonl,
    Xlsx,
    XlsxRaw,
    Sqlite,
}

impl ImportFormat {
    pub const ALL: [ImportFormat; 7] = [
        ImportFormat::Csv,
        ImportFormat::Txt,
        ImportFormat::Json,
        ImportFormat::Jsonl,
        ImportFormat::Xlsx,
        ImportFormat::XlsxRaw,
        ImportFormat::Sqlite,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ImportFormat::Csv => "csv",
            ImportFormat::Txt => "txt",
            ImportFormat::Json => "json",
            ImportFormat::Jsonl => "jsonl",
            ImportFormat::Xlsx => "xlsx",
            ImportFormat::XlsxRaw => "xlsx-raw",
            ImportFormat::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImportFormat {
    type Err = ImportError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.name() == wanted)
            .ok_or_else(|| ImportError::UnsupportedFormat(s.to_string()))
    }
}

/// 各格式專屬的選項 (來自 multipart 欄位或 CLI 參數)
#[derive(Debug, Clone, Default)]
pub struct SourceOptions {
    pub separator: Option<String>,
    pub query: Option<String>,
    pub keys: Vec<String>,
}

impl SourceOptions {
    /// `keys` 以逗號分隔
    pub fn parse_keys(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// 來源位置加上格式選項
#[derive(Debug, Clone, PartialEq)]
pub enum SourceSpec {
    Csv { path: PathBuf, separator: u8 },
    Txt { path: PathBuf, separator: char },
    Json { path: PathBuf },
    Jsonl { path: PathBuf },
    Xlsx { path: PathBuf },
    XlsxRaw { path: PathBuf },
    Sqlite {
        path: PathBuf,
        query: String,
        keys: Vec<String>,
    },
}

impl SourceSpec {
    pub fn build(
        format: ImportFormat,
        path: impl Into<PathBuf>,
        options: &SourceOptions,
        default_separator: &str,
    ) -> Result<Self> {
        let path = path.into();
        let separator = options.separator.as_deref().unwrap_or(default_separator);

        let spec = match format {
            ImportFormat::Csv => SourceSpec::Csv {
                path,
                separator: validate_separator("separator", separator)?,
            },
            ImportFormat::Txt => SourceSpec::Txt {
                path,
                separator: validate_separator("separator", separator)? as char,
            },
            ImportFormat::Json => SourceSpec::Json { path },
            ImportFormat::Jsonl => SourceSpec::Jsonl { path },
            ImportFormat::Xlsx => SourceSpec::Xlsx { path },
            ImportFormat::XlsxRaw => SourceSpec::XlsxRaw { path },
            ImportFormat::Sqlite => {
                let query = validate_required_field("query", &options.query)?.clone();
                validate_non_empty_string("query", &query)?;
                if options.keys.is_empty() {
                    return Err(ImportError::MissingConfigError {
                        field: "keys".to_string(),
                    });
                }
                SourceSpec::Sqlite {
                    path,
                    query,
                    keys: options.keys.clone(),
                }
            }
        };

        Ok(spec)
    }

    pub fn format(&self) -> ImportFormat {
        match self {
            SourceSpec::Csv { .. } => ImportFormat::Csv,
            SourceSpec::Txt { .. } => ImportFormat::Txt,
            SourceSpec::Json { .. } => ImportFormat::Json,
            SourceSpec::Jsonl { .. } => ImportFormat::Jsonl,
            SourceSpec::Xlsx { .. } => ImportFormat::Xlsx,
            SourceSpec::XlsxRaw { .. } => ImportFormat::XlsxRaw,
            SourceSpec::Sqlite { .. } => ImportFormat::Sqlite,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            SourceSpec::Csv { path, .. }
            | SourceSpec::Txt { path, .. }
            | SourceSpec::Json { path }
            | SourceSpec::Jsonl { path }
            | SourceSpec::Xlsx { path }
            | SourceSpec::XlsxRaw { path }
            | SourceSpec::Sqlite { path, .. } => path,
        }
    }
}

/// 將 (格式, 領域) 組合成 loader/validator/converter，本身不含邏輯
#[derive(Debug, Clone)]
pub struct ImportFactory<M: DomainModel> {
    source: SourceSpec,
    constraints: ConstraintSet,
    _model: PhantomData<fn() -> M>,
}

impl<M: DomainModel> ImportFactory<M> {
    pub fn new(source: SourceSpec, constraints: ConstraintSet) -> Result<Self> {
        constraints.ensure_covers::<M>()?;
        Ok(Self {
            source,
            constraints,
            _model: PhantomData,
        })
    }

    pub fn source(&self) -> &SourceSpec {
        &self.source
    }
}

impl<M: DomainModel> DataFactory for ImportFactory<M> {
    type Model = M;

    fn create_data_loader(&self) -> Box<dyn DataLoader> {
        match &self.source {
            SourceSpec::Csv { path, separator } => {
                Box::new(CsvDataLoader::new(path).with_separator(*separator))
            }
            SourceSpec::Txt { path, separator } => {
                Box::new(TxtDataLoader::new(path).with_separator(*separator))
            }
            SourceSpec::Json { path } => Box::new(JsonDataLoader::new(path)),
            SourceSpec::Jsonl { path } => Box::new(JsonlDataLoader::new(path)),
            SourceSpec::Xlsx { path } => Box::new(XlsxStrDataLoaderAdapter::new(path)),
            SourceSpec::XlsxRaw { path } => Box::new(XlsxDataLoader::new(path)),
            SourceSpec::Sqlite { path, query, keys } => {
                Box::new(Sqlite3DataLoader::new(path, query.clone(), keys.clone()))
            }
        }
    }

    fn create_validator(&self) -> Box<dyn Validator> {
        Box::new(ConstraintValidator::new(self.constraints.clone()))
    }

    fn create_converter(&self) -> Box<dyn Converter<Output = M>> {
        Box::new(ModelConverter::<M>::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::constraints::FieldRule;
    use crate::domain::model::{Car, Domain, Liability};

    #[test]
    fn test_format_from_str() {
        assert_eq!("csv".parse::<ImportFormat>().unwrap(), ImportFormat::Csv);
        assert_eq!("XLSX".parse::<ImportFormat>().unwrap(), ImportFormat::Xlsx);
        assert_eq!(
            "xlsx-raw".parse::<ImportFormat>().unwrap(),
            ImportFormat::XlsxRaw
        );
        assert!(matches!(
            "parquet".parse::<ImportFormat>(),
            Err(ImportError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_source_spec_uses_default_separator() {
        let spec = SourceSpec::build(
            ImportFormat::Csv,
            "cars.csv",
            &SourceOptions::default(),
            ";",
        )
        .unwrap();
        assert_eq!(
            spec,
            SourceSpec::Csv {
                path: PathBuf::from("cars.csv"),
                separator: b';'
            }
        );
    }

    #[test]
    fn test_source_spec_sqlite_requires_query_and_keys() {
        let missing_query = SourceSpec::build(
            ImportFormat::Sqlite,
            "cars.db",
            &SourceOptions::default(),
            ",",
        );
        assert!(matches!(
            missing_query,
            Err(ImportError::MissingConfigError { .. })
        ));

        let options = SourceOptions {
            query: Some("SELECT * FROM mots".to_string()),
            keys: SourceOptions::parse_keys("legal_identifier, start_date,,end_date"),
            ..SourceOptions::default()
        };
        let spec = SourceSpec::build(ImportFormat::Sqlite, "mots.db", &options, ",").unwrap();
        match spec {
            SourceSpec::Sqlite { keys, .. } => {
                assert_eq!(keys, vec!["legal_identifier", "start_date", "end_date"])
            }
            other => panic!("unexpected source: {other:?}"),
        }
    }

    #[test]
    fn test_factory_rejects_constraints_missing_model_fields() {
        let partial = ConstraintSet::from_rules(vec![FieldRule::new("registration")]).unwrap();
        let source = SourceSpec::Json {
            path: PathBuf::from("cars.json"),
        };

        assert!(ImportFactory::<Car>::new(source.clone(), partial).is_err());
        assert!(ImportFactory::<Car>::new(source, ConstraintSet::builtin(Domain::Car)).is_ok());
    }

    #[test]
    fn test_factory_creates_loader_for_source_format() {
        let factory = ImportFactory::<Liability>::new(
            SourceSpec::Xlsx {
                path: PathBuf::from("mots.xlsx"),
            },
            ConstraintSet::builtin(Domain::Liability),
        )
        .unwrap();

        assert_eq!(factory.create_data_loader().format_name(), "xlsx");
        assert_eq!(factory.source().format(), ImportFormat::Xlsx);
    }
}
