use crate::core::factory::{ImportFormat, SourceOptions};
use crate::domain::model::Entity;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "resource-factory")]
#[command(about = "Import car and liability records from csv, txt, json, jsonl, xlsx or sqlite sources")]
pub struct Cli {
    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// 啟動 HTTP 上傳服務
    Serve {
        #[arg(long, help = "Path to the TOML configuration file")]
        config: Option<PathBuf>,

        #[arg(long, help = "Override server.bind_address")]
        bind: Option<String>,
    },

    /// 匯入單一檔案並將結果以 JSON 輸出到 stdout
    Import {
        #[arg(long, value_parser = parse_entity)]
        entity: Entity,

        #[arg(long, value_parser = parse_format)]
        format: ImportFormat,

        #[arg(long)]
        file: PathBuf,

        #[arg(long, help = "Field separator for csv and txt")]
        separator: Option<String>,

        #[arg(long, help = "SQL query for sqlite sources")]
        query: Option<String>,

        #[arg(long, value_delimiter = ',', help = "Column names for sqlite rows")]
        keys: Vec<String>,

        #[arg(long, help = "Path to the TOML configuration file")]
        config: Option<PathBuf>,
    },
}

impl Command {
    pub fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Command::Serve { config, .. } | Command::Import { config, .. } => config.as_ref(),
        }
    }
}

/// 將 import 子命令的格式參數轉為 `SourceOptions`
pub fn source_options(separator: &Option<String>, query: &Option<String>, keys: &[String]) -> SourceOptions {
    SourceOptions {
        separator: separator.clone(),
        query: query.clone(),
        keys: keys
            .iter()
            .flat_map(|key| SourceOptions::parse_keys(key))
            .collect(),
    }
}

fn parse_entity(raw: &str) -> std::result::Result<Entity, String> {
    raw.parse::<Entity>().map_err(|e| e.to_string())
}

fn parse_format(raw: &str) -> std::result::Result<ImportFormat, String> {
    raw.parse::<ImportFormat>().map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_import_command() {
        let cli = Cli::try_parse_from([
            "resource-factory",
            "import",
            "--entity",
            "mots",
            "--format",
            "sqlite",
            "--file",
            "mots.db",
            "--query",
            "SELECT * FROM mots",
            "--keys",
            "legal_identifier,start_date",
            "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Command::Import {
                entity,
                format,
                query,
                keys,
                ..
            } => {
                assert_eq!(entity, Entity::Mots);
                assert_eq!(format, ImportFormat::Sqlite);
                let options = source_options(&None, &query, &keys);
                assert_eq!(options.keys, vec!["legal_identifier", "start_date"]);
                assert_eq!(options.query.as_deref(), Some("SELECT * FROM mots"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_serve_command() {
        let cli =
            Cli::try_parse_from(["resource-factory", "serve", "--bind", "127.0.0.1:9000"]).unwrap();

        assert!(!cli.verbose);
        assert!(cli.command.config_path().is_none());
        assert!(matches!(
            cli.command,
            Command::Serve { bind: Some(ref addr), .. } if addr == "127.0.0.1:9000"
        ));
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let result = Cli::try_parse_from([
            "resource-factory",
            "import",
            "--entity",
            "cars",
            "--format",
            "parquet",
            "--file",
            "cars.parquet",
        ]);
        assert!(result.is_err());
    }
}
