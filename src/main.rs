use clap::Parser;
use resource_factory::config::cli::source_options;
use resource_factory::utils::error::ErrorSeverity;
use resource_factory::utils::{logger, validation::Validate};
use resource_factory::{app, import_entity, Cli, Command, ImportConfig, ImportError, SourceSpec};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ resource-factory failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        // 根據錯誤嚴重程度決定退出碼
        let exit_code = match e.severity() {
            ErrorSeverity::Medium => 2, // 來源問題，可修正後重試
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };

        std::process::exit(exit_code);
    }
}

fn load_config(cli: &Cli) -> Result<ImportConfig, ImportError> {
    let config = match cli.command.config_path() {
        Some(path) => ImportConfig::from_file(path)?,
        None => ImportConfig::default(),
    };
    Ok(config)
}

async fn run(cli: Cli) -> Result<(), ImportError> {
    match &cli.command {
        Command::Serve { bind, .. } => {
            let mut config = load_config(&cli)?;
            if let Some(bind) = bind {
                config.server.bind_address = bind.clone();
            }

            logger::init_server_logger(config.server.json_logs);
            tracing::info!("Starting resource-factory server");
            tracing::debug!("Server config: {:?}", config.server);

            app::start_server(config).await
        }
        Command::Import {
            entity,
            format,
            file,
            separator,
            query,
            keys,
            ..
        } => {
            logger::init_cli_logger(cli.verbose);

            let config = load_config(&cli)?;
            config.validate()?;

            let options = source_options(separator, query, keys);
            let source = SourceSpec::build(*format, file, &options, config.csv_separator())?;
            let constraints = config.constraints_for(entity.domain())?;
            let entity = *entity;

            let outcome = tokio::task::spawn_blocking(move || {
                import_entity(entity, source, constraints)
            })
            .await
            .map_err(|e| ImportError::IoError(std::io::Error::other(e.to_string())))??;

            tracing::info!(
                "✅ {} records ready under '{}'",
                outcome.records.len(),
                entity.response_key()
            );
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
    }
}
