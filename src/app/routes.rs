use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    Json,
};

use crate::app::state::AppState;
use crate::app::upload::UploadedFile;
use crate::core::factory::{ImportFormat, SourceOptions, SourceSpec};
use crate::core::import::{import_entity, ImportOutcome};
use crate::domain::model::Entity;
use crate::utils::error::{ImportError, Result};

pub async fn load_cars_data(
    State(state): State<AppState>,
    Path(format): Path<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ImportOutcome>> {
    handle_upload(Entity::Cars, state, &format, multipart).await
}

pub async fn load_insurances_data(
    State(state): State<AppState>,
    Path(format): Path<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ImportOutcome>> {
    handle_upload(Entity::Insurances, state, &format, multipart).await
}

pub async fn load_mots_data(
    State(state): State<AppState>,
    Path(format): Path<String>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ImportOutcome>> {
    handle_upload(Entity::Mots, state, &format, multipart).await
}

/// multipart 表單內容：檔案本體加上格式選項
struct UploadForm {
    file: Bytes,
    options: SourceOptions,
}

async fn read_form(
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<UploadForm> {
    let mut multipart = multipart.map_err(|e| ImportError::UploadError {
        message: e.body_text(),
    })?;

    let mut file = None;
    let mut options = SourceOptions::default();

    while let Some(field) = multipart.next_field().await.map_err(upload_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => file = Some(field.bytes().await.map_err(upload_error)?),
            "separator" => options.separator = Some(field.text().await.map_err(upload_error)?),
            "query" => options.query = Some(field.text().await.map_err(upload_error)?),
            "keys" => {
                let raw = field.text().await.map_err(upload_error)?;
                options.keys = SourceOptions::parse_keys(&raw);
            }
            other => tracing::debug!("Ignoring multipart field '{}'", other),
        }
    }

    let file = file.ok_or_else(|| ImportError::UploadError {
        message: "missing multipart field 'file'".to_string(),
    })?;

    Ok(UploadForm { file, options })
}

async fn handle_upload(
    entity: Entity,
    state: AppState,
    format: &str,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<ImportOutcome>> {
    let format: ImportFormat = format.parse()?;
    let form = read_form(multipart).await?;
    tracing::info!(
        "📨 Received {} byte {} upload for {}",
        form.file.len(),
        format,
        entity.route_prefix()
    );

    let upload_dir = state.config().upload_dir();
    let default_separator = state.config().csv_separator().to_string();
    let constraints = state.constraints(entity.domain());

    let outcome = tokio::task::spawn_blocking(move || {
        let upload = UploadedFile::persist_in(&upload_dir, format, &form.file)?;
        let source = SourceSpec::build(format, upload.path(), &form.options, &default_separator)?;
        import_entity(entity, source, constraints)
    })
    .await
    .map_err(|e| ImportError::IoError(std::io::Error::other(e.to_string())))??;

    Ok(Json(outcome))
}

fn upload_error(e: MultipartError) -> ImportError {
    ImportError::UploadError {
        message: e.body_text(),
    }
}
