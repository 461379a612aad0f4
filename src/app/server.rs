use axum::{extract::DefaultBodyLimit, routing::post, Router};
use tokio::net::TcpListener;
use tokio::signal::{self, ctrl_c};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::app::routes::{load_cars_data, load_insurances_data, load_mots_data};
use crate::app::state::AppState;
use crate::config::ImportConfig;
use crate::domain::model::Entity;
use crate::utils::error::Result;
use crate::utils::validation::Validate;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config().server.max_upload_bytes;

    Router::new()
        .route(&route(Entity::Cars), post(load_cars_data))
        .route(&route(Entity::Insurances), post(load_insurances_data))
        .route(&route(Entity::Mots), post(load_mots_data))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn route(entity: Entity) -> String {
    format!("/{}/{{format}}", entity.route_prefix())
}

pub async fn start_server(config: ImportConfig) -> Result<()> {
    config.validate()?;

    let upload_dir = config.upload_dir();
    tokio::fs::create_dir_all(&upload_dir).await?;
    info!("Uploads are staged in {}", upload_dir.display());

    let address = config.server.bind_address.clone();
    let state = AppState::new(config)?;

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address).await?;
    info!("🚀 Server running on {address}");

    serve(listener, state).await?;

    info!("Server shut down");
    Ok(())
}

/// 在既有 listener 上提供服務直到收到終止訊號
pub async fn serve(listener: TcpListener, state: AppState) -> Result<()> {
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                warn!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
