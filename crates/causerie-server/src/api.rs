use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::Method;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::ServerError;
use crate::state::AppState;
use crate::ws;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/ws", get(ws::ws_upgrade))
        .route("/upload", post(upload_media))
        .nest_service("/uploads", ServeDir::new(&state.config.uploads_dir))
        .fallback_service(ServeDir::new(&state.config.public_dir))
        .layer(DefaultBodyLimit::max(state.config.max_upload_size))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct UploadResponse {
    url: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /upload -- accept a `mediaFile` multipart field, write it to the
/// uploads directory and hand back the URL the chat client puts into a
/// message's `media` field.
async fn upload_media(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ServerError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        if field.name() == Some("mediaFile") {
            let original_name = field.file_name().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| ServerError::BadRequest(format!("Failed to read field: {}", e)))?;

            let file_name = state
                .uploads
                .store_media(&data, original_name.as_deref())
                .await?;

            info!(file = %file_name, size = data.len(), "Media uploaded via API");

            return Ok(Json(UploadResponse {
                url: format!("/uploads/{}", file_name),
            }));
        }
    }

    Err(ServerError::BadRequest(
        "Missing 'mediaFile' field in multipart form".to_string(),
    ))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
