//! HTTP server for gateway endpoints
//!
//! Provides /, /health, /tx/:id, /status/:id and /upload.

use crate::adapter::StorageAdapter;
use crate::error::{GatewayError, Result};
use crate::render::PageRenderer;
use crate::snapshot::SnapshotStore;
use crate::types::{ApiResponse, HealthResponse};
use crate::validation::{validate_mime, validate_size, MULTIPART_OVERHEAD};
use arweave_client::TransactionStatus;
use axum::{
    body::Body,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Shared state for the HTTP server
pub struct ServerState {
    pub adapter: StorageAdapter,
    pub snapshots: SnapshotStore,
    pub renderer: PageRenderer,
    pub max_upload_size: usize,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(
        adapter: StorageAdapter,
        snapshots: SnapshotStore,
        renderer: PageRenderer,
        max_upload_size: usize,
    ) -> Self {
        Self {
            adapter,
            snapshots,
            renderer,
            max_upload_size,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    let upload_limit = state.max_upload_size + MULTIPART_OVERHEAD;

    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/tx/{id}", get(get_tx))
        .route("/status/{id}", get(get_status))
        .route(
            "/upload",
            post(upload)
                .layer::<_, Infallible>(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(upload_limit)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let cache_stats = state.adapter.cache().stats().await;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds() as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        address: state.adapter.wallet_address().to_string(),
        cache: cache_stats,
    })
}

/// Status page from the last snapshot; refreshes snapshot and cache listing afterwards
async fn home(State(state): State<SharedState>) -> Response {
    let snapshot = state.snapshots.load().await;
    let listing = state.adapter.cache().listing().await;

    let page = page_or_error(
        &state.renderer,
        state.renderer.render_status(&snapshot, &listing),
    );

    let snapshot_state = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) = snapshot_state
            .snapshots
            .refresh(&snapshot_state.adapter)
            .await
        {
            warn!(error = %e, "Failed to refresh wallet snapshot");
        }
    });

    let index_state = Arc::clone(&state);
    tokio::spawn(async move {
        if let Err(e) = index_state.adapter.cache().refresh_index().await {
            warn!(error = %e, "Failed to refresh cache listing");
        }
    });

    page.into_response()
}

/// The rendered page, or the error page; either way served with 200
fn page_or_error(renderer: &PageRenderer, rendered: Result<String>) -> Html<String> {
    match rendered {
        Ok(html) => Html(html),
        Err(e) => {
            error!(error = %e, "Failed to render status page");
            Html(renderer.render_error())
        }
    }
}

/// Raw transaction data with a sniffed content type
async fn get_tx(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    match state.adapter.data(&id).await {
        Ok(fetched) => {
            let Some(kind) = infer::get(&fetched.data) else {
                warn!(tx_id = %id, size = fetched.data.len(), "Unrecognized content type");
                return StatusCode::NOT_FOUND.into_response();
            };
            let content_type = kind.mime_type();
            let cache_header = if fetched.from_cache { "HIT" } else { "MISS" };

            (
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::CACHE_CONTROL, IMMUTABLE_CACHE_CONTROL),
                    (header::HeaderName::from_static("x-cache"), cache_header),
                ],
                Body::from(fetched.data),
            )
                .into_response()
        }
        Err(e) => {
            warn!(tx_id = %id, error = %e, "Failed to fetch transaction data");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

/// Transaction status; always 200, the envelope carries the outcome
async fn get_status(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Json<ApiResponse<TransactionStatus>> {
    match state.adapter.status(&id).await {
        Ok(status) => Json(ApiResponse::ok(status)),
        Err(e) => {
            warn!(tx_id = %id, error = %e, "Failed to query transaction status");
            Json(ApiResponse::error(e.user_message()))
        }
    }
}

/// Accept one image file and post it to the network
async fn upload(State(state): State<SharedState>, mut multipart: Multipart) -> Response {
    let started = Instant::now();

    match receive_upload(&state, &mut multipart).await {
        Ok(tx_id) => {
            info!(
                tx_id = %tx_id,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Upload complete"
            );
            Json(ApiResponse::ok(tx_id)).into_response()
        }
        Err(UploadError::TooLarge) => StatusCode::PAYLOAD_TOO_LARGE.into_response(),
        Err(UploadError::Rejected(e)) => {
            warn!(error = %e, "Upload failed");
            Json(ApiResponse::<String>::error(e.user_message())).into_response()
        }
    }
}

enum UploadError {
    TooLarge,
    Rejected(GatewayError),
}

impl From<GatewayError> for UploadError {
    fn from(err: GatewayError) -> Self {
        UploadError::Rejected(err)
    }
}

impl From<axum::extract::multipart::MultipartError> for UploadError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            UploadError::TooLarge
        } else {
            UploadError::Rejected(GatewayError::Validation(format!(
                "Malformed upload: {}",
                err.body_text()
            )))
        }
    }
}

async fn receive_upload(
    state: &ServerState,
    multipart: &mut Multipart,
) -> std::result::Result<String, UploadError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        // Checked before the body is read so a rejected type never buffers
        let content_type = validate_mime(field.content_type())?.to_string();
        let data = field.bytes().await?;
        validate_size(data.len(), state.max_upload_size)?;

        let tx_id = post_upload(state, data.to_vec(), &content_type).await?;
        return Ok(tx_id);
    }

    Err(GatewayError::Validation("No file uploaded.".to_string()).into())
}

async fn post_upload(state: &ServerState, data: Vec<u8>, content_type: &str) -> Result<String> {
    info!(size = data.len(), content_type, "Posting upload to network");
    state.adapter.post(data, content_type).await
}
