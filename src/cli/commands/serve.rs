//! HTTP API server.
//!
//! `GET /` reports that the service is up; `POST /generate_chapters` runs the
//! chapter pipeline for one video.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::KapittelError;
use crate::openai::OpenAIChatModel;
use crate::orchestrator::{ChapterRequest, Orchestrator};
use crate::transcript::YtDlpTranscriptSource;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info_span, Instrument};
use uuid::Uuid;

/// Shared application state.
pub struct AppState {
    pub orchestrator: Orchestrator,
}

/// Run the HTTP API server.
pub async fn run_serve(host: Option<&str>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    preflight::check(Operation::Serve, &settings)?;

    let model = Arc::new(OpenAIChatModel::from_settings(&settings.llm)?);
    let source = Arc::new(YtDlpTranscriptSource::new(&settings.transcript)?);
    let orchestrator = Orchestrator::new(&settings, source, model)?;

    let app = router(Arc::new(AppState { orchestrator }));

    let host = host.unwrap_or(&settings.server.host);
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Kapittel API Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Status", "GET  /");
    Output::kv("Generate chapters", "POST /generate_chapters");
    Output::kv("Model", &settings.llm.model);
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Build the API router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/generate_chapters", post(generate_chapters))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error,
        }),
    )
        .into_response()
}

/// Map a pipeline error to a status code and a message safe to show callers.
fn status_for(e: &KapittelError) -> (StatusCode, String) {
    match e {
        KapittelError::InvalidUrl(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        KapittelError::TranscriptNotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        KapittelError::Generation(_) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "An unexpected error occurred while generating chapters".to_string(),
        ),
    }
}

// === Handlers ===

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "YouTube Chapter Generator API is running. Use /generate_chapters endpoint to generate chapters."
    }))
}

async fn generate_chapters(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ChapterRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match payload {
        Ok(req) => req,
        Err(rejection) => return error_response(rejection.status(), rejection.body_text()),
    };

    let span = info_span!("generate_chapters", request_id = %Uuid::new_v4());
    match state.orchestrator.generate(&req).instrument(span).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => {
            let (status, message) = status_for(&e);
            if status.is_server_error() {
                error!(url = %req.url, "Request failed: {}", e);
            }
            error_response(status, message)
        }
    }
}
