//! Local joke generator web UI.
//!
//! Serves a single page on `JOKEBOT_WEB_ADDR` (default `127.0.0.1:8501`).
//! The page POSTs `{ "topic": ... }` to `/api/joke` and renders the joke the
//! model returns. No chat platform is involved.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use jokebot::config::{self, LlmConfig, TracingConfig};
use jokebot::dispatcher::generate_joke;
use jokebot::langsmith::{RunTracer, TracedCompletion};
use jokebot::llm::{Completion, LlmClient};
use jokebot::mention::GenerationRequest;

// Embedded at compile time; no runtime file needed.
const INDEX_HTML: &str = include_str!("../../web/index.html");

// ── Shared state ───────────────────────────────────────────────────────────────

#[derive(Clone)]
struct AppState {
    completion: Arc<dyn Completion>,
}

// ── Request / response types ───────────────────────────────────────────────────

#[derive(Deserialize)]
struct JokeRequest {
    #[serde(default)]
    topic: String,
}

#[derive(Serialize)]
struct JokeResponse {
    topic: String,
    joke: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

// ── Handlers ───────────────────────────────────────────────────────────────────

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn create_joke(
    State(state): State<AppState>,
    Json(req): Json<JokeRequest>,
) -> Result<Json<JokeResponse>, ApiError> {
    let request = GenerationRequest::new(&req.topic)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Please enter a topic."))?;

    info!("Web UI: generating a joke about '{}'", request.topic());

    match generate_joke(state.completion.as_ref(), &request).await {
        Ok(joke) => Ok(Json(JokeResponse {
            topic: request.topic().to_string(),
            joke,
        })),
        Err(e) => {
            error!("Joke generation failed: {:#}", e);
            Err(api_error(StatusCode::BAD_GATEWAY, format!("Error: {:#}", e)))
        }
    }
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/joke", post(create_joke))
        .with_state(state)
}

// ── Entry point ────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,jokebot=debug,jokebot_web=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    config::load_dotenv();

    let llm_config = LlmConfig::from_env().context("Failed to load model configuration")?;
    let addr = config::web_addr_from_env()?;

    info!("  Provider: {}", llm_config.provider);
    info!("  Model: {}", llm_config.model);

    let model = llm_config.model.clone();
    let tracer = RunTracer::new(TracingConfig::from_env());
    let completion = TracedCompletion::new(LlmClient::new(llm_config), model, tracer);

    let app = router(AppState {
        completion: Arc::new(completion),
    });

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Joke generator UI running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Server error")?;

    Ok(())
}

// ── Tests ──────────────────────────────────────────────────────────────────────
