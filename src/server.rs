//! HTTP surface for story generation.

use crate::models::Language;
use crate::story::StoryService;
use crate::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde_json::json;
use std::future::Future;
use tokio::net::TcpListener;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    story: StoryService,
}

impl AppState {
    pub fn new(story: StoryService) -> Self {
        Self { story }
    }
}

/// Last `lang` value in the query string, `Eng` when absent.
///
/// Repeated parameters are accepted, the final one wins.
pub fn lang_param(params: &[(String, String)]) -> &str {
    params
        .iter()
        .rev()
        .find(|(key, _)| key == "lang")
        .map(|(_, value)| value.as_str())
        .unwrap_or(Language::ENGLISH_CODE)
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/create_novel", get(create_novel))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Serve the router on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// Generate an illustrated story segment.
///
/// Always answers 200; failures are reported as `{"error": "..."}`.
async fn create_novel(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> impl IntoResponse {
    let request_id = Uuid::new_v4();
    let lang = lang_param(&params);
    let language = Language::from_code(Some(lang));
    let span = info_span!("create_novel", %request_id, lang = %lang);

    let outcome = async {
        info!("Generating story segment ({})", language.code());
        let outcome = state.story.create_novel(language).await;
        info!("Story request finished (success: {})", outcome.is_success());
        outcome
    }
    .instrument(span)
    .await;

    (StatusCode::OK, Json(outcome))
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
