// HTTP server
// JSON API over the knowledge base, vector store, and responder. Errors
// come back as `{"error": "..."}` with a matching status code; the chat
// endpoint itself never fails, it degrades to the fallback router.


use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::config::Config;
use crate::database::{Database, VectorStore};
use crate::knowledge::KnowledgeBase;
use crate::openai::{ChatMessage, OpenAiClient};
use crate::responder::Responder;
use crate::{FolioError, Result};

/// Hard cap on per-request result limits, regardless of what the caller asks for.
const MAX_RESULT_LIMIT: usize = 50;

/// Shared handler state. Cheap to clone; everything heavy sits behind an Arc.
pub struct AppState {
    pub config: Config,
    pub database: Database,
    pub vector_store: Arc<VectorStore>,
    pub openai: OpenAiClient,
    pub knowledge: Arc<KnowledgeBase>,
    pub responder: Arc<Responder>,
}

/// API-level error with an HTTP status and a short message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    #[inline]
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    #[inline]
    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<FolioError> for ApiError {
    #[inline]
    fn from(error: FolioError) -> Self {
        let status = match &error {
            FolioError::Config(_) => StatusCode::BAD_REQUEST,
            FolioError::EmbeddingUnavailable(_)
            | FolioError::GenerationUnavailable(_)
            | FolioError::KnowledgeBaseLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("Request failed: {}", error);
        }
        Self {
            status,
            message: error.to_string(),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    #[inline]
    fn from(error: anyhow::Error) -> Self {
        error!("Request failed: {}", error);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    #[inline]
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Deserialize)]
struct SearchRequest {
    query: String,
    limit: Option<usize>,
    threshold: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ContextualRequest {
    query: String,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    history: Vec<ChatMessage>,
}

impl SearchRequest {
    /// Resolve defaults from config and reject out-of-range parameters.
    fn resolve(&self, config: &Config) -> ApiResult<(usize, f32)> {
        if self.query.trim().is_empty() {
            return Err(ApiError::bad_request("query must not be empty"));
        }

        let limit = self.limit.unwrap_or(config.search.default_limit);
        if limit > MAX_RESULT_LIMIT {
            return Err(ApiError::bad_request(format!(
                "limit must be at most {}",
                MAX_RESULT_LIMIT
            )));
        }

        let threshold = self.threshold.unwrap_or(config.search.similarity_threshold);
        if !(-1.0..=1.0).contains(&threshold) {
            return Err(ApiError::bad_request(
                "threshold must be between -1.0 and 1.0",
            ));
        }

        Ok((limit, threshold))
    }
}

/// Build the application router.
#[inline]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/projects", get(list_projects))
        .route("/projects/{slug}", get(get_project))
        .route("/skills", get(list_skills))
        .route("/experience", get(list_experience))
        .route("/projects/search", post(search_projects))
        .route("/knowledge/search", post(search_knowledge))
        .route("/knowledge/contextual-response", post(contextual_response))
        .route("/knowledge/refresh", post(refresh_knowledge))
        .route("/chat", post(chat))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
#[inline]
pub async fn serve(state: Arc<AppState>, host: &str, port: u16) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| FolioError::Config(format!("Invalid listen address: {}", e)))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .await
        .map_err(|e| FolioError::Other(anyhow::anyhow!("Server error: {}", e)))?;
    Ok(())
}

async fn health(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let counts = state.database.document_counts().await?;
    Ok(Json(json!({
        "status": "ok",
        "knowledge_loaded": state.knowledge.is_loaded().await,
        "indexed_documents": state.knowledge.entry_count().await,
        "stored_documents": counts.total(),
    })))
}

async fn list_projects(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let projects = state.database.list_projects().await?;
    Ok(Json(json!({ "projects": projects })))
}

async fn get_project(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Value>> {
    let project = state
        .database
        .get_project_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("No project with slug \"{}\"", slug)))?;
    Ok(Json(json!({ "project": project })))
}

async fn list_skills(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let skills = state.database.list_skills().await?;
    Ok(Json(json!({ "skills": skills })))
}

async fn list_experience(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let experience = state.database.list_experience().await?;
    Ok(Json(json!({ "experience": experience })))
}

async fn search_projects(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<Value>> {
    let (limit, threshold) = request.resolve(&state.config)?;

    let hits = state
        .vector_store
        .nearest_neighbors(
            &state.openai,
            &request.query,
            limit,
            threshold,
            Some("project"),
        )
        .await?;
    Ok(Json(json!({ "results": hits })))
}

async fn search_knowledge(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<Json<Value>> {
    let (limit, threshold) = request.resolve(&state.config)?;

    let hits = state.knowledge.search(&request.query, limit, threshold).await?;
    Ok(Json(json!({ "results": hits })))
}

async fn contextual_response(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ContextualRequest>,
) -> ApiResult<Json<Value>> {
    if request.query.trim().is_empty() {
        return Err(ApiError::bad_request("query must not be empty"));
    }

    let response = state.knowledge.contextual_response(&request.query).await?;
    Ok(Json(json!({ "response": response })))
}

async fn refresh_knowledge(State(state): State<Arc<AppState>>) -> ApiResult<Json<Value>> {
    let documents = state.knowledge.refresh().await?;
    Ok(Json(json!({ "indexed_documents": documents })))
}

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<Value>> {
    if request.message.trim().is_empty() {
        return Err(ApiError::bad_request("message must not be empty"));
    }

    let answer = state.responder.answer(&request.message, &request.history).await;
    Ok(Json(json!({
        "reply": answer.reply,
        "source": answer.source,
    })))
}
