use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{self, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::pipeline::{crisis, input, CaseType, Language, ModeDecision, Pipeline, PipelineOutcome};
use crate::provider::{self, LlmProvider};
use crate::types::{FinishReason, Message, Role};

/// Shared application state for the HTTP API.
pub struct AppState {
    pub config: Config,
    pub pipeline: Pipeline,
    pub provider: Option<Arc<dyn LlmProvider>>,
}

impl AppState {
    /// Create AppState with the provider auto-configured from config.
    pub fn with_provider(config: Config) -> Self {
        let provider = provider::create_provider(&config.provider).map(Arc::from);
        Self::new(config, provider)
    }

    /// Validate config before building state for a server.
    pub fn from_config(config: Config) -> crate::error::Result<Self> {
        config.validate()?;
        Ok(Self::with_provider(config))
    }

    pub fn new(config: Config, provider: Option<Arc<dyn LlmProvider>>) -> Self {
        let pipeline = Pipeline::from_config(&config);
        Self {
            config,
            pipeline,
            provider,
        }
    }
}

/// Options shared by the chat and vent bodies, read leniently: a non-string
/// `language` is no hint and a non-boolean `isPremium` is the free tier.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub language: Option<String>,
    pub is_premium: bool,
}

impl RequestOptions {
    pub fn from_body(body: &Value) -> Self {
        Self {
            language: body.get("language").and_then(Value::as_str).map(str::to_string),
            is_premium: body.get("isPremium").and_then(Value::as_bool).unwrap_or(false),
        }
    }
}

/// Response body for a generated reply.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyResponse {
    pub crisis: bool,
    pub reply: String,
    pub language: Language,
    pub case_type: CaseType,
    pub max_tokens: u32,
    /// The provider stopped at the token ceiling.
    pub truncated: bool,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Create the axum Router with all API routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/chat", post(handle_chat))
        .route("/api/v1/vent", post(handle_vent))
        .route("/api/v1/crisis/check", post(handle_crisis_check))
        .route("/health", get(handle_health))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([http::Method::GET, http::Method::POST, http::Method::OPTIONS])
                .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION]),
        )
        .with_state(state)
}

/// Identify the caller for rate limiting: first `X-Forwarded-For` hop,
/// then `X-Real-IP`, else a shared anonymous bucket.
///
/// Both headers are client-controlled unless a reverse proxy overwrites them,
/// so the server must run behind one that does.
pub fn caller_key(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    forwarded
        .or(real_ip)
        .unwrap_or("anonymous")
        .to_string()
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (status, Json(ErrorResponse { error: error.into() })).into_response()
}

fn rate_limited_response() -> Response {
    error_response(
        StatusCode::TOO_MANY_REQUESTS,
        "Too many requests. Please try again later.",
    )
}

/// Unwrap a JSON body. A body that is not JSON still counts against the
/// caller's rate limit before it is rejected.
fn json_body(state: &AppState, key: &str, payload: Result<Json<Value>, JsonRejection>) -> Result<Value, Response> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            if state.pipeline.limiter().should_limit(key) {
                return Err(rate_limited_response());
            }
            Err(error_response(StatusCode::BAD_REQUEST, rejection.body_text()))
        }
    }
}

/// POST /api/v1/chat: conversation with history
async fn handle_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let key = caller_key(&headers);
    let body = match json_body(&state, &key, payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let options = RequestOptions::from_body(&body);
    let messages = body.get("messages");
    let outcome = state.pipeline.process_conversation(
        &key,
        messages,
        options.language.as_deref(),
        options.is_premium,
    );

    let decision = match resolve_outcome(outcome, "messages") {
        Ok(decision) => decision,
        Err(response) => return response,
    };

    let history = match input::parse_conversation(messages) {
        Ok(history) => history,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("messages {e}")),
    };

    reply_with(&state, decision, history).await
}

/// POST /api/v1/vent: single free-form text
async fn handle_vent(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let key = caller_key(&headers);
    let body = match json_body(&state, &key, payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let options = RequestOptions::from_body(&body);
    let text = body.get("text");
    let outcome = state.pipeline.process_text(
        &key,
        text,
        options.language.as_deref(),
        options.is_premium,
    );

    let decision = match resolve_outcome(outcome, "text") {
        Ok(decision) => decision,
        Err(response) => return response,
    };

    let text = match input::validate_value(text).into_result() {
        Ok(text) => text,
        Err(e) => return error_response(StatusCode::BAD_REQUEST, format!("text {e}")),
    };
    reply_with(&state, decision, vec![Message::user(text)]).await
}

/// POST /api/v1/crisis/check: screen text without generating a reply
async fn handle_crisis_check(payload: Result<Json<Value>, JsonRejection>) -> Response {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };
    match crisis::handle_check(body.get("text")) {
        crisis::CrisisCheck::Crisis(payload) => Json(payload).into_response(),
        crisis::CrisisCheck::NoCrisis => Json(serde_json::json!({ "crisis": false })).into_response(),
    }
}

/// GET /health
async fn handle_health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION.to_string(),
    })
}

/// Translate a non-proceeding outcome into its HTTP response.
fn resolve_outcome(outcome: PipelineOutcome, field: &str) -> Result<ModeDecision, Response> {
    match outcome {
        PipelineOutcome::Proceed(decision) => Ok(decision),
        PipelineOutcome::RateLimited => Err(rate_limited_response()),
        PipelineOutcome::Invalid(e) => Err(error_response(StatusCode::BAD_REQUEST, format!("{field} {e}"))),
        PipelineOutcome::Crisis(payload) => Err(Json(payload).into_response()),
    }
}

/// Call the provider with the instruction bundle and the caller's messages.
async fn reply_with(state: &AppState, decision: ModeDecision, history: Vec<Message>) -> Response {
    let Some(provider) = state.provider.as_ref() else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "AI provider not configured. Set OPENAI_API_KEY.",
        );
    };

    // Callers may not inject their own system prompts.
    let mut messages = vec![Message::system(decision.instruction_text.clone())];
    messages.extend(history.into_iter().filter(|m| m.role != Role::System));

    info!(
        "Provider call: language={}, case={}, max_tokens={}",
        decision.language, decision.case_type, decision.max_tokens
    );

    match provider
        .chat(
            &messages,
            &state.config.provider.model,
            decision.max_tokens,
            state.config.provider.temperature,
        )
        .await
    {
        Ok(completion) => {
            info!(
                "Provider reply: finish={:?}, prompt_tokens={}, completion_tokens={}",
                completion.finish_reason, completion.usage.prompt_tokens, completion.usage.completion_tokens
            );
            Json(ReplyResponse {
                crisis: false,
                truncated: completion.finish_reason == FinishReason::Length,
                reply: completion.content.unwrap_or_default(),
                language: decision.language,
                case_type: decision.case_type,
                max_tokens: decision.max_tokens,
            })
            .into_response()
        }
        Err(e) => {
            warn!("Provider error: {}", e);
            error_response(StatusCode::BAD_GATEWAY, format!("AI provider error: {e}"))
        }
    }
}

/// Start the HTTP server on the given address.
pub async fn serve(addr: &str, state: Arc<AppState>) -> anyhow::Result<()> {
    let limiter = state.pipeline.limiter().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(limiter.window());
        loop {
            interval.tick().await;
            let removed = limiter.prune_expired();
            if removed > 0 {
                tracing::debug!("Pruned {} expired rate-limit entries", removed);
            }
        }
    });

    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, router).await?;
    Ok(())
}
