use std::sync::Arc;

use avatar_chat_types::{AskRequest, AskResponse, AvatarSettings, ClientConfig, SpeechSettings};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};

use crate::azure::{Upstream, extract_answer};
use crate::config::Config;
use crate::error::ApiError;

#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    upstream: Arc<dyn Upstream>,
}

impl AppState {
    pub fn new(config: Config, upstream: Arc<dyn Upstream>) -> Self {
        Self {
            config: Arc::new(config),
            upstream,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/config", get(client_config))
        .route("/avatar/token", get(avatar_token))
        .route("/ask", post(ask))
        .layer(cors)
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn client_config(State(state): State<AppState>) -> Json<ClientConfig> {
    let speech = &state.config.speech;

    let mut avatar = AvatarSettings::default();
    if let Some(character) = &speech.avatar_character {
        avatar = avatar.with_character(character);
    }
    if let Some(style) = &speech.avatar_style {
        avatar = avatar.with_style(style);
    }
    if let Some(voice) = &speech.voice {
        avatar = avatar.with_voice(voice);
    }

    Json(ClientConfig::new(
        SpeechSettings::new(speech.region.clone(), speech.key.is_some()),
        avatar,
    ))
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    region: Option<String>,
}

/// Relay token for the avatar's WebRTC connection, plus a speech authorization token
/// under `authToken` when one could be issued.
async fn avatar_token(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> Result<Json<Value>, ApiError> {
    let speech = &state.config.speech;
    let key = speech.key.as_ref().ok_or(ApiError::MissingSpeechKey)?;
    let region = query
        .region
        .filter(|r| !r.is_empty())
        .or_else(|| speech.region.clone())
        .ok_or(ApiError::MissingSpeechRegion)?;

    let mut data = state
        .upstream
        .relay_token(&region, key)
        .await
        .map_err(ApiError::AvatarToken)?;

    match state.upstream.issue_token(&region, key).await {
        Ok(token) => match data.as_object_mut() {
            Some(fields) => {
                fields.insert("authToken".to_string(), Value::String(token));
            }
            None => tracing::warn!("relay token response is not an object, dropping authToken"),
        },
        Err(e) => tracing::warn!("failed to issue speech authorization token: {}", e),
    }

    Ok(Json(data))
}

async fn ask(
    State(state): State<AppState>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    let deployment = state.config.openai.as_ref().ok_or(ApiError::MissingOpenAi)?;
    tracing::debug!("question: {}", req.question());

    let body = state
        .upstream
        .chat_completion(deployment, req.question())
        .await
        .map_err(ApiError::OpenAi)?;

    let answer = extract_answer(&body);
    tracing::info!("answered with {} chars", answer.chars().count());
    Ok(Json(AskResponse::new(&answer)))
}
