use avatar_chat_types::ErrorDetail;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors surfaced to HTTP callers as `{"detail": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing Azure Speech key.")]
    MissingSpeechKey,
    #[error("Missing Azure Speech region.")]
    MissingSpeechRegion,
    #[error("Missing Azure OpenAI environment variables. See README.")]
    MissingOpenAi,
    #[error("Failed to get avatar token: {0}")]
    AvatarToken(anyhow::Error),
    #[error("OpenAI request failed: {0}")]
    OpenAi(anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("{}", self);
        let detail = ErrorDetail::new(&self.to_string());
        (self.status(), Json(detail)).into_response()
    }
}
