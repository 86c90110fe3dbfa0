/// Failures talking to the backend. Nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("bad response from {endpoint}: {reason}")]
    BadResponse {
        endpoint: &'static str,
        reason: String,
    },
    /// Non-success status. The body is shown to the user as-is.
    #[error("{body}")]
    Backend { status: u16, body: String },
}

impl GatewayError {
    pub(crate) fn bad_response(endpoint: &'static str, reason: impl Into<String>) -> Self {
        Self::BadResponse {
            endpoint,
            reason: reason.into(),
        }
    }
}
