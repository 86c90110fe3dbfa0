use avatar_chat::GatewayError;

use crate::sdk::{CancellationDetails, ResultReason, SynthesisResult};

/// Everything a session operation can fail with.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport failure reaching the backend.
    #[error("{0}")]
    Network(String),
    /// Non-success status from the backend; the message is the response body.
    #[error("{0}")]
    Backend(String),
    #[error("{0}")]
    BadResponse(String),
    /// A rejected or non-completed SDK call.
    #[error("{message}")]
    Sdk {
        message: String,
        reason: Option<ResultReason>,
        cancellation: Option<CancellationDetails>,
    },
    #[error(transparent)]
    State(#[from] StateError),
}

/// An operation attempted without the state it needs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    #[error("no active avatar session, start a session first")]
    NoSession,
    #[error("avatar session already started")]
    AlreadyStarted,
    #[error("no speech authorization token, start a session first")]
    MissingAuthToken,
    #[error("session was stopped while starting")]
    StoppedWhileStarting,
}

impl SessionError {
    pub fn sdk(err: anyhow::Error) -> Self {
        Self::Sdk {
            message: err.to_string(),
            reason: None,
            cancellation: None,
        }
    }

    /// Error for a synthesis result that did not complete.
    pub fn from_result(result: &SynthesisResult) -> Self {
        let message = match &result.cancellation {
            Some(details) => format!("{}: {}", result.reason, details.error_details),
            None => result.reason.to_string(),
        };
        Self::Sdk {
            message,
            reason: Some(result.reason.clone()),
            cancellation: result.cancellation.clone(),
        }
    }
}

impl From<GatewayError> for SessionError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Network(_) => SessionError::Network(err.to_string()),
            GatewayError::BadResponse { .. } => SessionError::BadResponse(err.to_string()),
            GatewayError::Backend { body, .. } => SessionError::Backend(body),
        }
    }
}
