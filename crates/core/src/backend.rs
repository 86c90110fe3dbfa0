use async_trait::async_trait;
use avatar_chat::types::ClientConfig;
use avatar_chat::{GatewayError, SessionCredential};
#[cfg(test)]
use mockall::automock;

/// The request/response calls the orchestrator makes to the backend.
///
/// Implemented by [`avatar_chat::Client`]; mocked in tests.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get_config(&self) -> Result<ClientConfig, GatewayError>;

    async fn get_relay_credential(&self, region: &str)
    -> Result<SessionCredential, GatewayError>;

    async fn ask(&self, question: &str) -> Result<String, GatewayError>;
}

#[async_trait]
impl Backend for avatar_chat::Client {
    async fn get_config(&self) -> Result<ClientConfig, GatewayError> {
        avatar_chat::Client::get_config(self).await
    }

    async fn get_relay_credential(
        &self,
        region: &str,
    ) -> Result<SessionCredential, GatewayError> {
        avatar_chat::Client::get_relay_credential(self, region).await
    }

    async fn ask(&self, question: &str) -> Result<String, GatewayError> {
        avatar_chat::Client::ask(self, question).await
    }
}
