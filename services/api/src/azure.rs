//! Calls out to the Azure speech and OpenAI services.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};

use crate::config::OpenAiDeployment;

const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";
const OPENAI_API_VERSION: &str = "2025-01-01-preview";
const SPEECH_TIMEOUT: Duration = Duration::from_secs(10);
const CHAT_TIMEOUT: Duration = Duration::from_secs(30);

pub const SYSTEM_PROMPT: &str = "你是一个微软认证培训师。你只能使用不超过100个字来回复学员的信息。";
pub const NO_ANSWER: &str = "(no answer returned from OpenAI)";

/// The upstream services the HTTP handlers depend on.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Fetches the avatar relay token (ICE URLs and TURN credentials) for `region`.
    async fn relay_token(&self, region: &str, key: &SecretString) -> Result<Value>;

    /// Issues a short-lived speech authorization token.
    async fn issue_token(&self, region: &str, key: &SecretString) -> Result<String>;

    /// Runs one chat completion and returns the raw response body.
    async fn chat_completion(&self, deployment: &OpenAiDeployment, question: &str)
    -> Result<Value>;
}

pub struct AzureClient {
    client: Client,
}

impl AzureClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Upstream for AzureClient {
    async fn relay_token(&self, region: &str, key: &SecretString) -> Result<Value> {
        let url = format!(
            "https://{region}.tts.speech.microsoft.com/cognitiveservices/avatar/relay/token/v1"
        );
        let body = self
            .client
            .get(url)
            .header(SUBSCRIPTION_KEY_HEADER, key.expose_secret())
            .timeout(SPEECH_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(body)
    }

    async fn issue_token(&self, region: &str, key: &SecretString) -> Result<String> {
        let url = format!("https://{region}.api.cognitive.microsoft.com/sts/v1.0/issueToken");
        let token = self
            .client
            .post(url)
            .header(SUBSCRIPTION_KEY_HEADER, key.expose_secret())
            .timeout(SPEECH_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(token)
    }

    async fn chat_completion(
        &self,
        deployment: &OpenAiDeployment,
        question: &str,
    ) -> Result<Value> {
        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            deployment.endpoint, deployment.deployment, OPENAI_API_VERSION
        );
        let body = json!({
            "messages": [
                {
                    "role": "system",
                    "content": [{ "type": "text", "text": SYSTEM_PROMPT }]
                },
                {
                    "role": "user",
                    "content": question
                }
            ]
        });

        let resp = self
            .client
            .post(url)
            .header("api-key", deployment.key.expose_secret())
            .timeout(CHAT_TIMEOUT)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(resp)
    }
}

/// Pulls the answer text out of a chat completion body.
///
/// Looks at `choices[0].message.content`, then a top-level `answer`, then `content`.
/// Empty strings are skipped.
pub fn extract_answer(body: &Value) -> String {
    let from_choice = body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"));

    [from_choice, body.get("answer"), body.get("content")]
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .find(|s| !s.is_empty())
        .unwrap_or(NO_ANSWER)
        .to_string()
}
