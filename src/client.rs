use serde::de::DeserializeOwned;

use crate::client::config::Config;
use crate::client::consts::{ASK_PATH, CONFIG_PATH, TOKEN_PATH};
use crate::client::credential::SessionCredential;
use crate::client::error::GatewayError;
use crate::types;

pub(crate) mod config;
mod consts;
pub(crate) mod credential;
pub(crate) mod error;
mod utils;

/// Request/response client for the avatar backend.
///
/// Holds no session state; every call is a single HTTP round trip and any failure is
/// returned to the caller immediately.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    config: Config,
}

impl Client {
    pub fn new(config: Config) -> Result<Self, GatewayError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `GET /config`: avatar look and speech region.
    pub async fn get_config(&self) -> Result<types::ClientConfig, GatewayError> {
        let url = utils::endpoint(&self.config, CONFIG_PATH);
        tracing::debug!("fetching backend config from {}", url);
        let response = self.http.get(&url).send().await?;
        decode(CONFIG_PATH, response).await
    }

    /// `GET /avatar/token?region=`: relay credentials plus the speech authorization token.
    pub async fn get_relay_credential(
        &self,
        region: &str,
    ) -> Result<SessionCredential, GatewayError> {
        let url = utils::endpoint(&self.config, TOKEN_PATH);
        tracing::debug!("fetching relay token for region {}", region);
        let response = self
            .http
            .get(&url)
            .query(&[("region", region)])
            .send()
            .await?;
        let relay: types::RelayToken = decode(TOKEN_PATH, response).await?;
        if relay.authorization_token().is_none() {
            tracing::warn!("relay token response carries no authorization token");
        }
        SessionCredential::from_relay(relay, region)
            .ok_or_else(|| GatewayError::bad_response(TOKEN_PATH, "no relay URLs in response"))
    }

    /// `POST /ask`. A non-success status is returned as [`GatewayError::Backend`] with
    /// the body text untouched.
    pub async fn ask(&self, question: &str) -> Result<String, GatewayError> {
        let url = utils::endpoint(&self.config, ASK_PATH);
        let response = self
            .http
            .post(&url)
            .json(&types::AskRequest::new(question))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            tracing::error!("backend rejected question: {} {}", status, utils::snippet(&body));
            return Err(GatewayError::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        let answer = serde_json::from_str::<types::AskResponse>(&text)
            .map_err(|e| GatewayError::bad_response(ASK_PATH, e.to_string()))?;
        Ok(answer.into_answer())
    }
}

async fn decode<T: DeserializeOwned>(
    endpoint: &'static str,
    response: reqwest::Response,
) -> Result<T, GatewayError> {
    let status = response.status();
    let text = response.text().await?;
    if !status.is_success() {
        return Err(GatewayError::bad_response(
            endpoint,
            format!("status {}: {}", status, utils::snippet(&text)),
        ));
    }
    serde_json::from_str::<T>(&text).map_err(|e| {
        tracing::error!(
            "failed to decode {} response: {}, text=> {:?}",
            endpoint,
            e,
            utils::snippet(&text)
        );
        GatewayError::bad_response(endpoint, e.to_string())
    })
}

pub fn connect_with_config(config: Config) -> Result<Client, GatewayError> {
    Client::new(config)
}

/// Client for the backend named by `AVATAR_BACKEND_URL`, or the local default.
pub fn connect() -> Result<Client, GatewayError> {
    connect_with_config(Config::from_env())
}
