/// Body of `GET /avatar/token`.
///
/// The relay half (`Urls`, `Username`, `Password`) comes straight from the speech
/// service. The authorization token has been seen under three different names
/// depending on how the backend issued it; use [`RelayToken::authorization_token`]
/// rather than reading the raw fields.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct RelayToken {
    #[serde(rename = "Urls", default)]
    urls: Vec<String>,
    #[serde(rename = "Username", default)]
    username: Option<String>,
    #[serde(rename = "Password", default)]
    password: Option<String>,
    #[serde(rename = "authToken", default, skip_serializing_if = "Option::is_none")]
    auth_token: Option<String>,
    #[serde(rename = "AuthorizationToken", default, skip_serializing_if = "Option::is_none")]
    authorization_token: Option<String>,
    #[serde(rename = "Token", default, skip_serializing_if = "Option::is_none")]
    token: Option<String>,
}

impl RelayToken {
    pub fn new(urls: Vec<String>, username: &str, password: &str) -> Self {
        Self {
            urls,
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            ..Default::default()
        }
    }

    pub fn with_auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    /// The speech authorization token, checked in the order `authToken`,
    /// `AuthorizationToken`, `Token`. Empty strings are treated as absent.
    pub fn authorization_token(&self) -> Option<&str> {
        [&self.auth_token, &self.authorization_token, &self.token]
            .into_iter()
            .filter_map(|t| t.as_deref())
            .find(|t| !t.is_empty())
    }
}
