use secrecy::SecretString;

use crate::types::RelayToken;

/// Short-lived credentials for one media session.
///
/// Built from the `/avatar/token` response; the three possible authorization token
/// fields have already been collapsed into [`SessionCredential::auth_token`].
#[derive(Clone)]
pub struct SessionCredential {
    ice_urls: Vec<String>,
    username: String,
    credential: SecretString,
    auth_token: Option<SecretString>,
    region: String,
}

impl SessionCredential {
    pub fn new(ice_urls: Vec<String>, username: &str, credential: &str, region: &str) -> Self {
        Self {
            ice_urls,
            username: username.to_string(),
            credential: SecretString::from(credential.to_string()),
            auth_token: None,
            region: region.to_string(),
        }
    }

    pub fn with_auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(SecretString::from(token.to_string()));
        self
    }

    pub(crate) fn from_relay(token: RelayToken, region: &str) -> Option<Self> {
        if token.urls().is_empty() {
            return None;
        }
        let mut credential = Self::new(
            token.urls().to_vec(),
            token.username().unwrap_or_default(),
            token.password().unwrap_or_default(),
            region,
        );
        if let Some(auth) = token.authorization_token() {
            credential = credential.with_auth_token(auth);
        }
        Some(credential)
    }

    pub fn ice_urls(&self) -> &[String] {
        &self.ice_urls
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn credential(&self) -> &SecretString {
        &self.credential
    }

    pub fn auth_token(&self) -> Option<&SecretString> {
        self.auth_token.as_ref()
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

impl std::fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionCredential")
            .field("ice_urls", &self.ice_urls)
            .field("username", &self.username)
            .field("has_auth_token", &self.auth_token.is_some())
            .field("region", &self.region)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_from_relay_normalizes_token() {
        let relay: RelayToken = serde_json::from_str(
            r#"{"Urls":["turn:a:3478","turn:b:3478"],"Username":"user","Password":"pw","Token":"t-1"}"#,
        )
        .unwrap();
        let credential = SessionCredential::from_relay(relay, "westus2").unwrap();
        assert_eq!(credential.ice_urls().len(), 2);
        assert_eq!(credential.username(), "user");
        assert_eq!(credential.credential().expose_secret(), "pw");
        assert_eq!(
            credential.auth_token().map(|t| t.expose_secret()),
            Some("t-1")
        );
        assert_eq!(credential.region(), "westus2");
    }

    #[test]
    fn test_from_relay_without_urls() {
        let relay: RelayToken = serde_json::from_str(r#"{"Username":"user"}"#).unwrap();
        assert!(SessionCredential::from_relay(relay, "westus2").is_none());
    }

    #[test]
    fn test_debug_hides_secrets() {
        let credential = SessionCredential::new(vec!["turn:a".into()], "u", "secret-pw", "r")
            .with_auth_token("secret-token");
        let printed = format!("{:?}", credential);
        assert!(!printed.contains("secret-pw"));
        assert!(!printed.contains("secret-token"));
    }
}
