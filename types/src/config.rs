/// Body of `GET /config`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ClientConfig {
    #[serde(rename = "azureSpeech")]
    azure_speech: SpeechSettings,
    avatar: AvatarSettings,
}

impl ClientConfig {
    pub fn new(azure_speech: SpeechSettings, avatar: AvatarSettings) -> Self {
        Self {
            azure_speech,
            avatar,
        }
    }

    pub fn speech(&self) -> &SpeechSettings {
        &self.azure_speech
    }

    pub fn avatar(&self) -> &AvatarSettings {
        &self.avatar
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SpeechSettings {
    /// Speech service region, e.g. "westus2". The backend may not have one configured.
    region: Option<String>,
    /// Whether the backend holds a speech subscription key.
    #[serde(rename = "hasKey", default)]
    has_key: bool,
}

impl SpeechSettings {
    pub fn new(region: Option<String>, has_key: bool) -> Self {
        Self { region, has_key }
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn has_key(&self) -> bool {
        self.has_key
    }
}

/// The avatar look. Immutable for the lifetime of a session.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AvatarSettings {
    character: Option<String>,
    style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    voice: Option<String>,
}

impl AvatarSettings {
    pub fn new(character: &str, style: &str) -> Self {
        Self {
            character: Some(character.to_string()),
            style: Some(style.to_string()),
            voice: None,
        }
    }

    pub fn with_character(mut self, character: &str) -> Self {
        self.character = Some(character.to_string());
        self
    }

    pub fn with_style(mut self, style: &str) -> Self {
        self.style = Some(style.to_string());
        self
    }

    pub fn with_voice(mut self, voice: &str) -> Self {
        self.voice = Some(voice.to_string());
        self
    }

    pub fn character(&self) -> Option<&str> {
        self.character.as_deref()
    }

    pub fn style(&self) -> Option<&str> {
        self.style.as_deref()
    }

    pub fn voice(&self) -> Option<&str> {
        self.voice.as_deref()
    }
}
