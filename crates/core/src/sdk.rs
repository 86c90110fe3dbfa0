use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use avatar_chat::types::AvatarSettings;
use secrecy::SecretString;
use tokio::sync::mpsc;

/// Outcome reasons reported by the speech SDK for synthesis and recognition results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultReason {
    SynthesizingAudioCompleted,
    RecognizingSpeech,
    RecognizedSpeech,
    NoMatch,
    Canceled,
    Other(String),
}

impl fmt::Display for ResultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultReason::SynthesizingAudioCompleted => write!(f, "SynthesizingAudioCompleted"),
            ResultReason::RecognizingSpeech => write!(f, "RecognizingSpeech"),
            ResultReason::RecognizedSpeech => write!(f, "RecognizedSpeech"),
            ResultReason::NoMatch => write!(f, "NoMatch"),
            ResultReason::Canceled => write!(f, "Canceled"),
            ResultReason::Other(reason) => write!(f, "{}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CancellationDetails {
    pub reason: String,
    pub error_details: String,
}

/// Result of `start_avatar` and `speak_text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisResult {
    pub reason: ResultReason,
    pub cancellation: Option<CancellationDetails>,
}

impl SynthesisResult {
    pub fn completed() -> Self {
        Self {
            reason: ResultReason::SynthesizingAudioCompleted,
            cancellation: None,
        }
    }

    pub fn canceled(reason: &str, error_details: &str) -> Self {
        Self {
            reason: ResultReason::Canceled,
            cancellation: Some(CancellationDetails {
                reason: reason.to_string(),
                error_details: error_details.to_string(),
            }),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.reason == ResultReason::SynthesizingAudioCompleted
    }
}

/// Speech configuration built from a short-lived authorization token.
///
/// Only token-based construction exists; the client never holds a subscription key.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    auth_token: SecretString,
    region: String,
    recognition_language: Option<String>,
}

impl SpeechConfig {
    pub fn from_authorization_token(auth_token: &SecretString, region: &str) -> Self {
        Self {
            auth_token: auth_token.clone(),
            region: region.to_string(),
            recognition_language: None,
        }
    }

    pub fn with_recognition_language(mut self, language: &str) -> Self {
        self.recognition_language = Some(language.to_string());
        self
    }

    pub fn auth_token(&self) -> &SecretString {
        &self.auth_token
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn recognition_language(&self) -> Option<&str> {
        self.recognition_language.as_deref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioSource {
    DefaultMicrophone,
}

#[derive(Debug, Clone)]
pub struct IceServer {
    pub urls: Vec<String>,
    pub username: String,
    pub credential: SecretString,
}

#[derive(Debug, Clone, Default)]
pub struct PeerConfig {
    pub ice_servers: Vec<IceServer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransceiverDirection {
    SendRecv,
    SendOnly,
    RecvOnly,
}

/// Opaque handle to a remote media stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStream {
    id: String,
}

impl MediaStream {
    pub fn new(id: &str) -> Self {
        Self { id: id.to_string() }
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IceConnectionState {
    New,
    Checking,
    Connected,
    Completed,
    Failed,
    Disconnected,
    Closed,
}

impl IceConnectionState {
    /// States after which the media session can no longer be used.
    pub fn is_lost(&self) -> bool {
        matches!(
            self,
            IceConnectionState::Failed | IceConnectionState::Disconnected
        )
    }
}

impl fmt::Display for IceConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IceConnectionState::New => "new",
            IceConnectionState::Checking => "checking",
            IceConnectionState::Connected => "connected",
            IceConnectionState::Completed => "completed",
            IceConnectionState::Failed => "failed",
            IceConnectionState::Disconnected => "disconnected",
            IceConnectionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub enum PeerEvent {
    /// A remote track arrived. `stream` is the first stream the track belongs to, if any.
    Track {
        kind: MediaKind,
        stream: Option<MediaStream>,
    },
    DataChannelMessage {
        label: String,
        data: String,
    },
    IceConnectionStateChange(IceConnectionState),
}

#[derive(Debug, Clone)]
pub struct AvatarEvent {
    pub description: String,
    pub offset: Option<u64>,
}

#[derive(Debug, Clone)]
pub enum RecognitionEvent {
    /// Interim hypothesis.
    Recognizing { text: String },
    Recognized { reason: ResultReason, text: String },
    Canceled { error_details: String },
}

/// A peer connection from the platform's media stack.
pub trait PeerConnection: Send + Sync {
    fn add_transceiver(&self, kind: MediaKind, direction: TransceiverDirection) -> Result<()>;

    fn create_data_channel(&self, label: &str) -> Result<()>;

    /// Hands out the event stream. Returns `None` once it has been taken.
    fn take_events(&self) -> Option<mpsc::Receiver<PeerEvent>>;

    fn close(&self);
}

/// The SDK's avatar synthesizer: text in, lip-synced audio/video out over the peer connection.
#[async_trait]
pub trait AvatarSynthesizer: Send + Sync {
    async fn start_avatar(&self, peer: Arc<dyn PeerConnection>) -> Result<SynthesisResult>;

    async fn speak_text(&self, text: &str) -> Result<SynthesisResult>;

    async fn stop_speaking(&self) -> Result<()>;

    fn take_events(&self) -> Option<mpsc::Receiver<AvatarEvent>>;

    fn close(&self);
}

/// The SDK's continuous speech recognizer.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn start_continuous_recognition(&self) -> Result<()>;

    async fn stop_continuous_recognition(&self) -> Result<()>;

    fn take_events(&self) -> Option<mpsc::Receiver<RecognitionEvent>>;

    fn close(&self);
}

/// Factory for the SDK and media objects a session needs.
pub trait SpeechSdk: Send + Sync {
    fn create_avatar_synthesizer(
        &self,
        speech: &SpeechConfig,
        avatar: &AvatarSettings,
    ) -> Result<Arc<dyn AvatarSynthesizer>>;

    fn create_peer_connection(&self, config: &PeerConfig) -> Result<Arc<dyn PeerConnection>>;

    fn create_recognizer(
        &self,
        speech: &SpeechConfig,
        audio: AudioSource,
    ) -> Result<Arc<dyn SpeechRecognizer>>;
}
