use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use avatar_chat::SessionCredential;
use avatar_chat::types::{AvatarSettings, DataChannelEvent};
use secrecy::SecretString;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{SessionError, StateError};
use crate::sdk::{
    AvatarEvent, AvatarSynthesizer, IceServer, MediaKind, PeerConfig, PeerConnection, PeerEvent,
    SpeechConfig, SpeechSdk, TransceiverDirection,
};
use crate::status::StatusLog;
use crate::surface::{Affordance, Playback, PlaybackTarget, Surface};

/// Label of the data channel opened towards the avatar service.
pub const EVENT_CHANNEL_LABEL: &str = "eventChannel";

struct Handles {
    synthesizer: Arc<dyn AvatarSynthesizer>,
    peer: Arc<dyn PeerConnection>,
    tasks: Vec<JoinHandle<()>>,
}

impl Handles {
    fn close(self) {
        self.synthesizer.close();
        self.peer.close();
        for task in self.tasks {
            task.abort();
        }
    }
}

enum MediaState {
    Idle,
    Starting,
    Active(Handles),
    /// The peer connection reported `failed` or `disconnected`. Handles are still open
    /// until the next `stop` or `start`.
    Lost(Handles),
}

/// Owns the avatar synthesizer and the peer connection carrying its media.
///
/// At most one of each exists at a time: `start` is refused while a session is starting
/// or active.
pub struct MediaSession {
    sdk: Arc<dyn SpeechSdk>,
    surface: Arc<dyn Surface>,
    status: Arc<StatusLog>,
    state: Arc<Mutex<MediaState>>,
}

impl MediaSession {
    pub fn new(sdk: Arc<dyn SpeechSdk>, surface: Arc<dyn Surface>, status: Arc<StatusLog>) -> Self {
        Self {
            sdk,
            surface,
            status,
            state: Arc::new(Mutex::new(MediaState::Idle)),
        }
    }

    /// Opens the avatar session and waits for the synthesizer to report it is streaming.
    ///
    /// On failure every handle created so far is closed and "start" is re-enabled.
    pub async fn start(
        &self,
        credential: &SessionCredential,
        avatar: &AvatarSettings,
    ) -> Result<(), SessionError> {
        let auth_token = credential
            .auth_token()
            .ok_or(StateError::MissingAuthToken)?;

        {
            let mut state = lock(&self.state);
            match std::mem::replace(&mut *state, MediaState::Starting) {
                MediaState::Idle => {}
                MediaState::Lost(stale) => {
                    tracing::debug!("closing media handles from a lost connection");
                    stale.close();
                }
                previous @ (MediaState::Starting | MediaState::Active(_)) => {
                    *state = previous;
                    return Err(StateError::AlreadyStarted.into());
                }
            }
        }

        match self.open(credential, auth_token, avatar).await {
            Ok(handles) => {
                let mut state = lock(&self.state);
                if matches!(*state, MediaState::Starting) {
                    *state = MediaState::Active(handles);
                    Ok(())
                } else {
                    drop(state);
                    handles.close();
                    Err(StateError::StoppedWhileStarting.into())
                }
            }
            Err(e) => {
                {
                    let mut state = lock(&self.state);
                    if matches!(*state, MediaState::Starting) {
                        *state = MediaState::Idle;
                    }
                }
                self.surface.set_enabled(Affordance::StartSession, true);
                Err(e)
            }
        }
    }

    async fn open(
        &self,
        credential: &SessionCredential,
        auth_token: &SecretString,
        avatar: &AvatarSettings,
    ) -> Result<Handles, SessionError> {
        let speech = SpeechConfig::from_authorization_token(auth_token, credential.region());
        let synthesizer = self
            .sdk
            .create_avatar_synthesizer(&speech, avatar)
            .map_err(|e| self.setup_failed(e))?;

        let peer_config = PeerConfig {
            ice_servers: vec![IceServer {
                urls: credential.ice_urls().iter().take(1).cloned().collect(),
                username: credential.username().to_string(),
                credential: credential.credential().clone(),
            }],
        };
        let peer = match self.sdk.create_peer_connection(&peer_config) {
            Ok(peer) => peer,
            Err(e) => {
                synthesizer.close();
                return Err(self.setup_failed(e));
            }
        };

        let mut handles = Handles {
            synthesizer,
            peer,
            tasks: Vec::new(),
        };

        if let Some(events) = handles.synthesizer.take_events() {
            handles
                .tasks
                .push(tokio::spawn(pump_avatar_events(events, self.status.clone())));
        }
        if let Some(events) = handles.peer.take_events() {
            let pump = PeerEventPump {
                surface: self.surface.clone(),
                status: self.status.clone(),
                state: self.state.clone(),
            };
            handles.tasks.push(tokio::spawn(pump.run(events)));
        }

        if let Err(e) = configure_peer(handles.peer.as_ref()) {
            handles.close();
            return Err(self.setup_failed(e));
        }

        match handles.synthesizer.start_avatar(handles.peer.clone()).await {
            Ok(result) if result.is_completed() => {
                self.status.info("avatar started");
                Ok(handles)
            }
            Ok(result) => {
                self.status
                    .error(format!("failed to start avatar: {}", result.reason));
                if let Some(details) = &result.cancellation {
                    self.status
                        .error(format!("cancellation details: {}", details.error_details));
                }
                handles.close();
                Err(SessionError::from_result(&result))
            }
            Err(e) => {
                self.status.error(format!("avatar start failed: {}", e));
                handles.close();
                Err(SessionError::sdk(e))
            }
        }
    }

    fn setup_failed(&self, err: anyhow::Error) -> SessionError {
        self.status.error(format!("media setup failed: {}", err));
        SessionError::sdk(err)
    }

    /// Speaks `text` through the avatar and waits until synthesis settles.
    pub async fn speak(&self, text: &str) -> Result<(), SessionError> {
        let Some(synthesizer) = self.synthesizer() else {
            self.status.error("cannot speak: no active avatar session");
            return Err(StateError::NoSession.into());
        };

        match synthesizer.speak_text(text).await {
            Ok(result) if result.is_completed() => {
                self.status.info("avatar finished speaking");
                Ok(())
            }
            Ok(result) => {
                match &result.cancellation {
                    Some(details) => self
                        .status
                        .error(format!("speaking canceled: {}", details.error_details)),
                    None => self
                        .status
                        .warn(format!("speaking ended with {}", result.reason)),
                }
                Err(SessionError::from_result(&result))
            }
            Err(e) => {
                self.status.error(format!("speaking failed: {}", e));
                Err(SessionError::sdk(e))
            }
        }
    }

    pub async fn stop_speaking(&self) -> Result<(), SessionError> {
        let Some(synthesizer) = self.any_synthesizer() else {
            return Ok(());
        };
        synthesizer.stop_speaking().await.map_err(|e| {
            self.status.warn(format!("stop speaking failed: {}", e));
            SessionError::sdk(e)
        })?;
        self.status.info("stopped speaking");
        Ok(())
    }

    /// Closes the synthesizer and the peer connection. Returns `false` if there was
    /// nothing to close.
    pub fn stop(&self) -> bool {
        let previous = std::mem::replace(&mut *lock(&self.state), MediaState::Idle);
        match previous {
            MediaState::Active(handles) | MediaState::Lost(handles) => {
                handles.close();
                true
            }
            MediaState::Starting => {
                tracing::debug!("stop requested while the avatar is still starting");
                false
            }
            MediaState::Idle => false,
        }
    }

    /// True when `start` would be accepted: nothing is starting or streaming.
    pub fn can_start(&self) -> bool {
        matches!(*lock(&self.state), MediaState::Idle | MediaState::Lost(_))
    }

    /// True while the avatar is streaming and the connection has not been lost.
    pub fn is_active(&self) -> bool {
        matches!(*lock(&self.state), MediaState::Active(_))
    }

    fn synthesizer(&self) -> Option<Arc<dyn AvatarSynthesizer>> {
        match &*lock(&self.state) {
            MediaState::Active(handles) => Some(handles.synthesizer.clone()),
            _ => None,
        }
    }

    fn any_synthesizer(&self) -> Option<Arc<dyn AvatarSynthesizer>> {
        match &*lock(&self.state) {
            MediaState::Active(handles) | MediaState::Lost(handles) => {
                Some(handles.synthesizer.clone())
            }
            _ => None,
        }
    }
}

fn lock(state: &Mutex<MediaState>) -> MutexGuard<'_, MediaState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn configure_peer(peer: &dyn PeerConnection) -> anyhow::Result<()> {
    peer.add_transceiver(MediaKind::Video, TransceiverDirection::SendRecv)?;
    peer.add_transceiver(MediaKind::Audio, TransceiverDirection::SendRecv)?;
    // The service opens its own event channel; this one mirrors it.
    peer.create_data_channel(EVENT_CHANNEL_LABEL)?;
    Ok(())
}

async fn pump_avatar_events(mut events: mpsc::Receiver<AvatarEvent>, status: Arc<StatusLog>) {
    while let Some(event) = events.recv().await {
        status.info(format!("avatar event: {}", event.description));
    }
}

struct PeerEventPump {
    surface: Arc<dyn Surface>,
    status: Arc<StatusLog>,
    state: Arc<Mutex<MediaState>>,
}

impl PeerEventPump {
    async fn run(self, mut events: mpsc::Receiver<PeerEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                PeerEvent::Track { kind, stream: None } => {
                    tracing::debug!("ignoring {:?} track without a stream", kind);
                }
                PeerEvent::Track {
                    kind: MediaKind::Video,
                    stream: Some(stream),
                } => {
                    self.status.info("received video track, attaching to video element");
                    if let Err(e) =
                        self.surface
                            .attach_stream(PlaybackTarget::Video, &stream, Playback::video())
                    {
                        self.status.warn(format!("video playback blocked: {}", e));
                    }
                }
                PeerEvent::Track {
                    kind: MediaKind::Audio,
                    stream: Some(stream),
                } => {
                    self.status.info("received audio track, attaching to audio element");
                    if !self.surface.has_audio_element() {
                        self.surface.create_audio_element(Playback::audio());
                    }
                    match self
                        .surface
                        .attach_stream(PlaybackTarget::Audio, &stream, Playback::audio())
                    {
                        Ok(()) => self.status.info("audio playback started"),
                        Err(e) => self.status.error(format!("audio playback error: {}", e)),
                    }
                }
                PeerEvent::DataChannelMessage { label, data } => {
                    match DataChannelEvent::parse(&data) {
                        Ok(event) => tracing::debug!(
                            "[WebRTC event] channel={}, type={}, payload={}",
                            label,
                            event.event_type().unwrap_or("unknown"),
                            data
                        ),
                        Err(e) => {
                            tracing::warn!("malformed data channel message on {}: {}", label, e)
                        }
                    }
                }
                PeerEvent::IceConnectionStateChange(connection) => {
                    self.status.info(format!("WebRTC state: {}", connection));
                    if connection.is_lost() {
                        self.connection_lost();
                    }
                }
            }
        }
    }

    fn connection_lost(&self) {
        {
            let mut state = lock(&self.state);
            *state = match std::mem::replace(&mut *state, MediaState::Idle) {
                MediaState::Active(handles) => MediaState::Lost(handles),
                other => other,
            };
        }
        self.surface.set_enabled(Affordance::StopSession, false);
        self.surface.set_enabled(Affordance::Send, false);
        self.surface.set_enabled(Affordance::MessageInput, false);
        self.surface.set_enabled(Affordance::StartSession, true);
    }
}
