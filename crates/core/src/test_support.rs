//! Fakes for the SDK and surface traits.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use avatar_chat::SessionCredential;
use avatar_chat::types::{AvatarSettings, ClientConfig, SpeechSettings, Turn};
use tokio::sync::mpsc;

use crate::sdk::{
    AudioSource, AvatarEvent, AvatarSynthesizer, MediaKind, MediaStream, PeerConfig,
    PeerConnection, PeerEvent, RecognitionEvent, SpeechConfig, SpeechRecognizer, SpeechSdk,
    SynthesisResult, TransceiverDirection,
};
use crate::status::StatusEntry;
use crate::surface::{Affordance, Affordances, MicLabel, Playback, PlaybackTarget, Surface};

pub fn credential() -> SessionCredential {
    SessionCredential::new(
        vec![
            "turn:relay.example.net:3478".to_string(),
            "turns:relay.example.net:443".to_string(),
        ],
        "relay-user",
        "relay-pw",
        "westus2",
    )
    .with_auth_token("sts-token")
}

pub fn client_config() -> ClientConfig {
    ClientConfig::new(
        SpeechSettings::new(Some("westus2".to_string()), true),
        AvatarSettings::new("lisa", "casual-sitting"),
    )
}

/// Polls `cond` until it holds or two seconds pass.
pub async fn wait_for(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    cond()
}

#[derive(Default)]
pub struct RecordingSurface {
    enabled: Mutex<HashMap<Affordance, bool>>,
    mic_label: Mutex<Option<MicLabel>>,
    input: Mutex<String>,
    turns: Mutex<Vec<Turn>>,
    status: Mutex<Vec<StatusEntry>>,
    alerts: Mutex<Vec<String>>,
    audio_element: Mutex<Option<Playback>>,
    attached: Mutex<Vec<(PlaybackTarget, MediaStream, Playback)>>,
}

impl RecordingSurface {
    pub fn is_enabled(&self, affordance: Affordance) -> Option<bool> {
        self.enabled.lock().unwrap().get(&affordance).copied()
    }

    pub fn affordances(&self) -> Affordances {
        let get = |a| self.is_enabled(a).unwrap_or(false);
        Affordances {
            start_session: get(Affordance::StartSession),
            stop_session: get(Affordance::StopSession),
            send: get(Affordance::Send),
            message_input: get(Affordance::MessageInput),
            mic: get(Affordance::Mic),
        }
    }

    pub fn mic_label(&self) -> Option<MicLabel> {
        *self.mic_label.lock().unwrap()
    }

    pub fn input_text(&self) -> String {
        self.input.lock().unwrap().clone()
    }

    pub fn turns(&self) -> Vec<Turn> {
        self.turns.lock().unwrap().clone()
    }

    pub fn status_messages(&self) -> Vec<String> {
        self.status
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.message.clone())
            .collect()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }

    pub fn audio_element(&self) -> Option<Playback> {
        *self.audio_element.lock().unwrap()
    }

    pub fn attached(&self) -> Vec<(PlaybackTarget, MediaStream, Playback)> {
        self.attached.lock().unwrap().clone()
    }
}

impl Surface for RecordingSurface {
    fn set_enabled(&self, affordance: Affordance, enabled: bool) {
        self.enabled.lock().unwrap().insert(affordance, enabled);
    }

    fn set_mic_label(&self, label: MicLabel) {
        *self.mic_label.lock().unwrap() = Some(label);
    }

    fn set_input_text(&self, text: &str) {
        *self.input.lock().unwrap() = text.to_string();
    }

    fn append_turn(&self, turn: &Turn) {
        self.turns.lock().unwrap().push(turn.clone());
    }

    fn show_status(&self, entries: &[StatusEntry]) {
        *self.status.lock().unwrap() = entries.to_vec();
    }

    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }

    fn has_audio_element(&self) -> bool {
        self.audio_element.lock().unwrap().is_some()
    }

    fn create_audio_element(&self, playback: Playback) {
        *self.audio_element.lock().unwrap() = Some(playback);
    }

    fn attach_stream(
        &self,
        target: PlaybackTarget,
        stream: &MediaStream,
        playback: Playback,
    ) -> Result<()> {
        self.attached
            .lock()
            .unwrap()
            .push((target, stream.clone(), playback));
        Ok(())
    }
}

/// How a fake SDK future settles.
#[derive(Debug, Clone, Default)]
pub enum Settle {
    #[default]
    Completed,
    Result(SynthesisResult),
    Reject(String),
}

impl Settle {
    fn resolve(&self) -> Result<SynthesisResult> {
        match self {
            Settle::Completed => Ok(SynthesisResult::completed()),
            Settle::Result(result) => Ok(result.clone()),
            Settle::Reject(message) => Err(anyhow!(message.clone())),
        }
    }
}

#[derive(Default)]
pub struct FakeSdk {
    start: Mutex<Settle>,
    speak: Mutex<Settle>,
    fail_recognizer_start: AtomicBool,
    cancel_during_start: Mutex<Option<String>>,
    synthesizers: Mutex<Vec<Arc<FakeSynthesizer>>>,
    peers: Mutex<Vec<Arc<FakePeer>>>,
    recognizers: Mutex<Vec<Arc<FakeRecognizer>>>,
    recognizer_configs: Mutex<Vec<SpeechConfig>>,
}

impl FakeSdk {
    pub fn settle_start(&self, settle: Settle) {
        *self.start.lock().unwrap() = settle;
    }

    pub fn settle_speak(&self, settle: Settle) {
        *self.speak.lock().unwrap() = settle;
    }

    pub fn fail_recognizer_start(&self, fail: bool) {
        self.fail_recognizer_start.store(fail, Ordering::SeqCst);
    }

    /// Recognizers report a cancellation while their start is still pending, then start.
    pub fn cancel_during_start(&self, error_details: &str) {
        *self.cancel_during_start.lock().unwrap() = Some(error_details.to_string());
    }

    pub fn synthesizer(&self, idx: usize) -> Arc<FakeSynthesizer> {
        self.synthesizers.lock().unwrap()[idx].clone()
    }

    pub fn peer(&self, idx: usize) -> Arc<FakePeer> {
        self.peers.lock().unwrap()[idx].clone()
    }

    pub fn recognizer(&self, idx: usize) -> Arc<FakeRecognizer> {
        self.recognizers.lock().unwrap()[idx].clone()
    }

    pub fn recognizer_count(&self) -> usize {
        self.recognizers.lock().unwrap().len()
    }

    pub fn last_recognizer_config(&self) -> Option<SpeechConfig> {
        self.recognizer_configs.lock().unwrap().last().cloned()
    }
}

impl SpeechSdk for FakeSdk {
    fn create_avatar_synthesizer(
        &self,
        speech: &SpeechConfig,
        avatar: &AvatarSettings,
    ) -> Result<Arc<dyn AvatarSynthesizer>> {
        let (events_tx, events_rx) = mpsc::channel(16);
        let synthesizer = Arc::new(FakeSynthesizer {
            speech: speech.clone(),
            avatar: avatar.clone(),
            start: self.start.lock().unwrap().clone(),
            speak: self.speak.lock().unwrap().clone(),
            spoken: Mutex::new(Vec::new()),
            stop_speaking_calls: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        });
        self.synthesizers.lock().unwrap().push(synthesizer.clone());
        Ok(synthesizer)
    }

    fn create_peer_connection(&self, config: &PeerConfig) -> Result<Arc<dyn PeerConnection>> {
        let (events_tx, events_rx) = mpsc::channel(16);
        let peer = Arc::new(FakePeer {
            config: config.clone(),
            transceivers: Mutex::new(Vec::new()),
            data_channels: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        });
        self.peers.lock().unwrap().push(peer.clone());
        Ok(peer)
    }

    fn create_recognizer(
        &self,
        speech: &SpeechConfig,
        _audio: AudioSource,
    ) -> Result<Arc<dyn SpeechRecognizer>> {
        let (events_tx, events_rx) = mpsc::channel(16);
        let recognizer = Arc::new(FakeRecognizer {
            fail_start: self.fail_recognizer_start.load(Ordering::SeqCst),
            cancel_during_start: self.cancel_during_start.lock().unwrap().clone(),
            fail_stop: AtomicBool::new(false),
            start_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        });
        self.recognizer_configs.lock().unwrap().push(speech.clone());
        self.recognizers.lock().unwrap().push(recognizer.clone());
        Ok(recognizer)
    }
}

pub struct FakeSynthesizer {
    pub speech: SpeechConfig,
    pub avatar: AvatarSettings,
    start: Settle,
    speak: Settle,
    spoken: Mutex<Vec<String>>,
    stop_speaking_calls: AtomicUsize,
    closed: AtomicBool,
    events_tx: mpsc::Sender<AvatarEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<AvatarEvent>>>,
}

impl FakeSynthesizer {
    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn stop_speaking_calls(&self) -> usize {
        self.stop_speaking_calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn emit(&self, description: &str) {
        let _ = self
            .events_tx
            .send(AvatarEvent {
                description: description.to_string(),
                offset: None,
            })
            .await;
    }
}

#[async_trait]
impl AvatarSynthesizer for FakeSynthesizer {
    async fn start_avatar(&self, _peer: Arc<dyn PeerConnection>) -> Result<SynthesisResult> {
        self.start.resolve()
    }

    async fn speak_text(&self, text: &str) -> Result<SynthesisResult> {
        self.spoken.lock().unwrap().push(text.to_string());
        self.speak.resolve()
    }

    async fn stop_speaking(&self) -> Result<()> {
        self.stop_speaking_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn take_events(&self) -> Option<mpsc::Receiver<AvatarEvent>> {
        self.events_rx.lock().unwrap().take()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub struct FakePeer {
    pub config: PeerConfig,
    transceivers: Mutex<Vec<(MediaKind, TransceiverDirection)>>,
    data_channels: Mutex<Vec<String>>,
    closed: AtomicBool,
    events_tx: mpsc::Sender<PeerEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<PeerEvent>>>,
}

impl FakePeer {
    pub fn transceivers(&self) -> Vec<(MediaKind, TransceiverDirection)> {
        self.transceivers.lock().unwrap().clone()
    }

    pub fn data_channels(&self) -> Vec<String> {
        self.data_channels.lock().unwrap().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn emit(&self, event: PeerEvent) {
        let _ = self.events_tx.send(event).await;
    }
}

impl PeerConnection for FakePeer {
    fn add_transceiver(&self, kind: MediaKind, direction: TransceiverDirection) -> Result<()> {
        self.transceivers.lock().unwrap().push((kind, direction));
        Ok(())
    }

    fn create_data_channel(&self, label: &str) -> Result<()> {
        self.data_channels.lock().unwrap().push(label.to_string());
        Ok(())
    }

    fn take_events(&self) -> Option<mpsc::Receiver<PeerEvent>> {
        self.events_rx.lock().unwrap().take()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

pub struct FakeRecognizer {
    fail_start: bool,
    cancel_during_start: Option<String>,
    fail_stop: AtomicBool,
    start_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    closed: AtomicBool,
    events_tx: mpsc::Sender<RecognitionEvent>,
    events_rx: Mutex<Option<mpsc::Receiver<RecognitionEvent>>>,
}

impl FakeRecognizer {
    pub fn fail_stop(&self, fail: bool) {
        self.fail_stop.store(fail, Ordering::SeqCst);
    }

    pub fn start_calls(&self) -> usize {
        self.start_calls.load(Ordering::SeqCst)
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub async fn emit(&self, event: RecognitionEvent) {
        let _ = self.events_tx.send(event).await;
    }
}

#[async_trait]
impl SpeechRecognizer for FakeRecognizer {
    async fn start_continuous_recognition(&self) -> Result<()> {
        self.start_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error_details) = &self.cancel_during_start {
            let _ = self
                .events_tx
                .send(RecognitionEvent::Canceled {
                    error_details: error_details.clone(),
                })
                .await;
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        if self.fail_start {
            return Err(anyhow!("microphone permission denied"));
        }
        Ok(())
    }

    async fn stop_continuous_recognition(&self) -> Result<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop.load(Ordering::SeqCst) {
            return Err(anyhow!("recognizer already disposed"));
        }
        Ok(())
    }

    fn take_events(&self) -> Option<mpsc::Receiver<RecognitionEvent>> {
        self.events_rx.lock().unwrap().take()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
