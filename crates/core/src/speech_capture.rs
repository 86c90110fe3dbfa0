use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use avatar_chat::SessionCredential;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{SessionError, StateError};
use crate::sdk::{
    AudioSource, RecognitionEvent, ResultReason, SpeechConfig, SpeechRecognizer, SpeechSdk,
};
use crate::status::StatusLog;
use crate::surface::{Affordance, MicLabel, Surface};

pub const DEFAULT_RECOGNITION_LANGUAGE: &str = "zh-CN";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Starting,
    Recognizing,
    Stopping,
}

/// What the capture controller hands up to the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// A non-empty final transcript.
    Final(String),
    Canceled(String),
}

struct CaptureInner {
    state: CaptureState,
    recognizer: Option<Arc<dyn SpeechRecognizer>>,
    pump: Option<JoinHandle<()>>,
    /// A stop arrived while the recognizer was still starting.
    stop_pending: bool,
}

/// Continuous microphone recognition, one recognizer at a time.
pub struct SpeechCapture {
    sdk: Arc<dyn SpeechSdk>,
    surface: Arc<dyn Surface>,
    status: Arc<StatusLog>,
    language: String,
    events: mpsc::Sender<CaptureEvent>,
    inner: Mutex<CaptureInner>,
}

impl SpeechCapture {
    pub fn new(
        sdk: Arc<dyn SpeechSdk>,
        surface: Arc<dyn Surface>,
        status: Arc<StatusLog>,
        language: &str,
        events: mpsc::Sender<CaptureEvent>,
    ) -> Self {
        Self {
            sdk,
            surface,
            status,
            language: language.to_string(),
            events,
            inner: Mutex::new(CaptureInner {
                state: CaptureState::Idle,
                recognizer: None,
                pump: None,
                stop_pending: false,
            }),
        }
    }

    pub fn state(&self) -> CaptureState {
        self.lock().state
    }

    /// Starts continuous recognition. Returns `Ok(false)` if capture was not idle, or if a
    /// stop was requested before the recognizer finished starting.
    ///
    /// Without a credential carrying an authorization token this alerts the user and
    /// changes nothing.
    pub async fn start(&self, credential: Option<&SessionCredential>) -> Result<bool, SessionError> {
        let Some((token, region)) = credential
            .and_then(|c| c.auth_token().map(|t| (t, c.region())))
            .filter(|(_, region)| !region.is_empty())
        else {
            let err = StateError::MissingAuthToken;
            self.status.error(err.to_string());
            self.surface.alert(&err.to_string());
            return Err(err.into());
        };

        {
            let mut inner = self.lock();
            if inner.state != CaptureState::Idle {
                tracing::debug!("capture already {:?}, not starting", inner.state);
                return Ok(false);
            }
            inner.state = CaptureState::Starting;
        }

        self.surface.set_mic_label(MicLabel::Recording);
        self.surface.set_enabled(Affordance::Mic, true);

        let speech = SpeechConfig::from_authorization_token(token, region)
            .with_recognition_language(&self.language);
        let recognizer = match self
            .sdk
            .create_recognizer(&speech, AudioSource::DefaultMicrophone)
        {
            Ok(recognizer) => recognizer,
            Err(e) => {
                self.status.error(format!("failed to create recognizer: {}", e));
                self.reset(None);
                return Err(SessionError::sdk(e));
            }
        };

        let pump = recognizer.take_events().map(|events| {
            tokio::spawn(pump_recognition(
                events,
                self.surface.clone(),
                self.events.clone(),
            ))
        });
        {
            let mut inner = self.lock();
            inner.recognizer = Some(recognizer.clone());
            inner.pump = pump;
        }

        match recognizer.start_continuous_recognition().await {
            Ok(()) => {
                let stop_pending = {
                    let mut inner = self.lock();
                    if inner.state == CaptureState::Starting {
                        inner.state = CaptureState::Recognizing;
                    }
                    std::mem::take(&mut inner.stop_pending)
                };
                self.status.info("microphone recognition started");
                if stop_pending {
                    tracing::debug!("stop requested while starting, stopping recognition");
                    self.stop().await?;
                    return Ok(false);
                }
                Ok(true)
            }
            Err(e) => {
                self.status
                    .error(format!("start continuous recognition failed: {}", e));
                self.reset(Some(recognizer));
                Err(SessionError::sdk(e))
            }
        }
    }

    /// Stops recognition and waits for the recognizer to confirm. Returns `Ok(false)` if
    /// nothing was recognizing.
    ///
    /// While a start is still in flight the stop is recorded and carried out by `start`
    /// once the recognizer has started. The recognizer is released either way; it is only
    /// closed when the stop succeeded.
    pub async fn stop(&self) -> Result<bool, SessionError> {
        let recognizer = {
            let mut inner = self.lock();
            let state = inner.state;
            match state {
                CaptureState::Recognizing => {}
                CaptureState::Starting => {
                    inner.stop_pending = true;
                    drop(inner);
                    self.surface.set_enabled(Affordance::Mic, false);
                    return Ok(true);
                }
                CaptureState::Idle | CaptureState::Stopping => return Ok(false),
            }
            inner.state = CaptureState::Stopping;
            inner.recognizer.clone()
        };
        let Some(recognizer) = recognizer else {
            self.reset(None);
            return Ok(false);
        };

        self.surface.set_enabled(Affordance::Mic, false);
        let result = recognizer.stop_continuous_recognition().await;
        self.release();
        self.surface.set_mic_label(MicLabel::Idle);
        self.surface.set_enabled(Affordance::Mic, true);

        match result {
            Ok(()) => {
                recognizer.close();
                self.status.info("microphone recognition stopped");
                Ok(true)
            }
            Err(e) => {
                self.status
                    .error(format!("stop continuous recognition failed: {}", e));
                Err(SessionError::sdk(e))
            }
        }
    }

    fn release(&self) {
        let mut inner = self.lock();
        inner.state = CaptureState::Idle;
        inner.recognizer = None;
        inner.stop_pending = false;
        if let Some(pump) = inner.pump.take() {
            pump.abort();
        }
    }

    /// Back to idle after a failed start.
    fn reset(&self, recognizer: Option<Arc<dyn SpeechRecognizer>>) {
        self.release();
        if let Some(recognizer) = recognizer {
            recognizer.close();
        }
        self.surface.set_mic_label(MicLabel::Idle);
        self.surface.set_enabled(Affordance::Mic, true);
    }

    fn lock(&self) -> MutexGuard<'_, CaptureInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn pump_recognition(
    mut events: mpsc::Receiver<RecognitionEvent>,
    surface: Arc<dyn Surface>,
    tx: mpsc::Sender<CaptureEvent>,
) {
    while let Some(event) = events.recv().await {
        match event {
            RecognitionEvent::Recognizing { text } => surface.set_input_text(&text),
            RecognitionEvent::Recognized {
                reason: ResultReason::RecognizedSpeech,
                text,
            } => {
                let text = text.trim();
                surface.set_input_text(text);
                if !text.is_empty() {
                    if tx.send(CaptureEvent::Final(text.to_string())).await.is_err() {
                        tracing::warn!("capture event receiver dropped");
                    }
                    // The recognizer is about to be stopped; one final result per run.
                    break;
                }
            }
            RecognitionEvent::Recognized { reason, .. } => {
                tracing::debug!("ignoring recognition result: {}", reason);
            }
            RecognitionEvent::Canceled { error_details } => {
                if tx.send(CaptureEvent::Canceled(error_details)).await.is_err() {
                    tracing::warn!("capture event receiver dropped");
                }
                break;
            }
        }
    }
}
