use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use avatar_chat::SessionCredential;
use avatar_chat::types::{Role, Transcript, Turn};
use tokio::sync::mpsc;

use crate::backend::Backend;
use crate::error::{SessionError, StateError};
use crate::media_session::MediaSession;
use crate::sdk::SpeechSdk;
use crate::speech_capture::{
    CaptureEvent, CaptureState, DEFAULT_RECOGNITION_LANGUAGE, SpeechCapture,
};
use crate::status::{StatusEntry, StatusLog};
use crate::surface::{Affordances, MicLabel, Surface};

const CAPTURE_EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone)]
pub struct ConversationOptions {
    /// BCP-47 language for microphone recognition.
    pub recognition_language: String,
}

impl Default for ConversationOptions {
    fn default() -> Self {
        Self {
            recognition_language: DEFAULT_RECOGNITION_LANGUAGE.to_string(),
        }
    }
}

struct Inner {
    backend: Arc<dyn Backend>,
    surface: Arc<dyn Surface>,
    status: Arc<StatusLog>,
    media: MediaSession,
    capture: SpeechCapture,
    credential: Mutex<Option<SessionCredential>>,
    transcript: Mutex<Transcript>,
    /// Set when a turn came from the microphone; consumed by the next `send_message`.
    auto_mode: AtomicBool,
}

/// Top-level conversation state. Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct Conversation {
    inner: Arc<Inner>,
}

impl Conversation {
    /// Builds the conversation and puts the surface into its pre-session layout.
    ///
    /// Must be called inside a tokio runtime: a task is spawned to handle recognition
    /// results for the lifetime of the conversation.
    pub fn new(
        backend: Arc<dyn Backend>,
        sdk: Arc<dyn SpeechSdk>,
        surface: Arc<dyn Surface>,
        options: ConversationOptions,
    ) -> Self {
        let status = Arc::new(StatusLog::new(surface.clone()));
        let (capture_tx, capture_rx) = mpsc::channel(CAPTURE_EVENT_CAPACITY);

        let inner = Arc::new(Inner {
            backend,
            media: MediaSession::new(sdk.clone(), surface.clone(), status.clone()),
            capture: SpeechCapture::new(
                sdk,
                surface.clone(),
                status.clone(),
                &options.recognition_language,
                capture_tx,
            ),
            surface,
            status,
            credential: Mutex::new(None),
            transcript: Mutex::new(Transcript::new()),
            auto_mode: AtomicBool::new(false),
        });

        tokio::spawn(handle_capture_events(Arc::downgrade(&inner), capture_rx));

        Affordances::IDLE.apply(inner.surface.as_ref());
        inner.surface.set_mic_label(MicLabel::Idle);

        Self { inner }
    }

    /// Fetches config and credentials, then opens the avatar media session.
    ///
    /// Any failure is logged and alerted and leaves the controls untouched.
    pub async fn start_session(&self) -> Result<(), SessionError> {
        let inner = &self.inner;
        inner.status.info("connecting to avatar service...");

        match self.open_session().await {
            Ok(()) => {
                Affordances::ACTIVE.apply(inner.surface.as_ref());
                inner.surface.set_mic_label(MicLabel::Idle);
                inner.status.info("avatar service connected");
                Ok(())
            }
            Err(e) => {
                inner.status.error(format!("connection failed: {}", e));
                inner.surface.alert(&format!("connection failed: {}", e));
                Err(e)
            }
        }
    }

    async fn open_session(&self) -> Result<(), SessionError> {
        let inner = &self.inner;
        if !inner.media.can_start() {
            return Err(StateError::AlreadyStarted.into());
        }
        let config = inner.backend.get_config().await?;
        let region = config
            .speech()
            .region()
            .filter(|r| !r.is_empty())
            .ok_or_else(|| {
                SessionError::BadResponse("backend config has no speech region".to_string())
            })?;

        let credential = inner.backend.get_relay_credential(region).await?;
        inner.media.start(&credential, config.avatar()).await?;
        *self.credential_slot() = Some(credential);
        Ok(())
    }

    /// Sends `text` to the backend and has the avatar speak the answer.
    ///
    /// Blank input is ignored. If the turn came from the microphone, capture resumes once
    /// speaking settles, whether or not it succeeded.
    pub async fn send_message(&self, text: &str) -> Result<(), SessionError> {
        let inner = &self.inner;
        let question = text.trim();
        if question.is_empty() {
            return Ok(());
        }
        let auto_resume = inner.auto_mode.swap(false, Ordering::SeqCst);

        if !inner.media.is_active() {
            let err = StateError::NoSession;
            inner.status.error(err.to_string());
            inner.surface.alert(&err.to_string());
            return Err(err.into());
        }

        self.push_turn(Turn::new(Role::User, question));
        inner.surface.set_input_text("");

        inner.status.info("asking the backend...");
        let answer = match inner.backend.ask(question).await {
            Ok(answer) => answer,
            Err(e) => {
                let err = SessionError::from(e);
                inner.status.error(format!("error: {}", err));
                inner.surface.alert(&format!("error: {}", err));
                return Err(err);
            }
        };

        self.push_turn(Turn::new(Role::Avatar, &answer));
        inner.status.info(format!("avatar: {}", answer));

        // Speak failures are already on the status log.
        if let Err(e) = inner.media.speak(&answer).await {
            tracing::debug!("speaking did not complete: {}", e);
        }

        if auto_resume {
            self.resume_capture().await;
        }
        Ok(())
    }

    /// Resumes listening after a voice turn, but only if capture is exactly idle.
    async fn resume_capture(&self) {
        let inner = &self.inner;
        if inner.capture.state() != CaptureState::Idle {
            tracing::debug!(
                "capture is {:?}, skipping auto-resume",
                inner.capture.state()
            );
            return;
        }
        let Some(credential) = self.credential() else {
            tracing::debug!("session ended before auto-resume");
            return;
        };
        if let Err(e) = inner.capture.start(Some(&credential)).await {
            inner
                .status
                .error(format!("failed to restart recognition: {}", e));
        }
    }

    pub async fn toggle_mic(&self) -> Result<(), SessionError> {
        let inner = &self.inner;
        if inner.capture.state() == CaptureState::Idle {
            let credential = self.credential();
            inner.capture.start(credential.as_ref()).await?;
        } else {
            inner.capture.stop().await?;
        }
        Ok(())
    }

    pub async fn stop_speaking(&self) -> Result<(), SessionError> {
        self.inner.media.stop_speaking().await
    }

    /// Tears everything down and returns the controls to their pre-session layout.
    pub async fn stop_session(&self) {
        let inner = &self.inner;
        if let Err(e) = inner.capture.stop().await {
            tracing::debug!("capture stop during session teardown: {}", e);
        }
        inner.auto_mode.store(false, Ordering::SeqCst);
        inner.media.stop();
        *self.credential_slot() = None;

        Affordances::IDLE.apply(inner.surface.as_ref());
        inner.surface.set_mic_label(MicLabel::Idle);
        inner.status.info("conversation stopped");
    }

    pub fn capture_state(&self) -> CaptureState {
        self.inner.capture.state()
    }

    pub fn is_session_active(&self) -> bool {
        self.inner.media.is_active()
    }

    pub fn transcript(&self) -> Vec<Turn> {
        lock(&self.inner.transcript).turns().to_vec()
    }

    pub fn status_entries(&self) -> Vec<StatusEntry> {
        self.inner.status.entries()
    }

    async fn on_capture_event(&self, event: CaptureEvent) {
        let inner = &self.inner;
        match event {
            CaptureEvent::Final(text) => {
                inner.auto_mode.store(true, Ordering::SeqCst);
                if let Err(e) = inner.capture.stop().await {
                    inner
                        .status
                        .warn(format!("error stopping recognition: {}", e));
                }
                if let Err(e) = self.send_message(&text).await {
                    tracing::debug!("voice turn not sent: {}", e);
                }
            }
            CaptureEvent::Canceled(details) => {
                inner.status.warn(format!("recognition canceled: {}", details));
                if let Err(e) = inner.capture.stop().await {
                    tracing::debug!("capture stop after cancel: {}", e);
                }
            }
        }
    }

    fn push_turn(&self, turn: Turn) {
        self.inner.surface.append_turn(&turn);
        lock(&self.inner.transcript).push(turn);
    }

    fn credential(&self) -> Option<SessionCredential> {
        self.credential_slot().clone()
    }

    fn credential_slot(&self) -> MutexGuard<'_, Option<SessionCredential>> {
        lock(&self.inner.credential)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn handle_capture_events(inner: Weak<Inner>, mut events: mpsc::Receiver<CaptureEvent>) {
    while let Some(event) = events.recv().await {
        let Some(inner) = inner.upgrade() else {
            break;
        };
        Conversation { inner }.on_capture_event(event).await;
    }
}
