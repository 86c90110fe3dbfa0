use avatar_chat::types::Turn;

use crate::sdk::MediaStream;
use crate::status::StatusEntry;

/// UI controls whose enabled state the orchestrator drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Affordance {
    StartSession,
    StopSession,
    Send,
    MessageInput,
    Mic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicLabel {
    Idle,
    Recording,
}

impl MicLabel {
    pub fn text(&self) -> &'static str {
        match self {
            MicLabel::Idle => "🎤",
            MicLabel::Recording => "◼ Stop recording",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackTarget {
    Video,
    Audio,
}

/// Playback element settings applied when a stream is attached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Playback {
    pub muted: bool,
    pub volume: f32,
    pub autoplay: bool,
    pub hidden: bool,
}

impl Playback {
    /// Video is always muted; audio is played through its own element.
    pub fn video() -> Self {
        Self {
            muted: true,
            volume: 1.0,
            autoplay: true,
            hidden: false,
        }
    }

    pub fn audio() -> Self {
        Self {
            muted: false,
            volume: 1.0,
            autoplay: true,
            hidden: true,
        }
    }
}

/// The rendering target: buttons, input field, chat history, status log, media elements.
pub trait Surface: Send + Sync {
    fn set_enabled(&self, affordance: Affordance, enabled: bool);

    fn set_mic_label(&self, label: MicLabel);

    fn set_input_text(&self, text: &str);

    fn append_turn(&self, turn: &Turn);

    /// Replaces the on-screen status list with `entries`, oldest first.
    fn show_status(&self, entries: &[StatusEntry]);

    /// Blocking, user-visible error.
    fn alert(&self, message: &str);

    fn has_audio_element(&self) -> bool;

    fn create_audio_element(&self, playback: Playback);

    /// Binds `stream` to the target element and starts playback. An error means the
    /// platform refused to play (autoplay policy, missing element).
    fn attach_stream(
        &self,
        target: PlaybackTarget,
        stream: &MediaStream,
        playback: Playback,
    ) -> anyhow::Result<()>;
}

/// A full enabled/disabled layout of the session controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordances {
    pub start_session: bool,
    pub stop_session: bool,
    pub send: bool,
    pub message_input: bool,
    pub mic: bool,
}

impl Affordances {
    /// No session: only "start" is usable.
    pub const IDLE: Affordances = Affordances {
        start_session: true,
        stop_session: false,
        send: false,
        message_input: false,
        mic: false,
    };

    pub const ACTIVE: Affordances = Affordances {
        start_session: false,
        stop_session: true,
        send: true,
        message_input: true,
        mic: true,
    };

    pub fn entries(&self) -> [(Affordance, bool); 5] {
        [
            (Affordance::StartSession, self.start_session),
            (Affordance::StopSession, self.stop_session),
            (Affordance::Send, self.send),
            (Affordance::MessageInput, self.message_input),
            (Affordance::Mic, self.mic),
        ]
    }

    pub fn apply(&self, surface: &dyn Surface) {
        for (affordance, enabled) in self.entries() {
            surface.set_enabled(affordance, enabled);
        }
    }
}
