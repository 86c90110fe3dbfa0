//! Session orchestration for a talking-avatar chat client.
//!
//! Speech recognition, avatar synthesis and the peer-to-peer media transport are
//! provided by an external SDK and reached through the traits in [`sdk`]. The UI is
//! reached through [`surface::Surface`]. This crate sequences them: start a session,
//! capture speech or accept typed input, ask the backend, speak the answer, and resume
//! listening when the turn came from the microphone.

pub mod backend;
pub mod conversation;
pub mod error;
pub mod media_session;
pub mod sdk;
pub mod speech_capture;
pub mod status;
pub mod surface;

#[cfg(test)]
mod test_support;

pub use backend::Backend;
pub use conversation::{Conversation, ConversationOptions};
pub use error::{SessionError, StateError};
pub use speech_capture::CaptureState;
