pub mod ask;
pub mod config;
pub mod events;
pub mod token;
mod transcript;

pub use ask::{AskRequest, AskResponse, ErrorDetail};
pub use config::{AvatarSettings, ClientConfig, SpeechSettings};
pub use events::DataChannelEvent;
pub use token::RelayToken;
pub use transcript::{Role, Transcript, Turn};
