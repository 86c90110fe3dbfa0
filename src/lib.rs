mod client;

pub use avatar_chat_types as types;
pub use client::config::{Config, ConfigBuilder};
pub use client::credential::SessionCredential;
pub use client::error::GatewayError;
pub use client::{connect, connect_with_config, Client};
