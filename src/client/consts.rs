pub const BACKEND_URL_VAR: &str = "AVATAR_BACKEND_URL";

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

pub const CONFIG_PATH: &str = "/config";
pub const TOKEN_PATH: &str = "/avatar/token";
pub const ASK_PATH: &str = "/ask";
