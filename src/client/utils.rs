use crate::client::config::Config;

pub fn endpoint(config: &Config, path: &str) -> String {
    format!("{}{}", config.base_url(), path)
}

/// Short description of a response body for error messages.
pub fn snippet(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
