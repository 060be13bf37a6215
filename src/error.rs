use reqwest::{Response, StatusCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalnotesError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Token expired")]
    TokenExpired,

    #[error("Not authenticated")]
    NotAuthenticated,
}

pub type Result<T> = std::result::Result<T, CalnotesError>;

/// Check a response status and return the body as text on success
pub async fn check_response(response: Response, context: &str) -> Result<String> {
    if response.status() == StatusCode::UNAUTHORIZED {
        return Err(CalnotesError::TokenExpired);
    }

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(CalnotesError::Api(format!("{} {}: {}", context, status, body)));
    }

    Ok(response.text().await?)
}

/// Like `check_response`, but identity endpoints report failures as
/// `{"error": {"message": ...}}` with a 400, which is an auth failure rather
/// than an API fault.
pub async fn check_identity_response(response: Response, context: &str) -> Result<String> {
    if !response.status().is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or(body);
        return Err(CalnotesError::Auth(format!("{}: {}", context, message)));
    }

    Ok(response.text().await?)
}
