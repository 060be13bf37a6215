use crate::config::GoogleConfig;
use crate::error::{CalnotesError, Result};
use crate::identity::types::{DeviceCodeResponse, TokenResponse};
use crate::{log_request, log_response};
use reqwest::Client;

const DEVICE_CODE_URL: &str = "https://oauth2.googleapis.com/device/code";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const IDENTITY_SCOPE: &str = "openid email";

/// Google OAuth device flow, used only to obtain an identity token
pub struct GoogleAuth {
    client: Client,
    config: GoogleConfig,
}

#[derive(Debug)]
pub enum PollResult {
    Success { id_token: String },
    Pending,
    SlowDown,
    Denied,
    Expired,
}

impl GoogleAuth {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Step 1: Request device code
    pub async fn request_device_code(&self) -> Result<DeviceCodeResponse> {
        log_request("POST", DEVICE_CODE_URL);
        let response = self
            .client
            .post(DEVICE_CODE_URL)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("scope", IDENTITY_SCOPE),
            ])
            .send()
            .await?;
        log_response(response.status().as_u16(), DEVICE_CODE_URL);

        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CalnotesError::Auth(format!(
                "Failed to get device code: {}",
                body
            )));
        }

        let device_code: DeviceCodeResponse = response.json().await?;
        Ok(device_code)
    }

    /// Step 2: Poll for token (call this repeatedly)
    pub async fn poll_for_token(&self, device_code: &str) -> Result<PollResult> {
        log_request("POST", TOKEN_URL);
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("device_code", device_code),
                ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
            ])
            .send()
            .await?;
        log_response(response.status().as_u16(), TOKEN_URL);

        if response.status().is_success() {
            let token_response: TokenResponse = response.json().await?;
            match token_response.id_token {
                Some(id_token) => Ok(PollResult::Success { id_token }),
                None => Err(CalnotesError::Auth(
                    "Token response carried no identity token".to_string(),
                )),
            }
        } else {
            let error: serde_json::Value = response.json().await?;
            classify_poll_error(&error)
        }
    }
}

fn classify_poll_error(error: &serde_json::Value) -> Result<PollResult> {
    match error.get("error").and_then(|e| e.as_str()) {
        Some("authorization_pending") => Ok(PollResult::Pending),
        Some("slow_down") => Ok(PollResult::SlowDown),
        Some("access_denied") => Ok(PollResult::Denied),
        Some("expired_token") => Ok(PollResult::Expired),
        _ => Err(CalnotesError::Auth(format!("Unknown error: {:?}", error))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_poll_error() {
        assert!(matches!(
            classify_poll_error(&json!({"error": "authorization_pending"})),
            Ok(PollResult::Pending)
        ));
        assert!(matches!(
            classify_poll_error(&json!({"error": "slow_down"})),
            Ok(PollResult::SlowDown)
        ));
        assert!(matches!(
            classify_poll_error(&json!({"error": "access_denied"})),
            Ok(PollResult::Denied)
        ));
        assert!(matches!(
            classify_poll_error(&json!({"error": "expired_token"})),
            Ok(PollResult::Expired)
        ));
        assert!(matches!(
            classify_poll_error(&json!({"error": "invalid_client"})),
            Err(CalnotesError::Auth(_))
        ));
    }

    #[test]
    fn test_device_code_default_interval() {
        let json = r#"{"device_code": "d", "user_code": "ABCD-EFGH", "verification_url": "https://www.google.com/device", "expires_in": 1800}"#;
        let response: DeviceCodeResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.interval, 5);
        assert_eq!(response.user_code, "ABCD-EFGH");
    }
}
