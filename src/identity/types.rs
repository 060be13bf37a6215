use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Device code response from Google
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCodeResponse {
    pub device_code: String,
    pub user_code: String,
    pub verification_url: String,
    pub expires_in: u64,
    #[serde(default = "default_interval")]
    pub interval: u64,
}

fn default_interval() -> u64 {
    5
}

/// Google token endpoint response; `id_token` is present for `openid` scopes
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub id_token: Option<String>,
}

/// Identity toolkit `accounts:signInWithIdp` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub id_token: String,
    pub refresh_token: String,
    #[serde(deserialize_with = "seconds_from_str")]
    pub expires_in: i64,
    pub local_id: String,
    pub email: Option<String>,
}

/// Secure token endpoint refresh response
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    pub id_token: String,
    pub refresh_token: String,
    #[serde(deserialize_with = "seconds_from_str")]
    pub expires_in: i64,
    pub user_id: String,
}

/// The identity endpoints send `expiresIn` as a decimal string
fn seconds_from_str<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Text(String),
        Number(i64),
    }

    match Seconds::deserialize(deserializer)? {
        Seconds::Number(n) => Ok(n),
        Seconds::Text(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

/// The signed-in user as seen by the rest of the app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub email: Option<String>,
}

impl User {
    /// Identifier the notes backend scopes records by
    pub fn notes_id(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.uid)
    }

    pub fn display_name(&self) -> &str {
        self.email.as_deref().unwrap_or("(no email)")
    }
}

/// Session credential minted by the identity toolkit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at - chrono::Duration::minutes(5)
    }

    pub fn from_sign_in(response: SignInResponse) -> Self {
        Self {
            user: User {
                uid: response.local_id,
                email: response.email,
            },
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_at: Utc::now() + chrono::Duration::seconds(response.expires_in),
        }
    }

    /// Apply a refresh, keeping the known user details
    pub fn refreshed(self, response: RefreshResponse) -> Self {
        Self {
            user: User {
                uid: response.user_id,
                email: self.user.email,
            },
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            expires_at: Utc::now() + chrono::Duration::seconds(response.expires_in),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_in_response_string_expiry() {
        let json = r#"{
            "federatedId": "https://accounts.google.com/123",
            "providerId": "google.com",
            "email": "asha@example.com",
            "localId": "uid-1",
            "idToken": "session-token",
            "refreshToken": "refresh-1",
            "expiresIn": "3600"
        }"#;
        let response: SignInResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.expires_in, 3600);

        let session = Session::from_sign_in(response);
        assert_eq!(session.user.notes_id(), "asha@example.com");
        assert!(!session.is_expired());
    }

    #[test]
    fn test_refresh_keeps_email() {
        let session = Session {
            user: User {
                uid: "uid-1".to_string(),
                email: Some("asha@example.com".to_string()),
            },
            id_token: "old".to_string(),
            refresh_token: "refresh-1".to_string(),
            expires_at: Utc::now() - chrono::Duration::hours(1),
        };
        assert!(session.is_expired());

        let json = r#"{"id_token": "new", "refresh_token": "refresh-2", "expires_in": 3600, "user_id": "uid-1", "token_type": "Bearer"}"#;
        let refreshed = session.refreshed(serde_json::from_str(json).unwrap());

        assert_eq!(refreshed.id_token, "new");
        assert_eq!(refreshed.user.email.as_deref(), Some("asha@example.com"));
        assert!(!refreshed.is_expired());
    }

    #[test]
    fn test_notes_id_falls_back_to_uid() {
        let user = User {
            uid: "uid-9".to_string(),
            email: None,
        };
        assert_eq!(user.notes_id(), "uid-9");
    }
}
