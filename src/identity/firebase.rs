use crate::error::{Result, check_identity_response};
use crate::identity::types::{RefreshResponse, Session, SignInResponse};
use crate::{log_request, log_response};
use reqwest::Client;
use serde::Serialize;

const SIGN_IN_URL: &str = "https://identitytoolkit.googleapis.com/v1/accounts:signInWithIdp";
const REFRESH_URL: &str = "https://securetoken.googleapis.com/v1/token";
const GOOGLE_PROVIDER_ID: &str = "google.com";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SignInWithIdpRequest {
    post_body: String,
    request_uri: &'static str,
    return_secure_token: bool,
    return_idp_credential: bool,
}

/// Exchanges provider identity tokens for session credentials
pub struct IdentityToolkit {
    client: Client,
    api_key: String,
}

impl IdentityToolkit {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
        }
    }

    /// Mint a session from a Google identity token
    pub async fn sign_in_with_google(&self, google_id_token: &str) -> Result<Session> {
        let body = SignInWithIdpRequest {
            post_body: format!(
                "id_token={}&providerId={}",
                urlencoding::encode(google_id_token),
                GOOGLE_PROVIDER_ID
            ),
            request_uri: "http://localhost",
            return_secure_token: true,
            return_idp_credential: true,
        };

        log_request("POST", SIGN_IN_URL);
        let response = self
            .client
            .post(SIGN_IN_URL)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;
        log_response(response.status().as_u16(), SIGN_IN_URL);

        let text = check_identity_response(response, "Sign-in failed").await?;
        let sign_in: SignInResponse = serde_json::from_str(&text)?;
        Ok(Session::from_sign_in(sign_in))
    }

    /// Refresh an expired session credential
    pub async fn refresh(&self, session: Session) -> Result<Session> {
        log_request("POST", REFRESH_URL);
        let response = self
            .client
            .post(REFRESH_URL)
            .query(&[("key", self.api_key.as_str())])
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", session.refresh_token.as_str()),
            ])
            .send()
            .await?;
        log_response(response.status().as_u16(), REFRESH_URL);

        let text = check_identity_response(response, "Session refresh failed").await?;
        let refresh: RefreshResponse = serde_json::from_str(&text)?;
        Ok(session.refreshed(refresh))
    }
}
