use crate::api::types::{HolidayEvent, HolidaysResponse, NewNote, Note};
use crate::error::{Result, check_response};
use crate::{log_request, log_response};
use reqwest::Client;

/// Client for the holidays/notes backend
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn holidays_url(&self, region: &str) -> String {
        format!("{}/holidays/{}", self.base_url, urlencoding::encode(region))
    }

    pub fn notes_url(&self) -> String {
        format!("{}/notes", self.base_url)
    }

    /// Fetch both holiday lists for a region, tagged and flattened
    pub async fn fetch_holidays(&self, region: &str) -> Result<Vec<HolidayEvent>> {
        let url = self.holidays_url(region);

        log_request("GET", &url);
        let response = self.client.get(&url).send().await?;
        log_response(response.status().as_u16(), &url);

        let body = check_response(response, "Holidays request failed").await?;
        let holidays: HolidaysResponse = serde_json::from_str(&body)?;
        Ok(holidays.into_events())
    }

    /// Fetch every note for a user, in server order
    pub async fn fetch_notes(&self, user_id: &str) -> Result<Vec<Note>> {
        let url = self.notes_url();

        log_request("GET", &url);
        let response = self
            .client
            .get(&url)
            .query(&[("user_id", user_id)])
            .header("Cache-Control", "no-store")
            .send()
            .await?;
        log_response(response.status().as_u16(), &url);

        let body = check_response(response, "Notes request failed").await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Append a note and return the server's representation of it
    pub async fn create_note(&self, user_id: &str, note: &NewNote) -> Result<Note> {
        let url = self.notes_url();

        log_request("POST", &url);
        let response = self
            .client
            .post(&url)
            .query(&[("user_id", user_id)])
            .json(note)
            .send()
            .await?;
        log_response(response.status().as_u16(), &url);

        let body = check_response(response, "Saving note failed").await?;
        Ok(serde_json::from_str(&body)?)
    }
}
