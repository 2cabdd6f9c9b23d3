//! `reqwest` implementation of [`CampaignApi`].
//!
//! ERROR HANDLING
//! ==============
//! Any non-2xx status becomes [`ApiError::Rejected`] carrying the body's
//! `message` or `error` field, falling back to a per-endpoint message.
//! HTTP 401 maps to [`ApiError::Unauthenticated`], keeping the body's detail,
//! so callers know to log in again. Multipart bodies are built and consumed inside a single call, so
//! the upload is released on every exit path.

use std::time::Duration;

use reqwest::Body;
use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::CampaignApi;
use super::types::{ApiError, Campaign, CampaignDraft, CampaignId, CampaignStats, ManualRecipients, Recipients};
use crate::auth::Credential;
use crate::config::ConsoleConfig;

const JSON: &str = "application/json";

pub struct HttpCampaignApi {
    http: reqwest::Client,
    base_url: String,
    token_ttl: Duration,
}

impl HttpCampaignApi {
    /// Build a client with the configured base URL and timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ClientBuild`] if the HTTP client cannot be constructed.
    pub fn new(config: &ConsoleConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            token_ttl: config.token_ttl,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        credential: &Credential,
        path: &str,
        fallback: &str,
    ) -> Result<T, ApiError> {
        let request = self
            .http
            .get(self.url(path))
            .bearer_auth(credential.bearer()?)
            .header(CONTENT_TYPE, JSON);
        let text = send(request, fallback).await?;
        decode(&text)
    }
}

#[async_trait::async_trait]
impl CampaignApi for HttpCampaignApi {
    async fn login(&self, username: &str, password: &str) -> Result<Credential, ApiError> {
        #[derive(serde::Deserialize)]
        struct LoginResponse {
            access_token: String,
        }

        // The backend reads credentials from the query string of a POST.
        let request = self
            .http
            .post(self.url("/login"))
            .query(&[("username", username), ("password", password)]);
        let text = send(request, "login failed").await?;
        let body: LoginResponse = decode(&text)?;
        Ok(Credential::issued_now(body.access_token, self.token_ttl))
    }

    async fn list_campaigns(&self, credential: &Credential) -> Result<Vec<Campaign>, ApiError> {
        self.get_json(credential, "/campaigns", "failed to fetch campaigns")
            .await
    }

    async fn get_campaign(&self, credential: &Credential, id: &CampaignId) -> Result<Campaign, ApiError> {
        self.get_json(credential, &format!("/campaign/{id}"), "failed to fetch campaign")
            .await
    }

    async fn campaign_stats(&self, credential: &Credential, id: &CampaignId) -> Result<CampaignStats, ApiError> {
        self.get_json(credential, &format!("/campaign/{id}/stats"), "failed to fetch campaign stats")
            .await
    }

    async fn send_campaign(
        &self,
        credential: &Credential,
        id: &CampaignId,
        recipients: &Recipients,
    ) -> Result<Value, ApiError> {
        let form = build_form(recipients)?;
        // No explicit content type: reqwest sets the multipart boundary.
        let request = self
            .http
            .post(self.url(&format!("/campaign/{id}/send")))
            .bearer_auth(credential.bearer()?)
            .multipart(form);
        let text = send(request, "failed to send campaign messages").await?;
        Ok(decode_lenient(&text))
    }

    async fn create_campaign(&self, credential: &Credential, draft: &CampaignDraft) -> Result<Value, ApiError> {
        let request = self
            .http
            .post(self.url("/campaign"))
            .bearer_auth(credential.bearer()?)
            .header(CONTENT_TYPE, JSON)
            .json(draft);
        let text = send(request, "failed to create campaign").await?;
        Ok(decode_lenient(&text))
    }

    async fn ping(&self) -> Result<Value, ApiError> {
        let request = self.http.get(ping_url(&self.base_url));
        let text = send(request, "ping failed").await?;
        Ok(decode_lenient(&text))
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send(request: reqwest::RequestBuilder, fallback: &str) -> Result<String, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    debug!(status, bytes = text.len(), "backend response");
    check_status(status, &text, fallback)?;
    Ok(text)
}

/// Map a response status and body to success or a typed error.
pub(crate) fn check_status(status: u16, body: &str, fallback: &str) -> Result<(), ApiError> {
    if (200..300).contains(&status) {
        return Ok(());
    }
    if status == 401 {
        return Err(ApiError::Unauthenticated(error_detail(body)));
    }
    let message = error_detail(body).unwrap_or_else(|| fallback.to_owned());
    Err(ApiError::Rejected { status, message })
}

/// Extract the server-provided `message`/`error` detail, if any.
pub(crate) fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error", "detail"]
        .iter()
        .find_map(|key| value.get(*key))
        .and_then(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::String(_) | Value::Null => None,
            other => Some(other.to_string()),
        })
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Acknowledgment bodies are informational; anything unparsable becomes `Null`.
fn decode_lenient(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or(Value::Null)
}

/// Text parts of the send form, in wire order: number then code per recipient.
pub(crate) fn manual_fields(manual: &ManualRecipients) -> Vec<(&'static str, String)> {
    manual
        .iter()
        .flat_map(|(code, number)| [("phone_numbers", number.to_owned()), ("phone_codes", code.to_owned())])
        .collect()
}

fn build_form(recipients: &Recipients) -> Result<Form, ApiError> {
    match recipients {
        Recipients::File(file) => {
            let body = Body::from(file.bytes.clone());
            let part = Part::stream_with_length(body, file.bytes.len() as u64)
                .file_name(file.name.clone())
                .mime_str("application/octet-stream")
                .map_err(|e| ApiError::ClientBuild(e.to_string()))?;
            Ok(Form::new().part("file", part))
        }
        Recipients::Manual(manual) => Ok(manual_fields(manual)
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value))),
    }
}

/// The health endpoint lives at the origin, outside the versioned API root.
pub(crate) fn ping_url(base_url: &str) -> String {
    let trimmed = base_url.trim_end_matches('/');
    let origin = trimmed
        .strip_suffix("/api/v1")
        .or_else(|| trimmed.strip_suffix("/api"))
        .unwrap_or(trimmed);
    format!("{origin}/ping")
}

#[cfg(test)]
#[path = "http_test.rs"]
mod tests;
