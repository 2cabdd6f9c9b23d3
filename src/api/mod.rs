//! Backend REST collaborator.
//!
//! DESIGN
//! ======
//! `CampaignApi` is the seam between the controller and the network. The
//! production implementation is [`http::HttpCampaignApi`]; tests swap in a
//! scripted mock. Every authenticated call takes the [`Credential`]
//! explicitly instead of reading a global token.

pub mod http;
pub mod types;

use crate::auth::Credential;
use types::{ApiError, Campaign, CampaignDraft, CampaignId, CampaignStats, Recipients};

/// Operations the backend exposes to the console.
#[async_trait::async_trait]
pub trait CampaignApi: Send + Sync {
    /// Exchange username/password for a bearer credential.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the request fails or the response has no token.
    async fn login(&self, username: &str, password: &str) -> Result<Credential, ApiError>;

    /// `GET /campaigns`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a non-2xx response.
    async fn list_campaigns(&self, credential: &Credential) -> Result<Vec<Campaign>, ApiError>;

    /// `GET /campaign/{id}`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a non-2xx response.
    async fn get_campaign(&self, credential: &Credential, id: &CampaignId) -> Result<Campaign, ApiError>;

    /// `GET /campaign/{id}/stats`.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a non-2xx response.
    async fn campaign_stats(&self, credential: &Credential, id: &CampaignId) -> Result<CampaignStats, ApiError>;

    /// `POST /campaign/{id}/send` as a multipart body.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a non-2xx response.
    async fn send_campaign(
        &self,
        credential: &Credential,
        id: &CampaignId,
        recipients: &Recipients,
    ) -> Result<serde_json::Value, ApiError>;

    /// `POST /campaign` with a JSON draft.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] on transport failure or a non-2xx response.
    async fn create_campaign(&self, credential: &Credential, draft: &CampaignDraft)
    -> Result<serde_json::Value, ApiError>;

    /// Unauthenticated health check.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] if the backend is unreachable or unhealthy.
    async fn ping(&self) -> Result<serde_json::Value, ApiError>;
}
