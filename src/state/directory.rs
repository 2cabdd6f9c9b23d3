//! Campaign directory: the cached campaign list and the active selection.
//!
//! ERROR HANDLING
//! ==============
//! A failed reload keeps the previous list (stale but available); it is
//! never cleared on failure. The loading flag is lowered by a guard, so a
//! reload that is cancelled mid-request does not leave it raised.

#[cfg(test)]
#[path = "directory_test.rs"]
mod directory_test;

use tracing::{info, warn};

use crate::api::CampaignApi;
use crate::api::types::{ApiError, Campaign, CampaignId};
use crate::auth::Credential;
use crate::error::{ConsoleError, ErrorCode};

/// Holds the directory's loading flag up until dropped.
struct LoadingFlag<'a>(&'a mut bool);

impl<'a> LoadingFlag<'a> {
    fn raise(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

/// Outcome of [`CampaignDirectory::select`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    /// The requested campaign was already active.
    Unchanged,
    /// The active campaign changed to the contained value (`None` = cleared).
    Changed(Option<CampaignId>),
}

#[derive(Clone, Debug, Default)]
pub struct CampaignDirectory {
    campaigns: Vec<Campaign>,
    selected: Option<CampaignId>,
    loading: bool,
    last_error: Option<String>,
}

impl CampaignDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn campaigns(&self) -> &[Campaign] {
        &self.campaigns
    }

    #[must_use]
    pub fn get(&self, id: &CampaignId) -> Option<&Campaign> {
        self.campaigns.iter().find(|c| &c.id == id)
    }

    #[must_use]
    pub fn selected_id(&self) -> Option<&CampaignId> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn selected(&self) -> Option<&Campaign> {
        self.selected.as_ref().and_then(|id| self.get(id))
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message of the most recent failed reload, cleared on success.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Reload the list from the backend, replacing the cache on success.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] from the backend; the cached list is kept.
    pub async fn refresh(&mut self, api: &dyn CampaignApi, credential: &Credential) -> Result<usize, ApiError> {
        let loading = LoadingFlag::raise(&mut self.loading);
        let result = api.list_campaigns(credential).await;
        drop(loading);

        match result {
            Ok(campaigns) => {
                info!(count = campaigns.len(), "campaign list loaded");
                self.campaigns = campaigns;
                self.last_error = None;
                Ok(self.campaigns.len())
            }
            Err(e) => {
                warn!(error = %e, code = e.error_code(), cached = self.campaigns.len(), "campaign list reload failed");
                self.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Make `id` the active campaign, or clear the selection with `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::UnknownCampaign`] if `id` is not in the list.
    pub fn select(&mut self, id: Option<CampaignId>) -> Result<Selection, ConsoleError> {
        if let Some(id) = &id {
            if self.get(id).is_none() {
                return Err(ConsoleError::UnknownCampaign(id.clone()));
            }
        }
        if self.selected == id {
            return Ok(Selection::Unchanged);
        }
        self.selected.clone_from(&id);
        Ok(Selection::Changed(id))
    }

    /// Whether the current selection vanished from the latest list.
    #[must_use]
    pub fn selection_is_stale(&self) -> bool {
        self.selected.is_some() && self.selected().is_none()
    }
}
