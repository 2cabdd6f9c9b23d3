//! Dispatch submitter: validate, guard, send.
//!
//! DESIGN
//! ======
//! The submitter is cheap to clone; clones share one in-flight set, so a
//! second submission for a campaign that is still sending is rejected with
//! [`ConsoleError::Busy`] instead of racing. The slot is held by an RAII
//! guard and released on every exit path, including errors and a dropped
//! future.
//!
//! Resetting the compose state and refreshing stats after a success is the
//! controller's job (see `services::console`); this module never mutates the
//! contact set it is given.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::CampaignApi;
use crate::api::types::{CampaignId, Recipients};
use crate::auth::Credential;
use crate::error::{ConsoleError, ErrorCode, ValidationError};
use crate::state::contacts::ContactSet;

/// Result of an accepted dispatch.
#[derive(Debug)]
pub struct DispatchReceipt {
    pub campaign: CampaignId,
    /// Manual recipient count, or `None` when a file was uploaded.
    pub manual_count: Option<usize>,
    /// Backend acknowledgment body (`Null` if not JSON).
    pub response: Value,
    /// Out-of-cycle stats refresh scheduled after the send, if any.
    pub refresh: Option<JoinHandle<()>>,
}

#[derive(Clone)]
pub struct DispatchSubmitter {
    api: Arc<dyn CampaignApi>,
    in_flight: Arc<Mutex<HashSet<CampaignId>>>,
}

impl DispatchSubmitter {
    #[must_use]
    pub fn new(api: Arc<dyn CampaignApi>) -> Self {
        Self { api, in_flight: Arc::new(Mutex::new(HashSet::new())) }
    }

    /// Whether a dispatch for `id` is currently in flight.
    #[must_use]
    pub fn is_busy(&self, id: &CampaignId) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    /// Send `contacts` to `campaign`.
    ///
    /// # Errors
    ///
    /// - [`ValidationError`] if no campaign is selected or there are no
    ///   recipients; nothing is sent.
    /// - [`ConsoleError::Busy`] if a dispatch for the campaign is in flight.
    /// - [`ConsoleError::Api`] if the backend call fails.
    pub async fn submit(
        &self,
        campaign: Option<&CampaignId>,
        contacts: &ContactSet,
        credential: &Credential,
    ) -> Result<DispatchReceipt, ConsoleError> {
        let campaign = campaign.ok_or(ValidationError::NoCampaignSelected)?;
        let recipients = contacts.recipients()?;

        let Some(_slot) = InFlight::acquire(&self.in_flight, campaign) else {
            debug!(campaign_id = %campaign, "dispatch rejected; already in flight");
            return Err(ConsoleError::Busy(campaign.clone()));
        };

        let manual_count = recipients.manual_count();
        debug!(campaign_id = %campaign, file = matches!(recipients, Recipients::File(_)), ?manual_count, "sending dispatch");

        match self.api.send_campaign(credential, campaign, &recipients).await {
            Ok(response) => {
                info!(campaign_id = %campaign, ?manual_count, "campaign dispatched");
                Ok(DispatchReceipt { campaign: campaign.clone(), manual_count, response, refresh: None })
            }
            Err(e) => {
                warn!(campaign_id = %campaign, error = %e, code = e.error_code(), "dispatch failed");
                Err(e.into())
            }
        }
    }
}

/// Holds a campaign's in-flight slot until dropped.
struct InFlight {
    set: Arc<Mutex<HashSet<CampaignId>>>,
    id: CampaignId,
}

impl InFlight {
    fn acquire(set: &Arc<Mutex<HashSet<CampaignId>>>, id: &CampaignId) -> Option<Self> {
        let inserted = set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone());
        inserted.then(|| Self { set: set.clone(), id: id.clone() })
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

#[cfg(test)]
#[path = "dispatch_test.rs"]
mod tests;
