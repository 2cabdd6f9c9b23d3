//! Campaign console: the composition controller.
//!
//! DESIGN
//! ======
//! Owns every piece of composition state and wires the control flow:
//! directory selection drives the stats poller, the compose dialog edits the
//! contact set and template builder, and a successful dispatch resets the
//! dialog and asks the poller for an immediate refresh.
//!
//! Mutating operations take `&mut self`, so one console cannot race itself;
//! concurrent callers share state through the submitter's in-flight set and
//! the poller's `watch` channel instead.
//!
//! ERROR HANDLING
//! ==============
//! Failed dispatches and saves leave the contact set and template builder
//! untouched so the operator can retry without re-entering data.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::api::CampaignApi;
use crate::api::types::CampaignId;
use crate::auth::Credential;
use crate::error::{ConsoleError, ErrorCode};
use crate::services::dispatch::{DispatchReceipt, DispatchSubmitter};
use crate::services::poller::{StatsPoller, StatsView};
use crate::state::contacts::ContactSet;
use crate::state::directory::{CampaignDirectory, Selection};
use crate::state::template::TemplateBuilder;

pub struct CampaignConsole {
    api: Arc<dyn CampaignApi>,
    credential: Credential,
    directory: CampaignDirectory,
    poller: StatsPoller,
    submitter: DispatchSubmitter,
    contacts: ContactSet,
    template: TemplateBuilder,
    compose_open: bool,
}

impl CampaignConsole {
    #[must_use]
    pub fn new(api: Arc<dyn CampaignApi>, credential: Credential, poll_interval: Duration) -> Self {
        Self {
            poller: StatsPoller::new(api.clone(), poll_interval),
            submitter: DispatchSubmitter::new(api.clone()),
            api,
            credential,
            directory: CampaignDirectory::new(),
            contacts: ContactSet::new(),
            template: TemplateBuilder::new(),
            compose_open: false,
        }
    }

    // =========================================================================
    // ACCESSORS
    // =========================================================================

    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Swap in a fresh credential. A running session restarts with it.
    pub fn set_credential(&mut self, credential: Credential) {
        self.credential = credential;
        if let Some(id) = self.poller.active_campaign().cloned() {
            self.poller.start(id, self.credential.clone());
        }
    }

    #[must_use]
    pub fn directory(&self) -> &CampaignDirectory {
        &self.directory
    }

    #[must_use]
    pub fn contacts(&self) -> &ContactSet {
        &self.contacts
    }

    pub fn contacts_mut(&mut self) -> &mut ContactSet {
        &mut self.contacts
    }

    #[must_use]
    pub fn template(&self) -> &TemplateBuilder {
        &self.template
    }

    pub fn template_mut(&mut self) -> &mut TemplateBuilder {
        &mut self.template
    }

    #[must_use]
    pub fn is_compose_open(&self) -> bool {
        self.compose_open
    }

    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.poller.is_active()
    }

    #[must_use]
    pub fn stats(&self) -> StatsView {
        self.poller.snapshot()
    }

    #[must_use]
    pub fn subscribe_stats(&self) -> watch::Receiver<StatsView> {
        self.poller.subscribe()
    }

    // =========================================================================
    // DIRECTORY
    // =========================================================================

    /// Reload the campaign list. A selection that disappeared is cleared,
    /// which stops its polling session.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Api`] if the list cannot be fetched; the
    /// cached list and selection are kept.
    pub async fn refresh_campaigns(&mut self) -> Result<usize, ConsoleError> {
        let count = self.directory.refresh(self.api.as_ref(), &self.credential).await?;
        if self.directory.selection_is_stale() {
            info!("selected campaign no longer listed; clearing selection");
            self.select(None)?;
        }
        Ok(count)
    }

    /// Change the active campaign and restart (or stop) stats polling.
    /// Re-selecting the active campaign keeps its session running.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::UnknownCampaign`] if `id` is not listed.
    pub fn select(&mut self, id: Option<CampaignId>) -> Result<Selection, ConsoleError> {
        let selection = self.directory.select(id)?;
        match &selection {
            Selection::Unchanged => {}
            Selection::Changed(Some(id)) => {
                self.poller.start(id.clone(), self.credential.clone());
            }
            Selection::Changed(None) => self.poller.stop(),
        }
        Ok(selection)
    }

    // =========================================================================
    // COMPOSE
    // =========================================================================

    /// Open the compose dialog with a blank template and contact set.
    pub fn open_compose(&mut self) {
        self.reset_compose();
        self.compose_open = true;
    }

    /// Close the compose dialog, discarding unsent edits.
    pub fn close_compose(&mut self) {
        self.reset_compose();
        self.compose_open = false;
    }

    fn reset_compose(&mut self) {
        self.template.reset();
        self.contacts.reset();
    }

    /// Dispatch the current contact set to the selected campaign.
    ///
    /// On success the compose state is reset, the dialog is closed and an
    /// immediate stats refresh is scheduled (see [`DispatchReceipt::refresh`]).
    ///
    /// # Errors
    ///
    /// See [`DispatchSubmitter::submit`]. State is untouched on failure.
    pub async fn submit(&mut self) -> Result<DispatchReceipt, ConsoleError> {
        let campaign = self.directory.selected_id().cloned();
        let mut receipt = self
            .submitter
            .submit(campaign.as_ref(), &self.contacts, &self.credential)
            .await?;

        self.close_compose();
        receipt.refresh = self.poller.refresh_now(&receipt.campaign);
        Ok(receipt)
    }

    /// Save the template builder as a campaign via `POST /campaign`, then
    /// reset the builder, close the dialog and reload the directory.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank name or missing message type,
    /// or [`ConsoleError::Api`] if the backend rejects the draft. A failed
    /// directory reload after a successful save is logged, not returned.
    pub async fn save_template(&mut self) -> Result<Value, ConsoleError> {
        let draft = self.template.draft()?;
        let response = match self.api.create_campaign(&self.credential, &draft).await {
            Ok(response) => response,
            Err(e) => {
                warn!(name = %draft.name, error = %e, code = e.error_code(), "campaign save failed");
                return Err(e.into());
            }
        };
        info!(name = %draft.name, category = ?draft.category, "campaign saved");

        self.close_compose();
        if let Err(e) = self.refresh_campaigns().await {
            warn!(error = %e, code = e.error_code(), "campaign list reload after save failed");
        }
        Ok(response)
    }

    /// Stop polling and close the dialog. Safe to call more than once.
    pub fn shutdown(&mut self) {
        self.poller.stop();
        self.compose_open = false;
    }
}

#[cfg(test)]
#[path = "console_test.rs"]
mod tests;
