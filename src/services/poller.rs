//! Stats poller: one cancellable polling session per selected campaign.
//!
//! DESIGN
//! ======
//! `Idle -> Active(id) -> Idle`. An active session is a spawned task driving
//! a `tokio::time::interval` (first tick immediate, missed ticks skipped).
//! Starting a new session aborts the previous task before spawning the next,
//! so two loops never coexist.
//!
//! Every fetch is tagged with the [`SessionTag`] it was issued for. Results
//! are written into a `watch` channel with `send_if_modified`, which checks
//! the tag and applies the result in one step. A response whose session has
//! been superseded (including an earlier session for the same campaign) is
//! dropped.
//!
//! ERROR HANDLING
//! ==============
//! A failed fetch records the error and bumps the failure counter but keeps
//! the last good stats. The loop keeps its schedule regardless.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::api::CampaignApi;
use crate::api::types::{CampaignId, CampaignStats};
use crate::auth::{Credential, now_secs};
use crate::error::ErrorCode;

/// Identity of one polling session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionTag {
    pub campaign: CampaignId,
    pub generation: u64,
}

/// What the dashboard shows for the selected campaign.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatsView {
    /// Session the view belongs to; `None` while idle.
    pub session: Option<SessionTag>,
    /// Last successfully fetched stats for this session.
    pub stats: Option<CampaignStats>,
    /// Most recent fetch error, cleared by the next success.
    pub last_error: Option<String>,
    pub consecutive_failures: u32,
    /// Unix seconds of the last applied success.
    pub updated_at: Option<u64>,
}

impl StatsView {
    #[must_use]
    pub fn campaign(&self) -> Option<&CampaignId> {
        self.session.as_ref().map(|s| &s.campaign)
    }
}

struct Session {
    tag: SessionTag,
    credential: Credential,
    handle: JoinHandle<()>,
}

pub struct StatsPoller {
    api: Arc<dyn CampaignApi>,
    interval: Duration,
    tx: Arc<watch::Sender<StatsView>>,
    session: Option<Session>,
    next_generation: u64,
}

impl StatsPoller {
    #[must_use]
    pub fn new(api: Arc<dyn CampaignApi>, interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(StatsView::default());
        Self { api, interval, tx: Arc::new(tx), session: None, next_generation: 1 }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn active_campaign(&self) -> Option<&CampaignId> {
        self.session.as_ref().map(|s| &s.tag.campaign)
    }

    /// Current view, cloned.
    #[must_use]
    pub fn snapshot(&self) -> StatsView {
        self.tx.borrow().clone()
    }

    /// Receiver notified on every applied change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StatsView> {
        self.tx.subscribe()
    }

    /// Enter `Active(id)`: stop any prior session, clear the view, then
    /// fetch immediately and every `interval` after. Must be called from
    /// within a tokio runtime.
    pub fn start(&mut self, id: CampaignId, credential: Credential) -> SessionTag {
        self.stop();

        let tag = SessionTag { campaign: id, generation: self.next_generation };
        self.next_generation += 1;
        self.tx.send_replace(StatsView { session: Some(tag.clone()), ..StatsView::default() });

        let handle = spawn_poll_loop(self.api.clone(), credential.clone(), tag.clone(), self.tx.clone(), self.interval);
        info!(
            campaign_id = %tag.campaign,
            generation = tag.generation,
            interval_secs = self.interval.as_secs(),
            "stats polling started"
        );
        self.session = Some(Session { tag: tag.clone(), credential, handle });
        tag
    }

    /// Enter `Idle`. Cancels the timer; late responses are discarded.
    pub fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.handle.abort();
        self.tx.send_replace(StatsView::default());
        info!(campaign_id = %session.tag.campaign, generation = session.tag.generation, "stats polling stopped");
    }

    /// Out-of-cycle fetch for `id` that leaves the timer untouched.
    ///
    /// Returns `None` when no session is active for `id`.
    pub fn refresh_now(&self, id: &CampaignId) -> Option<JoinHandle<()>> {
        let session = self.session.as_ref().filter(|s| &s.tag.campaign == id)?;
        let api = self.api.clone();
        let credential = session.credential.clone();
        let tag = session.tag.clone();
        let tx = self.tx.clone();
        debug!(campaign_id = %id, generation = tag.generation, "immediate stats refresh");
        Some(tokio::spawn(async move {
            fetch_once(api.as_ref(), &credential, &tag, &tx).await;
        }))
    }
}

impl Drop for StatsPoller {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            session.handle.abort();
        }
    }
}

// =============================================================================
// LOOP
// =============================================================================

fn spawn_poll_loop(
    api: Arc<dyn CampaignApi>,
    credential: Credential,
    tag: SessionTag,
    tx: Arc<watch::Sender<StatsView>>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            fetch_once(api.as_ref(), &credential, &tag, &tx).await;
        }
    })
}

/// Fetch once and apply the result if `tag` is still the current session.
/// Returns whether the result was applied.
async fn fetch_once(
    api: &dyn CampaignApi,
    credential: &Credential,
    tag: &SessionTag,
    tx: &watch::Sender<StatsView>,
) -> bool {
    let result = api.campaign_stats(credential, &tag.campaign).await;

    let applied = tx.send_if_modified(|view| {
        if view.session.as_ref() != Some(tag) {
            return false;
        }
        match &result {
            Ok(stats) => {
                view.stats = Some(stats.clone());
                view.last_error = None;
                view.consecutive_failures = 0;
                view.updated_at = Some(now_secs());
            }
            Err(e) => {
                view.last_error = Some(e.to_string());
                view.consecutive_failures = view.consecutive_failures.saturating_add(1);
            }
        }
        true
    });

    if !applied {
        debug!(campaign_id = %tag.campaign, generation = tag.generation, "discarding stale stats response");
    } else if let Err(e) = &result {
        warn!(
            campaign_id = %tag.campaign,
            error = %e,
            code = e.error_code(),
            retryable = e.retryable(),
            "stats fetch failed; keeping last stats"
        );
    }
    applied
}

#[cfg(test)]
#[path = "poller_test.rs"]
mod tests;
