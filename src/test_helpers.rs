//! Scripted backend used by controller, poller and dispatch tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tokio::sync::Notify;

use crate::api::CampaignApi;
use crate::api::types::{ApiError, Campaign, CampaignDraft, CampaignId, CampaignStats, Recipients};
use crate::auth::Credential;

#[derive(Default)]
pub(crate) struct MockApi {
    campaigns: Mutex<VecDeque<Result<Vec<Campaign>, ApiError>>>,
    stats: Mutex<HashMap<CampaignId, VecDeque<Result<CampaignStats, ApiError>>>>,
    stats_gates: Mutex<HashMap<CampaignId, Arc<Notify>>>,
    stats_calls: Mutex<Vec<CampaignId>>,
    send_results: Mutex<VecDeque<Result<Value, ApiError>>>,
    send_gate: Mutex<Option<Arc<Notify>>>,
    send_entered: Notify,
    send_calls: Mutex<Vec<(CampaignId, Recipients)>>,
    create_results: Mutex<VecDeque<Result<Value, ApiError>>>,
    create_calls: Mutex<Vec<CampaignDraft>>,
    list_calls: Mutex<usize>,
    list_gate: Mutex<Option<Arc<Notify>>>,
}

impl MockApi {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn push_campaigns(&self, result: Result<Vec<Campaign>, ApiError>) {
        self.campaigns.lock().unwrap().push_back(result);
    }

    pub(crate) fn push_stats(&self, id: &CampaignId, result: Result<CampaignStats, ApiError>) {
        self.stats
            .lock()
            .unwrap()
            .entry(id.clone())
            .or_default()
            .push_back(result);
    }

    /// Hold the next stats call for `id` until the returned gate is notified.
    pub(crate) fn gate_stats(&self, id: &CampaignId) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.stats_gates.lock().unwrap().insert(id.clone(), gate.clone());
        gate
    }

    pub(crate) fn stats_calls(&self) -> Vec<CampaignId> {
        self.stats_calls.lock().unwrap().clone()
    }

    pub(crate) fn push_send(&self, result: Result<Value, ApiError>) {
        self.send_results.lock().unwrap().push_back(result);
    }

    /// Hold every send until the returned gate is notified.
    pub(crate) fn gate_send(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.send_gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Resolves once a send call has started.
    pub(crate) async fn send_started(&self) {
        self.send_entered.notified().await;
    }

    pub(crate) fn send_calls(&self) -> Vec<(CampaignId, Recipients)> {
        self.send_calls.lock().unwrap().clone()
    }

    pub(crate) fn push_create(&self, result: Result<Value, ApiError>) {
        self.create_results.lock().unwrap().push_back(result);
    }

    pub(crate) fn create_calls(&self) -> Vec<CampaignDraft> {
        self.create_calls.lock().unwrap().clone()
    }

    pub(crate) fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }

    /// Hold the next campaign list call until the returned gate is notified.
    pub(crate) fn gate_list(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.list_gate.lock().unwrap() = Some(gate.clone());
        gate
    }
}

#[async_trait::async_trait]
impl CampaignApi for MockApi {
    async fn login(&self, username: &str, _password: &str) -> Result<Credential, ApiError> {
        Ok(Credential::new(format!("token-for-{username}")))
    }

    async fn list_campaigns(&self, credential: &Credential) -> Result<Vec<Campaign>, ApiError> {
        credential.bearer()?;
        *self.list_calls.lock().unwrap() += 1;
        let gate = self.list_gate.lock().unwrap().take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.campaigns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn get_campaign(&self, credential: &Credential, id: &CampaignId) -> Result<Campaign, ApiError> {
        credential.bearer()?;
        Ok(Campaign { id: id.clone(), name: format!("Campaign {id}") })
    }

    async fn campaign_stats(&self, credential: &Credential, id: &CampaignId) -> Result<CampaignStats, ApiError> {
        credential.bearer()?;
        self.stats_calls.lock().unwrap().push(id.clone());
        let gate = self.stats_gates.lock().unwrap().remove(id);
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.stats
            .lock()
            .unwrap()
            .get_mut(id)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| Err(ApiError::Transport("no scripted stats".into())))
    }

    async fn send_campaign(
        &self,
        credential: &Credential,
        id: &CampaignId,
        recipients: &Recipients,
    ) -> Result<Value, ApiError> {
        credential.bearer()?;
        self.send_calls
            .lock()
            .unwrap()
            .push((id.clone(), recipients.clone()));
        self.send_entered.notify_one();
        let gate = self.send_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.send_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({ "status": "success" })))
    }

    async fn create_campaign(&self, credential: &Credential, draft: &CampaignDraft) -> Result<Value, ApiError> {
        credential.bearer()?;
        self.create_calls.lock().unwrap().push(draft.clone());
        self.create_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({ "id": 99 })))
    }

    async fn ping(&self) -> Result<Value, ApiError> {
        Ok(json!({ "status": "ok" }))
    }
}

pub(crate) fn campaign(id: u64, name: &str) -> Campaign {
    Campaign { id: CampaignId::from(id), name: name.to_owned() }
}

pub(crate) fn stats(total: u64) -> CampaignStats {
    CampaignStats { total, ..CampaignStats::default() }
}

pub(crate) fn credential() -> Credential {
    Credential::new("test-token")
}
