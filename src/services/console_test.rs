use super::*;
use crate::api::types::{ApiError, Recipients};
use crate::error::ValidationError;
use crate::state::contacts::ContactField;
use crate::state::template::{MessageKind, TemplateField};
use crate::test_helpers::{MockApi, campaign, credential, stats};

const PERIOD: Duration = Duration::from_secs(60);

async fn console_with(api: &Arc<MockApi>, campaigns: &[(u64, &str)]) -> CampaignConsole {
    api.push_campaigns(Ok(campaigns.iter().map(|(id, name)| campaign(*id, name)).collect()));
    let mut console = CampaignConsole::new(api.clone(), credential(), PERIOD);
    console.refresh_campaigns().await.unwrap();
    console
}

async fn settle(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}

fn compose_scenario(console: &mut CampaignConsole) {
    console.open_compose();
    let contacts = console.contacts_mut();
    contacts.add_manual_contact();
    contacts.update_manual_contact(0, ContactField::Number, "9000000001");
    contacts.update_manual_contact(1, ContactField::Number, "9000000002");
    let template = console.template_mut();
    template.set_variant(MessageKind::Text);
    template.set_field(TemplateField::Body, "Hello").unwrap();
}

// =============================================================================
// selection drives polling
// =============================================================================

#[tokio::test(start_paused = true)]
async fn selecting_campaign_starts_polling() {
    let api = MockApi::new();
    let id = CampaignId::from(3);
    api.push_stats(&id, Ok(stats(12)));
    let mut console = console_with(&api, &[(3, "Launch")]).await;

    assert_eq!(console.select(Some(id.clone())).unwrap(), Selection::Changed(Some(id.clone())));
    assert!(console.is_polling());
    settle(1).await;

    assert_eq!(api.stats_calls(), vec![id.clone()]);
    assert_eq!(console.stats().stats.map(|s| s.total), Some(12));
    assert_eq!(console.stats().campaign(), Some(&id));
}

#[tokio::test(start_paused = true)]
async fn reselecting_active_campaign_keeps_session() {
    let api = MockApi::new();
    let id = CampaignId::from(3);
    let mut console = console_with(&api, &[(3, "Launch")]).await;
    console.select(Some(id.clone())).unwrap();
    let before = console.stats().session;
    settle(1).await;

    assert_eq!(console.select(Some(id)).unwrap(), Selection::Unchanged);
    assert_eq!(console.stats().session, before);
    settle(1).await;
    assert_eq!(api.stats_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn deselecting_stops_fetches() {
    let api = MockApi::new();
    let mut console = console_with(&api, &[(3, "Launch")]).await;
    console.select(Some(CampaignId::from(3))).unwrap();
    settle(1).await;
    assert_eq!(api.stats_calls().len(), 1);

    console.select(None).unwrap();
    assert!(!console.is_polling());
    settle(600).await;
    assert_eq!(api.stats_calls().len(), 1);
}

#[tokio::test]
async fn unknown_campaign_leaves_session_alone() {
    let api = MockApi::new();
    let mut console = console_with(&api, &[(3, "Launch")]).await;
    console.select(Some(CampaignId::from(3))).unwrap();

    let err = console.select(Some(CampaignId::from(4))).unwrap_err();
    assert_eq!(err.error_code(), "E_UNKNOWN_CAMPAIGN");
    assert_eq!(console.stats().campaign(), Some(&CampaignId::from(3)));
    console.shutdown();
}

#[tokio::test(start_paused = true)]
async fn vanished_selection_is_cleared_on_reload() {
    let api = MockApi::new();
    let mut console = console_with(&api, &[(3, "Launch"), (4, "Promo")]).await;
    console.select(Some(CampaignId::from(3))).unwrap();
    settle(1).await;

    api.push_campaigns(Ok(vec![campaign(4, "Promo")]));
    assert_eq!(console.refresh_campaigns().await.unwrap(), 1);
    assert!(console.directory().selected_id().is_none());
    assert!(!console.is_polling());
}

#[tokio::test(start_paused = true)]
async fn failed_reload_keeps_selection_and_session() {
    let api = MockApi::new();
    let mut console = console_with(&api, &[(3, "Launch")]).await;
    console.select(Some(CampaignId::from(3))).unwrap();

    api.push_campaigns(Err(ApiError::Transport("offline".into())));
    assert!(console.refresh_campaigns().await.is_err());
    assert_eq!(console.directory().campaigns().len(), 1);
    assert!(console.is_polling());
}

// =============================================================================
// dispatch
// =============================================================================

#[tokio::test(start_paused = true)]
async fn successful_dispatch_resets_and_refreshes() {
    let api = MockApi::new();
    let id = CampaignId::from(7);
    api.push_stats(&id, Ok(stats(1)));
    api.push_stats(&id, Ok(stats(2)));
    let mut console = console_with(&api, &[(7, "Festive")]).await;
    console.select(Some(id.clone())).unwrap();
    settle(1).await;

    compose_scenario(&mut console);
    let receipt = console.submit().await.unwrap();

    assert_eq!(
        api.send_calls(),
        vec![(
            id.clone(),
            Recipients::Manual([("91", "9000000001"), ("91", "9000000002")].into_iter().collect())
        )]
    );
    assert_eq!(console.contacts(), &ContactSet::default());
    assert_eq!(console.template(), &TemplateBuilder::default());
    assert!(!console.is_compose_open());

    receipt.refresh.unwrap().await.unwrap();
    assert_eq!(api.stats_calls(), vec![id.clone(), id]);
    assert_eq!(console.stats().stats.map(|s| s.total), Some(2));
}

#[tokio::test(start_paused = true)]
async fn failed_dispatch_keeps_compose_state() {
    let api = MockApi::new();
    api.push_send(Err(ApiError::Rejected { status: 500, message: "queue down".into() }));
    let mut console = console_with(&api, &[(7, "Festive")]).await;
    console.select(Some(CampaignId::from(7))).unwrap();
    compose_scenario(&mut console);
    let contacts = console.contacts().clone();
    let template = console.template().clone();

    let err = console.submit().await.unwrap_err();
    assert_eq!(err.to_string(), "HTTP 500: queue down");
    assert!(err.retryable());
    assert_eq!(console.contacts(), &contacts);
    assert_eq!(console.template(), &template);
    assert!(console.is_compose_open());

    console.submit().await.unwrap();
    assert_eq!(api.send_calls().len(), 2);
}

#[tokio::test]
async fn dispatch_without_selection_is_validation_error() {
    let api = MockApi::new();
    let mut console = console_with(&api, &[(7, "Festive")]).await;
    compose_scenario(&mut console);

    let err = console.submit().await.unwrap_err();
    assert!(matches!(err, ConsoleError::Validation(ValidationError::NoCampaignSelected)));
    assert!(api.send_calls().is_empty());
    assert!(console.is_compose_open());
}

// =============================================================================
// template save
// =============================================================================

#[tokio::test]
async fn save_template_posts_draft_and_reloads_directory() {
    let api = MockApi::new();
    let mut console = console_with(&api, &[(1, "Old")]).await;
    console.open_compose();
    console.template_mut().set_name("Diwali Offer");
    console.template_mut().set_variant(MessageKind::Text);
    console.template_mut().set_field(TemplateField::Body, "Hello").unwrap();
    api.push_campaigns(Ok(vec![campaign(1, "Old"), campaign(99, "Diwali Offer")]));

    let response = console.save_template().await.unwrap();

    assert_eq!(response["id"], serde_json::json!(99));
    let drafts = api.create_calls();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].name, "Diwali Offer");
    assert_eq!(drafts[0].category, MessageKind::Text);
    assert_eq!(drafts[0].text, "Hello");
    assert_eq!(console.template(), &TemplateBuilder::default());
    assert!(!console.is_compose_open());
    assert_eq!(api.list_calls(), 2);
    assert_eq!(console.directory().campaigns().len(), 2);
}

#[tokio::test]
async fn save_template_requires_name_and_kind() {
    let api = MockApi::new();
    let mut console = console_with(&api, &[]).await;
    console.open_compose();

    let err = console.save_template().await.unwrap_err();
    assert!(matches!(err, ConsoleError::Validation(ValidationError::MissingCampaignName)));

    console.template_mut().set_name("Promo");
    let err = console.save_template().await.unwrap_err();
    assert!(matches!(err, ConsoleError::Validation(ValidationError::MissingMessageKind)));
    assert!(api.create_calls().is_empty());
    assert_eq!(console.template().name(), "Promo");
}

#[tokio::test]
async fn rejected_save_keeps_builder() {
    let api = MockApi::new();
    api.push_create(Err(ApiError::Rejected { status: 400, message: "duplicate name".into() }));
    let mut console = console_with(&api, &[]).await;
    console.open_compose();
    console.template_mut().set_name("Promo");
    console.template_mut().set_variant(MessageKind::Button);
    console.template_mut().append_button();

    assert!(console.save_template().await.is_err());
    assert_eq!(console.template().buttons().len(), 1);
    assert!(console.is_compose_open());
    assert_eq!(api.list_calls(), 1);
}

// =============================================================================
// lifecycle
// =============================================================================

#[test]
fn compose_dialog_open_and_close_reset_state() {
    let api = MockApi::new();
    let mut console = CampaignConsole::new(api, credential(), PERIOD);
    console.open_compose();
    console.contacts_mut().add_manual_contact();
    console.template_mut().set_name("draft");
    assert!(console.is_compose_open());

    console.close_compose();
    assert!(!console.is_compose_open());
    assert_eq!(console.contacts(), &ContactSet::default());
    assert_eq!(console.template().name(), "");

    console.contacts_mut().add_manual_contact();
    console.open_compose();
    assert_eq!(console.contacts().entries().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_polling() {
    let api = MockApi::new();
    let mut console = console_with(&api, &[(3, "Launch")]).await;
    console.select(Some(CampaignId::from(3))).unwrap();
    settle(1).await;

    console.shutdown();
    console.shutdown();
    assert!(!console.is_polling());
    settle(600).await;
    assert_eq!(api.stats_calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn new_credential_restarts_active_session() {
    let api = MockApi::new();
    let mut console = console_with(&api, &[(3, "Launch")]).await;
    console.select(Some(CampaignId::from(3))).unwrap();
    let before = console.stats().session.unwrap();
    settle(1).await;

    console.set_credential(Credential::new("fresh"));
    let after = console.stats().session.unwrap();
    assert_eq!(after.campaign, before.campaign);
    assert!(after.generation > before.generation);
    settle(1).await;
    assert_eq!(api.stats_calls().len(), 2);
}
