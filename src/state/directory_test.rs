use std::time::Duration;

use super::*;
use crate::test_helpers::{MockApi, campaign, credential};

#[test]
fn directory_defaults() {
    let d = CampaignDirectory::default();
    assert!(d.campaigns().is_empty());
    assert!(d.selected().is_none());
    assert!(!d.is_loading());
    assert!(d.last_error().is_none());
}

#[tokio::test]
async fn refresh_replaces_cache() {
    let api = MockApi::new();
    api.push_campaigns(Ok(vec![campaign(1, "A"), campaign(2, "B")]));
    api.push_campaigns(Ok(vec![campaign(3, "C")]));

    let mut d = CampaignDirectory::new();
    assert_eq!(d.refresh(api.as_ref(), &credential()).await.unwrap(), 2);
    assert_eq!(d.refresh(api.as_ref(), &credential()).await.unwrap(), 1);
    assert_eq!(d.campaigns(), &[campaign(3, "C")]);
    assert!(!d.is_loading());
}

#[tokio::test]
async fn failed_refresh_keeps_stale_cache() {
    let api = MockApi::new();
    api.push_campaigns(Ok(vec![campaign(1, "A")]));
    api.push_campaigns(Err(ApiError::Rejected { status: 500, message: "boom".into() }));

    let mut d = CampaignDirectory::new();
    d.refresh(api.as_ref(), &credential()).await.unwrap();
    let err = d.refresh(api.as_ref(), &credential()).await.unwrap_err();

    assert!(matches!(err, ApiError::Rejected { status: 500, .. }));
    assert_eq!(d.campaigns(), &[campaign(1, "A")]);
    assert_eq!(d.last_error(), Some("HTTP 500: boom"));
    assert!(!d.is_loading());
}

#[tokio::test]
async fn successful_refresh_clears_last_error() {
    let api = MockApi::new();
    api.push_campaigns(Err(ApiError::Transport("offline".into())));
    api.push_campaigns(Ok(vec![campaign(1, "A")]));

    let mut d = CampaignDirectory::new();
    assert!(d.refresh(api.as_ref(), &credential()).await.is_err());
    assert!(d.last_error().is_some());
    d.refresh(api.as_ref(), &credential()).await.unwrap();
    assert!(d.last_error().is_none());
}

#[tokio::test]
async fn select_known_unknown_and_none() {
    let api = MockApi::new();
    api.push_campaigns(Ok(vec![campaign(1, "A"), campaign(2, "B")]));
    let mut d = CampaignDirectory::new();
    d.refresh(api.as_ref(), &credential()).await.unwrap();

    let a = CampaignId::from(1);
    assert_eq!(d.select(Some(a.clone())).unwrap(), Selection::Changed(Some(a.clone())));
    assert_eq!(d.selected().unwrap().name, "A");
    assert_eq!(d.select(Some(a)).unwrap(), Selection::Unchanged);

    let err = d.select(Some(CampaignId::from(9))).unwrap_err();
    assert!(matches!(err, ConsoleError::UnknownCampaign(_)));
    assert_eq!(d.selected().unwrap().name, "A");

    assert_eq!(d.select(None).unwrap(), Selection::Changed(None));
    assert!(d.selected_id().is_none());
    assert_eq!(d.select(None).unwrap(), Selection::Unchanged);
}

#[tokio::test]
async fn selection_becomes_stale_when_campaign_disappears() {
    let api = MockApi::new();
    api.push_campaigns(Ok(vec![campaign(1, "A")]));
    api.push_campaigns(Ok(vec![campaign(2, "B")]));
    let mut d = CampaignDirectory::new();
    d.refresh(api.as_ref(), &credential()).await.unwrap();
    d.select(Some(CampaignId::from(1))).unwrap();
    assert!(!d.selection_is_stale());

    d.refresh(api.as_ref(), &credential()).await.unwrap();
    assert!(d.selection_is_stale());
}

#[tokio::test(start_paused = true)]
async fn cancelled_refresh_lowers_loading_flag() {
    let api = MockApi::new();
    api.push_campaigns(Ok(vec![campaign(1, "A")]));
    let mut d = CampaignDirectory::new();
    d.refresh(api.as_ref(), &credential()).await.unwrap();

    let _gate = api.gate_list();
    let pending = tokio::time::timeout(Duration::from_millis(10), d.refresh(api.as_ref(), &credential())).await;
    assert!(pending.is_err());
    assert!(!d.is_loading());
    assert_eq!(d.campaigns(), &[campaign(1, "A")]);

    api.push_campaigns(Ok(vec![campaign(2, "B")]));
    assert_eq!(d.refresh(api.as_ref(), &credential()).await.unwrap(), 1);
    assert!(!d.is_loading());
}
