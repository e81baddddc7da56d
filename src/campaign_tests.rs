use super::Campaign;
use crate::dict::SchemaDict;
use crate::error::ConfigError;
use crate::interventions::{
    broadcast_event, scheduled_campaign_event, test_campaign, triggered_campaign_event,
    ScheduledEventArgs, TriggeredEventArgs,
};
use crate::test_support::write_generic_schema;
use serde_json::{json, Value};
use std::path::Path;

fn scheduled_broadcast(campaign: &mut Campaign, event: &str) -> SchemaDict {
    let intervention = broadcast_event(campaign, event).expect("broadcast");
    scheduled_campaign_event(
        campaign,
        ScheduledEventArgs {
            interventions: vec![intervention],
            ..ScheduledEventArgs::default()
        },
    )
    .expect("event")
}

fn triggered_broadcast(campaign: &mut Campaign, triggers: &[&str], event: &str) -> SchemaDict {
    let intervention = broadcast_event(campaign, event).expect("broadcast");
    triggered_campaign_event(
        campaign,
        TriggeredEventArgs {
            event_name: "listener".to_string(),
            triggers: triggers.iter().map(|trigger| trigger.to_string()).collect(),
            interventions: vec![intervention],
            ..TriggeredEventArgs::default()
        },
    )
    .expect("event")
}

#[test]
fn fresh_session_has_no_schema() {
    let campaign = Campaign::new();
    assert!(campaign.get_schema().is_none());
    assert!(matches!(
        campaign.schema().unwrap_err(),
        ConfigError::SchemaNotLoaded
    ));
    assert!(campaign.events().is_empty());
}

#[test]
fn set_schema_reports_missing_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut campaign = Campaign::new();
    let err = campaign
        .set_schema(&dir.path().join("absent.json"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::SchemaNotFound { .. }));
}

#[test]
fn add_records_published_and_subscribed_signals() {
    let (_dir, mut campaign) = test_campaign();
    let scheduled = scheduled_broadcast(&mut campaign, "Vaccinated");
    campaign.add(scheduled).expect("add scheduled");
    let triggered = triggered_broadcast(&mut campaign, &["Vaccinated", "Births"], "Tested");
    campaign.add(triggered).expect("add triggered");

    assert_eq!(campaign.events().len(), 2);
    let published: Vec<&str> = campaign.published().iter().map(String::as_str).collect();
    assert_eq!(published, ["GP_EVENT_000", "GP_EVENT_001"]);
    let subscribed: Vec<&str> = campaign.subscribed().iter().map(String::as_str).collect();
    assert_eq!(subscribed, ["Births", "GP_EVENT_000"]);
    assert_eq!(
        campaign.adhoc_events().get("Tested").map(String::as_str),
        Some("GP_EVENT_001")
    );
}

#[test]
fn no_trigger_is_not_a_signal() {
    let (_dir, mut campaign) = test_campaign();
    let event = triggered_broadcast(&mut campaign, &["Births"], "HappyBirthday");
    campaign.add(event).expect("add");
    assert!(!campaign.published().contains("NoTrigger"));
    assert!(campaign.published().contains("HappyBirthday"));
}

#[test]
fn add_rejects_objects_that_are_not_campaign_events() {
    let (_dir, mut campaign) = test_campaign();
    let intervention = broadcast_event(&mut campaign, "Births").expect("broadcast");
    assert!(matches!(
        campaign.add(intervention).unwrap_err(),
        ConfigError::ShapeViolation(_)
    ));

    let partial =
        SchemaDict::from_plain(json!({"class": "CampaignEvent", "Start_Day": 1})).expect("dict");
    assert!(matches!(
        campaign.add(partial).unwrap_err(),
        ConfigError::ShapeViolation(_)
    ));
    assert!(campaign.events().is_empty());
}

#[test]
fn reset_clears_events_but_keeps_slots() {
    let (_dir, mut campaign) = test_campaign();
    let event = scheduled_broadcast(&mut campaign, "Vaccinated");
    campaign.add(event).expect("add");
    campaign.reset();

    assert!(campaign.events().is_empty());
    assert!(campaign.published().is_empty());
    assert!(campaign.subscribed().is_empty());
    assert!(campaign.get_schema().is_some());
    assert_eq!(campaign.map_trigger("Vaccinated"), "GP_EVENT_000");
    assert_eq!(campaign.map_trigger("Tested"), "GP_EVENT_001");
}

#[test]
fn set_schema_starts_a_new_session() {
    let (dir, mut campaign) = test_campaign();
    let event = scheduled_broadcast(&mut campaign, "Vaccinated");
    campaign.add(event).expect("add");

    let path = write_generic_schema(dir.path());
    campaign.set_schema(&path).expect("set schema again");
    assert_eq!(campaign.get_schema(), Some(path.as_path()));
    assert!(campaign.events().is_empty());
    assert!(campaign.adhoc_events().is_empty());
    assert_eq!(campaign.map_trigger("Tested"), "GP_EVENT_000");
}

#[test]
fn save_writes_events_document() {
    let (dir, mut campaign) = test_campaign();
    let event = scheduled_broadcast(&mut campaign, "Births");
    let expected = event.to_plain();
    campaign.add(event).expect("add");

    let out = dir.path().join("campaign.json");
    campaign.save(&out).expect("save");
    let text = std::fs::read_to_string(&out).expect("read campaign");
    assert!(text.starts_with("{\n    \"Events\": ["));
    assert!(text.ends_with('\n'));

    let saved: Value = serde_json::from_str(&text).expect("parse campaign");
    assert_eq!(saved, json!({"Events": [expected]}));
    assert_eq!(saved, campaign.to_plain());
}

#[test]
fn empty_session_saves_empty_event_list() {
    let dir = tempfile::tempdir().expect("tempdir");
    let out = dir.path().join("campaign.json");
    Campaign::new().save(&out).expect("save");
    let saved: Value =
        serde_json::from_str(&std::fs::read_to_string(&out).expect("read")).expect("parse");
    assert_eq!(saved, json!({"Events": []}));
}

#[test]
fn failed_set_schema_keeps_the_session() {
    let (dir, mut campaign) = test_campaign();
    let loaded = campaign.get_schema().map(Path::to_path_buf);
    let event = scheduled_broadcast(&mut campaign, "Vaccinated");
    campaign.add(event).expect("add");

    let err = campaign
        .set_schema(&dir.path().join("absent.json"))
        .unwrap_err();
    assert!(matches!(err, ConfigError::SchemaNotFound { .. }));
    assert_eq!(campaign.get_schema().map(Path::to_path_buf), loaded);
    assert!(campaign.schema().is_ok());
    assert_eq!(campaign.events().len(), 1);
    assert!(campaign.published().contains("GP_EVENT_000"));
    assert_eq!(campaign.map_trigger("Vaccinated"), "GP_EVENT_000");
}
