//! Intervention and campaign-event composers.
pub mod common;
pub mod distributions;
pub mod migration;
pub mod nodes;
pub mod restrictions;

pub use common::{
    broadcast_event, change_individual_property, change_individual_property_at_age,
    change_individual_property_scheduled, change_individual_property_triggered,
    delayed_intervention, multi_intervention_distributor, node_level_health_triggered_iv,
    property_value_changer, scheduled_campaign_event, standard_diagnostic,
    triggered_campaign_delay_event, triggered_campaign_event,
    triggered_campaign_event_with_optional_delay, Blackout, ChangeAtAgeArgs, ChangePropertyArgs,
    DiagnosticArgs, PropertyChangeArgs, ScheduledEventArgs, Targeting, TriggeredEventArgs,
    TriggeredIvArgs,
};
pub use distributions::Distribution;
pub use migration::{new_migration_intervention, MigrationArgs};
pub use nodes::node_set;
pub use restrictions::{normalize, RestrictionInput, Restrictions};

/// Session with the fixture schema loaded; keep the directory alive with it.
#[cfg(test)]
pub(crate) fn test_campaign() -> (tempfile::TempDir, crate::campaign::Campaign) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = crate::test_support::write_generic_schema(dir.path());
    let mut campaign = crate::campaign::Campaign::new();
    campaign.set_schema(&path).expect("set schema");
    (dir, campaign)
}
