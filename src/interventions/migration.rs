use super::common::new_object;
use super::distributions::Distribution;
use crate::campaign::Campaign;
use crate::dict::SchemaDict;
use crate::error::Result;

pub const MIGRATE_INDIVIDUALS: &str = "MigrateIndividuals";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationArgs {
    pub node_id_to_migrate_to: u32,
    pub duration_before_leaving: Option<Distribution>,
    pub duration_at_node: Option<Distribution>,
    pub is_moving: bool,
}

/// Send individuals to another node, optionally after a wait and for a stay.
pub fn new_migration_intervention(campaign: &mut Campaign, args: MigrationArgs) -> Result<SchemaDict> {
    let mut migration = new_object(campaign, MIGRATE_INDIVIDUALS)?;
    migration.set("NodeID_To_Migrate_To", args.node_id_to_migrate_to)?;
    migration.set("Is_Moving", i64::from(args.is_moving))?;
    if let Some(duration) = args.duration_before_leaving {
        duration.apply(&mut migration, "Duration_Before_Leaving")?;
    }
    if let Some(duration) = args.duration_at_node {
        duration.apply(&mut migration, "Duration_At_Node")?;
    }
    Ok(migration)
}
