use super::{
    apply_overrides, config_from_default_and_params, config_from_overrides, config_from_schema,
    config_from_subnode,
    default_config_from_schema, load_default_config, write_config_from_default_and_params,
    write_default_config, ConfigSource,
};
use crate::defaults::{PARAMETERS_KEY, SCHEMA_KEY};
use crate::dict::SchemaDict;
use crate::error::{ConfigError, Result};
use crate::test_support::write_generic_schema;
use crate::util;
use serde_json::json;

#[test]
fn default_config_can_omit_schema_node() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_generic_schema(dir.path());
    let with = default_config_from_schema(&schema, true).expect("defaults");
    let without = default_config_from_schema(&schema, false).expect("defaults");
    assert!(with[PARAMETERS_KEY].get(SCHEMA_KEY).is_some());
    assert!(without[PARAMETERS_KEY].get(SCHEMA_KEY).is_none());
    assert_eq!(without[PARAMETERS_KEY]["Run_Number"], json!(1));
}

#[test]
fn written_default_config_uses_four_space_sorted_output() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_generic_schema(dir.path());
    let out = dir.path().join("out/default_config.json");
    write_default_config(&schema, &out, false).expect("write");
    let text = std::fs::read_to_string(&out).expect("read");
    assert!(text.starts_with("{\n    \"parameters\": {\n        \"Birth_Rate_Dependence\""));
    assert!(text.ends_with("}\n"));
}

#[test]
fn subnode_configs_are_schema_checked() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_generic_schema(dir.path());
    let mut config = config_from_subnode(&schema, &["idmTypes", "idmType:DoseSchedule"])
        .expect("subnode");
    let parameters = config.child_mut(PARAMETERS_KEY).expect("parameters");
    parameters.set("Dose_Interval", 14).expect("set");
    assert!(parameters.set("Dose_Interval", -3).is_err());

    let err = config_from_subnode(&schema, &["config", "Nope"]).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidArgument(_)));
}

#[test]
fn load_default_config_reports_missing_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = load_default_config(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, ConfigError::ConfigNotFound { .. }));
}

#[test]
fn callback_edits_are_checked_and_finalized_on_write() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_generic_schema(dir.path());
    let defaults = dir.path().join("default_config.json");
    write_default_config(&schema, &defaults, true).expect("defaults");
    let out = dir.path().join("config.json");

    let set_fn = |config: &mut SchemaDict| -> Result<()> {
        let parameters = config.child_mut(PARAMETERS_KEY)?;
        parameters.set("Enable_Interventions", 1)?;
        parameters.set("Run_Number", 9)
    };
    write_config_from_default_and_params(&defaults, Some(&set_fn), &out).expect("config");

    let written = util::read_json(&out).expect("read");
    let parameters = &written[PARAMETERS_KEY];
    assert_eq!(parameters["Run_Number"], json!(9));
    assert_eq!(parameters["Campaign_Filename"], json!("campaign.json"));
    assert!(parameters.get(SCHEMA_KEY).is_none());
    assert!(parameters.get("Default_Geography_Initial_Node_Population").is_none());
}

#[test]
fn callback_errors_propagate() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_generic_schema(dir.path());
    let defaults = dir.path().join("default_config.json");
    write_default_config(&schema, &defaults, true).expect("defaults");

    let set_fn = |config: &mut SchemaDict| -> Result<()> {
        config.child_mut(PARAMETERS_KEY)?.set("Bogus", 1)
    };
    let err = config_from_default_and_params(ConfigSource::Path(&defaults), Some(&set_fn))
        .unwrap_err();
    assert!(matches!(err, ConfigError::SchemaViolation { .. }));
}

#[test]
fn loaded_source_skips_disk() {
    let config = SchemaDict::from_plain(json!({"parameters": {"A": 1}})).expect("config");
    let config =
        config_from_default_and_params(ConfigSource::Loaded(config), None).expect("config");
    assert_eq!(config, json!({"parameters": {"A": 1}}));
}

#[test]
fn overrides_merge_nested_objects() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_generic_schema(dir.path());
    let overrides = dir.path().join("overrides.json");
    util::write_json(
        &overrides,
        &json!({
            "parameters": {
                "Run_Number": 5,
                "Fractional_Dose_Params": {"Fractional_Dose_Schedule": {"Dose_Interval": 7}}
            }
        }),
    )
    .expect("write overrides");

    let config = config_from_overrides(&schema, &overrides).expect("config");
    assert!(config.is_finalized());
    let plain = config.to_plain();
    assert_eq!(plain[PARAMETERS_KEY]["Run_Number"], json!(5));
    assert_eq!(
        plain[PARAMETERS_KEY]["Fractional_Dose_Params"],
        json!({
            "Fractional_Dose_Ages": [],
            "Fractional_Dose_Multiplier": 1,
            "Fractional_Dose_Schedule": {"Dose_Interval": 7}
        })
    );
}

#[test]
fn overrides_respect_write_closure() {
    let mut config =
        SchemaDict::from_plain(json!({"parameters": {"A": 1, "schema": {}}})).expect("config");
    let err = apply_overrides(&mut config, &json!({"parameters": {"B": 2}})).unwrap_err();
    assert!(matches!(err, ConfigError::SchemaViolation { .. }));
    assert!(apply_overrides(&mut config, &json!([1])).is_err());
}

#[test]
fn missing_overrides_file_is_reported() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_generic_schema(dir.path());
    let err = config_from_overrides(&schema, &dir.path().join("none.json")).unwrap_err();
    assert!(matches!(err, ConfigError::ConfigNotFound { .. }));
}

#[test]
fn schema_config_is_finalized_against_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let schema = write_generic_schema(dir.path());
    let config = config_from_schema(&schema).expect("config");
    let parameters = &config.to_plain()[PARAMETERS_KEY];

    assert!(parameters.get(SCHEMA_KEY).is_none());
    assert_eq!(parameters["Incubation_Period_Constant"], json!(6));
    assert!(parameters.get("Incubation_Period_Exponential").is_none());
    assert!(parameters.get("Default_Geography_Initial_Node_Population").is_none());
    assert!(parameters.get("Campaign_Filename").is_none());
    assert_eq!(parameters["Serialization_Mask_Node_Write"], json!(0));
    assert_eq!(parameters["Birth_Rate_Dependence"], json!("FIXED_BIRTH_RATE"));
}
