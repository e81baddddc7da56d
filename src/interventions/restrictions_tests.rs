use super::{normalize, parse_restriction, RestrictionInput, Restrictions};
use crate::dict::SchemaDict;
use crate::error::ConfigError;
use serde_json::json;

fn flat(input: RestrictionInput) -> Vec<String> {
    let restrictions = normalize(&input).expect("normalize");
    assert!(restrictions.within_node.is_empty());
    restrictions.flat
}

#[test]
fn single_mapping_becomes_key_value_string() {
    assert_eq!(flat(("Risk", "High").into()), vec!["Risk:High"]);
}

#[test]
fn equals_and_colon_strings_are_canonicalized() {
    assert_eq!(flat("Risk=High".into()), vec!["Risk:High"]);
    assert_eq!(flat("Risk:High".into()), vec!["Risk:High"]);
    assert_eq!(flat(" Risk = High ".into()), vec!["Risk:High"]);
}

#[test]
fn empty_inputs_yield_nothing() {
    assert!(flat("".into()).is_empty());
    assert!(flat(RestrictionInput::None).is_empty());
    assert!(flat(RestrictionInput::List(Vec::new())).is_empty());
    assert!(RestrictionInput::None.is_empty());
}

#[test]
fn list_holding_one_mapping_is_node_scoped() {
    let input = RestrictionInput::from_json(&json!([{"Risk": "High"}])).expect("input");
    let restrictions = normalize(&input).expect("normalize");
    assert!(restrictions.flat.is_empty());
    assert_eq!(restrictions.within_node.len(), 1);
    assert_eq!(restrictions.within_node[0]["Risk"], json!("High"));

    let bare = RestrictionInput::from_json(&json!({"Risk": "High"})).expect("input");
    assert_eq!(flat(bare), vec!["Risk:High"]);
}

#[test]
fn list_of_mappings_is_node_scoped() {
    let input =
        RestrictionInput::from_json(&json!([{"Thing": "High"}, {"Thing2": "Low"}])).expect("input");
    let restrictions = normalize(&input).expect("normalize");
    assert!(restrictions.flat.is_empty());
    assert_eq!(restrictions.within_node.len(), 2);
    assert_eq!(restrictions.within_node[0]["Thing"], json!("High"));
    assert_eq!(restrictions.within_node[1]["Thing2"], json!("Low"));
}

#[test]
fn mixed_lists_flatten_in_order() {
    let input = RestrictionInput::from_json(&json!(["Risk=High", {"Place": "Urban"}])).expect("input");
    assert_eq!(flat(input), vec!["Risk:High", "Place:Urban"]);
}

#[test]
fn malformed_strings_are_rejected() {
    for text in ["Risk", "=High", "Risk:", "a:b:c"] {
        let err = parse_restriction(text).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidArgument(_)), "{text}");
    }
    assert!(RestrictionInput::from_json(&json!({"Risk": ["High"]})).is_err());
    assert!(RestrictionInput::from_json(&json!(3)).is_err());
}

#[test]
fn apply_writes_within_node_only_when_present() {
    let mut target = SchemaDict::open();
    Restrictions {
        flat: vec!["Risk:High".to_string()],
        within_node: Vec::new(),
    }
    .apply(&mut target)
    .expect("apply");
    assert_eq!(target, json!({"Property_Restrictions": ["Risk:High"]}));
}
