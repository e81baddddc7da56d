//! Property restriction normalization.
//!
//! Callers may describe a restriction as a `{key: value}` mapping, a
//! `"key:value"` or `"key=value"` string, or a list of those. Everything ends up
//! either as a flat list of `"key:value"` strings or, for a list of several
//! mappings, as node-scoped restriction objects.
use crate::dict::SchemaDict;
use crate::error::{ConfigError, Result};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const PROPERTY_RESTRICTIONS: &str = "Property_Restrictions";
pub const PROPERTY_RESTRICTIONS_WITHIN_NODE: &str = "Property_Restrictions_Within_Node";

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RestrictionInput {
    #[default]
    None,
    Text(String),
    Pairs(BTreeMap<String, String>),
    List(Vec<RestrictionInput>),
}

impl RestrictionInput {
    /// Interpret caller JSON: null, string, object, or array of those.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Null | Value::Bool(false) => Ok(Self::None),
            Value::String(text) => Ok(Self::Text(text.clone())),
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| Ok((key.clone(), scalar_text(key, value)?)))
                .collect::<Result<BTreeMap<_, _>>>()
                .map(Self::Pairs),
            Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>>>()
                .map(Self::List),
            other => Err(ConfigError::InvalidArgument(format!(
                "unsupported property restriction {other}"
            ))),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::Text(text) => text.trim().is_empty(),
            Self::Pairs(pairs) => pairs.is_empty(),
            Self::List(items) => items.iter().all(Self::is_empty),
        }
    }
}

impl From<&str> for RestrictionInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<(&str, &str)> for RestrictionInput {
    fn from((key, value): (&str, &str)) -> Self {
        Self::Pairs(BTreeMap::from([(key.to_string(), value.to_string())]))
    }
}

impl From<BTreeMap<String, String>> for RestrictionInput {
    fn from(pairs: BTreeMap<String, String>) -> Self {
        Self::Pairs(pairs)
    }
}

/// Canonical restrictions, ready to write onto a coordinator or listener.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Restrictions {
    pub flat: Vec<String>,
    pub within_node: Vec<Map<String, Value>>,
}

impl Restrictions {
    pub fn apply(&self, target: &mut SchemaDict) -> Result<()> {
        target.set(PROPERTY_RESTRICTIONS, self.flat.clone())?;
        if !self.within_node.is_empty() {
            let within_node: Vec<Value> = self
                .within_node
                .iter()
                .cloned()
                .map(Value::Object)
                .collect();
            target.set(PROPERTY_RESTRICTIONS_WITHIN_NODE, within_node)?;
        }
        Ok(())
    }
}

pub fn normalize(input: &RestrictionInput) -> Result<Restrictions> {
    if let RestrictionInput::List(items) = input {
        let all_mappings = items
            .iter()
            .all(|item| matches!(item, RestrictionInput::Pairs(_)));
        // A list made only of mappings is node-scoped; the flat list stays empty.
        if !items.is_empty() && all_mappings {
            let within_node = items
                .iter()
                .filter_map(|item| match item {
                    RestrictionInput::Pairs(pairs) => Some(
                        pairs
                            .iter()
                            .map(|(key, value)| (key.clone(), Value::String(value.clone())))
                            .collect(),
                    ),
                    _ => None,
                })
                .collect();
            return Ok(Restrictions {
                flat: Vec::new(),
                within_node,
            });
        }
    }
    let mut flat = Vec::new();
    flatten(input, &mut flat)?;
    Ok(Restrictions {
        flat,
        within_node: Vec::new(),
    })
}

fn flatten(input: &RestrictionInput, out: &mut Vec<String>) -> Result<()> {
    match input {
        RestrictionInput::None => {}
        RestrictionInput::Text(text) if text.trim().is_empty() => {}
        RestrictionInput::Text(text) => out.push(parse_restriction(text)?),
        RestrictionInput::Pairs(pairs) => {
            out.extend(pairs.iter().map(|(key, value)| format!("{key}:{value}")));
        }
        RestrictionInput::List(items) => {
            for item in items {
                flatten(item, out)?;
            }
        }
    }
    Ok(())
}

/// Canonicalize `"key:value"` or `"key=value"` (surrounding spaces ignored).
pub fn parse_restriction(text: &str) -> Result<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"^\s*([^:=\s][^:=]*?)\s*[:=]\s*([^:=]*?)\s*$")
            .expect("regex for property restrictions")
    });
    let captures = pattern
        .captures(text)
        .filter(|captures| !captures[2].is_empty())
        .ok_or_else(|| {
            ConfigError::InvalidArgument(format!(
                "property restriction '{text}' is not of the form key:value"
            ))
        })?;
    Ok(format!("{}:{}", &captures[1], &captures[2]))
}

fn scalar_text(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        other => Err(ConfigError::InvalidArgument(format!(
            "property restriction '{key}' has non-scalar value {other}"
        ))),
    }
}

#[cfg(test)]
#[path = "restrictions_tests.rs"]
mod tests;
