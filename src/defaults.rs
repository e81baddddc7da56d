//! Default resolution: walk schema groups (or idmTypes, or classes) and produce
//! fully populated default values plus the schema entries backing them.
//!
//! Everything here is pure over its inputs and returns freshly cloned trees, so
//! repeated calls never share structure.
use crate::error::{ConfigError, Result};
use crate::schema::{lookup_idm_type_in, ParamSpec, SchemaDocument, ABSTRACT_TYPE_PREFIX};
use serde_json::{Map, Value};

pub const PARAMETERS_KEY: &str = "parameters";
pub const SCHEMA_KEY: &str = "schema";
pub const CLASS_KEY: &str = "class";

/// Guards against idmTypes that reference themselves.
const MAX_TYPE_DEPTH: usize = 32;

/// Defaults for one schema section, split into values and their schema entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedSection {
    pub values: Map<String, Value>,
    pub schema: Map<String, Value>,
}

impl ResolvedSection {
    /// Render as a Default Configuration: `{"parameters": {..., "schema": {...}}}`.
    pub fn into_default_config(self) -> Value {
        let mut parameters = self.values;
        parameters.insert(SCHEMA_KEY.to_string(), Value::Object(self.schema));
        let mut root = Map::new();
        root.insert(PARAMETERS_KEY.to_string(), Value::Object(parameters));
        Value::Object(root)
    }
}

/// Resolve a single schema group into a Default Configuration.
pub fn resolve(schema_section: &Map<String, Value>, idm_types: &Map<String, Value>) -> Value {
    resolve_section(schema_section, idm_types).into_default_config()
}

/// Resolve every `config` group of the document into one Default Configuration.
pub fn resolve_all(document: &SchemaDocument) -> Value {
    let mut resolved = ResolvedSection::default();
    for (group_name, group) in document.groups() {
        let before = resolved.values.len();
        resolve_into(&mut resolved, group, document.idm_types(), 0);
        tracing::debug!(
            group = group_name,
            parameters = resolved.values.len() - before,
            "resolved schema group"
        );
    }
    resolved.into_default_config()
}

pub fn resolve_section(
    schema_section: &Map<String, Value>,
    idm_types: &Map<String, Value>,
) -> ResolvedSection {
    let mut resolved = ResolvedSection::default();
    resolve_into(&mut resolved, schema_section, idm_types, 0);
    resolved
}

/// Default value for a custom (idmType) parameter, built with the same rules
/// applied to the members of the named type.
///
/// Abstract types resolve to an empty object: the caller has to pick the
/// concrete class.
pub fn get_default_for_complex_type(idm_types: &Map<String, Value>, type_reference: &str) -> Value {
    complex_default(idm_types, type_reference, 0)
}

/// Defaults for a concrete class (e.g. `BroadcastEvent`), with its `class` marker set.
pub fn class_defaults(document: &SchemaDocument, class_name: &str) -> Result<ResolvedSection> {
    let members = document
        .lookup_class(class_name)
        .ok_or_else(|| ConfigError::UnknownClass(class_name.to_string()))?;
    let mut resolved = resolve_section(members, document.idm_types());
    resolved.values.insert(
        CLASS_KEY.to_string(),
        Value::String(class_name.to_string()),
    );
    Ok(resolved)
}

fn complex_default(idm_types: &Map<String, Value>, type_reference: &str, depth: usize) -> Value {
    if type_reference.starts_with(ABSTRACT_TYPE_PREFIX) {
        return Value::Object(Map::new());
    }
    if depth > MAX_TYPE_DEPTH {
        tracing::warn!(type_reference, "idmType nesting too deep; using empty default");
        return Value::Object(Map::new());
    }
    let Some(members) = lookup_idm_type_in(idm_types, type_reference) else {
        tracing::warn!(type_reference, "unresolved idmType reference; using empty default");
        return Value::Object(Map::new());
    };
    let mut resolved = ResolvedSection::default();
    resolve_into(&mut resolved, members, idm_types, depth + 1);
    Value::Object(resolved.values)
}

fn resolve_into(
    resolved: &mut ResolvedSection,
    schema_section: &Map<String, Value>,
    idm_types: &Map<String, Value>,
    depth: usize,
) {
    for (param, raw) in schema_section {
        if param == CLASS_KEY {
            continue;
        }
        let Some(spec) = ParamSpec::from_value(raw) else {
            tracing::debug!(param = param.as_str(), "skipping non-object schema entry");
            continue;
        };

        if let Some(default) = spec.default_value() {
            resolved.values.insert(param.clone(), default.clone());
            resolved.schema.insert(param.clone(), raw.clone());
        } else if spec.is_vector() {
            resolved.values.insert(param.clone(), Value::Array(Vec::new()));
            resolved.schema.insert(param.clone(), raw.clone());
        } else {
            let keys: Vec<&String> = spec.member_keys().collect();
            if let [only_key] = keys.as_slice() {
                // Single-branch entry: descend one level and use that branch as the spec.
                resolved
                    .values
                    .insert(param.clone(), Value::Object(Map::new()));
                resolved
                    .schema
                    .insert(param.clone(), raw[only_key.as_str()].clone());
            } else {
                let default = match spec.type_tag() {
                    Some(type_reference) => complex_default(idm_types, type_reference, depth),
                    None => Value::Object(Map::new()),
                };
                resolved.values.insert(param.clone(), default);
                resolved.schema.insert(param.clone(), raw.clone());
            }
        }
    }
}

#[cfg(test)]
#[path = "defaults_tests.rs"]
mod tests;
