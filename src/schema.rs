//! Schema index over the engine-published schema document.
//!
//! The document is parsed once and treated as read-only afterwards. Lookups
//! hand out borrowed views (`ParamSpec`) so nothing downstream can mutate it.
use crate::error::{ConfigError, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEPENDS_ON_KEY: &str = "depends-on";
pub const BUILT_IN_EVENTS_KEY: &str = "Built-in";
pub const IDM_TYPE_PREFIX: &str = "idmType:";
pub const ABSTRACT_TYPE_PREFIX: &str = "idmAbstractType:";

const CONFIG_SECTION: &str = "config";
const IDM_TYPES_SECTION: &str = "idmTypes";

#[derive(Debug, Clone)]
pub struct SchemaDocument {
    origin: PathBuf,
    root: Map<String, Value>,
}

impl SchemaDocument {
    /// Read and parse a schema file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(ConfigError::SchemaNotFound {
                path: path.to_path_buf(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|err| ConfigError::io(path, err))?;
        let value: Value = serde_json::from_str(&text).map_err(|err| ConfigError::SchemaParse {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        Self::from_value(value, path)
    }

    /// Build a document from JSON text that did not come from disk.
    pub fn from_json_str(text: &str) -> Result<Self> {
        let origin = Path::new("<memory>");
        let value: Value = serde_json::from_str(text).map_err(|err| ConfigError::SchemaParse {
            path: origin.to_path_buf(),
            reason: err.to_string(),
        })?;
        Self::from_value(value, origin)
    }

    pub fn from_value(value: Value, origin: &Path) -> Result<Self> {
        let parse_error = |reason: &str| ConfigError::SchemaParse {
            path: origin.to_path_buf(),
            reason: reason.to_string(),
        };
        let Value::Object(root) = value else {
            return Err(parse_error("top level is not a JSON object"));
        };
        for section in [CONFIG_SECTION, IDM_TYPES_SECTION] {
            if !root.get(section).is_some_and(Value::is_object) {
                return Err(parse_error(&format!("missing object section '{section}'")));
            }
        }
        Ok(Self {
            origin: origin.to_path_buf(),
            root,
        })
    }

    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn config(&self) -> &Map<String, Value> {
        section(&self.root, CONFIG_SECTION)
    }

    pub fn idm_types(&self) -> &Map<String, Value> {
        section(&self.root, IDM_TYPES_SECTION)
    }

    /// Iterate config groups in key order, skipping anything that is not a group object.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &Map<String, Value>)> {
        self.config()
            .iter()
            .filter_map(|(name, group)| group.as_object().map(|group| (name.as_str(), group)))
    }

    pub fn lookup_group(&self, group_name: &str) -> Option<&Map<String, Value>> {
        self.config().get(group_name).and_then(Value::as_object)
    }

    pub fn lookup_idm_type(&self, type_name: &str) -> Option<&Map<String, Value>> {
        lookup_idm_type_in(self.idm_types(), type_name)
    }

    /// Find a concrete class (campaign event, coordinator, nodeset, intervention)
    /// published under one of the `idmAbstractType:*` sections.
    pub fn lookup_class(&self, class_name: &str) -> Option<&Map<String, Value>> {
        self.idm_types()
            .iter()
            .filter(|(name, _)| name.starts_with(ABSTRACT_TYPE_PREFIX))
            .filter_map(|(_, members)| members.as_object())
            .find_map(|members| members.get(class_name).and_then(Value::as_object))
    }

    /// Resolve a key path from the document root, e.g. `["config", "Drugs"]`.
    pub fn subnode(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut node = self.root.get(*first)?;
        for key in rest {
            node = node.as_object()?.get(*key)?;
        }
        Some(node)
    }

    /// Event names the engine knows natively, taken from the first `Built-in`
    /// list published under `idmTypes`.
    pub fn builtin_events(&self) -> Vec<String> {
        find_key(self.idm_types(), BUILT_IN_EVENTS_KEY)
            .and_then(Value::as_array)
            .map(|events| {
                events
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

fn section<'a>(root: &'a Map<String, Value>, name: &str) -> &'a Map<String, Value> {
    static EMPTY: std::sync::OnceLock<Map<String, Value>> = std::sync::OnceLock::new();
    root.get(name)
        .and_then(Value::as_object)
        .unwrap_or_else(|| EMPTY.get_or_init(Map::new))
}

/// Look up an idmType by exact name, then with the `idmType:` prefix toggled.
pub fn lookup_idm_type_in<'a>(
    idm_types: &'a Map<String, Value>,
    type_name: &str,
) -> Option<&'a Map<String, Value>> {
    let alternate = match type_name.strip_prefix(IDM_TYPE_PREFIX) {
        Some(bare) => bare.to_string(),
        None => format!("{IDM_TYPE_PREFIX}{type_name}"),
    };
    idm_types
        .get(type_name)
        .or_else(|| idm_types.get(&alternate))
        .and_then(Value::as_object)
}

fn find_key<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    if let Some(found) = map.get(key) {
        return Some(found);
    }
    map.values()
        .filter_map(Value::as_object)
        .find_map(|child| find_key(child, key))
}

/// Borrowed view over one parameter's schema entry.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec<'a> {
    raw: &'a Map<String, Value>,
}

impl<'a> ParamSpec<'a> {
    pub fn new(raw: &'a Map<String, Value>) -> Self {
        Self { raw }
    }

    pub fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object().map(Self::new)
    }

    pub fn raw(&self) -> &'a Map<String, Value> {
        self.raw
    }

    pub fn type_tag(&self) -> Option<&'a str> {
        self.raw.get("type").and_then(Value::as_str)
    }

    pub fn default_value(&self) -> Option<&'a Value> {
        self.raw.get("default")
    }

    pub fn is_vector(&self) -> bool {
        self.type_tag().is_some_and(|tag| tag.contains("Vector"))
    }

    pub fn is_abstract_reference(&self) -> bool {
        self.type_tag()
            .is_some_and(|tag| tag.trim_start_matches("Vector ").starts_with(ABSTRACT_TYPE_PREFIX))
    }

    pub fn member_keys(&self) -> impl Iterator<Item = &'a String> {
        self.raw.keys()
    }

    pub fn enum_values(&self) -> Option<Vec<&'a str>> {
        let values = self.raw.get("enum")?.as_array()?;
        Some(values.iter().filter_map(Value::as_str).collect())
    }

    pub fn min(&self) -> Option<f64> {
        self.raw.get("min").and_then(Value::as_f64)
    }

    pub fn max(&self) -> Option<f64> {
        self.raw.get("max").and_then(Value::as_f64)
    }

    pub fn depends_on(&self) -> Option<&'a Map<String, Value>> {
        self.raw.get(DEPENDS_ON_KEY).and_then(Value::as_object)
    }

    fn is_numeric(&self) -> bool {
        matches!(
            self.type_tag().map(str::to_ascii_lowercase).as_deref(),
            Some("float" | "double" | "integer" | "int" | "bool" | "boolean")
        )
    }

    fn is_bool(&self) -> bool {
        matches!(self.type_tag(), Some("bool" | "boolean"))
    }

    /// Enumerations, numbers and strings hold a single value.
    pub fn is_scalar_only(&self) -> bool {
        if self.is_vector() {
            return false;
        }
        if self.enum_values().is_some() || self.is_numeric() {
            return true;
        }
        matches!(self.type_tag(), Some(tag) if tag.eq_ignore_ascii_case("string") || tag == "Constrained String")
    }

    pub fn accepts_sequence(&self) -> bool {
        if self.is_scalar_only() {
            return false;
        }
        match self.type_tag() {
            Some(_) => self.is_vector(),
            None => true,
        }
    }

    pub fn accepts_mapping(&self) -> bool {
        if self.is_scalar_only() {
            return false;
        }
        match self.type_tag() {
            Some(_) => !self.is_vector(),
            None => true,
        }
    }

    /// Enforce the enumeration and numeric bounds this entry declares.
    pub fn check(&self, key: &str, value: &Value) -> Result<()> {
        if let Some(allowed) = self.enum_values() {
            let Some(text) = value.as_str() else {
                return Err(ConfigError::violation(
                    key,
                    format!("expected one of {allowed:?}, got {value}"),
                ));
            };
            if !allowed.contains(&text) {
                return Err(ConfigError::violation(
                    key,
                    format!("'{text}' is not one of {allowed:?}"),
                ));
            }
            return Ok(());
        }
        if !self.is_numeric() {
            return Ok(());
        }
        let Some(number) = numeric_value(value) else {
            return Err(ConfigError::violation(
                key,
                format!("expected a number, got {value}"),
            ));
        };
        if self.is_bool() && number != 0.0 && number != 1.0 {
            return Err(ConfigError::violation(
                key,
                format!("expected 0 or 1, got {value}"),
            ));
        }
        if let Some(min) = self.min().filter(|min| number < *min) {
            return Err(ConfigError::violation(
                key,
                format!("{number} is below minimum {min}"),
            ));
        }
        if let Some(max) = self.max().filter(|max| number > *max) {
            return Err(ConfigError::violation(
                key,
                format!("{number} is above maximum {max}"),
            ));
        }
        Ok(())
    }
}

/// Numeric reading of a JSON scalar; booleans count as 0/1.
pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Single-entry schema cache keyed by path.
///
/// A different path replaces the previous document once it has loaded.
#[derive(Debug, Default)]
pub struct SchemaCache {
    entry: Option<(PathBuf, Arc<SchemaDocument>)>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<SchemaDocument>> {
        if let Some((cached_path, document)) = &self.entry {
            if cached_path == path {
                tracing::debug!(path = %path.display(), "schema cache hit");
                return Ok(Arc::clone(document));
            }
        }
        tracing::debug!(path = %path.display(), "schema cache miss");
        // The previous entry survives a failed load.
        let document = Arc::new(SchemaDocument::load(path)?);
        self.entry = Some((path.to_path_buf(), Arc::clone(&document)));
        Ok(document)
    }

    pub fn current(&self) -> Option<(&Path, &Arc<SchemaDocument>)> {
        self.entry
            .as_ref()
            .map(|(path, document)| (path.as_path(), document))
    }

    pub fn is_cached(&self, path: &Path) -> bool {
        self.entry
            .as_ref()
            .is_some_and(|(cached_path, _)| cached_path == path)
    }

    pub fn invalidate(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
