//! Schema-backed configuration objects.
//!
//! A `SchemaDict` is one level of a config or campaign object: its values and,
//! when known, the schema entries for the keys that may legally appear there.
//! Writes are closed-world once construction is over, scalar writes are range
//! and enum checked, and `finalize` purges parameters whose enabler is off.
use crate::defaults::{class_defaults, ResolvedSection, SCHEMA_KEY};
use crate::error::{ConfigError, Result};
use crate::schema::{numeric_value, ParamSpec, SchemaDocument, ABSTRACT_TYPE_PREFIX};
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

/// One value inside a schema-backed object.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Value),
    Sequence(Vec<Node>),
    Mapping(SchemaDict),
}

impl Node {
    /// Wrap plain JSON literally: objects become schema-less mappings.
    pub fn from_plain(value: Value) -> Self {
        match value {
            Value::Array(items) => Node::Sequence(items.into_iter().map(Node::from_plain).collect()),
            Value::Object(map) => {
                let mut dict = SchemaDict::open();
                for (key, value) in map {
                    dict.values.insert(key, Node::from_plain(value));
                }
                dict.seal();
                Node::Mapping(dict)
            }
            scalar => Node::Scalar(scalar),
        }
    }

    pub fn to_plain(&self) -> Value {
        match self {
            Node::Scalar(value) => value.clone(),
            Node::Sequence(items) => Value::Array(items.iter().map(Node::to_plain).collect()),
            Node::Mapping(dict) => dict.to_plain(),
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Node::Scalar(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_dict(&self) -> Option<&SchemaDict> {
        match self {
            Node::Mapping(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut SchemaDict> {
        match self {
            Node::Mapping(dict) => Some(dict),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Node]> {
        match self {
            Node::Sequence(items) => Some(items),
            _ => None,
        }
    }

    fn purge(&mut self, scopes: &mut Vec<Scope>) {
        match self {
            Node::Scalar(_) => {}
            Node::Sequence(items) => {
                for item in items {
                    item.purge(scopes);
                }
            }
            Node::Mapping(dict) => {
                if !dict.finalized {
                    dict.purge(scopes);
                }
            }
        }
    }
}

impl From<SchemaDict> for Node {
    fn from(dict: SchemaDict) -> Self {
        Node::Mapping(dict)
    }
}

impl From<Vec<SchemaDict>> for Node {
    fn from(dicts: Vec<SchemaDict>) -> Self {
        Node::Sequence(dicts.into_iter().map(Node::Mapping).collect())
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        Node::from_plain(value)
    }
}

/// Where a level's schema came from; only embedded schemas are echoed by `to_plain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchemaOrigin {
    Embedded,
    Attached,
}

/// What one enclosing level exposes to its children while purging: its scalar
/// values and the keys it dropped.
#[derive(Debug)]
struct Scope {
    values: BTreeMap<String, Value>,
    disabled: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaDict {
    schema: Option<Map<String, Value>>,
    origin: SchemaOrigin,
    values: BTreeMap<String, Node>,
    open: bool,
    finalized: bool,
}

impl SchemaDict {
    /// An empty object in construction mode: any key may be written until `seal`.
    pub fn open() -> Self {
        Self {
            schema: None,
            origin: SchemaOrigin::Attached,
            values: BTreeMap::new(),
            open: true,
            finalized: false,
        }
    }

    /// Leave construction mode; from here on only known keys may be written.
    pub fn seal(&mut self) {
        self.open = false;
    }

    /// Wrap a resolved section, keeping its schema for validation without echoing it.
    pub fn with_schema(section: ResolvedSection) -> Self {
        let mut dict = Self::open();
        for (key, value) in section.values {
            dict.values.insert(key, Node::from_plain(value));
        }
        dict.schema = Some(section.schema);
        dict.seal();
        dict
    }

    /// A concrete class object (intervention, coordinator, nodeset, event) seeded
    /// with its schema defaults.
    pub fn for_class(document: &SchemaDocument, class_name: &str) -> Result<Self> {
        Ok(Self::with_schema(class_defaults(document, class_name)?))
    }

    /// Build a schema-aware tree from a Default Configuration.
    ///
    /// Every level carrying a `schema` sub-map uses it as its backing schema;
    /// nested objects typed by an idmType get that type's members as schema.
    pub fn from_default(default_config: Value, document: &SchemaDocument) -> Result<Self> {
        let Value::Object(map) = default_config else {
            return Err(ConfigError::InvalidArgument(
                "default config must be a JSON object".to_string(),
            ));
        };
        Ok(build(map, Some(document), None))
    }

    /// Like `from_default` for trees that arrive without the schema document,
    /// e.g. a default config read back from disk. Embedded `schema` sub-maps still apply.
    pub fn from_plain(value: Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(ConfigError::InvalidArgument(
                "config must be a JSON object".to_string(),
            ));
        };
        Ok(build(map, None, None))
    }

    pub fn get(&self, key: &str) -> Option<&Node> {
        self.values.get(key)
    }

    /// Scalar value for `key`, if the key holds a scalar.
    pub fn value(&self, key: &str) -> Option<&Value> {
        self.values.get(key).and_then(Node::as_scalar)
    }

    /// Walk nested mappings by key.
    pub fn get_path(&self, path: &[&str]) -> Option<&Node> {
        let (last, parents) = path.split_last()?;
        let mut dict = self;
        for key in parents {
            dict = dict.child(key)?;
        }
        dict.get(last)
    }

    pub fn child(&self, key: &str) -> Option<&SchemaDict> {
        self.values.get(key).and_then(Node::as_dict)
    }

    /// Mutable access to a nested object; writes through it stay schema-checked
    /// at the nested level.
    pub fn child_mut(&mut self, key: &str) -> Result<&mut SchemaDict> {
        if self.finalized {
            return Err(ConfigError::AlreadyFinalized);
        }
        self.values
            .get_mut(key)
            .and_then(Node::as_dict_mut)
            .ok_or_else(|| ConfigError::violation(key, "not a nested object"))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.values.iter().map(|(key, node)| (key.as_str(), node))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn backing_schema(&self) -> Option<&Map<String, Value>> {
        self.schema.as_ref()
    }

    pub fn param_spec(&self, key: &str) -> Option<ParamSpec<'_>> {
        self.schema
            .as_ref()
            .and_then(|schema| schema.get(key))
            .and_then(ParamSpec::from_value)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Schema-checked write of a plain JSON value.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        self.set_node(key, Node::from_plain(value.into()))
    }

    /// Schema-checked write of a node, typically a nested schema-backed object.
    pub fn set_node(&mut self, key: &str, node: impl Into<Node>) -> Result<()> {
        if self.finalized {
            return Err(ConfigError::AlreadyFinalized);
        }
        let node = node.into();
        self.check_write(key, &node)?;
        self.values.insert(key.to_string(), node);
        Ok(())
    }

    fn check_write(&self, key: &str, node: &Node) -> Result<()> {
        let in_schema = self
            .schema
            .as_ref()
            .is_some_and(|schema| schema.contains_key(key));
        if !self.open && !in_schema && !self.values.contains_key(key) {
            let known: Vec<&str> = self.keys().collect();
            return Err(ConfigError::violation(
                key,
                format!("not a parameter of this object (known keys: {known:?})"),
            ));
        }
        let Some(spec) = self.param_spec(key) else {
            return Ok(());
        };
        match node {
            Node::Scalar(value) => spec.check(key, value),
            Node::Sequence(_) if !spec.accepts_sequence() => Err(ConfigError::violation(
                key,
                format!("expected a single {} value, got a list", type_name(&spec)),
            )),
            Node::Mapping(_) if !spec.accepts_mapping() => Err(ConfigError::violation(
                key,
                format!("expected a {} value, got an object", type_name(&spec)),
            )),
            _ => Ok(()),
        }
    }

    /// Purge parameters whose enabler is not set to an enabling value, then drop
    /// schema bookkeeping. Single use per object.
    pub fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Err(ConfigError::AlreadyFinalized);
        }
        let mut scopes = Vec::new();
        self.purge(&mut scopes);
        Ok(())
    }

    fn purge(&mut self, scopes: &mut Vec<Scope>) {
        let disabled = self.disabled_parameters(scopes);
        for key in &disabled {
            tracing::debug!(parameter = key.as_str(), "purging parameter with disabled enabler");
            self.values.remove(key);
        }
        self.schema = None;
        self.finalized = true;
        scopes.push(Scope {
            values: self.scalar_scope(),
            disabled,
        });
        for node in self.values.values_mut() {
            node.purge(scopes);
        }
        scopes.pop();
    }

    /// Keys to drop at this level. Iterates to a fixpoint so a parameter whose
    /// enabler was itself dropped goes too.
    fn disabled_parameters(&self, scopes: &[Scope]) -> BTreeSet<String> {
        let mut disabled = BTreeSet::new();
        let Some(schema) = &self.schema else {
            return disabled;
        };
        loop {
            let mut changed = false;
            for key in self.values.keys() {
                if disabled.contains(key) {
                    continue;
                }
                let Some(depends_on) = schema
                    .get(key)
                    .and_then(ParamSpec::from_value)
                    .and_then(|spec| spec.depends_on())
                else {
                    continue;
                };
                let enabled = depends_on.iter().all(|(enabler, enabling)| {
                    self.enabler_satisfied(enabler, enabling, &disabled, scopes)
                });
                if !enabled {
                    disabled.insert(key.clone());
                    changed = true;
                }
            }
            if !changed {
                return disabled;
            }
        }
    }

    fn enabler_satisfied(
        &self,
        enabler: &str,
        enabling: &Value,
        disabled: &BTreeSet<String>,
        scopes: &[Scope],
    ) -> bool {
        if disabled.contains(enabler) {
            return false;
        }
        match self.values.get(enabler) {
            Some(Node::Scalar(current)) => return enabling_matches(enabling, current),
            Some(_) => return true,
            None => {}
        }
        // Nearest enclosing level that knows the enabler decides.
        for scope in scopes.iter().rev() {
            if let Some(current) = scope.values.get(enabler) {
                return enabling_matches(enabling, current);
            }
            if scope.disabled.contains(enabler) {
                return false;
            }
        }
        // Enablers unknown at every level never disable anything.
        true
    }

    fn scalar_scope(&self) -> BTreeMap<String, Value> {
        self.values
            .iter()
            .filter_map(|(key, node)| node.as_scalar().map(|value| (key.clone(), value.clone())))
            .collect()
    }

    /// Plain JSON tree without wrapper identity. Before finalize an embedded
    /// schema is echoed under `schema`.
    pub fn to_plain(&self) -> Value {
        let mut map = Map::new();
        for (key, node) in &self.values {
            map.insert(key.clone(), node.to_plain());
        }
        if !self.finalized && self.origin == SchemaOrigin::Embedded {
            if let Some(schema) = &self.schema {
                map.insert(SCHEMA_KEY.to_string(), Value::Object(schema.clone()));
            }
        }
        Value::Object(map)
    }

    /// True when every key of `candidate` is present here with an equal value.
    pub fn contains(&self, candidate: &Value) -> bool {
        let (Value::Object(plain), Value::Object(candidate)) = (self.to_plain(), candidate) else {
            return false;
        };
        candidate
            .iter()
            .all(|(key, value)| plain.get(key) == Some(value))
    }
}

impl PartialEq<Value> for SchemaDict {
    fn eq(&self, other: &Value) -> bool {
        &self.to_plain() == other
    }
}

impl Serialize for SchemaDict {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_plain().serialize(serializer)
    }
}

fn build(
    mut map: Map<String, Value>,
    document: Option<&SchemaDocument>,
    inherited: Option<Map<String, Value>>,
) -> SchemaDict {
    let mut dict = SchemaDict::open();
    match map.remove(SCHEMA_KEY) {
        Some(Value::Object(schema)) => {
            dict.schema = Some(schema);
            dict.origin = SchemaOrigin::Embedded;
        }
        Some(other) => {
            map.insert(SCHEMA_KEY.to_string(), other);
            dict.schema = inherited;
        }
        None => dict.schema = inherited,
    }
    for (key, value) in map {
        let node = match value {
            Value::Object(child) => {
                let child_schema = document.and_then(|document| idm_schema_for(&dict, &key, document));
                Node::Mapping(build(child, document, child_schema))
            }
            Value::Array(items) => Node::Sequence(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::Object(child) => Node::Mapping(build(child, document, None)),
                        other => Node::from_plain(other),
                    })
                    .collect(),
            ),
            scalar => Node::Scalar(scalar),
        };
        dict.values.insert(key, node);
    }
    dict.seal();
    dict
}

/// Members of the idmType named by `key`'s schema entry, minus the class marker.
fn idm_schema_for(
    parent: &SchemaDict,
    key: &str,
    document: &SchemaDocument,
) -> Option<Map<String, Value>> {
    let type_reference = parent.param_spec(key)?.type_tag()?;
    if type_reference.starts_with(ABSTRACT_TYPE_PREFIX) {
        return None;
    }
    let mut members = document.lookup_idm_type(type_reference)?.clone();
    members.remove(crate::defaults::CLASS_KEY);
    Some(members)
}

fn type_name<'a>(spec: &ParamSpec<'a>) -> &'a str {
    spec.type_tag().unwrap_or("untyped")
}

/// Does the enabler's current value satisfy the enabling value(s)?
///
/// Strings may list several enabling values separated by commas.
fn enabling_matches(enabling: &Value, current: &Value) -> bool {
    match enabling {
        Value::String(options) => options.split(',').map(str::trim).any(|option| {
            current.as_str() == Some(option)
                || matches!(
                    (numeric_value(current), option.parse::<f64>().ok()),
                    (Some(lhs), Some(rhs)) if lhs == rhs
                )
        }),
        Value::Number(_) | Value::Bool(_) => {
            matches!((numeric_value(enabling), numeric_value(current)), (Some(lhs), Some(rhs)) if lhs == rhs)
        }
        Value::Array(options) => options
            .iter()
            .any(|option| enabling_matches(option, current)),
        other => other == current,
    }
}

#[cfg(test)]
#[path = "dict_tests.rs"]
mod tests;
