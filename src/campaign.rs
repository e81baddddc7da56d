//! Campaign session: the ordered event list, signal bookkeeping, and the
//! schema those events are built against.
use crate::dict::{Node, SchemaDict};
use crate::error::{ConfigError, Result};
use crate::schema::{SchemaCache, SchemaDocument};
use crate::triggers::{AdhocTriggers, TriggerMap};
use crate::util;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

pub const EVENTS_KEY: &str = "Events";
pub const CAMPAIGN_EVENT_CLASS: &str = "CampaignEvent";
pub const NO_TRIGGER: &str = "NoTrigger";

const REQUIRED_EVENT_KEYS: [&str; 3] = ["Start_Day", "Nodeset_Config", "Event_Coordinator_Config"];

/// Fields naming a signal the event will broadcast.
const PUBLISHING_KEYS: [&str; 5] = [
    "Broadcast_Event",
    "Positive_Diagnosis_Event",
    "Event_Trigger_Distributed",
    "Event_Trigger_Expired",
    "Blackout_Event_Trigger",
];

/// Fields listing signals the event listens for.
const SUBSCRIBING_KEYS: [&str; 3] = [
    "Trigger_Condition_List",
    "Start_Trigger_Condition_List",
    "Stop_Trigger_Condition_List",
];

#[derive(Debug)]
pub struct Campaign {
    cache: SchemaCache,
    events: Vec<SchemaDict>,
    published: BTreeSet<String>,
    subscribed: BTreeSet<String>,
    triggers: Box<dyn TriggerMap>,
}

impl Default for Campaign {
    fn default() -> Self {
        Self::with_trigger_map(Box::new(AdhocTriggers::default()))
    }
}

impl Campaign {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trigger_map(triggers: Box<dyn TriggerMap>) -> Self {
        Self {
            cache: SchemaCache::new(),
            events: Vec::new(),
            published: BTreeSet::new(),
            subscribed: BTreeSet::new(),
            triggers,
        }
    }

    /// Load (or reuse) the schema at `path` and start a fresh session on it.
    pub fn set_schema(&mut self, path: &Path) -> Result<()> {
        let document = self.cache.get_or_load(path)?;
        self.reset();
        self.triggers.schema_changed(&document);
        tracing::info!(path = %path.display(), "campaign schema set");
        Ok(())
    }

    pub fn get_schema(&self) -> Option<&Path> {
        self.cache.current().map(|(path, _)| path)
    }

    pub fn schema(&self) -> Result<Arc<SchemaDocument>> {
        self.cache
            .current()
            .map(|(_, document)| Arc::clone(document))
            .ok_or(ConfigError::SchemaNotLoaded)
    }

    /// Append a campaign event and record every signal it broadcasts or listens for.
    pub fn add(&mut self, event: SchemaDict) -> Result<()> {
        if event.value("class").and_then(Value::as_str) != Some(CAMPAIGN_EVENT_CLASS) {
            return Err(ConfigError::ShapeViolation(format!(
                "expected class '{CAMPAIGN_EVENT_CLASS}'"
            )));
        }
        if let Some(missing) = REQUIRED_EVENT_KEYS
            .iter()
            .find(|key| !event.contains_key(key))
        {
            return Err(ConfigError::ShapeViolation(format!(
                "campaign event is missing '{missing}'"
            )));
        }
        collect_signals(&event, &mut self.published, &mut self.subscribed);
        self.events.push(event);
        tracing::debug!(events = self.events.len(), "added campaign event");
        Ok(())
    }

    /// Drop events and signal sets; the schema and ad-hoc trigger slots stay.
    pub fn reset(&mut self) {
        self.events.clear();
        self.published.clear();
        self.subscribed.clear();
    }

    pub fn events(&self) -> &[SchemaDict] {
        &self.events
    }

    pub fn published(&self) -> &BTreeSet<String> {
        &self.published
    }

    pub fn subscribed(&self) -> &BTreeSet<String> {
        &self.subscribed
    }

    pub fn map_trigger(&mut self, name: &str) -> String {
        self.triggers.map_trigger(name)
    }

    pub fn adhoc_events(&self) -> BTreeMap<String, String> {
        self.triggers.adhoc_events()
    }

    pub fn to_plain(&self) -> Value {
        let events: Vec<Value> = self.events.iter().map(SchemaDict::to_plain).collect();
        let mut root = Map::new();
        root.insert(EVENTS_KEY.to_string(), Value::Array(events));
        Value::Object(root)
    }

    /// Write `{"Events": [...]}`. Events are written as they are; nothing is finalized here.
    pub fn save(&self, path: &Path) -> Result<()> {
        util::write_json(path, &self.to_plain())?;
        tracing::info!(path = %path.display(), events = self.events.len(), "saved campaign");
        Ok(())
    }
}

fn collect_signals(
    dict: &SchemaDict,
    published: &mut BTreeSet<String>,
    subscribed: &mut BTreeSet<String>,
) {
    for (key, node) in dict.iter() {
        if PUBLISHING_KEYS.contains(&key) {
            if let Some(name) = node.as_scalar().and_then(Value::as_str) {
                record(published, name);
            }
        }
        if SUBSCRIBING_KEYS.contains(&key) {
            for name in node
                .as_sequence()
                .unwrap_or_default()
                .iter()
                .filter_map(Node::as_scalar)
                .filter_map(Value::as_str)
            {
                record(subscribed, name);
            }
        }
        collect_node(node, published, subscribed);
    }
}

fn collect_node(node: &Node, published: &mut BTreeSet<String>, subscribed: &mut BTreeSet<String>) {
    match node {
        Node::Scalar(_) => {}
        Node::Sequence(items) => {
            for item in items {
                collect_node(item, published, subscribed);
            }
        }
        Node::Mapping(dict) => collect_signals(dict, published, subscribed),
    }
}

fn record(signals: &mut BTreeSet<String>, name: &str) {
    if !name.is_empty() && name != NO_TRIGGER {
        signals.insert(name.to_string());
    }
}

#[cfg(test)]
#[path = "campaign_tests.rs"]
mod tests;
