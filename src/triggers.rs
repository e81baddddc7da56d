//! Trigger-name remapping between generic signal names and the slots a
//! disease build actually listens on.
use crate::schema::SchemaDocument;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

const ADHOC_SLOT_PREFIX: &str = "GP_EVENT_";

pub trait TriggerMap: fmt::Debug {
    /// Name to write into the campaign file for the caller's `name`.
    fn map_trigger(&mut self, name: &str) -> String;

    /// Called when the owning session switches to another schema.
    fn schema_changed(&mut self, _document: &SchemaDocument) {}

    /// Names that were not built in, with the slot each one was given.
    fn adhoc_events(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// Built-in events pass through; everything else gets the next `GP_EVENT_NNN` slot.
#[derive(Debug, Clone, Default)]
pub struct AdhocTriggers {
    builtins: BTreeSet<String>,
    assigned: BTreeMap<String, String>,
}

impl AdhocTriggers {
    pub fn new(builtins: impl IntoIterator<Item = String>) -> Self {
        Self {
            builtins: builtins.into_iter().collect(),
            assigned: BTreeMap::new(),
        }
    }

    pub fn from_schema(document: &SchemaDocument) -> Self {
        Self::new(document.builtin_events())
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains(name)
    }
}

impl TriggerMap for AdhocTriggers {
    fn map_trigger(&mut self, name: &str) -> String {
        if name.is_empty() || self.builtins.is_empty() || self.builtins.contains(name) {
            return name.to_string();
        }
        if let Some(slot) = self.assigned.get(name) {
            return slot.clone();
        }
        let slot = format!("{ADHOC_SLOT_PREFIX}{:03}", self.assigned.len());
        tracing::debug!(event = name, slot = slot.as_str(), "assigned ad-hoc event slot");
        self.assigned.insert(name.to_string(), slot.clone());
        slot
    }

    fn schema_changed(&mut self, document: &SchemaDocument) {
        *self = Self::from_schema(document);
    }

    fn adhoc_events(&self) -> BTreeMap<String, String> {
        self.assigned.clone()
    }
}
