//! # Schema Descriptions
//!
//! Statically declared shape of the spatial layout a game type needs from an
//! arena. A description is a tree of named slots; each leaf slot carries one
//! matching annotation (exact, prefix or suffix) and each inner slot carries a
//! nested description.
//!
//! Descriptions are plain data: they can be built in code with the builder
//! methods below or deserialised from configuration. Nothing is checked here;
//! annotation errors surface when the description is registered.
//!
//! ```rust
//! use position_schema::{SchemaDescription, SlotDescription};
//!
//! let duel = SchemaDescription::new("duel")
//!     .exact("red", "spawn.red")
//!     .exact("blue", "spawn.blue")
//!     .slot(SlotDescription::new("chests").prefix("chest.").plural());
//! assert_eq!(duel.slots.len(), 3);
//! ```

use serde::{Deserialize, Serialize};

/// A named tree of slots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescription {
    /// Identity of the schema, also used as its registration key.
    pub name: String,
    /// Slots in declaration order.
    #[serde(default)]
    pub slots: Vec<SlotDescription>,
}

/// One slot of a schema and its matching annotation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SlotDescription {
    pub name: String,
    /// Pattern the whole marker name must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exact: Option<String>,
    /// Pattern matched against the start of marker names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    /// Pattern matched against the end of marker names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Binds every matching marker instead of the first one.
    #[serde(default)]
    pub plural: bool,
    /// Slot resolved by re-applying a nested schema to the same markers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nested: Option<Box<SchemaDescription>>,
}

impl SchemaDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slots: Vec::new(),
        }
    }

    pub fn slot(mut self, slot: SlotDescription) -> Self {
        self.slots.push(slot);
        self
    }

    /// Singular slot bound to the marker named `marker`.
    pub fn exact(self, slot: impl Into<String>, marker: impl Into<String>) -> Self {
        self.slot(SlotDescription::new(slot).exact(marker))
    }

    /// Singular slot bound to the first marker starting with `prefix`.
    pub fn prefix(self, slot: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.slot(SlotDescription::new(slot).prefix(prefix))
    }

    /// Singular slot bound to the first marker ending with `suffix`.
    pub fn suffix(self, slot: impl Into<String>, suffix: impl Into<String>) -> Self {
        self.slot(SlotDescription::new(slot).suffix(suffix))
    }

    pub fn nested(self, slot: impl Into<String>, schema: SchemaDescription) -> Self {
        self.slot(SlotDescription::nested(slot, schema))
    }

    pub fn find_slot(&self, name: &str) -> Option<&SlotDescription> {
        self.slots.iter().find(|slot| slot.name == name)
    }
}

impl SlotDescription {
    /// Slot without any annotation yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn nested(name: impl Into<String>, schema: SchemaDescription) -> Self {
        Self {
            name: name.into(),
            nested: Some(Box::new(schema)),
            ..Default::default()
        }
    }

    pub fn exact(mut self, marker: impl Into<String>) -> Self {
        self.exact = Some(marker.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = Some(suffix.into());
        self
    }

    pub fn plural(mut self) -> Self {
        self.plural = true;
        self
    }

    pub fn is_nested(&self) -> bool {
        self.nested.is_some()
    }

    /// Number of matching annotations set on this slot.
    pub(crate) fn annotation_count(&self) -> usize {
        [&self.exact, &self.prefix, &self.suffix]
            .iter()
            .filter(|annotation| annotation.is_some())
            .count()
    }
}
