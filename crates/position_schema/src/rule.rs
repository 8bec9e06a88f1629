//! Compiled name-matching rules.

use crate::description::{SchemaDescription, SlotDescription};
use crate::error::SchemaError;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// How a slot selects markers by name.
///
/// The annotation text is a regular expression. `Exact` must match the whole
/// marker name, `Prefix` its start and `Suffix` its end, so `"spawn.red"`
/// also selects `"spawnxred"` unless the dot is escaped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum MatchRule {
    Exact(String),
    Prefix(String),
    Suffix(String),
}

impl MatchRule {
    /// Anchored pattern the rule compiles to.
    pub fn pattern(&self) -> String {
        match self {
            MatchRule::Exact(text) => format!("^(?:{text})$"),
            MatchRule::Prefix(text) => format!("^(?:{text})"),
            MatchRule::Suffix(text) => format!("(?:{text})$"),
        }
    }

    pub fn compile(&self) -> Result<Regex, regex::Error> {
        Regex::new(&self.pattern())
    }

    /// Reads the single matching annotation of a leaf slot.
    pub(crate) fn from_slot(schema: &str, slot: &SlotDescription) -> Result<Self, SchemaError> {
        match (&slot.exact, &slot.prefix, &slot.suffix) {
            (None, None, None) => Err(SchemaError::MissingAnnotation {
                schema: schema.to_string(),
                slot: slot.name.clone(),
            }),
            (Some(name), None, None) => Ok(MatchRule::Exact(name.clone())),
            (None, Some(prefix), None) => Ok(MatchRule::Prefix(prefix.clone())),
            (None, None, Some(suffix)) => Ok(MatchRule::Suffix(suffix.clone())),
            _ => Err(SchemaError::ConflictingAnnotations {
                schema: schema.to_string(),
                slot: slot.name.clone(),
            }),
        }
    }
}

impl std::fmt::Display for MatchRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchRule::Exact(name) => write!(f, "^{name}$"),
            MatchRule::Prefix(prefix) => write!(f, "{prefix}.*"),
            MatchRule::Suffix(suffix) => write!(f, ".*{suffix}"),
        }
    }
}

/// A rule bound to the slot it fills, with its pattern compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// Dotted slot path from the root schema, e.g. `bases.red`.
    pub slot: String,
    pub rule: MatchRule,
    pub plural: bool,
    matcher: Regex,
}

impl CompiledRule {
    /// Compiles the rule of a leaf slot.
    ///
    /// A pattern that is not a valid regular expression is reported as
    /// [`SchemaError::InvalidConstructor`].
    pub(crate) fn from_slot(schema: &str, slot: &SlotDescription) -> Result<Self, SchemaError> {
        let rule = MatchRule::from_slot(schema, slot)?;
        let matcher = rule.compile().map_err(|e| SchemaError::InvalidConstructor {
            schema: schema.to_string(),
            reason: format!("slot '{}' has an invalid pattern: {e}", slot.name),
        })?;
        Ok(Self {
            slot: slot.name.clone(),
            rule,
            plural: slot.plural,
            matcher,
        })
    }

    pub fn matches(&self, marker: &str) -> bool {
        self.matcher.is_match(marker)
    }
}

impl PartialEq for CompiledRule {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot && self.rule == other.rule && self.plural == other.plural
    }
}

impl Eq for CompiledRule {}

impl std::fmt::Display for CompiledRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.slot, self.rule)
    }
}

/// Flat rule list of a schema, nested schemas spliced in depth-first.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSchema {
    pub name: String,
    pub rules: Vec<CompiledRule>,
}

impl CompiledSchema {
    /// Compiles a description, checking every slot annotation.
    ///
    /// `on_nested` is called for every nested schema after it compiled,
    /// innermost first, so callers can register nested schemas under their
    /// own identity.
    pub fn compile(
        description: &SchemaDescription,
        on_nested: &mut dyn FnMut(&CompiledSchema),
    ) -> Result<Self, SchemaError> {
        check_layout(description)?;

        let mut rules = Vec::new();
        for slot in &description.slots {
            match &slot.nested {
                Some(nested) => {
                    if slot.annotation_count() > 0 || slot.plural {
                        return Err(SchemaError::ConflictingAnnotations {
                            schema: description.name.clone(),
                            slot: slot.name.clone(),
                        });
                    }
                    let inner = CompiledSchema::compile(nested, on_nested)?;
                    on_nested(&inner);
                    rules.extend(inner.rules.into_iter().map(|rule| CompiledRule {
                        slot: format!("{}.{}", slot.name, rule.slot),
                        ..rule
                    }));
                }
                None => rules.push(CompiledRule::from_slot(&description.name, slot)?),
            }
        }

        Ok(Self {
            name: description.name.clone(),
            rules,
        })
    }

    pub fn rule(&self, slot: &str) -> Option<&CompiledRule> {
        self.rules.iter().find(|rule| rule.slot == slot)
    }
}

/// A description must have a non-empty, uniquely named slot list.
fn check_layout(description: &SchemaDescription) -> Result<(), SchemaError> {
    if description.name.is_empty() {
        return Err(SchemaError::InvalidConstructor {
            schema: description.name.clone(),
            reason: "schema has no name".to_string(),
        });
    }
    if description.slots.is_empty() {
        return Err(SchemaError::InvalidConstructor {
            schema: description.name.clone(),
            reason: "schema declares no slots".to_string(),
        });
    }
    for (index, slot) in description.slots.iter().enumerate() {
        if slot.name.is_empty() {
            return Err(SchemaError::InvalidConstructor {
                schema: description.name.clone(),
                reason: format!("slot #{index} has no name"),
            });
        }
        if description.slots[..index].iter().any(|s| s.name == slot.name) {
            return Err(SchemaError::InvalidConstructor {
                schema: description.name.clone(),
                reason: format!("slot '{}' is declared twice", slot.name),
            });
        }
    }
    Ok(())
}
