//! # Resolution
//!
//! Turns a schema description and a marker set into a [`ResolvedPositions`]
//! tree, and from there into a strongly typed [`PositionData`] value.
//!
//! Resolution walks slots in declaration order. Plural slots collect every
//! matching marker in discovery order; singular slots take the first match in
//! discovery order and log a warning when the choice was ambiguous. Both fail
//! when nothing matches. Because the marker set preserves discovery order,
//! resolving the same input twice always yields equal trees.

use crate::description::SchemaDescription;
use crate::error::{ConstructionError, ResolutionError};
use crate::marker::{MarkerSet, Position};
use crate::rule::CompiledRule;
use tracing::warn;

/// Value bound to one slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotValue {
    Single(Position),
    Many(Vec<Position>),
    Nested(ResolvedPositions),
}

impl SlotValue {
    fn kind(&self) -> &'static str {
        match self {
            SlotValue::Single(_) => "a single position",
            SlotValue::Many(_) => "a position list",
            SlotValue::Nested(_) => "nested positions",
        }
    }
}

/// Slots of a schema bound to concrete positions, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPositions {
    pub schema: String,
    pub slots: Vec<(String, SlotValue)>,
}

impl ResolvedPositions {
    pub fn get(&self, slot: &str) -> Option<&SlotValue> {
        self.slots
            .iter()
            .find(|(name, _)| name == slot)
            .map(|(_, value)| value)
    }

    fn require(&self, slot: &str) -> Result<&SlotValue, ConstructionError> {
        self.get(slot)
            .ok_or_else(|| ConstructionError::MissingSlot(slot.to_string()))
    }

    pub fn single(&self, slot: &str) -> Result<Position, ConstructionError> {
        match self.require(slot)? {
            SlotValue::Single(position) => Ok(*position),
            other => Err(mismatch(slot, "a single position", other)),
        }
    }

    pub fn many(&self, slot: &str) -> Result<&[Position], ConstructionError> {
        match self.require(slot)? {
            SlotValue::Many(positions) => Ok(positions),
            other => Err(mismatch(slot, "a position list", other)),
        }
    }

    pub fn nested(&self, slot: &str) -> Result<&ResolvedPositions, ConstructionError> {
        match self.require(slot)? {
            SlotValue::Nested(resolved) => Ok(resolved),
            other => Err(mismatch(slot, "nested positions", other)),
        }
    }
}

fn mismatch(slot: &str, expected: &'static str, found: &SlotValue) -> ConstructionError {
    ConstructionError::TypeMismatch {
        slot: slot.to_string(),
        expected,
        found: found.kind(),
    }
}

/// A strongly typed view of the positions a game type needs.
///
/// Implementors declare their layout once and build themselves from the
/// resolved tree.
///
/// ```rust
/// use position_schema::*;
///
/// #[derive(Debug, PartialEq)]
/// struct DuelPositions {
///     red: Position,
///     blue: Position,
/// }
///
/// impl PositionData for DuelPositions {
///     fn describe() -> SchemaDescription {
///         SchemaDescription::new("duel")
///             .exact("red", "spawn.red")
///             .exact("blue", "spawn.blue")
///     }
///
///     fn from_positions(resolved: &ResolvedPositions) -> Result<Self, ConstructionError> {
///         Ok(Self {
///             red: resolved.single("red")?,
///             blue: resolved.single("blue")?,
///         })
///     }
/// }
/// ```
pub trait PositionData: Sized {
    fn describe() -> SchemaDescription;

    fn from_positions(resolved: &ResolvedPositions) -> Result<Self, ConstructionError>;
}

/// Resolves a description against a marker set.
pub fn resolve(
    schema: &SchemaDescription,
    markers: &MarkerSet,
) -> Result<ResolvedPositions, ResolutionError> {
    resolve_at(schema, markers, "")
}

/// Resolves `T`'s layout and builds the typed value.
pub fn resolve_as<T: PositionData>(markers: &MarkerSet) -> Result<T, ResolutionError> {
    let schema = T::describe();
    let resolved = resolve(&schema, markers)?;
    T::from_positions(&resolved).map_err(|source| ResolutionError::ConstructionFailed {
        schema: schema.name.clone(),
        source,
    })
}

fn resolve_at(
    schema: &SchemaDescription,
    markers: &MarkerSet,
    path: &str,
) -> Result<ResolvedPositions, ResolutionError> {
    let mut slots = Vec::with_capacity(schema.slots.len());

    for slot in &schema.slots {
        let slot_path = if path.is_empty() {
            slot.name.clone()
        } else {
            format!("{path}.{}", slot.name)
        };

        let value = match &slot.nested {
            Some(nested) => SlotValue::Nested(resolve_at(nested, markers, &slot_path)?),
            None => {
                let compiled = CompiledRule::from_slot(&schema.name, slot)?;
                let mut matches = markers
                    .iter()
                    .filter(|marker| compiled.matches(&marker.name))
                    .peekable();

                let Some(first) = matches.peek().copied() else {
                    return Err(ResolutionError::Empty {
                        slot: slot_path,
                        rule: compiled.rule,
                    });
                };

                if slot.plural {
                    SlotValue::Many(matches.map(|marker| marker.position).collect())
                } else {
                    let candidates = matches.count();
                    if candidates > 1 {
                        warn!(
                            "⚠️ Slot '{}' ({}) matched {} markers, using '{}'",
                            slot_path, compiled.rule, candidates, first.name
                        );
                    }
                    SlotValue::Single(first.position)
                }
            }
        };

        slots.push((slot.name.clone(), value));
    }

    Ok(ResolvedPositions {
        schema: schema.name.clone(),
        slots,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::SlotDescription;
    use crate::error::SchemaError;
    use crate::rule::MatchRule;

    fn markers() -> MarkerSet {
        [
            ("chest.b", Position::new(2.0, 0.0, 0.0)),
            ("spawn.red", Position::new(10.0, 0.0, 0.0)),
            ("chest.a", Position::new(1.0, 0.0, 0.0)),
            ("spawn.blue", Position::new(20.0, 0.0, 0.0)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_plural_slot_keeps_discovery_order() {
        let schema = SchemaDescription::new("loot")
            .slot(SlotDescription::new("chests").prefix("chest.").plural());

        let resolved = resolve(&schema, &markers()).unwrap();
        assert_eq!(
            resolved.many("chests").unwrap(),
            &[Position::new(2.0, 0.0, 0.0), Position::new(1.0, 0.0, 0.0)]
        );
    }

    #[test]
    fn test_empty_plural_slot_fails() {
        let schema = SchemaDescription::new("loot")
            .slot(SlotDescription::new("barrels").prefix("barrel.").plural());

        let err = resolve(&schema, &markers()).unwrap_err();
        assert_eq!(
            err,
            ResolutionError::Empty {
                slot: "barrels".to_string(),
                rule: MatchRule::Prefix("barrel.".to_string()),
            }
        );
    }

    #[test]
    fn test_resolution_uses_regular_expressions() {
        let schema = SchemaDescription::new("teams")
            .exact("spawn", r"spawn\.(red|blue)")
            .slot(SlotDescription::new("loot").suffix(r"\.[ab]").plural());

        let resolved = resolve(&schema, &markers()).unwrap();
        assert_eq!(resolved.single("spawn").unwrap(), Position::new(10.0, 0.0, 0.0));
        assert_eq!(resolved.many("loot").unwrap().len(), 2);

        let broken = SchemaDescription::new("broken").exact("spawn", "spawn[");
        assert!(matches!(
            resolve(&broken, &markers()),
            Err(ResolutionError::Schema(SchemaError::InvalidConstructor { .. }))
        ));
    }

    #[test]
    fn test_ambiguous_singular_slot_is_deterministic() {
        let schema = SchemaDescription::new("any").prefix("spawn", "spawn.");

        let first = resolve(&schema, &markers()).unwrap();
        let second = resolve(&schema, &markers()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.single("spawn").unwrap(), Position::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_nested_failure_reports_full_path() {
        let schema = SchemaDescription::new("ctf")
            .nested("home", SchemaDescription::new("base").exact("flag", "flag.home"));

        let err = resolve(&schema, &markers()).unwrap_err();
        assert!(matches!(err, ResolutionError::Empty { ref slot, .. } if slot == "home.flag"));
    }

    #[test]
    fn test_accessor_type_mismatch() {
        let schema = SchemaDescription::new("duel").exact("red", "spawn.red");
        let resolved = resolve(&schema, &markers()).unwrap();

        assert!(matches!(
            resolved.many("red"),
            Err(ConstructionError::TypeMismatch { expected: "a position list", .. })
        ));
        assert_eq!(
            resolved.single("green"),
            Err(ConstructionError::MissingSlot("green".to_string()))
        );
    }
}
