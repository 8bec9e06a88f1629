//! Error types for schema registration, validation and resolution.
//!
//! The three enums map to three moments in a game type's life:
//! [`SchemaError`] is raised once when a game type is set up,
//! [`ValidationError`] and [`ResolutionError`] are raised per arena template
//! and always name the rule or slot that failed.

use crate::rule::{CompiledRule, MatchRule};

/// Definition-time errors raised by schema registration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    /// A leaf slot has no exact, prefix or suffix annotation
    #[error("slot '{slot}' of schema '{schema}' has no matching annotation")]
    MissingAnnotation { schema: String, slot: String },
    /// A slot carries more than one annotation, or a nested slot carries one
    #[error("slot '{slot}' of schema '{schema}' has more than one matching annotation")]
    ConflictingAnnotations { schema: String, slot: String },
    /// The description cannot be read as a slot list
    #[error("schema '{schema}' is not a valid description: {reason}")]
    InvalidConstructor { schema: String, reason: String },
}

/// Per-template errors raised when checking a marker set against a game type.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("no schema registered for game type '{0}'")]
    UnknownGameType(String),
    /// No marker matched the rule
    #[error("no marker matches {0}")]
    NoMatch(CompiledRule),
}

/// Reasons a resolved position tree is rejected while building a typed value.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConstructionError {
    #[error("slot '{0}' is not present")]
    MissingSlot(String),
    #[error("slot '{slot}' holds {found}, expected {expected}")]
    TypeMismatch {
        slot: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{0}")]
    Rejected(String),
}

/// Per-template errors raised while resolving markers into position data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolutionError {
    #[error("no schema registered for game type '{0}'")]
    UnknownGameType(String),
    /// No marker matched the slot's rule
    #[error("no marker matches slot '{slot}' ({rule})")]
    Empty { slot: String, rule: MatchRule },
    /// The resolved slots could not be assembled into the typed value
    #[error("could not build position data for schema '{schema}': {source}")]
    ConstructionFailed {
        schema: String,
        #[source]
        source: ConstructionError,
    },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}
