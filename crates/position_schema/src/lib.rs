//! # Position Schema
//!
//! Declarative description of the spatial layout a game type needs, checked
//! against the named markers an arena template actually provides.
//!
//! A game type declares its layout once as a [`SchemaDescription`] (or through
//! the [`PositionData`] trait). The [`SchemaRegistry`] compiles that
//! description into name-matching rules, rejecting malformed slots at setup
//! time. Every arena template is then checked with
//! [`SchemaRegistry::validate`], which names the first rule no marker
//! satisfies, and finally resolved into typed positions.
//!
//! ```rust
//! use position_schema::*;
//!
//! let registry = SchemaRegistry::new();
//! registry
//!     .register(
//!         "duel",
//!         &SchemaDescription::new("duel")
//!             .exact("red", "spawn.red")
//!             .exact("blue", "spawn.blue"),
//!     )
//!     .unwrap();
//!
//! let markers: MarkerSet = [
//!     ("spawn.red", Position::new(0.0, 64.0, 0.0)),
//!     ("spawn.blue", Position::new(32.0, 64.0, 0.0)),
//! ]
//! .into_iter()
//! .collect();
//!
//! assert!(registry.validate("duel", &markers).is_ok());
//! ```

pub mod description;
pub mod error;
pub mod marker;
pub mod registry;
pub mod resolved;
pub mod rule;

pub use description::{SchemaDescription, SlotDescription};
pub use error::{ConstructionError, ResolutionError, SchemaError, ValidationError};
pub use marker::{Marker, MarkerSet, Position};
pub use registry::SchemaRegistry;
pub use resolved::{resolve, resolve_as, PositionData, ResolvedPositions, SlotValue};
pub use rule::{CompiledRule, CompiledSchema, MatchRule};
