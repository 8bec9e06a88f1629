//! # Schema Registry
//!
//! Concurrent table of compiled schemas, keyed both by the logical game type
//! that requires them and by the schema's own identity. Registration happens
//! once per game type at setup; validation runs whenever an arena template is
//! loaded, possibly from several loader threads at once.

use crate::description::SchemaDescription;
use crate::error::{ResolutionError, SchemaError, ValidationError};
use crate::marker::MarkerSet;
use crate::resolved::{self, PositionData, ResolvedPositions};
use crate::rule::CompiledSchema;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Registered schemas for every known game type.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    /// Compiled schemas by game type
    game_types: DashMap<String, Arc<CompiledSchema>>,
    /// Compiled schemas by schema identity, nested schemas included
    schemas: DashMap<String, Arc<CompiledSchema>>,
    /// Source descriptions by game type, kept for resolution
    descriptions: DashMap<String, Arc<SchemaDescription>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles `description` and stores it for `game_type`.
    ///
    /// Nested schemas are compiled first and stored under their own identity.
    /// Re-registering a game type replaces its previous schema. Schema
    /// identities are shared across game types: the latest registration of a
    /// name wins, and a replacement with different rules is logged.
    ///
    /// # Errors
    ///
    /// Returns a [`SchemaError`] naming the offending slot if any leaf slot has
    /// zero or several matching annotations, or if the description has no
    /// usable slot list. Nothing is stored on failure.
    pub fn register(
        &self,
        game_type: &str,
        description: &SchemaDescription,
    ) -> Result<Arc<CompiledSchema>, SchemaError> {
        let mut nested = Vec::new();
        let compiled = Arc::new(CompiledSchema::compile(description, &mut |inner: &CompiledSchema| {
            nested.push(Arc::new(inner.clone()))
        })?);

        for inner in nested {
            debug!("📝 Registered nested schema '{}'", inner.name);
            self.store_schema(inner);
        }
        self.store_schema(Arc::clone(&compiled));
        self.game_types
            .insert(game_type.to_string(), Arc::clone(&compiled));
        self.descriptions
            .insert(game_type.to_string(), Arc::new(description.clone()));

        info!(
            "📐 Registered schema '{}' for game type '{}' ({} rules)",
            compiled.name,
            game_type,
            compiled.rules.len()
        );
        Ok(compiled)
    }

    /// Registers the layout declared by `T`.
    pub fn register_type<T: PositionData>(
        &self,
        game_type: &str,
    ) -> Result<Arc<CompiledSchema>, SchemaError> {
        self.register(game_type, &T::describe())
    }

    pub fn is_registered(&self, game_type: &str) -> bool {
        self.game_types.contains_key(game_type)
    }

    /// Compiled schema required by a game type.
    pub fn compiled(&self, game_type: &str) -> Option<Arc<CompiledSchema>> {
        self.game_types
            .get(game_type)
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Compiled schema by its own identity.
    pub fn schema(&self, name: &str) -> Option<Arc<CompiledSchema>> {
        self.schemas.get(name).map(|entry| Arc::clone(entry.value()))
    }

    /// Checks that every rule of `game_type` matches at least one marker.
    ///
    /// This is a membership check only; no position data is built.
    pub fn validate(&self, game_type: &str, markers: &MarkerSet) -> Result<(), ValidationError> {
        let compiled = self.lookup(game_type)?;
        for rule in &compiled.rules {
            if !markers.names().any(|name| rule.matches(name)) {
                return Err(ValidationError::NoMatch(rule.clone()));
            }
        }
        Ok(())
    }

    /// Like [`validate`](Self::validate) but reports every failing rule.
    pub fn validate_all(
        &self,
        game_type: &str,
        markers: &MarkerSet,
    ) -> Result<(), Vec<ValidationError>> {
        let compiled = self.lookup(game_type).map_err(|e| vec![e])?;
        let failures: Vec<_> = compiled
            .rules
            .iter()
            .filter(|rule| !markers.names().any(|name| rule.matches(name)))
            .map(|rule| ValidationError::NoMatch(rule.clone()))
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }

    /// Resolves the positions of a registered game type.
    pub fn resolve(
        &self,
        game_type: &str,
        markers: &MarkerSet,
    ) -> Result<ResolvedPositions, ResolutionError> {
        let description = self
            .descriptions
            .get(game_type)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| ResolutionError::UnknownGameType(game_type.to_string()))?;
        resolved::resolve(&description, markers)
    }

    pub fn len(&self) -> usize {
        self.game_types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.game_types.is_empty()
    }

    fn store_schema(&self, schema: Arc<CompiledSchema>) {
        let name = schema.name.clone();
        if let Some(previous) = self.schemas.insert(name.clone(), Arc::clone(&schema)) {
            if previous.rules != schema.rules {
                warn!(
                    "⚠️ Schema '{}' replaced with different rules ({} -> {})",
                    name,
                    previous.rules.len(),
                    schema.rules.len()
                );
            }
        }
    }

    fn lookup(&self, game_type: &str) -> Result<Arc<CompiledSchema>, ValidationError> {
        self.compiled(game_type)
            .ok_or_else(|| ValidationError::UnknownGameType(game_type.to_string()))
    }
}
