//! Source-to-destination id mapping built incrementally during a run
//!
//! Entries are added the moment an entity is confirmed present at the
//! destination (matched or newly created) and are the only mechanism by
//! which later references are rewritten. The table lives for one run only.

use std::collections::HashMap;

use super::error::IntegrityError;
use super::types::{EntityKind, EntityRef};

#[derive(Debug, Clone, Default)]
pub struct IdMapping {
    by_key: HashMap<EntityRef, u64>,
    by_source_id: HashMap<(EntityKind, u64), u64>,
}

impl IdMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a confirmed mapping. Write-once per entity: a conflicting
    /// re-map is refused.
    pub fn record(
        &mut self,
        entity: EntityRef,
        source_id: u64,
        destination_id: u64,
    ) -> Result<(), IntegrityError> {
        if let Some(&existing) = self.by_key.get(&entity) {
            if existing != destination_id {
                return Err(IntegrityError {
                    message: format!(
                        "{} is already mapped to destination id {}, refusing re-map to {}",
                        entity, existing, destination_id
                    ),
                });
            }
            return Ok(());
        }

        log::debug!("mapped {}: {} -> {}", entity, source_id, destination_id);
        let kind = entity.kind;
        self.by_key.insert(entity, destination_id);
        self.by_source_id.insert((kind, source_id), destination_id);
        Ok(())
    }

    pub fn destination_of(&self, entity: &EntityRef) -> Option<u64> {
        self.by_key.get(entity).copied()
    }

    pub fn destination_of_source_id(&self, kind: EntityKind, source_id: u64) -> Option<u64> {
        self.by_source_id.get(&(kind, source_id)).copied()
    }

    pub fn contains(&self, entity: &EntityRef) -> bool {
        self.by_key.contains_key(entity)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
