//! Error taxonomy for the migration engine
//!
//! Read/plan-phase errors are whole-run fatal (nothing has been written, so
//! there is nothing to roll back). Execute-phase creation failures are
//! entity-scoped and live in the report instead; see
//! [`crate::api::error::CreationError`].

use crate::api::error::TransportError;

use super::types::EntityRef;

/// Account data violates an invariant the engine relies on
#[derive(Debug, Clone)]
pub struct IntegrityError {
    pub message: String,
}

impl IntegrityError {
    pub fn duplicate_key(entity: &EntityRef) -> Self {
        Self {
            message: format!("destination catalog contains more than one {}", entity),
        }
    }

    pub fn duplicate_in_catalog(entity: &EntityRef) -> Self {
        Self {
            message: format!("catalog contains more than one {}", entity),
        }
    }

    pub fn unknown_field_id(owner: &str, id: u64) -> Self {
        Self {
            message: format!(
                "field '{}' has a condition referencing field id {} which does not exist in the account",
                owner, id
            ),
        }
    }
}

impl std::fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "data integrity violation: {}", self.message)
    }
}

impl std::error::Error for IntegrityError {}

/// The dependency graph cannot be topologically ordered
#[derive(Debug, Clone)]
pub struct CycleError {
    /// Entities that remain after all acyclic nodes were ordered
    pub entities: Vec<EntityRef>,
}

impl std::fmt::Display for CycleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.entities.iter().map(|e| e.to_string()).collect();
        write!(
            f,
            "circular dependency detected involving: {}",
            names.join(", ")
        )
    }
}

impl std::error::Error for CycleError {}

/// A reference had no mapping entry at rewrite time
///
/// The plan is supposed to guarantee resolvability, so this signals an
/// internal planning defect and is fatal and non-retryable.
#[derive(Debug, Clone)]
pub struct UnresolvedReferenceError {
    pub entity: EntityRef,
    pub reference: EntityRef,
}

impl std::fmt::Display for UnresolvedReferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} references {} which has no destination id mapping; this is an internal planning defect",
            self.entity, self.reference
        )
    }
}

impl std::error::Error for UnresolvedReferenceError {}

/// Fatal error surface of a migration run
#[derive(Debug)]
pub enum MigrateError {
    Transport(TransportError),
    Integrity(IntegrityError),
    Cycle(CycleError),
    UnresolvedReference(UnresolvedReferenceError),
}

impl std::fmt::Display for MigrateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => e.fmt(f),
            Self::Integrity(e) => e.fmt(f),
            Self::Cycle(e) => e.fmt(f),
            Self::UnresolvedReference(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for MigrateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Transport(e) => Some(e),
            Self::Integrity(e) => Some(e),
            Self::Cycle(e) => Some(e),
            Self::UnresolvedReference(e) => Some(e),
        }
    }
}

impl From<TransportError> for MigrateError {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<IntegrityError> for MigrateError {
    fn from(e: IntegrityError) -> Self {
        Self::Integrity(e)
    }
}

impl From<CycleError> for MigrateError {
    fn from(e: CycleError) -> Self {
        Self::Cycle(e)
    }
}

impl From<UnresolvedReferenceError> for MigrateError {
    fn from(e: UnresolvedReferenceError) -> Self {
        Self::UnresolvedReference(e)
    }
}
