//! Ticket field migration engine
//!
//! The pipeline: read both account catalogs ([`reader`]), derive the
//! dependency-ordered plan ([`graph`]), then walk it ([`executor`]),
//! resolving each entity against the destination ([`resolver`]) and
//! rewriting references through the accumulated id mapping ([`rewrite`]).

pub mod error;
pub mod executor;
pub mod graph;
pub mod mapping;
pub mod reader;
pub mod report;
pub mod resolver;
pub mod rewrite;
#[cfg(test)]
pub mod test_fixtures;
pub mod types;

pub use error::{CycleError, IntegrityError, MigrateError, UnresolvedReferenceError};
pub use executor::{EntityWriter, ExecutionContext, run_plan};
pub use graph::DependencyGraph;
pub use mapping::IdMapping;
pub use reader::{AccountReader, read_catalog};
pub use report::{MigrationReport, StepOutcome, StepReport};
pub use types::{Catalog, EntityKind, EntityRef, FieldDefinition, MigrationPlan, MigrationStep};
