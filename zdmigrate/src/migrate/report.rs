//! Per-entity outcomes of a migration run

use serde::Serialize;

use super::types::EntityRef;

/// What happened to one entity during execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StepOutcome {
    /// Created at the destination with this new id
    Created { destination_id: u64 },
    /// Already present at the destination; no write occurred
    Skipped { destination_id: u64 },
    /// Creation failed, or a dependency failed first
    Failed {
        error: String,
        /// Set when this entity was never attempted because a dependency
        /// already failed
        cascaded_from: Option<EntityRef>,
    },
}

impl StepOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created { .. } => "created",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }
}

/// One entity's entry in the report, in plan order
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub entity: EntityRef,
    pub title: String,
    pub outcome: StepOutcome,
}

/// Aggregated result of one migration run
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub run_date: String,
    pub source: String,
    pub destination: String,
    pub entries: Vec<StepReport>,
}

impl MigrationReport {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            run_date: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            source: source.into(),
            destination: destination.into(),
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entity: EntityRef, title: impl Into<String>, outcome: StepOutcome) {
        self.entries.push(StepReport {
            entity,
            title: title.into(),
            outcome,
        });
    }

    pub fn created_count(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Created { .. }))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Skipped { .. }))
    }

    pub fn failed_count(&self) -> usize {
        self.count(|o| matches!(o, StepOutcome::Failed { .. }))
    }

    pub fn is_clean(&self) -> bool {
        self.failed_count() == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.entries
            .iter()
            .filter(|e| matches!(e.outcome, StepOutcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&StepOutcome) -> bool) -> usize {
        self.entries.iter().filter(|e| predicate(&e.outcome)).count()
    }
}
