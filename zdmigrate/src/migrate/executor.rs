//! Walking the migration plan against the destination account
//!
//! Strictly sequential: a referenced entity must be fully committed and its
//! id recorded before any dependent entity is processed, so steps execute
//! in plan order with no parallelism. A single entity's creation failure is
//! recorded and execution continues; entities depending on a failed entity
//! are pre-emptively failed rather than attempted, unless they already
//! exist at the destination, in which case they are still matched and
//! skipped as usual.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::api::error::CreationError;

use super::error::MigrateError;
use super::mapping::IdMapping;
use super::report::{MigrationReport, StepOutcome};
use super::resolver::{Match, resolve_field, resolve_object};
use super::rewrite::{FieldPayload, ObjectPayload, object_payload, rewrite_field};
use super::types::{Catalog, EntityKind, EntityRef, MigrationPlan};

/// Write capability against the destination account
#[async_trait]
pub trait EntityWriter {
    /// Create a ticket field, returning its new destination id
    async fn create_field(&self, payload: &FieldPayload) -> Result<u64, CreationError>;

    /// Create a custom object type, returning its new destination id.
    /// Only the type is created; records are out of scope.
    async fn create_custom_object_type(&self, payload: &ObjectPayload)
    -> Result<u64, CreationError>;
}

/// Inputs to one execution pass
pub struct ExecutionContext<'a> {
    pub source: &'a Catalog,
    pub destination: &'a Catalog,
    pub source_name: &'a str,
    pub destination_name: &'a str,
}

/// Execute the plan step by step, accumulating mappings and outcomes.
///
/// Creation failures are entity-scoped and land in the report; anything
/// else (duplicate destination keys, unresolved references) is a fatal
/// internal or integrity error and aborts the run.
pub async fn run_plan<W: EntityWriter + ?Sized>(
    plan: &MigrationPlan,
    context: &ExecutionContext<'_>,
    writer: &W,
    mapping: &mut IdMapping,
) -> Result<MigrationReport, MigrateError> {
    let mut report = MigrationReport::new(context.source_name, context.destination_name);
    // Failed entity -> root cause, so cascades can name the original failure
    let mut failed: HashMap<EntityRef, EntityRef> = HashMap::new();

    for step in &plan.steps {
        // An entity that already exists at the destination is still skipped
        // and mapped even under a failed dependency, so resolution runs
        // first; only a creation is blocked by the cascade.
        let blocked_by = step
            .dependencies
            .iter()
            .find_map(|d| failed.get(d))
            .cloned();

        match step.entity.kind {
            EntityKind::CustomObjectType => {
                execute_object_step(
                    &step.entity,
                    blocked_by,
                    context,
                    writer,
                    mapping,
                    &mut report,
                    &mut failed,
                )
                .await?;
            }
            EntityKind::TicketField => {
                execute_field_step(
                    &step.entity,
                    blocked_by,
                    context,
                    writer,
                    mapping,
                    &mut report,
                    &mut failed,
                )
                .await?;
            }
        }
    }

    log::info!(
        "migration finished: {} created, {} skipped, {} failed",
        report.created_count(),
        report.skipped_count(),
        report.failed_count()
    );
    Ok(report)
}

async fn execute_object_step<W: EntityWriter + ?Sized>(
    entity: &EntityRef,
    blocked_by: Option<EntityRef>,
    context: &ExecutionContext<'_>,
    writer: &W,
    mapping: &mut IdMapping,
    report: &mut MigrationReport,
    failed: &mut HashMap<EntityRef, EntityRef>,
) -> Result<(), MigrateError> {
    let object = context
        .source
        .object_by_key(&entity.key)
        .ok_or_else(|| plan_mismatch(entity))?;

    match resolve_object(object, context.destination)? {
        Match::Existing(destination_id) => {
            mapping.record(entity.clone(), object.id, destination_id)?;
            log::info!("{} already present as id {}, skipping", entity, destination_id);
            report.push(
                entity.clone(),
                object.title.clone(),
                StepOutcome::Skipped { destination_id },
            );
        }
        Match::Absent => {
            if let Some(root) = blocked_by {
                cascade_failure(entity, root, &object.title, report, failed);
                return Ok(());
            }
            let payload = object_payload(object);
            log::info!("creating {}", entity);
            match writer.create_custom_object_type(&payload).await {
                Ok(destination_id) => {
                    mapping.record(entity.clone(), object.id, destination_id)?;
                    report.push(
                        entity.clone(),
                        object.title.clone(),
                        StepOutcome::Created { destination_id },
                    );
                }
                Err(e) => {
                    log::error!("failed to create {}: {}", entity, e);
                    failed.insert(entity.clone(), entity.clone());
                    report.push(
                        entity.clone(),
                        object.title.clone(),
                        StepOutcome::Failed {
                            error: e.to_string(),
                            cascaded_from: None,
                        },
                    );
                }
            }
        }
    }

    Ok(())
}

async fn execute_field_step<W: EntityWriter + ?Sized>(
    entity: &EntityRef,
    blocked_by: Option<EntityRef>,
    context: &ExecutionContext<'_>,
    writer: &W,
    mapping: &mut IdMapping,
    report: &mut MigrationReport,
    failed: &mut HashMap<EntityRef, EntityRef>,
) -> Result<(), MigrateError> {
    let field = context
        .source
        .field_by_key(&entity.key)
        .ok_or_else(|| plan_mismatch(entity))?;

    match resolve_field(field, context.destination)? {
        Match::Existing(destination_id) => {
            mapping.record(entity.clone(), field.id, destination_id)?;
            log::info!("{} already present as id {}, skipping", entity, destination_id);
            report.push(
                entity.clone(),
                field.title.clone(),
                StepOutcome::Skipped { destination_id },
            );
        }
        Match::Absent => {
            if let Some(root) = blocked_by {
                cascade_failure(entity, root, &field.title, report, failed);
                return Ok(());
            }
            // System fields exist in every account and are never created;
            // a missing one means the destination cannot receive anything
            // that references it
            if field.field_type.is_system() {
                log::error!("{} is missing at the destination and cannot be created", entity);
                failed.insert(entity.clone(), entity.clone());
                report.push(
                    entity.clone(),
                    field.title.clone(),
                    StepOutcome::Failed {
                        error: format!(
                            "system field '{}' is missing at the destination; system fields are never created",
                            field.field_type.as_wire()
                        ),
                        cascaded_from: None,
                    },
                );
                return Ok(());
            }
            // All dependencies resolved earlier in plan order, so a missing
            // mapping here is a planning defect and aborts the run
            let payload = rewrite_field(field, mapping).map_err(MigrateError::from)?;
            log::info!("creating {}", entity);
            match writer.create_field(&payload).await {
                Ok(destination_id) => {
                    mapping.record(entity.clone(), field.id, destination_id)?;
                    report.push(
                        entity.clone(),
                        field.title.clone(),
                        StepOutcome::Created { destination_id },
                    );
                }
                Err(e) => {
                    log::error!("failed to create {}: {}", entity, e);
                    failed.insert(entity.clone(), entity.clone());
                    report.push(
                        entity.clone(),
                        field.title.clone(),
                        StepOutcome::Failed {
                            error: e.to_string(),
                            cascaded_from: None,
                        },
                    );
                }
            }
        }
    }

    Ok(())
}

fn cascade_failure(
    entity: &EntityRef,
    root: EntityRef,
    title: &str,
    report: &mut MigrationReport,
    failed: &mut HashMap<EntityRef, EntityRef>,
) {
    log::warn!("{} not attempted: depends on failed {}", entity, root);
    failed.insert(entity.clone(), root.clone());
    report.push(
        entity.clone(),
        title.to_string(),
        StepOutcome::Failed {
            error: format!("dependency {} failed", root),
            cascaded_from: Some(root),
        },
    );
}

fn plan_mismatch(entity: &EntityRef) -> MigrateError {
    MigrateError::Integrity(super::error::IntegrityError {
        message: format!("plan references {} which is not in the source catalog", entity),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU64, Ordering};

    use crate::api::models::FieldType;
    use crate::migrate::graph::DependencyGraph;
    use crate::migrate::test_fixtures::{
        make_catalog, make_condition, make_field, make_lookup_field, make_object,
    };

    /// In-memory writer that assigns ids sequentially and can be told to
    /// reject specific keys
    #[derive(Default)]
    struct MockWriter {
        next_id: AtomicU64,
        fail_object_keys: HashSet<String>,
        fail_field_titles: HashSet<String>,
        created_fields: Mutex<Vec<FieldPayload>>,
        created_objects: Mutex<Vec<ObjectPayload>>,
        call_log: Mutex<Vec<String>>,
    }

    impl MockWriter {
        fn new() -> Self {
            Self {
                next_id: AtomicU64::new(1000),
                ..Default::default()
            }
        }

        fn failing_object(mut self, key: &str) -> Self {
            self.fail_object_keys.insert(key.to_string());
            self
        }

        fn creation_order(&self) -> Vec<String> {
            self.call_log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EntityWriter for MockWriter {
        async fn create_field(&self, payload: &FieldPayload) -> Result<u64, CreationError> {
            if self.fail_field_titles.contains(&payload.title) {
                return Err(CreationError {
                    status: Some(422),
                    message: "rejected by test".to_string(),
                });
            }
            self.call_log
                .lock()
                .unwrap()
                .push(format!("field:{}", payload.title));
            self.created_fields.lock().unwrap().push(payload.clone());
            Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
        }

        async fn create_custom_object_type(
            &self,
            payload: &ObjectPayload,
        ) -> Result<u64, CreationError> {
            if self.fail_object_keys.contains(&payload.key) {
                return Err(CreationError {
                    status: Some(422),
                    message: "rejected by test".to_string(),
                });
            }
            self.call_log
                .lock()
                .unwrap()
                .push(format!("object:{}", payload.key));
            self.created_objects.lock().unwrap().push(payload.clone());
            Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
        }
    }

    fn context<'a>(source: &'a Catalog, destination: &'a Catalog) -> ExecutionContext<'a> {
        ExecutionContext {
            source,
            destination,
            source_name: "sandbox",
            destination_name: "production",
        }
    }

    #[tokio::test]
    async fn creates_missing_entities_in_dependency_order() {
        let source = make_catalog(
            vec![make_lookup_field(1, "asset_ref", "asset")],
            vec![make_object(10, "asset")],
        );
        let destination = make_catalog(vec![], vec![]);
        let plan = DependencyGraph::build_plan(&source).unwrap();
        let writer = MockWriter::new();
        let mut mapping = IdMapping::new();

        let report = run_plan(&plan, &context(&source, &destination), &writer, &mut mapping)
            .await
            .unwrap();

        assert_eq!(report.created_count(), 2);
        assert_eq!(report.failed_count(), 0);
        // The object type was committed before the lookup field referencing it
        assert_eq!(
            writer.creation_order(),
            vec!["object:asset".to_string(), "field:asset ref".to_string()]
        );
        assert!(mapping.contains(&EntityRef::object("asset")));
        assert!(mapping.contains(&EntityRef::field("asset_ref")));
    }

    #[tokio::test]
    async fn natural_key_match_skips_and_maps() {
        // Same key, different numeric ids across accounts
        let source = make_catalog(vec![make_field(123, "priority_level", FieldType::Tagger)], vec![]);
        let destination =
            make_catalog(vec![make_field(777, "priority_level", FieldType::Tagger)], vec![]);
        let plan = DependencyGraph::build_plan(&source).unwrap();
        let writer = MockWriter::new();
        let mut mapping = IdMapping::new();

        let report = run_plan(&plan, &context(&source, &destination), &writer, &mut mapping)
            .await
            .unwrap();

        assert_eq!(report.created_count(), 0);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(
            mapping.destination_of(&EntityRef::field("priority_level")),
            Some(777)
        );
        assert_eq!(
            mapping.destination_of_source_id(EntityKind::TicketField, 123),
            Some(777)
        );
        assert!(writer.created_fields.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_run_is_idempotent() {
        let mut conditional = make_field(3, "serial_number", FieldType::Text);
        conditional.conditions = vec![make_condition("category", "hardware", &[])];
        let source = make_catalog(
            vec![make_field(1, "category", FieldType::Tagger), conditional],
            vec![make_object(10, "asset")],
        );
        let plan = DependencyGraph::build_plan(&source).unwrap();

        // First run against an empty destination creates everything
        let empty = make_catalog(vec![], vec![]);
        let writer = MockWriter::new();
        let mut mapping = IdMapping::new();
        let first = run_plan(&plan, &context(&source, &empty), &writer, &mut mapping)
            .await
            .unwrap();
        assert_eq!(first.created_count(), 3);

        // Second run sees a destination that now contains matching keys
        let destination = make_catalog(
            vec![
                make_field(901, "category", FieldType::Tagger),
                make_field(902, "serial_number", FieldType::Text),
            ],
            vec![make_object(910, "asset")],
        );
        let writer = MockWriter::new();
        let mut mapping = IdMapping::new();
        let second = run_plan(&plan, &context(&source, &destination), &writer, &mut mapping)
            .await
            .unwrap();

        assert_eq!(second.created_count(), 0);
        assert_eq!(second.skipped_count(), 3);
        assert!(writer.created_fields.lock().unwrap().is_empty());
        assert!(writer.created_objects.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn written_payloads_reference_destination_ids_only() {
        let mut conditional = make_field(3, "serial_number", FieldType::Text);
        conditional.conditions = vec![make_condition("category", "hardware", &[])];
        let source = make_catalog(
            vec![make_field(1, "category", FieldType::Tagger), conditional],
            vec![],
        );
        // Parent already exists at the destination under a different id
        let destination = make_catalog(vec![make_field(640, "category", FieldType::Tagger)], vec![]);
        let plan = DependencyGraph::build_plan(&source).unwrap();
        let writer = MockWriter::new();
        let mut mapping = IdMapping::new();

        run_plan(&plan, &context(&source, &destination), &writer, &mut mapping)
            .await
            .unwrap();

        let created = writer.created_fields.lock().unwrap();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].agent_conditions[0].parent_field_id, 640);
    }

    #[tokio::test]
    async fn failed_dependency_cascades_without_attempt() {
        let source = make_catalog(
            vec![make_lookup_field(1, "asset_ref", "asset")],
            vec![make_object(10, "asset")],
        );
        let destination = make_catalog(vec![], vec![]);
        let plan = DependencyGraph::build_plan(&source).unwrap();
        let writer = MockWriter::new().failing_object("asset");
        let mut mapping = IdMapping::new();

        let report = run_plan(&plan, &context(&source, &destination), &writer, &mut mapping)
            .await
            .unwrap();

        assert_eq!(report.failed_count(), 2);
        assert_eq!(report.created_count(), 0);
        // The dependent field was never attempted
        assert!(writer.created_fields.lock().unwrap().is_empty());

        let cascaded = report
            .entries
            .iter()
            .find(|e| e.entity == EntityRef::field("asset_ref"))
            .unwrap();
        match &cascaded.outcome {
            StepOutcome::Failed { cascaded_from, .. } => {
                assert_eq!(cascaded_from.as_ref(), Some(&EntityRef::object("asset")));
            }
            other => panic!("expected cascaded failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_system_field_is_failed_without_create_attempt() {
        let source = make_catalog(vec![make_field(100, "priority", FieldType::Priority)], vec![]);
        let destination = make_catalog(vec![], vec![]);
        let plan = DependencyGraph::build_plan(&source).unwrap();
        let writer = MockWriter::new();
        let mut mapping = IdMapping::new();

        let report = run_plan(&plan, &context(&source, &destination), &writer, &mut mapping)
            .await
            .unwrap();

        assert_eq!(report.failed_count(), 1);
        assert!(writer.creation_order().is_empty());
        match &report.entries[0].outcome {
            StepOutcome::Failed {
                error,
                cascaded_from,
            } => {
                assert!(error.contains("system field"));
                assert!(cascaded_from.is_none());
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn existing_dependent_is_skipped_even_when_dependency_failed() {
        let source = make_catalog(
            vec![make_lookup_field(1, "asset_ref", "asset")],
            vec![make_object(10, "asset")],
        );
        // The field already exists at the destination; only the object is
        // missing, and its creation fails
        let destination = make_catalog(vec![make_lookup_field(800, "asset_ref", "asset")], vec![]);
        let plan = DependencyGraph::build_plan(&source).unwrap();
        let writer = MockWriter::new().failing_object("asset");
        let mut mapping = IdMapping::new();

        let report = run_plan(&plan, &context(&source, &destination), &writer, &mut mapping)
            .await
            .unwrap();

        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(mapping.destination_of(&EntityRef::field("asset_ref")), Some(800));
    }

    #[tokio::test]
    async fn cascade_follows_transitive_chains() {
        let mut child = make_field(3, "child", FieldType::Text);
        child.conditions = vec![make_condition("parent", "x", &[])];
        let mut parent = make_field(2, "parent", FieldType::Text);
        parent.conditions = vec![make_condition("root", "y", &[])];
        let source = make_catalog(
            vec![child, parent, make_field(1, "root", FieldType::Tagger)],
            vec![],
        );
        let destination = make_catalog(vec![], vec![]);
        let plan = DependencyGraph::build_plan(&source).unwrap();

        let mut writer = MockWriter::new();
        writer.fail_field_titles.insert("root".to_string());
        let mut mapping = IdMapping::new();

        let report = run_plan(&plan, &context(&source, &destination), &writer, &mut mapping)
            .await
            .unwrap();

        assert_eq!(report.failed_count(), 3);
        for entry in report.failures() {
            if entry.entity.key != "root" {
                match &entry.outcome {
                    StepOutcome::Failed { cascaded_from, .. } => {
                        assert_eq!(cascaded_from.as_ref(), Some(&EntityRef::field("root")));
                    }
                    other => panic!("expected cascaded failure, got {:?}", other),
                }
            }
        }
    }
}
