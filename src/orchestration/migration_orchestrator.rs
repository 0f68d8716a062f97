//! # Migration Orchestrator
//!
//! Drives a full run: orders object types by dependency, then for each type queries the
//! source, transforms records, creates them in the destination, registers the new ids
//! and patches every deferred reference that became resolvable.
//!
//! ## Failure handling
//!
//! - A record that cannot be transformed or created is reported and skipped.
//! - A query failure fails its object type only.
//! - A duplicate mapping stops further submissions for that object type; submissions
//!   already in flight finish and the type ends `Failed`.
//! - References still unresolved at the end are reported as orphans.

use chrono::Utc;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::cancellation::CancellationFlag;
use super::deferral_queue::{DeferralQueue, ResolvedDeferral};
use super::dependency_graph::DependencyGraph;
use super::report::{FailureStage, MigrationReport, ObjectFault, ObjectReport, RecordFailure};
use crate::client::{ApiError, DataApiClient, UserRemap, UserRemapSource};
use crate::config::ConfigManager;
use crate::constants::{components, USER_OBJECT};
use crate::error::Result;
use crate::logging::{log_error, log_object_operation, log_record_operation};
use crate::manifest::{Manifest, ManifestObject};
use crate::mapping::{DuplicateMappingError, RelationMapper};
use crate::models::{FieldMap, LookupDeferral, UserRemapSets};
use crate::query_builder::build_query;
use crate::resilience::RetryPolicy;
use crate::state_machine::{ObjectMigrationEvent, ObjectStateMachine};
use crate::transform::{ObjectTransformer, TransformedRecord, UserFallbackPolicy};

/// Mutable state shared by every object type of one run
struct RunContext {
    queue: DeferralQueue,
    users: Arc<UserRemapSets>,
    user_policy: UserFallbackPolicy,
    failures: Mutex<Vec<RecordFailure>>,
    /// Patched field count per lowercase object type
    patched: Mutex<HashMap<String, usize>>,
}

impl RunContext {
    fn record_failure(&self, failure: RecordFailure) {
        self.failures.lock().push(failure);
    }

    fn add_patched(&self, object_type: &str, count: usize) {
        *self
            .patched
            .lock()
            .entry(object_type.to_ascii_lowercase())
            .or_default() += count;
    }

    fn patched_for(&self, object_type: &str) -> usize {
        self.patched
            .lock()
            .get(&object_type.to_ascii_lowercase())
            .copied()
            .unwrap_or(0)
    }
}

enum SubmitOutcome {
    Created,
    Failed(RecordFailure),
    Duplicate {
        source_id: String,
        error: DuplicateMappingError,
    },
    NotAttempted {
        source_id: String,
    },
}

/// Deferred fields of one destination record, applied in a single update
struct PatchBatch {
    object_type: String,
    destination_id: String,
    fields: FieldMap,
    deferrals: Vec<LookupDeferral>,
}

pub struct MigrationOrchestrator {
    source: Arc<dyn DataApiClient>,
    destination: Arc<dyn DataApiClient>,
    config: Arc<ConfigManager>,
    mapper: Arc<RelationMapper>,
    user_remap_source: Option<Arc<dyn UserRemapSource>>,
    cancellation: CancellationFlag,
    retry: RetryPolicy,
}

impl MigrationOrchestrator {
    pub fn new(
        source: Arc<dyn DataApiClient>,
        destination: Arc<dyn DataApiClient>,
        config: Arc<ConfigManager>,
    ) -> Self {
        let retry = RetryPolicy::from_config(&config.config().retry);
        Self {
            source,
            destination,
            config,
            mapper: Arc::new(RelationMapper::new()),
            user_remap_source: None,
            cancellation: CancellationFlag::new(),
            retry,
        }
    }

    /// Start from existing mappings, e.g. from an earlier partial run
    pub fn with_relation_mapper(mut self, mapper: Arc<RelationMapper>) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn with_user_remap_source(mut self, source: Arc<dyn UserRemapSource>) -> Self {
        self.user_remap_source = Some(source);
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationFlag) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn relation_mapper(&self) -> Arc<RelationMapper> {
        Arc::clone(&self.mapper)
    }

    pub fn cancellation_flag(&self) -> CancellationFlag {
        self.cancellation.clone()
    }

    /// Migrate every object in `manifest` and report the outcome.
    ///
    /// Returns an error only when the run cannot start: an invalid manifest, a failed
    /// user remap load, or conflicting preloaded user mappings.
    #[instrument(skip_all, fields(objects = manifest.objects.len()))]
    pub async fn run(&self, manifest: &Manifest) -> Result<MigrationReport> {
        manifest.validate()?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(run_id = %run_id, "Starting migration run");

        let remap = self.load_user_remap().await?;
        let preloaded = self.mapper.preload(USER_OBJECT, remap.known_users)?;
        let ctx = RunContext {
            queue: DeferralQueue::new(),
            users: Arc::new(remap.sets),
            user_policy: UserFallbackPolicy::from_config(
                &self.config.config().users,
                self.destination.current_user_id(),
            ),
            failures: Mutex::new(Vec::new()),
            patched: Mutex::new(HashMap::new()),
        };

        let plan = DependencyGraph::from_manifest(manifest).plan();
        info!(
            run_id = %run_id,
            levels = ?plan.levels,
            cycle_breaks = ?plan.cycle_breaks,
            preloaded_users = preloaded,
            "Processing plan computed"
        );

        let mut objects = Vec::with_capacity(manifest.objects.len());
        for level in &plan.levels {
            let level_reports = join_all(
                level
                    .iter()
                    .filter_map(|name| manifest.object(name))
                    .map(|object| self.migrate_object(object, &ctx)),
            )
            .await;
            objects.extend(level_reports);
        }

        // Mappings registered outside this run (preloads) may still satisfy deferrals
        self.patch_resolvable(&ctx).await;

        let orphaned = ctx.queue.take_remaining();
        for orphan in &orphaned {
            warn!(deferral = %orphan, "Reference left unresolved");
        }
        for report in &mut objects {
            report.patched = ctx.patched_for(&report.object_type);
        }
        let failed_records = std::mem::take(&mut *ctx.failures.lock());

        let report = MigrationReport {
            run_id,
            started_at,
            finished_at: Utc::now(),
            created: objects.iter().map(|o| o.created).sum(),
            patched: objects.iter().map(|o| o.patched).sum(),
            plan,
            objects,
            orphaned,
            failed_records,
            cancelled: self.cancellation.is_cancelled(),
            mappings: self.mapper.snapshot(),
        };

        info!(
            run_id = %run_id,
            created = report.created,
            patched = report.patched,
            orphaned = report.orphaned.len(),
            failed_records = report.failed_records.len(),
            failed_objects = report.failed_objects().len(),
            cancelled = report.cancelled,
            "Migration run finished"
        );

        Ok(report)
    }

    async fn load_user_remap(&self) -> Result<UserRemap> {
        match &self.user_remap_source {
            Some(source) => Ok(self.retry.run("load user remap", || source.load()).await?),
            None => Ok(UserRemap::default()),
        }
    }

    async fn migrate_object(&self, object: &ManifestObject, ctx: &RunContext) -> ObjectReport {
        let mut machine = ObjectStateMachine::new(&object.api_name);
        let mut report = ObjectReport::new(&object.api_name);

        if let Err(fault) = self
            .process_object(object, ctx, &mut machine, &mut report)
            .await
        {
            let event = match fault {
                ObjectFault::Cancelled => ObjectMigrationEvent::Cancel,
                ref other => ObjectMigrationEvent::fail_with_error(other.to_string()),
            };
            log_object_operation(
                "migrate",
                &object.api_name,
                "stopped",
                None,
                Some(&fault.to_string()),
            );
            advance(&mut machine, event);
            report.fault = Some(fault);
        }

        report.state = machine.current_state();
        report.transitions = machine.history().to_vec();
        report
    }

    async fn process_object(
        &self,
        object: &ManifestObject,
        ctx: &RunContext,
        machine: &mut ObjectStateMachine,
        report: &mut ObjectReport,
    ) -> std::result::Result<(), ObjectFault> {
        if self.cancellation.is_cancelled() {
            return Err(ObjectFault::Cancelled);
        }
        advance(machine, ObjectMigrationEvent::StartQuery);

        let settings = &self.config.config().migration;
        let query = build_query(
            &object.api_name,
            &object.queryable_columns(),
            object.filter.as_deref(),
            object.row_limit.or(settings.default_row_limit),
        )
        .map_err(|e| {
            log_error(
                components::QUERY_BUILDER,
                "build_query",
                &e.to_string(),
                Some(&object.api_name),
            );
            ObjectFault::InvalidQuery {
                message: e.to_string(),
            }
        })?;

        log_object_operation("query", &object.api_name, "started", None, Some(&query));
        let records = self
            .retry
            .run(&format!("query {}", object.api_name), || {
                self.source.query(&query)
            })
            .await
            .map_err(|e| {
                log_error(
                    components::ORCHESTRATOR,
                    "query",
                    &e.to_string(),
                    Some(&object.api_name),
                );
                ObjectFault::QueryFailed {
                    message: e.to_string(),
                }
            })?;
        report.queried = records.len();
        advance(machine, ObjectMigrationEvent::RecordsFetched(records.len()));

        let transformer =
            ObjectTransformer::new(Arc::new(object.clone()), Arc::clone(&self.mapper))
                .with_user_remap(Arc::clone(&ctx.users))
                .with_user_policy(ctx.user_policy.clone());

        let mut ready = Vec::with_capacity(records.len());
        for record in records {
            let source_id = record.id.clone();
            match transformer.transform(record) {
                Ok(transformed) => ready.push(transformed),
                Err(e) => {
                    log_error(
                        components::TRANSFORMER,
                        "transform",
                        &e.to_string(),
                        Some(&format!("{}/{source_id}", object.api_name)),
                    );
                    report.failed += 1;
                    ctx.record_failure(RecordFailure::new(
                        &object.api_name,
                        &source_id,
                        FailureStage::Transform,
                        e.to_string(),
                    ));
                }
            }
        }
        advance(machine, ObjectMigrationEvent::Submit);

        let halted = AtomicBool::new(false);
        let outcomes: Vec<SubmitOutcome> = stream::iter(ready)
            .map(|transformed| self.submit_record(&object.api_name, transformed, ctx, &halted))
            .buffer_unordered(settings.max_concurrent_submissions.max(1))
            .collect()
            .await;

        let mut duplicate = None;
        for outcome in outcomes {
            match outcome {
                SubmitOutcome::Created => report.created += 1,
                SubmitOutcome::Failed(failure) => {
                    report.failed += 1;
                    ctx.record_failure(failure);
                }
                SubmitOutcome::Duplicate { source_id, error } => {
                    report.failed += 1;
                    ctx.record_failure(RecordFailure::new(
                        &object.api_name,
                        &source_id,
                        FailureStage::Create,
                        error.to_string(),
                    ));
                    duplicate.get_or_insert(error);
                }
                SubmitOutcome::NotAttempted { source_id } => {
                    report.failed += 1;
                    ctx.record_failure(RecordFailure::new(
                        &object.api_name,
                        &source_id,
                        FailureStage::Halted,
                        "not submitted after a duplicate mapping",
                    ));
                }
            }
        }
        log_object_operation(
            "submit",
            &object.api_name,
            "completed",
            Some(report.created),
            None,
        );

        if let Some(error) = duplicate {
            // Records registered before the halt can still satisfy deferrals
            self.patch_resolvable(ctx).await;
            return Err(ObjectFault::DuplicateMapping {
                message: error.to_string(),
            });
        }

        advance(machine, ObjectMigrationEvent::SubmissionsComplete);
        self.patch_resolvable(ctx).await;
        advance(machine, ObjectMigrationEvent::Complete);

        Ok(())
    }

    async fn submit_record(
        &self,
        object_type: &str,
        transformed: TransformedRecord,
        ctx: &RunContext,
        halted: &AtomicBool,
    ) -> SubmitOutcome {
        let source_id = transformed.record.source_id().to_string();
        if halted.load(Ordering::SeqCst) {
            return SubmitOutcome::NotAttempted { source_id };
        }

        let payload = transformed.record.record.create_payload();
        let operation = format!("create {object_type}/{source_id}");
        let destination_id = match self
            .retry
            .run(&operation, || self.destination.create(object_type, &payload))
            .await
        {
            Ok(id) => id,
            Err(e) => {
                log_error(
                    components::CLIENT,
                    "create",
                    &e.to_string(),
                    Some(&format!("{object_type}/{source_id}")),
                );
                return SubmitOutcome::Failed(RecordFailure::new(
                    object_type,
                    &source_id,
                    FailureStage::Create,
                    e.to_string(),
                ));
            }
        };

        if let Err(error) = self.mapper.register(object_type, &source_id, &destination_id) {
            log_error(
                components::RELATION_MAPPER,
                "register",
                &error.to_string(),
                Some(&format!("{object_type}/{source_id}")),
            );
            halted.store(true, Ordering::SeqCst);
            return SubmitOutcome::Duplicate { source_id, error };
        }

        log_record_operation(
            "create",
            object_type,
            &source_id,
            Some(&destination_id),
            "created",
            None,
        );
        ctx.queue.enqueue_all(
            transformed
                .deferrals
                .into_iter()
                .map(|deferral| deferral.bind(&destination_id)),
        );
        SubmitOutcome::Created
    }

    /// Patch every deferral whose target is now registered; returns the patched field count
    async fn patch_resolvable(&self, ctx: &RunContext) -> usize {
        let resolved = ctx.queue.drain_resolvable(&self.mapper);
        if resolved.is_empty() {
            return 0;
        }

        let mut batches: BTreeMap<(String, String), PatchBatch> = BTreeMap::new();
        for ResolvedDeferral {
            deferral,
            target_destination_id,
        } in resolved
        {
            let Some(destination_id) = deferral.record_destination_id.clone() else {
                continue;
            };
            let batch = batches
                .entry((deferral.object_type.to_ascii_lowercase(), destination_id.clone()))
                .or_insert_with(|| PatchBatch {
                    object_type: deferral.object_type.clone(),
                    destination_id,
                    fields: FieldMap::new(),
                    deferrals: Vec::new(),
                });
            batch
                .fields
                .insert(deferral.field_name.clone(), Value::String(target_destination_id));
            batch.deferrals.push(deferral);
        }

        let concurrency = self.config.config().migration.max_concurrent_submissions.max(1);
        let results: Vec<(PatchBatch, std::result::Result<(), ApiError>)> =
            stream::iter(batches.into_values())
                .map(|batch| async move {
                    let operation =
                        format!("update {}/{}", batch.object_type, batch.destination_id);
                    let result = self
                        .retry
                        .run(&operation, || {
                            self.destination.update(
                                &batch.object_type,
                                &batch.destination_id,
                                &batch.fields,
                            )
                        })
                        .await;
                    (batch, result)
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;

        let mut patched = 0;
        for (batch, result) in results {
            match result {
                Ok(()) => {
                    patched += batch.deferrals.len();
                    ctx.add_patched(&batch.object_type, batch.deferrals.len());
                    let source_id = batch
                        .deferrals
                        .first()
                        .map_or("", |deferral| deferral.record_source_id.as_str());
                    log_record_operation(
                        "patch",
                        &batch.object_type,
                        source_id,
                        Some(&batch.destination_id),
                        "patched",
                        None,
                    );
                }
                Err(e) => {
                    log_error(
                        components::CLIENT,
                        "update",
                        &e.to_string(),
                        Some(&format!("{}/{}", batch.object_type, batch.destination_id)),
                    );
                    for deferral in batch.deferrals {
                        ctx.record_failure(RecordFailure::new(
                            &deferral.object_type,
                            &deferral.record_source_id,
                            FailureStage::Patch,
                            format!("{}: {e}", deferral.field_name),
                        ));
                    }
                }
            }
        }
        patched
    }
}

fn advance(machine: &mut ObjectStateMachine, event: ObjectMigrationEvent) {
    if let Err(e) = machine.transition(event) {
        log_error(
            components::ORCHESTRATOR,
            "state_transition",
            &e.to_string(),
            Some(machine.object_type()),
        );
    }
}
