//! Sync orchestration.
//!
//! Sequences one run: collect source, collect destination, reconcile, then
//! apply the plan one member at a time with pacing and a burst-failure
//! circuit breaker.
//!
//! ```text
//! source ──collect──┐
//!                   ├── reconcile ── to_add ──┬── resolve ── mutate ── pause
//! destination ──────┘                to_remove┘        (per member, in order)
//! ```
//!
//! Member failures are recorded and skipped. Collection failures abort the
//! run before any mutation. Nothing escapes [`Orchestrator::run`] as an
//! error, so a partial run still reports what it applied.

use std::time::Duration;

use listsync_core::{
    reconcile, BurstPolicy, CollectionId, Failure, MemberKey, MutationOutcome, Operation,
    OutcomeStatus, ReconciliationPlan, SyncConfig, SyncMode, SyncResult,
};
use listsync_view::{Collection, Pacer};
use tokio_util::sync::CancellationToken;

use crate::api::{IdentityApi, MembershipApi};
use crate::error::CollectError;
use crate::mutator::Mutator;
use crate::provider::SnapshotProvider;
use crate::resolver::Resolver;

/// Reason recorded for members skipped after cancellation.
pub const CANCELLED_REASON: &str = "cancelled";

/// Consecutive-failure tracking for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitState {
    consecutive_failures: u32,
}

impl RateLimitState {
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Count a failure. Returns true (and resets) when `threshold` is reached.
    pub fn record_failure(&mut self, threshold: u32) -> bool {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= threshold {
            self.consecutive_failures = 0;
            true
        } else {
            false
        }
    }
}

/// Both collections plus the plan derived from them.
#[derive(Debug, Clone)]
pub struct PlannedSync {
    pub source: Collection,
    pub destination: Collection,
    pub plan: ReconciliationPlan,
}

/// Drives a sync run against one target collection.
pub struct Orchestrator<I: IdentityApi, M: MembershipApi, P: Pacer + Clone> {
    resolver: Resolver<I, P>,
    mutator: Mutator<M>,
    pacer: P,
    mode: SyncMode,
    inter_request_delay: Duration,
    burst: BurstPolicy,
}

impl<I: IdentityApi, M: MembershipApi, P: Pacer + Clone> Orchestrator<I, M, P> {
    pub fn new(identity: I, membership: M, pacer: P, config: &SyncConfig) -> Self {
        Self {
            resolver: Resolver::new(identity, pacer.clone(), config.resolver_policy()),
            mutator: Mutator::new(membership),
            pacer,
            mode: config.mode,
            inter_request_delay: config.inter_request_delay(),
            burst: config.burst_policy(),
        }
    }

    /// Collect both sides and compute the plan without mutating anything.
    pub async fn plan<S, D>(
        &self,
        source: &S,
        destination: &D,
    ) -> std::result::Result<PlannedSync, CollectError>
    where
        S: SnapshotProvider + ?Sized,
        D: SnapshotProvider + ?Sized,
    {
        let source_collection = source.collect().await?;
        tracing::info!(
            source = source.label(),
            members = source_collection.snapshot.len(),
            "source collected"
        );

        let destination_collection = destination.collect().await?;
        tracing::info!(
            destination = destination.label(),
            members = destination_collection.snapshot.len(),
            "destination collected"
        );

        let plan = reconcile(
            &source_collection.snapshot,
            &destination_collection.snapshot,
            self.mode,
        );

        Ok(PlannedSync {
            source: source_collection,
            destination: destination_collection,
            plan,
        })
    }

    /// Run a full sync. Never fails; see the module docs.
    ///
    /// Cancellation is honored before and during each collection, before
    /// the plan is applied, and between members.
    pub async fn run<S, D>(
        &self,
        source: &S,
        destination: &D,
        target: &CollectionId,
        cancel: &CancellationToken,
    ) -> SyncResult
    where
        S: SnapshotProvider + ?Sized,
        D: SnapshotProvider + ?Sized,
    {
        let mut result = SyncResult::new();
        tracing::info!(mode = %self.mode, collection = %target, "starting sync");

        let Some(source_collection) = collect_unless_cancelled("source", source, cancel, &mut result).await else {
            return result;
        };
        let Some(destination_collection) =
            collect_unless_cancelled("destination", destination, cancel, &mut result).await
        else {
            return result;
        };

        result.source = Some(source_collection.summary());
        result.destination = Some(destination_collection.summary());

        if cancel.is_cancelled() {
            tracing::info!("sync cancelled before applying changes");
            result.cancelled = true;
        }

        let source_empty = source_collection.snapshot.is_empty();
        let destination_empty = destination_collection.snapshot.is_empty();
        if source_empty && destination_empty {
            tracing::info!("both snapshots are empty, nothing to do");
            return result;
        }
        if source_empty {
            tracing::warn!(source = source.label(), "source snapshot is empty");
        }
        if destination_empty {
            tracing::warn!(destination = destination.label(), "destination snapshot is empty");
        }

        let plan = reconcile(
            &source_collection.snapshot,
            &destination_collection.snapshot,
            self.mode,
        );
        tracing::info!(
            to_add = plan.to_add.len(),
            to_remove = plan.to_remove.len(),
            "plan computed"
        );

        self.apply(&plan, target, cancel, &mut result).await;

        tracing::info!(
            added = result.added_count,
            removed = result.removed_count,
            errors = result.error_count,
            skipped = result.skipped_count,
            cancelled = result.cancelled,
            "sync complete"
        );
        result
    }

    /// Apply the plan: adds first, then removes.
    ///
    /// One failure counter spans both phases, so failures at the end of the
    /// adds and the start of the removes count as one burst.
    async fn apply(
        &self,
        plan: &ReconciliationPlan,
        target: &CollectionId,
        cancel: &CancellationToken,
        result: &mut SyncResult,
    ) {
        let total = plan.len();
        let work = plan
            .to_add
            .iter()
            .map(|key| (key, Operation::Add))
            .chain(plan.to_remove.iter().map(|key| (key, Operation::Remove)));

        let mut state = RateLimitState::default();

        for (index, (key, operation)) in work.enumerate() {
            if cancel.is_cancelled() {
                result.cancelled = true;
                result.record(MutationOutcome {
                    key: key.clone(),
                    operation,
                    status: OutcomeStatus::Skipped(CANCELLED_REASON.to_string()),
                });
                continue;
            }

            tracing::debug!(key = %key, operation = operation.as_str(), progress = index + 1, total, "processing member");
            let outcome = MutationOutcome {
                key: key.clone(),
                operation,
                status: self.process(key, operation, target).await,
            };
            let failed = outcome.is_failure();
            result.record(outcome);

            self.pause_unless_cancelled(self.inter_request_delay, cancel).await;

            if failed {
                if state.record_failure(self.burst.threshold) {
                    tracing::warn!(
                        threshold = self.burst.threshold,
                        backoff_ms = self.burst.backoff.as_millis() as u64,
                        "consecutive failures, extended backoff"
                    );
                    self.pause_unless_cancelled(self.burst.backoff, cancel).await;
                }
            } else {
                state.record_success();
            }
        }
    }

    /// Resolve then mutate one member.
    async fn process(&self, key: &MemberKey, operation: Operation, target: &CollectionId) -> OutcomeStatus {
        let id = match self.resolver.resolve(key).await {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(key = %key, operation = operation.as_str(), error = %e, "could not resolve member");
                return OutcomeStatus::Failed(Failure::resolve(e.to_string()));
            }
        };

        match self.mutator.apply(operation, &id, target).await {
            Ok(()) => {
                tracing::info!(key = %key, operation = operation.as_str(), "member updated");
                match operation {
                    Operation::Add => OutcomeStatus::Added,
                    Operation::Remove => OutcomeStatus::Removed,
                }
            }
            Err(e) => OutcomeStatus::Failed(Failure::mutate(e.to_string())),
        }
    }

    /// Pause, returning early if the run is cancelled meanwhile.
    async fn pause_unless_cancelled(&self, duration: Duration, cancel: &CancellationToken) {
        tokio::select! {
            _ = self.pacer.pause(duration) => {}
            _ = cancel.cancelled() => {}
        }
    }
}

/// Collect one side, giving up as soon as `cancel` fires.
///
/// Returns `None` when the run must stop; `result` then says why.
async fn collect_unless_cancelled<P: SnapshotProvider + ?Sized>(
    side: &'static str,
    provider: &P,
    cancel: &CancellationToken,
    result: &mut SyncResult,
) -> Option<Collection> {
    if cancel.is_cancelled() {
        tracing::info!(side, provider = provider.label(), "sync cancelled before collection");
        result.cancelled = true;
        return None;
    }

    let collected = tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            tracing::info!(side, provider = provider.label(), "sync cancelled during collection");
            result.cancelled = true;
            return None;
        }
        collected = provider.collect() => collected,
    };

    match collected {
        Ok(collection) => {
            tracing::info!(side, provider = provider.label(), members = collection.snapshot.len(), "collected");
            Some(collection)
        }
        Err(e) => {
            tracing::warn!(side, provider = provider.label(), error = %e, "collection failed, nothing applied");
            result.aborted = Some(e.to_string());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::memory::MemoryDirectory;
    use crate::api::ApiResult;
    use crate::error::ApiError;
    use crate::provider::{StaticSource, ViewSource};
    use async_trait::async_trait;
    use listsync_core::{FailureStage, MembershipSnapshot, StableId};
    use listsync_view::{ListView, MemoryListView, RecordingPacer};

    const DELAY: Duration = Duration::from_millis(3);
    const EXTENDED: Duration = Duration::from_millis(600);

    fn config(mode: SyncMode) -> SyncConfig {
        SyncConfig {
            mode,
            inter_request_delay_ms: 3,
            extended_backoff_ms: 600,
            resolver_base_delay_ms: 1,
            ..SyncConfig::default()
        }
    }

    fn source(keys: &[&str]) -> StaticSource {
        StaticSource::new("source", keys.iter().copied().collect::<MembershipSnapshot>())
    }

    fn setup(mode: SyncMode) -> (MemoryDirectory, RecordingPacer, Orchestrator<MemoryDirectory, MemoryDirectory, RecordingPacer>) {
        let directory = MemoryDirectory::new();
        let pacer = RecordingPacer::new();
        let orchestrator = Orchestrator::new(directory.clone(), directory.clone(), pacer.clone(), &config(mode));
        (directory, pacer, orchestrator)
    }

    #[test]
    fn test_rate_limit_state() {
        let mut state = RateLimitState::default();
        assert!(!state.record_failure(3));
        assert!(!state.record_failure(3));
        state.record_success();
        assert_eq!(state.consecutive_failures(), 0);
        assert!(!state.record_failure(3));
        assert!(!state.record_failure(3));
        assert!(state.record_failure(3));
        assert_eq!(state.consecutive_failures(), 0);
    }

    #[tokio::test]
    async fn test_full_sync() {
        let (directory, pacer, orchestrator) = setup(SyncMode::Full);
        let list = CollectionId::new("list");
        directory.register_all(["a", "b", "c", "d"]);
        directory.seed_collection(&list, ["b", "c", "d"]);

        let result = orchestrator
            .run(&source(&["a", "b", "c"]), &source(&["b", "c", "d"]), &list, &CancellationToken::new())
            .await;

        assert_eq!(result.added_count, 1);
        assert_eq!(result.removed_count, 1);
        assert_eq!(result.error_count, 0);
        assert_eq!(result.outcomes[0].operation, Operation::Add);
        assert_eq!(result.outcomes[1].operation, Operation::Remove);
        assert_eq!(pacer.count_of(DELAY), 2);
        assert_eq!(
            directory.members(&list),
            ["a", "b", "c"].into_iter().collect::<MembershipSnapshot>()
        );
    }

    #[tokio::test]
    async fn test_both_empty_short_circuits() {
        let (directory, pacer, orchestrator) = setup(SyncMode::Full);

        let result = orchestrator
            .run(&source(&[]), &source(&[]), &CollectionId::new("list"), &CancellationToken::new())
            .await;

        assert_eq!(result.added_count, 0);
        assert_eq!(result.removed_count, 0);
        assert_eq!(result.error_count, 0);
        assert!(result.outcomes.is_empty());
        assert!(result.aborted.is_none());
        assert_eq!(result.source.map(|s| s.members), Some(0));
        assert_eq!(directory.total_calls(), 0);
        assert!(pacer.pauses().is_empty());
    }

    #[tokio::test]
    async fn test_not_found_recorded_and_not_retried() {
        let (directory, _pacer, orchestrator) = setup(SyncMode::Add);
        directory.register("b");

        let result = orchestrator
            .run(&source(&["a", "b"]), &source(&[]), &CollectionId::new("list"), &CancellationToken::new())
            .await;

        let a = MemberKey::new("a");
        let outcome = result.outcome_for(&a).unwrap();
        assert_eq!(outcome.status, OutcomeStatus::Failed(Failure::resolve("not found")));
        assert_eq!(directory.lookup_calls(&a), 1);
        assert_eq!(result.added_count, 1);
        assert_eq!(result.error_count, 1);
    }

    #[tokio::test]
    async fn test_burst_failures_trigger_one_extended_backoff() {
        let (directory, pacer, orchestrator) = setup(SyncMode::Add);
        // a, b, c are unknown; d, e resolve.
        directory.register_all(["d", "e"]);

        let result = orchestrator
            .run(&source(&["a", "b", "c", "d", "e"]), &source(&[]), &CollectionId::new("list"), &CancellationToken::new())
            .await;

        assert_eq!(result.error_count, 3);
        assert_eq!(result.added_count, 2);
        assert_eq!(pacer.count_of(EXTENDED), 1);
        assert_eq!(pacer.count_of(DELAY), 5);
    }

    #[tokio::test]
    async fn test_mutation_failure_recorded() {
        let (directory, _pacer, orchestrator) = setup(SyncMode::Full);
        let list = CollectionId::new("list");
        directory.seed_collection(&list, ["old"]);
        directory.script_mutation_failures("old", [ApiError::from_status(500, "server error")]);

        let result = orchestrator
            .run(&source(&["x"]), &source(&["old"]), &list, &CancellationToken::new())
            .await;

        let outcome = result.outcome_for(&MemberKey::new("old")).unwrap();
        match &outcome.status {
            OutcomeStatus::Failed(failure) => assert_eq!(failure.stage, FailureStage::Mutate),
            other => panic!("expected failure, got {:?}", other),
        }
        // "x" is not registered either.
        assert_eq!(result.error_count, 2);
    }

    #[tokio::test]
    async fn test_cancelled_before_run_collects_nothing() {
        let (directory, _pacer, orchestrator) = setup(SyncMode::Full);
        directory.register_all(["a", "b"]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = orchestrator
            .run(&source(&["a", "b"]), &source(&[]), &CollectionId::new("list"), &cancel)
            .await;

        assert!(result.cancelled);
        assert!(result.source.is_none());
        assert!(result.outcomes.is_empty());
        assert_eq!(directory.total_calls(), 0);
    }

    /// Cancels the run when a given member is looked up.
    struct CancelOnLookup {
        directory: MemoryDirectory,
        trigger: MemberKey,
        cancel: CancellationToken,
    }

    #[async_trait]
    impl IdentityApi for CancelOnLookup {
        async fn lookup(&self, key: &MemberKey) -> ApiResult<Option<StableId>> {
            if *key == self.trigger {
                self.cancel.cancel();
            }
            self.directory.lookup(key).await
        }
    }

    #[tokio::test]
    async fn test_cancel_mid_apply_finishes_current_member() {
        let directory = MemoryDirectory::new();
        directory.register_all(["a", "b", "c", "d"]);
        let cancel = CancellationToken::new();
        let identity = CancelOnLookup {
            directory: directory.clone(),
            trigger: MemberKey::new("b"),
            cancel: cancel.clone(),
        };
        let orchestrator = Orchestrator::new(identity, directory.clone(), RecordingPacer::new(), &config(SyncMode::Add));
        let list = CollectionId::new("list");

        let result = orchestrator
            .run(&source(&["a", "b", "c", "d"]), &source(&[]), &list, &cancel)
            .await;

        assert!(result.cancelled);
        assert_eq!(result.added_count, 2);
        assert_eq!(result.skipped_count, 2);
        for key in ["c", "d"] {
            assert_eq!(
                result.outcome_for(&MemberKey::new(key)).unwrap().status,
                OutcomeStatus::Skipped(CANCELLED_REASON.to_string())
            );
        }
        assert_eq!(directory.mutation_calls(), 2);
        assert_eq!(directory.members(&list), ["a", "b"].into_iter().collect::<MembershipSnapshot>());
    }

    /// Cancels the run after a number of reveals.
    struct CancellingView {
        inner: MemoryListView,
        after: u32,
        cancel: CancellationToken,
    }

    #[async_trait]
    impl ListView for CancellingView {
        async fn visible_keys(&self) -> Vec<MemberKey> {
            self.inner.visible_keys().await
        }

        async fn reveal_more(&self) {
            self.inner.reveal_more().await;
            if self.inner.reveal_count() >= self.after {
                self.cancel.cancel();
            }
        }
    }

    fn numbered_view(count: usize) -> MemoryListView {
        MemoryListView::new((0..count).map(|i| format!("user{}", i)), 5, 5)
    }

    #[tokio::test]
    async fn test_cancel_during_collection_stops_scrolling() {
        let directory = MemoryDirectory::new();
        let pacer = RecordingPacer::new();
        let cfg = config(SyncMode::Full);
        let orchestrator = Orchestrator::new(directory.clone(), directory.clone(), pacer.clone(), &cfg);
        let cancel = CancellationToken::new();

        let following = ViewSource::new(
            "following",
            CancellingView {
                inner: numbered_view(100),
                after: 3,
                cancel: cancel.clone(),
            },
            cfg.collector_policy(),
            pacer.clone(),
            cfg.rewind_settle(),
        );
        let members = ViewSource::new(
            "list members",
            numbered_view(100),
            cfg.collector_policy(),
            pacer.clone(),
            cfg.rewind_settle(),
        );

        let result = orchestrator
            .run(&following, &members, &CollectionId::new("list"), &cancel)
            .await;

        assert!(result.cancelled);
        assert!(result.source.is_none());
        assert!(result.outcomes.is_empty());
        assert_eq!(following.view().inner.reveal_count(), 3);
        assert_eq!(members.view().reveal_count(), 0);
        assert_eq!(directory.total_calls(), 0);
    }

    /// Cancels the run while handing over its snapshot.
    struct CancelOnCollect {
        inner: StaticSource,
        cancel: CancellationToken,
    }

    #[async_trait]
    impl SnapshotProvider for CancelOnCollect {
        fn label(&self) -> &str {
            self.inner.label()
        }

        async fn collect(&self) -> std::result::Result<Collection, CollectError> {
            self.cancel.cancel();
            self.inner.collect().await
        }
    }

    #[tokio::test]
    async fn test_cancel_after_collection_with_empty_plan_is_reported() {
        let (directory, _pacer, orchestrator) = setup(SyncMode::Full);
        let cancel = CancellationToken::new();
        let destination = CancelOnCollect {
            inner: source(&["a"]),
            cancel: cancel.clone(),
        };

        let result = orchestrator
            .run(&source(&["a"]), &destination, &CollectionId::new("list"), &cancel)
            .await;

        assert!(result.cancelled);
        assert_eq!(result.destination.map(|d| d.members), Some(1));
        assert!(result.outcomes.is_empty());
        assert_eq!(directory.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_failure_burst_spans_add_and_remove_phases() {
        let (directory, pacer, orchestrator) = setup(SyncMode::Full);
        let list = CollectionId::new("list");
        // a and b are unknown; removing y fails upstream.
        directory.seed_collection(&list, ["y"]);
        directory.script_mutation_failures("y", [ApiError::from_status(500, "server error")]);

        let result = orchestrator
            .run(&source(&["a", "b"]), &source(&["y"]), &list, &CancellationToken::new())
            .await;

        assert_eq!(result.error_count, 3);
        assert_eq!(pacer.count_of(EXTENDED), 1);
    }

    #[tokio::test]
    async fn test_plan_preview_does_not_mutate() {
        let (directory, _pacer, orchestrator) = setup(SyncMode::Full);

        let planned = orchestrator.plan(&source(&["a"]), &source(&["b"])).await.unwrap();

        assert_eq!(planned.plan.len(), 2);
        assert_eq!(directory.total_calls(), 0);
    }
}
