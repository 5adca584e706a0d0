//! ListSync: the unified entry point.
//!
//! Owns configuration and the upstream API handles, and hands out
//! single-use [`SyncRun`]s. At most one run per target collection can be
//! alive at a time; a run is consumed when executed.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use listsync_core::{CollectionId, SyncConfig, SyncResult};
use listsync_engine::{
    IdentityApi, MembershipApi, Orchestrator, PlannedSync, SnapshotProvider, ViewSource,
};
use listsync_view::{ListView, Pacer, TokioPacer};
use tokio_util::sync::CancellationToken;

use crate::error::{ListSyncError, Result};

type ActiveTargets = Arc<Mutex<HashSet<CollectionId>>>;

/// The main ListSync struct.
///
/// Provides:
/// - Building snapshot providers from live views
/// - Previewing the plan for two providers
/// - Starting exclusive, single-use sync runs
pub struct ListSync<I: IdentityApi, M: MembershipApi, P: Pacer + Clone = TokioPacer> {
    identity: Arc<I>,
    membership: Arc<M>,
    pacer: P,
    config: SyncConfig,
    active: ActiveTargets,
}

impl<I: IdentityApi, M: MembershipApi> ListSync<I, M, TokioPacer> {
    /// Create an instance that sleeps on the tokio timer.
    pub fn new(identity: I, membership: M, config: SyncConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            identity: Arc::new(identity),
            membership: Arc::new(membership),
            pacer: TokioPacer,
            config,
            active: Arc::new(Mutex::new(HashSet::new())),
        })
    }
}

impl<I: IdentityApi, M: MembershipApi, P: Pacer + Clone> ListSync<I, M, P> {
    /// Swap the pacer (e.g. for a recording pacer in tests or dry runs).
    pub fn with_pacer<Q: Pacer + Clone>(self, pacer: Q) -> ListSync<I, M, Q> {
        ListSync {
            identity: self.identity,
            membership: self.membership,
            pacer,
            config: self.config,
            active: self.active,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Wrap a live view as a snapshot provider using the configured policy.
    pub fn view_source<V: ListView>(&self, label: impl Into<String>, view: V) -> ViewSource<V, P> {
        ViewSource::new(
            label,
            view,
            self.config.collector_policy(),
            self.pacer.clone(),
            self.config.rewind_settle(),
        )
    }

    /// Whether a run for `target` is currently alive.
    pub fn is_busy(&self, target: &CollectionId) -> bool {
        lock(&self.active).contains(target)
    }

    /// Reserve `target` and return a run that can be executed once.
    pub fn begin(&self, target: CollectionId) -> Result<SyncRun<I, M, P>> {
        let reservation = TargetReservation::acquire(&self.active, target.clone())?;

        Ok(SyncRun {
            orchestrator: Orchestrator::new(
                Arc::clone(&self.identity),
                Arc::clone(&self.membership),
                self.pacer.clone(),
                &self.config,
            ),
            target,
            cancel: CancellationToken::new(),
            _reservation: reservation,
        })
    }

    /// Begin and execute a run in one step.
    pub async fn sync<S, D>(&self, target: CollectionId, source: &S, destination: &D) -> Result<SyncResult>
    where
        S: SnapshotProvider + ?Sized,
        D: SnapshotProvider + ?Sized,
    {
        let run = self.begin(target)?;
        Ok(run.execute(source, destination).await)
    }

    /// Collect both sides and compute the plan without mutating anything.
    pub async fn preview<S, D>(&self, source: &S, destination: &D) -> Result<PlannedSync>
    where
        S: SnapshotProvider + ?Sized,
        D: SnapshotProvider + ?Sized,
    {
        let orchestrator = Orchestrator::new(
            Arc::clone(&self.identity),
            Arc::clone(&self.membership),
            self.pacer.clone(),
            &self.config,
        );
        Ok(orchestrator.plan(source, destination).await?)
    }
}

/// A single sync run against one target collection.
///
/// Holds the target's reservation until dropped. `execute` consumes the
/// run, so it cannot be started twice.
pub struct SyncRun<I: IdentityApi, M: MembershipApi, P: Pacer + Clone> {
    orchestrator: Orchestrator<Arc<I>, Arc<M>, P>,
    target: CollectionId,
    cancel: CancellationToken,
    _reservation: TargetReservation,
}

impl<I: IdentityApi, M: MembershipApi, P: Pacer + Clone> SyncRun<I, M, P> {
    pub fn target(&self) -> &CollectionId {
        &self.target
    }

    /// Handle for cancelling this run; honored between collection steps and between members.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Run the sync to completion (or cancellation).
    pub async fn execute<S, D>(self, source: &S, destination: &D) -> SyncResult
    where
        S: SnapshotProvider + ?Sized,
        D: SnapshotProvider + ?Sized,
    {
        self.orchestrator
            .run(source, destination, &self.target, &self.cancel)
            .await
    }
}

/// Marks a target as busy; releases it on drop.
struct TargetReservation {
    active: ActiveTargets,
    target: CollectionId,
}

impl TargetReservation {
    fn acquire(active: &ActiveTargets, target: CollectionId) -> Result<Self> {
        if !lock(active).insert(target.clone()) {
            tracing::warn!(collection = %target, "sync already in progress for collection");
            return Err(ListSyncError::TargetBusy(target));
        }
        tracing::debug!(collection = %target, "collection reserved");
        Ok(Self {
            active: Arc::clone(active),
            target,
        })
    }
}

impl Drop for TargetReservation {
    fn drop(&mut self) {
        lock(&self.active).remove(&self.target);
    }
}

fn lock(active: &ActiveTargets) -> MutexGuard<'_, HashSet<CollectionId>> {
    active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use listsync_engine::MemoryDirectory;
    use listsync_view::RecordingPacer;

    fn engine() -> ListSync<MemoryDirectory, MemoryDirectory, RecordingPacer> {
        let directory = MemoryDirectory::new();
        ListSync::new(directory.clone(), directory, SyncConfig::default())
            .unwrap()
            .with_pacer(RecordingPacer::new())
    }

    #[test]
    fn test_rejects_invalid_config() {
        let directory = MemoryDirectory::new();
        let config = SyncConfig {
            consecutive_error_threshold: 0,
            ..SyncConfig::default()
        };
        let result = ListSync::new(directory.clone(), directory, config);
        assert!(matches!(result, Err(ListSyncError::Config(_))));
    }

    #[test]
    fn test_one_run_per_target() {
        let sync = engine();
        let target = CollectionId::new("list-1");

        let run = sync.begin(target.clone()).unwrap();
        assert!(sync.is_busy(&target));
        assert!(matches!(sync.begin(target.clone()), Err(ListSyncError::TargetBusy(_))));

        // Other targets are independent.
        let other = sync.begin(CollectionId::new("list-2")).unwrap();
        assert_eq!(other.target().as_str(), "list-2");

        drop(run);
        assert!(!sync.is_busy(&target));
        assert!(sync.begin(target).is_ok());
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let sync = engine();
        let run = sync.begin(CollectionId::new("list")).unwrap();
        let token = run.cancel_token();
        token.cancel();
        assert!(run.cancel_token().is_cancelled());
    }
}
