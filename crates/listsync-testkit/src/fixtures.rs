//! Test fixtures and helpers.
//!
//! Common setup code for orchestration and end-to-end tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use listsync_core::{CollectionId, MemberKey, MembershipSnapshot, SyncConfig, SyncMode};
use listsync_engine::{MemoryDirectory, Orchestrator, StaticSource, ViewSource};
use listsync_view::{ListView, MemoryListView, RecordingPacer};

/// Pause after each member in [`fast_config`].
pub const FAST_INTER_REQUEST: Duration = Duration::from_millis(3);
/// Extended backoff in [`fast_config`].
pub const FAST_EXTENDED_BACKOFF: Duration = Duration::from_millis(60);
/// Collector settle in [`fast_config`].
pub const FAST_SETTLE: Duration = Duration::from_millis(8);

/// Default config scaled down so every delay is distinguishable.
pub fn fast_config(mode: SyncMode) -> SyncConfig {
    SyncConfig {
        mode,
        inter_request_delay_ms: FAST_INTER_REQUEST.as_millis() as u64,
        extended_backoff_ms: FAST_EXTENDED_BACKOFF.as_millis() as u64,
        collector_settle_ms: FAST_SETTLE.as_millis() as u64,
        rewind_settle_ms: 10,
        stable_iterations_to_stop: 3,
        resolver_base_delay_ms: 30,
        ..SyncConfig::default()
    }
}

/// Build a snapshot from string keys.
pub fn snapshot(keys: &[&str]) -> MembershipSnapshot {
    keys.iter().copied().collect()
}

/// A directory, a recording pacer and a target collection.
pub struct SyncFixture {
    pub directory: MemoryDirectory,
    pub pacer: RecordingPacer,
    pub target: CollectionId,
    pub config: SyncConfig,
}

impl SyncFixture {
    /// Empty directory with [`fast_config`].
    pub fn new(mode: SyncMode) -> Self {
        Self {
            directory: MemoryDirectory::new(),
            pacer: RecordingPacer::new(),
            target: CollectionId::new("list-1"),
            config: fast_config(mode),
        }
    }

    /// Register every source user and seed the target with `destination`.
    pub fn with_members(source: &[&str], destination: &[&str], mode: SyncMode) -> Self {
        let fixture = Self::new(mode);
        fixture.directory.register_all(source.iter().copied());
        fixture
            .directory
            .seed_collection(&fixture.target, destination.iter().copied());
        fixture
    }

    pub fn orchestrator(&self) -> Orchestrator<MemoryDirectory, MemoryDirectory, RecordingPacer> {
        Orchestrator::new(
            self.directory.clone(),
            self.directory.clone(),
            self.pacer.clone(),
            &self.config,
        )
    }

    /// A provider with fixed membership.
    pub fn static_source(&self, label: &str, keys: &[&str]) -> StaticSource {
        StaticSource::new(label, snapshot(keys))
    }

    /// A provider scrolling an in-memory view.
    pub fn view_source(&self, label: &str, view: MemoryListView) -> ViewSource<MemoryListView, RecordingPacer> {
        ViewSource::new(
            label,
            view,
            self.config.collector_policy(),
            self.pacer.clone(),
            self.config.rewind_settle(),
        )
    }

    pub fn destination_members(&self) -> MembershipSnapshot {
        self.directory.members(&self.target)
    }

    /// How many extended backoffs the pacer saw.
    pub fn extended_backoffs(&self) -> usize {
        self.pacer.count_of(self.config.extended_backoff())
    }

    /// How many inter-request pauses the pacer saw.
    pub fn inter_request_pauses(&self) -> usize {
        self.pacer.count_of(self.config.inter_request_delay())
    }
}

/// A view that shows one brand-new member after every reveal.
#[derive(Default)]
pub struct EndlessView {
    reveals: AtomicU32,
}

impl EndlessView {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ListView for EndlessView {
    async fn visible_keys(&self) -> Vec<MemberKey> {
        vec![MemberKey::new(format!("user{}", self.reveals.load(Ordering::SeqCst)))]
    }

    async fn reveal_more(&self) {
        self.reveals.fetch_add(1, Ordering::SeqCst);
    }
}

/// A view whose visible set never changes, however far it is scrolled.
pub struct FixedView {
    keys: Vec<MemberKey>,
}

impl FixedView {
    /// `count` keys named `member0..`.
    pub fn numbered(count: usize) -> Self {
        Self {
            keys: (0..count).map(|i| MemberKey::new(format!("member{}", i))).collect(),
        }
    }
}

#[async_trait]
impl ListView for FixedView {
    async fn visible_keys(&self) -> Vec<MemberKey> {
        self.keys.clone()
    }

    async fn reveal_more(&self) {}
}
