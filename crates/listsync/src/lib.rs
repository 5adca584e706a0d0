//! # ListSync
//!
//! Keep a target list in step with a source list through an external,
//! rate-limited, id-indirected API.
//!
//! ## Overview
//!
//! ListSync was built to mirror an account's Following list into one of
//! its Lists, where both sides can only be read by scrolling virtualized
//! pages and every change goes through a throttled internal API. The
//! engine itself is generic:
//!
//! - **Collect**: scroll a [`ListView`] until its membership stops growing
//! - **Reconcile**: diff source against destination under a [`SyncMode`]
//! - **Resolve**: map each member key to a stable id, backing off on 429s
//! - **Mutate**: add or remove one id at a time, pausing between calls
//!
//! ## Key Concepts
//!
//! - **Member key**: a username; compared case-insensitively
//! - **Snapshot**: the deduplicated keys seen in one list at one time
//! - **Plan**: the keys to add and to remove; always disjoint
//! - **Run**: a single-use sync against one target; one per target at a time
//!
//! ## Usage
//!
//! ```rust,no_run
//! use listsync::{CollectionId, ListSync, MemoryDirectory, MemoryListView, SyncConfig};
//!
//! async fn example() {
//!     let directory = MemoryDirectory::new();
//!     let sync = ListSync::new(directory.clone(), directory.clone(), SyncConfig::default()).unwrap();
//!
//!     let following = sync.view_source("following", MemoryListView::new(["alice", "bob"], 20, 10));
//!     let members = sync.view_source("list members", MemoryListView::new(["bob", "carol"], 20, 10));
//!
//!     let run = sync.begin(CollectionId::new("1234")).unwrap();
//!     let cancel = run.cancel_token();
//!     let result = run.execute(&following, &members).await;
//!
//!     println!(
//!         "added {}, removed {}, errors {} (cancel handle: {})",
//!         result.added_count,
//!         result.removed_count,
//!         result.error_count,
//!         cancel.is_cancelled()
//!     );
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `listsync::core` - Keys, snapshots, reconciliation, outcomes, config
//! - `listsync::view` - List views, pacing, the collector
//! - `listsync::engine` - APIs, resolver, mutator, orchestrator

pub mod error;
pub mod runner;

// Re-export component crates
pub use listsync_core as core;
pub use listsync_engine as engine;
pub use listsync_view as view;

// Re-export main types for convenience
pub use runner::{ListSync, SyncRun};
pub use error::{ListSyncError, Result};

pub use listsync_core::{
    reconcile, CollectionId, Failure, FailureStage, MemberKey, MembershipSnapshot,
    MutationOutcome, Operation, OutcomeStatus, ReconciliationPlan, StableId, SyncConfig, SyncMode,
    SyncResult,
};
pub use listsync_engine::{
    ApiError, IdentityApi, MembershipApi, MemoryDirectory, PlannedSync, SnapshotProvider,
    StaticSource, ViewSource,
};
pub use listsync_view::{ListView, MemoryListView, Pacer, RecordingPacer, TokioPacer};
pub use tokio_util::sync::CancellationToken;
