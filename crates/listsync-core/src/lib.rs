//! # ListSync Core
//!
//! Pure primitives for ListSync: member keys, membership snapshots, set
//! reconciliation, per-member outcomes and configuration.
//!
//! This crate performs no I/O and never sleeps. Everything here is
//! deterministic computation over plain data.
//!
//! ## Key Types
//!
//! - [`MemberKey`] - Case-insensitive member key that keeps its display casing
//! - [`MembershipSnapshot`] - Deduplicated set of keys collected from one list
//! - [`ReconciliationPlan`] - The add/remove work between two snapshots
//! - [`SyncResult`] - Counters plus the per-member audit trail
//! - [`SyncConfig`] - Every delay and limit, with defaults
//!
//! ## Reconciliation
//!
//! ```rust
//! use listsync_core::{reconcile, MembershipSnapshot, SyncMode};
//!
//! let source: MembershipSnapshot = ["a", "b", "c"].into_iter().collect();
//! let destination: MembershipSnapshot = ["b", "c", "d"].into_iter().collect();
//!
//! let plan = reconcile(&source, &destination, SyncMode::Full);
//! assert_eq!(plan.to_add.len(), 1);
//! assert_eq!(plan.to_remove.len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod outcome;
pub mod plan;
pub mod snapshot;
pub mod types;

pub use config::{BackoffPolicy, BurstPolicy, CollectorPolicy, ResolverPolicy, SyncConfig};
pub use error::ConfigError;
pub use outcome::{
    CollectionSummary, Convergence, Failure, FailureStage, MutationOutcome, Operation,
    OutcomeStatus, SyncResult,
};
pub use plan::{reconcile, ReconciliationPlan, SyncMode};
pub use snapshot::MembershipSnapshot;
pub use types::{CollectionId, MemberKey, StableId};
