//! # ListSync Testkit
//!
//! Testing utilities for ListSync.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Scenario vectors**: Named end-to-end cases with expected counts
//! - **Generators**: Proptest strategies for snapshots and sync modes
//! - **Fixtures**: A directory, recording pacer and target wired together
//!
//! ## Scenario Vectors
//!
//! ```rust,no_run
//! use listsync_testkit::vectors::{all_scenarios, matches, run_scenario};
//!
//! async fn example() {
//!     for vector in all_scenarios() {
//!         let (_, result) = run_scenario(&vector).await;
//!         println!("{}: {}", vector.name, matches(&vector, &result));
//!     }
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use listsync_core::reconcile;
//! use listsync_testkit::generators::SnapshotPair;
//!
//! proptest! {
//!     #[test]
//!     fn plan_is_disjoint(pair: SnapshotPair) {
//!         let plan = reconcile(&pair.source, &pair.destination, pair.mode);
//!         prop_assert!(plan.to_add.is_disjoint(&plan.to_remove));
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use listsync_core::SyncMode;
//! use listsync_testkit::fixtures::SyncFixture;
//!
//! let fixture = SyncFixture::with_members(&["a", "b"], &["b", "c"], SyncMode::Full);
//! assert_eq!(fixture.destination_members().len(), 2);
//! ```

pub mod fixtures;
pub mod generators;
pub mod vectors;

pub use fixtures::{fast_config, snapshot, EndlessView, FixedView, SyncFixture};
pub use generators::SnapshotPair;
pub use vectors::{all_scenarios, run_scenario, verify_all_scenarios, ScenarioVector};
