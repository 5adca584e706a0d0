//! # ListSync Engine
//!
//! Reconciles a destination collection against a source collection through
//! an external, rate-limited, id-indirected API.
//!
//! ## Overview
//!
//! A run collects both memberships, computes the add/remove plan, then
//! walks the plan one member at a time: resolve the member's stable id,
//! apply the mutation, pause. Failures are recorded per member and never
//! abort the run.
//!
//! ## Key Properties
//!
//! - **Sequential**: one member at a time, adds strictly before removes
//! - **Paced**: a fixed pause after every member
//! - **Burst-aware**: an extended pause after N consecutive failures
//! - **Cancellable**: between members, never mid-call
//!
//! ## Usage
//!
//! ```rust,no_run
//! use listsync_core::{CollectionId, MembershipSnapshot, SyncConfig};
//! use listsync_engine::{MemoryDirectory, Orchestrator, StaticSource};
//! use listsync_view::TokioPacer;
//! use tokio_util::sync::CancellationToken;
//!
//! async fn example() {
//!     let directory = MemoryDirectory::new();
//!     let orchestrator = Orchestrator::new(
//!         directory.clone(),
//!         directory.clone(),
//!         TokioPacer,
//!         &SyncConfig::default(),
//!     );
//!
//!     let following: MembershipSnapshot = ["alice", "bob"].into_iter().collect();
//!     let members: MembershipSnapshot = ["bob", "carol"].into_iter().collect();
//!
//!     let result = orchestrator
//!         .run(
//!             &StaticSource::new("following", following),
//!             &StaticSource::new("list", members),
//!             &CollectionId::new("1234"),
//!             &CancellationToken::new(),
//!         )
//!         .await;
//!     println!("added {}, removed {}", result.added_count, result.removed_count);
//! }
//! ```

pub mod api;
pub mod error;
pub mod mutator;
pub mod orchestrator;
pub mod provider;
pub mod resolver;

pub use api::{memory::MemoryDirectory, ApiResult, IdentityApi, MembershipApi};
pub use error::{ApiError, CollectError, MutationError, ResolutionError, Result};
pub use mutator::Mutator;
pub use orchestrator::{Orchestrator, PlannedSync, RateLimitState, CANCELLED_REASON};
pub use provider::{SnapshotProvider, StaticSource, ViewSource};
pub use resolver::Resolver;
