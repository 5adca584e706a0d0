//! # ListSync View
//!
//! The list view capability and the paginated collector that turns a
//! virtualized list into a [`MembershipSnapshot`](listsync_core::MembershipSnapshot).
//!
//! ## Key Types
//!
//! - [`ListView`] - Async trait over a live list: visible keys, reveal more
//! - [`Collector`] - Scroll-and-collect loop with convergence detection
//! - [`Pacer`] - Sleep abstraction ([`TokioPacer`], [`RecordingPacer`])
//! - [`MemoryListView`] - In-memory virtualized view for tests
//!
//! ## Usage
//!
//! ```rust,no_run
//! use listsync_core::SyncConfig;
//! use listsync_view::{Collector, MemoryListView, TokioPacer};
//!
//! async fn example() {
//!     let view = MemoryListView::new(["alice", "bob", "carol"], 2, 1);
//!     let collector = Collector::new(SyncConfig::default().collector_policy(), TokioPacer);
//!
//!     let collection = collector.collect(&view).await;
//!     println!("collected {} members", collection.snapshot.len());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Never fails**: collection returns whatever was accumulated
//! - **Bounded**: `max_iterations` caps views that never stop growing
//! - **Final capture**: the last reveal is always captured before returning

pub mod collector;
pub mod error;
pub mod memory;
pub mod pacer;
pub mod traits;

pub use collector::{Collection, Collector};
pub use error::{Result, ViewError};
pub use memory::MemoryListView;
pub use pacer::{Pacer, RecordingPacer, TokioPacer};
pub use traits::ListView;
