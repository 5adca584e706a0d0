//! Snapshot providers.
//!
//! The orchestrator asks a provider for each side's snapshot. A
//! [`ViewSource`] scrolls a live view through the collector; a
//! [`StaticSource`] hands over membership that is already known.

use std::time::Duration;

use async_trait::async_trait;
use listsync_core::{CollectorPolicy, Convergence, MembershipSnapshot};
use listsync_view::{Collection, Collector, ListView, Pacer};

use crate::error::CollectError;

/// Produces a membership snapshot for one side of a sync.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Short label used in logs, e.g. "following" or "list members".
    fn label(&self) -> &str;

    /// Produce the snapshot. Errors mean nothing could be collected.
    async fn collect(&self) -> std::result::Result<Collection, CollectError>;
}

/// Collects a snapshot from a live [`ListView`].
pub struct ViewSource<V: ListView, P: Pacer + Clone> {
    label: String,
    view: V,
    collector: Collector<P>,
    pacer: P,
    rewind_settle: Duration,
}

impl<V: ListView, P: Pacer + Clone> ViewSource<V, P> {
    pub fn new(
        label: impl Into<String>,
        view: V,
        policy: CollectorPolicy,
        pacer: P,
        rewind_settle: Duration,
    ) -> Self {
        Self {
            label: label.into(),
            view,
            collector: Collector::new(policy, pacer.clone()),
            pacer,
            rewind_settle,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }
}

#[async_trait]
impl<V: ListView, P: Pacer + Clone> SnapshotProvider for ViewSource<V, P> {
    fn label(&self) -> &str {
        &self.label
    }

    async fn collect(&self) -> std::result::Result<Collection, CollectError> {
        self.view.prepare().await?;
        self.pacer.pause(self.rewind_settle).await;

        tracing::info!(source = %self.label, "collecting members");
        Ok(self.collector.collect(&self.view).await)
    }
}

/// A snapshot that is already known.
#[derive(Debug, Clone)]
pub struct StaticSource {
    label: String,
    snapshot: MembershipSnapshot,
}

impl StaticSource {
    pub fn new(label: impl Into<String>, snapshot: MembershipSnapshot) -> Self {
        Self {
            label: label.into(),
            snapshot,
        }
    }
}

#[async_trait]
impl SnapshotProvider for StaticSource {
    fn label(&self) -> &str {
        &self.label
    }

    async fn collect(&self) -> std::result::Result<Collection, CollectError> {
        Ok(Collection {
            snapshot: self.snapshot.clone(),
            iterations: 0,
            convergence: Convergence::Stable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listsync_view::{MemoryListView, RecordingPacer};

    fn policy() -> CollectorPolicy {
        CollectorPolicy {
            max_iterations: 50,
            stable_iterations_to_stop: 2,
            settle: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_view_source_prepares_then_collects() {
        let view = MemoryListView::new(["a", "b", "c", "d"], 2, 2);
        view.reveal_more().await;
        let pacer = RecordingPacer::new();
        let source = ViewSource::new("following", view, policy(), pacer.clone(), Duration::from_millis(1000));

        let collection = source.collect().await.unwrap();

        assert_eq!(collection.snapshot.len(), 4);
        assert_eq!(source.label(), "following");
        assert_eq!(pacer.pauses()[0], Duration::from_millis(1000));
    }

    #[tokio::test]
    async fn test_view_source_unavailable() {
        let view = MemoryListView::new(["a"], 1, 1);
        view.set_unavailable("not on a following page");
        let pacer = RecordingPacer::new();
        let source = ViewSource::new("following", view, policy(), pacer.clone(), Duration::from_millis(1000));

        let err = source.collect().await.unwrap_err();
        assert!(matches!(err, CollectError::View(_)));
        assert!(pacer.pauses().is_empty());
    }

    #[tokio::test]
    async fn test_static_source() {
        let snapshot: MembershipSnapshot = ["x", "y"].into_iter().collect();
        let source = StaticSource::new("known", snapshot.clone());
        let collection = source.collect().await.unwrap();
        assert_eq!(collection.snapshot, snapshot);
        assert_eq!(collection.iterations, 0);
    }
}
