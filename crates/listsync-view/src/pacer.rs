//! Pacing abstraction.
//!
//! Every wait in ListSync (settling a view, resolver backoff, the pause
//! between members, the extended backoff) goes through a [`Pacer`], so
//! tests and dry runs can observe the schedule without sleeping.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

/// Something that can suspend the current task for a while.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self, duration: Duration);
}

#[async_trait]
impl<P: Pacer + ?Sized> Pacer for Arc<P> {
    async fn pause(&self, duration: Duration) {
        (**self).pause(duration).await
    }
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPacer;

#[async_trait]
impl Pacer for TokioPacer {
    async fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Returns immediately and records every requested pause.
///
/// Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingPacer {
    pauses: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All pauses so far, in order.
    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// How many pauses of exactly `duration` were requested.
    pub fn count_of(&self, duration: Duration) -> usize {
        self.pauses().iter().filter(|d| **d == duration).count()
    }

    /// Sum of all requested pauses.
    pub fn total(&self) -> Duration {
        self.pauses().iter().sum()
    }

    pub fn clear(&self) {
        if let Ok(mut pauses) = self.pauses.lock() {
            pauses.clear();
        }
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, duration: Duration) {
        if let Ok(mut pauses) = self.pauses.lock() {
            pauses.push(duration);
        }
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_pacer_shares_log() {
        let pacer = RecordingPacer::new();
        let clone = pacer.clone();

        pacer.pause(Duration::from_millis(5)).await;
        clone.pause(Duration::from_millis(7)).await;
        clone.pause(Duration::from_millis(5)).await;

        assert_eq!(pacer.pauses().len(), 3);
        assert_eq!(pacer.count_of(Duration::from_millis(5)), 2);
        assert_eq!(pacer.total(), Duration::from_millis(17));

        pacer.clear();
        assert!(clone.pauses().is_empty());
    }

    #[tokio::test]
    async fn test_tokio_pacer_zero_is_instant() {
        TokioPacer.pause(Duration::ZERO).await;
        TokioPacer.pause(Duration::from_millis(1)).await;
    }
}
