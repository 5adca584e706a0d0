//! Paginated collection over a virtualized list.
//!
//! Virtualized lists only render a window of their members, so the full
//! membership has to be accumulated while scrolling. Collection stops when
//! the accumulated set stops growing or when the iteration cap is hit.
//!
//! Algorithm:
//! 1. Capture the visible keys into the accumulator
//! 2. Reveal more and wait for the view to settle
//! 3. Count an iteration as stable if the accumulator did not grow
//! 4. Repeat until `stable_iterations_to_stop` or `max_iterations`
//! 5. Capture once more (the last reveal has not been captured yet)

use listsync_core::{CollectionSummary, CollectorPolicy, Convergence, MembershipSnapshot};

use crate::pacer::Pacer;
use crate::traits::ListView;

/// Output of one collection pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    /// Every unique key seen.
    pub snapshot: MembershipSnapshot,
    /// Reveal iterations performed.
    pub iterations: u32,
    /// Whether the set converged or the cap cut collection short.
    pub convergence: Convergence,
}

impl Collection {
    pub fn summary(&self) -> CollectionSummary {
        CollectionSummary {
            members: self.snapshot.len(),
            convergence: self.convergence,
        }
    }
}

/// Scrolls a [`ListView`] and accumulates its members.
#[derive(Debug, Clone)]
pub struct Collector<P: Pacer> {
    policy: CollectorPolicy,
    pacer: P,
}

impl<P: Pacer> Collector<P> {
    pub fn new(policy: CollectorPolicy, pacer: P) -> Self {
        Self { policy, pacer }
    }

    /// Collect the full membership of `view`.
    ///
    /// Never fails. An empty view converges after
    /// `stable_iterations_to_stop` iterations with an empty snapshot.
    pub async fn collect<V: ListView + ?Sized>(&self, view: &V) -> Collection {
        let mut snapshot = MembershipSnapshot::new();
        let mut iterations: u32 = 0;
        let mut stable: u32 = 0;
        let mut previous = 0usize;

        tracing::debug!(
            max_iterations = self.policy.max_iterations,
            stable_iterations_to_stop = self.policy.stable_iterations_to_stop,
            "starting collection"
        );

        while iterations < self.policy.max_iterations
            && stable < self.policy.stable_iterations_to_stop
        {
            let visible = capture(view, &mut snapshot).await;

            view.reveal_more().await;
            iterations += 1;
            self.pacer.pause(self.policy.settle).await;

            let grew = snapshot.len() != previous;
            if grew {
                stable = 0;
            } else {
                stable += 1;
            }

            if iterations % 5 == 0 || grew {
                tracing::debug!(
                    iteration = iterations,
                    collected = snapshot.len(),
                    visible,
                    "collection progress"
                );
            }

            previous = snapshot.len();
        }

        capture(view, &mut snapshot).await;

        let convergence = if stable >= self.policy.stable_iterations_to_stop {
            Convergence::Stable
        } else {
            Convergence::IterationLimit
        };

        if convergence.is_partial() {
            tracing::warn!(
                iterations,
                collected = snapshot.len(),
                "collection hit iteration limit, snapshot may be partial"
            );
        } else {
            tracing::info!(iterations, collected = snapshot.len(), "collection finished");
        }

        Collection {
            snapshot,
            iterations,
            convergence,
        }
    }
}

/// Add the currently visible keys. Returns how many were visible.
async fn capture<V: ListView + ?Sized>(view: &V, snapshot: &mut MembershipSnapshot) -> usize {
    let visible = view.visible_keys().await;
    let count = visible.len();
    snapshot.extend(visible);
    count
}
