//! Per-member outcomes and the accumulated sync result.

use serde::{Deserialize, Serialize};

use crate::types::MemberKey;

/// The mutation a work item asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Remove,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Remove => "remove",
        }
    }
}

/// Where a member's processing failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStage {
    Resolve,
    Mutate,
}

/// A recorded member-level failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub stage: FailureStage,
    pub message: String,
}

impl Failure {
    pub fn resolve(message: impl Into<String>) -> Self {
        Self {
            stage: FailureStage::Resolve,
            message: message.into(),
        }
    }

    pub fn mutate(message: impl Into<String>) -> Self {
        Self {
            stage: FailureStage::Mutate,
            message: message.into(),
        }
    }
}

/// What happened to one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "lowercase")]
pub enum OutcomeStatus {
    Added,
    Removed,
    Skipped(String),
    Failed(Failure),
}

/// Result of processing one member key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationOutcome {
    pub key: MemberKey,
    pub operation: Operation,
    pub status: OutcomeStatus,
}

impl MutationOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed(_))
    }
}

/// How a collection pass ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Convergence {
    /// The collected set stopped growing.
    #[default]
    Stable,
    /// The iteration cap was reached first; the snapshot may be partial.
    IterationLimit,
}

impl Convergence {
    pub fn is_partial(self) -> bool {
        matches!(self, Convergence::IterationLimit)
    }
}

/// Summary of one side's collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSummary {
    pub members: usize,
    pub convergence: Convergence,
}

/// The audit trail of a sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResult {
    pub added_count: usize,
    pub removed_count: usize,
    pub error_count: usize,
    pub skipped_count: usize,
    pub outcomes: Vec<MutationOutcome>,
    /// Source collection summary, if it was collected.
    pub source: Option<CollectionSummary>,
    /// Destination collection summary, if it was collected.
    pub destination: Option<CollectionSummary>,
    /// Set when a cancellation was honored before all keys were processed.
    pub cancelled: bool,
    /// Set when collection failed and no mutation was attempted.
    pub aborted: Option<String>,
}

impl SyncResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an outcome and bump the matching counter.
    pub fn record(&mut self, outcome: MutationOutcome) {
        match &outcome.status {
            OutcomeStatus::Added => self.added_count += 1,
            OutcomeStatus::Removed => self.removed_count += 1,
            OutcomeStatus::Skipped(_) => self.skipped_count += 1,
            OutcomeStatus::Failed(_) => self.error_count += 1,
        }
        self.outcomes.push(outcome);
    }

    /// Keys that were added.
    pub fn added(&self) -> impl Iterator<Item = &MemberKey> {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Added)
            .map(|o| &o.key)
    }

    /// Keys that were removed.
    pub fn removed(&self) -> impl Iterator<Item = &MemberKey> {
        self.outcomes
            .iter()
            .filter(|o| o.status == OutcomeStatus::Removed)
            .map(|o| &o.key)
    }

    /// Keys that failed, with their failure.
    pub fn errors(&self) -> impl Iterator<Item = (&MemberKey, &Failure)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            OutcomeStatus::Failed(failure) => Some((&o.key, failure)),
            _ => None,
        })
    }

    /// Find the outcome for a key (case-insensitive).
    pub fn outcome_for(&self, key: &MemberKey) -> Option<&MutationOutcome> {
        self.outcomes.iter().find(|o| &o.key == key)
    }

    /// Whether any mutation was applied.
    pub fn changed_anything(&self) -> bool {
        self.added_count + self.removed_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(key: &str, operation: Operation, status: OutcomeStatus) -> MutationOutcome {
        MutationOutcome {
            key: MemberKey::new(key),
            operation,
            status,
        }
    }

    #[test]
    fn test_record_counts() {
        let mut result = SyncResult::new();
        result.record(outcome("a", Operation::Add, OutcomeStatus::Added));
        result.record(outcome("b", Operation::Add, OutcomeStatus::Failed(Failure::resolve("not found"))));
        result.record(outcome("c", Operation::Remove, OutcomeStatus::Removed));
        result.record(outcome("d", Operation::Remove, OutcomeStatus::Skipped("cancelled".into())));

        assert_eq!(result.added_count, 1);
        assert_eq!(result.removed_count, 1);
        assert_eq!(result.error_count, 1);
        assert_eq!(result.skipped_count, 1);
        assert_eq!(result.outcomes.len(), 4);
        assert!(result.changed_anything());

        let errors: Vec<_> = result.errors().map(|(k, f)| (k.as_str(), f.message.as_str())).collect();
        assert_eq!(errors, vec![("b", "not found")]);
        assert_eq!(result.added().count(), 1);
        assert_eq!(result.removed().count(), 1);
    }

    #[test]
    fn test_outcome_lookup_ignores_case() {
        let mut result = SyncResult::new();
        result.record(outcome("Alice", Operation::Add, OutcomeStatus::Added));
        assert!(result.outcome_for(&MemberKey::new("alice")).is_some());
        assert!(result.outcome_for(&MemberKey::new("bob")).is_none());
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let o = outcome("a", Operation::Add, OutcomeStatus::Failed(Failure::mutate("500")));
        let json = serde_json::to_value(&o).unwrap();
        assert_eq!(json["status"]["status"], "failed");
        assert_eq!(json["status"]["detail"]["stage"], "mutate");
        assert_eq!(json["operation"], "add");
    }
}
