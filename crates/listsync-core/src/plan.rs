//! Set reconciliation.
//!
//! Computes which members must be added to or removed from a destination
//! so that it matches a source, under a [`SyncMode`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::snapshot::MembershipSnapshot;
use crate::types::MemberKey;

/// Which half of the difference a sync applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Only add members missing from the destination.
    Add,
    /// Only remove destination members absent from the source.
    Remove,
    /// Add and remove.
    #[default]
    Full,
}

impl SyncMode {
    pub fn adds(self) -> bool {
        matches!(self, SyncMode::Add | SyncMode::Full)
    }

    pub fn removes(self) -> bool {
        matches!(self, SyncMode::Remove | SyncMode::Full)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SyncMode::Add => "add",
            SyncMode::Remove => "remove",
            SyncMode::Full => "full",
        }
    }
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "add" => Ok(SyncMode::Add),
            "remove" => Ok(SyncMode::Remove),
            "full" => Ok(SyncMode::Full),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

/// The add/remove work derived from two snapshots.
///
/// `to_add` and `to_remove` are disjoint: a key cannot be both absent from
/// and present in the same destination snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationPlan {
    /// In the source, absent from the destination (source casing).
    pub to_add: BTreeSet<MemberKey>,
    /// In the destination, absent from the source (destination casing).
    pub to_remove: BTreeSet<MemberKey>,
}

impl ReconciliationPlan {
    /// Whether there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }

    /// Total number of work items.
    pub fn len(&self) -> usize {
        self.to_add.len() + self.to_remove.len()
    }
}

/// Compute the reconciliation plan for `destination` against `source`.
///
/// Pure and deterministic. Comparison ignores case.
pub fn reconcile(
    source: &MembershipSnapshot,
    destination: &MembershipSnapshot,
    mode: SyncMode,
) -> ReconciliationPlan {
    let to_add = if mode.adds() {
        source.difference(destination).cloned().collect()
    } else {
        BTreeSet::new()
    };

    let to_remove = if mode.removes() {
        destination.difference(source).cloned().collect()
    } else {
        BTreeSet::new()
    };

    ReconciliationPlan { to_add, to_remove }
}
