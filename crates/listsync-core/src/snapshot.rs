//! Membership snapshots.
//!
//! A snapshot is the deduplicated set of member keys seen in one list at
//! one point in time. Keys that differ only in case collapse into one
//! entry; the first casing observed wins.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::MemberKey;

/// A point-in-time, case-insensitively unique set of member keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipSnapshot {
    members: BTreeSet<MemberKey>,
}

impl MembershipSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key. Returns false if an equal key (ignoring case) exists.
    pub fn insert(&mut self, key: MemberKey) -> bool {
        self.members.insert(key)
    }

    /// Check membership, ignoring case.
    pub fn contains(&self, key: &MemberKey) -> bool {
        self.members.contains(key)
    }

    /// Look up the stored key (with its original casing).
    pub fn get(&self, key: &MemberKey) -> Option<&MemberKey> {
        self.members.get(key)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Iterate keys in case-folded order.
    pub fn iter(&self) -> impl Iterator<Item = &MemberKey> {
        self.members.iter()
    }

    /// Keys present here but absent from `other`, keeping this snapshot's casing.
    pub fn difference<'a>(&'a self, other: &'a MembershipSnapshot) -> impl Iterator<Item = &'a MemberKey> {
        self.members.difference(&other.members)
    }
}

impl<K: Into<MemberKey>> FromIterator<K> for MembershipSnapshot {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        for key in iter {
            snapshot.insert(key.into());
        }
        snapshot
    }
}

impl<K: Into<MemberKey>> Extend<K> for MembershipSnapshot {
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key.into());
        }
    }
}

impl IntoIterator for MembershipSnapshot {
    type Item = MemberKey;
    type IntoIter = std::collections::btree_set::IntoIter<MemberKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.into_iter()
    }
}

impl<'a> IntoIterator for &'a MembershipSnapshot {
    type Item = &'a MemberKey;
    type IntoIter = std::collections::btree_set::Iter<'a, MemberKey>;

    fn into_iter(self) -> Self::IntoIter {
        self.members.iter()
    }
}
