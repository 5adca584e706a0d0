//! Proptest generators for property-based testing.

use proptest::prelude::*;

use listsync_core::{MemberKey, MembershipSnapshot, SyncMode};

/// Generate a username-like string.
pub fn member_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,7}".prop_map(String::from)
}

/// Generate a member key with random casing.
pub fn member_key() -> impl Strategy<Value = MemberKey> {
    (member_name(), any::<bool>()).prop_map(|(name, upper)| MemberKey::new(recase(&name, upper)))
}

/// Generate a snapshot of up to `max_len` keys.
pub fn snapshot(max_len: usize) -> impl Strategy<Value = MembershipSnapshot> {
    prop::collection::vec(member_key(), 0..=max_len).prop_map(|keys| keys.into_iter().collect())
}

/// Generate a SyncMode.
pub fn sync_mode() -> impl Strategy<Value = SyncMode> {
    prop_oneof![Just(SyncMode::Add), Just(SyncMode::Remove), Just(SyncMode::Full)]
}

fn recase(name: &str, upper: bool) -> String {
    if upper {
        name.to_uppercase()
    } else {
        name.to_string()
    }
}

/// Two snapshots with a known overlap.
///
/// `shared` keys appear in both (with possibly different casing in the
/// destination), `source_only` and `destination_only` in exactly one.
#[derive(Debug, Clone)]
pub struct SnapshotPair {
    pub source: MembershipSnapshot,
    pub destination: MembershipSnapshot,
    pub source_only: MembershipSnapshot,
    pub destination_only: MembershipSnapshot,
    pub mode: SyncMode,
}

impl Arbitrary for SnapshotPair {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            prop::collection::btree_set(member_name(), 0..40),
            prop::collection::vec((0u8..3, any::<bool>()), 40),
            sync_mode(),
        )
            .prop_map(|(names, placement, mode)| {
                let mut source = MembershipSnapshot::new();
                let mut destination = MembershipSnapshot::new();
                let mut source_only = MembershipSnapshot::new();
                let mut destination_only = MembershipSnapshot::new();

                for (name, (side, upper)) in names.iter().zip(placement) {
                    match side {
                        0 => {
                            source.insert(MemberKey::new(name.as_str()));
                            destination.insert(MemberKey::new(recase(name, upper)));
                        }
                        1 => {
                            source.insert(MemberKey::new(name.as_str()));
                            source_only.insert(MemberKey::new(name.as_str()));
                        }
                        _ => {
                            destination.insert(MemberKey::new(recase(name, upper)));
                            destination_only.insert(MemberKey::new(recase(name, upper)));
                        }
                    }
                }

                SnapshotPair {
                    source,
                    destination,
                    source_only,
                    destination_only,
                    mode,
                }
            })
            .boxed()
    }
}
