//! Strong type definitions for ListSync.
//!
//! Member keys and identifiers are newtypes so a username can never be
//! passed where a resolved id is expected.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A human-readable member key, e.g. a username.
///
/// The original casing is kept for display and for API calls. Equality,
/// ordering and hashing use the lowercased form, so `Alice` and `alice`
/// are the same member.
#[derive(Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct MemberKey {
    display: String,
    folded: String,
}

impl MemberKey {
    /// Create a key from its display form.
    pub fn new(key: impl Into<String>) -> Self {
        let display = key.into();
        let folded = display.to_lowercase();
        Self { display, folded }
    }

    /// Parse a visible handle such as `@Alice_01`.
    ///
    /// The text must start with `@`, carry at least one more character,
    /// and contain only ASCII alphanumerics and underscores after the `@`.
    /// Surrounding whitespace is ignored.
    pub fn from_handle_text(text: &str) -> Option<Self> {
        let handle = text.trim().strip_prefix('@')?;
        if handle.is_empty() {
            return None;
        }
        if !handle.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return None;
        }
        Some(Self::new(handle))
    }

    /// The key as it was observed.
    pub fn as_str(&self) -> &str {
        &self.display
    }

    /// The lowercased form used for comparison.
    pub fn folded(&self) -> &str {
        &self.folded
    }
}

impl PartialEq for MemberKey {
    fn eq(&self, other: &Self) -> bool {
        self.folded == other.folded
    }
}

impl Eq for MemberKey {}

impl PartialOrd for MemberKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MemberKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded.cmp(&other.folded)
    }
}

impl Hash for MemberKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.folded.hash(state);
    }
}

impl fmt::Debug for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberKey({})", self.display)
    }
}

impl fmt::Display for MemberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

impl From<&str> for MemberKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for MemberKey {
    fn from(key: String) -> Self {
        Self::new(key)
    }
}

impl From<MemberKey> for String {
    fn from(key: MemberKey) -> Self {
        key.display
    }
}

/// Opaque identifier the mutation API expects for a member.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StableId(pub String);

impl StableId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StableId({})", self.0)
    }
}

impl fmt::Display for StableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of the destination collection (e.g. a list id).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionId(pub String);

impl CollectionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CollectionId({})", self.0)
    }
}

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_member_key_case_insensitive_eq() {
        let a = MemberKey::new("Alice");
        let b = MemberKey::new("alice");
        assert_eq!(a, b);
        assert_eq!(a.as_str(), "Alice");
        assert_eq!(b.as_str(), "alice");

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn test_handle_text_parsing() {
        assert_eq!(
            MemberKey::from_handle_text("@Rust_Lang").map(|k| k.as_str().to_string()),
            Some("Rust_Lang".to_string())
        );
        assert!(MemberKey::from_handle_text("  @x  ").is_some());
        assert!(MemberKey::from_handle_text("@").is_none());
        assert!(MemberKey::from_handle_text("rust").is_none());
        assert!(MemberKey::from_handle_text("@has space").is_none());
        assert!(MemberKey::from_handle_text("@dash-name").is_none());
    }

    #[test]
    fn test_member_key_serde_keeps_casing() {
        let key = MemberKey::new("MixedCase");
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"MixedCase\"");
        let back: MemberKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back.as_str(), "MixedCase");
    }

    #[test]
    fn test_id_display() {
        assert_eq!(format!("{}", StableId::new("12345")), "12345");
        assert_eq!(format!("{:?}", CollectionId::new("99")), "CollectionId(99)");
    }
}
