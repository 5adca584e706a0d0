//! Upstream API abstractions.
//!
//! The engine talks to two external surfaces: an identity API that maps
//! member keys to stable ids, and a membership API that adds or removes
//! ids from a collection. Implementations are thin HTTP clients in
//! production and [`memory::MemoryDirectory`] in tests.

use std::sync::Arc;

use async_trait::async_trait;
use listsync_core::{CollectionId, MemberKey, StableId};

use crate::error::ApiError;

/// Result type for upstream calls.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Resolves member keys to stable ids.
///
/// Must be a side-effect free read; the resolver may call it repeatedly.
#[async_trait]
pub trait IdentityApi: Send + Sync {
    /// Look up a member.
    ///
    /// Returns `Ok(None)` when the response succeeded but carried no id.
    async fn lookup(&self, key: &MemberKey) -> ApiResult<Option<StableId>>;
}

/// Mutates collection membership.
#[async_trait]
pub trait MembershipApi: Send + Sync {
    async fn add_member(&self, collection: &CollectionId, id: &StableId) -> ApiResult<()>;

    async fn remove_member(&self, collection: &CollectionId, id: &StableId) -> ApiResult<()>;
}

#[async_trait]
impl<T: IdentityApi + ?Sized> IdentityApi for Arc<T> {
    async fn lookup(&self, key: &MemberKey) -> ApiResult<Option<StableId>> {
        (**self).lookup(key).await
    }
}

#[async_trait]
impl<T: MembershipApi + ?Sized> MembershipApi for Arc<T> {
    async fn add_member(&self, collection: &CollectionId, id: &StableId) -> ApiResult<()> {
        (**self).add_member(collection, id).await
    }

    async fn remove_member(&self, collection: &CollectionId, id: &StableId) -> ApiResult<()> {
        (**self).remove_member(collection, id).await
    }
}

/// An in-memory directory implementing both APIs.
///
/// Holds registered users and collection memberships, supports scripted
/// failures, and counts calls so tests can assert on retry behavior.
pub mod memory {
    use super::*;
    use std::collections::{HashMap, HashSet, VecDeque};
    use std::sync::{Mutex, MutexGuard};

    use listsync_core::MembershipSnapshot;

    /// Shared state for the in-memory directory.
    #[derive(Default)]
    struct DirectoryInner {
        /// Folded key -> (display key, id).
        users: HashMap<String, (MemberKey, StableId)>,
        /// Collection -> member ids.
        collections: HashMap<CollectionId, HashSet<StableId>>,
        /// Scripted lookup failures, consumed front to back.
        lookup_failures: HashMap<String, VecDeque<ApiError>>,
        /// Scripted mutation failures keyed by id.
        mutation_failures: HashMap<StableId, VecDeque<ApiError>>,
        /// Lookup calls per folded key.
        lookup_calls: HashMap<String, u32>,
        /// Total add/remove calls.
        mutation_calls: u32,
        next_id: u64,
    }

    /// In-memory identity and membership service.
    ///
    /// Clones share the same state.
    #[derive(Clone, Default)]
    pub struct MemoryDirectory {
        inner: Arc<Mutex<DirectoryInner>>,
    }

    impl MemoryDirectory {
        pub fn new() -> Self {
            Self::default()
        }

        fn lock(&self) -> MutexGuard<'_, DirectoryInner> {
            self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
        }

        /// Register a user, assigning a fresh id if unknown.
        pub fn register(&self, key: impl Into<MemberKey>) -> StableId {
            let key = key.into();
            let mut inner = self.lock();
            if let Some((_, id)) = inner.users.get(key.folded()) {
                return id.clone();
            }
            inner.next_id += 1;
            let id = StableId::new(format!("{}", 1_000_000 + inner.next_id));
            inner.users.insert(key.folded().to_string(), (key, id.clone()));
            id
        }

        /// Register many users.
        pub fn register_all<I, K>(&self, keys: I)
        where
            I: IntoIterator<Item = K>,
            K: Into<MemberKey>,
        {
            for key in keys {
                self.register(key);
            }
        }

        /// Put registered users into a collection (registering unknown ones).
        pub fn seed_collection<I, K>(&self, collection: &CollectionId, keys: I)
        where
            I: IntoIterator<Item = K>,
            K: Into<MemberKey>,
        {
            for key in keys {
                let id = self.register(key);
                self.lock()
                    .collections
                    .entry(collection.clone())
                    .or_default()
                    .insert(id);
            }
        }

        /// Current members of a collection, by display key.
        pub fn members(&self, collection: &CollectionId) -> MembershipSnapshot {
            let inner = self.lock();
            let Some(ids) = inner.collections.get(collection) else {
                return MembershipSnapshot::new();
            };
            inner
                .users
                .values()
                .filter(|(_, id)| ids.contains(id))
                .map(|(key, _)| key.clone())
                .collect()
        }

        /// Fail the next lookups of `key` with `errors`, in order.
        pub fn script_lookup_failures<I>(&self, key: impl Into<MemberKey>, errors: I)
        where
            I: IntoIterator<Item = ApiError>,
        {
            let key = key.into();
            self.lock()
                .lookup_failures
                .entry(key.folded().to_string())
                .or_default()
                .extend(errors);
        }

        /// Fail the next mutations of `key`'s id with `errors`, in order.
        pub fn script_mutation_failures<I>(&self, key: impl Into<MemberKey>, errors: I)
        where
            I: IntoIterator<Item = ApiError>,
        {
            let id = self.register(key);
            self.lock().mutation_failures.entry(id).or_default().extend(errors);
        }

        /// Lookups performed for `key`.
        pub fn lookup_calls(&self, key: &MemberKey) -> u32 {
            self.lock().lookup_calls.get(key.folded()).copied().unwrap_or(0)
        }

        /// Lookups performed for all keys.
        pub fn total_lookup_calls(&self) -> u32 {
            self.lock().lookup_calls.values().sum()
        }

        /// Add and remove calls performed.
        pub fn mutation_calls(&self) -> u32 {
            self.lock().mutation_calls
        }

        /// Total outbound calls of any kind.
        pub fn total_calls(&self) -> u32 {
            self.total_lookup_calls() + self.mutation_calls()
        }

        fn next_mutation_failure(inner: &mut DirectoryInner, id: &StableId) -> Option<ApiError> {
            inner.mutation_failures.get_mut(id).and_then(VecDeque::pop_front)
        }

        fn known_id(inner: &DirectoryInner, id: &StableId) -> bool {
            inner.users.values().any(|(_, known)| known == id)
        }
    }

    #[async_trait]
    impl IdentityApi for MemoryDirectory {
        async fn lookup(&self, key: &MemberKey) -> ApiResult<Option<StableId>> {
            let mut inner = self.lock();
            *inner.lookup_calls.entry(key.folded().to_string()).or_default() += 1;

            if let Some(error) = inner
                .lookup_failures
                .get_mut(key.folded())
                .and_then(VecDeque::pop_front)
            {
                return Err(error);
            }

            match inner.users.get(key.folded()) {
                Some((_, id)) => Ok(Some(id.clone())),
                None => Err(ApiError::NotFound),
            }
        }
    }

    #[async_trait]
    impl MembershipApi for MemoryDirectory {
        async fn add_member(&self, collection: &CollectionId, id: &StableId) -> ApiResult<()> {
            let mut inner = self.lock();
            inner.mutation_calls += 1;

            if let Some(error) = Self::next_mutation_failure(&mut inner, id) {
                return Err(error);
            }
            if !Self::known_id(&inner, id) {
                return Err(ApiError::NotFound);
            }

            inner
                .collections
                .entry(collection.clone())
                .or_default()
                .insert(id.clone());
            Ok(())
        }

        async fn remove_member(&self, collection: &CollectionId, id: &StableId) -> ApiResult<()> {
            let mut inner = self.lock();
            inner.mutation_calls += 1;

            if let Some(error) = Self::next_mutation_failure(&mut inner, id) {
                return Err(error);
            }

            if let Some(members) = inner.collections.get_mut(collection) {
                members.remove(id);
            }
            Ok(())
        }
    }
}
