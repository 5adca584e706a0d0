//! In-memory implementation of the ListView trait.
//!
//! Simulates a virtualized list: only `window` consecutive members are
//! visible at a time and each reveal slides the window forward by `step`.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use listsync_core::MemberKey;

use crate::error::{Result, ViewError};
use crate::traits::ListView;

/// In-memory virtualized list.
///
/// Thread-safe via Mutex. Cheap to construct, intended for tests and
/// for feeding already-known membership through the collector.
pub struct MemoryListView {
    inner: Mutex<MemoryViewInner>,
    window: usize,
    step: usize,
}

struct MemoryViewInner {
    members: Vec<MemberKey>,
    position: usize,
    reveals: u32,
    unavailable: Option<String>,
}

impl MemoryListView {
    /// Create a view over `members`, showing `window` at a time and
    /// advancing `step` per reveal. Both are clamped to at least 1.
    pub fn new<I, K>(members: I, window: usize, step: usize) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<MemberKey>,
    {
        Self {
            inner: Mutex::new(MemoryViewInner {
                members: members.into_iter().map(Into::into).collect(),
                position: 0,
                reveals: 0,
                unavailable: None,
            }),
            window: window.max(1),
            step: step.max(1),
        }
    }

    /// Build a view from rendered cell text, keeping only lines that parse
    /// as `@handle`.
    pub fn from_rendered_text<'a, I>(lines: I, window: usize, step: usize) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let members: Vec<MemberKey> = lines
            .into_iter()
            .filter_map(MemberKey::from_handle_text)
            .collect();
        Self::new(members, window, step)
    }

    /// Make `prepare` fail with the given reason.
    pub fn set_unavailable(&self, reason: impl Into<String>) {
        self.lock().unavailable = Some(reason.into());
    }

    /// How many times `reveal_more` was called.
    pub fn reveal_count(&self) -> u32 {
        self.lock().reveals
    }

    /// Total members behind the view.
    pub fn len(&self) -> usize {
        self.lock().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, MemoryViewInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ListView for MemoryListView {
    async fn prepare(&self) -> Result<()> {
        let mut inner = self.lock();
        if let Some(reason) = &inner.unavailable {
            return Err(ViewError::Unavailable(reason.clone()));
        }
        inner.position = 0;
        Ok(())
    }

    async fn visible_keys(&self) -> Vec<MemberKey> {
        let inner = self.lock();
        let start = inner.position.min(inner.members.len());
        let end = (start + self.window).min(inner.members.len());
        inner.members[start..end].to_vec()
    }

    async fn reveal_more(&self) {
        let mut inner = self.lock();
        let last_start = inner.members.len().saturating_sub(self.window);
        inner.position = (inner.position + self.step).min(last_start);
        inner.reveals += 1;
    }
}
