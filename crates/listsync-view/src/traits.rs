//! ListView trait: the abstract interface to a virtualized list.
//!
//! The view only ever renders a window of its members. Callers capture
//! what is visible, ask for more, and repeat. Implementations may be a
//! scraped web page, a paginated API, or the in-memory view used in tests.

use std::sync::Arc;

use async_trait::async_trait;
use listsync_core::MemberKey;

use crate::error::Result;

/// A live, virtualized list of members.
///
/// # Design Notes
///
/// - `visible_keys` and `reveal_more` never fail: a view that cannot
///   render anything simply shows nothing.
/// - `prepare` is the only fallible step. It checks that the view shows
///   the expected list and rewinds it to the start.
#[async_trait]
pub trait ListView: Send + Sync {
    /// Check the view and move it to the beginning of the list.
    async fn prepare(&self) -> Result<()> {
        Ok(())
    }

    /// Keys currently rendered.
    async fn visible_keys(&self) -> Vec<MemberKey>;

    /// Ask the view to render further members (e.g. scroll by a viewport).
    async fn reveal_more(&self);
}

#[async_trait]
impl<V: ListView + ?Sized> ListView for Arc<V> {
    async fn prepare(&self) -> Result<()> {
        (**self).prepare().await
    }

    async fn visible_keys(&self) -> Vec<MemberKey> {
        (**self).visible_keys().await
    }

    async fn reveal_more(&self) {
        (**self).reveal_more().await
    }
}
