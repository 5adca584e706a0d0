//! Identifier resolution with exponential backoff.
//!
//! Rate-limit and transient failures are retried after
//! `2^(attempt + 1) * base`; a missing member fails immediately.

use listsync_core::{MemberKey, ResolverPolicy, StableId};
use listsync_view::Pacer;

use crate::api::IdentityApi;
use crate::error::{ApiError, ResolutionError, Result};

/// Maps member keys to stable ids.
pub struct Resolver<I: IdentityApi, P: Pacer> {
    api: I,
    pacer: P,
    policy: ResolverPolicy,
}

impl<I: IdentityApi, P: Pacer> Resolver<I, P> {
    pub fn new(api: I, pacer: P, policy: ResolverPolicy) -> Self {
        Self { api, pacer, policy }
    }

    /// Resolve `key`, retrying at most `max_retries` times.
    pub async fn resolve(&self, key: &MemberKey) -> Result<StableId> {
        let mut attempt: u32 = 0;

        loop {
            let error = match self.api.lookup(key).await {
                Ok(Some(id)) => {
                    tracing::debug!(key = %key, id = %id, "resolved member");
                    return Ok(id);
                }
                Ok(None) | Err(ApiError::NotFound) => {
                    return Err(ResolutionError::NotFound { key: key.clone() });
                }
                Err(error) => error,
            };

            if !error.is_transient() {
                return Err(ResolutionError::Rejected {
                    key: key.clone(),
                    error,
                });
            }

            if attempt >= self.policy.max_retries {
                return Err(ResolutionError::RetriesExhausted {
                    key: key.clone(),
                    attempts: attempt + 1,
                    last: error,
                });
            }

            let delay = self.policy.backoff.delay(attempt);
            tracing::warn!(
                key = %key,
                error = %error,
                retry = attempt + 1,
                max_retries = self.policy.max_retries,
                delay_ms = delay.as_millis() as u64,
                "lookup failed, backing off"
            );
            self.pacer.pause(delay).await;
            attempt += 1;
        }
    }
}
