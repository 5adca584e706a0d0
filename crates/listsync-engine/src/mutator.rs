//! Single membership mutations.
//!
//! One call, no retry. Pacing and burst backoff belong to the orchestrator
//! because they track failures across members, not within one call.

use listsync_core::{CollectionId, Operation, StableId};

use crate::api::MembershipApi;
use crate::error::MutationError;

/// Applies one add or remove against the membership API.
pub struct Mutator<M: MembershipApi> {
    api: M,
}

impl<M: MembershipApi> Mutator<M> {
    pub fn new(api: M) -> Self {
        Self { api }
    }

    pub async fn apply(
        &self,
        operation: Operation,
        id: &StableId,
        collection: &CollectionId,
    ) -> std::result::Result<(), MutationError> {
        let result = match operation {
            Operation::Add => self.api.add_member(collection, id).await,
            Operation::Remove => self.api.remove_member(collection, id).await,
        };

        result.map_err(|error| {
            let error = MutationError::from_api(operation, &error);
            tracing::warn!(
                operation = operation.as_str(),
                id = %id,
                collection = %collection,
                status = ?error.status,
                "mutation failed"
            );
            error
        })
    }
}
