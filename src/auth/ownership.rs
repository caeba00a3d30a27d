//! Ownership policy
//!
//! Per-resource check that the authenticated identity matches a
//! resource's owner reference before a mutation is permitted. Callers
//! must existence-check the resource first (`NotFound` before
//! `Forbidden`) and apply this check before the mutation.

use super::middleware::Identity;
use crate::data::EntityId;
use crate::error::AppError;

/// Assert that `identity` owns the resource whose owner field is `owner`
///
/// Comparison is `EntityId` equality. `what` names the resource in the
/// rejection message ("video", "playlist", ...).
///
/// # Errors
/// Returns `Forbidden` when the identity is not the owner.
pub fn assert_owner(owner: &EntityId, identity: &Identity, what: &str) -> Result<(), AppError> {
    if *owner == identity.id {
        return Ok(());
    }

    tracing::debug!(
        owner = %owner,
        user = %identity.id,
        resource = what,
        "Ownership check failed"
    );

    Err(AppError::Forbidden(format!(
        "you are not the owner of this {what}"
    )))
}
