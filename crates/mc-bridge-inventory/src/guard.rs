//! Staleness detection against claimed net ids.

use crate::error::SynthError;
use crate::model::{CanonicalSlot, InventoryModel};

/// Claimed net id meaning "client makes no claim"; always passes.
pub const UNSPECIFIED_NET_ID: i32 = 0;

/// Whether a claimed net id matches the model's current stack at `at`.
pub fn check_net_id(model: &InventoryModel, claimed: i32, at: CanonicalSlot) -> bool {
    if claimed == UNSPECIFIED_NET_ID {
        return true;
    }
    match model.get(at) {
        Some(stack) => stack.net_id == claimed,
        None => false,
    }
}

/// [`check_net_id`] as a guard: a mismatch is a stale-state error, which
/// rejects the whole batch and obliges a full-state resynchronization.
pub fn require_net_id(
    model: &InventoryModel,
    claimed: i32,
    at: CanonicalSlot,
) -> Result<(), SynthError> {
    if check_net_id(model, claimed, at) {
        Ok(())
    } else {
        Err(SynthError::StaleNetId {
            slot: at.0,
            claimed,
            actual: model.get(at).map(|s| s.net_id).unwrap_or(0),
        })
    }
}
