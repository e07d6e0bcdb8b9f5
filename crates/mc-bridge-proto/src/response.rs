//! Outbound batch responses for the front protocol.

use serde::{Deserialize, Serialize};

use crate::item_stack::ItemStack;
use crate::request::ContainerTag;

/// Why a batch was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectKind {
    /// Malformed or out-of-order input. No retry will succeed.
    Structural,
    /// Client claims diverged from authoritative state; a full snapshot
    /// broadcast follows.
    StaleState,
    /// Valid request that cannot be represented as back-protocol clicks
    /// (no temp slot, ambiguous swap). Nothing diverged; no resync needed.
    Infeasible,
}

/// Authoritative state of one touched slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotReport {
    pub slot: u8,
    pub count: u16,
    pub net_id: i32,
}

/// Touched slots grouped per front-protocol container tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerReport {
    pub container: ContainerTag,
    pub slots: Vec<SlotReport>,
}

/// The outcome of one batch: all requests applied, or nothing at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchResponse {
    /// Every request was synthesized and committed; the reports carry the
    /// authoritative contents of each touched slot plus the cursor.
    Accepted {
        containers: Vec<ContainerReport>,
        cursor: ItemStack,
    },
    /// Nothing was sent downstream and the model is untouched. On
    /// `StaleState` the collaborator layer broadcasts the full snapshot.
    Rejected { kind: RejectKind },
}

impl BatchResponse {
    pub fn is_accepted(&self) -> bool {
        matches!(self, BatchResponse::Accepted { .. })
    }

    /// Whether the embedder must follow up with a full-state broadcast.
    pub fn needs_resync(&self) -> bool {
        matches!(
            self,
            BatchResponse::Rejected {
                kind: RejectKind::StaleState
            }
        )
    }
}
