//! Synthesis errors and the rejection taxonomy.

use thiserror::Error;

use mc_bridge_proto::request::ContainerTag;
use mc_bridge_proto::response::RejectKind;

/// Why a batch could not be synthesized.
///
/// Every variant maps onto one of the three rejection kinds of the front
/// protocol: structural (bad input), stale state (client diverged, resync
/// required), or infeasible (valid but unrepresentable as clicks). A
/// synthesis error never leaves partial state behind; the shadow plan it
/// aborted is discarded wholesale.
#[derive(Debug, Error)]
pub enum SynthError {
    #[error("slot {tag:?}[{slot}] does not belong to this container")]
    NoSuchSlot { tag: ContainerTag, slot: u8 },

    #[error("unknown action type {0}")]
    UnknownAction(u8),

    #[error("craft sub-action out of state-machine order")]
    CraftOutOfOrder,

    #[error("unknown recipe net id {0}")]
    UnknownRecipe(u32),

    #[error("unknown creative item net id {0}")]
    UnknownCreativeItem(u32),

    #[error("action not supported here: {0}")]
    Unsupported(&'static str),

    #[error("recipe is {width}x{height} but the grid is {grid_width}x{grid_height}")]
    GridShape {
        width: u8,
        height: u8,
        grid_width: u8,
        grid_height: u8,
    },

    #[error("crafting grid contents do not match recipe {0}")]
    GridMismatch(u32),

    #[error("crafting grid or cursor not empty at auto-craft start")]
    GridNotEmpty,

    #[error("count {requested} not available (slot holds {available})")]
    BadCount { requested: u16, available: u16 },

    #[error("cannot place into an output slot")]
    PlaceIntoOutput,

    #[error("swap would merge stackable stacks")]
    SwapWouldMerge,

    #[error("destination cannot absorb the transfer")]
    DestinationFull,

    #[error("no temp slot available to park the held stack")]
    NoTempSlot,

    #[error("click not representable: {0}")]
    Unrepresentable(&'static str),

    #[error("net id mismatch at canonical slot {slot}: claimed {claimed}, actual {actual}")]
    StaleNetId {
        slot: i16,
        claimed: i32,
        actual: i32,
    },
}

impl SynthError {
    /// The front-protocol rejection kind this error maps to.
    pub fn kind(&self) -> RejectKind {
        match self {
            SynthError::NoSuchSlot { .. }
            | SynthError::UnknownAction(_)
            | SynthError::CraftOutOfOrder
            | SynthError::UnknownRecipe(_)
            | SynthError::UnknownCreativeItem(_)
            | SynthError::Unsupported(_)
            | SynthError::GridShape { .. }
            | SynthError::GridMismatch(_)
            | SynthError::GridNotEmpty
            | SynthError::BadCount { .. } => RejectKind::Structural,

            SynthError::StaleNetId { .. } => RejectKind::StaleState,

            SynthError::PlaceIntoOutput
            | SynthError::SwapWouldMerge
            | SynthError::DestinationFull
            | SynthError::NoTempSlot
            | SynthError::Unrepresentable(_) => RejectKind::Infeasible,
        }
    }
}
