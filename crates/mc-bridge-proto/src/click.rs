//! Back-protocol click primitives and the downstream frame.
//!
//! The back protocol understands a handful of cursor-mediated clicks; one
//! `ClickFrame` is emitted downstream per committed click, in exact recorded
//! order. Frame encoding to the wire is the embedder's job.

use serde::{Deserialize, Serialize};

use crate::item_stack::ItemStack;

/// Slot number carried by frames whose click lands outside the window.
pub const OUTSIDE_SLOT: i16 = -999;

/// The primitive click operations of the back protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClickKind {
    /// Left click: pick up the whole stack, or place/merge/swap the cursor.
    PickupOrPlaceAll,
    /// Right click: pick up half, or release exactly one held unit.
    PickupOrPlaceHalf,
    /// Drop key: remove one unit from the slot into the world.
    DropOne,
    /// Ctrl+drop: remove the whole stack from the slot into the world.
    DropAll,
    /// Left click outside the window: discard the whole held stack.
    OutsideAll,
    /// Right click outside the window: discard one held unit.
    OutsideOne,
    /// Shift click: move the whole stack along the window's fixed scan order.
    ShiftTransfer,
}

impl ClickKind {
    /// Back-protocol `(mode, button)` encoding for this click.
    pub fn mode_button(self) -> (u8, u8) {
        match self {
            ClickKind::PickupOrPlaceAll => (0, 0),
            ClickKind::PickupOrPlaceHalf => (0, 1),
            ClickKind::OutsideAll => (0, 0),
            ClickKind::OutsideOne => (0, 1),
            ClickKind::ShiftTransfer => (1, 0),
            ClickKind::DropOne => (4, 0),
            ClickKind::DropAll => (4, 1),
        }
    }

    /// Whether this click lands outside the window (frame slot = `OUTSIDE_SLOT`).
    pub fn is_outside(self) -> bool {
        matches!(self, ClickKind::OutsideAll | ClickKind::OutsideOne)
    }
}

/// One committed click, addressed to the downstream back-protocol peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickFrame {
    /// Back-protocol window id of the open container.
    pub container_id: u8,
    /// Server revision counter at the time of the click.
    pub revision: i32,
    /// Clicked canonical slot, or `OUTSIDE_SLOT`.
    pub slot: i16,
    /// Snapshot of the slot contents the click acted on.
    pub clicked_item: ItemStack,
    /// Back-protocol action kind (mode).
    pub kind: u8,
    /// Back-protocol action parameter (button).
    pub param: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_button_encoding() {
        assert_eq!(ClickKind::PickupOrPlaceAll.mode_button(), (0, 0));
        assert_eq!(ClickKind::PickupOrPlaceHalf.mode_button(), (0, 1));
        assert_eq!(ClickKind::ShiftTransfer.mode_button(), (1, 0));
        assert_eq!(ClickKind::DropOne.mode_button(), (4, 0));
        assert_eq!(ClickKind::DropAll.mode_button(), (4, 1));
    }

    #[test]
    fn outside_clicks_flagged() {
        assert!(ClickKind::OutsideAll.is_outside());
        assert!(ClickKind::OutsideOne.is_outside());
        assert!(!ClickKind::PickupOrPlaceAll.is_outside());
        assert!(!ClickKind::DropAll.is_outside());
    }
}
