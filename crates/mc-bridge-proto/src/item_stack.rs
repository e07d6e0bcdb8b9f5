//! ItemStack type shared by both protocol sides.
//!
//! Item identity is an opaque numeric id resolved by the embedder's item
//! table; `extra_data` is an opaque blob (enchantments, custom names, …)
//! that only participates in stackability comparisons.

use serde::{Deserialize, Serialize};

/// A single item stack.
///
/// `item_id == 0` means the slot is empty (air). Empty is a distinct
/// sentinel value, not an `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// Item identity from the embedder's item table. 0 = air/empty.
    pub item_id: i32,
    /// Number of items in this stack.
    pub count: u16,
    /// Opaque extra data blob. Two stacks with differing blobs never merge.
    #[serde(default)]
    pub extra_data: Vec<u8>,
    /// Server-assigned per-stack instance id ("net id"). 0 = unassigned.
    #[serde(default)]
    pub net_id: i32,
}

impl ItemStack {
    /// An empty slot (air).
    pub fn empty() -> Self {
        Self {
            item_id: 0,
            count: 0,
            extra_data: Vec::new(),
            net_id: 0,
        }
    }

    /// Create a simple stack with no extra data.
    pub fn new(item_id: i32, count: u16) -> Self {
        Self {
            item_id,
            count,
            extra_data: Vec::new(),
            net_id: 0,
        }
    }

    /// Create a stack with a preassigned net id.
    pub fn with_net_id(item_id: i32, count: u16, net_id: i32) -> Self {
        Self {
            item_id,
            count,
            extra_data: Vec::new(),
            net_id,
        }
    }

    /// Whether this slot is empty.
    pub fn is_empty(&self) -> bool {
        self.item_id == 0 || self.count == 0
    }

    /// A copy of this stack with a different count.
    ///
    /// Count 0 collapses to the empty sentinel so no "ghost" stack with an
    /// identity but no items can be observed.
    pub fn with_count(&self, count: u16) -> Self {
        if count == 0 {
            Self::empty()
        } else {
            Self {
                count,
                ..self.clone()
            }
        }
    }
}

impl Default for ItemStack {
    fn default() -> Self {
        Self::empty()
    }
}
