//! Front-protocol inventory requests.
//!
//! A batch carries one or more requests; each request is an ordered list of
//! typed sub-actions operating on flat `(container, slot)` addresses. The
//! client also reports what it believes each touched slot holds (item id,
//! count, net id) so the server can detect stale state before acting.

use serde::{Deserialize, Serialize};

use crate::item_stack::ItemStack;

/// External container addressing used by front-protocol slot references.
///
/// Several tags address disjoint regions of the same physical window (e.g.
/// the furnace slots); the per-category topology decides which tags a given
/// window accepts and how their slot numbers map onto canonical indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContainerTag {
    /// The held item outside any grid.
    Cursor,
    /// Combined hotbar (0-8) and backpack (9-35) addressing.
    HotbarAndInventory,
    /// Armor slots 0-3.
    Armor,
    /// Offhand slot 0.
    Offhand,
    /// Crafting grid cells. The front protocol numbers the 2×2 grid 28-31
    /// and the 3×3 grid 32-40.
    CraftingInput,
    /// Crafting result slot.
    CraftingOutput,
    /// Creative result slot; claimed net ids here are legitimately stale.
    CreativeOutput,
    /// Contents of an opened block container (chest and friends).
    LevelEntity,
    FurnaceIngredient,
    FurnaceFuel,
    FurnaceResult,
}

/// A flat front-protocol slot reference plus the client's claimed view of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRef {
    pub container: ContainerTag,
    pub slot: u8,
    /// Claimed item identity. 0 = client claims the slot is empty.
    #[serde(default)]
    pub claimed_item_id: i32,
    #[serde(default)]
    pub claimed_count: u16,
    /// Claimed per-stack net id. 0 = unspecified, always passes validation.
    #[serde(default)]
    pub claimed_net_id: i32,
}

impl SlotRef {
    /// Reference with no claims attached (claims all zero / unspecified).
    pub fn bare(container: ContainerTag, slot: u8) -> Self {
        Self {
            container,
            slot,
            claimed_item_id: 0,
            claimed_count: 0,
            claimed_net_id: 0,
        }
    }

    /// Reference claiming a particular net id.
    pub fn claiming(container: ContainerTag, slot: u8, net_id: i32) -> Self {
        Self {
            container,
            slot,
            claimed_item_id: 0,
            claimed_count: 0,
            claimed_net_id: net_id,
        }
    }
}

/// Individual sub-action within a request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StackAction {
    Take {
        count: u16,
        src: SlotRef,
        dst: SlotRef,
    },
    Place {
        count: u16,
        src: SlotRef,
        dst: SlotRef,
    },
    Swap {
        src: SlotRef,
        dst: SlotRef,
    },
    Drop {
        count: u16,
        src: SlotRef,
    },
    /// Consume ingredients during a craft.
    Consume {
        count: u16,
        src: SlotRef,
    },
    /// Select a recipe for a manual craft.
    CraftRecipe {
        recipe_net_id: u32,
    },
    /// Auto-craft (shift-click craft): the server repopulates the grid.
    CraftRecipeAuto {
        recipe_net_id: u32,
        times_crafted: u8,
        /// Ingredient stacks the client expects to be consumed.
        ingredients: Vec<ItemStack>,
    },
    /// Legacy result notification; carries the client's predicted output.
    CraftResultsDeprecated {
        result_items: Vec<ItemStack>,
        times_crafted: u8,
    },
    /// Creative item spawn by creative-registry net id.
    CraftCreative {
        creative_item_net_id: u32,
    },
    /// Recipe with a filter-string argument (anvil-style surfaces).
    CraftRecipeOptional {
        recipe_net_id: u32,
        filter_string_index: i32,
    },
    /// Forward compatibility: any action kind this version does not model.
    Unknown {
        action_type: u8,
    },
}

/// A single request: an ordered list of sub-actions applied atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackRequest {
    pub request_id: i32,
    pub actions: Vec<StackAction>,
    /// Text inputs referenced by `CraftRecipeOptional` actions.
    #[serde(default)]
    pub filter_strings: Vec<String>,
}

/// A batch of requests processed all-or-nothing against one container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemStackBatch {
    pub requests: Vec<StackRequest>,
}
