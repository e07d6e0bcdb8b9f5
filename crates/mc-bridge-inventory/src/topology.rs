//! Per-container-category slot topology.
//!
//! Each category is a pure bijection between front-protocol
//! `(ContainerTag, slot)` addresses and canonical indices, plus slot-kind
//! classification and the fixed scan orders the click semantics depend on.
//! The categories form a closed sum type so that "every category handled"
//! is checked by exhaustive matches, not by dynamic dispatch.

use mc_bridge_proto::request::ContainerTag;

use crate::model::CanonicalSlot;

/// Classification of a canonical slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Normal,
    /// Transfer source only; placement is always rejected.
    Output,
    /// Like `Output`, and a half-pickup voids the remainder instead of
    /// returning it.
    FurnaceOutput,
}

/// Result of resolving a front-protocol slot reference.
///
/// "Maps to the cursor", "maps to canonical slot 0", and "does not belong to
/// this container" are three distinct outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotMapping {
    Slot(CanonicalSlot),
    Cursor,
    NoMatch,
}

/// The closed set of container categories this bridge understands.
///
/// Canonical layouts (cursor is always −1):
///
/// * `Player` — 0 crafting result, 1–4 crafting 2×2, 5–8 armor,
///   9–35 backpack, 36–44 hotbar, 45 offhand.
/// * `Generic { size }` — 0..size contents, then 27 backpack, 9 hotbar.
/// * `CraftingTable` — 0 result, 1–9 grid 3×3, 10–36 backpack, 37–45 hotbar.
/// * `Furnace` — 0 ingredient, 1 fuel, 2 result, 3–29 backpack, 30–38 hotbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerCategory {
    Player,
    Generic { size: u16 },
    CraftingTable,
    Furnace,
}

/// Front-protocol slot numbering of the 2×2 crafting grid.
const SMALL_GRID_FIRST: u8 = 28;
/// Front-protocol slot numbering of the 3×3 crafting grid.
const LARGE_GRID_FIRST: u8 = 32;

impl ContainerCategory {
    /// Number of canonical slots (cursor excluded).
    pub fn size(&self) -> u16 {
        match self {
            ContainerCategory::Player => 46,
            ContainerCategory::Generic { size } => size + 36,
            ContainerCategory::CraftingTable => 46,
            ContainerCategory::Furnace => 39,
        }
    }

    /// First backpack slot; backpack is always 27 slots followed by the
    /// 9-slot hotbar.
    fn storage_first(&self) -> i16 {
        match self {
            ContainerCategory::Player => 9,
            ContainerCategory::Generic { size } => *size as i16,
            ContainerCategory::CraftingTable => 10,
            ContainerCategory::Furnace => 3,
        }
    }

    fn hotbar_first(&self) -> i16 {
        self.storage_first() + 27
    }

    /// Resolve a front-protocol reference to a canonical slot.
    pub fn external_to_canonical(&self, tag: ContainerTag, slot: u8) -> SlotMapping {
        if tag == ContainerTag::Cursor {
            return SlotMapping::Cursor;
        }
        let s = slot as i16;
        let mapped = match (self, tag) {
            // Combined hotbar-and-backpack addressing is accepted by every
            // category; only the canonical offset differs.
            (_, ContainerTag::HotbarAndInventory) => match slot {
                0..=8 => Some(self.hotbar_first() + s),
                9..=35 => Some(self.storage_first() + s - 9),
                _ => None,
            },

            (ContainerCategory::Player, ContainerTag::Armor) if slot < 4 => Some(5 + s),
            (ContainerCategory::Player, ContainerTag::Offhand) if slot == 0 => Some(45),
            (ContainerCategory::Player, ContainerTag::CraftingInput)
                if (SMALL_GRID_FIRST..SMALL_GRID_FIRST + 4).contains(&slot) =>
            {
                Some(1 + s - SMALL_GRID_FIRST as i16)
            }
            (ContainerCategory::Player, ContainerTag::CraftingOutput)
            | (ContainerCategory::Player, ContainerTag::CreativeOutput)
                if slot == 0 =>
            {
                Some(0)
            }

            (ContainerCategory::Generic { size }, ContainerTag::LevelEntity)
                if s < *size as i16 =>
            {
                Some(s)
            }

            (ContainerCategory::CraftingTable, ContainerTag::CraftingInput)
                if (LARGE_GRID_FIRST..LARGE_GRID_FIRST + 9).contains(&slot) =>
            {
                Some(1 + s - LARGE_GRID_FIRST as i16)
            }
            (ContainerCategory::CraftingTable, ContainerTag::CraftingOutput) if slot == 0 => {
                Some(0)
            }

            (ContainerCategory::Furnace, ContainerTag::FurnaceIngredient) if slot == 0 => Some(0),
            (ContainerCategory::Furnace, ContainerTag::FurnaceFuel) if slot == 1 => Some(1),
            (ContainerCategory::Furnace, ContainerTag::FurnaceResult) if slot == 2 => Some(2),

            _ => None,
        };
        match mapped {
            Some(c) => SlotMapping::Slot(CanonicalSlot(c)),
            None => SlotMapping::NoMatch,
        }
    }

    /// Inverse of [`external_to_canonical`](Self::external_to_canonical) for
    /// canonical slots of this category. `None` if out of range.
    pub fn canonical_to_external(&self, slot: CanonicalSlot) -> Option<(ContainerTag, u8)> {
        let c = slot.0;
        if c < 0 || c >= self.size() as i16 {
            return None;
        }
        let storage = self.storage_first();
        let hotbar = self.hotbar_first();
        // Storage and hotbar share the combined external numbering.
        if (storage..hotbar).contains(&c) {
            return Some((ContainerTag::HotbarAndInventory, (c - storage + 9) as u8));
        }
        if c >= hotbar {
            match self {
                ContainerCategory::Player if c == 45 => {
                    return Some((ContainerTag::Offhand, 0));
                }
                _ => return Some((ContainerTag::HotbarAndInventory, (c - hotbar) as u8)),
            }
        }
        match self {
            ContainerCategory::Player => match c {
                0 => Some((ContainerTag::CraftingOutput, 0)),
                1..=4 => Some((ContainerTag::CraftingInput, SMALL_GRID_FIRST + (c - 1) as u8)),
                5..=8 => Some((ContainerTag::Armor, (c - 5) as u8)),
                _ => None,
            },
            ContainerCategory::Generic { .. } => Some((ContainerTag::LevelEntity, c as u8)),
            ContainerCategory::CraftingTable => match c {
                0 => Some((ContainerTag::CraftingOutput, 0)),
                1..=9 => Some((ContainerTag::CraftingInput, LARGE_GRID_FIRST + (c - 1) as u8)),
                _ => None,
            },
            ContainerCategory::Furnace => match c {
                0 => Some((ContainerTag::FurnaceIngredient, 0)),
                1 => Some((ContainerTag::FurnaceFuel, 1)),
                2 => Some((ContainerTag::FurnaceResult, 2)),
                _ => None,
            },
        }
    }

    /// Classification of a canonical slot.
    pub fn slot_kind(&self, slot: CanonicalSlot) -> SlotKind {
        match (self, slot.0) {
            (ContainerCategory::Player, 0) => SlotKind::Output,
            (ContainerCategory::CraftingTable, 0) => SlotKind::Output,
            (ContainerCategory::Furnace, 2) => SlotKind::FurnaceOutput,
            _ => SlotKind::Normal,
        }
    }

    /// Canonical range eligible as temp slots: backpack plus hotbar,
    /// offhand and special UI regions excluded.
    pub fn temp_slot_range(&self) -> std::ops::RangeInclusive<i16> {
        self.storage_first()..=self.hotbar_first() + 8
    }

    /// Crafting grid, if this category has one: (first canonical cell,
    /// grid width, grid height).
    pub fn grid(&self) -> Option<(CanonicalSlot, u8, u8)> {
        match self {
            ContainerCategory::Player => Some((CanonicalSlot(1), 2, 2)),
            ContainerCategory::CraftingTable => Some((CanonicalSlot(1), 3, 3)),
            _ => None,
        }
    }

    /// Craft result slot, if this category has one.
    pub fn output_slot(&self) -> Option<CanonicalSlot> {
        match self {
            ContainerCategory::Player | ContainerCategory::CraftingTable => {
                Some(CanonicalSlot(0))
            }
            _ => None,
        }
    }

    /// Fixed scan order for `ShiftTransfer` from `from`.
    ///
    /// Special regions (grid, output, armor, furnace slots, chest contents)
    /// shift into the backpack then the hotbar; within storage, the backpack
    /// and hotbar shift into each other, and generic container storage
    /// shifts into the contents.
    pub fn shift_destinations(&self, from: CanonicalSlot) -> Vec<CanonicalSlot> {
        let storage = self.storage_first();
        let hotbar = self.hotbar_first();
        let c = from.0;
        if c < storage {
            return (storage..=hotbar + 8).map(CanonicalSlot).collect();
        }
        match self {
            ContainerCategory::Generic { size } => {
                (0..*size as i16).map(CanonicalSlot).collect()
            }
            _ => {
                if c < hotbar {
                    // Backpack shifts into the hotbar.
                    (hotbar..=hotbar + 8).map(CanonicalSlot).collect()
                } else {
                    // Hotbar (and offhand) shifts into the backpack.
                    (storage..hotbar).map(CanonicalSlot).collect()
                }
            }
        }
    }
}
