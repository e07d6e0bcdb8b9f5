//! Canonical container state.
//!
//! One `InventoryModel` exists per open container for its whole lifetime:
//! a fixed-size ordered array of stacks plus the implicit cursor. It is
//! mutated only by committing a click plan; synthesis works on a clone.

use mc_bridge_proto::ItemStack;

/// Protocol-agnostic slot address within an open container.
///
/// Non-negative indices address the container's slot array; `-1` is the
/// cursor (the held stack outside any grid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalSlot(pub i16);

impl CanonicalSlot {
    pub const CURSOR: CanonicalSlot = CanonicalSlot(-1);

    pub fn is_cursor(self) -> bool {
        self.0 < 0
    }

    /// Array index for non-cursor slots.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for CanonicalSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_cursor() {
            write!(f, "cursor")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Authoritative state of one open container plus the cursor.
#[derive(Debug, Clone)]
pub struct InventoryModel {
    slots: Vec<ItemStack>,
    cursor: ItemStack,
    /// Monotonic counter for per-stack net ids.
    next_net_id: i32,
}

impl InventoryModel {
    /// Create an empty model with a fixed slot count.
    pub fn new(size: usize) -> Self {
        Self {
            slots: (0..size).map(|_| ItemStack::empty()).collect(),
            cursor: ItemStack::empty(),
            next_net_id: 1,
        }
    }

    /// Create a model from initial contents, assigning net ids to every
    /// non-empty stack that lacks one.
    pub fn from_contents(contents: Vec<ItemStack>) -> Self {
        let mut model = Self {
            slots: contents,
            cursor: ItemStack::empty(),
            next_net_id: 1,
        };
        for i in 0..model.slots.len() {
            if !model.slots[i].is_empty() && model.slots[i].net_id == 0 {
                let id = model.allocate_net_id();
                model.slots[i].net_id = id;
            }
        }
        model
    }

    pub fn size(&self) -> usize {
        self.slots.len()
    }

    /// Stack at a canonical slot; `None` if the index is out of range.
    pub fn get(&self, slot: CanonicalSlot) -> Option<&ItemStack> {
        if slot.is_cursor() {
            Some(&self.cursor)
        } else {
            self.slots.get(slot.index())
        }
    }

    /// Replace the stack at a canonical slot. Returns `false` when the index
    /// is out of range.
    pub fn set(&mut self, slot: CanonicalSlot, stack: ItemStack) -> bool {
        if slot.is_cursor() {
            self.cursor = stack;
            true
        } else if let Some(s) = self.slots.get_mut(slot.index()) {
            *s = stack;
            true
        } else {
            false
        }
    }

    pub fn cursor(&self) -> &ItemStack {
        &self.cursor
    }

    /// Allocate the next per-stack net id.
    pub fn allocate_net_id(&mut self) -> i32 {
        let id = self.next_net_id;
        self.next_net_id += 1;
        id
    }

    /// Next id this model would allocate.
    pub fn net_id_watermark(&self) -> i32 {
        self.next_net_id
    }

    /// Raise the allocation counter so ids stay unique when state moves
    /// between models (e.g. across window changes).
    pub fn raise_net_id_watermark(&mut self, watermark: i32) {
        if watermark > self.next_net_id {
            self.next_net_id = watermark;
        }
    }

    /// Total item count across all slots plus the cursor.
    pub fn total_count(&self) -> u64 {
        self.slots
            .iter()
            .chain(std::iter::once(&self.cursor))
            .map(|s| if s.is_empty() { 0 } else { s.count as u64 })
            .sum()
    }

    /// Slots whose contents differ from `other` (same size assumed).
    pub fn diff_slots(&self, other: &InventoryModel) -> Vec<CanonicalSlot> {
        self.slots
            .iter()
            .zip(other.slots.iter())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(i, _)| CanonicalSlot(i as i16))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_model_is_empty() {
        let model = InventoryModel::new(27);
        assert_eq!(model.size(), 27);
        assert_eq!(model.total_count(), 0);
        assert!(model.cursor().is_empty());
    }

    #[test]
    fn cursor_is_canonical_minus_one() {
        let mut model = InventoryModel::new(4);
        assert!(CanonicalSlot::CURSOR.is_cursor());
        model.set(CanonicalSlot::CURSOR, ItemStack::new(1, 5));
        assert_eq!(model.get(CanonicalSlot::CURSOR).unwrap().count, 5);
        assert_eq!(model.cursor().count, 5);
    }

    #[test]
    fn out_of_range_access() {
        let mut model = InventoryModel::new(4);
        assert!(model.get(CanonicalSlot(4)).is_none());
        assert!(!model.set(CanonicalSlot(9), ItemStack::new(1, 1)));
    }

    #[test]
    fn from_contents_assigns_net_ids() {
        let model = InventoryModel::from_contents(vec![
            ItemStack::new(1, 3),
            ItemStack::empty(),
            ItemStack::with_net_id(2, 1, 77),
        ]);
        assert_ne!(model.get(CanonicalSlot(0)).unwrap().net_id, 0);
        assert_eq!(model.get(CanonicalSlot(1)).unwrap().net_id, 0);
        assert_eq!(model.get(CanonicalSlot(2)).unwrap().net_id, 77);
    }

    #[test]
    fn net_ids_are_monotonic() {
        let mut model = InventoryModel::new(1);
        let a = model.allocate_net_id();
        let b = model.allocate_net_id();
        assert!(b > a);
    }

    #[test]
    fn total_count_includes_cursor() {
        let mut model = InventoryModel::new(2);
        model.set(CanonicalSlot(0), ItemStack::new(1, 40));
        model.set(CanonicalSlot::CURSOR, ItemStack::new(1, 20));
        assert_eq!(model.total_count(), 60);
    }

    #[test]
    fn diff_slots_finds_changes() {
        let mut a = InventoryModel::new(3);
        a.set(CanonicalSlot(1), ItemStack::new(1, 10));
        let mut b = a.clone();
        b.set(CanonicalSlot(1), ItemStack::new(1, 5));
        b.set(CanonicalSlot(2), ItemStack::new(2, 1));
        assert_eq!(
            b.diff_slots(&a),
            vec![CanonicalSlot(1), CanonicalSlot(2)]
        );
    }
}
