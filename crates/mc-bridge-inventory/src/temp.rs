//! Scratch-slot search over the backpack/hotbar range.

use mc_bridge_proto::ItemStack;

use crate::model::{CanonicalSlot, InventoryModel};
use crate::oracle::ItemOracle;
use crate::topology::ContainerCategory;

/// Find a slot usable to park a stack mid-synthesis.
///
/// Scans only the category's backpack+hotbar range in ascending canonical
/// order. A candidate qualifies when it is empty, or — unless `empty_only` —
/// when its stack can merge neither with `avoid` nor with the stack at any
/// excluded slot. Deterministic for a given model and exclusion set.
/// `None` means the enclosing synthesis must reject; never evict.
pub fn find(
    model: &InventoryModel,
    items: &dyn ItemOracle,
    category: &ContainerCategory,
    avoid: &ItemStack,
    empty_only: bool,
    excluded: &[CanonicalSlot],
) -> Option<CanonicalSlot> {
    for c in category.temp_slot_range() {
        let slot = CanonicalSlot(c);
        if excluded.contains(&slot) {
            continue;
        }
        let stack = match model.get(slot) {
            Some(s) => s,
            None => continue,
        };
        if stack.is_empty() {
            return Some(slot);
        }
        if empty_only || items.can_stack(stack, avoid) {
            continue;
        }
        let collides = excluded.iter().any(|&ex| {
            model
                .get(ex)
                .is_some_and(|other| items.can_stack(stack, other))
        });
        if !collides {
            return Some(slot);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ItemTable;

    fn chest() -> ContainerCategory {
        ContainerCategory::Generic { size: 27 }
    }

    #[test]
    fn picks_first_empty_slot_in_ascending_order() {
        let items = ItemTable::new();
        let mut model = InventoryModel::new(chest().size() as usize);
        // Fill the first two storage slots (canonical 27, 28).
        model.set(CanonicalSlot(27), ItemStack::new(1, 1));
        model.set(CanonicalSlot(28), ItemStack::new(2, 1));
        let found = find(
            &model,
            &items,
            &chest(),
            &ItemStack::new(3, 1),
            true,
            &[],
        );
        assert_eq!(found, Some(CanonicalSlot(29)));
    }

    #[test]
    fn ignores_container_contents_region() {
        let items = ItemTable::new();
        let model = InventoryModel::new(chest().size() as usize);
        let found = find(&model, &items, &chest(), &ItemStack::new(1, 1), true, &[]);
        // Chest slots 0-26 are empty too, but only storage qualifies.
        assert_eq!(found, Some(CanonicalSlot(27)));
    }

    #[test]
    fn excluded_slots_are_skipped() {
        let items = ItemTable::new();
        let model = InventoryModel::new(chest().size() as usize);
        let found = find(
            &model,
            &items,
            &chest(),
            &ItemStack::new(1, 1),
            true,
            &[CanonicalSlot(27), CanonicalSlot(28)],
        );
        assert_eq!(found, Some(CanonicalSlot(29)));
    }

    #[test]
    fn occupied_slot_qualifies_when_nothing_can_merge() {
        let items = ItemTable::new();
        let mut model = InventoryModel::new(chest().size() as usize);
        for c in chest().temp_slot_range() {
            model.set(CanonicalSlot(c), ItemStack::new(9, 1));
        }
        let avoid = ItemStack::new(1, 1);
        assert_eq!(
            find(&model, &items, &chest(), &avoid, false, &[]),
            Some(CanonicalSlot(27))
        );
        // Same item everywhere: merging is possible, so nothing qualifies.
        assert_eq!(
            find(&model, &items, &chest(), &ItemStack::new(9, 1), false, &[]),
            None
        );
    }

    #[test]
    fn empty_only_rejects_occupied_slots() {
        let items = ItemTable::new();
        let mut model = InventoryModel::new(chest().size() as usize);
        for c in chest().temp_slot_range() {
            model.set(CanonicalSlot(c), ItemStack::new(9, 1));
        }
        assert_eq!(
            find(&model, &items, &chest(), &ItemStack::new(1, 1), true, &[]),
            None
        );
    }

    #[test]
    fn occupied_slot_must_not_stack_with_excluded_stacks() {
        let items = ItemTable::new();
        let mut model = InventoryModel::new(chest().size() as usize);
        // Candidate 27 holds the same item as excluded slot 3.
        model.set(CanonicalSlot(3), ItemStack::new(5, 1));
        for c in chest().temp_slot_range() {
            model.set(CanonicalSlot(c), ItemStack::new(5, 1));
        }
        model.set(CanonicalSlot(30), ItemStack::new(6, 1));
        let found = find(
            &model,
            &items,
            &chest(),
            &ItemStack::new(1, 1),
            false,
            &[CanonicalSlot(3)],
        );
        assert_eq!(found, Some(CanonicalSlot(30)));
    }
}
