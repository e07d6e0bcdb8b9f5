//! Shadow-model click simulation and the commit point.
//!
//! A `ClickPlanner` is created per batch. Every appended click is simulated
//! against a private shadow copy of the container model; an operation the
//! back protocol cannot represent aborts the whole batch. `commit` is the
//! single point where the recorded clicks are emitted downstream and the
//! shadow becomes authoritative.

use tracing::trace;

use mc_bridge_proto::click::{ClickFrame, ClickKind, OUTSIDE_SLOT};
use mc_bridge_proto::ItemStack;

use crate::error::SynthError;
use crate::model::{CanonicalSlot, InventoryModel};
use crate::oracle::ItemOracle;
use crate::topology::{ContainerCategory, SlotKind};

/// Downstream consumer of committed click frames.
pub trait ClickSink {
    fn send_click(&mut self, frame: ClickFrame);
}

impl ClickSink for Vec<ClickFrame> {
    fn send_click(&mut self, frame: ClickFrame) {
        self.push(frame);
    }
}

#[derive(Debug, Clone)]
struct PlannedClick {
    kind: ClickKind,
    slot: CanonicalSlot,
    /// Slot contents the click acted on (empty for outside clicks).
    clicked_item: ItemStack,
}

/// Ordered click log plus the private shadow model it was simulated against.
pub struct ClickPlanner<'a> {
    category: ContainerCategory,
    items: &'a dyn ItemOracle,
    baseline: InventoryModel,
    shadow: InventoryModel,
    log: Vec<PlannedClick>,
}

impl std::fmt::Debug for ClickPlanner<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickPlanner")
            .field("category", &self.category)
            .field("items", &"<dyn ItemOracle>")
            .field("baseline", &self.baseline)
            .field("shadow", &self.shadow)
            .field("log", &self.log)
            .finish()
    }
}

impl<'a> ClickPlanner<'a> {
    pub fn new(
        category: ContainerCategory,
        items: &'a dyn ItemOracle,
        model: &InventoryModel,
    ) -> Self {
        Self {
            category,
            items,
            baseline: model.clone(),
            shadow: model.clone(),
            log: Vec::new(),
        }
    }

    pub fn category(&self) -> ContainerCategory {
        self.category
    }

    /// Current shadow state.
    pub fn shadow(&self) -> &InventoryModel {
        &self.shadow
    }

    /// Pre-plan snapshot the shadow started from.
    pub fn baseline(&self) -> &InventoryModel {
        &self.baseline
    }

    /// Shadow contents of a slot.
    pub fn item_at(&self, slot: CanonicalSlot) -> Result<&ItemStack, SynthError> {
        self.shadow
            .get(slot)
            .ok_or(SynthError::Unrepresentable("slot outside container"))
    }

    /// Shadow cursor contents.
    pub fn cursor(&self) -> &ItemStack {
        self.shadow.cursor()
    }

    /// Number of clicks recorded so far.
    pub fn click_count(&self) -> usize {
        self.log.len()
    }

    /// Simulate one click against the shadow and record it.
    pub fn append(&mut self, kind: ClickKind, slot: CanonicalSlot) -> Result<(), SynthError> {
        let clicked_item = if kind.is_outside() {
            ItemStack::empty()
        } else {
            if slot.is_cursor() {
                return Err(SynthError::Unrepresentable("clicks cannot target the cursor"));
            }
            self.item_at(slot)?.clone()
        };

        match kind {
            ClickKind::PickupOrPlaceAll => self.pickup_or_place_all(slot)?,
            ClickKind::PickupOrPlaceHalf => self.pickup_or_place_half(slot)?,
            ClickKind::DropOne => self.drop_from_slot(slot, 1)?,
            ClickKind::DropAll => self.drop_from_slot(slot, u16::MAX)?,
            ClickKind::OutsideAll => self.discard_cursor(u16::MAX)?,
            ClickKind::OutsideOne => self.discard_cursor(1)?,
            ClickKind::ShiftTransfer => self.shift_transfer(slot)?,
        }

        trace!(?kind, %slot, "planned click");
        self.log.push(PlannedClick {
            kind,
            slot,
            clicked_item,
        });
        Ok(())
    }

    fn pickup_or_place_all(&mut self, slot: CanonicalSlot) -> Result<(), SynthError> {
        let kind = self.category.slot_kind(slot);
        let cursor = self.shadow.cursor().clone();
        let stack = self.item_at(slot)?.clone();

        if cursor.is_empty() {
            if stack.is_empty() {
                return Err(SynthError::Unrepresentable("pickup from an empty slot"));
            }
            self.shadow.set(slot, ItemStack::empty());
            self.shadow.set(CanonicalSlot::CURSOR, stack);
            return Ok(());
        }

        match kind {
            SlotKind::Output | SlotKind::FurnaceOutput => {
                // Output slots are sources only; a click with a held stack
                // can only merge the output into it.
                if stack.is_empty() {
                    return Err(SynthError::Unrepresentable("pickup from an empty output"));
                }
                if !self.items.can_stack(&cursor, &stack) {
                    return Err(SynthError::PlaceIntoOutput);
                }
                let max = self.items.max_stack_size(cursor.item_id);
                if cursor.count + stack.count > max {
                    return Err(SynthError::DestinationFull);
                }
                self.shadow.set(slot, ItemStack::empty());
                self.shadow
                    .set(CanonicalSlot::CURSOR, cursor.with_count(cursor.count + stack.count));
            }
            SlotKind::Normal => {
                if stack.is_empty() {
                    self.shadow.set(slot, cursor);
                    self.shadow.set(CanonicalSlot::CURSOR, ItemStack::empty());
                } else if self.items.can_stack(&cursor, &stack) {
                    let max = self.items.max_stack_size(stack.item_id);
                    let space = max.saturating_sub(stack.count);
                    if space == 0 {
                        return Err(SynthError::DestinationFull);
                    }
                    let moved = space.min(cursor.count);
                    self.shadow.set(slot, stack.with_count(stack.count + moved));
                    self.shadow
                        .set(CanonicalSlot::CURSOR, cursor.with_count(cursor.count - moved));
                } else {
                    // Whole swap.
                    self.shadow.set(slot, cursor);
                    self.shadow.set(CanonicalSlot::CURSOR, stack);
                }
            }
        }
        Ok(())
    }

    fn pickup_or_place_half(&mut self, slot: CanonicalSlot) -> Result<(), SynthError> {
        let kind = self.category.slot_kind(slot);
        let cursor = self.shadow.cursor().clone();
        let stack = self.item_at(slot)?.clone();

        if cursor.is_empty() {
            if stack.is_empty() {
                return Err(SynthError::Unrepresentable("pickup from an empty slot"));
            }
            let take = stack.count - stack.count / 2;
            let mut taken = stack.with_count(take);
            taken.net_id = self.shadow.allocate_net_id();
            let remainder = if kind == SlotKind::FurnaceOutput {
                // Excess is voided, not returned.
                ItemStack::empty()
            } else {
                stack.with_count(stack.count - take)
            };
            self.shadow.set(slot, remainder);
            self.shadow.set(CanonicalSlot::CURSOR, taken);
            return Ok(());
        }

        if kind != SlotKind::Normal {
            return Err(SynthError::PlaceIntoOutput);
        }
        if stack.is_empty() {
            let mut placed = cursor.with_count(1);
            placed.net_id = self.shadow.allocate_net_id();
            self.shadow.set(slot, placed);
            self.shadow
                .set(CanonicalSlot::CURSOR, cursor.with_count(cursor.count - 1));
        } else if self.items.can_stack(&cursor, &stack) {
            if stack.count >= self.items.max_stack_size(stack.item_id) {
                return Err(SynthError::DestinationFull);
            }
            self.shadow.set(slot, stack.with_count(stack.count + 1));
            self.shadow
                .set(CanonicalSlot::CURSOR, cursor.with_count(cursor.count - 1));
        } else {
            return Err(SynthError::Unrepresentable(
                "single-unit release onto an incompatible stack",
            ));
        }
        Ok(())
    }

    fn drop_from_slot(&mut self, slot: CanonicalSlot, count: u16) -> Result<(), SynthError> {
        let stack = self.item_at(slot)?.clone();
        if stack.is_empty() {
            return Err(SynthError::Unrepresentable("drop from an empty slot"));
        }
        // Items leave the model entirely, mirroring the server-side discard.
        let removed = count.min(stack.count);
        self.shadow.set(slot, stack.with_count(stack.count - removed));
        Ok(())
    }

    fn discard_cursor(&mut self, count: u16) -> Result<(), SynthError> {
        let cursor = self.shadow.cursor().clone();
        if cursor.is_empty() {
            return Err(SynthError::Unrepresentable("outside click with empty cursor"));
        }
        let removed = count.min(cursor.count);
        self.shadow
            .set(CanonicalSlot::CURSOR, cursor.with_count(cursor.count - removed));
        Ok(())
    }

    fn shift_transfer(&mut self, slot: CanonicalSlot) -> Result<(), SynthError> {
        let stack = self.item_at(slot)?.clone();
        if stack.is_empty() {
            // Permitted as a no-op; the auto-craft fallback shifts slot 0
            // regardless of its contents.
            return Ok(());
        }
        let mut remaining = stack.count;
        for dest in self.category.shift_destinations(slot) {
            if remaining == 0 {
                break;
            }
            let dst = self.item_at(dest)?.clone();
            if dst.is_empty() {
                let mut moved = stack.with_count(remaining);
                moved.net_id = self.shadow.allocate_net_id();
                self.shadow.set(dest, moved);
                remaining = 0;
            } else if self.items.can_stack(&stack, &dst) {
                let max = self.items.max_stack_size(dst.item_id);
                let space = max.saturating_sub(dst.count);
                if space > 0 {
                    let moved = space.min(remaining);
                    self.shadow.set(dest, dst.with_count(dst.count + moved));
                    remaining -= moved;
                }
            }
        }
        // Any leftover stays in place, as the back protocol would leave it.
        self.shadow.set(slot, stack.with_count(remaining));
        Ok(())
    }

    /// Fresh net id from the shadow's counter.
    pub fn allocate_net_id(&mut self) -> i32 {
        self.shadow.allocate_net_id()
    }

    /// Craft primitive: place a created stack on a slot directly.
    ///
    /// The only path that may add items to the model; callers are limited to
    /// recipe-output staging with a known recipe output.
    pub fn stage_craft_result(&mut self, slot: CanonicalSlot, stack: ItemStack) {
        self.shadow.set(slot, stack);
    }

    /// Craft primitive: consume one unit from a grid cell.
    pub fn craft_consume_one(&mut self, slot: CanonicalSlot) -> Result<(), SynthError> {
        let stack = self.item_at(slot)?.clone();
        if stack.is_empty() {
            return Err(SynthError::Unrepresentable("consume from an empty grid cell"));
        }
        self.shadow.set(slot, stack.with_count(stack.count - 1));
        Ok(())
    }

    /// Canonical slots whose shadow contents differ from the pre-plan state.
    pub fn affected_slots(&self) -> Vec<CanonicalSlot> {
        self.shadow.diff_slots(&self.baseline)
    }

    /// Whether the cursor differs from the pre-plan state.
    pub fn cursor_changed(&self) -> bool {
        self.shadow.cursor() != self.baseline.cursor()
    }

    /// Emit every recorded click downstream, in order, and hand back the
    /// shadow as the new authoritative model. The sole commit point.
    pub fn commit(
        self,
        container_id: u8,
        revision: i32,
        sink: &mut dyn ClickSink,
    ) -> InventoryModel {
        for click in &self.log {
            let (kind, param) = click.kind.mode_button();
            sink.send_click(ClickFrame {
                container_id,
                revision,
                slot: if click.kind.is_outside() {
                    OUTSIDE_SLOT
                } else {
                    click.slot.0
                },
                clicked_item: click.clicked_item.clone(),
                kind,
                param,
            });
        }
        self.shadow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ItemTable;

    fn chest() -> ContainerCategory {
        ContainerCategory::Generic { size: 27 }
    }

    fn planner_with<'a>(
        items: &'a ItemTable,
        fill: &[(i16, ItemStack)],
    ) -> ClickPlanner<'a> {
        let mut model = InventoryModel::new(chest().size() as usize);
        for (slot, stack) in fill {
            model.set(CanonicalSlot(*slot), stack.clone());
        }
        ClickPlanner::new(chest(), items, &model)
    }

    #[test]
    fn pickup_all_takes_whole_stack() {
        let items = ItemTable::new();
        let mut p = planner_with(&items, &[(3, ItemStack::with_net_id(1, 40, 7))]);
        p.append(ClickKind::PickupOrPlaceAll, CanonicalSlot(3)).unwrap();
        assert!(p.item_at(CanonicalSlot(3)).unwrap().is_empty());
        assert_eq!(p.cursor().count, 40);
        assert_eq!(p.cursor().net_id, 7);
    }

    #[test]
    fn place_all_merges_and_keeps_overflow() {
        let items = ItemTable::new();
        let mut p = planner_with(
            &items,
            &[(0, ItemStack::new(1, 60)), (1, ItemStack::new(1, 30))],
        );
        p.append(ClickKind::PickupOrPlaceAll, CanonicalSlot(1)).unwrap();
        p.append(ClickKind::PickupOrPlaceAll, CanonicalSlot(0)).unwrap();
        // 30 held, 4 fit onto the 60-stack, 26 stay held.
        assert_eq!(p.item_at(CanonicalSlot(0)).unwrap().count, 64);
        assert_eq!(p.cursor().count, 26);
    }

    #[test]
    fn place_all_swaps_incompatible_stacks() {
        let items = ItemTable::new();
        let mut p = planner_with(
            &items,
            &[(0, ItemStack::new(1, 10)), (1, ItemStack::new(2, 5))],
        );
        p.append(ClickKind::PickupOrPlaceAll, CanonicalSlot(0)).unwrap();
        p.append(ClickKind::PickupOrPlaceAll, CanonicalSlot(1)).unwrap();
        assert_eq!(p.item_at(CanonicalSlot(1)).unwrap().item_id, 1);
        assert_eq!(p.cursor().item_id, 2);
    }

    #[test]
    fn half_pickup_takes_ceil_half() {
        let items = ItemTable::new();
        let mut p = planner_with(&items, &[(3, ItemStack::new(1, 41))]);
        p.append(ClickKind::PickupOrPlaceHalf, CanonicalSlot(3)).unwrap();
        assert_eq!(p.cursor().count, 21);
        assert_eq!(p.item_at(CanonicalSlot(3)).unwrap().count, 20);
    }

    #[test]
    fn half_pickup_of_single_item_empties_slot() {
        let items = ItemTable::new();
        let mut p = planner_with(&items, &[(3, ItemStack::new(1, 1))]);
        p.append(ClickKind::PickupOrPlaceHalf, CanonicalSlot(3)).unwrap();
        assert_eq!(p.cursor().count, 1);
        assert!(p.item_at(CanonicalSlot(3)).unwrap().is_empty());
    }

    #[test]
    fn half_with_held_stack_releases_one_unit() {
        let items = ItemTable::new();
        let mut p = planner_with(&items, &[(0, ItemStack::new(1, 10))]);
        p.append(ClickKind::PickupOrPlaceAll, CanonicalSlot(0)).unwrap();
        p.append(ClickKind::PickupOrPlaceHalf, CanonicalSlot(5)).unwrap();
        p.append(ClickKind::PickupOrPlaceHalf, CanonicalSlot(5)).unwrap();
        assert_eq!(p.item_at(CanonicalSlot(5)).unwrap().count, 2);
        assert_eq!(p.cursor().count, 8);
    }

    #[test]
    fn split_halves_get_fresh_net_ids() {
        let items = ItemTable::new();
        let mut p = planner_with(&items, &[(3, ItemStack::with_net_id(1, 40, 7))]);
        p.append(ClickKind::PickupOrPlaceHalf, CanonicalSlot(3)).unwrap();
        assert_ne!(p.cursor().net_id, 7);
        assert_ne!(p.cursor().net_id, 0);
        assert_eq!(p.item_at(CanonicalSlot(3)).unwrap().net_id, 7);
    }

    #[test]
    fn drop_clicks_remove_items_from_the_model() {
        let items = ItemTable::new();
        let mut p = planner_with(&items, &[(3, ItemStack::new(1, 10))]);
        p.append(ClickKind::DropOne, CanonicalSlot(3)).unwrap();
        assert_eq!(p.item_at(CanonicalSlot(3)).unwrap().count, 9);
        p.append(ClickKind::DropAll, CanonicalSlot(3)).unwrap();
        assert!(p.item_at(CanonicalSlot(3)).unwrap().is_empty());
        assert_eq!(p.shadow().total_count(), 0);
    }

    #[test]
    fn outside_clicks_discard_held_items() {
        let items = ItemTable::new();
        let mut p = planner_with(&items, &[(3, ItemStack::new(1, 10))]);
        p.append(ClickKind::PickupOrPlaceAll, CanonicalSlot(3)).unwrap();
        p.append(ClickKind::OutsideOne, CanonicalSlot::CURSOR).unwrap();
        assert_eq!(p.cursor().count, 9);
        p.append(ClickKind::OutsideAll, CanonicalSlot::CURSOR).unwrap();
        assert!(p.cursor().is_empty());
    }

    #[test]
    fn outside_click_with_empty_cursor_is_rejected() {
        let items = ItemTable::new();
        let mut p = planner_with(&items, &[]);
        assert!(p.append(ClickKind::OutsideAll, CanonicalSlot::CURSOR).is_err());
    }

    #[test]
    fn drop_on_cursor_is_rejected() {
        let items = ItemTable::new();
        let mut p = planner_with(&items, &[]);
        assert!(p.append(ClickKind::DropOne, CanonicalSlot::CURSOR).is_err());
    }

    #[test]
    fn conservation_without_drops() {
        let items = ItemTable::new();
        let mut p = planner_with(
            &items,
            &[(0, ItemStack::new(1, 40)), (5, ItemStack::new(1, 30))],
        );
        let before = p.shadow().total_count();
        p.append(ClickKind::PickupOrPlaceAll, CanonicalSlot(0)).unwrap();
        p.append(ClickKind::PickupOrPlaceHalf, CanonicalSlot(9)).unwrap();
        p.append(ClickKind::PickupOrPlaceAll, CanonicalSlot(5)).unwrap();
        assert_eq!(p.shadow().total_count(), before);
    }

    #[test]
    fn shift_transfer_merges_then_fills_empty() {
        let items = ItemTable::new();
        let mut p = planner_with(
            &items,
            &[(0, ItemStack::new(1, 40)), (27, ItemStack::new(1, 60))],
        );
        p.append(ClickKind::ShiftTransfer, CanonicalSlot(0)).unwrap();
        // 4 merged onto the 60-stack at 27, the rest lands in slot 28.
        assert!(p.item_at(CanonicalSlot(0)).unwrap().is_empty());
        assert_eq!(p.item_at(CanonicalSlot(27)).unwrap().count, 64);
        assert_eq!(p.item_at(CanonicalSlot(28)).unwrap().count, 36);
    }

    #[test]
    fn shift_transfer_on_empty_slot_is_a_recorded_no_op() {
        let items = ItemTable::new();
        let mut p = planner_with(&items, &[]);
        p.append(ClickKind::ShiftTransfer, CanonicalSlot(0)).unwrap();
        assert_eq!(p.click_count(), 1);
        assert!(p.affected_slots().is_empty());
    }

    #[test]
    fn affected_slots_diff_against_baseline() {
        let items = ItemTable::new();
        let mut p = planner_with(&items, &[(3, ItemStack::new(1, 10))]);
        p.append(ClickKind::PickupOrPlaceAll, CanonicalSlot(3)).unwrap();
        p.append(ClickKind::PickupOrPlaceAll, CanonicalSlot(7)).unwrap();
        assert_eq!(
            p.affected_slots(),
            vec![CanonicalSlot(3), CanonicalSlot(7)]
        );
        assert!(!p.cursor_changed());
    }

    #[test]
    fn commit_emits_frames_in_recorded_order() {
        let items = ItemTable::new();
        let mut p = planner_with(&items, &[(3, ItemStack::with_net_id(1, 10, 5))]);
        p.append(ClickKind::PickupOrPlaceAll, CanonicalSlot(3)).unwrap();
        p.append(ClickKind::PickupOrPlaceAll, CanonicalSlot(8)).unwrap();
        p.append(ClickKind::DropOne, CanonicalSlot(8)).unwrap();

        let mut frames: Vec<ClickFrame> = Vec::new();
        let model = p.commit(2, 11, &mut frames);

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].slot, 3);
        assert_eq!(frames[0].clicked_item.count, 10);
        assert_eq!(frames[0].kind, 0);
        assert_eq!(frames[1].slot, 8);
        assert!(frames[1].clicked_item.is_empty());
        assert_eq!(frames[2].kind, 4);
        assert!(frames.iter().all(|f| f.container_id == 2 && f.revision == 11));
        assert_eq!(model.get(CanonicalSlot(8)).unwrap().count, 9);
    }

    #[test]
    fn place_into_output_slot_is_rejected() {
        let items = ItemTable::new();
        let table = ContainerCategory::CraftingTable;
        let mut model = InventoryModel::new(table.size() as usize);
        model.set(CanonicalSlot(10), ItemStack::new(1, 4));
        let mut p = ClickPlanner::new(table, &items, &model);
        p.append(ClickKind::PickupOrPlaceAll, CanonicalSlot(10)).unwrap();
        let err = p.append(ClickKind::PickupOrPlaceAll, CanonicalSlot(0)).unwrap_err();
        assert!(matches!(err, SynthError::PlaceIntoOutput));
    }

    #[test]
    fn furnace_output_half_pickup_voids_remainder() {
        let items = ItemTable::new();
        let furnace = ContainerCategory::Furnace;
        let mut model = InventoryModel::new(furnace.size() as usize);
        model.set(CanonicalSlot(2), ItemStack::new(1, 9));
        let mut p = ClickPlanner::new(furnace, &items, &model);
        p.append(ClickKind::PickupOrPlaceHalf, CanonicalSlot(2)).unwrap();
        assert_eq!(p.cursor().count, 5);
        assert!(p.item_at(CanonicalSlot(2)).unwrap().is_empty());
    }
}
