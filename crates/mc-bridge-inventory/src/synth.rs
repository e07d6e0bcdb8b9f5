//! Front-protocol request decomposition.
//!
//! Turns each batch of requests into one click plan. All validation happens
//! here or in the planner, against the shadow; the first error aborts the
//! whole batch with nothing sent.

use tracing::debug;

use mc_bridge_proto::click::ClickKind;
use mc_bridge_proto::request::{ContainerTag, ItemStackBatch, SlotRef, StackAction, StackRequest};
use mc_bridge_proto::response::{BatchResponse, ContainerReport, SlotReport};

use crate::craft::CraftSynthesizer;
use crate::error::SynthError;
use crate::guard;
use crate::model::{CanonicalSlot, InventoryModel};
use crate::oracle::{ItemOracle, RecipeOracle};
use crate::planner::ClickPlanner;
use crate::temp;
use crate::topology::{ContainerCategory, SlotKind, SlotMapping};

/// Decomposes transfer/swap/drop/craft intents into click sequences.
pub struct RequestSynthesizer<'a> {
    category: ContainerCategory,
    items: &'a dyn ItemOracle,
    recipes: &'a dyn RecipeOracle,
}

impl<'a> RequestSynthesizer<'a> {
    pub fn new(
        category: ContainerCategory,
        items: &'a dyn ItemOracle,
        recipes: &'a dyn RecipeOracle,
    ) -> Self {
        Self {
            category,
            items,
            recipes,
        }
    }

    /// Synthesize an entire batch against a fresh shadow of `model`.
    ///
    /// On success the returned planner holds the complete click log and the
    /// post-batch shadow; committing it is the caller's decision. On error
    /// the planner is dropped and nothing observable happened.
    pub fn synthesize(
        &self,
        model: &InventoryModel,
        batch: &ItemStackBatch,
    ) -> Result<ClickPlanner<'a>, SynthError> {
        let mut planner = ClickPlanner::new(self.category, self.items, model);
        for request in &batch.requests {
            self.synthesize_request(&mut planner, request)?;
        }
        Ok(planner)
    }

    fn synthesize_request(
        &self,
        planner: &mut ClickPlanner<'_>,
        request: &StackRequest,
    ) -> Result<(), SynthError> {
        debug!(
            request_id = request.request_id,
            actions = request.actions.len(),
            "synthesizing request"
        );
        let mut craft = CraftSynthesizer::new(self.category, self.items, self.recipes);
        for action in &request.actions {
            match action {
                StackAction::Take { count, src, dst }
                | StackAction::Place { count, src, dst } => {
                    let src_slot = self.resolve(src)?;
                    let dst_slot = self.resolve(dst)?;
                    self.guard_claim(planner, src, src_slot)?;
                    self.guard_claim(planner, dst, dst_slot)?;
                    if craft.active() && Some(src_slot) == self.category.output_slot() {
                        craft.transfer_from_output(planner, *count, dst_slot)?;
                    } else {
                        self.transfer(planner, *count, src_slot, dst_slot)?;
                    }
                }
                StackAction::Swap { src, dst } => {
                    let src_slot = self.resolve(src)?;
                    let dst_slot = self.resolve(dst)?;
                    self.guard_claim(planner, src, src_slot)?;
                    self.guard_claim(planner, dst, dst_slot)?;
                    self.swap(planner, src_slot, dst_slot)?;
                }
                StackAction::Drop { count, src } => {
                    let src_slot = self.resolve(src)?;
                    self.guard_claim(planner, src, src_slot)?;
                    self.drop_items(planner, *count, src_slot)?;
                }
                StackAction::Consume { src, .. } => {
                    let src_slot = self.resolve(src)?;
                    // Consume claims describe the stacks as they were before
                    // the craft repopulated the grid, so they are checked
                    // against the pre-batch snapshot.
                    if src.container != ContainerTag::CreativeOutput {
                        guard::require_net_id(
                            planner.baseline(),
                            src.claimed_net_id,
                            src_slot,
                        )?;
                    }
                    craft.consume(src_slot)?;
                }
                StackAction::CraftRecipe { recipe_net_id } => {
                    craft.select_recipe(planner, *recipe_net_id)?;
                }
                StackAction::CraftRecipeAuto {
                    recipe_net_id,
                    times_crafted,
                    ingredients,
                } => {
                    craft.auto_craft(planner, *recipe_net_id, *times_crafted, ingredients)?;
                }
                StackAction::CraftResultsDeprecated { .. } => {
                    craft.deprecated_results()?;
                }
                StackAction::CraftCreative {
                    creative_item_net_id,
                } => {
                    craft.craft_creative(planner, *creative_item_net_id)?;
                }
                StackAction::CraftRecipeOptional { .. } => {
                    // No category in the closed set carries this UI.
                    return Err(SynthError::Unsupported("recipe with filter strings"));
                }
                StackAction::Unknown { action_type } => {
                    return Err(SynthError::UnknownAction(*action_type));
                }
            }
        }
        craft.finish(planner)
    }

    /// Resolve a front-protocol reference; the cursor resolves to the
    /// canonical cursor index.
    fn resolve(&self, slot_ref: &SlotRef) -> Result<CanonicalSlot, SynthError> {
        match self
            .category
            .external_to_canonical(slot_ref.container, slot_ref.slot)
        {
            SlotMapping::Slot(slot) => Ok(slot),
            SlotMapping::Cursor => Ok(CanonicalSlot::CURSOR),
            SlotMapping::NoMatch => Err(SynthError::NoSuchSlot {
                tag: slot_ref.container,
                slot: slot_ref.slot,
            }),
        }
    }

    /// Net-id staleness check against the shadow. Creative output slots are
    /// exempt; their ids are legitimately stale on the client.
    fn guard_claim(
        &self,
        planner: &ClickPlanner<'_>,
        slot_ref: &SlotRef,
        at: CanonicalSlot,
    ) -> Result<(), SynthError> {
        if slot_ref.container == ContainerTag::CreativeOutput {
            return Ok(());
        }
        guard::require_net_id(planner.shadow(), slot_ref.claimed_net_id, at)
    }

    fn transfer(
        &self,
        planner: &mut ClickPlanner<'_>,
        count: u16,
        src: CanonicalSlot,
        dst: CanonicalSlot,
    ) -> Result<(), SynthError> {
        if src == dst {
            return Err(SynthError::Unrepresentable("transfer onto itself"));
        }
        if count == 0 {
            return Err(SynthError::BadCount {
                requested: 0,
                available: 0,
            });
        }
        if src.is_cursor() {
            return self.place_from_cursor(planner, count, dst);
        }
        if dst.is_cursor() {
            return self.take_to_cursor(planner, count, src);
        }

        let src_stack = planner.item_at(src)?.clone();
        if src_stack.is_empty() || count > src_stack.count {
            return Err(SynthError::BadCount {
                requested: count,
                available: src_stack.count,
            });
        }
        if self.category.slot_kind(dst) != SlotKind::Normal {
            return Err(SynthError::PlaceIntoOutput);
        }
        let dst_stack = planner.item_at(dst)?.clone();
        if !dst_stack.is_empty() && !self.items.can_stack(&src_stack, &dst_stack) {
            return Err(SynthError::Unrepresentable(
                "transfer onto an incompatible stack",
            ));
        }

        // The primitives act on whatever is held; park an occupied cursor
        // in a temp slot first and restore it afterwards.
        let parked = self.park_cursor(planner, &[src, dst])?;

        let exact = count == src_stack.count;
        let ceil_half = src_stack.count - src_stack.count / 2;
        if !exact {
            let max = self.items.max_stack_size(src_stack.item_id);
            let space = if dst_stack.is_empty() {
                max
            } else {
                max.saturating_sub(dst_stack.count)
            };
            if count > space {
                return Err(SynthError::DestinationFull);
            }
        }

        if exact {
            planner.append(ClickKind::PickupOrPlaceAll, src)?;
            planner.append(ClickKind::PickupOrPlaceAll, dst)?;
            if !planner.cursor().is_empty() {
                // Destination absorbed only part; the rest goes home.
                planner.append(ClickKind::PickupOrPlaceAll, src)?;
            }
        } else if count == ceil_half {
            planner.append(ClickKind::PickupOrPlaceHalf, src)?;
            planner.append(ClickKind::PickupOrPlaceAll, dst)?;
        } else {
            planner.append(ClickKind::PickupOrPlaceAll, src)?;
            for _ in 0..count {
                planner.append(ClickKind::PickupOrPlaceHalf, dst)?;
            }
            if !planner.cursor().is_empty() {
                planner.append(ClickKind::PickupOrPlaceAll, src)?;
            }
        }

        self.restore_cursor(planner, parked)
    }

    /// Transfer with the cursor as source.
    fn place_from_cursor(
        &self,
        planner: &mut ClickPlanner<'_>,
        count: u16,
        dst: CanonicalSlot,
    ) -> Result<(), SynthError> {
        let cursor = planner.cursor().clone();
        if cursor.is_empty() || count > cursor.count {
            return Err(SynthError::BadCount {
                requested: count,
                available: cursor.count,
            });
        }
        if self.category.slot_kind(dst) != SlotKind::Normal {
            return Err(SynthError::PlaceIntoOutput);
        }
        let dst_stack = planner.item_at(dst)?.clone();
        if !dst_stack.is_empty() && !self.items.can_stack(&cursor, &dst_stack) {
            return Err(SynthError::Unrepresentable(
                "placement onto an incompatible stack",
            ));
        }
        let max = self.items.max_stack_size(cursor.item_id);
        let space = if dst_stack.is_empty() {
            max
        } else {
            max.saturating_sub(dst_stack.count)
        };
        if count > space {
            return Err(SynthError::DestinationFull);
        }
        if count == cursor.count {
            planner.append(ClickKind::PickupOrPlaceAll, dst)?;
        } else {
            for _ in 0..count {
                planner.append(ClickKind::PickupOrPlaceHalf, dst)?;
            }
        }
        Ok(())
    }

    /// Transfer with the cursor as destination.
    fn take_to_cursor(
        &self,
        planner: &mut ClickPlanner<'_>,
        count: u16,
        src: CanonicalSlot,
    ) -> Result<(), SynthError> {
        let src_stack = planner.item_at(src)?.clone();
        if src_stack.is_empty() || count > src_stack.count {
            return Err(SynthError::BadCount {
                requested: count,
                available: src_stack.count,
            });
        }
        let cursor = planner.cursor().clone();
        if !cursor.is_empty() {
            // Only a whole-stack take of a compatible item is expressible.
            if !self.items.can_stack(&cursor, &src_stack)
                || count != src_stack.count
                || cursor.count + src_stack.count
                    > self.items.max_stack_size(src_stack.item_id)
            {
                return Err(SynthError::Unrepresentable(
                    "take onto an occupied cursor",
                ));
            }
            if self.category.slot_kind(src) == SlotKind::Normal {
                // Merge the held stack into the slot, then lift the union.
                planner.append(ClickKind::PickupOrPlaceAll, src)?;
                planner.append(ClickKind::PickupOrPlaceAll, src)?;
            } else {
                // Output slots merge into the cursor in one click.
                planner.append(ClickKind::PickupOrPlaceAll, src)?;
            }
            return Ok(());
        }

        let ceil_half = src_stack.count - src_stack.count / 2;
        if count == src_stack.count {
            planner.append(ClickKind::PickupOrPlaceAll, src)?;
        } else if count == ceil_half {
            planner.append(ClickKind::PickupOrPlaceHalf, src)?;
        } else if count < ceil_half {
            // Pick up half, then trickle the surplus back.
            planner.append(ClickKind::PickupOrPlaceHalf, src)?;
            for _ in 0..ceil_half - count {
                planner.append(ClickKind::PickupOrPlaceHalf, src)?;
            }
        } else {
            // Pick up all, then trickle the surplus back.
            planner.append(ClickKind::PickupOrPlaceAll, src)?;
            for _ in 0..src_stack.count - count {
                planner.append(ClickKind::PickupOrPlaceHalf, src)?;
            }
        }
        Ok(())
    }

    fn swap(
        &self,
        planner: &mut ClickPlanner<'_>,
        src: CanonicalSlot,
        dst: CanonicalSlot,
    ) -> Result<(), SynthError> {
        if src == dst {
            return Err(SynthError::Unrepresentable("swap with itself"));
        }

        // A swap touching the cursor is a single click.
        if src.is_cursor() || dst.is_cursor() {
            let slot = if src.is_cursor() { dst } else { src };
            let cursor = planner.cursor().clone();
            let stack = planner.item_at(slot)?.clone();
            if cursor.is_empty() && stack.is_empty() {
                return Err(SynthError::BadCount {
                    requested: 0,
                    available: 0,
                });
            }
            if !cursor.is_empty() && !stack.is_empty() && self.items.can_stack(&cursor, &stack)
            {
                return Err(SynthError::SwapWouldMerge);
            }
            if !cursor.is_empty() && self.category.slot_kind(slot) != SlotKind::Normal {
                return Err(SynthError::PlaceIntoOutput);
            }
            planner.append(ClickKind::PickupOrPlaceAll, slot)?;
            return Ok(());
        }

        let src_stack = planner.item_at(src)?.clone();
        let dst_stack = planner.item_at(dst)?.clone();
        if src_stack.is_empty() && dst_stack.is_empty() {
            return Err(SynthError::BadCount {
                requested: 0,
                available: 0,
            });
        }
        // One empty side degenerates to a whole-stack transfer.
        if src_stack.is_empty() {
            return self.transfer(planner, dst_stack.count, dst, src);
        }
        if dst_stack.is_empty() {
            return self.transfer(planner, src_stack.count, src, dst);
        }

        if self.items.can_stack(&src_stack, &dst_stack) {
            // The middle click would merge, not swap; there is no click
            // sequence with the requested effect.
            return Err(SynthError::SwapWouldMerge);
        }
        if self.category.slot_kind(src) != SlotKind::Normal
            || self.category.slot_kind(dst) != SlotKind::Normal
        {
            return Err(SynthError::PlaceIntoOutput);
        }

        let parked = self.park_cursor(planner, &[src, dst])?;
        planner.append(ClickKind::PickupOrPlaceAll, src)?;
        planner.append(ClickKind::PickupOrPlaceAll, dst)?;
        planner.append(ClickKind::PickupOrPlaceAll, src)?;
        self.restore_cursor(planner, parked)
    }

    fn drop_items(
        &self,
        planner: &mut ClickPlanner<'_>,
        count: u16,
        src: CanonicalSlot,
    ) -> Result<(), SynthError> {
        if count == 0 {
            return Err(SynthError::BadCount {
                requested: 0,
                available: 0,
            });
        }
        if src.is_cursor() {
            let cursor = planner.cursor().clone();
            if cursor.is_empty() || count > cursor.count {
                return Err(SynthError::BadCount {
                    requested: count,
                    available: cursor.count,
                });
            }
            if count == cursor.count {
                planner.append(ClickKind::OutsideAll, CanonicalSlot::CURSOR)?;
            } else {
                for _ in 0..count {
                    planner.append(ClickKind::OutsideOne, CanonicalSlot::CURSOR)?;
                }
            }
            return Ok(());
        }

        let stack = planner.item_at(src)?.clone();
        if stack.is_empty() || count > stack.count {
            return Err(SynthError::BadCount {
                requested: count,
                available: stack.count,
            });
        }
        if count == stack.count && count > 1 {
            planner.append(ClickKind::DropAll, src)?;
        } else {
            for _ in 0..count {
                planner.append(ClickKind::DropOne, src)?;
            }
        }
        Ok(())
    }

    /// Park an occupied cursor in an empty temp slot. `None` when the
    /// cursor was already free.
    fn park_cursor(
        &self,
        planner: &mut ClickPlanner<'_>,
        excluded: &[CanonicalSlot],
    ) -> Result<Option<CanonicalSlot>, SynthError> {
        let cursor = planner.cursor().clone();
        if cursor.is_empty() {
            return Ok(None);
        }
        let slot = temp::find(
            planner.shadow(),
            self.items,
            &self.category,
            &cursor,
            true,
            excluded,
        )
        .ok_or(SynthError::NoTempSlot)?;
        planner.append(ClickKind::PickupOrPlaceAll, slot)?;
        Ok(Some(slot))
    }

    fn restore_cursor(
        &self,
        planner: &mut ClickPlanner<'_>,
        parked: Option<CanonicalSlot>,
    ) -> Result<(), SynthError> {
        if let Some(slot) = parked {
            planner.append(ClickKind::PickupOrPlaceAll, slot)?;
        }
        Ok(())
    }
}

/// Build the ACCEPT payload: authoritative contents of every touched slot,
/// grouped per front-protocol container tag, plus the cursor.
pub fn build_accept_response(planner: &ClickPlanner<'_>) -> BatchResponse {
    let category = planner.category();
    let mut containers: Vec<ContainerReport> = Vec::new();
    for slot in planner.affected_slots() {
        let Some((tag, external)) = category.canonical_to_external(slot) else {
            continue;
        };
        let Ok(stack) = planner.item_at(slot) else {
            continue;
        };
        let report = SlotReport {
            slot: external,
            count: if stack.is_empty() { 0 } else { stack.count },
            net_id: stack.net_id,
        };
        match containers.iter_mut().find(|c| c.container == tag) {
            Some(entry) => entry.slots.push(report),
            None => containers.push(ContainerReport {
                container: tag,
                slots: vec![report],
            }),
        }
    }
    BatchResponse::Accepted {
        containers,
        cursor: planner.cursor().clone(),
    }
}
