//! Recipe-craft decomposition.
//!
//! One `CraftSynthesizer` lives per incoming request and walks the craft
//! state machine `Start → RecipeSelected → (DeprecatedResult) →
//! IngredientsConsumed → Transfer → Done`; a sub-action out of that order
//! rejects the request. Manual crafts distribute an already-populated grid's
//! output; auto-crafts first repopulate the grid from ingredient sources.

use tracing::debug;

use mc_bridge_proto::click::ClickKind;
use mc_bridge_proto::ItemStack;

use crate::error::SynthError;
use crate::model::CanonicalSlot;
use crate::oracle::{ItemOracle, RecipeOracle, RecipeRef};
use crate::planner::ClickPlanner;
use crate::topology::ContainerCategory;

/// Auto-craft pass limit. The forced shift-transfer retry below is a known
/// heuristic for grid desynchronization, kept as observed, not proven.
const MAX_AUTO_CRAFT_PASSES: u8 = 64;

/// One grid cell an auto-craft pass must fill.
#[derive(Debug, Clone, Copy)]
struct AutoCell {
    slot: CanonicalSlot,
    /// Units per craft.
    need: u16,
    item_id: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CraftState {
    Start,
    RecipeSelected,
    DeprecatedResult,
    IngredientsConsumed,
    Transfer,
    Done,
}

/// Per-request craft bookkeeping and click synthesis.
pub struct CraftSynthesizer<'a> {
    category: ContainerCategory,
    items: &'a dyn ItemOracle,
    recipes: &'a dyn RecipeOracle,
    state: CraftState,
    /// Populated grid cells and units consumed from each per craft.
    cells: Vec<(CanonicalSlot, u16)>,
    /// Output stack produced by one craft.
    output: Option<ItemStack>,
    /// Crafts the populated grid can still yield.
    crafts_available: u16,
}

impl<'a> CraftSynthesizer<'a> {
    pub fn new(
        category: ContainerCategory,
        items: &'a dyn ItemOracle,
        recipes: &'a dyn RecipeOracle,
    ) -> Self {
        Self {
            category,
            items,
            recipes,
            state: CraftState::Start,
            cells: Vec::new(),
            output: None,
            crafts_available: 0,
        }
    }

    /// Whether a craft is in progress for this request.
    pub fn active(&self) -> bool {
        !matches!(self.state, CraftState::Start | CraftState::Done)
    }

    fn output_slot(&self) -> Result<CanonicalSlot, SynthError> {
        self.category
            .output_slot()
            .ok_or(SynthError::Unsupported("container has no craft output"))
    }

    /// Manual craft: the client already populated the grid; validate it
    /// against the recipe and stage the first output.
    pub fn select_recipe(
        &mut self,
        planner: &mut ClickPlanner<'_>,
        recipe_net_id: u32,
    ) -> Result<(), SynthError> {
        if self.state != CraftState::Start {
            return Err(SynthError::CraftOutOfOrder);
        }
        let recipe = self
            .recipes
            .recipe(recipe_net_id)
            .ok_or(SynthError::UnknownRecipe(recipe_net_id))?;
        self.check_dims(&recipe)?;
        let cells = self.match_grid(planner, &recipe)?;
        let crafts = cells
            .iter()
            .map(|(slot, need)| {
                planner
                    .item_at(*slot)
                    .map(|s| s.count / need.max(&1))
                    .unwrap_or(0)
            })
            .min()
            .unwrap_or(0);
        if crafts == 0 {
            return Err(SynthError::GridMismatch(recipe_net_id));
        }
        debug!(recipe_net_id, crafts, "manual craft selected");
        let output = recipe.output().clone();
        self.stage_output(planner, &output)?;
        self.cells = cells;
        self.output = Some(output);
        self.crafts_available = crafts;
        self.state = CraftState::RecipeSelected;
        Ok(())
    }

    /// Auto-craft: repopulate the grid from ingredient source slots, one
    /// unit per cell per pass, `times` passes.
    pub fn auto_craft(
        &mut self,
        planner: &mut ClickPlanner<'_>,
        recipe_net_id: u32,
        times: u8,
        claimed_ingredients: &[ItemStack],
    ) -> Result<(), SynthError> {
        if self.state != CraftState::Start {
            return Err(SynthError::CraftOutOfOrder);
        }
        let recipe = self
            .recipes
            .recipe(recipe_net_id)
            .ok_or(SynthError::UnknownRecipe(recipe_net_id))?;
        self.check_dims(&recipe)?;
        let (grid_first, grid_w, grid_h) = self
            .category
            .grid()
            .ok_or(SynthError::Unsupported("container has no crafting grid"))?;

        // Auto-craft owns the grid; anything already there (or held) would
        // be clobbered by population.
        for c in 0..(grid_w as i16 * grid_h as i16) {
            let slot = CanonicalSlot(grid_first.0 + c);
            if !planner.item_at(slot)?.is_empty() {
                return Err(SynthError::GridNotEmpty);
            }
        }
        if !planner.cursor().is_empty() {
            return Err(SynthError::GridNotEmpty);
        }

        let cells = self.plan_auto_cells(&recipe, grid_first, grid_w);
        let passes = (times.max(1)).min(MAX_AUTO_CRAFT_PASSES) as u16;
        debug!(
            recipe_net_id,
            passes,
            claimed = claimed_ingredients.len(),
            "auto craft"
        );

        let mut held_origin: Option<CanonicalSlot> = None;
        for _ in 0..passes {
            if !self.populate_pass(planner, &cells, &mut held_origin)? {
                // Grid did not fully populate: force a shift-transfer on
                // canonical slot 0 as a resynchronization fallback, then
                // retry once. Heuristic, kept as observed.
                planner.append(ClickKind::ShiftTransfer, CanonicalSlot(0))?;
                if !self.populate_pass(planner, &cells, &mut held_origin)? {
                    return Err(SynthError::Unrepresentable(
                        "ingredient sources exhausted during auto-craft",
                    ));
                }
            }
        }
        // Return whatever is still held to its source slot.
        if let Some(origin) = held_origin {
            if !planner.cursor().is_empty() {
                planner.append(ClickKind::PickupOrPlaceAll, origin)?;
            }
        }

        let output = recipe.output().clone();
        self.stage_output(planner, &output)?;
        self.cells = cells.iter().map(|c| (c.slot, c.need)).collect();
        self.output = Some(output);
        self.crafts_available = passes;
        self.state = CraftState::RecipeSelected;
        Ok(())
    }

    /// Creative craft: stage the creative item on the output slot.
    pub fn craft_creative(
        &mut self,
        planner: &mut ClickPlanner<'_>,
        creative_net_id: u32,
    ) -> Result<(), SynthError> {
        if self.state != CraftState::Start {
            return Err(SynthError::CraftOutOfOrder);
        }
        let item = self
            .recipes
            .creative_item(creative_net_id)
            .ok_or(SynthError::UnknownCreativeItem(creative_net_id))?;
        let output = item.with_count(self.items.max_stack_size(item.item_id));
        self.stage_output(planner, &output)?;
        self.cells = Vec::new();
        self.output = Some(output);
        self.crafts_available = 1;
        self.state = CraftState::RecipeSelected;
        Ok(())
    }

    /// Legacy results notification; only position in the machine matters.
    pub fn deprecated_results(&mut self) -> Result<(), SynthError> {
        if self.state != CraftState::RecipeSelected {
            return Err(SynthError::CraftOutOfOrder);
        }
        self.state = CraftState::DeprecatedResult;
        Ok(())
    }

    /// Ingredient-consumption claim. Consumption itself is simulated when
    /// the output is picked up; this validates ordering and addressing.
    pub fn consume(&mut self, slot: CanonicalSlot) -> Result<(), SynthError> {
        match self.state {
            CraftState::RecipeSelected
            | CraftState::DeprecatedResult
            | CraftState::IngredientsConsumed => {}
            _ => return Err(SynthError::CraftOutOfOrder),
        }
        let in_grid = self
            .category
            .grid()
            .map(|(first, w, h)| {
                (first.0..first.0 + (w as i16) * (h as i16)).contains(&slot.0)
            })
            .unwrap_or(false);
        let in_storage = self.category.temp_slot_range().contains(&slot.0);
        if !in_grid && !in_storage {
            return Err(SynthError::Unrepresentable(
                "consume outside grid and storage",
            ));
        }
        self.state = CraftState::IngredientsConsumed;
        Ok(())
    }

    /// Move `count` crafted items from the output slot to `dst`.
    ///
    /// Decomposed into repeated (pick up output, release to destination);
    /// when `count` is not a multiple of the per-craft output size, the
    /// leftover stays held and is reused by the next transfer.
    pub fn transfer_from_output(
        &mut self,
        planner: &mut ClickPlanner<'_>,
        count: u16,
        dst: CanonicalSlot,
    ) -> Result<(), SynthError> {
        match self.state {
            CraftState::RecipeSelected
            | CraftState::DeprecatedResult
            | CraftState::IngredientsConsumed
            | CraftState::Transfer => {}
            _ => return Err(SynthError::CraftOutOfOrder),
        }
        self.state = CraftState::Transfer;
        let output_slot = self.output_slot()?;
        if count == 0 {
            return Err(SynthError::BadCount {
                requested: 0,
                available: 0,
            });
        }

        let mut remaining = count;
        while remaining > 0 {
            let held = planner.cursor().clone();
            if held.is_empty() || remaining > held.count {
                // Need another craft's worth on the cursor.
                if self.crafts_available == 0 {
                    return Err(SynthError::BadCount {
                        requested: count,
                        available: held.count,
                    });
                }
                planner.append(ClickKind::PickupOrPlaceAll, output_slot)?;
                self.consume_one_craft(planner)?;
                continue;
            }
            if remaining == held.count {
                if dst.is_cursor() {
                    // Destination is the cursor itself; the stack is already
                    // held.
                    remaining = 0;
                    continue;
                }
                planner.append(ClickKind::PickupOrPlaceAll, dst)?;
                if !planner.cursor().is_empty() {
                    return Err(SynthError::DestinationFull);
                }
                remaining = 0;
            } else {
                if dst.is_cursor() {
                    return Err(SynthError::BadCount {
                        requested: remaining,
                        available: held.count,
                    });
                }
                for _ in 0..remaining {
                    planner.append(ClickKind::PickupOrPlaceHalf, dst)?;
                }
                // leftover = output size − remainder stays held for the
                // next transfer in this request.
                remaining = 0;
            }
        }
        if self.crafts_available == 0 && planner.cursor().is_empty() {
            self.state = CraftState::Done;
        }
        Ok(())
    }

    /// Clear any staged-but-untaken output at request end, so no created
    /// items outlive the request unclaimed.
    pub fn finish(&mut self, planner: &mut ClickPlanner<'_>) -> Result<(), SynthError> {
        if self.active() {
            let slot = self.output_slot()?;
            planner.stage_craft_result(slot, ItemStack::empty());
        }
        Ok(())
    }

    fn stage_output(
        &mut self,
        planner: &mut ClickPlanner<'_>,
        output: &ItemStack,
    ) -> Result<(), SynthError> {
        let slot = self.output_slot()?;
        let mut staged = output.clone();
        staged.net_id = planner.allocate_net_id();
        planner.stage_craft_result(slot, staged);
        Ok(())
    }

    /// One craft happened: consume the grid and restage or clear the output.
    fn consume_one_craft(&mut self, planner: &mut ClickPlanner<'_>) -> Result<(), SynthError> {
        for (slot, need) in self.cells.clone() {
            for _ in 0..need {
                planner.craft_consume_one(slot)?;
            }
        }
        self.crafts_available -= 1;
        let output_slot = self.output_slot()?;
        if self.crafts_available > 0 {
            let output = self
                .output
                .clone()
                .ok_or(SynthError::Unrepresentable("craft without a recipe"))?;
            self.stage_output(planner, &output)?;
        } else {
            planner.stage_craft_result(output_slot, ItemStack::empty());
        }
        Ok(())
    }

    fn check_dims(&self, recipe: &RecipeRef<'_>) -> Result<(), SynthError> {
        let (_, grid_w, grid_h) = self
            .category
            .grid()
            .ok_or(SynthError::Unsupported("container has no crafting grid"))?;
        if let RecipeRef::Shaped(shaped) = recipe {
            if shaped.width > grid_w || shaped.height > grid_h {
                return Err(SynthError::GridShape {
                    width: shaped.width,
                    height: shaped.height,
                    grid_width: grid_w,
                    grid_height: grid_h,
                });
            }
        }
        Ok(())
    }

    /// Validate the populated grid against the recipe and return the
    /// populated cells with their per-craft consumption.
    fn match_grid(
        &self,
        planner: &ClickPlanner<'_>,
        recipe: &RecipeRef<'_>,
    ) -> Result<Vec<(CanonicalSlot, u16)>, SynthError> {
        let (grid_first, grid_w, grid_h) = self
            .category
            .grid()
            .ok_or(SynthError::Unsupported("container has no crafting grid"))?;
        let cell = |x: i16, y: i16| CanonicalSlot(grid_first.0 + y * grid_w as i16 + x);

        match recipe {
            RecipeRef::Shaped(shaped) => {
                // The recipe rectangle may sit anywhere in the grid; all
                // cells outside it must be empty.
                for dy in 0..=(grid_h - shaped.height) as i16 {
                    for dx in 0..=(grid_w - shaped.width) as i16 {
                        if let Some(cells) =
                            self.match_shaped_at(planner, shaped, dx, dy, grid_w, grid_h, &cell)?
                        {
                            return Ok(cells);
                        }
                    }
                }
                Err(SynthError::GridMismatch(shaped.net_id))
            }
            RecipeRef::Shapeless(shapeless) => {
                let mut assigned: Vec<(CanonicalSlot, u16)> = Vec::new();
                let mut used = vec![false; (grid_w as usize) * (grid_h as usize)];
                for ingredient in &shapeless.inputs {
                    let mut found = false;
                    for i in 0..used.len() {
                        if used[i] {
                            continue;
                        }
                        let slot = CanonicalSlot(grid_first.0 + i as i16);
                        let stack = planner.item_at(slot)?;
                        if !stack.is_empty() && stack.item_id == ingredient.item_id {
                            used[i] = true;
                            assigned.push((slot, ingredient.count));
                            found = true;
                            break;
                        }
                    }
                    if !found {
                        return Err(SynthError::GridMismatch(shapeless.net_id));
                    }
                }
                // Any populated cell not consumed by the recipe is foreign.
                for i in 0..used.len() {
                    let slot = CanonicalSlot(grid_first.0 + i as i16);
                    if !used[i] && !planner.item_at(slot)?.is_empty() {
                        return Err(SynthError::GridMismatch(shapeless.net_id));
                    }
                }
                Ok(assigned)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn match_shaped_at(
        &self,
        planner: &ClickPlanner<'_>,
        shaped: &crate::oracle::ShapedRecipe,
        dx: i16,
        dy: i16,
        grid_w: u8,
        grid_h: u8,
        cell: &dyn Fn(i16, i16) -> CanonicalSlot,
    ) -> Result<Option<Vec<(CanonicalSlot, u16)>>, SynthError> {
        let mut cells = Vec::new();
        for y in 0..grid_h as i16 {
            for x in 0..grid_w as i16 {
                let stack = planner.item_at(cell(x, y))?;
                let rx = x - dx;
                let ry = y - dy;
                let ingredient = if (0..shaped.width as i16).contains(&rx)
                    && (0..shaped.height as i16).contains(&ry)
                {
                    shaped
                        .inputs
                        .get((ry * shaped.width as i16 + rx) as usize)
                        .cloned()
                } else {
                    None
                };
                match ingredient {
                    Some(ing) if ing.item_id != 0 => {
                        if stack.is_empty() || stack.item_id != ing.item_id {
                            return Ok(None);
                        }
                        cells.push((cell(x, y), ing.count));
                    }
                    _ => {
                        if !stack.is_empty() {
                            return Ok(None);
                        }
                    }
                }
            }
        }
        Ok(Some(cells))
    }

    /// Grid cells each auto-craft pass fills, anchored at the grid origin.
    fn plan_auto_cells(
        &self,
        recipe: &RecipeRef<'_>,
        grid_first: CanonicalSlot,
        grid_w: u8,
    ) -> Vec<AutoCell> {
        match recipe {
            RecipeRef::Shaped(shaped) => {
                let mut cells = Vec::new();
                for y in 0..shaped.height as i16 {
                    for x in 0..shaped.width as i16 {
                        let ing = &shaped.inputs[(y * shaped.width as i16 + x) as usize];
                        if ing.item_id != 0 {
                            cells.push(AutoCell {
                                slot: CanonicalSlot(grid_first.0 + y * grid_w as i16 + x),
                                need: ing.count,
                                item_id: ing.item_id,
                            });
                        }
                    }
                }
                cells
            }
            RecipeRef::Shapeless(shapeless) => shapeless
                .inputs
                .iter()
                .enumerate()
                .map(|(i, ing)| AutoCell {
                    slot: CanonicalSlot(grid_first.0 + i as i16),
                    need: ing.count,
                    item_id: ing.item_id,
                })
                .collect(),
        }
    }

    /// Put one pass worth of ingredients into the grid. Returns `false`
    /// when a source ran dry before the grid was fully populated.
    fn populate_pass(
        &self,
        planner: &mut ClickPlanner<'_>,
        cells: &[AutoCell],
        held_origin: &mut Option<CanonicalSlot>,
    ) -> Result<bool, SynthError> {
        for cell in cells {
            let mut placed = 0;
            while placed < cell.need {
                let held = planner.cursor().clone();
                if held.is_empty() || held.item_id != cell.item_id {
                    // Return the wrong item and pick up a matching source.
                    if !held.is_empty() {
                        if let Some(origin) = held_origin.take() {
                            planner.append(ClickKind::PickupOrPlaceAll, origin)?;
                        } else {
                            return Err(SynthError::Unrepresentable(
                                "held stack has no origin during auto-craft",
                            ));
                        }
                    }
                    match self.find_ingredient_source(planner, cell.item_id) {
                        Some(source) => {
                            planner.append(ClickKind::PickupOrPlaceAll, source)?;
                            *held_origin = Some(source);
                        }
                        None => return Ok(false),
                    }
                }
                planner.append(ClickKind::PickupOrPlaceHalf, cell.slot)?;
                placed += 1;
            }
        }
        Ok(true)
    }

    /// First storage slot holding the wanted ingredient, ascending order,
    /// grid excluded.
    fn find_ingredient_source(
        &self,
        planner: &ClickPlanner<'_>,
        item_id: i32,
    ) -> Option<CanonicalSlot> {
        for c in self.category.temp_slot_range() {
            let slot = CanonicalSlot(c);
            if let Ok(stack) = planner.item_at(slot) {
                if !stack.is_empty() && stack.item_id == item_id {
                    return Some(slot);
                }
            }
        }
        None
    }
}
