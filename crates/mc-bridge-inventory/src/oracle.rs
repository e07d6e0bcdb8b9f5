//! Oracle interfaces the synthesis core consults.
//!
//! Item stackability, max stack sizes, and recipe lookup are owned by the
//! embedder; the core only consumes them. The tables in
//! [`registry`](crate::registry) are the shipped implementations.

use mc_bridge_proto::ItemStack;

/// Default max stack size when an item has no override.
pub const DEFAULT_MAX_STACK: u16 = 64;

/// Item identity and stacking rules.
pub trait ItemOracle {
    /// Whether two stacks may merge: same identity and compatible extra
    /// data. Empty stacks never stack.
    fn can_stack(&self, a: &ItemStack, b: &ItemStack) -> bool;

    /// Max stack size for an item id.
    fn max_stack_size(&self, item_id: i32) -> u16;
}

/// One required ingredient of a recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    /// Item identity. 0 = empty cell (shaped recipes only).
    pub item_id: i32,
    /// Units consumed per craft.
    pub count: u16,
}

/// A position-dependent recipe occupying a `width × height` sub-rectangle.
#[derive(Debug, Clone)]
pub struct ShapedRecipe {
    pub net_id: u32,
    pub width: u8,
    pub height: u8,
    /// Row-major `width × height` cells; `item_id == 0` marks a hole.
    pub inputs: Vec<Ingredient>,
    pub output: ItemStack,
}

/// An order-independent recipe.
#[derive(Debug, Clone)]
pub struct ShapelessRecipe {
    pub net_id: u32,
    pub inputs: Vec<Ingredient>,
    pub output: ItemStack,
}

/// Borrowed reference to either recipe kind.
#[derive(Debug, Clone, Copy)]
pub enum RecipeRef<'a> {
    Shaped(&'a ShapedRecipe),
    Shapeless(&'a ShapelessRecipe),
}

impl RecipeRef<'_> {
    pub fn net_id(&self) -> u32 {
        match self {
            RecipeRef::Shaped(r) => r.net_id,
            RecipeRef::Shapeless(r) => r.net_id,
        }
    }

    pub fn output(&self) -> &ItemStack {
        match self {
            RecipeRef::Shaped(r) => &r.output,
            RecipeRef::Shapeless(r) => &r.output,
        }
    }

    /// Non-hole ingredients.
    pub fn ingredients(&self) -> impl Iterator<Item = &Ingredient> {
        let inputs = match self {
            RecipeRef::Shaped(r) => &r.inputs,
            RecipeRef::Shapeless(r) => &r.inputs,
        };
        inputs.iter().filter(|i| i.item_id != 0)
    }
}

/// Recipe and creative-item lookup.
pub trait RecipeOracle {
    /// Recipe by front-protocol net id.
    fn recipe(&self, net_id: u32) -> Option<RecipeRef<'_>>;

    /// Creative-registry item by creative net id.
    fn creative_item(&self, net_id: u32) -> Option<&ItemStack>;
}
