//! Table-backed oracle implementations.
//!
//! `ItemTable` maps item identities to their properties and answers
//! stackability; `RecipeTable` stores shaped/shapeless recipes and the
//! creative item list keyed by net id. Both are plain in-memory tables the
//! embedder fills at startup (from JSON data or programmatically) and are
//! never mutated during synthesis.

use std::collections::HashMap;

use serde::Deserialize;

use mc_bridge_proto::ItemStack;

use crate::oracle::{
    Ingredient, ItemOracle, RecipeOracle, RecipeRef, ShapedRecipe, ShapelessRecipe,
    DEFAULT_MAX_STACK,
};

/// Properties for a single item type.
#[derive(Debug, Clone)]
pub struct ItemInfo {
    /// Namespaced identifier, e.g. `"bridge:stone"`.
    pub name: String,
    pub item_id: i32,
    pub max_stack_size: u16,
}

/// One entry of the JSON item list: `{"name": {"item_id": .., "max_stack_size": ..}}`.
#[derive(Deserialize)]
struct RawItemEntry {
    item_id: i32,
    #[serde(default = "default_max_stack")]
    max_stack_size: u16,
}

fn default_max_stack() -> u16 {
    DEFAULT_MAX_STACK
}

/// Registry of known items.
#[derive(Debug, Default)]
pub struct ItemTable {
    by_id: HashMap<i32, ItemInfo>,
    by_name: HashMap<String, i32>,
}

impl ItemTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON map of `name -> {item_id, max_stack_size}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let raw: HashMap<String, RawItemEntry> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for (name, entry) in raw {
            table.register(&name, entry.item_id, entry.max_stack_size);
        }
        Ok(table)
    }

    pub fn register(&mut self, name: &str, item_id: i32, max_stack_size: u16) {
        self.by_name.insert(name.to_string(), item_id);
        self.by_id.insert(
            item_id,
            ItemInfo {
                name: name.to_string(),
                item_id,
                max_stack_size,
            },
        );
    }

    pub fn get(&self, item_id: i32) -> Option<&ItemInfo> {
        self.by_id.get(&item_id)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&ItemInfo> {
        self.by_name.get(name).and_then(|id| self.by_id.get(id))
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

impl ItemOracle for ItemTable {
    fn can_stack(&self, a: &ItemStack, b: &ItemStack) -> bool {
        !a.is_empty() && !b.is_empty() && a.item_id == b.item_id && a.extra_data == b.extra_data
    }

    fn max_stack_size(&self, item_id: i32) -> u16 {
        self.by_id
            .get(&item_id)
            .map(|info| info.max_stack_size)
            .unwrap_or(DEFAULT_MAX_STACK)
    }
}

/// Registry of recipes and creative items.
#[derive(Debug, Default)]
pub struct RecipeTable {
    shaped: HashMap<u32, ShapedRecipe>,
    shapeless: HashMap<u32, ShapelessRecipe>,
    creative: HashMap<u32, ItemStack>,
}

impl RecipeTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_shaped(&mut self, recipe: ShapedRecipe) {
        self.shaped.insert(recipe.net_id, recipe);
    }

    pub fn add_shapeless(&mut self, recipe: ShapelessRecipe) {
        self.shapeless.insert(recipe.net_id, recipe);
    }

    /// Register a creative item under a creative net id.
    pub fn add_creative(&mut self, net_id: u32, item: ItemStack) {
        self.creative.insert(net_id, item);
    }

    /// Convenience builder for a shaped recipe with one unit per cell.
    pub fn shaped(
        net_id: u32,
        width: u8,
        height: u8,
        cell_item_ids: &[i32],
        output: ItemStack,
    ) -> ShapedRecipe {
        ShapedRecipe {
            net_id,
            width,
            height,
            inputs: cell_item_ids
                .iter()
                .map(|&id| Ingredient {
                    item_id: id,
                    count: if id == 0 { 0 } else { 1 },
                })
                .collect(),
            output,
        }
    }
}

impl RecipeOracle for RecipeTable {
    fn recipe(&self, net_id: u32) -> Option<RecipeRef<'_>> {
        if let Some(r) = self.shaped.get(&net_id) {
            return Some(RecipeRef::Shaped(r));
        }
        self.shapeless.get(&net_id).map(RecipeRef::Shapeless)
    }

    fn creative_item(&self, net_id: u32) -> Option<&ItemStack> {
        self.creative.get(&net_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_item_list() {
        let table = ItemTable::from_json(
            r#"{
                "bridge:stone": {"item_id": 1},
                "bridge:pearl": {"item_id": 7, "max_stack_size": 16},
                "bridge:sword": {"item_id": 20, "max_stack_size": 1}
            }"#,
        )
        .unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.max_stack_size(1), 64);
        assert_eq!(table.max_stack_size(7), 16);
        assert_eq!(table.max_stack_size(20), 1);
        assert_eq!(table.get_by_name("bridge:pearl").unwrap().item_id, 7);
    }

    #[test]
    fn unknown_item_gets_default_stack_size() {
        let table = ItemTable::new();
        assert_eq!(table.max_stack_size(999), DEFAULT_MAX_STACK);
    }

    #[test]
    fn stackability_requires_identity_and_extra_data() {
        let table = ItemTable::new();
        let a = ItemStack::new(1, 10);
        let b = ItemStack::new(1, 20);
        let c = ItemStack::new(2, 10);
        let mut d = ItemStack::new(1, 5);
        d.extra_data = vec![1];
        assert!(table.can_stack(&a, &b));
        assert!(!table.can_stack(&a, &c));
        assert!(!table.can_stack(&a, &d));
        assert!(!table.can_stack(&a, &ItemStack::empty()));
    }

    #[test]
    fn recipe_lookup_by_net_id() {
        let mut recipes = RecipeTable::new();
        recipes.add_shaped(RecipeTable::shaped(
            3,
            2,
            2,
            &[5, 5, 5, 5],
            ItemStack::new(9, 4),
        ));
        recipes.add_shapeless(ShapelessRecipe {
            net_id: 4,
            inputs: vec![Ingredient {
                item_id: 6,
                count: 1,
            }],
            output: ItemStack::new(10, 4),
        });

        assert!(matches!(recipes.recipe(3), Some(RecipeRef::Shaped(_))));
        assert!(matches!(recipes.recipe(4), Some(RecipeRef::Shapeless(_))));
        assert!(recipes.recipe(5).is_none());
        assert_eq!(recipes.recipe(3).unwrap().output().count, 4);
    }

    #[test]
    fn creative_items() {
        let mut recipes = RecipeTable::new();
        recipes.add_creative(100, ItemStack::new(1, 64));
        assert_eq!(recipes.creative_item(100).unwrap().item_id, 1);
        assert!(recipes.creative_item(101).is_none());
    }
}
