use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::inventory::Inventory;
use super::items::{GameDatabase, ItemKind, ItemRef};
use super::notetag::{parse_recipe, parse_recipe_book};
use crate::error::CraftError;

/// Speed modifier that leaves craft time unchanged.
pub const BASE_SPEED: u32 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IngredientKind {
    /// Seconds needed for one craft.
    Time,
    /// Units produced by one craft.
    Yield,
    /// Units of another definition consumed by one craft.
    Material(ItemRef),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub kind: IngredientKind,
    pub amount: u32,
}

/// Crafting requirements attached to one item, weapon or armor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub owner: ItemRef,
    /// Declaration order, kept for display.
    pub ingredients: SmallVec<[Ingredient; 4]>,
}

impl Recipe {
    pub fn new(owner: ItemRef) -> Self {
        Self { owner, ingredients: SmallVec::new() }
    }

    /// Add an ingredient, or overwrite the amount of an existing one of the
    /// same kind in place.
    pub fn set(&mut self, kind: IngredientKind, amount: u32) {
        match self.ingredients.iter_mut().find(|ing| ing.kind == kind) {
            Some(existing) => existing.amount = amount,
            None => self.ingredients.push(Ingredient { kind, amount }),
        }
    }

    fn amount_of(&self, kind: IngredientKind) -> Option<u32> {
        self.ingredients.iter().find(|ing| ing.kind == kind).map(|ing| ing.amount)
    }

    pub fn time_cost(&self) -> u32 {
        self.amount_of(IngredientKind::Time).unwrap_or(1)
    }

    pub fn yield_amount(&self) -> u32 {
        self.amount_of(IngredientKind::Yield).unwrap_or(1)
    }

    pub fn materials(&self) -> impl Iterator<Item = (ItemRef, u32)> + '_ {
        self.ingredients.iter().filter_map(|ing| match ing.kind {
            IngredientKind::Material(item) => Some((item, ing.amount)),
            _ => None,
        })
    }
}

/// A category marker item: groups recipes and sets batch/speed limits for
/// the stations that open this category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeBook {
    /// Id of the item definition carrying the book.
    pub owner: u32,
    pub category: u32,
    pub display_name: String,
    pub max_batch: u32,
    /// Percent; 100 leaves craft time unchanged.
    pub speed_modifier: u32,
    pub recipes: Vec<ItemRef>,
}

impl RecipeBook {
    pub fn new(owner: u32, category: u32, display_name: String) -> Self {
        Self {
            owner,
            category,
            display_name,
            max_batch: 1,
            speed_modifier: BASE_SPEED,
            recipes: Vec::new(),
        }
    }
}

/// Parsed recipes and recipe books. Built in one go from the definition
/// tables and never patched afterwards; reloading game data builds a new one.
#[derive(Debug, Default)]
pub struct RecipeCatalog {
    recipes: Vec<Recipe>,
    by_item: HashMap<ItemRef, usize>,
    books: Vec<RecipeBook>,
    by_category: HashMap<u32, Vec<usize>>,
}

impl RecipeCatalog {
    /// Parse every definition. Fails on the first malformed annotation.
    pub fn build(db: &GameDatabase) -> Result<Self, CraftError> {
        let mut catalog = Self::default();

        for &kind in ItemKind::all() {
            for def in db.table(kind) {
                if let Some(recipe) = parse_recipe(ItemRef::new(kind, def.id), &def.note)? {
                    catalog.insert_recipe(recipe);
                }
            }
        }

        for def in &db.items {
            if let Some(mut book) = parse_recipe_book(def.id, &def.note)? {
                let refs = std::mem::take(&mut book.recipes);
                let (resolved, dangling) = catalog.resolve(&refs);
                for item in dangling {
                    log::warn!("recipe book {:?} lists {item}, which has no recipe", book.display_name);
                }
                book.recipes = resolved;
                catalog.insert_book(book);
            }
        }

        log::debug!(
            "recipe catalog: {} recipes, {} books",
            catalog.recipes.len(),
            catalog.books.len()
        );
        Ok(catalog)
    }

    /// Replace book recipe lists with the ones stored in a save file. Entries
    /// that no longer resolve to a recipe are dropped and reported.
    pub fn with_saved_books(mut self, saved: &BTreeMap<u32, Vec<ItemRef>>) -> (Self, Vec<CraftError>) {
        let mut dropped = Vec::new();
        for (&owner, refs) in saved {
            let (resolved, dangling) = self.resolve(refs);
            let Some(book) = self.books.iter_mut().find(|b| b.owner == owner) else {
                log::warn!("saved recipe book on item {owner} no longer exists, ignoring");
                continue;
            };
            for item in dangling {
                log::warn!("saved recipe book {:?} lists {item}, which has no recipe", book.display_name);
                dropped.push(CraftError::DanglingRecipeReference(item));
            }
            book.recipes = resolved;
        }
        (self, dropped)
    }

    fn insert_recipe(&mut self, recipe: Recipe) {
        match self.by_item.get(&recipe.owner) {
            Some(&i) => self.recipes[i] = recipe,
            None => {
                self.by_item.insert(recipe.owner, self.recipes.len());
                self.recipes.push(recipe);
            }
        }
    }

    fn insert_book(&mut self, book: RecipeBook) {
        self.by_category.entry(book.category).or_default().push(self.books.len());
        self.books.push(book);
    }

    fn resolve(&self, refs: &[ItemRef]) -> (Vec<ItemRef>, Vec<ItemRef>) {
        refs.iter().copied().partition(|item| self.by_item.contains_key(item))
    }

    pub fn recipe_for(&self, item: ItemRef) -> Option<&Recipe> {
        self.by_item.get(&item).map(|&i| &self.recipes[i])
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    /// All books in declaration order.
    pub fn books(&self) -> &[RecipeBook] {
        &self.books
    }

    /// Metadata for a category: the last declared book wins.
    pub fn book_for_category(&self, category: u32) -> Option<&RecipeBook> {
        self.by_category
            .get(&category)
            .and_then(|indices| indices.last())
            .map(|&i| &self.books[i])
    }

    /// Recipes of every book declaring `category`, in declaration order,
    /// each item listed once.
    pub fn items_in_category(&self, category: u32) -> Vec<&Recipe> {
        let mut seen = HashSet::new();
        self.by_category
            .get(&category)
            .into_iter()
            .flatten()
            .flat_map(|&i| self.books[i].recipes.iter())
            .filter(|item| seen.insert(**item))
            .filter_map(|&item| self.recipe_for(item))
            .collect()
    }

    /// Whether the inventory holds enough materials for `batch` crafts.
    pub fn can_craft(&self, recipe: &Recipe, inventory: &impl Inventory, batch: u32) -> bool {
        recipe
            .materials()
            .all(|(item, amount)| inventory.count(item) >= amount.saturating_mul(batch))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::inventory::PartyInventory;
    use crate::game::items::ItemDef;

    fn def(id: u32, name: &str, note: &str) -> ItemDef {
        ItemDef { id, name: name.into(), note: note.into() }
    }

    fn sample_db() -> GameDatabase {
        GameDatabase {
            items: vec![
                def(1, "Herb", ""),
                def(2, "Potion", "<recipe>\ni: 1, 2\nt: 10\n</recipe>"),
                def(3, "Elixir", "<recipe>\ni: 2, 3\ni: 1, 1\nt: 30\ny: 2\n</recipe>"),
                def(
                    10,
                    "Alchemy Notes",
                    "<recipe_book>\ncategory: 0\ncatname: Alchemy\nm: 5\ns: 50\ni: 2, 3\n</recipe_book>",
                ),
                def(
                    11,
                    "Smithing Notes",
                    "<recipe_book>\ncategory: 1\ncatname: Forge\nw: 1\na: 1, 2\n</recipe_book>",
                ),
            ],
            weapons: vec![def(1, "Sword", "<recipe>\ni: 1, 4\nt: 60\n</recipe>")],
            armors: vec![def(1, "Shield", "<recipe>\nw: 1, 1\n</recipe>"), def(2, "Cap", "")],
        }
    }

    #[test]
    fn test_catalog_lookup_by_item() {
        let catalog = RecipeCatalog::build(&sample_db()).unwrap();
        assert_eq!(catalog.recipes().len(), 4);
        assert_eq!(catalog.recipe_for(ItemRef::weapon(1)).unwrap().time_cost(), 60);
        assert_eq!(catalog.recipe_for(ItemRef::item(3)).unwrap().yield_amount(), 2);
        assert!(catalog.recipe_for(ItemRef::item(1)).is_none());
        assert!(catalog.recipe_for(ItemRef::armor(2)).is_none());
    }

    #[test]
    fn test_catalog_category_lookup() {
        let catalog = RecipeCatalog::build(&sample_db()).unwrap();
        let book = catalog.book_for_category(0).unwrap();
        assert_eq!(book.display_name, "Alchemy");
        assert_eq!(book.max_batch, 5);
        assert_eq!(book.speed_modifier, 50);

        let owners: Vec<_> = catalog.items_in_category(0).iter().map(|r| r.owner).collect();
        assert_eq!(owners, vec![ItemRef::item(2), ItemRef::item(3)]);
        assert!(catalog.book_for_category(7).is_none());
        assert!(catalog.items_in_category(7).is_empty());
    }

    #[test]
    fn test_dangling_book_reference_dropped() {
        let catalog = RecipeCatalog::build(&sample_db()).unwrap();
        // armor 2 has no recipe
        let book = catalog.book_for_category(1).unwrap();
        assert_eq!(book.recipes, vec![ItemRef::weapon(1), ItemRef::armor(1)]);
    }

    #[test]
    fn test_same_category_metadata_last_wins_lists_merge() {
        let mut db = sample_db();
        db.items.push(def(
            12,
            "More Alchemy",
            "<recipe_book>\ncategory: 0\ncatname: Grand Alchemy\nm: 2\ni: 3\nw: 1\n</recipe_book>",
        ));
        let catalog = RecipeCatalog::build(&db).unwrap();
        let book = catalog.book_for_category(0).unwrap();
        assert_eq!(book.display_name, "Grand Alchemy");
        assert_eq!(book.max_batch, 2);
        assert_eq!(book.speed_modifier, BASE_SPEED);

        let owners: Vec<_> = catalog.items_in_category(0).iter().map(|r| r.owner).collect();
        assert_eq!(owners, vec![ItemRef::item(2), ItemRef::item(3), ItemRef::weapon(1)]);
    }

    #[test]
    fn test_parse_error_aborts_build() {
        let mut db = sample_db();
        db.armors.push(def(3, "Broken", "<recipe>\ni: 1, lots\n</recipe>"));
        match RecipeCatalog::build(&db) {
            Err(CraftError::Parse(err)) => assert_eq!(err.owner, ItemRef::armor(3)),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_with_saved_books() {
        let catalog = RecipeCatalog::build(&sample_db()).unwrap();
        let saved = BTreeMap::from([
            (10, vec![ItemRef::item(3), ItemRef::item(99)]),
            (55, vec![ItemRef::item(2)]),
        ]);
        let (catalog, dropped) = catalog.with_saved_books(&saved);
        assert_eq!(catalog.book_for_category(0).unwrap().recipes, vec![ItemRef::item(3)]);
        assert_eq!(dropped.len(), 1);
        assert!(matches!(
            dropped[0],
            CraftError::DanglingRecipeReference(item) if item == ItemRef::item(99)
        ));
    }

    #[test]
    fn test_can_craft_with_batch() {
        let catalog = RecipeCatalog::build(&sample_db()).unwrap();
        let elixir = catalog.recipe_for(ItemRef::item(3)).unwrap();
        let mut inv = PartyInventory::new();
        inv.add(ItemRef::item(2), 6);
        inv.add(ItemRef::item(1), 2);
        assert!(catalog.can_craft(elixir, &inv, 1));
        assert!(catalog.can_craft(elixir, &inv, 2));
        assert!(!catalog.can_craft(elixir, &inv, 3));
        assert!(!catalog.can_craft(elixir, &PartyInventory::new(), 1));
    }

    #[test]
    fn test_recipe_defaults_hold_for_all() {
        let catalog = RecipeCatalog::build(&sample_db()).unwrap();
        for recipe in catalog.recipes() {
            assert!(recipe.yield_amount() >= 1);
            let times = recipe
                .ingredients
                .iter()
                .filter(|i| i.kind == IngredientKind::Time)
                .count();
            assert!(times <= 1);
        }
    }
}
