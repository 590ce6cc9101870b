use super::items::ItemRef;
use super::recipes::{Recipe, RecipeBook};
use crate::sim::craft::effective_cycle_duration;

/// Step used when the fast modifier is held.
pub const FAST_STEP: u32 = 10;

/// Quantity picker shown before a craft starts. Purely local: dropping it
/// leaves every station untouched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchSelector {
    item: ItemRef,
    amount: u32,
    max: u32,
    cycle_duration: u64,
    yield_per_cycle: u32,
}

impl BatchSelector {
    pub fn new(recipe: &Recipe, book: &RecipeBook) -> Self {
        Self {
            item: recipe.owner,
            amount: 1,
            max: book.max_batch.max(1),
            cycle_duration: effective_cycle_duration(recipe.time_cost(), book.speed_modifier),
            yield_per_cycle: recipe.yield_amount(),
        }
    }

    pub fn item(&self) -> ItemRef {
        self.item
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Returns `false` when already at the maximum (the caller plays a
    /// rejection cue).
    pub fn step_up(&mut self, fast: bool) -> bool {
        if self.amount == self.max {
            return false;
        }
        let step = if fast { FAST_STEP } else { 1 };
        self.amount = self.amount.saturating_add(step).min(self.max);
        true
    }

    /// Jump straight to `amount`, clamped to `1..=max`.
    pub fn set_amount(&mut self, amount: u32) {
        self.amount = amount.clamp(1, self.max);
    }

    /// Returns `false` when already at 1.
    pub fn step_down(&mut self, fast: bool) -> bool {
        if self.amount == 1 {
            return false;
        }
        let step = if fast { FAST_STEP } else { 1 };
        self.amount = self.amount.saturating_sub(step).max(1);
        true
    }

    /// Total seconds for the selected amount, saturating like
    /// [`CraftOrder`](crate::sim::craft::CraftOrder).
    pub fn duration(&self) -> u64 {
        self.cycle_duration.saturating_mul(u64::from(self.amount))
    }

    pub fn total_yield(&self) -> u32 {
        self.yield_per_cycle.saturating_mul(self.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::recipes::IngredientKind;

    fn selector(max: u32) -> BatchSelector {
        let mut recipe = Recipe::new(ItemRef::item(5));
        recipe.set(IngredientKind::Time, 20);
        recipe.set(IngredientKind::Yield, 2);
        let mut book = RecipeBook::new(1, 0, "Bench".into());
        book.max_batch = max;
        BatchSelector::new(&recipe, &book)
    }

    #[test]
    fn test_starts_at_one() {
        let sel = selector(5);
        assert_eq!(sel.amount(), 1);
        assert_eq!(sel.duration(), 20);
        assert_eq!(sel.total_yield(), 2);
        assert_eq!(sel.item(), ItemRef::item(5));
    }

    #[test]
    fn test_step_clamps_to_bounds() {
        let mut sel = selector(3);
        assert!(!sel.step_down(false));
        assert!(sel.step_up(false));
        assert!(sel.step_up(true));
        assert_eq!(sel.amount(), 3);
        assert!(!sel.step_up(false));
        assert!(sel.step_down(true));
        assert_eq!(sel.amount(), 1);
    }

    #[test]
    fn test_set_amount_clamps() {
        let mut sel = selector(8);
        sel.set_amount(0);
        assert_eq!(sel.amount(), 1);
        sel.set_amount(50);
        assert_eq!(sel.amount(), 8);
        sel.set_amount(4);
        assert_eq!(sel.duration(), 80);
    }

    #[test]
    fn test_fast_step() {
        let mut sel = selector(25);
        sel.step_up(true);
        assert_eq!(sel.amount(), 11);
        sel.step_up(true);
        sel.step_up(true);
        assert_eq!(sel.amount(), 25);
        sel.step_down(false);
        assert_eq!(sel.amount(), 24);
        assert_eq!(sel.duration(), 480);
        assert_eq!(sel.total_yield(), 48);
    }

    #[test]
    fn test_huge_values_saturate() {
        let mut recipe = Recipe::new(ItemRef::item(5));
        recipe.set(IngredientKind::Time, u32::MAX);
        recipe.set(IngredientKind::Yield, u32::MAX);
        let mut book = RecipeBook::new(1, 0, "Bench".into());
        book.max_batch = u32::MAX;
        book.speed_modifier = 0;
        let mut sel = BatchSelector::new(&recipe, &book);
        sel.set_amount(u32::MAX);
        assert_eq!(sel.amount(), u32::MAX);
        assert_eq!(sel.duration(), u64::MAX);
        assert_eq!(sel.total_yield(), u32::MAX);
    }

    #[test]
    fn test_max_of_one_cannot_move() {
        let mut sel = selector(1);
        assert!(!sel.step_up(true));
        assert!(!sel.step_down(true));
        assert_eq!(sel.max(), 1);
    }
}
