use serde::{Deserialize, Serialize};

use crate::error::CraftError;
use crate::game::inventory::Inventory;
use crate::game::items::ItemRef;
use crate::game::recipes::{Recipe, RecipeBook, RecipeCatalog, BASE_SPEED};

/// Seconds one craft takes once the book's speed modifier is applied:
/// `base + floor(base * (100 - speed) / 100)`, never below zero.
///
/// Computed in `i128`: any `u32` pair fits, and the result is at most
/// `2 * base`.
pub fn effective_cycle_duration(base: u32, speed_modifier: u32) -> u64 {
    let base = i128::from(base);
    let delta = (base * (i128::from(BASE_SPEED) - i128::from(speed_modifier))).div_euclid(100);
    (base + delta).max(0) as u64
}

/// Reject batch amounts outside `1..=max`.
pub fn validate_batch(amount: u32, max: u32) -> Result<(), CraftError> {
    if amount == 0 || amount > max {
        return Err(CraftError::InvalidBatchAmount { amount, max });
    }
    Ok(())
}

/// Observable state of a station's job at a given playtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CraftState {
    /// No job.
    Idle,
    /// Running, `now < end_time`.
    Active,
    /// Finished, output waiting to be harvested.
    Complete,
}

/// A validated request to craft `batch` cycles of one item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CraftOrder {
    pub item: ItemRef,
    pub batch: u32,
    /// Total seconds for all cycles, saturating at `u64::MAX`.
    pub duration: u64,
}

impl CraftOrder {
    pub fn new(recipe: &Recipe, book: &RecipeBook, batch: u32) -> Result<Self, CraftError> {
        validate_batch(batch, book.max_batch)?;
        let cycle = effective_cycle_duration(recipe.time_cost(), book.speed_modifier);
        Ok(Self {
            item: recipe.owner,
            batch,
            duration: cycle.saturating_mul(u64::from(batch)),
        })
    }
}

/// The running part of a job. Only value types, so it can be written to a
/// save file and resolved again after the catalog is rebuilt.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActiveCraft {
    pub item: ItemRef,
    pub start_time: f64,
    pub end_time: f64,
    pub batch: u32,
}

impl ActiveCraft {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Output collected from a finished job.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Harvest {
    pub item: ItemRef,
    pub amount: u32,
}

/// One station's crafting job.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CraftJob {
    current: Option<ActiveCraft>,
}

impl CraftJob {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a job from saved state.
    pub fn resume(active: ActiveCraft) -> Self {
        Self { current: Some(active) }
    }

    pub fn current(&self) -> Option<&ActiveCraft> {
        self.current.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none()
    }

    pub fn state(&self, now: f64) -> CraftState {
        match self.current {
            None => CraftState::Idle,
            Some(_) if self.is_ready(now) => CraftState::Complete,
            Some(_) => CraftState::Active,
        }
    }

    /// Begin crafting. Materials must already have been deducted.
    pub fn start(&mut self, order: &CraftOrder, now: f64) -> Result<(), CraftError> {
        if let Some(active) = &self.current {
            return Err(CraftError::JobInProgress(active.item));
        }
        self.current = Some(ActiveCraft {
            item: order.item,
            start_time: now,
            end_time: now + order.duration as f64,
            batch: order.batch,
        });
        log::debug!("craft started: {}x {} for {}s", order.batch, order.item, order.duration);
        Ok(())
    }

    /// Fraction of time remaining, `1.0` at start down to `0.0`. Drives a
    /// depleting gauge. `0.0` when idle.
    pub fn progress(&self, now: f64) -> f64 {
        let Some(active) = &self.current else {
            return 0.0;
        };
        let full = active.duration();
        if full <= 0.0 {
            return 0.0;
        }
        ((active.end_time - now) / full).max(0.0)
    }

    /// True once the job's time is up. Also true when idle, so check
    /// [`CraftJob::is_idle`] first.
    pub fn is_ready(&self, now: f64) -> bool {
        self.progress(now) <= 0.0
    }

    /// Seconds left before the job completes, `0.0` when idle or done.
    pub fn remaining(&self, now: f64) -> f64 {
        self.current.map_or(0.0, |a| (a.end_time - now).max(0.0))
    }

    /// Total seconds of the running job.
    pub fn duration(&self) -> f64 {
        self.current.map_or(0.0, |a| a.duration())
    }

    pub fn item(&self) -> Option<ItemRef> {
        self.current.map(|a| a.item)
    }

    pub fn batch(&self) -> u32 {
        self.current.map_or(0, |a| a.batch)
    }

    /// Grant `batch * yield` of the crafted item and go idle. Does nothing
    /// while the job is still running or when there is no job.
    pub fn harvest(
        &mut self,
        catalog: &RecipeCatalog,
        inventory: &mut impl Inventory,
        now: f64,
    ) -> Result<Option<Harvest>, CraftError> {
        let Some(active) = self.current else {
            return Ok(None);
        };
        if !self.is_ready(now) {
            return Ok(None);
        }
        let recipe = catalog
            .recipe_for(active.item)
            .ok_or(CraftError::DanglingRecipeReference(active.item))?;
        let amount = active.batch.saturating_mul(recipe.yield_amount());
        inventory.grant(active.item, amount);
        self.current = None;
        log::debug!("craft harvested: {amount}x {}", active.item);
        Ok(Some(Harvest { item: active.item, amount }))
    }

    /// Drop the job without output. Consumed materials are not returned.
    pub fn cancel(&mut self) {
        if let Some(active) = self.current.take() {
            log::debug!("craft of {} cancelled", active.item);
        }
    }
}
