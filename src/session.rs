//! Command/query surface used by menus, map scripts and the save system.

use std::collections::HashSet;
use std::path::Path;

use crate::error::CraftError;
use crate::game::batch::BatchSelector;
use crate::game::config::GameConfig;
use crate::game::inventory::Inventory;
use crate::game::items::{GameDatabase, ItemRef};
use crate::game::recipes::{Recipe, RecipeBook, RecipeCatalog};
use crate::save::{SaveData, SAVE_VERSION};
use crate::sim::clock::{Clock, PlayClock};
use crate::sim::craft::{CraftOrder, Harvest};
use crate::sim::station::{StationKey, StationRegistry};

/// One row of a category menu.
#[derive(Clone, Debug)]
pub struct CategoryEntry<'a> {
    pub recipe: &'a Recipe,
    /// Enough materials for a single craft.
    pub craftable: bool,
}

/// Everything a crafting menu needs to show for one category.
#[derive(Clone, Debug)]
pub struct CategoryView<'a> {
    pub category: u32,
    pub name: &'a str,
    pub max_batch: u32,
    pub speed_modifier: u32,
    pub entries: Vec<CategoryEntry<'a>>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StationStatus {
    Idle,
    Crafting {
        item: ItemRef,
        batch: u32,
        /// Fraction of time remaining.
        progress: f64,
        remaining: f64,
    },
    Ready {
        item: ItemRef,
        amount: u32,
    },
}

/// Owns the catalog, the station registry and the playtime clock for one
/// running game.
pub struct Session {
    db: GameDatabase,
    catalog: RecipeCatalog,
    registry: StationRegistry,
    clock: PlayClock,
    config: GameConfig,
    /// Stations already reported ready by `tick`.
    announced: HashSet<StationKey>,
}

impl Session {
    /// Start a new game.
    pub fn new(db: GameDatabase, config: GameConfig) -> Result<Self, CraftError> {
        let catalog = RecipeCatalog::build(&db)?;
        let clock = PlayClock::new().with_max_frame_time(config.timing.max_frame_time);
        Ok(Self {
            db,
            catalog,
            registry: StationRegistry::new(),
            clock,
            config,
            announced: HashSet::new(),
        })
    }

    /// Resume from save data. Dangling references are dropped and returned
    /// alongside the session; malformed game data is still fatal.
    pub fn from_save_data(
        db: GameDatabase,
        config: GameConfig,
        data: &SaveData,
    ) -> Result<(Self, Vec<CraftError>), CraftError> {
        let (catalog, mut dropped) = RecipeCatalog::build(&db)?.with_saved_books(&data.recipe_books);
        let (registry, dropped_jobs) = StationRegistry::restore(&data.stations, &catalog);
        dropped.extend(dropped_jobs);
        let clock = PlayClock::from_ticks(data.playtime_ticks)
            .with_max_frame_time(config.timing.max_frame_time);
        let session = Self {
            db,
            catalog,
            registry,
            clock,
            config,
            announced: HashSet::new(),
        };
        Ok((session, dropped))
    }

    pub fn to_save_data(&self) -> SaveData {
        SaveData {
            version: SAVE_VERSION,
            playtime_ticks: self.clock.ticks(),
            stations: self.registry.snapshot(),
            recipe_books: SaveData::recipe_books_of(&self.catalog),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), CraftError> {
        self.to_save_data().write_to(path)
    }

    pub fn load_from(
        db: GameDatabase,
        config: GameConfig,
        path: &Path,
    ) -> Result<(Self, Vec<CraftError>), CraftError> {
        let data = SaveData::read_from(path)?;
        Self::from_save_data(db, config, &data)
    }

    pub fn catalog(&self) -> &RecipeCatalog {
        &self.catalog
    }

    pub fn registry(&self) -> &StationRegistry {
        &self.registry
    }

    pub fn clock_mut(&mut self) -> &mut PlayClock {
        &mut self.clock
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }

    /// Feed `(map_id, station_id, note)` for every entity on a loaded map.
    /// Returns how many were manufacturers.
    pub fn discover_stations<'a>(
        &mut self,
        entities: impl IntoIterator<Item = (u32, u32, &'a str)>,
    ) -> usize {
        entities
            .into_iter()
            .filter(|&(map_id, station_id, note)| self.registry.discover(map_id, station_id, note))
            .count()
    }

    /// Advance playtime by one frame and report stations that finished since
    /// the previous call.
    pub fn tick(&mut self, frame_dt: f64) -> Vec<StationKey> {
        let ticks = self.clock.accumulate(frame_dt);
        if self.config.debug.log_ticks {
            log::trace!("tick: +{ticks} ({:.2}s)", self.clock.now());
        }
        let ready = self.registry.ready_stations(self.clock.now());
        let newly: Vec<StationKey> = ready
            .iter()
            .copied()
            .filter(|key| !self.announced.contains(key))
            .collect();
        for key in &newly {
            log::info!("station {key} finished crafting");
        }
        self.announced = ready.into_iter().collect();
        newly
    }

    fn book(&self, category: u32) -> Result<&RecipeBook, CraftError> {
        self.catalog
            .book_for_category(category)
            .ok_or(CraftError::UnknownCategory(category))
    }

    fn recipe_in(&self, category: u32, item: ItemRef) -> Result<&Recipe, CraftError> {
        self.catalog
            .items_in_category(category)
            .into_iter()
            .find(|recipe| recipe.owner == item)
            .ok_or(CraftError::NotInCategory { item, category })
    }

    pub fn category(&self, category: u32, inventory: &impl Inventory) -> Result<CategoryView<'_>, CraftError> {
        let book = self.book(category)?;
        let entries = self
            .catalog
            .items_in_category(category)
            .into_iter()
            .map(|recipe| CategoryEntry {
                recipe,
                craftable: self.config.debug.free_crafting || self.catalog.can_craft(recipe, inventory, 1),
            })
            .collect();
        Ok(CategoryView {
            category,
            name: &book.display_name,
            max_batch: book.max_batch,
            speed_modifier: book.speed_modifier,
            entries,
        })
    }

    pub fn batch_selector(&self, category: u32, item: ItemRef) -> Result<BatchSelector, CraftError> {
        let book = self.book(category)?;
        let recipe = self.recipe_in(category, item)?;
        Ok(BatchSelector::new(recipe, book))
    }

    /// Validate, take the materials and start the station's job. Nothing
    /// changes when any check fails.
    pub fn begin_craft(
        &mut self,
        key: StationKey,
        category: u32,
        item: ItemRef,
        batch: u32,
        inventory: &mut impl Inventory,
    ) -> Result<CraftOrder, CraftError> {
        let job = self.registry.job(key).ok_or(CraftError::UnknownStation(key))?;
        if let Some(active) = job.current() {
            return Err(CraftError::JobInProgress(active.item));
        }
        let book = self.book(category)?;
        let recipe = self.recipe_in(category, item)?;
        let order = CraftOrder::new(recipe, book, batch)?;

        if !self.config.debug.free_crafting {
            let needs: Vec<(ItemRef, u32)> = recipe
                .materials()
                .map(|(material, amount)| (material, amount.saturating_mul(batch)))
                .collect();
            for &(material, need) in &needs {
                let have = inventory.count(material);
                if have < need {
                    return Err(CraftError::InsufficientStock { item: material, have, need });
                }
            }
            for (material, need) in needs {
                inventory.consume(material, need)?;
            }
        }

        let now = self.clock.now();
        let job = self.registry.job_mut(key).ok_or(CraftError::UnknownStation(key))?;
        job.start(&order, now)?;
        log::info!(
            "Crafting {}x {} at {key}; completed in {} seconds",
            order.batch,
            self.db.name_of(order.item),
            order.duration
        );
        Ok(order)
    }

    /// Collect a finished job. `Ok(None)` while it is still running or when
    /// the station is idle.
    pub fn harvest(&mut self, key: StationKey, inventory: &mut impl Inventory) -> Result<Option<Harvest>, CraftError> {
        let now = self.clock.now();
        let job = self.registry.job_mut(key).ok_or(CraftError::UnknownStation(key))?;
        let harvest = job.harvest(&self.catalog, inventory, now)?;
        if let Some(h) = &harvest {
            self.announced.remove(&key);
            if self.config.crafting.harvest_messages {
                log::info!("{}", self.harvest_message(h));
            }
        }
        Ok(harvest)
    }

    /// Reset a station without output, e.g. an administrative reset.
    pub fn cancel(&mut self, key: StationKey) -> Result<(), CraftError> {
        let job = self.registry.job_mut(key).ok_or(CraftError::UnknownStation(key))?;
        job.cancel();
        self.announced.remove(&key);
        Ok(())
    }

    pub fn status(&self, key: StationKey) -> Result<StationStatus, CraftError> {
        let job = self.registry.job(key).ok_or(CraftError::UnknownStation(key))?;
        let now = self.clock.now();
        let Some(active) = job.current() else {
            return Ok(StationStatus::Idle);
        };
        if job.is_ready(now) {
            let per_cycle = self
                .catalog
                .recipe_for(active.item)
                .map_or(1, Recipe::yield_amount);
            return Ok(StationStatus::Ready {
                item: active.item,
                amount: active.batch.saturating_mul(per_cycle),
            });
        }
        Ok(StationStatus::Crafting {
            item: active.item,
            batch: active.batch,
            progress: job.progress(now),
            remaining: job.remaining(now),
        })
    }

    /// Player-facing text, e.g. "Obtained 3x Potions".
    pub fn harvest_message(&self, harvest: &Harvest) -> String {
        let plural = if harvest.amount > 1 { "s" } else { "" };
        format!("Obtained {}x {}{plural}", harvest.amount, self.db.name_of(harvest.item))
    }
}
