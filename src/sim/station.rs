use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::craft::{ActiveCraft, CraftJob};
use crate::error::CraftError;
use crate::game::notetag::is_manufacturer;
use crate::game::recipes::RecipeCatalog;

/// Identity of a station that stays valid across reloads: the map it sits
/// on and its entity id within that map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StationKey {
    pub map_id: u32,
    pub station_id: u32,
}

impl StationKey {
    pub const fn new(map_id: u32, station_id: u32) -> Self {
        Self { map_id, station_id }
    }
}

impl fmt::Display for StationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.map_id, self.station_id)
    }
}

/// Persisted form of one busy station.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StationRecord {
    pub key: StationKey,
    pub craft: ActiveCraft,
}

/// Every known manufacturing station and its job. Owned by the session and
/// handed to whoever needs it; there is no global instance.
#[derive(Clone, Debug, Default)]
pub struct StationRegistry {
    stations: BTreeMap<StationKey, CraftJob>,
}

impl StationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a map entity if its annotation marks it as a manufacturer.
    /// Existing entries keep their job.
    pub fn discover(&mut self, map_id: u32, station_id: u32, note: &str) -> bool {
        if !is_manufacturer(note) {
            return false;
        }
        let key = StationKey::new(map_id, station_id);
        self.stations.entry(key).or_insert_with(|| {
            log::debug!("station {key} registered");
            CraftJob::new()
        });
        true
    }

    pub fn contains(&self, key: StationKey) -> bool {
        self.stations.contains_key(&key)
    }

    pub fn job(&self, key: StationKey) -> Option<&CraftJob> {
        self.stations.get(&key)
    }

    pub fn job_mut(&mut self, key: StationKey) -> Option<&mut CraftJob> {
        self.stations.get_mut(&key)
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StationKey, &CraftJob)> {
        self.stations.iter().map(|(&key, job)| (key, job))
    }

    /// Stations whose job has finished and awaits harvest.
    pub fn ready_stations(&self, now: f64) -> Vec<StationKey> {
        self.iter()
            .filter(|(_, job)| !job.is_idle() && job.is_ready(now))
            .map(|(key, _)| key)
            .collect()
    }

    /// Busy stations, for saving. Idle stations are rediscovered from map
    /// data on load.
    pub fn snapshot(&self) -> Vec<StationRecord> {
        self.iter()
            .filter_map(|(key, job)| job.current().map(|&craft| StationRecord { key, craft }))
            .collect()
    }

    /// Rebuild from saved records. Records whose item no longer has a recipe
    /// are dropped and reported.
    pub fn restore(records: &[StationRecord], catalog: &RecipeCatalog) -> (Self, Vec<CraftError>) {
        let mut registry = Self::new();
        let mut dropped = Vec::new();
        for record in records {
            if catalog.recipe_for(record.craft.item).is_none() {
                log::warn!(
                    "station {} was crafting {}, which has no recipe; dropping the job",
                    record.key,
                    record.craft.item
                );
                dropped.push(CraftError::DanglingRecipeReference(record.craft.item));
                registry.stations.insert(record.key, CraftJob::new());
                continue;
            }
            registry.stations.insert(record.key, CraftJob::resume(record.craft));
        }
        (registry, dropped)
    }
}
