//! Save-file contents for the crafting system.
//!
//! Only value keys are written: station keys, item references and times.
//! After loading, everything is resolved against a freshly built catalog.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CraftError;
use crate::game::items::ItemRef;
use crate::game::recipes::RecipeCatalog;
use crate::sim::station::StationRecord;

/// Bumped whenever the layout below changes.
pub const SAVE_VERSION: u32 = 1;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub playtime_ticks: u64,
    pub stations: Vec<StationRecord>,
    /// Book owner item id -> its recipe list.
    pub recipe_books: BTreeMap<u32, Vec<ItemRef>>,
}

impl SaveData {
    pub fn recipe_books_of(catalog: &RecipeCatalog) -> BTreeMap<u32, Vec<ItemRef>> {
        catalog
            .books()
            .iter()
            .map(|book| (book.owner, book.recipes.clone()))
            .collect()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CraftError> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CraftError> {
        let data: Self = bincode::deserialize(bytes)?;
        if data.version != SAVE_VERSION {
            log::warn!(
                "save file version {} differs from {SAVE_VERSION}, loading anyway",
                data.version
            );
        }
        Ok(data)
    }

    /// Write via a temporary file so a crash never leaves a truncated save.
    pub fn write_to(&self, path: &Path) -> Result<(), CraftError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, self.to_bytes()?)?;
        fs::rename(&tmp, path)?;
        log::info!("saved {} busy stations to {}", self.stations.len(), path.display());
        Ok(())
    }

    pub fn read_from(path: &Path) -> Result<Self, CraftError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}
