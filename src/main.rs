use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use manufactory::game::config::GameConfig;
use manufactory::game::inventory::{Inventory, PartyInventory};
use manufactory::game::items::{GameDatabase, ItemRef};
use manufactory::sim::clock::SIM_DT;
use manufactory::Session;

/// Map entities and the party's starting stock, read from the same file as
/// the definitions.
#[derive(Debug, Default, Deserialize)]
struct MapData {
    #[serde(default)]
    entities: Vec<MapEntity>,
    #[serde(default)]
    party: Vec<Stack>,
}

#[derive(Debug, Deserialize)]
struct MapEntity {
    map_id: u32,
    id: u32,
    #[serde(default)]
    note: String,
}

#[derive(Debug, Deserialize)]
struct Stack {
    item: ItemRef,
    count: u32,
}

fn main() -> Result<()> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/sample_database.toml"));
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let db = GameDatabase::from_toml(&contents).context("Failed to parse definitions")?;
    let map: MapData = toml::from_str(&contents).context("Failed to parse map data")?;

    let config = GameConfig::load();
    let category = config.crafting.default_category;
    let dt = (config.timing.tick_interval_ms as f64 / 1000.0).max(SIM_DT);

    let mut session = Session::new(db.clone(), config.clone())?;
    let stations = session.discover_stations(
        map.entities.iter().map(|e| (e.map_id, e.id, e.note.as_str())),
    );
    let mut party = PartyInventory::new();
    for stack in &map.party {
        party.grant(stack.item, stack.count);
    }
    log::info!("{stations} stations, {} recipes", session.catalog().recipes().len());

    let Some((key, _)) = session.registry().iter().next() else {
        bail!("no <manufacturer> entities in {}", path.display());
    };

    let view = session.category(category, &party)?;
    log::info!("category {category}: {} (max batch {})", view.name, view.max_batch);
    for entry in &view.entries {
        let note = if entry.craftable { "" } else { " (missing materials)" };
        log::info!("  {}{note}", db.name_of(entry.recipe.owner));
    }
    let Some(item) = view.entries.iter().find(|e| e.craftable).map(|e| e.recipe.owner) else {
        bail!("nothing in category {category} can be crafted with the starting party");
    };

    let mut selector = session.batch_selector(category, item)?;
    while session.catalog().recipe_for(item).is_some_and(|r| {
        session.catalog().can_craft(r, &party, selector.amount() + 1)
    }) && selector.step_up(false)
    {}
    session.begin_craft(key, category, item, selector.amount(), &mut party)?;

    while session.tick(dt).is_empty() {}
    if let Some(harvest) = session.harvest(key, &mut party)? {
        println!("{}", session.harvest_message(&harvest));
    }

    let save_path = config
        .slot_path(0)
        .unwrap_or_else(|| std::env::temp_dir().join("manufactory-slot0.sav"));
    session.save_to(&save_path)?;
    let (loaded, dropped) = Session::load_from(db, config, &save_path)?;
    for err in &dropped {
        log::warn!("{err}");
    }
    println!(
        "reloaded at {:.1}s playtime, {} busy stations",
        loaded.now(),
        loaded.registry().snapshot().len()
    );
    Ok(())
}
