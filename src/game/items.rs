use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which definition table an id refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Item,
    Weapon,
    Armor,
}

impl ItemKind {
    pub fn all() -> &'static [ItemKind] {
        &[Self::Item, Self::Weapon, Self::Armor]
    }

    /// Annotation letter used for this table (`i`, `w`, `a`).
    pub fn letter(self) -> char {
        match self {
            Self::Item => 'i',
            Self::Weapon => 'w',
            Self::Armor => 'a',
        }
    }

    pub fn from_letter(letter: &str) -> Option<Self> {
        match letter {
            "i" | "I" => Some(Self::Item),
            "w" | "W" => Some(Self::Weapon),
            "a" | "A" => Some(Self::Armor),
            _ => None,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Weapon => "weapon",
            Self::Armor => "armor",
        }
    }
}

/// Stable reference to a definition: table + numeric id. Survives catalog
/// rebuilds, unlike references into the catalog itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    pub kind: ItemKind,
    pub id: u32,
}

impl ItemRef {
    pub const fn new(kind: ItemKind, id: u32) -> Self {
        Self { kind, id }
    }

    pub const fn item(id: u32) -> Self {
        Self::new(ItemKind::Item, id)
    }

    pub const fn weapon(id: u32) -> Self {
        Self::new(ItemKind::Weapon, id)
    }

    pub const fn armor(id: u32) -> Self {
        Self::new(ItemKind::Armor, id)
    }
}

/// Compact `i12` / `w3` / `a2` form used in save files.
impl fmt::Display for ItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.letter(), self.id)
    }
}

impl FromStr for ItemRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (letter, id) = s.split_at(s.chars().next().map_or(0, char::len_utf8));
        let kind = ItemKind::from_letter(letter).ok_or_else(|| format!("bad item table in {s:?}"))?;
        let id = id.parse().map_err(|_| format!("bad item id in {s:?}"))?;
        Ok(Self::new(kind, id))
    }
}

/// One entry of a definition table. `note` is the free-text annotation field
/// that carries `<recipe>` / `<recipe_book>` blocks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub note: String,
}

/// All three definition tables, as loaded from game data.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GameDatabase {
    #[serde(default)]
    pub items: Vec<ItemDef>,
    #[serde(default)]
    pub weapons: Vec<ItemDef>,
    #[serde(default)]
    pub armors: Vec<ItemDef>,
}

impl GameDatabase {
    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn table(&self, kind: ItemKind) -> &[ItemDef] {
        match kind {
            ItemKind::Item => &self.items,
            ItemKind::Weapon => &self.weapons,
            ItemKind::Armor => &self.armors,
        }
    }

    pub fn get(&self, item: ItemRef) -> Option<&ItemDef> {
        self.table(item.kind).iter().find(|def| def.id == item.id)
    }

    /// Display name, falling back to the compact reference.
    pub fn name_of(&self, item: ItemRef) -> String {
        self.get(item)
            .map(|def| def.name.clone())
            .unwrap_or_else(|| item.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_ref_display_roundtrip() {
        for item in [ItemRef::item(12), ItemRef::weapon(3), ItemRef::armor(0)] {
            let text = item.to_string();
            assert_eq!(text.parse::<ItemRef>().unwrap(), item);
        }
        assert_eq!(ItemRef::weapon(3).to_string(), "w3");
    }

    #[test]
    fn test_item_ref_rejects_garbage() {
        assert!("x4".parse::<ItemRef>().is_err());
        assert!("i".parse::<ItemRef>().is_err());
        assert!("iNaN".parse::<ItemRef>().is_err());
        assert!("".parse::<ItemRef>().is_err());
    }

    #[test]
    fn test_database_from_toml() {
        let db = GameDatabase::from_toml(
            r#"
            [[items]]
            id = 1
            name = "Herb"

            [[weapons]]
            id = 2
            name = "Sword"
            note = "<recipe>\ni: 1, 3\n</recipe>"
            "#,
        )
        .unwrap();
        assert_eq!(db.items.len(), 1);
        assert!(db.armors.is_empty());
        assert_eq!(db.name_of(ItemRef::weapon(2)), "Sword");
        assert!(db.get(ItemRef::weapon(2)).unwrap().note.contains("<recipe>"));
        assert_eq!(db.name_of(ItemRef::armor(9)), "a9");
    }

    #[test]
    fn test_letters() {
        for &kind in ItemKind::all() {
            let letter = kind.letter().to_string();
            assert_eq!(ItemKind::from_letter(&letter), Some(kind));
        }
        assert_eq!(ItemKind::from_letter("W"), Some(ItemKind::Weapon));
        assert_eq!(ItemKind::from_letter("t"), None);
    }
}
