//! Extraction of crafting data from definition annotations.
//!
//! Recognised blocks:
//!
//! ```text
//! <recipe>
//! i: 1, 5      # consumes 5 of item #1 per craft
//! w: 3, 2      # consumes 2 of weapon #3
//! t: 20        # 20 seconds per craft
//! y: 2         # produces 2 per craft
//! </recipe>
//!
//! <recipe_book>
//! category: 0
//! catname: Crafting Table
//! m: 5         # up to 5 crafts per batch
//! s: 80        # speed modifier, percent
//! i: 1, 3, 4
//! w: 3
//! </recipe_book>
//! ```
//!
//! `catname` must sit on the line directly after `category`; a book that
//! breaks this is skipped with a warning rather than guessed at.

use std::sync::OnceLock;

use regex::Regex;

use super::items::{ItemKind, ItemRef};
use super::recipes::{IngredientKind, Recipe, RecipeBook};
use crate::error::{ParseError, ParseErrorKind};

fn recipe_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<recipe>(.*?)</recipe>").expect("static regex"))
}

fn book_block() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<recipe_book>(.*?)</recipe_book>").expect("static regex"))
}

fn manufacturer_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<manufacturer[^>]*>").expect("static regex"))
}

fn directive_line() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([A-Za-z_]+)\s*:\s*(.*)$").expect("static regex"))
}

/// A `key: value` line with the key lowercased and any trailing comment
/// removed.
#[derive(Debug)]
struct Directive<'a> {
    line: usize,
    key: String,
    value: &'a str,
}

/// Content of the first `<tag>...</tag>` block plus the annotation line
/// number its content starts on.
fn block<'a>(note: &'a str, re: &Regex) -> Option<(&'a str, usize)> {
    let content = re.captures(note)?.get(1)?;
    let first_line = note[..content.start()].matches('\n').count() + 1;
    Some((content.as_str(), first_line))
}

fn directives(content: &str, first_line: usize) -> Vec<Option<Directive<'_>>> {
    content
        .lines()
        .enumerate()
        .map(|(offset, raw)| {
            let caps = directive_line().captures(raw.trim())?;
            let key = caps.get(1)?.as_str().to_ascii_lowercase();
            let value = strip_comment(&key, caps.get(2)?.as_str());
            Some(Directive { line: first_line + offset, key, value })
        })
        .collect()
}

/// Numeric directives end at the first `#`. Display names only treat a `#`
/// that starts a word as a comment, so `C# Workshop` survives.
fn strip_comment<'a>(key: &str, value: &'a str) -> &'a str {
    let end = if key == "catname" {
        value
            .match_indices('#')
            .map(|(i, _)| i)
            .find(|&i| i == 0 || value[..i].ends_with(char::is_whitespace))
    } else {
        value.find('#')
    };
    value[..end.unwrap_or(value.len())].trim()
}

fn number(value: &str, field: &'static str) -> Result<u32, ParseErrorKind> {
    value.trim().parse().map_err(|_| ParseErrorKind::InvalidNumber {
        field,
        value: value.trim().to_string(),
    })
}

fn fields(value: &str) -> Vec<&str> {
    if value.is_empty() {
        return Vec::new();
    }
    value.split(',').map(str::trim).collect()
}

fn is_numeric_list(value: &str) -> bool {
    let parts = fields(value);
    !parts.is_empty() && parts.iter().all(|p| p.parse::<u32>().is_ok())
}

fn required<'a>(parts: &[&'a str], idx: usize, directive: &str, field: &'static str) -> Result<&'a str, ParseErrorKind> {
    parts.get(idx).copied().ok_or_else(|| ParseErrorKind::MissingField {
        directive: directive.to_string(),
        field,
    })
}

/// Parse the `<recipe>` block of a definition. `Ok(None)` if there is none.
pub fn parse_recipe(owner: ItemRef, note: &str) -> Result<Option<Recipe>, ParseError> {
    let Some((content, first_line)) = block(note, recipe_block()) else {
        return Ok(None);
    };
    let mut recipe = Recipe::new(owner);

    for d in directives(content, first_line).into_iter().flatten() {
        let at = |kind| ParseError { owner, line: d.line, kind };
        let parts = fields(d.value);
        match d.key.as_str() {
            key @ ("i" | "w" | "a") => {
                let Some(kind) = ItemKind::from_letter(key) else {
                    continue;
                };
                let id = required(&parts, 0, key, "id").and_then(|v| number(v, "id")).map_err(at)?;
                let amount = required(&parts, 1, key, "amount")
                    .and_then(|v| number(v, "amount"))
                    .map_err(at)?;
                recipe.set(IngredientKind::Material(ItemRef::new(kind, id)), amount);
            }
            "t" => {
                let secs = required(&parts, 0, "t", "seconds")
                    .and_then(|v| number(v, "seconds"))
                    .map_err(at)?;
                recipe.set(IngredientKind::Time, secs);
            }
            "y" => {
                let amount = required(&parts, 0, "y", "amount")
                    .and_then(|v| number(v, "yield"))
                    .map_err(at)?;
                if amount == 0 {
                    return Err(at(ParseErrorKind::Zero { field: "yield" }));
                }
                recipe.set(IngredientKind::Yield, amount);
            }
            key if key.len() == 1 && parts.len() == 2 && is_numeric_list(d.value) => {
                return Err(at(ParseErrorKind::UnknownTable(key.to_string())));
            }
            _ => {}
        }
    }

    Ok(Some(recipe))
}

/// Parse the `<recipe_book>` block of an item definition. References are
/// returned unresolved; the catalog drops the ones without a recipe.
pub fn parse_recipe_book(owner_id: u32, note: &str) -> Result<Option<RecipeBook>, ParseError> {
    let owner = ItemRef::item(owner_id);
    let Some((content, first_line)) = block(note, book_block()) else {
        return Ok(None);
    };
    let lines = directives(content, first_line);

    let Some(cat_idx) = lines
        .iter()
        .position(|d| d.as_ref().is_some_and(|d| d.key == "category"))
    else {
        log::warn!("recipe book on {owner} has no `category` line, skipping");
        return Ok(None);
    };
    let Some(category_line) = lines[cat_idx].as_ref() else {
        return Ok(None);
    };
    let category = number(category_line.value, "category").map_err(|kind| ParseError {
        owner,
        line: category_line.line,
        kind,
    })?;
    let display_name = match lines.get(cat_idx + 1) {
        Some(Some(d)) if d.key == "catname" => d.value.to_string(),
        _ => {
            log::warn!(
                "recipe book on {owner}: `catname` must directly follow `category`, skipping"
            );
            return Ok(None);
        }
    };

    let mut book = RecipeBook::new(owner_id, category, display_name);
    for (idx, d) in lines.iter().enumerate() {
        let Some(d) = d else { continue };
        if idx == cat_idx || idx == cat_idx + 1 {
            continue;
        }
        let at = |kind| ParseError { owner, line: d.line, kind };
        match d.key.as_str() {
            "m" => {
                let max = number(d.value, "max batch").map_err(at)?;
                if max == 0 {
                    return Err(at(ParseErrorKind::Zero { field: "max batch" }));
                }
                book.max_batch = max;
            }
            "s" => {
                book.speed_modifier = number(d.value, "speed modifier").map_err(at)?;
            }
            key @ ("i" | "w" | "a") => {
                let Some(kind) = ItemKind::from_letter(key) else {
                    continue;
                };
                let parts = fields(d.value);
                if parts.is_empty() {
                    return Err(at(ParseErrorKind::MissingField {
                        directive: key.to_string(),
                        field: "id",
                    }));
                }
                for part in parts {
                    let id = number(part, "id").map_err(at)?;
                    book.recipes.push(ItemRef::new(kind, id));
                }
            }
            key if key.len() == 1 && is_numeric_list(d.value) => {
                return Err(at(ParseErrorKind::UnknownTable(key.to_string())));
            }
            _ => {}
        }
    }

    Ok(Some(book))
}

/// Whether a map entity's annotation marks it as a crafting station.
pub fn is_manufacturer(note: &str) -> bool {
    manufacturer_tag().is_match(note)
}
