use thiserror::Error;

use crate::game::items::ItemRef;
use crate::sim::station::StationKey;

/// What went wrong on a single annotation line.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("`{field}` is not a non-negative integer: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("`{directive}` is missing its {field}")]
    MissingField { directive: String, field: &'static str },
    #[error("unknown reference table `{0}` (expected i, w or a)")]
    UnknownTable(String),
    #[error("`{field}` must be at least 1")]
    Zero { field: &'static str },
}

/// A malformed `<recipe>` or `<recipe_book>` block. Aborts catalog loading.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{owner}, line {line}: {kind}")]
pub struct ParseError {
    /// Definition whose annotation failed to parse.
    pub owner: ItemRef,
    /// 1-based line number within the whole annotation, not just the block.
    pub line: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Error)]
pub enum CraftError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("not enough {item}: have {have}, need {need}")]
    InsufficientStock { item: ItemRef, have: u32, need: u32 },
    #[error("{0} has no recipe")]
    DanglingRecipeReference(ItemRef),
    #[error("batch amount {amount} outside 1..={max}")]
    InvalidBatchAmount { amount: u32, max: u32 },
    #[error("already crafting {0}")]
    JobInProgress(ItemRef),
    #[error("station {0} is not a manufacturer")]
    UnknownStation(StationKey),
    #[error("no recipe book for category {0}")]
    UnknownCategory(u32),
    #[error("{item} is not listed in category {category}")]
    NotInCategory { item: ItemRef, category: u32 },
    #[error("save file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("save file is corrupt: {0}")]
    Encoding(#[from] bincode::Error),
}
