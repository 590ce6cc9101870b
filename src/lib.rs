//! Timed crafting at map-placed manufacturer stations: recipe annotations,
//! recipe books, per-station craft jobs and their persistence.

pub mod error;
pub mod game;
pub mod save;
pub mod session;
pub mod sim;

pub use error::{CraftError, ParseError};
pub use session::Session;
