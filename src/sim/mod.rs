pub mod clock;
pub mod craft;
pub mod station;
