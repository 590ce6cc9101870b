pub mod batch;
pub mod config;
pub mod inventory;
pub mod items;
pub mod notetag;
pub mod recipes;
