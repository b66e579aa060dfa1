//! Finds Idle Clans items that are worth buying on the player market and
//! selling to the game, and items trading well below their daily average.

pub mod domain;
pub mod infra;
pub mod util;
