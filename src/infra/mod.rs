//! Collaborators that acquire the raw inputs: the market API and local files.

pub mod files;
pub mod market;

pub use files::{load_catalog, load_snapshot, LoadError};
pub use market::{parse_snapshot, snapshot_from_wire, MarketClient, MarketClientError};
