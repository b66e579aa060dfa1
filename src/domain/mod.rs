//! Reconciliation of the local catalog against the player market lives here.

pub mod app_state;
pub mod catalog;
pub mod entities;
pub mod error;
pub mod evaluation;

pub use app_state::{apply_market_potion_cost, AppState, EnrichmentTable, PotionCostUpdate};
pub use catalog::{flatten_catalog, shop_exclusion_ids, walk_tree, CatalogIndex, RawCatalog};
pub use entities::{
    CatalogItem, ComprehensiveData, ItemId, MarketItem, MarketSnapshot, ProfitResult, Settings,
    SkillBoost, UnderpricedResult,
};
pub use error::InputError;
pub use evaluation::{
    compute_profitable_items, compute_underpriced_items, net_profit, profitable_items,
    sell_value_with_bonuses, underpriced_items,
};
