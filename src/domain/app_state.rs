use std::collections::HashMap;

use super::catalog::{CatalogIndex, RawCatalog};
use super::entities::{
    ComprehensiveData, ItemId, MarketSnapshot, ProfitResult, Settings, UnderpricedResult,
};
use super::error::InputError;
use super::evaluation::{profitable_items, underpriced_items};

/// Market id of the negotiation potion behind the +5% bonus.
pub const NEGOTIATION_POTION_ID: ItemId = 409;

/// What happened to `potion_cost` after a new snapshot arrived.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PotionCostUpdate {
    /// Followed the potion's daily average.
    Updated(f64),
    /// The user pinned the cost.
    Overridden,
    /// No usable potion price in the snapshot.
    Unchanged,
}

/// Returns settings with the potion cost tracking the market, unless pinned.
pub fn apply_market_potion_cost(
    settings: &Settings,
    snapshot: &MarketSnapshot,
) -> (Settings, PotionCostUpdate) {
    if settings.override_potion_cost {
        return (settings.clone(), PotionCostUpdate::Overridden);
    }

    let market_price = snapshot
        .find(NEGOTIATION_POTION_ID)
        .map(|potion| potion.daily_average_price)
        .filter(|price| *price > 0.0);

    match market_price {
        Some(price) => {
            let cost = price.round();
            let updated = Settings {
                potion_cost: cost,
                ..settings.clone()
            };
            (updated, PotionCostUpdate::Updated(cost))
        }
        None => (settings.clone(), PotionCostUpdate::Unchanged),
    }
}

/// Extended price history fetched per item, kept apart from computed results.
#[derive(Clone, Debug, Default)]
pub struct EnrichmentTable {
    entries: HashMap<ItemId, ComprehensiveData>,
}

impl EnrichmentTable {
    pub fn insert(&mut self, id: ItemId, data: ComprehensiveData) {
        self.entries.insert(id, data);
    }

    pub fn get(&self, id: ItemId) -> Option<&ComprehensiveData> {
        self.entries.get(&id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Copies of `results` with `comprehensive_data` filled where known.
    pub fn merge_into(&self, results: &[UnderpricedResult]) -> Vec<UnderpricedResult> {
        results
            .iter()
            .map(|result| UnderpricedResult {
                comprehensive_data: self
                    .get(result.id)
                    .cloned()
                    .or_else(|| result.comprehensive_data.clone()),
                ..result.clone()
            })
            .collect()
    }
}

/// Inputs of the current session. Results are always recomputed, never stored.
#[derive(Clone, Debug, Default)]
pub struct AppState {
    pub settings: Settings,
    catalog: Option<RawCatalog>,
    index: CatalogIndex,
    snapshot: MarketSnapshot,
    pub enrichment: EnrichmentTable,
}

impl AppState {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Replaces both raw inputs and lets the potion cost follow the new prices.
    /// On a malformed catalog the previous state is left untouched.
    pub fn load(
        &mut self,
        catalog: RawCatalog,
        snapshot: MarketSnapshot,
    ) -> Result<PotionCostUpdate, InputError> {
        let index = CatalogIndex::build(&catalog)?;
        let (settings, update) = apply_market_potion_cost(&self.settings, &snapshot);

        match update {
            PotionCostUpdate::Updated(cost) => {
                tracing::info!("[settings] potion cost updated to {cost} from market data")
            }
            PotionCostUpdate::Overridden => {
                tracing::info!("[settings] keeping manual potion cost {}", settings.potion_cost)
            }
            PotionCostUpdate::Unchanged => {}
        }

        self.catalog = Some(catalog);
        self.index = index;
        self.snapshot = snapshot;
        self.settings = settings;
        self.enrichment.clear();
        Ok(update)
    }

    pub fn set_settings(&mut self, settings: Settings) {
        self.settings = settings;
    }

    pub fn is_loaded(&self) -> bool {
        self.catalog.is_some()
    }

    pub fn snapshot(&self) -> &MarketSnapshot {
        &self.snapshot
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    pub fn category_name(&self, category: &str) -> String {
        self.catalog
            .as_ref()
            .map(|catalog| catalog.category_name(category))
            .unwrap_or_else(|| category.to_string())
    }

    pub fn profitable_items(&self) -> Vec<ProfitResult> {
        profitable_items(&self.index, &self.snapshot, &self.settings)
    }

    pub fn underpriced_items(&self) -> Vec<UnderpricedResult> {
        underpriced_items(&self.snapshot, &self.index, &self.settings)
    }

    pub fn underpriced_with_enrichment(&self) -> Vec<UnderpricedResult> {
        self.enrichment.merge_into(&self.underpriced_items())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::MarketItem;
    use serde_json::json;

    fn potion(daily_average_price: f64) -> MarketItem {
        MarketItem {
            id: NEGOTIATION_POTION_ID,
            name: "negotiation_potion".to_string(),
            buy_price: 0.0,
            sell_price: 0.0,
            sell_volume: 0,
            buy_volume: 0,
            daily_average_price,
        }
    }

    fn raw_catalog() -> RawCatalog {
        RawCatalog::new(json!({
            "Items": { "gems": [ { "id": 1, "name": "ruby", "value": 1000 } ] },
            "References": { "categories": { "gems": "Gems" } }
        }))
    }

    fn gem(sell_price: f64) -> MarketItem {
        MarketItem {
            id: 1,
            name: "item_1".to_string(),
            buy_price: 0.0,
            sell_price,
            sell_volume: 10,
            buy_volume: 0,
            daily_average_price: 1000.0,
        }
    }

    #[test]
    fn potion_cost_follows_market_average() {
        let snapshot = MarketSnapshot::new(vec![potion(4321.6)]);
        let (settings, update) = apply_market_potion_cost(&Settings::default(), &snapshot);
        assert_eq!(update, PotionCostUpdate::Updated(4322.0));
        assert_eq!(settings.potion_cost, 4322.0);
    }

    #[test]
    fn pinned_potion_cost_is_kept() {
        let pinned = Settings {
            override_potion_cost: true,
            potion_cost: 100.0,
            ..Settings::default()
        };
        let snapshot = MarketSnapshot::new(vec![potion(4321.0)]);
        let (settings, update) = apply_market_potion_cost(&pinned, &snapshot);
        assert_eq!(update, PotionCostUpdate::Overridden);
        assert_eq!(settings.potion_cost, 100.0);
    }

    #[test]
    fn missing_potion_price_leaves_cost_alone() {
        let snapshot = MarketSnapshot::new(vec![potion(0.0)]);
        let (settings, update) = apply_market_potion_cost(&Settings::default(), &snapshot);
        assert_eq!(update, PotionCostUpdate::Unchanged);
        assert_eq!(settings.potion_cost, Settings::default().potion_cost);
    }

    #[test]
    fn enrichment_merges_without_touching_results() {
        let mut state = AppState::new(Settings::default());
        state
            .load(raw_catalog(), MarketSnapshot::new(vec![gem(200.0)]))
            .unwrap();

        let plain = state.underpriced_items();
        assert_eq!(plain.len(), 1);

        state.enrichment.insert(
            1,
            ComprehensiveData {
                average_price_7_days: Some(950.0),
                trade_volume_7_days: 40,
                ..ComprehensiveData::default()
            },
        );

        let merged = state.underpriced_with_enrichment();
        assert_eq!(
            merged[0]
                .comprehensive_data
                .as_ref()
                .and_then(|data| data.average_price_7_days),
            Some(950.0)
        );
        assert!(state.underpriced_items()[0].comprehensive_data.is_none());
    }

    #[test]
    fn settings_change_recomputes_results() {
        let mut state = AppState::new(Settings {
            game_sale_bonus: false,
            hide_non_profitable: true,
            ..Settings::default()
        });
        state
            .load(raw_catalog(), MarketSnapshot::new(vec![gem(1050.0)]))
            .unwrap();
        assert!(state.profitable_items().is_empty());

        state.set_settings(Settings {
            game_sale_bonus: true,
            ..state.settings.clone()
        });
        let results = state.profitable_items();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].total_profit, 500.0);
        assert_eq!(state.category_name(&results[0].category), "Gems");
    }

    #[test]
    fn bad_catalog_keeps_previous_state() {
        let mut state = AppState::default();
        state
            .load(raw_catalog(), MarketSnapshot::new(vec![gem(200.0)]))
            .unwrap();

        let err = state
            .load(RawCatalog::new(json!({})), MarketSnapshot::default())
            .unwrap_err();
        assert_eq!(err, InputError::MissingItemsRoot);
        assert!(state.is_loaded());
        assert_eq!(state.snapshot().len(), 1);
    }
}
