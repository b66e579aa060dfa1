use std::{cmp::Ordering, collections::HashMap};

use super::catalog::{CatalogIndex, RawCatalog};
use super::entities::{
    ItemId, MarketItem, MarketSnapshot, ProfitResult, Settings, UnderpricedResult,
};
use super::error::InputError;

/// Multiplier from the in-game sale bonus.
pub const GAME_SALE_BONUS: f64 = 1.10;
/// Multiplier from the negotiation potion.
pub const POTION_BONUS: f64 = 1.05;

/// Gold received from the game for one unit, bonuses compounded then floored.
pub fn sell_value_with_bonuses(base_value: f64, settings: &Settings) -> f64 {
    let mut value = base_value;
    if settings.game_sale_bonus {
        value *= GAME_SALE_BONUS;
    }
    if settings.potion_bonus {
        value *= POTION_BONUS;
    }
    value.floor()
}

/// Deducts the potion cost once, and only when the potion is in use.
pub fn net_profit(gross_profit: f64, settings: &Settings) -> f64 {
    if settings.potion_bonus {
        gross_profit - settings.potion_cost
    } else {
        gross_profit
    }
}

/// Items worth buying at the lowest ask and selling to the game, best batch first.
pub fn profitable_items(
    index: &CatalogIndex,
    snapshot: &MarketSnapshot,
    settings: &Settings,
) -> Vec<ProfitResult> {
    let market: HashMap<ItemId, &MarketItem> =
        snapshot.items.iter().map(|item| (item.id, item)).collect();

    let mut results: Vec<ProfitResult> = index
        .items()
        .iter()
        .filter(|item| !index.is_shop_item(item.id))
        .filter_map(|item| {
            let market_item = market.get(&item.id)?;
            if market_item.sell_price <= 0.0
                || item.base_value <= 0.0
                || market_item.sell_volume == 0
            {
                return None;
            }

            let game_value = sell_value_with_bonuses(item.base_value, settings);
            let profit = game_value - market_item.sell_price;
            let total_profit = net_profit(profit * market_item.sell_volume as f64, settings);
            let profit_percentage = profit / market_item.sell_price * 100.0;

            if settings.hide_non_profitable && total_profit <= 0.0 {
                return None;
            }
            if settings.hide_sub_profitable && total_profit < settings.min_profit {
                return None;
            }

            Some(ProfitResult {
                id: item.id,
                name: item.name.clone(),
                category: item.category.clone(),
                game_value,
                market_sell_price: market_item.sell_price,
                profit,
                profit_percentage,
                item_quantity: market_item.sell_volume,
                total_profit,
            })
        })
        .collect();

    results.sort_by(|a, b| {
        b.total_profit
            .partial_cmp(&a.total_profit)
            .unwrap_or(Ordering::Equal)
    });
    results
}

/// Market items whose lowest ask is under `underpriced_threshold` percent of
/// their daily average, most underpriced first.
pub fn underpriced_items(
    snapshot: &MarketSnapshot,
    index: &CatalogIndex,
    settings: &Settings,
) -> Vec<UnderpricedResult> {
    let mut results: Vec<UnderpricedResult> = snapshot
        .items
        .iter()
        .filter(|market_item| !index.is_shop_item(market_item.id))
        .filter_map(|market_item| {
            let item = index.get(market_item.id)?;
            if market_item.daily_average_price <= 0.0 || market_item.sell_price <= 0.0 {
                return None;
            }

            let price_ratio = market_item.sell_price / market_item.daily_average_price * 100.0;
            if price_ratio >= settings.underpriced_threshold {
                return None;
            }

            Some(UnderpricedResult {
                id: market_item.id,
                name: item.name.clone(),
                category: item.category.clone(),
                daily_average_price: market_item.daily_average_price,
                market_buy_price: market_item.sell_price,
                price_ratio,
                price_difference: market_item.daily_average_price - market_item.sell_price,
                sell_volume: market_item.sell_volume,
                comprehensive_data: None,
            })
        })
        .collect();

    results.sort_by(|a, b| {
        a.price_ratio
            .partial_cmp(&b.price_ratio)
            .unwrap_or(Ordering::Equal)
    });
    results
}

/// Profitable items straight from the raw catalog.
pub fn compute_profitable_items(
    catalog: &RawCatalog,
    snapshot: &MarketSnapshot,
    settings: &Settings,
) -> Result<Vec<ProfitResult>, InputError> {
    let index = CatalogIndex::build(catalog)?;
    Ok(profitable_items(&index, snapshot, settings))
}

/// Underpriced items straight from the raw catalog.
pub fn compute_underpriced_items(
    snapshot: &MarketSnapshot,
    catalog: &RawCatalog,
    settings: &Settings,
) -> Result<Vec<UnderpricedResult>, InputError> {
    let index = CatalogIndex::build(catalog)?;
    Ok(underpriced_items(snapshot, &index, settings))
}
