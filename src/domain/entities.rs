use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::InputError;

/// Numeric item identifier shared by the catalog and the player market.
pub type ItemId = i64;

/// Skill bonus granted by equipment. Carried through from the catalog untouched.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillBoost {
    pub skill: i64,
    pub percentage: f64,
}

/// One entry of the flattened local catalog.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: ItemId,
    pub name: String,
    /// Gold received when selling the item to the game.
    pub base_value: f64,
    /// Underscore-joined key path leading to the array holding the item.
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slot: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skill_boost: Option<SkillBoost>,
}

/// Placeholder name used when a record carries none.
pub fn synthetic_name(id: ItemId) -> String {
    format!("item_{id}")
}

/// Live player-market figures for one item. Zero means "no data".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketItem {
    pub id: ItemId,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "amount_from_json")]
    pub buy_price: f64,
    /// Lowest current ask.
    #[serde(default, deserialize_with = "amount_from_json")]
    pub sell_price: f64,
    #[serde(default, deserialize_with = "volume_from_json")]
    pub sell_volume: u64,
    #[serde(default, deserialize_with = "volume_from_json")]
    pub buy_volume: u64,
    #[serde(default, deserialize_with = "amount_from_json")]
    pub daily_average_price: f64,
}

/// A fully materialized market cross-section.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub items: Vec<MarketItem>,
    /// RFC 3339 fetch time, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetched_at: Option<String>,
}

impl MarketSnapshot {
    pub fn new(items: Vec<MarketItem>) -> Self {
        Self {
            items,
            fetched_at: None,
        }
    }

    pub fn with_fetched_at(mut self, fetched_at: impl Into<String>) -> Self {
        self.fetched_at = Some(fetched_at.into());
        self
    }

    /// Builds a snapshot from a JSON array of `MarketItem`-shaped records.
    ///
    /// Anything other than an array is rejected. Individual records that fail
    /// to parse are dropped.
    pub fn from_value(value: Value) -> Result<Self, InputError> {
        let Value::Array(records) = value else {
            return Err(InputError::SnapshotNotSequence);
        };

        let total = records.len();
        let items: Vec<MarketItem> = records
            .into_iter()
            .filter_map(|record| serde_json::from_value::<MarketItem>(record).ok())
            .map(|mut item| {
                if item.name.is_empty() {
                    item.name = synthetic_name(item.id);
                }
                item
            })
            .collect();

        if items.len() < total {
            tracing::debug!(
                "[market] skipped {} malformed snapshot records",
                total - items.len()
            );
        }

        Ok(Self::new(items))
    }

    pub fn find(&self, id: ItemId) -> Option<&MarketItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// User-tunable knobs for both reconcilers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// +10% sale value.
    pub game_sale_bonus: bool,
    /// +5% sale value, paid for with `potion_cost` once per batch.
    pub potion_bonus: bool,
    pub potion_cost: f64,
    /// Keeps `potion_cost` from following the market price of the potion.
    pub override_potion_cost: bool,
    pub min_profit: f64,
    pub hide_non_profitable: bool,
    pub hide_sub_profitable: bool,
    /// Percent of the daily average below which an item counts as underpriced.
    pub underpriced_threshold: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            game_sale_bonus: true,
            potion_bonus: false,
            potion_cost: 5000.0,
            override_potion_cost: false,
            min_profit: 1000.0,
            hide_non_profitable: true,
            hide_sub_profitable: false,
            underpriced_threshold: 40.0,
        }
    }
}

impl Settings {
    pub const MIN_THRESHOLD: f64 = 1.0;
    pub const MAX_THRESHOLD: f64 = 99.0;

    /// Clamps values into the ranges the settings form accepts.
    pub fn sanitized(&self) -> Self {
        let defaults = Settings::default();
        let finite_or = |value: f64, fallback: f64| if value.is_finite() { value } else { fallback };

        Self {
            potion_cost: finite_or(self.potion_cost, defaults.potion_cost).max(0.0),
            min_profit: finite_or(self.min_profit, defaults.min_profit).max(0.0),
            underpriced_threshold: finite_or(
                self.underpriced_threshold,
                defaults.underpriced_threshold,
            )
            .clamp(Self::MIN_THRESHOLD, Self::MAX_THRESHOLD),
            ..self.clone()
        }
    }
}

/// An item that sells to the game for more than its lowest market ask.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfitResult {
    pub id: ItemId,
    pub name: String,
    pub category: String,
    /// Sale value after bonuses.
    pub game_value: f64,
    pub market_sell_price: f64,
    /// Per unit, before any potion cost.
    pub profit: f64,
    pub profit_percentage: f64,
    /// Units available at `market_sell_price`.
    pub item_quantity: u64,
    pub total_profit: f64,
}

/// Multi-window price and volume history fetched on demand for one item.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComprehensiveData {
    #[serde(default)]
    pub average_price_1_day: Option<f64>,
    #[serde(default)]
    pub average_price_7_days: Option<f64>,
    #[serde(default)]
    pub average_price_30_days: Option<f64>,
    #[serde(default, deserialize_with = "volume_from_json")]
    pub trade_volume_1_day: u64,
    #[serde(default, deserialize_with = "volume_from_json")]
    pub trade_volume_7_days: u64,
    #[serde(default, deserialize_with = "volume_from_json")]
    pub trade_volume_30_days: u64,
}

/// An item whose lowest ask sits well below its daily average.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnderpricedResult {
    pub id: ItemId,
    pub name: String,
    pub category: String,
    pub daily_average_price: f64,
    pub market_buy_price: f64,
    /// `market_buy_price` as a percentage of `daily_average_price`.
    pub price_ratio: f64,
    pub price_difference: f64,
    pub sell_volume: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comprehensive_data: Option<ComprehensiveData>,
}

/// Accepts numbers, numeric strings and null. Null, garbage and negatives read as 0.
pub(crate) fn amount_from_json<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    deserializer.deserialize_any(NonNegativeAmount)
}

pub(crate) fn volume_from_json<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let amount = deserializer.deserialize_any(NonNegativeAmount)?;
    Ok(amount.floor() as u64)
}

struct NonNegativeAmount;

impl NonNegativeAmount {
    fn clean(value: f64) -> f64 {
        if value.is_finite() && value > 0.0 {
            value
        } else {
            0.0
        }
    }
}

impl<'de> serde::de::Visitor<'de> for NonNegativeAmount {
    type Value = f64;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a number, numeric string or null")
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Self::clean(value))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Self::clean(value as f64))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(Self::clean(value as f64))
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(value.trim().parse::<f64>().map(Self::clean).unwrap_or(0.0))
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(0.0)
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(0.0)
    }

    fn visit_bool<E>(self, _value: bool) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Ok(0.0)
    }
}
