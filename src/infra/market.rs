//! Thin asynchronous client for the Idle Clans player-market API.
//!
//! - Fetches the latest price cross-section for every traded item.
//! - Fetches multi-window history for a single item on demand.

use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::domain::entities::{amount_from_json, synthetic_name, volume_from_json};
use crate::domain::{ComprehensiveData, InputError, ItemId, MarketItem, MarketSnapshot};
use crate::util::version::user_agent;

const DEFAULT_BASE_URL: &str = "https://query.idleclans.com/";
const LATEST_PRICES_PATH: &str = "api/PlayerMarket/items/prices/latest";
const COMPREHENSIVE_PATH: &str = "api/PlayerMarket/items/prices/latest/comprehensive/";

#[derive(Debug, Error)]
pub enum MarketClientError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Shape(#[from] InputError),
}

#[derive(Clone)]
pub struct MarketClient {
    http: Client,
    base_url: Url,
}

impl MarketClient {
    pub fn new() -> Result<Self, MarketClientError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base: &str) -> Result<Self, MarketClientError> {
        let base_url = Url::parse(base)?;
        let http = Client::builder().user_agent(user_agent()).build()?;
        Ok(Self { http, base_url })
    }

    /// Latest lowest ask, highest bid, volumes and daily average for every item.
    pub async fn latest_prices(&self) -> Result<MarketSnapshot, MarketClientError> {
        let mut url = self.url(LATEST_PRICES_PATH)?;
        url.query_pairs_mut()
            .append_pair("includeAveragePrice", "true");

        tracing::info!("[market] requesting latest prices from {url}");

        let raw: Value = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let snapshot = snapshot_from_wire(raw)?;
        tracing::info!("[market] received {} price records", snapshot.len());

        Ok(match fetch_timestamp() {
            Some(stamp) => snapshot.with_fetched_at(stamp),
            None => snapshot,
        })
    }

    /// 1/7/30-day averages and volumes for one item.
    pub async fn comprehensive(&self, item_id: ItemId) -> Result<ComprehensiveData, MarketClientError> {
        let url = self.url(&format!("{COMPREHENSIVE_PATH}{item_id}"))?;
        tracing::debug!("[market] requesting extended data from {url}");

        let data = self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json::<ComprehensiveData>()
            .await?;
        Ok(data)
    }

    fn url(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base_url.join(path)
    }
}

fn fetch_timestamp() -> Option<String> {
    OffsetDateTime::now_utc().format(&Rfc3339).ok()
}

/// One record of the latest-prices endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceDto {
    item_id: ItemId,
    #[serde(default, deserialize_with = "amount_from_json")]
    lowest_sell_price: f64,
    #[serde(default, deserialize_with = "amount_from_json")]
    highest_buy_price: f64,
    #[serde(default, deserialize_with = "volume_from_json")]
    lowest_price_volume: u64,
    #[serde(default, deserialize_with = "volume_from_json")]
    highest_price_volume: u64,
    #[serde(default, deserialize_with = "amount_from_json")]
    daily_average_price: f64,
}

impl From<PriceDto> for MarketItem {
    fn from(dto: PriceDto) -> Self {
        Self {
            id: dto.item_id,
            name: synthetic_name(dto.item_id),
            buy_price: dto.highest_buy_price,
            sell_price: dto.lowest_sell_price,
            sell_volume: dto.lowest_price_volume,
            buy_volume: dto.highest_price_volume,
            daily_average_price: dto.daily_average_price,
        }
    }
}

/// Converts the endpoint's array body. Records without a numeric `itemId` are dropped.
pub fn snapshot_from_wire(value: Value) -> Result<MarketSnapshot, InputError> {
    let Value::Array(records) = value else {
        return Err(InputError::SnapshotNotSequence);
    };

    let total = records.len();
    let items: Vec<MarketItem> = records
        .into_iter()
        .filter_map(|record| serde_json::from_value::<PriceDto>(record).ok())
        .map(MarketItem::from)
        .collect();

    if items.len() < total {
        tracing::debug!(
            "[market] dropped {} price records without an item id",
            total - items.len()
        );
    }

    Ok(MarketSnapshot::new(items))
}

/// Accepts either the endpoint's wire format or already-converted records.
pub fn parse_snapshot(value: Value) -> Result<MarketSnapshot, InputError> {
    let wire_shaped = value
        .as_array()
        .and_then(|records| records.iter().find_map(Value::as_object))
        .map(|record| record.contains_key("itemId"))
        .unwrap_or(false);

    if wire_shaped {
        snapshot_from_wire(value)
    } else {
        MarketSnapshot::from_value(value)
    }
}
