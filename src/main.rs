use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;

use idle_profit_finder::domain::{AppState, PotionCostUpdate, ProfitResult, Settings, UnderpricedResult};
use idle_profit_finder::infra::{load_catalog, load_snapshot, MarketClient};
use idle_profit_finder::util::{
    format::format_number,
    logging::init_logging,
    persistence::{load_settings, save_settings},
    version::{version_label, APP_NAME},
};

/// Items to buy on the player market and sell to the game, and items trading
/// below their daily average.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Local game catalog (JSON with an `Items` tree and optional `Shop` tree)
    #[arg(short, long, env = "IDLE_CATALOG")]
    catalog: PathBuf,

    /// Saved market snapshot; the live API is queried when omitted
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Rows per table
    #[arg(short, long, default_value_t = 25)]
    limit: usize,

    /// Fetch extended price history for these item ids
    #[arg(long, num_args = 1..)]
    details: Vec<i64>,

    /// Print both lists as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// Persist the effective settings for later runs
    #[arg(long)]
    save: bool,

    #[arg(short, long)]
    verbose: bool,

    #[arg(long)]
    game_sale_bonus: Option<bool>,
    #[arg(long)]
    potion_bonus: Option<bool>,
    #[arg(long)]
    potion_cost: Option<f64>,
    #[arg(long)]
    override_potion_cost: Option<bool>,
    #[arg(long)]
    min_profit: Option<f64>,
    #[arg(long)]
    hide_non_profitable: Option<bool>,
    #[arg(long)]
    hide_sub_profitable: Option<bool>,
    #[arg(long)]
    underpriced_threshold: Option<f64>,
}

impl Args {
    fn apply_overrides(&self, mut settings: Settings) -> Settings {
        if let Some(value) = self.game_sale_bonus {
            settings.game_sale_bonus = value;
        }
        if let Some(value) = self.potion_bonus {
            settings.potion_bonus = value;
        }
        if let Some(value) = self.potion_cost {
            settings.potion_cost = value;
        }
        if let Some(value) = self.override_potion_cost {
            settings.override_potion_cost = value;
        }
        if let Some(value) = self.min_profit {
            settings.min_profit = value;
        }
        if let Some(value) = self.hide_non_profitable {
            settings.hide_non_profitable = value;
        }
        if let Some(value) = self.hide_sub_profitable {
            settings.hide_sub_profitable = value;
        }
        if let Some(value) = self.underpriced_threshold {
            settings.underpriced_threshold = value;
        }
        settings.sanitized()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    tracing::info!("Starting {APP_NAME} {}", version_label());

    let settings = args.apply_overrides(load_settings().unwrap_or_default());
    let catalog = load_catalog(&args.catalog)?;

    let client = MarketClient::new().context("failed to set up market client")?;
    let snapshot = match &args.snapshot {
        Some(path) => load_snapshot(path)?,
        None => client
            .latest_prices()
            .await
            .context("failed to fetch market prices")?,
    };

    let mut state = AppState::new(settings);
    match state.load(catalog, snapshot)? {
        PotionCostUpdate::Updated(cost) => {
            println!("Potion cost updated to {} gold from market data.", format_number(cost, 0))
        }
        PotionCostUpdate::Overridden => println!("Using manual potion cost override."),
        PotionCostUpdate::Unchanged => {}
    }

    if args.save {
        if let Err(err) = save_settings(&state.settings) {
            tracing::warn!("[settings] failed to persist settings: {err}");
        }
    }

    for &item_id in &args.details {
        match client.comprehensive(item_id).await {
            Ok(data) => state.enrichment.insert(item_id, data),
            Err(err) => tracing::warn!("[market] no extended data for item {item_id}: {err}"),
        }
    }

    let profitable = state.profitable_items();
    let underpriced = state.underpriced_with_enrichment();

    if args.json {
        let body = json!({
            "fetchedAt": state.snapshot().fetched_at,
            "settings": state.settings,
            "profitable": profitable,
            "underpriced": underpriced,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    print_profitable(&state, &profitable, args.limit);
    println!();
    print_underpriced(&state, &underpriced, args.limit);

    Ok(())
}

fn print_profitable(state: &AppState, rows: &[ProfitResult], limit: usize) {
    let settings = &state.settings;
    println!(
        "Profitable items ({}) | sale bonus {} | potion {}",
        rows.len(),
        on_off(settings.game_sale_bonus),
        if settings.potion_bonus {
            format!("on, cost {}", format_number(settings.potion_cost, 0))
        } else {
            "off".to_string()
        }
    );
    println!(
        "{:<28} {:<24} {:>10} {:>10} {:>9} {:>8} {:>7} {:>12}",
        "Name", "Category", "Game", "Market", "Profit", "Profit%", "Qty", "Total"
    );

    for row in rows.iter().take(limit) {
        println!(
            "{:<28} {:<24} {:>10} {:>10} {:>9} {:>8} {:>7} {:>12}",
            truncate(&row.name, 28),
            truncate(&state.category_name(&row.category), 24),
            format_number(row.game_value, 0),
            format_number(row.market_sell_price, 0),
            format_number(row.profit, 0),
            format!("{}%", format_number(row.profit_percentage, 1)),
            format_number(row.item_quantity as f64, 0),
            format_number(row.total_profit, 0),
        );
    }
}

fn print_underpriced(state: &AppState, rows: &[UnderpricedResult], limit: usize) {
    println!(
        "Underpriced items ({}) | below {}% of daily average",
        rows.len(),
        format_number(state.settings.underpriced_threshold, 0)
    );
    println!(
        "{:<28} {:<24} {:>10} {:>10} {:>7} {:>10} {:>7}",
        "Name", "Category", "Daily avg", "Market", "Ratio", "Diff", "Volume"
    );

    for row in rows.iter().take(limit) {
        println!(
            "{:<28} {:<24} {:>10} {:>10} {:>7} {:>10} {:>7}",
            truncate(&row.name, 28),
            truncate(&state.category_name(&row.category), 24),
            format_number(row.daily_average_price, 0),
            format_number(row.market_buy_price, 0),
            format!("{}%", format_number(row.price_ratio, 1)),
            format_number(row.price_difference, 0),
            format_number(row.sell_volume as f64, 0),
        );

        if let Some(history) = &row.comprehensive_data {
            let average = |price: Option<f64>| {
                price
                    .map(|value| format_number(value, 0))
                    .unwrap_or_else(|| "-".to_string())
            };
            println!(
                "    avg 1d {} / 7d {} / 30d {} | volume 1d {} / 7d {} / 30d {}",
                average(history.average_price_1_day),
                average(history.average_price_7_days),
                average(history.average_price_30_days),
                history.trade_volume_1_day,
                history.trade_volume_7_days,
                history.trade_volume_30_days,
            );
        }
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}
