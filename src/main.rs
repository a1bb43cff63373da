// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! CoinDip - dip-from-7d-high alerts with take-profit / stop-loss tracking.

mod config;
mod messages;
mod monitor;
mod position;
mod prices;
mod scheduler;
mod telegram;

use clap::Parser;
use config::Config;
use monitor::DipMonitor;
use position::{PositionTracker, HIGH_WINDOW_DAYS};
use prices::{CoinGeckoClient, PriceSource};
use scheduler::TickDriver;
use telegram::{Notifier, TelegramNotifier};

use std::time::Duration;
use tokio::signal;
use tokio::sync::oneshot;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Parser)]
#[command(name = "coindip", version, about = "Dip-from-high alerts for a coin watchlist")]
struct Args {
    /// Run a single tick and exit.
    #[arg(long)]
    once: bool,

    /// Print a coin's spot price and 7d high, then exit.
    #[arg(long, value_name = "COIN", conflicts_with = "once")]
    check: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    // Diagnostic mode needs only the price API
    if let Some(coin) = args.check {
        dotenvy::dotenv().ok();
        let base_url = std::env::var("COINGECKO_API_URL")
            .unwrap_or_else(|_| config::DEFAULT_COINGECKO_URL.to_string());
        return check_coin(&base_url, &coin).await;
    }

    info!("🚀 CoinDip starting...");

    let config = Config::from_env().map_err(|e| {
        error!("❌ Invalid configuration: {}", e);
        e
    })?;

    info!("👀 Watching: {}", config.coins.join(", "));
    info!(
        "📉 Buy {}% below {}d high | TP +{}% | SL -{}%",
        config.dip_from_high_pct, HIGH_WINDOW_DAYS, config.sell_target_pct, config.stop_loss_pct
    );
    info!("💰 Nominal size: ${} | Interval: {}s", config.trade_size_usd, config.check_interval_sec);

    let prices = CoinGeckoClient::new(config.coingecko_api_url.clone())?;
    let telegram = TelegramNotifier::new(config.telegram_token.clone(), &config.telegram_chat_id)?;

    let positions = PositionTracker::load(&config.state_file);
    info!(
        "📊 Loaded {} existing positions from {}",
        positions.len(),
        positions.path().display()
    );
    for position in positions.all() {
        info!("   {} long from {}", position.coin, position.entry_price);
    }

    let driver = TickDriver::new(Duration::from_secs(config.check_interval_sec));
    let mut monitor = DipMonitor::new(&config, prices, telegram, positions);

    if args.once {
        let summary = driver.run_once(&mut monitor).await?;
        info!("✅ Single tick done: {:?}", summary);
        return Ok(());
    }

    monitor.notifier().send(&messages::startup(&config)).await;

    // Ctrl-C is registered up front so a signal during a tick is not lost
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                let _ = shutdown_tx.send(());
            }
            Err(e) => {
                warn!("Unable to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        }
    });

    info!("✅ CoinDip ready!");
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    driver
        .run(&mut monitor, async {
            let _ = shutdown_rx.await;
        })
        .await;

    let positions = monitor.positions();
    if let Err(e) = positions.save() {
        error!("❌ Failed to save positions: {}", e);
    } else {
        info!("✅ Positions saved successfully ({} positions)", positions.len());
    }
    monitor.notifier().send(&messages::shutdown(positions.len())).await;

    Ok(())
}

async fn check_coin(base_url: &str, coin: &str) -> Result<(), Box<dyn std::error::Error>> {
    info!("🧪 Checking {} via {}", coin, base_url);
    let client = CoinGeckoClient::new(base_url)?;

    match client.current_price(coin).await? {
        Some(price) => info!("💵 Spot: {}", messages::fmt_price(price)),
        None => warn!("No spot price for {}", coin),
    }
    match client.trailing_high(coin, HIGH_WINDOW_DAYS).await? {
        Some(high) => info!("📈 {}d high: {}", HIGH_WINDOW_DAYS, messages::fmt_price(high)),
        None => warn!("No {}d history for {}", HIGH_WINDOW_DAYS, coin),
    }
    Ok(())
}
