// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Price data sources.

pub mod coingecko;

pub use coingecko::CoinGeckoClient;

use async_trait::async_trait;
use std::collections::HashMap;

/// Spot prices and trailing highs for coin identifiers, quoted in USD.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Latest spot price. `Ok(None)` means no data for this coin right now.
    async fn current_price(&self, coin: &str) -> anyhow::Result<Option<f64>>;

    /// Highest price over the trailing `window_days`. `Ok(None)` on empty history.
    async fn trailing_high(&self, coin: &str, window_days: u32) -> anyhow::Result<Option<f64>>;

    /// Spot prices for several coins; coins without data are left out of the map.
    async fn current_prices(&self, coins: &[String]) -> anyhow::Result<HashMap<String, f64>> {
        let mut prices = HashMap::with_capacity(coins.len());
        for coin in coins {
            if let Some(price) = self.current_price(coin).await? {
                prices.insert(coin.clone(), price);
            }
        }
        Ok(prices)
    }
}
