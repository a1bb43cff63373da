// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! CoinGecko REST client (public API, USD quotes).

use super::PriceSource;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

const VS_CURRENCY: &str = "usd";
const SIMPLE_PRICE_TIMEOUT: Duration = Duration::from_secs(20);
const MARKET_CHART_TIMEOUT: Duration = Duration::from_secs(25);

/// `/simple/price` entry for one coin.
#[derive(Debug, Deserialize)]
struct SimplePrice {
    usd: Option<f64>,
}

/// `/coins/{id}/market_chart` body. Each point is `[timestamp_ms, price]`.
#[derive(Debug, Deserialize)]
struct MarketChart {
    #[serde(default)]
    prices: Vec<(f64, f64)>,
}

#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http: reqwest::Client,
    base_url: String,
}

impl CoinGeckoClient {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("coindip/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    async fn simple_prices(&self, coins: &[String]) -> anyhow::Result<HashMap<String, f64>> {
        let ids = coins.join(",");
        let url = format!("{}/simple/price", self.base_url);

        let body: HashMap<String, SimplePrice> = self
            .http
            .get(&url)
            .query(&[("ids", ids.as_str()), ("vs_currencies", VS_CURRENCY)])
            .timeout(SIMPLE_PRICE_TIMEOUT)
            .send()
            .await
            .context("simple/price request failed")?
            .error_for_status()
            .context("simple/price returned an error status")?
            .json()
            .await
            .context("simple/price returned malformed JSON")?;

        debug!("simple/price returned {} of {} coins", body.len(), coins.len());
        Ok(collect_prices(body))
    }
}

fn collect_prices(body: HashMap<String, SimplePrice>) -> HashMap<String, f64> {
    body.into_iter()
        .filter_map(|(coin, quote)| quote.usd.map(|usd| (coin, usd)))
        .collect()
}

fn max_price(chart: &MarketChart) -> Option<f64> {
    chart
        .prices
        .iter()
        .map(|&(_, price)| price)
        .filter(|p| p.is_finite())
        .fold(None, |best, p| match best {
            Some(b) if b >= p => Some(b),
            _ => Some(p),
        })
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    async fn current_price(&self, coin: &str) -> anyhow::Result<Option<f64>> {
        let prices = self.simple_prices(&[coin.to_string()]).await?;
        Ok(prices.get(coin).copied())
    }

    async fn current_prices(&self, coins: &[String]) -> anyhow::Result<HashMap<String, f64>> {
        self.simple_prices(coins).await
    }

    async fn trailing_high(&self, coin: &str, window_days: u32) -> anyhow::Result<Option<f64>> {
        let url = format!("{}/coins/{}/market_chart", self.base_url, coin);
        let days = window_days.to_string();

        let chart: MarketChart = self
            .http
            .get(&url)
            .query(&[("vs_currency", VS_CURRENCY), ("days", days.as_str())])
            .timeout(MARKET_CHART_TIMEOUT)
            .send()
            .await
            .with_context(|| format!("market_chart request for {} failed", coin))?
            .error_for_status()
            .with_context(|| format!("market_chart for {} returned an error status", coin))?
            .json()
            .await
            .with_context(|| format!("market_chart for {} returned malformed JSON", coin))?;

        Ok(max_price(&chart))
    }
}
