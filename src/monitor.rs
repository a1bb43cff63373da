// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Dip monitor - one pass over the watchlist per tick.

use crate::config::Config;
use crate::messages::{self, BuyAlert};
use crate::position::{evaluate, Decision, HighCache, Position, PositionTracker, TriggerConfig};
use crate::prices::PriceSource;
use crate::scheduler::Tick;
use crate::telegram::{Delivery, Notifier};
use async_trait::async_trait;
use tracing::{debug, error, info, warn};

/// Counters for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub evaluated: usize,
    pub skipped: usize,
    pub opened: usize,
    pub closed: usize,
}

/// Owns the watchlist state and applies trigger decisions.
pub struct DipMonitor<P, N> {
    prices: P,
    notifier: N,
    positions: PositionTracker,
    highs: HighCache,
    coins: Vec<String>,
    triggers: TriggerConfig,
    trade_size_usd: f64,
}

impl<P: PriceSource, N: Notifier> DipMonitor<P, N> {
    pub fn new(config: &Config, prices: P, notifier: N, positions: PositionTracker) -> Self {
        Self {
            prices,
            notifier,
            positions,
            highs: HighCache::new(),
            coins: config.coins.clone(),
            triggers: config.trigger_config(),
            trade_size_usd: config.trade_size_usd,
        }
    }

    pub fn positions(&self) -> &PositionTracker {
        &self.positions
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Evaluate every coin once at `now` (UNIX seconds).
    ///
    /// Only the batched spot-price fetch can fail the tick; per-coin problems skip
    /// that coin.
    pub async fn run_tick(&mut self, now: u64) -> anyhow::Result<TickSummary> {
        let spot = self.prices.current_prices(&self.coins).await?;
        let mut summary = TickSummary::default();

        for coin in &self.coins {
            let price = match spot.get(coin) {
                Some(&p) if p > 0.0 => p,
                _ => {
                    debug!("{}: no spot price this tick", coin);
                    summary.skipped += 1;
                    continue;
                }
            };

            let Some(high) = self.highs.resolve(&self.prices, coin, now).await else {
                debug!("{}: no reference high yet, skipping", coin);
                summary.skipped += 1;
                continue;
            };

            summary.evaluated += 1;
            let decision = evaluate(price, Some(high), self.positions.get(coin), &self.triggers);
            debug!("{}: price={} high={} -> {:?}", coin, price, high, decision);

            let text = match decision {
                Decision::Hold => continue,
                Decision::Open {
                    entry_price,
                    target_price,
                    stop_price,
                    dip_pct,
                } => {
                    info!(
                        "🚀 BUY signal {} at {} ({:.1}% below {}d high {})",
                        coin, entry_price, dip_pct, crate::position::HIGH_WINDOW_DAYS, high
                    );
                    let position = Position {
                        coin: coin.clone(),
                        entry_price,
                        opened_at: now,
                    };
                    if let Err(e) = self.positions.open(position) {
                        error!("❌ Failed to persist positions: {}", e);
                    }
                    summary.opened += 1;
                    messages::buy(&BuyAlert {
                        coin,
                        price: entry_price,
                        reference_high: high,
                        dip_pct,
                        target_price,
                        stop_price,
                        trade_size_usd: self.trade_size_usd,
                        profit_pct: self.triggers.profit_pct,
                        loss_pct: self.triggers.loss_pct,
                    })
                }
                Decision::CloseTarget { pnl_pct } | Decision::CloseStop { pnl_pct } => {
                    let (closed, saved) = self.positions.close(coin);
                    if let Err(e) = saved {
                        error!("❌ Failed to persist positions: {}", e);
                    }
                    let Some(closed) = closed else {
                        warn!("{}: close decided but no open position", coin);
                        continue;
                    };
                    summary.closed += 1;
                    if matches!(decision, Decision::CloseTarget { .. }) {
                        info!("✅ Take-profit {} at {} ({:+.2}%)", coin, price, pnl_pct);
                        messages::take_profit(coin, price, closed.entry_price, pnl_pct)
                    } else {
                        info!("⚠️ Stop-loss {} at {} ({:.2}%)", coin, price, pnl_pct);
                        messages::stop_loss(coin, price, closed.entry_price, pnl_pct)
                    }
                }
            };

            if let Delivery::Failed(reason) = self.notifier.send(&text).await {
                warn!("{}: notification dropped ({})", coin, reason);
            }
        }

        debug!(
            "Tick done: evaluated={} skipped={} opened={} closed={}",
            summary.evaluated, summary.skipped, summary.opened, summary.closed
        );
        Ok(summary)
    }
}

#[async_trait]
impl<P: PriceSource, N: Notifier> Tick for DipMonitor<P, N> {
    type Output = TickSummary;

    async fn tick(&mut self, now: u64) -> anyhow::Result<TickSummary> {
        self.run_tick(now).await
    }
}
