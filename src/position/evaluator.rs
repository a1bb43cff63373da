// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Dip-buy / take-profit / stop-loss trigger evaluation.

use crate::position::Position;

/// Trigger thresholds, expressed as percentages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerConfig {
    /// Percentage below the reference high that triggers a buy.
    pub dip_pct: f64,
    /// Percentage above entry that takes profit.
    pub profit_pct: f64,
    /// Percentage below entry that stops out.
    pub loss_pct: f64,
}

impl TriggerConfig {
    pub fn new(dip_pct: f64, profit_pct: f64, loss_pct: f64) -> Self {
        Self {
            dip_pct,
            profit_pct,
            loss_pct,
        }
    }

    pub fn buy_multiplier(&self) -> f64 {
        1.0 - self.dip_pct / 100.0
    }

    pub fn sell_multiplier(&self) -> f64 {
        1.0 + self.profit_pct / 100.0
    }

    pub fn stop_multiplier(&self) -> f64 {
        1.0 - self.loss_pct / 100.0
    }
}

/// Outcome of evaluating one coin for one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// No reference high, or nothing triggered.
    Hold,
    /// Price dipped far enough below the reference high: open a position.
    Open {
        entry_price: f64,
        target_price: f64,
        stop_price: f64,
        dip_pct: f64,
    },
    /// Take-profit reached.
    CloseTarget { pnl_pct: f64 },
    /// Stop-loss reached.
    CloseStop { pnl_pct: f64 },
}

/// Decide what to do with a coin given its price, reference high and position.
///
/// Pure: the same inputs always give the same decision. With an open position the
/// take-profit check runs before the stop-loss check.
pub fn evaluate(
    current_price: f64,
    reference_high: Option<f64>,
    position: Option<&Position>,
    config: &TriggerConfig,
) -> Decision {
    let high = match reference_high {
        Some(high) if high > 0.0 => high,
        _ => return Decision::Hold,
    };

    match position {
        None => {
            if current_price <= high * config.buy_multiplier() {
                Decision::Open {
                    entry_price: current_price,
                    target_price: current_price * config.sell_multiplier(),
                    stop_price: current_price * config.stop_multiplier(),
                    dip_pct: (1.0 - current_price / high) * 100.0,
                }
            } else {
                Decision::Hold
            }
        }
        Some(position) => {
            let entry = position.entry_price;
            let pnl_pct = (current_price / entry - 1.0) * 100.0;

            if current_price >= entry * config.sell_multiplier() {
                Decision::CloseTarget { pnl_pct }
            } else if current_price <= entry * config.stop_multiplier() {
                Decision::CloseStop { pnl_pct }
            } else {
                Decision::Hold
            }
        }
    }
}
