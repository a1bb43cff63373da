// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Notification text.

use crate::config::Config;

/// Format a USD price with precision suited to its magnitude.
pub fn fmt_price(x: f64) -> String {
    if x >= 1.0 {
        format!("${}", group_thousands(&format!("{:.2}", x)))
    } else if x >= 0.01 {
        format!("${:.4}", x)
    } else {
        format!("${:.8}", x)
    }
}

/// Insert `,` separators into the integer part of a formatted number.
fn group_thousands(formatted: &str) -> String {
    let (sign, rest) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let (int_part, frac_part) = match rest.find('.') {
        Some(idx) => rest.split_at(idx),
        None => (rest, ""),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}{}{}", sign, grouped, frac_part)
}

pub fn startup(config: &Config) -> String {
    let watching: Vec<String> = config.coins.iter().map(|c| c.to_uppercase()).collect();
    format!(
        "🟢 CoinDip started.\n\
         Watching: {}\n\
         Buy: {:.1}% below 7d high\n\
         TP: +{:.1}% | SL: -{:.1}%\n\
         Nominal size: ${}",
        watching.join(", "),
        config.dip_from_high_pct,
        config.sell_target_pct,
        config.stop_loss_pct,
        group_thousands(&format!("{:.0}", config.trade_size_usd)),
    )
}

pub fn shutdown(open_positions: usize) -> String {
    format!("🛑 CoinDip stopped ({} open positions saved).", open_positions)
}

pub struct BuyAlert<'a> {
    pub coin: &'a str,
    pub price: f64,
    pub reference_high: f64,
    pub dip_pct: f64,
    pub target_price: f64,
    pub stop_price: f64,
    pub trade_size_usd: f64,
    pub profit_pct: f64,
    pub loss_pct: f64,
}

pub fn buy(alert: &BuyAlert<'_>) -> String {
    let qty = alert.trade_size_usd / alert.price;
    format!(
        "🚀 BUY {} at {} (dip {:.1}% vs 7d high {})\n\
         Qty ≈ {} (for ${})\n\
         → Target: {} (+{:.1}%) | Stop: {} (-{:.1}%)",
        alert.coin.to_uppercase(),
        fmt_price(alert.price),
        alert.dip_pct,
        fmt_price(alert.reference_high),
        group_thousands(&format!("{:.0}", qty)),
        group_thousands(&format!("{:.0}", alert.trade_size_usd)),
        fmt_price(alert.target_price),
        alert.profit_pct,
        fmt_price(alert.stop_price),
        alert.loss_pct,
    )
}

pub fn take_profit(coin: &str, price: f64, entry_price: f64, pnl_pct: f64) -> String {
    format!(
        "✅ SELL {} at {}  ({:+.2}% from {})",
        coin.to_uppercase(),
        fmt_price(price),
        pnl_pct,
        fmt_price(entry_price),
    )
}

pub fn stop_loss(coin: &str, price: f64, entry_price: f64, pnl_pct: f64) -> String {
    format!(
        "⚠️ STOP {} at {}  ({:.2}% from {})",
        coin.to_uppercase(),
        fmt_price(price),
        pnl_pct,
        fmt_price(entry_price),
    )
}
