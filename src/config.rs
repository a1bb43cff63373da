// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration module - loads settings from environment variables.

use crate::position::TriggerConfig;
use std::path::PathBuf;
use std::str::FromStr;

const DEFAULT_COINS: &str = "pepe,bonk,floki,ordi,shiba-inu";
pub const DEFAULT_COINGECKO_URL: &str = "https://api.coingecko.com/api/v3";

/// Main configuration for the dip watcher.
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub telegram_token: String,
    pub telegram_chat_id: String,

    // Watchlist
    pub coins: Vec<String>,
    pub check_interval_sec: u64,

    // Trading rules
    pub trade_size_usd: f64,
    pub dip_from_high_pct: f64,
    pub sell_target_pct: f64,
    pub stop_loss_pct: f64,

    // Storage and data
    pub state_file: PathBuf,
    pub coingecko_api_url: String,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, String> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = &lookup;

        let config = Self {
            // Telegram
            telegram_token: env_var(lookup, "TELEGRAM_BOT_TOKEN")?,
            telegram_chat_id: env_var(lookup, "TELEGRAM_CHAT_ID")?,

            // Watchlist
            coins: parse_coins(&env_var_or(lookup, "COIN_LIST", DEFAULT_COINS)),
            check_interval_sec: env_parse(lookup, "CHECK_INTERVAL_SECONDS", "300")?,

            // Trading rules
            trade_size_usd: env_parse(lookup, "TRADE_SIZE_USD", "500")?,
            dip_from_high_pct: env_parse(lookup, "DIP_FROM_HIGH_PCT", "7.0")?,
            sell_target_pct: env_parse(lookup, "SELL_TARGET_PCT", "3.0")?,
            stop_loss_pct: env_parse(lookup, "STOP_LOSS_PCT", "3.0")?,

            // Storage and data
            state_file: PathBuf::from(env_var_or(lookup, "STATE_FILE", "positions.json")),
            coingecko_api_url: env_var_or(lookup, "COINGECKO_API_URL", DEFAULT_COINGECKO_URL)
                .trim_end_matches('/')
                .to_string(),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.coins.is_empty() {
            return Err("COIN_LIST must name at least one coin".to_string());
        }
        if self.check_interval_sec == 0 {
            return Err("CHECK_INTERVAL_SECONDS must be greater than zero".to_string());
        }
        if !self.trade_size_usd.is_finite() || self.trade_size_usd <= 0.0 {
            return Err(format!("TRADE_SIZE_USD must be positive, got {}", self.trade_size_usd));
        }
        for (name, pct) in [
            ("DIP_FROM_HIGH_PCT", self.dip_from_high_pct),
            ("SELL_TARGET_PCT", self.sell_target_pct),
            ("STOP_LOSS_PCT", self.stop_loss_pct),
        ] {
            if !(0.0..100.0).contains(&pct) {
                return Err(format!("{} must be within [0, 100), got {}", name, pct));
            }
        }
        Ok(())
    }

    /// Thresholds used by the trigger evaluator.
    pub fn trigger_config(&self) -> TriggerConfig {
        TriggerConfig::new(self.dip_from_high_pct, self.sell_target_pct, self.stop_loss_pct)
    }
}

fn env_var(lookup: &dyn Fn(&str) -> Option<String>, name: &str) -> Result<String, String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| format!("{} not set", name))
}

fn env_var_or(lookup: &dyn Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    lookup(name).unwrap_or_else(|| default.to_string())
}

fn env_parse<T>(lookup: &dyn Fn(&str) -> Option<String>, name: &str, default: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env_var_or(lookup, name, default);
    raw.trim()
        .parse()
        .map_err(|e| format!("Invalid {} '{}': {}", name, raw, e))
}

/// Split a comma-separated coin list, dropping blanks and duplicates.
fn parse_coins(raw: &str) -> Vec<String> {
    let mut coins: Vec<String> = Vec::new();
    for coin in raw.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        if !coins.iter().any(|c| c == coin) {
            coins.push(coin.to_string());
        }
    }
    coins
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const SECRETS: [(&str, &str); 2] = [
        ("TELEGRAM_BOT_TOKEN", "123:abc"),
        ("TELEGRAM_CHAT_ID", "-1001"),
    ];

    #[test]
    fn defaults_apply_when_only_secrets_are_set() {
        let config = Config::from_lookup(lookup_from(&SECRETS)).unwrap();

        assert_eq!(config.coins, vec!["pepe", "bonk", "floki", "ordi", "shiba-inu"]);
        assert_eq!(config.check_interval_sec, 300);
        assert_eq!(config.trade_size_usd, 500.0);
        assert_eq!(config.dip_from_high_pct, 7.0);
        assert_eq!(config.sell_target_pct, 3.0);
        assert_eq!(config.stop_loss_pct, 3.0);
        assert_eq!(config.state_file, PathBuf::from("positions.json"));
        assert_eq!(config.coingecko_api_url, DEFAULT_COINGECKO_URL);
    }

    #[test]
    fn missing_secrets_are_fatal() {
        let err = Config::from_lookup(lookup_from(&[("TELEGRAM_CHAT_ID", "1")])).unwrap_err();
        assert!(err.contains("TELEGRAM_BOT_TOKEN"));

        let err = Config::from_lookup(lookup_from(&[
            ("TELEGRAM_BOT_TOKEN", "t"),
            ("TELEGRAM_CHAT_ID", "  "),
        ]))
        .unwrap_err();
        assert!(err.contains("TELEGRAM_CHAT_ID"));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let mut vars = SECRETS.to_vec();
        vars.push(("DIP_FROM_HIGH_PCT", "seven"));
        let err = Config::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(err.contains("DIP_FROM_HIGH_PCT"));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let mut vars = SECRETS.to_vec();
        vars.push(("STOP_LOSS_PCT", "100"));
        assert!(Config::from_lookup(lookup_from(&vars)).is_err());

        let mut vars = SECRETS.to_vec();
        vars.push(("CHECK_INTERVAL_SECONDS", "0"));
        assert!(Config::from_lookup(lookup_from(&vars)).is_err());

        let mut vars = SECRETS.to_vec();
        vars.push(("COIN_LIST", " , ,"));
        assert!(Config::from_lookup(lookup_from(&vars)).is_err());

        for size in ["inf", "-inf", "NaN", "0", "-5"] {
            let mut vars = SECRETS.to_vec();
            vars.push(("TRADE_SIZE_USD", size));
            let err = Config::from_lookup(lookup_from(&vars)).unwrap_err();
            assert!(err.contains("TRADE_SIZE_USD"), "{}: {}", size, err);
        }
    }

    #[test]
    fn coin_list_is_trimmed_and_deduplicated() {
        let mut vars = SECRETS.to_vec();
        vars.push(("COIN_LIST", " pepe, bonk ,,pepe,dogwifcoin "));
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.coins, vec!["pepe", "bonk", "dogwifcoin"]);
    }

    #[test]
    fn trigger_config_uses_percentages() {
        let config = Config::from_lookup(lookup_from(&SECRETS)).unwrap();
        let triggers = config.trigger_config();
        assert!((triggers.buy_multiplier() - 0.93).abs() < 1e-12);
        assert!((triggers.sell_multiplier() - 1.03).abs() < 1e-12);
        assert!((triggers.stop_multiplier() - 0.97).abs() < 1e-12);
    }
}
