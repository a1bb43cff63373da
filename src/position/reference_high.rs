// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Cached trailing highs used as the dip baseline.

use crate::prices::PriceSource;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Trailing window the reference high covers.
pub const HIGH_WINDOW_DAYS: u32 = 7;

/// Age (seconds) at which a cached high must be recomputed.
pub const HIGH_MAX_AGE_SECS: u64 = 3600;

/// A coin's trailing-window high and when it was computed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceHigh {
    pub value: f64,
    pub computed_at: u64,
}

impl ReferenceHigh {
    /// Valid for reuse when computed strictly less than an hour before `now`.
    pub fn is_fresh(&self, now: u64) -> bool {
        now.saturating_sub(self.computed_at) < HIGH_MAX_AGE_SECS
    }
}

/// In-memory reference highs, keyed by coin. Never persisted.
#[derive(Debug, Default)]
pub struct HighCache {
    highs: HashMap<String, ReferenceHigh>,
}

impl HighCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, coin: &str) -> Option<&ReferenceHigh> {
        self.highs.get(coin)
    }

    pub fn insert(&mut self, coin: &str, high: ReferenceHigh) {
        self.highs.insert(coin.to_string(), high);
    }

    /// Return the high to use for `coin` at `now`, refetching it when stale.
    ///
    /// A failed or empty fetch keeps whatever was cached before; `None` means the
    /// coin has no usable high this tick.
    pub async fn resolve<P>(&mut self, source: &P, coin: &str, now: u64) -> Option<f64>
    where
        P: PriceSource + ?Sized,
    {
        let needs_refresh = match self.get(coin) {
            Some(cached) => !cached.is_fresh(now),
            None => true,
        };

        if needs_refresh {
            match source.trailing_high(coin, HIGH_WINDOW_DAYS).await {
                Ok(Some(value)) if value > 0.0 => {
                    debug!("{}: {}d high refreshed to {}", coin, HIGH_WINDOW_DAYS, value);
                    self.insert(
                        coin,
                        ReferenceHigh {
                            value,
                            computed_at: now,
                        },
                    );
                }
                Ok(_) => {
                    warn!("{}: no {}d price history available", coin, HIGH_WINDOW_DAYS);
                }
                Err(e) => {
                    warn!("{}: {}d high fetch failed: {:#}", coin, HIGH_WINDOW_DAYS, e);
                }
            }
        }

        self.get(coin).map(|h| h.value)
    }
}
