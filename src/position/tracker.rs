// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Position tracking for open simulated trades.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// A single open position (long one coin).
///
/// Serialized as `{"buy": <entry_price>, "t": <opened_at>}` under the coin key, so
/// state files written by older deployments keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(skip)]
    pub coin: String,
    #[serde(rename = "buy")]
    pub entry_price: f64,
    #[serde(rename = "t")]
    pub opened_at: u64,
}

/// Manages all open positions and their state file.
#[derive(Debug)]
pub struct PositionTracker {
    path: PathBuf,
    positions: BTreeMap<String, Position>,
}

impl PositionTracker {
    /// Create an empty tracker backed by `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            positions: BTreeMap::new(),
        }
    }

    /// Load positions from file. Missing or corrupt files yield an empty tracker.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !path.exists() {
            info!("No positions file found at {}, starting fresh", path.display());
            return Self::new(path);
        }

        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<BTreeMap<String, Position>>(&content) {
                Ok(mut positions) => {
                    for (coin, position) in positions.iter_mut() {
                        position.coin = coin.clone();
                    }
                    info!("Loaded {} positions from {}", positions.len(), path.display());
                    Self { path, positions }
                }
                Err(e) => {
                    error!("Failed to parse positions file, ignoring it: {}", e);
                    Self::new(path)
                }
            },
            Err(e) => {
                error!("Failed to read positions file, ignoring it: {}", e);
                Self::new(path)
            }
        }
    }

    /// Save positions to file via a temp file and rename.
    pub fn save(&self) -> Result<(), String> {
        let content = serde_json::to_string_pretty(&self.positions)
            .map_err(|e| format!("Failed to serialize positions: {}", e))?;

        let tmp = tmp_path(&self.path);
        fs::write(&tmp, content)
            .map_err(|e| format!("Failed to write {}: {}", tmp.display(), e))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| format!("Failed to replace {}: {}", self.path.display(), e))?;

        debug!("Saved {} positions to {}", self.positions.len(), self.path.display());
        Ok(())
    }

    /// Open a position and persist. Only called for coins that are flat.
    pub fn open(&mut self, position: Position) -> Result<(), String> {
        info!(
            "Opening position: {} at {}",
            position.coin, position.entry_price
        );
        self.positions.insert(position.coin.clone(), position);
        self.save()
    }

    /// Close a position and persist. The removed position is returned even if the
    /// save fails; the next successful save catches the file up.
    pub fn close(&mut self, coin: &str) -> (Option<Position>, Result<(), String>) {
        let position = self.positions.remove(coin);
        if position.is_some() {
            info!("Closing position: {}", coin);
            let saved = self.save();
            (position, saved)
        } else {
            (None, Ok(()))
        }
    }

    /// Get a position by coin.
    pub fn get(&self, coin: &str) -> Option<&Position> {
        self.positions.get(coin)
    }

    /// All positions, ordered by coin.
    pub fn all(&self) -> Vec<&Position> {
        self.positions.values().collect()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(coin: &str, entry_price: f64, opened_at: u64) -> Position {
        Position {
            coin: coin.to_string(),
            entry_price,
            opened_at,
        }
    }

    #[test]
    fn test_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positions.json");

        let mut tracker = PositionTracker::new(&path);
        tracker.open(position("pepe", 0.00001234, 1_700_000_000)).unwrap();
        tracker.open(position("bonk", 0.000021, 1_700_000_300)).unwrap();

        let reloaded = PositionTracker::load(&path);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("pepe"), Some(&position("pepe", 0.00001234, 1_700_000_000)));
        assert_eq!(reloaded.get("bonk"), Some(&position("bonk", 0.000021, 1_700_000_300)));
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn test_entry_prices_reload_bit_for_bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positions.json");

        // xorshift64 over log-uniform prices in 1e-9..1e5
        let mut state: u64 = 0x9E37_79B9_7F4A_7C15;
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state >> 11) as f64 / (1u64 << 53) as f64
        };

        let mut tracker = PositionTracker::new(&path);
        let mut written = Vec::new();
        for i in 0..20_000u64 {
            let price = 10f64.powf(-9.0 + 14.0 * next());
            let coin = format!("coin-{}", i);
            tracker
                .positions
                .insert(coin.clone(), position(&coin, price, 1_700_000_000 + i));
            written.push((coin, price));
        }
        tracker.save().unwrap();

        let reloaded = PositionTracker::load(&path);
        assert_eq!(reloaded.len(), written.len());
        for (coin, price) in &written {
            let entry = reloaded.get(coin).unwrap().entry_price;
            assert_eq!(
                entry.to_bits(),
                price.to_bits(),
                "{}: wrote {:e} reloaded {:e}",
                coin,
                price,
                entry
            );
        }

        // The value that drifted without exact float parsing.
        let mut tracker = PositionTracker::new(&path);
        tracker.open(position("pepe", 2.8606880807584887e-7, 1)).unwrap();
        let entry = PositionTracker::load(&path).get("pepe").unwrap().entry_price;
        assert_eq!(entry.to_bits(), 2.8606880807584887e-7f64.to_bits());
    }

    #[test]
    fn test_close_removes_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positions.json");

        let mut tracker = PositionTracker::new(&path);
        tracker.open(position("floki", 0.0002, 10)).unwrap();

        let (closed, saved) = tracker.close("floki");
        assert_eq!(closed, Some(position("floki", 0.0002, 10)));
        assert!(saved.is_ok());
        assert!(PositionTracker::load(&path).is_empty());

        let (closed, saved) = tracker.close("floki");
        assert!(closed.is_none());
        assert!(saved.is_ok());
    }

    #[test]
    fn test_loads_legacy_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positions.json");
        fs::write(&path, r#"{"ordi": {"buy": 31.5, "t": 1712345678}}"#).unwrap();

        let tracker = PositionTracker::load(&path);
        assert_eq!(tracker.get("ordi"), Some(&position("ordi", 31.5, 1712345678)));
    }

    #[test]
    fn test_missing_or_corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positions.json");
        assert!(PositionTracker::load(&path).is_empty());

        fs::write(&path, "{not json").unwrap();
        let tracker = PositionTracker::load(&path);
        assert!(tracker.is_empty());
        assert_eq!(tracker.path(), path.as_path());
    }

    #[test]
    fn test_save_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("positions.json");

        let mut tracker = PositionTracker::new(&path);
        let result = tracker.open(position("pepe", 1.0, 1));
        assert!(result.is_err());
        // The in-memory state still reflects the decision.
        assert!(tracker.get("pepe").is_some());
    }
}
