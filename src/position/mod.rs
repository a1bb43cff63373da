// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Position management module.

pub mod evaluator;
pub mod reference_high;
pub mod tracker;

pub use evaluator::{evaluate, Decision, TriggerConfig};
pub use reference_high::{HighCache, HIGH_WINDOW_DAYS};
pub use tracker::{Position, PositionTracker};
