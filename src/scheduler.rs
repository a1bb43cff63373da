// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Fixed-interval tick driver with error backoff.

use anyhow::anyhow;
use async_trait::async_trait;
use futures_util::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Pause after a failed tick whose cause was an HTTP error status.
const HTTP_BACKOFF: Duration = Duration::from_secs(30);
/// Pause after any other failed tick.
const ERROR_BACKOFF: Duration = Duration::from_secs(10);

/// One unit of periodic work.
#[async_trait]
pub trait Tick: Send {
    type Output: std::fmt::Debug + Send;

    /// Run one pass at `now` (UNIX seconds).
    async fn tick(&mut self, now: u64) -> anyhow::Result<Self::Output>;
}

#[derive(Debug, Clone, Copy)]
pub struct TickDriver {
    pub interval: Duration,
    pub http_backoff: Duration,
    pub error_backoff: Duration,
}

impl TickDriver {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            http_backoff: HTTP_BACKOFF,
            error_backoff: ERROR_BACKOFF,
        }
    }

    /// How long to wait before the next tick.
    pub fn delay_after<T>(&self, outcome: &anyhow::Result<T>) -> Duration {
        match outcome {
            Ok(_) => self.interval,
            Err(e) if is_http_status_error(e) => self.http_backoff,
            Err(_) => self.error_backoff,
        }
    }

    /// Run a single tick.
    pub async fn run_once<T: Tick>(&self, task: &mut T) -> anyhow::Result<T::Output> {
        guarded_tick(task).await
    }

    /// Tick until `shutdown` resolves. A running tick always completes; shutdown is
    /// observed while waiting between ticks. Returns the number of ticks run.
    pub async fn run<T, S>(&self, task: &mut T, shutdown: S) -> usize
    where
        T: Tick,
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!("⏱️ Tick driver started (every {}s)", self.interval.as_secs());

        let mut ticks = 0;
        loop {
            let outcome = guarded_tick(task).await;
            ticks += 1;

            match &outcome {
                Ok(output) => debug!("Tick {} finished: {:?}", ticks, output),
                Err(e) if is_http_status_error(e) => warn!("HTTP error: {:#}", e),
                Err(e) => error!("Loop error: {:#}", e),
            }

            let delay = self.delay_after(&outcome);
            tokio::select! {
                _ = &mut shutdown => {
                    info!("🛑 Shutdown requested, stopping after {} ticks", ticks);
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        ticks
    }
}

/// Run one tick, turning a panic into an ordinary tick error.
async fn guarded_tick<T: Tick>(task: &mut T) -> anyhow::Result<T::Output> {
    match AssertUnwindSafe(task.tick(unix_now())).catch_unwind().await {
        Ok(outcome) => outcome,
        Err(panic) => {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(anyhow!("tick panicked: {}", reason))
        }
    }
}

/// Only non-success status codes get the long backoff; transport and decode
/// failures are treated like any other error.
fn is_http_status_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<reqwest::Error>()
            .is_some_and(|e| e.is_status())
    })
}

fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
