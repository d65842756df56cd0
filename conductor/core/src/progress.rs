//! Progress Estimation
//!
//! The solver reports nothing while it works, so progress is synthetic: a
//! ticker creeps the value up to a cap, it jumps to 100 when the solve
//! resolves and drops back to 0 a moment later.
//!
//! # Design Philosophy
//!
//! The estimator owns its timers. Starting a new estimate aborts both the
//! running ticker and any pending reset, so a reset scheduled by the previous
//! task can never clobber a fresh one. Surfaces observe the value through a
//! `watch` channel and never write to it.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant, MissedTickBehavior};

/// Estimator tuning
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressConfig {
    /// Time between increments
    pub tick_interval: Duration,
    /// Percentage points added per tick
    pub increment: u8,
    /// Highest value reached while pending
    pub cap: u8,
    /// How long 100 stays visible after resolution
    pub reset_delay: Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(500),
            increment: 10,
            cap: 90,
            reset_delay: Duration::from_millis(1000),
        }
    }
}

/// What the estimator is doing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressPhase {
    /// No estimate running
    Idle,
    /// Ticking towards the cap
    Running,
    /// Showing 100 until the reset fires
    Completing,
}

/// Synthetic progress for an in-flight solve
pub struct ProgressEstimator {
    config: ProgressConfig,
    tx: Arc<watch::Sender<u8>>,
    ticker: Option<JoinHandle<()>>,
    reset_timer: Option<JoinHandle<()>>,
}

impl ProgressEstimator {
    /// Create an idle estimator at 0
    #[must_use]
    pub fn new(config: ProgressConfig) -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            config,
            tx: Arc::new(tx),
            ticker: None,
            reset_timer: None,
        }
    }

    /// Start a new estimate from 0
    ///
    /// Must be called from within a tokio runtime.
    pub fn begin(&mut self) {
        self.abort_timers();
        self.tx.send_replace(0);

        let tx = Arc::clone(&self.tx);
        let ProgressConfig {
            tick_interval,
            increment,
            cap,
            ..
        } = self.config;

        self.ticker = Some(tokio::spawn(async move {
            let mut interval = interval_at(Instant::now() + tick_interval, tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let mut reached_cap = false;
                tx.send_modify(|value| {
                    *value = value.saturating_add(increment).min(cap);
                    reached_cap = *value >= cap;
                });
                if reached_cap {
                    break;
                }
            }
        }));
        tracing::trace!("Progress estimate started");
    }

    /// Mark the estimate complete: 100 now, 0 after the reset delay
    pub fn finish(&mut self) {
        self.abort_timers();
        self.tx.send_replace(100);

        let tx = Arc::clone(&self.tx);
        let delay = self.config.reset_delay;
        self.reset_timer = Some(tokio::spawn(async move {
            sleep(delay).await;
            tx.send_replace(0);
        }));
        tracing::trace!("Progress estimate finished");
    }

    /// Stop everything and return to 0
    pub fn cancel(&mut self) {
        self.abort_timers();
        self.tx.send_replace(0);
    }

    /// Current value
    #[must_use]
    pub fn value(&self) -> u8 {
        *self.tx.borrow()
    }

    /// Receiver for value changes
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.tx.subscribe()
    }

    /// Current phase
    #[must_use]
    pub fn phase(&self) -> ProgressPhase {
        // The ticker exits at the cap but the estimate is still running
        if self.ticker.is_some() {
            ProgressPhase::Running
        } else if self.reset_timer.as_ref().is_some_and(|h| !h.is_finished()) {
            ProgressPhase::Completing
        } else {
            ProgressPhase::Idle
        }
    }

    /// Estimator tuning
    #[must_use]
    pub fn config(&self) -> &ProgressConfig {
        &self.config
    }

    fn abort_timers(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
        if let Some(handle) = self.reset_timer.take() {
            handle.abort();
        }
    }
}

impl Drop for ProgressEstimator {
    fn drop(&mut self) {
        self.abort_timers();
    }
}
