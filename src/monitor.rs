//! Hooks for station monitor windows
//!
//! A monitor window only needs two things from the core: a per-station
//! switch to stop picking events, and a fixed-interval tick to redraw on.

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::{interval, Instant, Interval, MissedTickBehavior};
use tracing::info;

/// Per-station controls exposed to a monitor window
#[derive(Debug, Default)]
pub struct StationControl {
    station_code: String,
    picking_disabled: AtomicBool,
}

impl StationControl {
    pub fn new(station_code: impl Into<String>) -> Self {
        Self {
            station_code: station_code.into(),
            picking_disabled: AtomicBool::new(false),
        }
    }

    pub fn station_code(&self) -> &str {
        &self.station_code
    }

    pub fn is_picking_disabled(&self) -> bool {
        self.picking_disabled.load(Ordering::Relaxed)
    }

    pub fn set_picking_disabled(&self, disabled: bool) {
        let previous = self.picking_disabled.swap(disabled, Ordering::Relaxed);
        if previous != disabled {
            info!(station = %self.station_code, disabled, "Event picking toggled");
        }
    }
}

/// Fixed-interval redraw ticks for a monitor window
pub struct RedrawTicker {
    interval: Interval,
    ticks: u64,
}

impl RedrawTicker {
    /// Start ticking every `period`; the first tick fires immediately.
    pub fn new(period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(Error::Configuration(
                "redraw period must be non-zero".to_string(),
            ));
        }
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Ok(Self { interval, ticks: 0 })
    }

    /// Wait for the next tick and return its sequence number
    pub async fn tick(&mut self) -> (u64, Instant) {
        let at = self.interval.tick().await;
        self.ticks += 1;
        (self.ticks, at)
    }

    pub fn period(&self) -> Duration {
        self.interval.period()
    }
}
