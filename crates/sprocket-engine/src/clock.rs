//! Loop pacing: a sleeping wall-clock pacer and a fixed-step test clock.

use crate::platform::Clock;
use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// FrameClock
// ---------------------------------------------------------------------------

/// Real-time pacer. Sleeps out the remainder of each frame budget, then
/// reports the true elapsed wall-clock time, so a slow frame yields a large
/// `dt` instead of slowing the simulation down.
#[derive(Debug)]
pub struct FrameClock {
    last: Instant,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FrameClock {
    /// A `target_fps` of 0 disables pacing and reports raw elapsed time.
    fn tick(&mut self, target_fps: u32) -> f64 {
        if target_fps > 0 {
            let budget = Duration::from_secs_f64(1.0 / f64::from(target_fps));
            let spent = self.last.elapsed();
            if spent < budget {
                std::thread::sleep(budget - spent);
            }
        }
        let now = Instant::now();
        let dt = now.duration_since(self.last);
        self.last = now;
        dt.as_secs_f64() * 1000.0
    }
}

// ---------------------------------------------------------------------------
// ManualClock
// ---------------------------------------------------------------------------

/// Fixed-step clock that never sleeps. Every frame reports exactly the
/// configured `dt_ms`, which makes headless runs deterministic and fast.
#[derive(Debug, Clone)]
pub struct ManualClock {
    dt_ms: f64,
}

impl ManualClock {
    pub fn new(dt_ms: f64) -> Self {
        Self { dt_ms }
    }
}

impl Clock for ManualClock {
    fn tick(&mut self, _target_fps: u32) -> f64 {
        self.dt_ms
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
