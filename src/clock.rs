//! Time sources for the simulators.
//!
//! Every simulator first models a duration and then hands it to a [`Clock`]
//! to realize it. [`WallClock`] blocks the calling thread for the modeled
//! interval; [`SimulatedClock`] only advances a virtual counter, which keeps
//! test suites instant and makes measured times exact sums of modeled ones.

use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    /// Time elapsed since the clock was created.
    fn now(&self) -> Duration;

    /// Realize a modeled delay.
    fn advance(&self, delay: Duration);

    /// Time elapsed since an earlier reading of `now`.
    fn since(&self, start: Duration) -> Duration {
        self.now().saturating_sub(start)
    }
}

pub type SharedClock = Arc<dyn Clock>;

/// Real time; delays block the current thread.
#[derive(Debug)]
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn advance(&self, delay: Duration) {
        std::thread::sleep(delay);
    }
}

/// Virtual time; delays return immediately.
#[derive(Debug, Default)]
pub struct SimulatedClock {
    elapsed_nanos: AtomicU64,
}

impl SimulatedClock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clock for SimulatedClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.elapsed_nanos.load(Ordering::SeqCst))
    }

    fn advance(&self, delay: Duration) {
        let nanos = u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX);
        self.elapsed_nanos.fetch_add(nanos, Ordering::SeqCst);
    }
}

/// Which clock the experiment binary builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClockMode {
    #[default]
    Wall,
    Simulated,
}

impl ClockMode {
    pub fn build(self) -> SharedClock {
        match self {
            ClockMode::Wall => Arc::new(WallClock::new()),
            ClockMode::Simulated => Arc::new(SimulatedClock::new()),
        }
    }
}

/// Convert modeled seconds to a duration, never going below `min_secs`.
///
/// NaN and infinite values (e.g. `log` of a zero dataset size) collapse to the floor.
pub fn floor_duration(secs: f64, min_secs: f64) -> Duration {
    let secs = if secs.is_finite() && secs > min_secs {
        secs
    } else {
        min_secs
    };
    Duration::from_secs_f64(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simulated_clock_advances_without_sleeping() {
        let clock = SimulatedClock::new();
        let wall = Instant::now();

        clock.advance(Duration::from_secs(3600));
        clock.advance(Duration::from_millis(5));

        assert_eq!(clock.now(), Duration::from_millis(3_600_005));
        assert!(wall.elapsed() < Duration::from_secs(1), "Simulated clock must not block");
    }

    #[test]
    fn test_since_is_saturating() {
        let clock = SimulatedClock::new();
        clock.advance(Duration::from_millis(10));
        assert_eq!(clock.since(Duration::from_secs(1)), Duration::ZERO);
        assert_eq!(clock.since(Duration::from_millis(4)), Duration::from_millis(6));
    }

    #[test]
    fn test_wall_clock_blocks_for_the_delay() {
        let clock = WallClock::new();
        let start = clock.now();

        clock.advance(Duration::from_millis(20));

        assert!(clock.since(start) >= Duration::from_millis(20));
    }

    #[test]
    fn test_floor_duration_clamps() {
        assert_eq!(floor_duration(-0.5, 0.001), Duration::from_secs_f64(0.001));
        assert_eq!(floor_duration(f64::NAN, 0.001), Duration::from_secs_f64(0.001));
        assert_eq!(floor_duration(f64::NEG_INFINITY, 0.01), Duration::from_secs_f64(0.01));
        assert_eq!(floor_duration(0.25, 0.001), Duration::from_secs_f64(0.25));
    }
}
