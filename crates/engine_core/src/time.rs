//! Stepped simulation clock.

use std::time::Duration;

/// Simulation clock fed with explicit frame durations.
///
/// Frame time accumulates until whole fixed steps are available, so animation timing depends
/// only on the durations passed to [`Time::advance`] and never on the wall clock.
#[derive(Debug, Clone)]
pub struct Time {
    /// Total time advanced since start.
    elapsed: Duration,
    /// Frames advanced since start.
    frame_count: u64,
    /// Fixed timestep for simulation (default 60 Hz).
    fixed_timestep: Duration,
    /// Advanced time not yet consumed by fixed steps.
    accumulator: Duration,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a clock stepping at 60 Hz.
    pub fn new() -> Self {
        Self::with_fixed_rate(60.0)
    }

    /// Create a clock stepping at `hz` fixed updates per second.
    pub fn with_fixed_rate(hz: f64) -> Self {
        Self {
            elapsed: Duration::ZERO,
            frame_count: 0,
            fixed_timestep: Duration::from_secs_f64(1.0 / hz),
            accumulator: Duration::ZERO,
        }
    }

    /// Step the clock by one frame of `delta`.
    pub fn advance(&mut self, delta: Duration) {
        self.elapsed += delta;
        self.frame_count += 1;
        self.accumulator += delta;
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn fixed_timestep(&self) -> Duration {
        self.fixed_timestep
    }

    pub fn fixed_timestep_seconds(&self) -> f32 {
        self.fixed_timestep.as_secs_f32()
    }

    /// Check if a fixed update should run and consume the time.
    pub fn should_fixed_update(&mut self) -> bool {
        if self.accumulator >= self.fixed_timestep {
            self.accumulator -= self.fixed_timestep;
            true
        } else {
            false
        }
    }
}
