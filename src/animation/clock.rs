use std::time::Instant;

/// Source of elapsed time for the animation driver.
///
/// Implementations must be monotonic: successive reads never decrease until
/// the next `reset`.
pub trait FrameClock {
    /// Restart counting from zero.
    fn reset(&mut self);

    /// Seconds since the last reset.
    fn elapsed_seconds(&self) -> f32;
}

/// Wall clock backed by [`Instant`].
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for MonotonicClock {
    fn reset(&mut self) {
        self.start = Instant::now();
    }

    fn elapsed_seconds(&self) -> f32 {
        self.start.elapsed().as_secs_f32()
    }
}

/// Clock advanced by hand, for deterministic tests and offline rendering.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualClock {
    elapsed: f32,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward. Negative or non-finite steps are ignored.
    pub fn advance(&mut self, seconds: f32) {
        if seconds.is_finite() && seconds > 0.0 {
            self.elapsed += seconds;
        }
    }
}

impl FrameClock for ManualClock {
    fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    fn elapsed_seconds(&self) -> f32 {
        self.elapsed
    }
}
