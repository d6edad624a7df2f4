use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Clamped time since the previous tick, in seconds.
    pub dt: f32,

    /// Sum of all clamped `dt` values since the clock was created or reset.
    pub elapsed: f32,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Produces `FrameTime` snapshots.
///
/// Delta time is clamped so a debugger pause or a minimized window does not
/// produce a huge step in the light animation.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    elapsed: f32,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub const DEFAULT_DT_MIN: Duration = Duration::from_micros(100);
    pub const DEFAULT_DT_MAX: Duration = Duration::from_millis(250);

    pub fn new() -> Self {
        Self::with_clamps(Self::DEFAULT_DT_MIN, Self::DEFAULT_DT_MAX)
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            elapsed: 0.0,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Resets the baseline without touching the frame counter.
    pub fn reset(&mut self) {
        self.last = Instant::now();
        self.elapsed = 0.0;
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let now = Instant::now();
        let raw = now.saturating_duration_since(self.last);
        self.last = now;
        self.advance(raw)
    }

    fn advance(&mut self, raw: Duration) -> FrameTime {
        let dt = raw.clamp(self.dt_min, self.dt_max).as_secs_f32();
        self.elapsed += dt;

        let ft = FrameTime {
            dt,
            elapsed: self.elapsed,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dt_is_clamped_both_ways() {
        let mut clock = FrameClock::new();
        let fast = clock.advance(Duration::ZERO);
        assert!((fast.dt - 0.0001).abs() < 1e-6);

        let stalled = clock.advance(Duration::from_secs(3));
        assert!((stalled.dt - 0.25).abs() < 1e-6);
    }

    #[test]
    fn elapsed_and_index_accumulate() {
        let mut clock = FrameClock::new();
        for _ in 0..4 {
            clock.advance(Duration::from_millis(10));
        }
        let ft = clock.advance(Duration::from_millis(10));
        assert_eq!(ft.frame_index, 4);
        assert!((ft.elapsed - 0.05).abs() < 1e-4);
    }

    #[test]
    fn reset_clears_elapsed_only() {
        let mut clock = FrameClock::new();
        clock.advance(Duration::from_millis(100));
        clock.reset();
        let ft = clock.advance(Duration::from_millis(10));
        assert_eq!(ft.frame_index, 1);
        assert!((ft.elapsed - 0.01).abs() < 1e-4);
    }
}
