//! Frame pacing helpers
//!
//! The render loop itself is the window's redraw cycle (see [`crate::app`]);
//! presentation in FIFO mode blocks until the display is ready, which paces
//! it. This module holds the pieces the loop needs around that: a clock
//! producing clamped frame deltas and a token to stop the loop.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Seconds since the previous tick
    pub dt: f32,
    pub now: Instant,
    pub frame_index: u64,
}

/// Produces [`FrameTime`] snapshots.
///
/// Delta time is clamped so a stall (debugger, minimized window) does not
/// make a tween jump to its end in one frame.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            last: Instant::now(),
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Resets the baseline, e.g. after the window was hidden
    pub fn reset(&mut self) {
        self.last = Instant::now();
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let frame = FrameTime {
            dt: dt.as_secs_f32(),
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        frame
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellation flag for the frame loop.
///
/// Clones share the flag, so a handle can be given to anything that needs to
/// end the loop (key handler, close request, fatal surface error).
#[derive(Debug, Clone, Default)]
pub struct StopToken {
    stopped: Arc<AtomicBool>,
}

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_is_clamped() {
        let mut clock =
            FrameClock::with_clamps(Duration::from_millis(1), Duration::from_millis(100));
        let start = Instant::now();
        clock.last = start;

        let frame = clock.tick_at(start);
        assert!((frame.dt - 0.001).abs() < 1e-6);

        let frame = clock.tick_at(start + Duration::from_secs(5));
        assert!((frame.dt - 0.1).abs() < 1e-6);

        let frame = clock.tick_at(start + Duration::from_secs(5) + Duration::from_millis(16));
        assert!((frame.dt - 0.016).abs() < 1e-4);
    }

    #[test]
    fn frame_index_counts_up() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick().frame_index, 0);
        assert_eq!(clock.tick().frame_index, 1);
        assert_eq!(clock.frame_index(), 2);
    }

    #[test]
    fn stop_token_is_shared_between_clones() {
        let token = StopToken::new();
        let handle = token.clone();
        assert!(!token.is_stopped());
        handle.stop();
        assert!(token.is_stopped());
    }

    #[test]
    fn stop_token_crosses_threads() {
        let token = StopToken::new();
        let handle = token.clone();
        std::thread::spawn(move || handle.stop())
            .join()
            .expect("stopper thread panicked");
        assert!(token.is_stopped());
    }
}
