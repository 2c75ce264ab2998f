use cgmath::VectorSpace;

use super::easing::Easing;

/// Relative slack under which a tween counts as finished
const DURATION_EPSILON: f32 = 1e-5;

/// Per-frame interpolation state machine.
///
/// Holds the value the animation started from, the target, the elapsed time
/// and the easing curve. [`Tween::retarget`] restarts from the current value,
/// so a burst of new targets never queues: the last one wins.
#[derive(Debug, Clone, Copy)]
pub struct Tween<T> {
    start: T,
    target: T,
    current: T,
    elapsed: f32,
    duration: f32,
    easing: Easing,
}

impl<T> Tween<T>
where
    T: VectorSpace<Scalar = f32>,
{
    /// Creates a tween resting at `value`
    pub fn new(value: T, duration: f32, easing: Easing) -> Self {
        Self {
            start: value,
            target: value,
            current: value,
            elapsed: duration.max(0.0),
            duration: duration.max(0.0),
            easing,
        }
    }

    /// Starts animating from the current value toward `target`
    pub fn retarget(&mut self, target: T) {
        self.start = self.current;
        self.target = target;
        self.elapsed = 0.0;
        if self.duration == 0.0 {
            self.current = target;
        }
    }

    /// Jumps to `value` and stops
    pub fn snap(&mut self, value: T) {
        self.start = value;
        self.target = value;
        self.current = value;
        self.elapsed = self.duration;
    }

    /// Advances by `dt` seconds and returns the new value
    pub fn advance(&mut self, dt: f32) -> T {
        if self.is_finished() {
            return self.current;
        }

        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        // frame deltas summed in f32 land just short of the duration
        if self.duration - self.elapsed <= self.duration * DURATION_EPSILON {
            self.elapsed = self.duration;
        }
        let progress = self.easing.apply(self.elapsed / self.duration);
        self.current = if self.elapsed >= self.duration {
            self.target
        } else {
            self.start.lerp(self.target, progress)
        };
        self.current
    }

    pub fn value(&self) -> T {
        self.current
    }

    pub fn target(&self) -> T {
        self.target
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }
}
