/// Easing curves mapping normalized time `t` in `[0, 1]` to progress.
///
/// Every curve satisfies `apply(0) == 0` and `apply(1) == 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Easing {
    Linear,
    /// Quadratic ease-out, `1 - (1 - t)^2`
    Power1Out,
    /// Cubic ease-out, `1 - (1 - t)^3`
    Power2Out,
    /// Quadratic ease-in-out
    Power1InOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::Power1Out => 1.0 - (1.0 - t).powi(2),
            Easing::Power2Out => 1.0 - (1.0 - t).powi(3),
            Easing::Power1InOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
        }
    }
}

impl Default for Easing {
    fn default() -> Self {
        Easing::Power1Out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 4] = [
        Easing::Linear,
        Easing::Power1Out,
        Easing::Power2Out,
        Easing::Power1InOut,
    ];

    #[test]
    fn endpoints_are_fixed() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-6, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6, "{easing:?} at 1");
        }
    }

    #[test]
    fn curves_are_monotonic() {
        for easing in ALL {
            let mut previous = 0.0;
            for step in 1..=100 {
                let value = easing.apply(step as f32 / 100.0);
                assert!(value >= previous, "{easing:?} decreased at step {step}");
                previous = value;
            }
        }
    }

    #[test]
    fn out_of_range_time_is_clamped() {
        assert_eq!(Easing::Power1Out.apply(-1.0), 0.0);
        assert_eq!(Easing::Power1Out.apply(3.0), 1.0);
    }

    #[test]
    fn power1_out_front_loads_progress() {
        assert!((Easing::Power1Out.apply(0.5) - 0.75).abs() < 1e-6);
    }
}
