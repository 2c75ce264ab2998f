//! Time-based interpolation
//!
//! A [`Tween`] is advanced explicitly once per frame by the caller; nothing
//! here schedules itself.

pub mod easing;
pub mod tween;

pub use easing::Easing;
pub use tween::Tween;
