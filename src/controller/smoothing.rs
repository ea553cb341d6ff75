//! Critically damped interpolation used to drive camera parameters smoothly toward their targets.
//!
//! [`smooth_damp`] steps a value toward a moving target with spring-like deceleration, bounded by
//! an optional maximum speed, without ever overshooting or oscillating. It is generic over the
//! [`Dampable`] value shape, covering scalars and vectors with one derivation. Orientations live
//! on the unit-quaternion sphere rather than in a Euclidean space, so they get their own simpler
//! operation, [`smooth_damp_quat`].
//!
//! These are pure functions: all state lives with the caller, who keeps one velocity value per
//! animated quantity alive between frames and passes it back in on every call.

use std::ops::{Add, Mul, Sub};

use bevy_math::{DQuat, DVec2, DVec3};

/// Smoothing times below this floor are clamped up to it, avoiding a division singularity when a
/// caller passes zero or a negative smoothing time.
pub const MIN_SMOOTH_TIME: f64 = 1e-4;

/// A value shape that can be driven by [`smooth_damp`].
///
/// Implementors supply the small amount of algebra the spring integrator needs beyond the standard
/// operator bounds: a zero value, a dot product, and a uniform magnitude clamp.
pub trait Dampable:
    Copy + Add<Output = Self> + Sub<Output = Self> + Mul<f64, Output = Self>
{
    /// The zero value, suitable for initializing velocity state.
    const ZERO: Self;

    /// Dot product. For scalars this is a plain product.
    fn dot(self, rhs: Self) -> f64;

    /// Clamp the magnitude to `max_length`, rescaling uniformly so direction is preserved.
    fn clamp_magnitude(self, max_length: f64) -> Self;
}

impl Dampable for f64 {
    const ZERO: Self = 0.0;

    fn dot(self, rhs: Self) -> f64 {
        self * rhs
    }

    fn clamp_magnitude(self, max_length: f64) -> Self {
        self.clamp(-max_length, max_length)
    }
}

impl Dampable for DVec2 {
    const ZERO: Self = DVec2::ZERO;

    fn dot(self, rhs: Self) -> f64 {
        self.dot(rhs)
    }

    fn clamp_magnitude(self, max_length: f64) -> Self {
        self.clamp_length_max(max_length)
    }
}

impl Dampable for DVec3 {
    const ZERO: Self = DVec3::ZERO;

    fn dot(self, rhs: Self) -> f64 {
        self.dot(rhs)
    }

    fn clamp_magnitude(self, max_length: f64) -> Self {
        self.clamp_length_max(max_length)
    }
}

/// Move `current` toward `target` over `delta_time` seconds, as a critically damped spring.
///
/// `velocity` is the persistent per-quantity state the caller carries between frames; it is
/// updated in place. `smooth_time` is roughly the time taken to close the gap absent a speed cap,
/// floored at [`MIN_SMOOTH_TIME`]. `max_speed` bounds the rate of change; pass [`f64::INFINITY`]
/// to leave it unbounded. A zero `delta_time` returns `current` and leaves the velocity unchanged.
///
/// The result never lands beyond the target: a step that would carry the value past it is clamped
/// to the target exactly, with the stored velocity zeroed out to match having arrived.
pub fn smooth_damp<T: Dampable>(
    current: T,
    target: T,
    velocity: &mut T,
    smooth_time: f64,
    max_speed: f64,
    delta_time: f64,
) -> T {
    // Based on Game Programming Gems 4, chapter 1.10.
    let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
    let omega = 2.0 / smooth_time;

    // Rational approximation of e^-x, accurate for the sub-second steps of a frame loop.
    let x = omega * delta_time;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    // The speed cap bounds the gap the integrator is allowed to see this step, not the
    // instantaneous velocity.
    let original_to = target;
    let change = (current - target).clamp_magnitude(max_speed * smooth_time);
    let target = current - change;

    let temp = (*velocity + change * omega) * delta_time;
    *velocity = (*velocity - temp * omega) * exp;
    let mut output = target + (change + temp) * exp;

    // A positive dot product means integration stepped past the target.
    if (original_to - current).dot(output - original_to) > 0.0 {
        output = original_to;
        *velocity = (output - original_to) * (1.0 / delta_time);
    }

    output
}

/// Ease an orientation toward a target orientation over `delta_time` seconds.
///
/// The spring derivation behind [`smooth_damp`] does not transfer to the unit-quaternion sphere,
/// so this uses a bounded shortest-arc slerp instead: the interpolation parameter is capped at
/// one, which rules out overshoot by construction, and no speed cap applies. `velocity` here is a
/// coarse memory of recent targets rather than a true angular velocity, but it must persist
/// between calls all the same.
pub fn smooth_damp_quat(
    current: DQuat,
    target: DQuat,
    velocity: &mut DQuat,
    smooth_time: f64,
    delta_time: f64,
) -> DQuat {
    let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
    let lerp_amount = (delta_time / smooth_time).min(1.0);
    *velocity = velocity.slerp(target, 1.0 / smooth_time);
    current.slerp(target, lerp_amount)
}
