//! The camera controller and the damped interpolation that drives it.

pub mod component;
pub mod smoothing;
