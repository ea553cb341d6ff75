//! A smooth-damped orbit camera controller for Bevy.
//!
//! The heart of the crate is a critically damped "spring-following" interpolator,
//! [`smooth_damp`](controller::smoothing::smooth_damp), that drives a value toward a moving
//! target over time, bounded by an optional maximum speed, without overshoot or oscillation. The
//! [`SmoothOrbitCam`](controller::component::SmoothOrbitCam) component uses it to animate a
//! camera's orbit distance, yaw, pitch, and facing toward user-requested targets, and reports
//! each frame whether anything moved so a reactively rendering app knows when a redraw is needed.
//!
//! Add [`SmoothOrbitCamPlugin`] and attach a `SmoothOrbitCam` to a camera entity, then steer it
//! with the `set_target_*` methods. The damping primitives are also usable on their own for any
//! quantity that needs smoothing.

pub mod controller;

/// Common imports.
pub mod prelude {
    pub use crate::{
        controller::{
            component::{DistanceLimits, Smoothing, SmoothOrbitCam, SpeedLimits},
            smoothing::{smooth_damp, smooth_damp_quat, Dampable, MIN_SMOOTH_TIME},
        },
        SmoothOrbitCamPlugin,
    };
}

use bevy_app::prelude::*;

use controller::component::SmoothOrbitCam;

/// Adds the system that advances every [`SmoothOrbitCam`] once per frame, writing camera
/// transforms and requesting redraws only when something moved.
pub struct SmoothOrbitCamPlugin;

impl Plugin for SmoothOrbitCamPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PreUpdate, SmoothOrbitCam::update_controllers)
            .register_type::<SmoothOrbitCam>();
    }
}

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use bevy_app::prelude::*;
    use bevy_ecs::prelude::*;
    use bevy_math::DVec3;
    use bevy_time::Time;
    use bevy_transform::prelude::*;
    use bevy_window::RequestRedraw;
    use std::time::Duration;

    #[test]
    fn plugin_moves_camera_and_requests_redraw() {
        let mut app = App::new();
        app.add_plugins(SmoothOrbitCamPlugin)
            .add_event::<RequestRedraw>()
            // Drive the clock by hand so the test is deterministic.
            .insert_resource(Time::<()>::default());

        let mut cam = SmoothOrbitCam::new(DVec3::ZERO, 10.0);
        cam.set_target_distance(5.0);
        let camera = app.world_mut().spawn((cam, Transform::default())).id();

        for _ in 0..10 {
            app.world_mut()
                .resource_mut::<Time>()
                .advance_by(Duration::from_millis(16));
            app.update();
        }

        let redraws = app.world().resource::<Events<RequestRedraw>>();
        assert!(!redraws.is_empty(), "no redraw requested for a moving camera");

        let controller = app.world().get::<SmoothOrbitCam>(camera).unwrap();
        assert!(controller.distance < 10.0, "distance did not move toward target");
        let transform = app.world().get::<Transform>(camera).unwrap();
        assert!(
            transform.translation.z < 10.0 && transform.translation.z > 5.0,
            "transform not written: {}",
            transform.translation
        );
    }
}
