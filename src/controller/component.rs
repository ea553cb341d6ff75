//! The primary [`Component`] of the controller, [`SmoothOrbitCam`].

use std::{f64::consts::FRAC_PI_2, time::Duration};

use bevy_ecs::prelude::*;
use bevy_log::prelude::*;
use bevy_math::{DQuat, DVec3, EulerRot, Vec3};
use bevy_reflect::prelude::*;
use bevy_time::prelude::*;
use bevy_transform::prelude::*;
use bevy_window::RequestRedraw;

use super::smoothing::{smooth_damp, smooth_damp_quat};

/// Keep the pitch this far short of straight up or down to avoid gimbal lock at the poles.
const PITCH_EPSILON: f64 = 1e-3;

/// Per-parameter motion below this threshold counts as stationary for redraw purposes.
const MOTION_THRESHOLD: f64 = 1e-5;

/// Tracks all state of a camera's orbit controller: the pose the camera is currently at, the pose
/// the user has asked for, and the velocity state the damped interpolation connecting the two
/// carries between frames.
///
/// Each orbit parameter (distance, yaw, pitch) is driven toward its target by [`smooth_damp`],
/// and the camera's facing is eased toward the look-at-center orientation by
/// [`smooth_damp_quat`]. The controller owns all persistent state; the damping functions
/// themselves are pure.
///
/// # Moving the camera
///
/// 1. Point the camera somewhere with [`set_orbit_center`](Self::set_orbit_center), and request a
///    pose with [`set_target_distance`](Self::set_target_distance),
///    [`set_target_yaw`](Self::set_target_yaw), [`set_target_pitch`](Self::set_target_pitch), or
///    the relative [`orbit_by`](Self::orbit_by) and [`zoom_by`](Self::zoom_by).
/// 2. Once per frame, [`update`](Self::update) eases the camera toward those targets and reports
///    whether anything moved. The [`update_controllers`](Self::update_controllers) system does
///    this for every camera, writes the resulting [`Transform`], and requests a redraw only for
///    cameras that actually moved, so an app rendering reactively can stay idle while the camera
///    is at rest.
#[derive(Debug, Clone, Component, Reflect)]
pub struct SmoothOrbitCam {
    /// The point the camera orbits around and looks toward, in world space.
    pub orbit_center: DVec3,
    /// Smoothing time constants for each damped parameter.
    pub smoothing: Smoothing,
    /// Upper bounds on how fast each damped parameter may change.
    pub speed_limits: SpeedLimits,
    /// Near and far bounds on the orbit distance. Targets are clamped when set.
    pub distance_limits: DistanceLimits,
    /// Set this when something other than the controller invalidated the frame, e.g. a window
    /// resize. The next [`update`](Self::update) will report a change even if the camera is at
    /// rest, then clear the flag.
    pub needs_update: bool,
    /// Current orbit distance. Managed by the controller.
    pub distance: f64,
    /// Current orbit yaw in radians. Managed by the controller.
    pub yaw: f64,
    /// Current orbit pitch in radians. Managed by the controller.
    pub pitch: f64,
    /// Orbit distance the camera is easing toward.
    pub target_distance: f64,
    /// Yaw the camera is easing toward, in radians.
    pub target_yaw: f64,
    /// Pitch the camera is easing toward, in radians.
    pub target_pitch: f64,
    /// Current camera facing. Managed by the controller.
    pub rotation: DQuat,
    /// Velocity state of the distance damper. Managed by the controller.
    pub distance_velocity: f64,
    /// Velocity state of the yaw damper. Managed by the controller.
    pub yaw_velocity: f64,
    /// Velocity state of the pitch damper. Managed by the controller.
    pub pitch_velocity: f64,
    /// Velocity state of the facing damper. Managed by the controller.
    pub rotation_velocity: DQuat,
}

impl Default for SmoothOrbitCam {
    fn default() -> Self {
        Self::new(DVec3::ZERO, 10.0)
    }
}

impl SmoothOrbitCam {
    /// Create a controller at rest, looking at `orbit_center` from `distance` along +Z.
    pub fn new(orbit_center: DVec3, distance: f64) -> Self {
        let mut cam = Self {
            orbit_center,
            smoothing: Default::default(),
            speed_limits: Default::default(),
            distance_limits: Default::default(),
            needs_update: true,
            distance,
            yaw: 0.0,
            pitch: 0.0,
            target_distance: distance,
            target_yaw: 0.0,
            target_pitch: 0.0,
            rotation: DQuat::IDENTITY,
            distance_velocity: 0.0,
            yaw_velocity: 0.0,
            pitch_velocity: 0.0,
            rotation_velocity: DQuat::IDENTITY,
        };
        cam.rotation = cam.facing_target();
        cam
    }

    /// Bound the orbit distance. The current target is re-clamped to the new limits.
    pub fn with_distance_limits(mut self, limits: DistanceLimits) -> Self {
        self.distance_limits = limits;
        self.set_target_distance(self.target_distance);
        self
    }

    /// Set the smoothing time constants.
    pub fn with_smoothing(mut self, smoothing: Smoothing) -> Self {
        self.smoothing = smoothing;
        self
    }

    /// Move the point the camera orbits around. The camera swings toward the new center over the
    /// next few frames via the facing damper rather than snapping.
    pub fn set_orbit_center(&mut self, center: DVec3) {
        if !center.is_finite() {
            warn_once!("Ignoring non-finite orbit center {center}");
            return;
        }
        self.orbit_center = center;
    }

    /// Request a new orbit distance, clamped to the [`DistanceLimits`].
    pub fn set_target_distance(&mut self, distance: f64) {
        if !distance.is_finite() {
            warn_once!("Ignoring non-finite target distance {distance}");
            return;
        }
        self.target_distance = distance.clamp(self.distance_limits.min, self.distance_limits.max);
    }

    /// Request a new orbit yaw, in radians.
    pub fn set_target_yaw(&mut self, yaw: f64) {
        if !yaw.is_finite() {
            warn_once!("Ignoring non-finite target yaw {yaw}");
            return;
        }
        self.target_yaw = yaw;
    }

    /// Request a new orbit pitch, in radians, clamped just short of the poles.
    pub fn set_target_pitch(&mut self, pitch: f64) {
        if !pitch.is_finite() {
            warn_once!("Ignoring non-finite target pitch {pitch}");
            return;
        }
        let limit = FRAC_PI_2 - PITCH_EPSILON;
        self.target_pitch = pitch.clamp(-limit, limit);
    }

    /// Nudge the orbit target by the given yaw and pitch deltas, in radians.
    pub fn orbit_by(&mut self, yaw: f64, pitch: f64) {
        self.set_target_yaw(self.target_yaw + yaw);
        self.set_target_pitch(self.target_pitch + pitch);
    }

    /// Nudge the target distance by the given amount. Negative zooms in.
    pub fn zoom_by(&mut self, amount: f64) {
        self.set_target_distance(self.target_distance + amount);
    }

    /// Jump straight to the current targets, discarding all velocity state.
    pub fn snap_to_target(&mut self) {
        self.distance = self.target_distance;
        self.yaw = self.target_yaw;
        self.pitch = self.target_pitch;
        self.distance_velocity = 0.0;
        self.yaw_velocity = 0.0;
        self.pitch_velocity = 0.0;
        self.rotation = self.facing_target();
        self.rotation_velocity = DQuat::IDENTITY;
        self.needs_update = true;
    }

    /// World position of the camera implied by the current orbit state.
    pub fn eye_position(&self) -> DVec3 {
        let offset = DQuat::from_euler(EulerRot::YXZ, self.yaw, -self.pitch, 0.0)
            * (DVec3::Z * self.distance);
        self.orbit_center + offset
    }

    /// The camera pose implied by the current orbit state, converted to render precision.
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye_position().as_vec3())
            .with_rotation(self.rotation.as_quat().normalize())
    }

    /// The orientation looking from the current eye position toward the orbit center.
    fn facing_target(&self) -> DQuat {
        let forward = self.orbit_center - self.eye_position();
        Transform::default()
            .looking_to(forward.as_vec3(), Vec3::Y)
            .rotation
            .as_dquat()
    }

    /// Advance the controller by `delta_time`, easing every parameter toward its target.
    ///
    /// Returns whether the camera moved this frame (or [`needs_update`](Self::needs_update) was
    /// set), which is the signal a reactive renderer uses to decide whether to redraw.
    pub fn update(&mut self, delta_time: Duration) -> bool {
        let dt = delta_time.as_secs_f64();

        let last_distance = self.distance;
        let last_yaw = self.yaw;
        let last_pitch = self.pitch;
        let last_rotation = self.rotation;

        self.distance = smooth_damp(
            self.distance,
            self.target_distance,
            &mut self.distance_velocity,
            self.smoothing.zoom,
            self.speed_limits.zoom,
            dt,
        );
        self.yaw = smooth_damp(
            self.yaw,
            self.target_yaw,
            &mut self.yaw_velocity,
            self.smoothing.orbit,
            self.speed_limits.orbit,
            dt,
        );
        self.pitch = smooth_damp(
            self.pitch,
            self.target_pitch,
            &mut self.pitch_velocity,
            self.smoothing.orbit,
            self.speed_limits.orbit,
            dt,
        );

        let facing = self.facing_target();
        self.rotation = smooth_damp_quat(
            self.rotation,
            facing,
            &mut self.rotation_velocity,
            self.smoothing.rotation,
            dt,
        )
        .normalize();

        let moved = (self.distance - last_distance).abs() > MOTION_THRESHOLD
            || (self.yaw - last_yaw).abs() > MOTION_THRESHOLD
            || (self.pitch - last_pitch).abs() > MOTION_THRESHOLD
            || self.rotation.angle_between(last_rotation) > MOTION_THRESHOLD;

        let changed = moved || self.needs_update;
        self.needs_update = false;
        changed
    }

    /// Advance every controller and write the resulting pose, requesting a redraw for each camera
    /// that moved. Called once per frame.
    pub fn update_controllers(
        mut cameras: Query<(&mut SmoothOrbitCam, &mut Transform)>,
        time: Res<Time>,
        mut redraw: EventWriter<RequestRedraw>,
    ) {
        for (mut controller, mut transform) in cameras.iter_mut() {
            if controller.update(time.delta()) {
                *transform = controller.transform();
                redraw.write(RequestRedraw);
            }
        }
    }
}

/// Smoothing time constants, in seconds, for each damped camera parameter.
///
/// Each is roughly the time the parameter takes to close most of the gap to a new target. Values
/// at or below zero are floored by the damping functions rather than rejected.
#[derive(Debug, Clone, Copy, Reflect)]
pub struct Smoothing {
    /// Smoothing time of the yaw and pitch dampers.
    pub orbit: f64,
    /// Smoothing time of the distance damper.
    pub zoom: f64,
    /// Smoothing time of the facing damper.
    pub rotation: f64,
}

impl Default for Smoothing {
    fn default() -> Self {
        Self {
            orbit: 0.25,
            zoom: 0.3,
            rotation: 0.25,
        }
    }
}

/// Upper bounds on how fast each damped parameter may change. Unbounded by default.
#[derive(Debug, Clone, Copy, Reflect)]
pub struct SpeedLimits {
    /// Maximum angular speed of the yaw and pitch dampers, in radians per second.
    pub orbit: f64,
    /// Maximum speed of the distance damper, in world units per second.
    pub zoom: f64,
}

impl Default for SpeedLimits {
    fn default() -> Self {
        Self {
            orbit: f64::INFINITY,
            zoom: f64::INFINITY,
        }
    }
}

/// Bounds on the orbit distance.
///
/// Keeps the camera from easing into the orbit center or drifting arbitrarily far away. Applied
/// when a target distance is set, so the damped value itself never needs correcting mid-flight.
#[derive(Debug, Clone, Copy, Reflect)]
pub struct DistanceLimits {
    /// The smallest allowed orbit distance, in world units.
    pub min: f64,
    /// The largest allowed orbit distance, in world units.
    pub max: f64,
}

impl Default for DistanceLimits {
    fn default() -> Self {
        Self {
            min: 1e-4,
            max: f64::INFINITY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: Duration = Duration::from_nanos(16_666_667); // 60 fps

    fn settled(cam: &mut SmoothOrbitCam) {
        cam.snap_to_target();
        // Consume the needs_update set by the snap.
        cam.update(DT);
    }

    #[test]
    fn at_rest_reports_no_change() {
        let mut cam = SmoothOrbitCam::new(DVec3::ZERO, 10.0);
        settled(&mut cam);
        for _ in 0..10 {
            assert!(!cam.update(DT));
        }
    }

    #[test]
    fn new_target_reports_change_until_settled() {
        let mut cam = SmoothOrbitCam::new(DVec3::ZERO, 10.0);
        settled(&mut cam);
        cam.set_target_distance(5.0);
        assert!(cam.update(DT), "first frame after a new target must move");
        // Run well past the smoothing time; the camera must come to rest again.
        for _ in 0..600 {
            cam.update(DT);
        }
        assert!(!cam.update(DT), "camera failed to settle");
        assert!((cam.distance - 5.0).abs() < 1e-3, "distance {}", cam.distance);
    }

    #[test]
    fn needs_update_forces_a_single_change() {
        let mut cam = SmoothOrbitCam::new(DVec3::ZERO, 10.0);
        settled(&mut cam);
        cam.needs_update = true;
        assert!(cam.update(DT));
        assert!(!cam.update(DT));
    }

    #[test]
    fn target_distance_is_clamped_to_limits() {
        let mut cam = SmoothOrbitCam::new(DVec3::ZERO, 10.0)
            .with_distance_limits(DistanceLimits { min: 6.0, max: 15.0 });
        cam.set_target_distance(2.0);
        assert_eq!(cam.target_distance, 6.0);
        cam.set_target_distance(100.0);
        assert_eq!(cam.target_distance, 15.0);
    }

    #[test]
    fn target_pitch_is_clamped_short_of_poles() {
        let mut cam = SmoothOrbitCam::default();
        cam.set_target_pitch(2.0);
        assert!(cam.target_pitch < FRAC_PI_2);
        cam.set_target_pitch(-2.0);
        assert!(cam.target_pitch > -FRAC_PI_2);
    }

    #[test]
    fn non_finite_targets_are_ignored() {
        let mut cam = SmoothOrbitCam::default();
        let before = cam.target_distance;
        cam.set_target_distance(f64::NAN);
        cam.set_target_yaw(f64::INFINITY);
        cam.set_orbit_center(DVec3::splat(f64::NAN));
        assert_eq!(cam.target_distance, before);
        assert_eq!(cam.target_yaw, 0.0);
        assert!(cam.orbit_center.is_finite());
    }

    #[test]
    fn eye_keeps_the_target_distance_after_settling() {
        let mut cam = SmoothOrbitCam::new(DVec3::new(1.0, 2.0, 3.0), 10.0);
        settled(&mut cam);
        cam.set_target_distance(6.0);
        cam.orbit_by(1.0, 0.5);
        for _ in 0..600 {
            cam.update(DT);
        }
        let eye = cam.eye_position();
        assert!(
            (eye.distance(cam.orbit_center) - 6.0).abs() < 1e-2,
            "eye ended {} from center",
            eye.distance(cam.orbit_center)
        );
    }

    #[test]
    fn settled_camera_faces_the_orbit_center() {
        let mut cam = SmoothOrbitCam::new(DVec3::ZERO, 8.0);
        settled(&mut cam);
        cam.orbit_by(0.8, -0.3);
        for _ in 0..600 {
            cam.update(DT);
        }
        let transform = cam.transform();
        let forward = transform.rotation * Vec3::NEG_Z;
        let to_center = (cam.orbit_center.as_vec3() - transform.translation).normalize();
        assert!(
            forward.dot(to_center) > 0.999,
            "camera looks {forward} but center is toward {to_center}"
        );
    }

    #[test]
    fn transform_rotation_stays_normalized() {
        let mut cam = SmoothOrbitCam::default();
        cam.orbit_by(2.0, 1.0);
        for _ in 0..120 {
            cam.update(DT);
            let norm = cam.transform().rotation.length();
            assert!((norm - 1.0).abs() < 1e-4, "rotation norm drifted to {norm}");
        }
    }
}
