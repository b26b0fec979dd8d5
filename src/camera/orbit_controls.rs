use crate::camera::PerspectiveCamera;
use glamx::Vec3;
use serde::{Deserialize, Serialize};
use std::f32;

const EPS: f32 = 0.000001;

/// Orbit controller settings.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrbitSettings {
    /// Rotate around the target on every update.
    pub auto_rotate: bool,
    /// Auto-rotation speed. At 60 updates per second, 2.0 is one turn every 30 seconds.
    pub auto_rotate_speed: f32,
    /// Smooth out rotations over several updates.
    pub enable_damping: bool,
    /// Fraction of the pending rotation applied per update when damping.
    pub damping_factor: f32,
    /// Minimum distance to the target.
    pub min_distance: f32,
    /// Maximum distance to the target.
    pub max_distance: f32,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        OrbitSettings {
            auto_rotate: true,
            auto_rotate_speed: 0.5,
            enable_damping: false,
            damping_factor: 0.05,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
        }
    }
}

/// Orbits a [`PerspectiveCamera`] around a target point.
///
/// Rotations requested through [`rotate_left`](Self::rotate_left) and
/// [`rotate_up`](Self::rotate_up) accumulate and are applied by
/// [`update`](Self::update), once per frame.
#[derive(Clone, Debug, PartialEq)]
pub struct OrbitControls {
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Controller settings.
    pub settings: OrbitSettings,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self::new(OrbitSettings::default())
    }
}

impl OrbitControls {
    /// Creates controls orbiting around the origin.
    pub fn new(settings: OrbitSettings) -> OrbitControls {
        OrbitControls {
            target: Vec3::ZERO,
            settings,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
        }
    }

    /// Rotation applied per update by auto-rotation.
    pub fn auto_rotation_angle(&self) -> f32 {
        2.0 * f32::consts::PI / 60.0 / 60.0 * self.settings.auto_rotate_speed
    }

    /// Queues a rotation around the up axis.
    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    /// Queues a rotation towards the pole.
    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Queues a zoom: factors below 1.0 move closer.
    pub fn zoom(&mut self, factor: f32) {
        self.scale *= factor;
    }

    /// Applies pending rotations to `camera`. Returns `true` if the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        if self.settings.auto_rotate {
            self.rotate_left(self.auto_rotation_angle());
        }

        let offset = camera.position - self.target;
        let radius = offset.length();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > 0.0 {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            0.0
        };

        if self.settings.enable_damping {
            theta += self.delta_theta * self.settings.damping_factor;
            phi += self.delta_phi * self.settings.damping_factor;
        } else {
            theta += self.delta_theta;
            phi += self.delta_phi;
        }

        let phi = phi.clamp(EPS, f32::consts::PI - EPS);
        let radius = (radius * self.scale).clamp(self.settings.min_distance, self.settings.max_distance);

        let new_offset = Vec3::new(
            radius * phi.sin() * theta.sin(),
            radius * phi.cos(),
            radius * phi.sin() * theta.cos(),
        );

        let old_position = camera.position;
        camera.position = self.target + new_offset;
        camera.look_at(self.target);

        if self.settings.enable_damping {
            self.delta_theta *= 1.0 - self.settings.damping_factor;
            self.delta_phi *= 1.0 - self.settings.damping_factor;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
        }
        self.scale = 1.0;

        old_position.distance_squared(camera.position) > EPS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{Frustum, DEFAULT_POSITION};

    #[test]
    fn auto_rotation_keeps_distance_to_target() {
        let mut camera = PerspectiveCamera::new(Frustum::default(), DEFAULT_POSITION);
        let mut controls = OrbitControls::default();
        let radius = camera.position.length();

        assert!(controls.update(&mut camera));
        assert!((camera.position.length() - radius).abs() < 1.0e-2);
        assert_eq!(camera.target, Vec3::ZERO);
    }

    #[test]
    fn auto_rotation_turns_by_fixed_angle() {
        let mut camera = PerspectiveCamera::new(Frustum::default(), Vec3::new(0.0, 0.0, 10.0));
        let mut controls = OrbitControls::default();
        let expected = -controls.auto_rotation_angle();

        controls.update(&mut camera);
        let theta = camera.position.x.atan2(camera.position.z);
        assert!((theta - expected).abs() < 1.0e-5);
    }

    #[test]
    fn idle_controls_do_not_move_camera() {
        let mut camera = PerspectiveCamera::default();
        let mut controls = OrbitControls::new(OrbitSettings {
            auto_rotate: false,
            ..OrbitSettings::default()
        });

        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn damping_spreads_rotation_over_updates() {
        let mut camera = PerspectiveCamera::new(Frustum::default(), Vec3::new(0.0, 0.0, 10.0));
        let mut controls = OrbitControls::new(OrbitSettings {
            auto_rotate: false,
            enable_damping: true,
            ..OrbitSettings::default()
        });

        controls.rotate_left(1.0);
        controls.update(&mut camera);
        let first = camera.position.x.atan2(camera.position.z).abs();
        controls.update(&mut camera);
        let second = camera.position.x.atan2(camera.position.z).abs();

        assert!(first > 0.0 && first < 1.0);
        assert!(second > first);
    }
}
