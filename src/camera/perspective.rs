use glamx::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Field of view, in degrees, of a default [`PerspectiveCamera`].
pub const DEFAULT_FOV: f32 = 50.0;

/// Initial eye position of a default [`PerspectiveCamera`].
pub const DEFAULT_POSITION: Vec3 = Vec3::new(-615.0, 40.0, 840.0);

/// Frustum parameters of a perspective camera.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frustum {
    /// Vertical field of view, in degrees.
    pub fov: f32,
    /// Width over height of the viewport.
    pub aspect: f32,
    /// Distance of the near clipping plane.
    pub znear: f32,
    /// Distance of the far clipping plane.
    pub zfar: f32,
}

impl Default for Frustum {
    fn default() -> Self {
        Frustum {
            fov: DEFAULT_FOV,
            aspect: 2.0,
            znear: 0.1,
            zfar: 3000.0,
        }
    }
}

/// A perspective projection camera looking at a target point.
///
/// The projection is cached: after changing [`Frustum`] fields call
/// [`update_projection_matrix`](Self::update_projection_matrix), the same way
/// the render loop does after a resize.
#[derive(Clone, Debug, PartialEq)]
pub struct PerspectiveCamera {
    /// Name of the camera, for debugging.
    pub name: String,
    /// Frustum parameters.
    pub frustum: Frustum,
    /// Eye position in world space.
    pub position: Vec3,
    /// Point the camera looks at.
    pub target: Vec3,
    /// Up direction.
    pub up: Vec3,
    proj: Mat4,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self::new(Frustum::default(), DEFAULT_POSITION)
    }
}

impl PerspectiveCamera {
    /// Creates a camera at `position` looking at the origin.
    pub fn new(frustum: Frustum, position: Vec3) -> PerspectiveCamera {
        let mut res = PerspectiveCamera {
            name: String::from("Fz3dCamera"),
            frustum,
            position,
            target: Vec3::ZERO,
            up: Vec3::Y,
            proj: Mat4::IDENTITY,
        };
        res.update_projection_matrix();
        res
    }

    /// The aspect ratio.
    pub fn aspect(&self) -> f32 {
        self.frustum.aspect
    }

    /// Sets the aspect ratio. Call [`update_projection_matrix`](Self::update_projection_matrix) afterwards.
    pub fn set_aspect(&mut self, aspect: f32) {
        self.frustum.aspect = aspect;
    }

    /// Recomputes the cached projection from the frustum.
    pub fn update_projection_matrix(&mut self) {
        let f = &self.frustum;
        self.proj = Mat4::perspective_rh_gl(f.fov.to_radians(), f.aspect, f.znear, f.zfar);
    }

    /// Points the camera at `target`.
    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    /// The cached projection matrix.
    pub fn projection(&self) -> Mat4 {
        self.proj
    }

    /// The world to camera transform.
    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// The combined projection and view matrix.
    pub fn transformation(&self) -> Mat4 {
        self.proj * self.view()
    }
}
