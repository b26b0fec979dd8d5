//! Perspective camera and orbit controls.

pub use self::orbit_controls::{OrbitControls, OrbitSettings};
pub use self::perspective::{Frustum, PerspectiveCamera, DEFAULT_FOV, DEFAULT_POSITION};

mod orbit_controls;
mod perspective;
