//! The scene container.

pub use self::scene::{AxesHelper, Fog, Scene, SceneNode};

mod scene;
