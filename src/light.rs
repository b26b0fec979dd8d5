//! Lighting primitives added to the scene.
//!
//! The engine does the shading; fz3d only describes which lights exist. The
//! default viewer setup adds a single white ambient light.

use crate::color::{self, Color};
use glamx::Vec3;
use serde::{Deserialize, Serialize};

/// The type of light source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LightType {
    /// Uniform light hitting every surface equally, regardless of orientation.
    Ambient,

    /// A directional light with parallel rays (like the sun).
    ///
    /// The vector is the position the light shines from; it points at the origin.
    Directional(Vec3),

    /// Light fading from a sky color above to a ground color below.
    Hemisphere {
        /// Color coming from below.
        ground: Color,
    },
}

impl Default for LightType {
    fn default() -> Self {
        LightType::Ambient
    }
}

/// A light source that can be added to a [`Scene`](crate::scene::Scene).
///
/// # Examples
/// ```
/// # use fz3d::prelude::*;
/// let ambient = Light::ambient().with_color(from_hex(0xffffff));
///
/// let sun = Light::directional(Vec3::new(30.0, 30.0, 30.0))
///     .with_intensity(3.0);
/// # assert!(ambient.enabled && sun.enabled);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Light {
    /// The type of light.
    pub light_type: LightType,
    /// The color of the light (for hemisphere lights, the sky color).
    pub color: Color,
    /// The intensity multiplier for the light.
    pub intensity: f32,
    /// Whether the light is enabled.
    pub enabled: bool,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            light_type: LightType::default(),
            color: color::WHITE,
            intensity: 1.0,
            enabled: true,
        }
    }
}

impl Light {
    /// Creates a white ambient light.
    pub fn ambient() -> Self {
        Self::default()
    }

    /// Creates a directional light shining from `position` towards the origin.
    pub fn directional(position: Vec3) -> Self {
        Self {
            light_type: LightType::Directional(position),
            ..Default::default()
        }
    }

    /// Creates a hemisphere light with the given sky and ground colors.
    pub fn hemisphere(sky: Color, ground: Color) -> Self {
        Self {
            light_type: LightType::Hemisphere { ground },
            color: sky,
            ..Default::default()
        }
    }

    /// Sets the light color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Sets the light intensity.
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    /// Sets whether the light is enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The normalized direction the light travels in, for directional lights.
    pub fn direction(&self) -> Option<Vec3> {
        match self.light_type {
            LightType::Directional(position) => Some((-position).normalize_or_zero()),
            _ => None,
        }
    }
}
