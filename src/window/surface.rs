use crate::camera::PerspectiveCamera;
use crate::scene::Scene;
use serde::{Deserialize, Serialize};

/// The display surface the renderer draws to: a canvas on the web.
pub trait DisplaySurface {
    /// Displayed size in CSS pixels.
    fn client_size(&self) -> (f64, f64);

    /// Physical pixels per CSS pixel.
    fn pixel_ratio(&self) -> f64;

    /// Size of the drawing buffer, in physical pixels.
    fn buffer_size(&self) -> (u32, u32);
}

/// Renderer creation options.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererOptions {
    /// Enable multisample anti-aliasing.
    pub antialias: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        RendererOptions { antialias: true }
    }
}

/// The engine's renderer, bound to a [`DisplaySurface`].
pub trait Renderer {
    /// The engine's handle to a loaded model.
    type Model;

    /// The surface this renderer draws to.
    fn surface(&self) -> &dyn DisplaySurface;

    /// Resizes the drawing buffer, leaving the displayed size alone.
    fn set_size(&mut self, width: u32, height: u32);

    /// Draws `scene` as seen from `camera`.
    fn render(&mut self, scene: &Scene<Self::Model>, camera: &PerspectiveCamera);

    /// Frees the GPU resources (geometries, materials, textures) of `model`.
    fn release(&mut self, model: &Self::Model);

    /// Frees the rendering context. The renderer must not be used afterwards.
    fn dispose(&mut self);
}

/// Matches the drawing buffer to the displayed size of the surface.
///
/// The target buffer size is the client size times the pixel ratio, truncated.
/// When it differs from the current buffer size, the buffer is resized and the
/// camera aspect and projection are updated. Returns whether a resize happened.
pub fn resize_to_display_size<R>(renderer: &mut R, camera: &mut PerspectiveCamera) -> bool
where
    R: Renderer + ?Sized,
{
    let surface = renderer.surface();
    let (client_width, client_height) = surface.client_size();
    let pixel_ratio = surface.pixel_ratio();
    let width = (client_width * pixel_ratio) as u32;
    let height = (client_height * pixel_ratio) as u32;

    if surface.buffer_size() == (width, height) {
        return false;
    }

    renderer.set_size(width, height);
    // A hidden surface has no meaningful aspect.
    if client_height > 0.0 {
        camera.set_aspect((client_width / client_height) as f32);
        camera.update_projection_matrix();
    }
    log::debug!("[render] resized drawing buffer to {}x{}", width, height);

    true
}
