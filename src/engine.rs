//! The rendering engine collaborator.

use crate::error::ViewerError;
use crate::loader::LoaderBackend;
use crate::window::{CanvasElement, FrameScheduler, Renderer, RendererOptions};

/// Factory for the engine objects a [`Viewer`](crate::viewer::Viewer) drives.
///
/// Scene graph internals, GPU rendering and asset parsing all live behind
/// this trait. See [`HeadlessEngine`](crate::backend::headless::HeadlessEngine)
/// for an in-process implementation.
pub trait Engine {
    /// The engine's handle to a loaded model.
    type Model: Clone + 'static;
    /// The canvas element type.
    type Canvas: CanvasElement;
    /// The renderer.
    type Renderer: Renderer<Model = Self::Model>;
    /// The sub-loader factory.
    type Loaders: LoaderBackend<Model = Self::Model>;
    /// The frame scheduler.
    type Scheduler: FrameScheduler;

    /// Creates a renderer drawing to `canvas`.
    fn create_renderer(
        &mut self,
        canvas: &Self::Canvas,
        options: &RendererOptions,
    ) -> Result<Self::Renderer, ViewerError>;

    /// Creates the factory the viewer's loader builds its sub-loaders with.
    fn loader_backend(&mut self) -> Self::Loaders;

    /// Creates the scheduler driving the render loop.
    fn frame_scheduler(&mut self) -> Self::Scheduler;
}
