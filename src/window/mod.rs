//! The host surface: canvas lookup, drawing buffer sizing and frame scheduling.

pub use self::container::{resolve_canvas, CanvasElement, Container, Document};
pub use self::frame::{FrameCallback, FrameHandle, FrameScheduler};
pub use self::surface::{resize_to_display_size, DisplaySurface, Renderer, RendererOptions};

mod container;
mod frame;
mod surface;
