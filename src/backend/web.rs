//! Browser bindings: DOM canvas lookup, canvas surface and `requestAnimationFrame`.

use std::future::Future;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::HtmlCanvasElement;

use crate::window::{CanvasElement, DisplaySurface, Document, FrameCallback, FrameHandle, FrameScheduler};

impl CanvasElement for web_sys::Element {
    fn tag_name(&self) -> String {
        web_sys::Element::tag_name(self)
    }

    fn id(&self) -> String {
        web_sys::Element::id(self)
    }

    fn set_id(&self, id: &str) {
        web_sys::Element::set_id(self, id)
    }
}

/// The page's document.
#[derive(Clone, Debug)]
pub struct WebDocument(web_sys::Document);

impl WebDocument {
    /// The document of the current window, if any.
    pub fn current() -> Option<Self> {
        web_sys::window()?.document().map(WebDocument)
    }
}

impl Document for WebDocument {
    type Element = web_sys::Element;

    fn element_by_id(&self, id: &str) -> Option<web_sys::Element> {
        self.0.get_element_by_id(id)
    }
}

/// A `<canvas>` seen as a [`DisplaySurface`].
#[derive(Clone, Debug)]
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
}

impl CanvasSurface {
    /// The surface of `element`, if it is a canvas.
    pub fn new(element: &web_sys::Element) -> Option<Self> {
        element
            .dyn_ref::<HtmlCanvasElement>()
            .map(|canvas| CanvasSurface {
                canvas: canvas.clone(),
            })
    }

    /// The canvas.
    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }

    /// Sets the drawing buffer size, leaving the CSS size alone.
    pub fn set_buffer_size(&self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }
}

impl DisplaySurface for CanvasSurface {
    fn client_size(&self) -> (f64, f64) {
        (
            self.canvas.client_width() as f64,
            self.canvas.client_height() as f64,
        )
    }

    fn pixel_ratio(&self) -> f64 {
        web_sys::window()
            .map(|window| window.device_pixel_ratio())
            .unwrap_or(1.0)
    }

    fn buffer_size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }
}

/// Schedules frames with `window.requestAnimationFrame`.
#[derive(Clone, Debug, Default)]
pub struct AnimationFrameScheduler;

impl FrameScheduler for AnimationFrameScheduler {
    fn request_frame(&mut self, callback: FrameCallback) -> FrameHandle {
        let closure = Closure::once_into_js(move |timestamp: f64| callback(timestamp));

        match web_sys::window()
            .map(|window| window.request_animation_frame(closure.unchecked_ref()))
        {
            Some(Ok(id)) => FrameHandle(id as u64),
            Some(Err(err)) => {
                log::error!("[render] requestAnimationFrame failed: {:?}", err);
                FrameHandle(0)
            }
            None => {
                log::error!("[render] no window to schedule frames on");
                FrameHandle(0)
            }
        }
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Some(window) = web_sys::window() {
            let _ = window.cancel_animation_frame(handle.0 as i32);
        }
    }
}

/// Runs `future` on the browser's event loop, e.g. a [`Viewer::load_all`](crate::viewer::Viewer::load_all).
pub fn spawn<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future)
}
