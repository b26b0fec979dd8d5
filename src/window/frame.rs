/// Identifies a scheduled frame, so it can be cancelled.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// Callback run on the next frame, with the frame timestamp in milliseconds.
pub type FrameCallback = Box<dyn FnOnce(f64)>;

/// The host's frame scheduling primitive (`requestAnimationFrame` on the web).
pub trait FrameScheduler {
    /// Runs `callback` before the next repaint.
    fn request_frame(&mut self, callback: FrameCallback) -> FrameHandle;

    /// Cancels a frame requested with [`request_frame`](Self::request_frame).
    /// Cancelling a frame that already ran does nothing.
    fn cancel_frame(&mut self, handle: FrameHandle);
}
