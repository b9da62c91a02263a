use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use common::frame::ImageFrame;
use thiserror::Error;
use tracing::{error, info};

use crate::camera::Camera;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("capture dimensions must be greater than zero")]
    ZeroDimensions,
    #[error("ffmpeg not found or not accessible: {0}")]
    FfmpegMissing(#[source] std::io::Error),
    #[error("no camera capture backend for this platform")]
    UnsupportedPlatform,
    #[error("failed to spawn ffmpeg process: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("failed to get ffmpeg stdout")]
    NoStdout,
    #[error("failed to read camera frame: {0}")]
    Read(#[source] std::io::Error),
    #[error("capture thread terminated")]
    WorkerGone,
}

/// Supplies raw pixel buffers for the current frame.
///
/// Implementations report their native dimensions per call, never once at
/// startup: a source's resolution may change between frames and callers
/// re-derive their geometry every pass.
pub trait FrameSource {
    /// Native dimensions of the current frame, `(0, 0)` until the source
    /// has started streaming.
    fn dimensions(&self) -> (usize, usize);

    /// Copy the most recent frame into `frame`, resizing it as needed.
    /// `Ok(false)` means no frame is available yet.
    fn capture_frame(&mut self, frame: &mut ImageFrame) -> Result<bool, CaptureError>;

    /// Readiness predicate: the source has produced at least one frame.
    /// Replaces fixed warm-up delays with an explicit check.
    fn is_ready(&self) -> bool {
        self.dimensions() != (0, 0)
    }
}

/// Live camera source. A dedicated thread owns the blocking ffmpeg pipe
/// and publishes the latest frame into a shared slot; the render loop
/// copies its snapshot out without ever blocking on the pipe.
pub struct CameraSource {
    /// most recent complete frame, `None` until the camera delivers one
    shared: Arc<Mutex<Option<ImageFrame>>>,
    /// cleared on drop to stop the capture thread
    running: Arc<AtomicBool>,
}

impl CameraSource {
    pub fn start(w: usize, h: usize, fps: u32) -> Result<Self, CaptureError> {
        // open in the caller so spawn/probe failures surface immediately
        let camera = Camera::new(w, h, fps)?;

        let shared = Arc::new(Mutex::new(None));
        let running = Arc::new(AtomicBool::new(true));

        {
            let shared = Arc::clone(&shared);
            let running = Arc::clone(&running);
            thread::spawn(move || capture_loop(camera, shared, running));
        }

        Ok(Self { shared, running })
    }
}

impl FrameSource for CameraSource {
    fn dimensions(&self) -> (usize, usize) {
        match self.shared.lock() {
            Ok(slot) => slot.as_ref().map(|f| (f.w, f.h)).unwrap_or((0, 0)),
            Err(_) => (0, 0),
        }
    }

    fn capture_frame(&mut self, frame: &mut ImageFrame) -> Result<bool, CaptureError> {
        let slot = self.shared.lock().map_err(|_| CaptureError::WorkerGone)?;
        match slot.as_ref() {
            Some(latest) => {
                frame.resize(latest.w, latest.h);
                frame.buffer_mut().copy_from_slice(latest.buffer());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

/// Reads frames off the camera until told to stop, publishing each one
/// into the shared slot. Dropping the camera on exit kills ffmpeg.
fn capture_loop(
    mut camera: Camera,
    shared: Arc<Mutex<Option<ImageFrame>>>,
    running: Arc<AtomicBool>,
) {
    let (w, h) = camera.dimensions();
    info!(w, h, "camera capture thread started");

    while running.load(Ordering::Relaxed) {
        let bytes = match camera.read_frame() {
            Ok(bytes) => bytes,
            Err(e) => {
                // expected when ffmpeg dies mid-stream or is killed on
                // shutdown; readers see a source that is no longer ready
                error!(error = %e, "camera stream ended");
                break;
            }
        };

        let Ok(mut slot) = shared.lock() else {
            error!("frame slot poisoned, stopping capture");
            break;
        };
        match slot.as_mut() {
            Some(frame) => {
                frame.resize(w, h);
                frame.buffer_mut().copy_from_slice(bytes);
            }
            None => match ImageFrame::from_bytes(w, h, bytes) {
                Ok(frame) => *slot = Some(frame),
                Err(e) => {
                    error!(error = %e, "frame size mismatch, stopping capture");
                    break;
                }
            },
        }
    }

    info!("camera capture thread stopped");
}
