use std::io::{BufReader, Read};
use std::process::Child;

use common::frame::BYTES_PER_PIXEL;
use tracing::warn;

use crate::ffmpeg;
use crate::source::CaptureError;

/// Blocking webcam reader fed by an `ffmpeg` child process
pub struct Camera {
    /// Requested image width
    w: usize,
    /// Requested image height
    h: usize,
    /// FFmpeg child process, this component actually feeds the images
    /// to the program
    ffmpeg_proc: Child,
    /// Reader, reads output frames from the FFmpeg child process
    frame_reader: BufReader<std::process::ChildStdout>,
    /// Holds exactly one raw RGBA frame between reads
    frame_buffer: Vec<u8>,
}

impl Camera {
    pub fn new(w: usize, h: usize, fps: u32) -> Result<Self, CaptureError> {
        if w == 0 || h == 0 {
            return Err(CaptureError::ZeroDimensions);
        }

        let mut ffmpeg_proc = ffmpeg::spawn(w, h, fps)?;
        let stdout = ffmpeg_proc.stdout.take().ok_or(CaptureError::NoStdout)?;

        let buffer_size = w * h * BYTES_PER_PIXEL;

        Ok(Camera {
            w,
            h,
            ffmpeg_proc,
            frame_reader: BufReader::with_capacity(buffer_size, stdout),
            frame_buffer: vec![0u8; buffer_size],
        })
    }

    /// Block until ffmpeg has produced one whole frame, then expose it.
    /// The returned slice is valid until the next call.
    pub fn read_frame(&mut self) -> Result<&[u8], CaptureError> {
        self.frame_reader
            .read_exact(&mut self.frame_buffer)
            .map_err(CaptureError::Read)?;
        Ok(&self.frame_buffer)
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.w, self.h)
    }
}

impl Drop for Camera {
    fn drop(&mut self) {
        // kill ffmpeg when Camera is dropped
        if let Err(e) = self.ffmpeg_proc.kill() {
            warn!(error = %e, "failed to kill ffmpeg");
        }
    }
}
