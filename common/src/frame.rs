use thiserror::Error;

/// RGBA, one byte per channel.
pub const BYTES_PER_PIXEL: usize = 4;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame dimensions must be greater than zero")]
    ZeroDimensions,
    #[error("pixel data is {got} bytes but {w}x{h} requires {expected}")]
    BufferMismatch {
        w: usize,
        h: usize,
        expected: usize,
        got: usize,
    },
}

/// Raw pixel snapshot of a single video frame
pub struct ImageFrame {
    /// width of image in pixels
    pub w: usize,
    /// height of image in pixels
    pub h: usize,
    /// flat RGBA data, row-major, `(y * w + x) * 4`
    buffer: Vec<u8>,
}

impl ImageFrame {
    pub fn new(w: usize, h: usize) -> Result<Self, FrameError> {
        if w == 0 || h == 0 {
            return Err(FrameError::ZeroDimensions);
        }

        Ok(Self {
            w,
            h,
            buffer: vec![0; w * h * BYTES_PER_PIXEL],
        })
    }

    /// A 0x0 frame, used as the initial state of buffers that are resized
    /// to the source's dimensions on every capture.
    pub fn empty() -> Self {
        Self {
            w: 0,
            h: 0,
            buffer: Vec::new(),
        }
    }

    pub fn from_bytes(w: usize, h: usize, bytes: &[u8]) -> Result<Self, FrameError> {
        if w == 0 || h == 0 {
            return Err(FrameError::ZeroDimensions);
        }

        let expected = w * h * BYTES_PER_PIXEL;
        if bytes.len() != expected {
            return Err(FrameError::BufferMismatch {
                w,
                h,
                expected,
                got: bytes.len(),
            });
        }

        Ok(Self {
            w,
            h,
            buffer: bytes.to_vec(),
        })
    }

    /// Adjust dimensions to match the source, reallocating only when the
    /// pixel count changes. Source resolution can change between frames,
    /// so callers re-derive dimensions on every capture instead of caching.
    pub fn resize(&mut self, w: usize, h: usize) {
        if self.w != w || self.h != h {
            self.w = w;
            self.h = h;
            self.buffer.resize(w * h * BYTES_PER_PIXEL, 0);
        }
    }

    /// Return raw image data
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Return raw, mutable image data
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// Get pixel RGBA values, with bounds checking
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<(u8, u8, u8, u8)> {
        if x >= self.w || y >= self.h {
            return None;
        }

        let i = (y * self.w + x) * BYTES_PER_PIXEL;
        Some((
            self.buffer[i],
            self.buffer[i + 1],
            self.buffer[i + 2],
            self.buffer[i + 3],
        ))
    }

    /// Set pixel RGBA values, with bounds checking
    pub fn set_pixel(&mut self, x: usize, y: usize, (r, g, b, a): (u8, u8, u8, u8)) -> bool {
        if x >= self.w || y >= self.h {
            return false;
        }

        let i = (y * self.w + x) * BYTES_PER_PIXEL;
        self.buffer[i] = r;
        self.buffer[i + 1] = g;
        self.buffer[i + 2] = b;
        self.buffer[i + 3] = a;
        true
    }

    /// Fill the entire frame with one color
    pub fn fill(&mut self, (r, g, b, a): (u8, u8, u8, u8)) {
        for px in self.buffer.chunks_exact_mut(BYTES_PER_PIXEL) {
            px[0] = r;
            px[1] = g;
            px[2] = b;
            px[3] = a;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimensions() {
        assert!(ImageFrame::new(0, 480).is_err());
        assert!(ImageFrame::new(640, 0).is_err());
    }

    #[test]
    fn pixel_roundtrip() {
        let mut frame = ImageFrame::new(4, 4).unwrap();
        assert!(frame.set_pixel(2, 3, (10, 20, 30, 255)));
        assert_eq!(frame.get_pixel(2, 3), Some((10, 20, 30, 255)));
        assert_eq!(frame.get_pixel(4, 0), None);
        assert!(!frame.set_pixel(0, 4, (0, 0, 0, 0)));
    }

    #[test]
    fn resize_rederives_buffer() {
        let mut frame = ImageFrame::empty();
        assert_eq!((frame.w, frame.h), (0, 0));

        frame.resize(8, 6);
        assert_eq!(frame.buffer().len(), 8 * 6 * BYTES_PER_PIXEL);

        frame.resize(2, 2);
        assert_eq!(frame.buffer().len(), 2 * 2 * BYTES_PER_PIXEL);
    }

    #[test]
    fn from_bytes_checks_length() {
        let bytes = vec![0u8; 2 * 2 * BYTES_PER_PIXEL];
        assert!(ImageFrame::from_bytes(2, 2, &bytes).is_ok());
        assert!(matches!(
            ImageFrame::from_bytes(3, 2, &bytes),
            Err(FrameError::BufferMismatch { .. })
        ));
    }
}
