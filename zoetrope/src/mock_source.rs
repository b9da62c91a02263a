use clap::ValueEnum;
use common::frame::{BYTES_PER_PIXEL, ImageFrame};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::source::{CaptureError, FrameSource};

/// Test patterns for running without a webcam
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PatternType {
    /// Alternating light/dark blocks that swap every few frames
    Checkerboard,
    /// Horizontal brightness gradient scrolling with the frame counter
    GradientSweep,
    /// Uniform random pixels, for eyeballing sampler noise rejection
    Noise,
}

/// Factory for "fake" frames, standing in for the camera in tests and
/// `--source mock` runs. Ready from the first capture onward.
pub struct MockSource {
    /// width of generated frames
    w: usize,
    /// height of generated frames
    h: usize,
    /// counter to determine how a frame should look temporally
    frame_counter: usize,
    /// pattern to generate
    pattern: PatternType,
    /// seeded so noise frames are reproducible run to run
    rng: StdRng,
}

impl MockSource {
    pub fn new(w: usize, h: usize, pattern: PatternType) -> Result<Self, CaptureError> {
        if w == 0 || h == 0 {
            return Err(CaptureError::ZeroDimensions);
        }

        Ok(Self {
            w,
            h,
            frame_counter: 0,
            pattern,
            rng: StdRng::seed_from_u64(0x5eed),
        })
    }

    fn generate_checkerboard(&self, frame: &mut ImageFrame) {
        let shades: [u8; 2] = [32, 224];

        for y in 0..self.h {
            for x in 0..self.w {
                let phase = (self.frame_counter / 15) % 2;
                let parity = (x / 8 + y / 8) % 2;
                let v = shades[(parity + phase) % 2];
                frame.set_pixel(x, y, (v, v, v, 255));
            }
        }
    }

    fn generate_gradient_sweep(&self, frame: &mut ImageFrame) {
        for y in 0..self.h {
            for x in 0..self.w {
                let v = (((x + self.frame_counter) % self.w) * 255 / self.w) as u8;
                frame.set_pixel(x, y, (v, v, v, 255));
            }
        }
    }

    fn generate_noise(&mut self, frame: &mut ImageFrame) {
        for px in frame.buffer_mut().chunks_exact_mut(BYTES_PER_PIXEL) {
            px[0] = self.rng.random();
            px[1] = self.rng.random();
            px[2] = self.rng.random();
            px[3] = 255;
        }
    }
}

impl FrameSource for MockSource {
    fn dimensions(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    fn capture_frame(&mut self, frame: &mut ImageFrame) -> Result<bool, CaptureError> {
        frame.resize(self.w, self.h);

        match self.pattern {
            PatternType::Checkerboard => self.generate_checkerboard(frame),
            PatternType::GradientSweep => self.generate_gradient_sweep(frame),
            PatternType::Noise => self.generate_noise(frame),
        }

        self.frame_counter += 1;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ready_immediately_with_fixed_dimensions() {
        let source = MockSource::new(32, 24, PatternType::Checkerboard).unwrap();
        assert!(source.is_ready());
        assert_eq!(source.dimensions(), (32, 24));
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert!(MockSource::new(0, 24, PatternType::Noise).is_err());
    }

    #[test]
    fn checkerboard_is_deterministic_per_counter() {
        let mut a = MockSource::new(16, 16, PatternType::Checkerboard).unwrap();
        let mut b = MockSource::new(16, 16, PatternType::Checkerboard).unwrap();

        let mut frame_a = ImageFrame::empty();
        let mut frame_b = ImageFrame::empty();
        for _ in 0..3 {
            a.capture_frame(&mut frame_a).unwrap();
            b.capture_frame(&mut frame_b).unwrap();
            assert_eq!(frame_a.buffer(), frame_b.buffer());
        }
    }

    #[test]
    fn gradient_sweep_scrolls() {
        let mut source = MockSource::new(16, 4, PatternType::GradientSweep).unwrap();
        let mut first = ImageFrame::empty();
        let mut second = ImageFrame::empty();
        source.capture_frame(&mut first).unwrap();
        source.capture_frame(&mut second).unwrap();

        // column 0 of frame 1 equals column 1 of frame 0
        assert_eq!(second.get_pixel(0, 0), first.get_pixel(1, 0));
    }

    #[test]
    fn noise_frames_are_opaque() {
        let mut source = MockSource::new(8, 8, PatternType::Noise).unwrap();
        let mut frame = ImageFrame::empty();
        source.capture_frame(&mut frame).unwrap();
        for y in 0..8 {
            for x in 0..8 {
                assert_eq!(frame.get_pixel(x, y).unwrap().3, 255);
            }
        }
    }
}
