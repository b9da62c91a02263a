use common::color::Rgb;
use common::frame::{BYTES_PER_PIXEL, ImageFrame};

/// Aggregate statistics for one sample block
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellStats {
    /// Mean of `(r + g + b) / 3` over every pixel in the cell, in [0, 255]
    pub brightness: f32,
    /// Per-channel means over the same pixels
    pub mean: Rgb,
}

/// Number of whole cells that fit into a frame. Tail pixels that do not
/// fill a complete cell are dropped, not clipped: nothing at or beyond
/// `cols * cell_size` (or `rows * cell_size`) is ever sampled or drawn.
pub fn grid_dims(w: usize, h: usize, cell_size: usize) -> (usize, usize) {
    // cell_size is validated at the config boundary; 0 would otherwise panic
    if cell_size == 0 {
        return (0, 0);
    }

    (w / cell_size, h / cell_size)
}

/// Box-filter one cell of the frame.
///
/// Every pixel in the cell is visited exactly once; averaging the whole
/// block (rather than point-sampling it) is what keeps the output stable
/// under sensor noise. The walk is plain index arithmetic over the raw
/// buffer and allocates nothing.
///
/// `(col, row)` must lie inside `grid_dims(frame.w, frame.h, cell_size)`.
pub fn sample_cell(frame: &ImageFrame, col: usize, row: usize, cell_size: usize) -> CellStats {
    let x0 = col * cell_size;
    let y0 = row * cell_size;
    debug_assert!(x0 + cell_size <= frame.w && y0 + cell_size <= frame.h);

    let buf = frame.buffer();
    let mut sum_r = 0u64;
    let mut sum_g = 0u64;
    let mut sum_b = 0u64;

    for y in y0..y0 + cell_size {
        let mut offset = (y * frame.w + x0) * BYTES_PER_PIXEL;
        for _ in 0..cell_size {
            sum_r += buf[offset] as u64;
            sum_g += buf[offset + 1] as u64;
            sum_b += buf[offset + 2] as u64;
            offset += BYTES_PER_PIXEL;
        }
    }

    let count = (cell_size * cell_size) as u64;
    CellStats {
        brightness: (sum_r + sum_g + sum_b) as f32 / (3 * count) as f32,
        mean: Rgb::new(
            (sum_r / count) as u8,
            (sum_g / count) as u8,
            (sum_b / count) as u8,
        ),
    }
}
