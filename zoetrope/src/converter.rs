use common::cell_frame::CellFrame;
use common::frame::ImageFrame;
use common::palette::Palette;

use crate::config::{Config, Mode};
use crate::quantizer;
use crate::sampler;

/// Quantize one frame into a cell grid.
///
/// Pure with respect to its inputs: the frame is the pass's immutable
/// snapshot, the config snapshot does not change mid-pass, and the palette
/// was generated ahead of time, so this is just the sampler and quantizer
/// run over every whole cell.
pub fn convert(frame: &ImageFrame, config: &Config, palette: &Palette) -> CellFrame {
    let (cols, rows) = sampler::grid_dims(frame.w, frame.h, config.cell_size);
    let mut out = CellFrame::new(cols, rows, config.primary);

    for row in 0..rows {
        for col in 0..cols {
            let stats = sampler::sample_cell(frame, col, row, config.cell_size);
            let paint = match config.mode {
                Mode::Glyphs => quantizer::glyph_for(stats.brightness, &config.ramp),
                Mode::Blocks => quantizer::color_for(stats.brightness, palette),
            };
            out.set(col, row, paint);
        }
    }

    out
}
