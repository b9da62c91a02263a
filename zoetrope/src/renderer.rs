use std::fmt::Write as _;
use std::io::{self, Write};

use common::cell_frame::{CellFrame, CellPaint};
use crossterm::{
    cursor, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::warn;

// TODO: clamp the grid to the terminal size so oversized sources don't wrap

/// ANSI escape code sequence that clears the screen and positions the
/// cursor in the top-left corner (1, 1).
const CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";

/// Paints `CellFrame`s onto the terminal with ANSI escape sequences,
/// one terminal character cell per grid cell.
///
/// Write-only with respect to the screen: diffing uses the previously
/// rendered `CellFrame`, never terminal readback. Generic over the output
/// so tests can render into a byte buffer.
pub struct TermRenderer<W: Write> {
    out: W,
    /// last frame put on screen, used to repaint only cells that changed
    /// (reduces flickering at interactive frame rates)
    prev: Option<CellFrame>,
    /// reused escape-sequence buffer, flushed once per pass
    scratch: String,
}

impl<W: Write> TermRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            prev: None,
            scratch: String::new(),
        }
    }

    /// Paint one frame, emitting escape sequences only for cells that
    /// differ from the previous pass. A grid or foreground change forces
    /// a clear and full repaint. An empty grid draws nothing at all.
    pub fn render(&mut self, frame: &CellFrame) -> io::Result<()> {
        if frame.is_empty() {
            return Ok(());
        }

        let full_repaint = match &self.prev {
            Some(prev) => {
                prev.cols != frame.cols || prev.rows != frame.rows || prev.fg != frame.fg
            }
            None => true,
        };

        self.scratch.clear();
        if full_repaint {
            self.scratch.push_str(CLEAR_SCREEN);
        }

        // glyph foreground is uniform across the frame, set it once
        let fg = frame.fg;
        let _ = write!(self.scratch, "\x1B[38;2;{};{};{}m", fg.r, fg.g, fg.b);

        for row in 0..frame.rows {
            for col in 0..frame.cols {
                let cell = frame.get(col, row).unwrap_or(CellPaint::Blank);

                if !full_repaint {
                    let unchanged = self
                        .prev
                        .as_ref()
                        .and_then(|prev| prev.get(col, row))
                        .is_some_and(|prev_cell| prev_cell == cell);
                    if unchanged {
                        continue;
                    }
                }

                // move cursor to the cell, then paint it
                let _ = write!(self.scratch, "\x1B[{};{}H", row + 1, col + 1);
                match cell {
                    CellPaint::Blank => self.scratch.push(' '),
                    CellPaint::Glyph(ch) => self.scratch.push(ch),
                    CellPaint::Fill(color) => {
                        let _ = write!(
                            self.scratch,
                            "\x1B[48;2;{};{};{}m \x1B[49m",
                            color.r, color.g, color.b
                        );
                    }
                }
            }
        }

        self.out.write_all(self.scratch.as_bytes())?;
        self.out.flush()?;

        self.prev = Some(frame.clone());
        Ok(())
    }

    #[cfg(test)]
    fn output(&self) -> &W {
        &self.out
    }
}

/// Puts the terminal into raw mode on the alternate screen with the cursor
/// hidden, and restores everything when dropped, so a panic or early return
/// cannot leave the shell unusable.
pub struct TerminalGuard;

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(e) = execute!(io::stdout(), cursor::Show, LeaveAlternateScreen) {
            warn!(error = %e, "failed to restore terminal screen");
        }
        if let Err(e) = terminal::disable_raw_mode() {
            warn!(error = %e, "failed to disable raw mode");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::color::Rgb;

    fn rendered(renderer: &TermRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.output().clone()).unwrap()
    }

    #[test]
    fn empty_grid_draws_nothing() {
        let mut renderer = TermRenderer::new(Vec::new());
        renderer.render(&CellFrame::new(0, 0, Rgb::WHITE)).unwrap();
        renderer.render(&CellFrame::new(5, 0, Rgb::WHITE)).unwrap();
        assert!(renderer.output().is_empty());
    }

    #[test]
    fn first_render_clears_and_paints_every_cell() {
        let mut frame = CellFrame::new(2, 1, Rgb::WHITE);
        frame.set(0, 0, CellPaint::Glyph('@'));
        frame.set(1, 0, CellPaint::Glyph('.'));

        let mut renderer = TermRenderer::new(Vec::new());
        renderer.render(&frame).unwrap();

        let out = rendered(&renderer);
        assert!(out.starts_with(CLEAR_SCREEN));
        assert!(out.contains("\x1B[1;1H@"));
        assert!(out.contains("\x1B[1;2H."));
    }

    #[test]
    fn repaints_only_changed_cells() {
        let mut frame = CellFrame::new(2, 1, Rgb::WHITE);
        frame.set(0, 0, CellPaint::Glyph('@'));
        frame.set(1, 0, CellPaint::Glyph('.'));

        let mut renderer = TermRenderer::new(Vec::new());
        renderer.render(&frame).unwrap();
        let after_first = rendered(&renderer).len();

        let mut next = frame.clone();
        next.set(1, 0, CellPaint::Glyph('#'));
        renderer.render(&next).unwrap();

        let out = rendered(&renderer);
        let second_pass = &out[after_first..];
        assert!(!second_pass.contains(CLEAR_SCREEN));
        assert!(!second_pass.contains("\x1B[1;1H"));
        assert!(second_pass.contains("\x1B[1;2H#"));
    }

    #[test]
    fn dimension_change_forces_full_repaint() {
        let mut renderer = TermRenderer::new(Vec::new());
        renderer.render(&CellFrame::new(2, 2, Rgb::WHITE)).unwrap();
        let after_first = rendered(&renderer).len();

        renderer.render(&CellFrame::new(3, 2, Rgb::WHITE)).unwrap();
        let out = rendered(&renderer);
        assert!(out[after_first..].contains(CLEAR_SCREEN));
    }

    #[test]
    fn foreground_change_forces_full_repaint() {
        let mut renderer = TermRenderer::new(Vec::new());
        renderer.render(&CellFrame::new(2, 2, Rgb::WHITE)).unwrap();
        let after_first = rendered(&renderer).len();

        renderer
            .render(&CellFrame::new(2, 2, Rgb::new(0xdb, 0x00, 0x1c)))
            .unwrap();
        let out = rendered(&renderer);
        assert!(out[after_first..].contains(CLEAR_SCREEN));
        assert!(out[after_first..].contains("\x1B[38;2;219;0;28m"));
    }

    #[test]
    fn fill_cells_use_background_color() {
        let mut frame = CellFrame::new(1, 1, Rgb::WHITE);
        frame.set(0, 0, CellPaint::Fill(Rgb::new(10, 20, 30)));

        let mut renderer = TermRenderer::new(Vec::new());
        renderer.render(&frame).unwrap();
        assert!(rendered(&renderer).contains("\x1B[48;2;10;20;30m \x1B[49m"));
    }
}
