use clap::ValueEnum;
use common::color::Rgb;
use tracing::warn;

/// Ramp used when none is given on the command line, darkest to brightest.
/// The trailing spaces are intentional: they blow out highlights to blank
/// cells, which reads better on camera feeds than a dense bright glyph.
pub const DEFAULT_RAMP: &str = " ,.WQq+,;*.       ";

pub const MIN_CELL_SIZE: usize = 1;
pub const MIN_PALETTE_STEPS: usize = 2;

/// Output style for a quantized cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Characters from the ramp, drawn in the primary color
    Glyphs,
    /// Flat color blocks from the primary/secondary palette
    Blocks,
}

/// Live render parameters. Owned by the frame loop; the input task mutates
/// it only through [`Config::apply`], and the loop reads one consistent
/// snapshot per frame, so a pass never sees a half-applied update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub mode: Mode,
    /// Edge length of a sample block, in source pixels
    pub cell_size: usize,
    /// Brightness ramp for glyph mode, darkest to brightest
    pub ramp: Vec<char>,
    /// Glyph foreground color, and the first palette endpoint
    pub primary: Rgb,
    /// Second palette endpoint
    pub secondary: Rgb,
    /// Number of colors interpolated between the endpoints
    pub palette_steps: usize,
}

impl Config {
    /// Build a validated configuration. Out-of-range numeric parameters are
    /// clamped and an empty ramp falls back to [`DEFAULT_RAMP`]; rendering
    /// never has to re-check these preconditions.
    pub fn new(
        mode: Mode,
        cell_size: usize,
        ramp: &str,
        primary: Rgb,
        secondary: Rgb,
        palette_steps: usize,
    ) -> Self {
        let ramp: Vec<char> = if ramp.is_empty() {
            warn!("empty ramp supplied, falling back to default");
            DEFAULT_RAMP.chars().collect()
        } else {
            ramp.chars().collect()
        };

        Self {
            mode,
            cell_size: cell_size.max(MIN_CELL_SIZE),
            ramp,
            primary,
            secondary,
            palette_steps: palette_steps.max(MIN_PALETTE_STEPS),
        }
    }

    /// Apply one control event.
    ///
    /// Returns `true` when a palette input (endpoint colors or step count)
    /// changed, signalling the caller to regenerate the palette; anything
    /// else leaves the existing palette untouched.
    pub fn apply(&mut self, event: &ControlEvent) -> bool {
        match event {
            ControlEvent::ToggleMode => {
                self.mode = match self.mode {
                    Mode::Glyphs => Mode::Blocks,
                    Mode::Blocks => Mode::Glyphs,
                };
                false
            }
            ControlEvent::AdjustCellSize(delta) => {
                self.cell_size = adjust(self.cell_size, *delta, MIN_CELL_SIZE);
                false
            }
            ControlEvent::AdjustSteps(delta) => {
                let steps = adjust(self.palette_steps, *delta, MIN_PALETTE_STEPS);
                let changed = steps != self.palette_steps;
                self.palette_steps = steps;
                changed
            }
            ControlEvent::SetRamp(ramp) => {
                if ramp.is_empty() {
                    warn!("ignoring empty ramp update");
                } else {
                    self.ramp = ramp.chars().collect();
                }
                false
            }
            ControlEvent::SetPrimary(color) => {
                let changed = self.primary != *color;
                self.primary = *color;
                changed
            }
            ControlEvent::SetSecondary(color) => {
                let changed = self.secondary != *color;
                self.secondary = *color;
                changed
            }
            ControlEvent::Quit => false,
        }
    }
}

fn adjust(value: usize, delta: isize, min: usize) -> usize {
    value
        .saturating_add_signed(delta)
        .max(min)
}

/// Updates emitted by the input task, applied between render passes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ControlEvent {
    ToggleMode,
    AdjustCellSize(isize),
    AdjustSteps(isize),
    SetRamp(String),
    SetPrimary(Rgb),
    SetSecondary(Rgb),
    Quit,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Config {
        Config::new(Mode::Glyphs, 9, DEFAULT_RAMP, Rgb::WHITE, Rgb::BLACK, 16)
    }

    #[test]
    fn clamps_numeric_parameters_on_construction() {
        let config = Config::new(Mode::Blocks, 0, "x", Rgb::WHITE, Rgb::BLACK, 1);
        assert_eq!(config.cell_size, MIN_CELL_SIZE);
        assert_eq!(config.palette_steps, MIN_PALETTE_STEPS);
    }

    #[test]
    fn empty_ramp_falls_back_to_default() {
        let config = Config::new(Mode::Glyphs, 9, "", Rgb::WHITE, Rgb::BLACK, 16);
        assert_eq!(config.ramp, DEFAULT_RAMP.chars().collect::<Vec<char>>());
    }

    #[test]
    fn cell_size_never_drops_below_minimum() {
        let mut config = base();
        config.apply(&ControlEvent::AdjustCellSize(-100));
        assert_eq!(config.cell_size, MIN_CELL_SIZE);

        config.apply(&ControlEvent::AdjustCellSize(3));
        assert_eq!(config.cell_size, MIN_CELL_SIZE + 3);
    }

    #[test]
    fn palette_inputs_report_dirty() {
        let mut config = base();
        assert!(config.apply(&ControlEvent::AdjustSteps(1)));
        assert!(config.apply(&ControlEvent::SetSecondary(Rgb::new(1, 2, 3))));
        assert!(!config.apply(&ControlEvent::SetSecondary(Rgb::new(1, 2, 3))));
        assert!(!config.apply(&ControlEvent::ToggleMode));
        assert!(!config.apply(&ControlEvent::AdjustCellSize(1)));
    }

    #[test]
    fn steps_clamp_reports_clean_at_minimum() {
        let mut config = base();
        config.palette_steps = MIN_PALETTE_STEPS;
        assert!(!config.apply(&ControlEvent::AdjustSteps(-1)));
        assert_eq!(config.palette_steps, MIN_PALETTE_STEPS);
    }

    #[test]
    fn empty_ramp_update_is_rejected() {
        let mut config = base();
        let before = config.ramp.clone();
        config.apply(&ControlEvent::SetRamp(String::new()));
        assert_eq!(config.ramp, before);

        config.apply(&ControlEvent::SetRamp(" .:".to_string()));
        assert_eq!(config.ramp, vec![' ', '.', ':']);
    }

    #[test]
    fn toggle_mode_roundtrips() {
        let mut config = base();
        config.apply(&ControlEvent::ToggleMode);
        assert_eq!(config.mode, Mode::Blocks);
        config.apply(&ControlEvent::ToggleMode);
        assert_eq!(config.mode, Mode::Glyphs);
    }
}
