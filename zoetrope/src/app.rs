use std::io::{self, Write};
use std::time::Duration;

use common::frame::ImageFrame;
use common::palette::Palette;
use thiserror::Error;
use tokio::sync::mpsc::Receiver;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::{Config, ControlEvent};
use crate::converter;
use crate::renderer::TermRenderer;
use crate::source::{CaptureError, FrameSource};

/// Steady-state render cadence, matching a 30 fps capture
pub const FRAME_INTERVAL: Duration = Duration::from_millis(1000 / 30);

/// Lifecycle of the frame loop. Transitions run strictly forward:
/// once Running, returning to an earlier state requires tearing the
/// app down and rebuilding it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    /// Constructed, loop not started
    Idle,
    /// Waiting for the source's readiness predicate to hold before
    /// the first pass runs
    Warming,
    /// Rendering on every timer tick
    Running,
}

/// A failure confined to a single render pass. The loop logs these and
/// keeps ticking; one bad frame must not stop the stream.
#[derive(Debug, Error)]
pub enum PassError {
    #[error(transparent)]
    Capture(#[from] CaptureError),
    #[error("terminal write failed: {0}")]
    Render(#[from] io::Error),
}

/// Owns the whole pipeline: source, configuration, palette, and renderer.
/// One render pass runs per timer tick, so passes never overlap and the
/// shared frame buffer is written by at most one pass at a time.
pub struct App<S: FrameSource, W: Write> {
    source: S,
    renderer: TermRenderer<W>,
    config: Config,
    palette: Palette,
    state: RunState,
    events: Receiver<ControlEvent>,
    /// pass-local snapshot buffer, resized to the source every frame
    frame: ImageFrame,
}

impl<S: FrameSource, W: Write> App<S, W> {
    pub fn new(
        source: S,
        renderer: TermRenderer<W>,
        config: Config,
        events: Receiver<ControlEvent>,
    ) -> Self {
        let palette = Palette::generate(config.primary, config.secondary, config.palette_steps);

        Self {
            source,
            renderer,
            config,
            palette,
            state: RunState::Idle,
            events,
            frame: ImageFrame::empty(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Drive the pipeline until the operator quits.
    ///
    /// Missed ticks are skipped rather than bursted: if a pass overruns
    /// the interval, queued ticks coalesce into the next one instead of
    /// piling up behind it.
    pub async fn run(&mut self) {
        self.state = RunState::Warming;
        info!("warming up, waiting for the source to produce a frame");

        let mut ticker = tokio::time::interval(FRAME_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            if self.drain_events() {
                info!("quit requested");
                break;
            }

            match self.state {
                RunState::Idle => {}
                RunState::Warming => {
                    if self.source.is_ready() {
                        let (w, h) = self.source.dimensions();
                        info!(w, h, "source ready, rendering");
                        self.state = RunState::Running;
                    }
                }
                RunState::Running => {
                    if let Err(e) = self.render_once() {
                        warn!(error = %e, "render pass failed");
                    }
                }
            }
        }
    }

    /// Apply all pending control events. Returns `true` on quit.
    ///
    /// Draining happens between passes, so a pass always works from one
    /// consistent configuration snapshot; the palette is regenerated here,
    /// and only when one of its three inputs actually changed.
    fn drain_events(&mut self) -> bool {
        loop {
            match self.events.try_recv() {
                Ok(ControlEvent::Quit) => return true,
                Ok(event) => {
                    debug!(?event, "applying control event");
                    if self.config.apply(&event) {
                        self.palette = Palette::generate(
                            self.config.primary,
                            self.config.secondary,
                            self.config.palette_steps,
                        );
                        debug!(steps = self.palette.len(), "palette regenerated");
                    }
                }
                Err(TryRecvError::Empty) => return false,
                // input task gone means no way to ever quit interactively
                Err(TryRecvError::Disconnected) => return true,
            }
        }
    }

    /// One full pipeline pass: snapshot, sample, quantize, paint.
    ///
    /// Independent of the timer so it can be exercised directly. A source
    /// that is not ready (zero dimensions or no frame yet) degrades to a
    /// no-op for this tick rather than failing.
    pub fn render_once(&mut self) -> Result<(), PassError> {
        let (w, h) = self.source.dimensions();
        if w == 0 || h == 0 {
            return Ok(());
        }

        if !self.source.capture_frame(&mut self.frame)? {
            return Ok(());
        }

        let cells = converter::convert(&self.frame, &self.config, &self.palette);
        self.renderer.render(&cells)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::mock_source::{MockSource, PatternType};
    use common::color::Rgb;
    use tokio::sync::mpsc;

    #[test]
    fn render_once_paints_mock_frames() {
        let (_tx, rx) = mpsc::channel(8);
        let source = MockSource::new(32, 24, PatternType::Checkerboard).unwrap();
        let config = Config::new(Mode::Glyphs, 8, " .:", Rgb::WHITE, Rgb::BLACK, 4);
        let mut app = App::new(source, TermRenderer::new(Vec::new()), config, rx);

        assert_eq!(app.state(), RunState::Idle);
        app.render_once().unwrap();
    }

    #[test]
    fn quit_event_stops_draining() {
        let (tx, rx) = mpsc::channel(8);
        let source = MockSource::new(16, 16, PatternType::GradientSweep).unwrap();
        let config = Config::new(Mode::Glyphs, 4, " .:", Rgb::WHITE, Rgb::BLACK, 4);
        let mut app = App::new(source, TermRenderer::new(Vec::new()), config, rx);

        tx.try_send(ControlEvent::ToggleMode).unwrap();
        tx.try_send(ControlEvent::Quit).unwrap();
        assert!(app.drain_events());
        assert_eq!(app.config.mode, Mode::Blocks);
    }

    #[test]
    fn disconnected_input_counts_as_quit() {
        let (tx, rx) = mpsc::channel(8);
        let source = MockSource::new(16, 16, PatternType::GradientSweep).unwrap();
        let config = Config::new(Mode::Glyphs, 4, " .:", Rgb::WHITE, Rgb::BLACK, 4);
        let mut app = App::new(source, TermRenderer::new(Vec::new()), config, rx);

        drop(tx);
        assert!(app.drain_events());
    }

    #[test]
    fn palette_regenerates_only_on_palette_inputs() {
        let (tx, rx) = mpsc::channel(8);
        let source = MockSource::new(16, 16, PatternType::Checkerboard).unwrap();
        let config = Config::new(Mode::Blocks, 4, " .:", Rgb::BLACK, Rgb::WHITE, 2);
        let mut app = App::new(source, TermRenderer::new(Vec::new()), config, rx);

        let before = app.palette.clone();
        tx.try_send(ControlEvent::AdjustCellSize(1)).unwrap();
        app.drain_events();
        assert_eq!(app.palette, before);

        tx.try_send(ControlEvent::AdjustSteps(2)).unwrap();
        app.drain_events();
        assert_eq!(app.palette.len(), 4);
    }

    #[test]
    fn not_ready_source_is_a_noop_pass() {
        struct Dormant;
        impl FrameSource for Dormant {
            fn dimensions(&self) -> (usize, usize) {
                (0, 0)
            }
            fn capture_frame(&mut self, _frame: &mut ImageFrame) -> Result<bool, CaptureError> {
                panic!("capture must not be attempted before readiness");
            }
        }

        let (_tx, rx) = mpsc::channel(8);
        let config = Config::new(Mode::Glyphs, 4, " .:", Rgb::WHITE, Rgb::BLACK, 4);
        let mut app = App::new(Dormant, TermRenderer::new(Vec::new()), config, rx);
        app.render_once().unwrap();
    }
}
