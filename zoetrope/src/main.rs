mod app;
mod camera;
mod config;
mod controls;
mod converter;
mod ffmpeg;
mod mock_source;
mod quantizer;
mod renderer;
mod sampler;
mod source;

use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use common::color::Rgb;
use tokio::sync::mpsc;
use tracing::info;

use crate::app::App;
use crate::config::{Config, DEFAULT_RAMP, Mode};
use crate::mock_source::{MockSource, PatternType};
use crate::renderer::{TermRenderer, TerminalGuard};
use crate::source::{CameraSource, FrameSource};

/// Rate the camera is asked to capture at; the render loop ticks at the
/// same cadence.
const CAPTURE_FPS: u32 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum SourceKind {
    /// Default webcam, captured through ffmpeg
    Camera,
    /// Synthetic test patterns, no camera required
    Mock,
}

#[derive(Parser, Debug)]
#[command(
    name = "zoetrope",
    about = "Live camera feed rendered as ASCII glyphs or color mosaics in the terminal"
)]
struct Args {
    /// Output style
    #[arg(long, value_enum, default_value = "glyphs")]
    mode: Mode,

    /// Edge length of a sample block, in source pixels
    #[arg(long, default_value_t = 9)]
    cell_size: usize,

    /// Brightness ramp for glyph mode, darkest to brightest
    #[arg(long, default_value = DEFAULT_RAMP)]
    ramp: String,

    /// Glyph color and first palette endpoint, as #rrggbb
    #[arg(long, default_value = "#ffffff", value_parser = parse_rgb)]
    primary: Rgb,

    /// Second palette endpoint, as #rrggbb
    #[arg(long, default_value = "#db001c", value_parser = parse_rgb)]
    secondary: Rgb,

    /// Number of palette colors between the endpoints
    #[arg(long, default_value_t = 16)]
    steps: usize,

    /// Where frames come from
    #[arg(long, value_enum, default_value = "camera")]
    source: SourceKind,

    /// Pattern used by the mock source
    #[arg(long, value_enum, default_value = "checkerboard")]
    pattern: PatternType,

    /// Capture width requested from the camera
    #[arg(long, default_value_t = 640)]
    camera_width: usize,

    /// Capture height requested from the camera
    #[arg(long, default_value_t = 480)]
    camera_height: usize,

    /// Log file; stdout is the rendering surface, so logs go to disk
    #[arg(long, default_value = "zoetrope.log")]
    log_file: PathBuf,

    /// Log at debug level instead of info
    #[arg(long)]
    verbose: bool,
}

fn parse_rgb(s: &str) -> Result<Rgb, String> {
    Rgb::from_hex(s).map_err(|e| e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(&args)?;

    let config = Config::new(
        args.mode,
        args.cell_size,
        &args.ramp,
        args.primary,
        args.secondary,
        args.steps,
    );
    info!(?config, "starting zoetrope");

    // open the source before touching the terminal so setup failures
    // (missing ffmpeg, no camera) print like ordinary CLI errors
    match args.source {
        SourceKind::Camera => {
            let source = CameraSource::start(args.camera_width, args.camera_height, CAPTURE_FPS)?;
            run_pipeline(source, config).await?;
        }
        SourceKind::Mock => {
            let source = MockSource::new(args.camera_width, args.camera_height, args.pattern)?;
            run_pipeline(source, config).await?;
        }
    }

    info!("zoetrope stopped");
    Ok(())
}

async fn run_pipeline<S: FrameSource>(source: S, config: Config) -> Result<(), io::Error> {
    let (tx, rx) = mpsc::channel(32);

    let guard = TerminalGuard::enter()?;
    let input = controls::spawn_input_task(tx);

    let mut app = App::new(source, TermRenderer::new(io::stdout()), config, rx);
    app.run().await;

    // restore the terminal before waiting on the input task so the shell
    // is usable again even if that task lingers a poll interval
    drop(app);
    drop(guard);
    let _ = input.await;

    Ok(())
}

fn init_logging(args: &Args) -> Result<(), io::Error> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&args.log_file)?;

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .with_max_level(level)
        .init();

    Ok(())
}
