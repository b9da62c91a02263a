use std::process::{Child, Command, Stdio};

use tracing::{debug, info};

use crate::source::CaptureError;

/// Verifies that `ffmpeg` is installed and spawns it as a child process
/// streaming raw RGBA frames from the default camera to its stdout.
pub fn spawn(w: usize, h: usize, fps: u32) -> Result<Child, CaptureError> {
    match Command::new("ffmpeg").arg("-version").output() {
        Ok(output) => {
            info!(
                "ffmpeg found: {}",
                String::from_utf8_lossy(&output.stdout)
                    .lines()
                    .next()
                    .unwrap_or_default()
            );
        }
        Err(e) => return Err(CaptureError::FfmpegMissing(e)),
    }

    let mut cmd = Command::new("ffmpeg");
    os_setup(&mut cmd, w, h, fps)?;

    cmd.stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(CaptureError::Spawn)
}

/// Determines the OS of the current system and structures the
/// `ffmpeg` CLI with the appropriate capture arguments
fn os_setup(cmd: &mut Command, w: usize, h: usize, fps: u32) -> Result<(), CaptureError> {
    let framerate = fps.to_string();
    let video_size = format!("{w}x{h}");

    if cfg!(target_os = "macos") {
        debug!("macOS detected, capturing through avfoundation");
        cmd.args([
            "-f",
            "avfoundation",
            "-framerate",
            framerate.as_str(),
            "-video_size",
            video_size.as_str(),
            "-i",
            "0:none",
        ]);
    } else if cfg!(target_os = "linux") {
        debug!("Linux detected, capturing through v4l2");
        cmd.args([
            "-f",
            "v4l2",
            "-framerate",
            framerate.as_str(),
            "-video_size",
            video_size.as_str(),
            "-i",
            "/dev/video0",
        ]);
    } else if cfg!(target_os = "windows") {
        debug!("Windows detected, capturing through dshow");
        cmd.args([
            "-f",
            "dshow",
            "-framerate",
            framerate.as_str(),
            "-video_size",
            video_size.as_str(),
            "-i",
            "video=USB2.0 HD UVC WebCam",
        ]);
    } else {
        return Err(CaptureError::UnsupportedPlatform);
    }

    // output opts
    cmd.args(["-f", "rawvideo", "-pix_fmt", "rgba"]);
    // latency opts
    cmd.args([
        "-probesize",
        "32",
        "-analyzeduration",
        "0",
        "-fflags",
        "nobuffer",
        "-flags",
        "low_delay",
    ]);
    // pipe to stdout
    cmd.arg("pipe:1");

    Ok(())
}
