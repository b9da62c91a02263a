use std::time::Duration;

use common::color::Rgb;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc::Sender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::{ControlEvent, DEFAULT_RAMP};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Ramp presets cycled with the `g` key, all darkest to brightest
const RAMP_PRESETS: [&str; 4] = [
    DEFAULT_RAMP,
    " .:-=+*#%@",
    " .:coPO?@■",
    " ░▒▓█",
];

/// Palette endpoint pairs cycled with the `p` key
const COLOR_PRESETS: [(Rgb, Rgb); 3] = [
    (Rgb::WHITE, Rgb::new(0xdb, 0x00, 0x1c)),
    (Rgb::new(0x00, 0xff, 0x41), Rgb::BLACK),
    (Rgb::new(0xff, 0xb0, 0x00), Rgb::new(0x20, 0x14, 0x58)),
];

/// Reads keyboard input and forwards it to the frame loop as typed
/// control events. Runs on a blocking task because crossterm's event
/// polling is synchronous; the loop itself never touches the keyboard.
///
/// The task ends when it has sent `Quit` or when the receiving side of
/// the channel goes away.
pub fn spawn_input_task(tx: Sender<ControlEvent>) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let mut ramp_index = 0usize;
        let mut color_index = 0usize;

        loop {
            match event::poll(POLL_INTERVAL) {
                Ok(true) => {}
                Ok(false) => {
                    if tx.is_closed() {
                        break;
                    }
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, "keyboard polling failed, controls disabled");
                    break;
                }
            }

            let key = match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => key,
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, "keyboard read failed, controls disabled");
                    break;
                }
            };

            let ctrl_c = key.code == KeyCode::Char('c')
                && key.modifiers.contains(KeyModifiers::CONTROL);

            let mut pending: Vec<ControlEvent> = Vec::new();
            match key.code {
                _ if ctrl_c => pending.push(ControlEvent::Quit),
                KeyCode::Char('q') | KeyCode::Esc => pending.push(ControlEvent::Quit),
                KeyCode::Char('m') => pending.push(ControlEvent::ToggleMode),
                KeyCode::Char('+') | KeyCode::Char('=') => {
                    pending.push(ControlEvent::AdjustCellSize(1));
                }
                KeyCode::Char('-') | KeyCode::Char('_') => {
                    pending.push(ControlEvent::AdjustCellSize(-1));
                }
                KeyCode::Char(']') => pending.push(ControlEvent::AdjustSteps(1)),
                KeyCode::Char('[') => pending.push(ControlEvent::AdjustSteps(-1)),
                KeyCode::Char('g') => {
                    ramp_index = (ramp_index + 1) % RAMP_PRESETS.len();
                    pending.push(ControlEvent::SetRamp(RAMP_PRESETS[ramp_index].to_string()));
                }
                KeyCode::Char('p') => {
                    color_index = (color_index + 1) % COLOR_PRESETS.len();
                    let (primary, secondary) = COLOR_PRESETS[color_index];
                    pending.push(ControlEvent::SetPrimary(primary));
                    pending.push(ControlEvent::SetSecondary(secondary));
                }
                _ => {}
            }

            for control in pending {
                debug!(?control, "control event");
                let quitting = control == ControlEvent::Quit;
                if tx.blocking_send(control).is_err() || quitting {
                    return;
                }
            }
        }
    })
}
