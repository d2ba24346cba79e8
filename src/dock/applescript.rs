//! Moves the Dock through `System Events` dock preferences via `osascript`.

use std::io::Read;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use super::{DockController, DockPosition, ScriptError};

/// Drives the Dock with AppleScript. Needs the Automation permission for
/// System Events; without it the script fails with -1743.
#[derive(Debug, Clone)]
pub struct AppleScriptDock {
    timeout: Duration,
}

impl AppleScriptDock {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl DockController for AppleScriptDock {
    fn set_dock_edge(&self, position: DockPosition) -> Result<(), ScriptError> {
        log::debug!("Setting dock position to {}", position);
        run_osascript(&dock_edge_script(position), self.timeout).map(|_| ())
    }
}

pub(crate) fn dock_edge_script(position: DockPosition) -> String {
    format!(
        "tell application \"System Events\"\n\
         \ttell dock preferences\n\
         \t\tset screen edge to {}\n\
         \tend tell\n\
         end tell",
        position.as_str()
    )
}

/// Runs an AppleScript source and returns its trimmed stdout.
pub(crate) fn run_osascript(source: &str, timeout: Duration) -> Result<String, ScriptError> {
    let mut child = Command::new("osascript")
        .args(["-e", source])
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(ScriptError::Spawn)?;

    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let mut stdout = String::new();
                let mut stderr = String::new();
                if let Some(mut out) = child.stdout.take() {
                    let _ = out.read_to_string(&mut stdout);
                }
                if let Some(mut err) = child.stderr.take() {
                    let _ = err.read_to_string(&mut stderr);
                }

                if status.success() {
                    return Ok(stdout.trim().to_string());
                }
                let message = stderr.trim().to_string();
                return Err(ScriptError::Failed {
                    code: parse_error_code(&message),
                    message,
                });
            }
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ScriptError::Timeout(timeout));
                }
                std::thread::sleep(Duration::from_millis(10));
            }
            Err(e) => return Err(ScriptError::Spawn(e)),
        }
    }
}

/// Extracts the trailing `(-NNNN)` error number osascript prints on failure,
/// e.g. `execution error: Not authorized to send Apple events to System Events. (-1743)`.
pub(crate) fn parse_error_code(stderr: &str) -> Option<i32> {
    let end = stderr.rfind(')')?;
    let start = stderr[..end].rfind('(')?;
    stderr[start + 1..end].trim().parse().ok()
}
