//! Remediation prompt shown when the Dock script lacks Automation permission.

use std::process::Command;
use std::time::Duration;

use super::applescript::run_osascript;

const ALERT_TITLE: &str = "DockSwitch needs permission";
const ALERT_MESSAGE: &str = "DockSwitch moves the Dock through System Events. \
Allow it under System Settings > Privacy & Security > Automation.";
const OPEN_SETTINGS_BUTTON: &str = "Open System Settings";
const CANCEL_BUTTON: &str = "Cancel";

/// Upper bound on how long the alert may stay open.
const ALERT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    OpenSettings,
    Cancel,
}

/// Blocking user interaction offered after a permission failure.
pub trait Remediation: Send {
    /// Shows the prompt and waits for the user's choice.
    fn ask(&self) -> PromptChoice;
    fn open_settings(&self);
}

/// Native alert through `osascript display alert`; settings open via `open`.
#[derive(Debug, Clone)]
pub struct AppleScriptPrompt {
    settings_url: String,
}

impl AppleScriptPrompt {
    pub fn new(settings_url: impl Into<String>) -> Self {
        Self {
            settings_url: settings_url.into(),
        }
    }
}

impl Remediation for AppleScriptPrompt {
    fn ask(&self) -> PromptChoice {
        match run_osascript(&alert_script(), ALERT_TIMEOUT) {
            Ok(stdout) => parse_choice(&stdout),
            Err(e) => {
                // Pressing the cancel button surfaces as error -128.
                log::debug!("Permission alert dismissed: {}", e);
                PromptChoice::Cancel
            }
        }
    }

    fn open_settings(&self) {
        match Command::new("open").arg(&self.settings_url).output() {
            Ok(output) if output.status.success() => {
                log::info!("Opened {}", self.settings_url);
            }
            Ok(output) => log::error!(
                "Failed to open {}: {}",
                self.settings_url,
                String::from_utf8_lossy(&output.stderr).trim()
            ),
            Err(e) => log::error!("Failed to run open: {}", e),
        }
    }
}

fn alert_script() -> String {
    format!(
        "display alert \"{ALERT_TITLE}\" message \"{ALERT_MESSAGE}\" as warning \
         buttons {{\"{CANCEL_BUTTON}\", \"{OPEN_SETTINGS_BUTTON}\"}} \
         default button \"{OPEN_SETTINGS_BUTTON}\" cancel button \"{CANCEL_BUTTON}\""
    )
}

/// Reads the `button returned:<title>` record printed by `display alert`.
fn parse_choice(stdout: &str) -> PromptChoice {
    let pressed = stdout
        .split(',')
        .find_map(|field| field.trim().strip_prefix("button returned:"))
        .unwrap_or("");
    if pressed == OPEN_SETTINGS_BUTTON {
        PromptChoice::OpenSettings
    } else {
        PromptChoice::Cancel
    }
}
