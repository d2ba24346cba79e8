//! The Dock edge, the mechanism that moves it, and failure handling.

pub mod applescript;
pub mod executor;
pub mod prompt;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use applescript::AppleScriptDock;
pub use executor::{ActionExecutor, ApplyResult};
pub use prompt::{AppleScriptPrompt, PromptChoice, Remediation};

/// Screen edge the Dock is anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DockPosition {
    Bottom,
    Left,
    Right,
}

impl DockPosition {
    /// Value understood by `System Events` dock preferences.
    pub fn as_str(self) -> &'static str {
        match self {
            DockPosition::Bottom => "bottom",
            DockPosition::Left => "left",
            DockPosition::Right => "right",
        }
    }
}

impl fmt::Display for DockPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DockPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bottom" => Ok(DockPosition::Bottom),
            "left" => Ok(DockPosition::Left),
            "right" => Ok(DockPosition::Right),
            other => Err(format!(
                "unknown dock position '{}' (expected bottom, left or right)",
                other
            )),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("failed to launch osascript: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("script failed{}: {message}", .code.map(|c| format!(" ({})", c)).unwrap_or_default())]
    Failed { code: Option<i32>, message: String },
    #[error("script timed out after {0:?}")]
    Timeout(std::time::Duration),
}

impl ScriptError {
    /// OS error number reported by the script runtime, when there is one.
    pub fn code(&self) -> Option<i32> {
        match self {
            ScriptError::Failed { code, .. } => *code,
            _ => None,
        }
    }
}

/// Moves the Dock. Implementations may block; callers run them off the
/// engine thread.
pub trait DockController: Send + Sync {
    fn set_dock_edge(&self, position: DockPosition) -> Result<(), ScriptError>;
}
