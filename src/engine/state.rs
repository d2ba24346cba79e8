use std::fmt;

use serde::Serialize;

use crate::display::Fingerprint;
use crate::dock::DockPosition;
use crate::store::LayoutPreference;

/// User-facing status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ready,
    Switched(DockPosition),
    NewEnvironment,
    Saved,
    Updated,
    PermissionNeeded,
    SwitchFailed,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ready => f.write_str("ready"),
            Status::Switched(position) => write!(f, "switched to {}", position),
            Status::NewEnvironment => f.write_str("new environment, no saved preference"),
            Status::Saved => f.write_str("preference saved"),
            Status::Updated => f.write_str("preference updated"),
            Status::PermissionNeeded => f.write_str("permission needed"),
            Status::SwitchFailed => f.write_str("switch failed"),
        }
    }
}

impl Serialize for Status {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Session state owned by the engine thread.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub current_fingerprint: Fingerprint,
    pub status: Status,
    /// Set the first time the permission prompt is shown; never cleared.
    pub permission_prompt_shown: bool,
}

impl EngineState {
    pub fn new(current_fingerprint: Fingerprint) -> Self {
        Self {
            current_fingerprint,
            status: Status::Ready,
            permission_prompt_shown: false,
        }
    }
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub fingerprint: Fingerprint,
    pub status: Status,
    /// Preference matching the current fingerprint, if any.
    pub current: Option<LayoutPreference>,
    pub preferences: Vec<LayoutPreference>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            fingerprint: Fingerprint::default(),
            status: Status::Ready,
            current: None,
            preferences: Vec::new(),
        }
    }
}
