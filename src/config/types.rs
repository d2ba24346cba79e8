use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

pub const DEFAULT_SETTINGS_URL: &str =
    "x-apple.systempreferences:com.apple.preference.security?Privacy_Automation";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub dock: DockConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    /// Quiet period after the last display change before reconciling
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DockConfig {
    /// How long the dock script may run before it is killed
    #[serde(default = "default_script_timeout_secs")]
    pub script_timeout_secs: u64,
    /// Offer to open System Settings after an Automation permission failure
    #[serde(default = "default_permission_prompt")]
    pub permission_prompt: bool,
    /// Page opened from the permission prompt
    #[serde(default = "default_settings_url")]
    pub settings_url: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    /// Directory for saved layouts (defaults to the config directory)
    pub dir: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            script_timeout_secs: default_script_timeout_secs(),
            permission_prompt: default_permission_prompt(),
            settings_url: default_settings_url(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    1000
}

fn default_script_timeout_secs() -> u64 {
    10
}

fn default_permission_prompt() -> bool {
    true
}

fn default_settings_url() -> String {
    DEFAULT_SETTINGS_URL.to_string()
}

/// A problem found by [`Config::validate`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigIssue {
    pub is_error: bool,
    pub message: String,
}

impl ConfigIssue {
    fn error(message: impl Into<String>) -> Self {
        Self {
            is_error: true,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            is_error: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = if self.is_error { "error" } else { "warning" };
        write!(f, "{}: {}", level, self.message)
    }
}

impl Config {
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if self.general.debounce_ms == 0 {
            issues.push(ConfigIssue::warning(
                "general.debounce_ms = 0 reacts to every intermediate display change",
            ));
        } else if self.general.debounce_ms > 10_000 {
            issues.push(ConfigIssue::warning(format!(
                "general.debounce_ms = {} delays dock changes by more than 10s",
                self.general.debounce_ms
            )));
        }

        if self.dock.script_timeout_secs == 0 {
            issues.push(ConfigIssue::error(
                "dock.script_timeout_secs must be at least 1",
            ));
        }

        if self.dock.permission_prompt && self.dock.settings_url.trim().is_empty() {
            issues.push(ConfigIssue::error(
                "dock.settings_url is empty but dock.permission_prompt is enabled",
            ));
        }

        if let Some(dir) = &self.storage.dir {
            if dir.as_os_str().is_empty() {
                issues.push(ConfigIssue::error("storage.dir is empty"));
            }
        }

        issues
    }
}
