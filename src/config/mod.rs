mod types;

pub use types::Config;

use std::path::{Path, PathBuf};

pub fn load_config() -> Config {
    load_config_from(&get_config_path())
}

/// Loads and validates `config_path`, falling back to defaults when the file
/// is missing, unreadable, unparsable or has validation errors.
pub fn load_config_from(config_path: &Path) -> Config {
    let config = if config_path.exists() {
        match std::fs::read_to_string(config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded config from {:?}", config_path);
                    config
                }
                Err(e) => {
                    log::error!("Failed to parse config: {}", e);
                    Config::default()
                }
            },
            Err(e) => {
                log::error!("Failed to read config file: {}", e);
                Config::default()
            }
        }
    } else {
        log::info!("No config file found at {:?}, using defaults", config_path);
        Config::default()
    };

    let issues = config.validate();
    let errors: Vec<_> = issues.iter().filter(|i| i.is_error).collect();
    let warnings: Vec<_> = issues.iter().filter(|i| !i.is_error).collect();

    for warning in &warnings {
        log::warn!("Config: {}", warning);
    }
    for error in &errors {
        log::error!("Config: {}", error);
    }

    if !errors.is_empty() {
        log::error!("Config has errors; falling back to defaults.");
        return Config::default();
    }

    config
}

pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("dockswitch")
}

pub fn get_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Directory holding saved layouts.
pub fn storage_dir(config: &Config) -> PathBuf {
    config.storage.dir.clone().unwrap_or_else(config_dir)
}
