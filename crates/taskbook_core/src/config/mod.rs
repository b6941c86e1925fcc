use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKBOOK_CONFIG_PATH";

/// Rendering preference persisted across runs. `Dark` colors output for
/// dark terminals; `Light` leaves the terminal's own colors alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Light,
    Dark,
}

impl Default for DisplayMode {
    fn default() -> Self {
        DisplayMode::Light
    }
}

impl DisplayMode {
    pub fn toggle(self) -> Self {
        match self {
            DisplayMode::Light => DisplayMode::Dark,
            DisplayMode::Dark => DisplayMode::Light,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisplayMode::Light => "light",
            DisplayMode::Dark => "dark",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Palette {
    pub accent: &'static str,
    pub muted: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn accentize(&self, text: &str) -> String {
        if self.accent.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", self.accent, text, self.reset)
        }
    }

    pub fn mutedize(&self, text: &str) -> String {
        if self.muted.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", self.muted, text, self.reset)
        }
    }
}

pub fn palette_for_mode(mode: DisplayMode) -> Palette {
    match mode {
        DisplayMode::Light => Palette {
            accent: "",
            muted: "",
            reset: "",
        },
        DisplayMode::Dark => Palette {
            accent: "\x1b[38;5;110m",
            muted: "\x1b[38;5;245m",
            reset: "\x1b[0m",
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub mode: DisplayMode,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub error: Option<AppError>,
}

pub fn config_path() -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::storage("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("taskbook")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::storage("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskbook")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content =
        std::fs::read_to_string(path).map_err(|err| AppError::storage(err.to_string()))?;
    serde_json::from_str(&content)
        .map_err(|err| AppError::corrupted(format!("invalid config: {err}")))
}

/// A broken config file should never block the program; fall back to the
/// defaults and hand the cause back for a warning line.
pub fn load_config_with_fallback(path: &Path) -> ConfigLoad {
    match load_config_from_path(path) {
        Ok(config) => ConfigLoad {
            config,
            error: None,
        },
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    }
}

pub fn save_config(path: &Path, config: &Config) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|err| AppError::storage(err.to_string()))?;
    }

    let content =
        serde_json::to_string_pretty(config).map_err(|err| AppError::corrupted(err.to_string()))?;
    std::fs::write(path, content).map_err(|err| AppError::storage(err.to_string()))
}
