use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE_NAME: &str = "config.json";
const CONFIG_ENV_VAR: &str = "TASKDECK_CONFIG_PATH";
const API_URL_ENV_VAR: &str = "TASKDECK_API_URL";

pub const DEFAULT_CACHE_TTL_MS: i64 = 30_000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Palette {
    pub danger: &'static str,
    pub warn: &'static str,
    pub ok: &'static str,
    pub muted: &'static str,
    pub reset: &'static str,
}

impl Palette {
    pub fn wrap(&self, color: &'static str, text: &str) -> String {
        if color.is_empty() {
            text.to_string()
        } else {
            format!("{}{}{}", color, text, self.reset)
        }
    }
}

pub fn palette_for_theme(theme: Option<&str>) -> Palette {
    match theme.map(canonical_theme_name).as_deref() {
        Some("plain") => Palette {
            danger: "",
            warn: "",
            ok: "",
            muted: "",
            reset: "",
        },
        _ => Palette {
            danger: "\x1b[38;5;203m",
            warn: "\x1b[38;5;214m",
            ok: "\x1b[38;5;114m",
            muted: "\x1b[38;5;250m",
            reset: "\x1b[0m",
        },
    }
}

pub fn canonical_theme_name(raw: &str) -> String {
    match raw.trim().to_ascii_lowercase().as_str() {
        "plain" | "mono" | "none" | "no-color" | "nocolor" => "plain".to_string(),
        _ => "default".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: Option<String>,
    pub cache_ttl_ms: i64,
    pub request_timeout_secs: u64,
    pub theme: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: None,
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            theme: None,
        }
    }
}

impl Config {
    /// Zero disables the transport timeout entirely.
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }
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
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata)
            .join("taskdeck")
            .join(CONFIG_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("taskdeck")
            .join(CONFIG_FILE_NAME))
    }
}

pub fn load_config() -> Result<Config, AppError> {
    let path = config_path()?;
    let mut config = load_config_from_path(&path)?;
    override_api_url(&mut config, std::env::var(API_URL_ENV_VAR).ok());
    Ok(config)
}

/// Missing or broken config files fall back to defaults so the CLI can still
/// print a useful error about what went wrong.
pub fn load_config_with_fallback() -> ConfigLoad {
    let mut loaded = match config_path() {
        Ok(path) => load_config_with_fallback_from_path(&path),
        Err(err) => ConfigLoad {
            config: Config::default(),
            error: Some(err),
        },
    };
    override_api_url(&mut loaded.config, std::env::var(API_URL_ENV_VAR).ok());
    loaded
}

fn load_config_with_fallback_from_path(path: &Path) -> ConfigLoad {
    if !path.exists() {
        return ConfigLoad {
            config: Config::default(),
            error: None,
        };
    }

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

fn load_config_from_path(path: &Path) -> Result<Config, AppError> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })
}

fn override_api_url(config: &mut Config, value: Option<String>) {
    if let Some(url) = value
        && !url.trim().is_empty()
    {
        config.api_base_url = Some(url);
    }
}
