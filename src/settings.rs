use crate::actuator::ActuatorConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, warn};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub host_name: Option<String>,
    pub input_device: Option<String>,
    pub sample_rate: Option<u32>,
    pub buffer_size: Option<u32>,
    /// Seconds of microphone audio kept for the loudness window.
    pub capture_seconds: f32,
    /// Play this WAV file instead of listening to a microphone.
    pub replay_file: Option<PathBuf>,
    pub actuator: ActuatorConfig,
    /// Start listening as soon as the window opens.
    pub auto_start: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            host_name: None,
            input_device: None,
            sample_rate: None,
            buffer_size: None,
            capture_seconds: 1.0, // Same length as a looping one-second mic clip
            replay_file: None,
            actuator: ActuatorConfig::default(),
            auto_start: true,
        }
    }
}

pub fn get_config_dir() -> Option<PathBuf> {
    if let Ok(exe_path) = env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let app_settings_dir = exe_dir.join("AppSettings");
            if !app_settings_dir.exists() {
                if let Err(e) = fs::create_dir_all(&app_settings_dir) {
                    error!(
                        "Failed to create directory at {}: {}",
                        app_settings_dir.display(),
                        e
                    );
                    return None;
                }
            }
            return Some(app_settings_dir);
        }
    }
    error!("Could not determine application directory.");
    None
}

pub fn save_settings_to(path: &Path, settings: &AppSettings) -> io::Result<()> {
    let json_string = serde_json::to_string_pretty(settings)?;
    fs::write(path, json_string)
}

/// Reads settings from `path`. A missing, unreadable or malformed file
/// yields the defaults.
pub fn load_settings_from(path: &Path) -> AppSettings {
    if !path.exists() {
        return AppSettings::default();
    }
    match fs::read_to_string(path) {
        Ok(json_string) => match serde_json::from_str::<AppSettings>(&json_string) {
            Ok(settings) => {
                if let Err(e) = settings.actuator.validate() {
                    warn!("Stored actuator settings rejected, using defaults. Error: {}", e);
                    return AppSettings {
                        actuator: ActuatorConfig::default(),
                        ..settings
                    };
                }
                settings
            }
            Err(e) => {
                warn!("Failed to parse settings file, using defaults. Error: {}", e);
                AppSettings::default()
            }
        },
        Err(e) => {
            warn!("Failed to read settings file, using defaults. Error: {}", e);
            AppSettings::default()
        }
    }
}

pub fn save_settings(settings: &AppSettings) {
    if let Some(dir) = get_config_dir() {
        let path = dir.join("settings.json");
        if let Err(e) = save_settings_to(&path, settings) {
            error!("Failed to write settings to {}: {}", path.display(), e);
        }
    }
}

pub fn load_settings() -> AppSettings {
    match get_config_dir() {
        Some(dir) => load_settings_from(&dir.join("settings.json")),
        None => AppSettings::default(),
    }
}
