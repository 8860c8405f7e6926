use serde::Deserialize;
use std::{error::Error, fs};

const SETTINGS_FILENAME: &str = "settings.json";

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bind_address: String,
    pub port: u16,
    pub db_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            bind_address: "0.0.0.0".to_string(),
            port: 5000,
            db_path: "taskboard.redb".to_string(),
        }
    }
}

impl Settings {
    /// Read settings.json from the working directory; fall back to
    /// defaults when the file is absent.
    pub fn load() -> Result<Settings, Box<dyn Error>> {
        match fs::read_to_string(SETTINGS_FILENAME) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(_) => Ok(Settings::default()),
        }
    }
}
