use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde_json::Error as SerdeError;

use crate::domain::Settings;

const APP_QUALIFIER: &str = "com";
const APP_ORG: &str = "IdleProfitFinder";
const APP_NAME: &str = "IdleProfitFinder";

pub fn settings_file() -> Option<PathBuf> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .map(|dirs| dirs.config_dir().join("settings.json"))
}

/// Saved settings merged over the defaults, if a readable file exists.
pub fn load_settings() -> Option<Settings> {
    load_settings_from(&settings_file()?)
}

pub fn load_settings_from(path: &Path) -> Option<Settings> {
    let data = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<Settings>(&data) {
        Ok(settings) => Some(settings.sanitized()),
        Err(err) => {
            tracing::warn!("[settings] ignoring unreadable {}: {err}", path.display());
            None
        }
    }
}

pub fn save_settings(settings: &Settings) -> Result<(), PersistSaveError> {
    let path = settings_file().ok_or(PersistSaveError::StorageUnavailable)?;
    save_settings_to(&path, settings)
}

pub fn save_settings_to(path: &Path, settings: &Settings) -> Result<(), PersistSaveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    tracing::debug!("[settings] saved to {}", path.display());
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum PersistSaveError {
    #[error("storage directory unavailable")]
    StorageUnavailable,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] SerdeError),
}
