//! Configuration module for AISEO-RS
//!
//! Handles loading settings from YAML files and environment variables.

mod settings;

pub use settings::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit settings file
pub const SETTINGS_PATH_VAR: &str = "AISEO_SETTINGS_PATH";

/// Candidate settings locations, in lookup order
pub fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Ok(path) = std::env::var(SETTINGS_PATH_VAR) {
        paths.push(PathBuf::from(path));
    }
    paths.push(PathBuf::from("settings.yml"));
    paths.push(PathBuf::from("config/settings.yml"));
    paths.push(PathBuf::from("/etc/aiseo/settings.yml"));
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("aiseo-rs").join("settings.yml"));
    }
    paths
}

/// Load settings from the first existing candidate, then apply the environment
pub fn load() -> Result<Settings> {
    let mut settings = match candidate_paths().into_iter().find(|p| p.exists()) {
        Some(path) => {
            tracing::info!("Loading settings from {:?}", path);
            load_file(&path)?
        }
        None => {
            tracing::info!("No settings file found, using defaults");
            Settings::default()
        }
    };
    settings.merge_env();
    Ok(settings)
}

/// Load settings from an explicit path
pub fn load_file(path: &Path) -> Result<Settings> {
    Settings::from_file(path).with_context(|| format!("invalid settings file {:?}", path))
}
