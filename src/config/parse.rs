//! Source file discovery and settings parsing

use crate::config::schema::validate_settings;
use crate::config::types::Settings;
use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the task file searched for when none is given
pub const SOURCE_FILE_NAME: &str = "Buggeryfile";

/// Settings file names, in order of preference
const SETTINGS_FILE_NAMES: &[&str] = &["buggery.yml", "buggery.yaml"];

/// Find the task file by searching current and parent directories
pub fn find_source_file() -> ConfigResult<PathBuf> {
    find_source_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the task file starting from a specific directory
pub fn find_source_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut searched_paths = Vec::new();

    for dir in start_dir.ancestors() {
        let source_path = dir.join(SOURCE_FILE_NAME);
        if source_path.is_file() {
            return Ok(source_path);
        }
        searched_paths.push(dir.display().to_string());
    }

    Err(ConfigError::NotFound(
        SOURCE_FILE_NAME.to_string(),
        searched_paths.join(", "),
    ))
}

/// Locate a settings file: next to the task file first, then in the
/// user's configuration directory
pub fn find_settings_file(source_dir: &Path) -> Option<PathBuf> {
    let user_dir = ProjectDirs::from("", "", "buggery").map(|dirs| dirs.config_dir().to_path_buf());

    std::iter::once(source_dir.to_path_buf())
        .chain(user_dir)
        .flat_map(|dir| SETTINGS_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Parse and validate settings from YAML text
pub fn parse_settings(yaml: &str) -> ConfigResult<Settings> {
    if yaml.trim().is_empty() {
        return Ok(Settings::default());
    }

    let settings: Settings =
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::Invalid(e.to_string()))?;
    validate_settings(&settings)?;
    Ok(settings)
}

/// Parse a settings file from a path
pub fn parse_settings_file(path: &Path) -> ConfigResult<Settings> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    parse_settings(&contents)
}

/// Settings for a task file in `source_dir`; defaults when no file exists
pub fn load_settings(source_dir: &Path) -> ConfigResult<Settings> {
    match find_settings_file(source_dir) {
        Some(path) => parse_settings_file(&path),
        None => Ok(Settings::default()),
    }
}

/// Load the configured dotenv file into the process environment.
///
/// Variables already set are left alone. Returns the file that was loaded,
/// or `None` if none is configured or it does not exist.
pub fn load_env_file(settings: &Settings, source_dir: &Path) -> ConfigResult<Option<PathBuf>> {
    let Some(env_file) = &settings.env_file else {
        return Ok(None);
    };

    let path = source_dir.join(env_file);
    if !path.is_file() {
        return Ok(None);
    }

    dotenvy::from_path(&path).map_err(|e| ConfigError::EnvFile {
        path: path.clone(),
        error: e.to_string(),
    })?;
    Ok(Some(path))
}
