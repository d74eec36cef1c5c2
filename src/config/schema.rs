//! Settings validation

use crate::config::types::Settings;
use crate::error::{ConfigError, ConfigResult};

/// Validate loaded settings
pub fn validate_settings(settings: &Settings) -> ConfigResult<()> {
    match settings.interpreter.first() {
        None => Err(ConfigError::Invalid(
            "interpreter must name a program".to_string(),
        )),
        Some(program) if program.trim().is_empty() => Err(ConfigError::Invalid(
            "interpreter program is blank".to_string(),
        )),
        Some(_) => Ok(()),
    }
}
