//! Settings types
//!
//! This module defines the data structures that represent a buggery.yml
//! settings file. Every field is optional in the file.

use serde::{Deserialize, Serialize};

/// Runner settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    /// Command prefix used to run shell text (e.g., ["bash", "-c"])
    #[serde(default = "default_interpreter")]
    pub interpreter: Vec<String>,

    /// Echo command output while it is captured
    #[serde(default = "default_stream_output", alias = "stream-output")]
    pub stream_output: bool,

    /// Dotenv file loaded before any task runs, relative to the source file
    #[serde(
        default = "default_env_file",
        alias = "env-file",
        skip_serializing_if = "Option::is_none"
    )]
    pub env_file: Option<String>,
}

fn default_interpreter() -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string()]
}

fn default_stream_output() -> bool {
    true
}

fn default_env_file() -> Option<String> {
    Some(".env".to_string())
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            interpreter: default_interpreter(),
            stream_output: default_stream_output(),
            env_file: default_env_file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_partial_settings() {
        let yaml = r#"
interpreter:
  - bash
  - -c
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.interpreter, vec!["bash", "-c"]);
        assert!(settings.stream_output);
        assert_eq!(settings.env_file.as_deref(), Some(".env"));
    }

    #[test]
    fn test_deserialize_kebab_case_keys() {
        let yaml = r#"
stream-output: false
env-file: config/dev.env
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert!(!settings.stream_output);
        assert_eq!(settings.env_file.as_deref(), Some("config/dev.env"));
        assert_eq!(settings.interpreter, vec!["sh", "-c"]);
    }

    #[test]
    fn test_null_env_file_disables_it() {
        let settings: Settings = serde_yaml::from_str("env_file: ~\n").unwrap();
        assert_eq!(settings.env_file, None);
    }
}
