//! Error type for settings loading and validation.

use std::path::PathBuf;

use thiserror::Error;

/// Startup-time failures. All of them are fatal for the binaries.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The config document could not be read from disk.
    #[error("[Settings] cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config document is not valid YAML for the expected schema.
    #[error("[Settings] invalid config document: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// One or more required fields are missing or invalid.
    ///
    /// Carries every problem found, not just the first one.
    #[error("[Settings] invalid configuration: {}", .0.join("; "))]
    Config(Vec<String>),

    /// Required secrets are missing; lists exactly the missing names.
    #[error("[Settings] missing credentials: {}", .0.join(", "))]
    Credential(Vec<&'static str>),
}

impl SettingsError {
    /// Names of the missing credentials, if this is a credential error.
    pub fn missing_credentials(&self) -> &[&'static str] {
        match self {
            SettingsError::Credential(names) => names,
            _ => &[],
        }
    }

    /// Individual configuration issues, if this is a config error.
    pub fn config_issues(&self) -> &[String] {
        match self {
            SettingsError::Config(issues) => issues,
            _ => &[],
        }
    }
}
