use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("flag parsing error: {0}")]
    Flag(#[from] clap::Error),

    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("config file not found: {0}")]
    FileNotFound(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("invalid value {value:?} for {target} (expected {kind}): {reason}")]
    Coerce {
        /// Dotted flag path or environment variable name of the failing leaf.
        target: String,
        /// Name of the leaf's native type.
        kind: &'static str,
        /// The override string that failed to parse.
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn coerce(
        target: impl Into<String>,
        kind: &'static str,
        value: &str,
        reason: impl ToString,
    ) -> Self {
        ConfigError::Coerce {
            target: target.into(),
            kind,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
