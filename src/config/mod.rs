pub mod content;
pub mod game;

use std::path::{Path, PathBuf};

/// Problems loading configuration or content. All of them are fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{}: required setting `{field}` is missing", .path.display())]
    Missing { path: PathBuf, field: String },
    #[error("{}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    #[error("{0}")]
    Invalid(String),
}

impl ConfigError {
    /// Classify a deserializer message, pulling out the field name of a
    /// "missing field `x`" report.
    pub(crate) fn from_toml(path: &Path, message: &str) -> Self {
        let missing = message
            .strip_prefix("missing field `")
            .and_then(|rest| rest.split_once('`'))
            .map(|(field, _)| field.to_string());
        match missing {
            Some(field) => ConfigError::Missing {
                path: path.to_path_buf(),
                field,
            },
            None => ConfigError::Parse {
                path: path.to_path_buf(),
                message: message.trim().to_string(),
            },
        }
    }
}
