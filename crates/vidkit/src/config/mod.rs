//! Runtime options and their file-backed form
//!
//! Runtime options reach the core as string-keyed [`Hints`]. A [`VideoConfig`]
//! is the typed, file-backed form of the same options and converts into hints.

pub mod hints;
pub mod video;

pub use hints::Hints;
pub use video::VideoConfig;
pub use serde::{Serialize, Deserialize};

use std::path::Path;

/// Serde-backed configuration stored as TOML or RON
///
/// The format follows the file extension.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Read and parse a configuration file
    fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(ConfigError::Io)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            Some("ron") => ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string())),
            _ => Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        }
    }

    /// Serialize into a configuration file
    fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let contents = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?,
            Some("ron") => ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?,
            _ => return Err(ConfigError::UnsupportedFormat(path.display().to_string())),
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Failure to load, save or validate a configuration
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// The file could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file contents are not valid for the format
    #[error("Parse error: {0}")]
    Parse(String),

    /// The value could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// The extension is neither `.toml` nor `.ron`
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// A value failed validation
    #[error("Invalid value for '{key}': {value}")]
    InvalidValue {
        /// Option name
        key: String,
        /// Offending value
        value: String,
    },
}
