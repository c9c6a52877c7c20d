//! Transfer configuration.
//!
//! # Example
//!
//! ```ignore
//! use sy_04_remote_transfer::{FileExistsMode, RemoteDirectory, TransferConfigBuilder};
//!
//! let config = TransferConfigBuilder::new()
//!     .exists_mode(FileExistsMode::Fail)
//!     .remote_directory(RemoteDirectory::header("target-dir", Some("/inbox")))
//!     .auto_create_directory(true)
//!     .build()?;
//! ```

use serde::{Deserialize, Serialize};
use sy_types::MessageHeaders;

use crate::domain::mode::FileExistsMode;
use crate::error::TransferError;

/// Default suffix for in-flight uploads.
pub const DEFAULT_TEMPORARY_SUFFIX: &str = ".writing";

/// Default remote path separator.
pub const DEFAULT_SEPARATOR: &str = "/";

/// Where on the remote side files are written, evaluated per message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteDirectory {
    /// The same directory for every message.
    Fixed(String),
    /// Read from a text header, with an optional fallback.
    Header {
        name: String,
        fallback: Option<String>,
    },
}

impl RemoteDirectory {
    pub fn fixed(path: impl Into<String>) -> Self {
        RemoteDirectory::Fixed(path.into())
    }

    pub fn header(name: impl Into<String>, fallback: Option<&str>) -> Self {
        RemoteDirectory::Header {
            name: name.into(),
            fallback: fallback.map(str::to_string),
        }
    }

    /// Evaluate against a message's headers.
    pub fn resolve(&self, headers: &MessageHeaders) -> Result<String, TransferError> {
        match self {
            RemoteDirectory::Fixed(path) => Ok(path.clone()),
            RemoteDirectory::Header { name, fallback } => {
                match (headers.get_as::<String>(name)?, fallback) {
                    (Some(dir), _) => Ok(dir),
                    (None, Some(fallback)) => Ok(fallback.clone()),
                    (None, None) => Err(TransferError::MissingRemoteDirectory {
                        header: name.clone(),
                    }),
                }
            }
        }
    }
}

impl Default for RemoteDirectory {
    fn default() -> Self {
        RemoteDirectory::Fixed(String::new())
    }
}

/// Remote transfer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub exists_mode: FileExistsMode,
    /// Upload under `<name><suffix>` and rename on success (never for APPEND).
    pub use_temporary_file_name: bool,
    pub temporary_file_suffix: String,
    pub remote_directory: RemoteDirectory,
    /// Create the remote directory (and parents) before writing.
    pub auto_create_directory: bool,
    pub remote_path_separator: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            exists_mode: FileExistsMode::default(),
            use_temporary_file_name: true,
            temporary_file_suffix: DEFAULT_TEMPORARY_SUFFIX.to_string(),
            remote_directory: RemoteDirectory::default(),
            auto_create_directory: false,
            remote_path_separator: DEFAULT_SEPARATOR.to_string(),
        }
    }
}

impl TransferConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), TransferError> {
        if self.remote_path_separator.is_empty() {
            return Err(TransferError::InvalidConfig(
                "remote_path_separator must not be empty".to_string(),
            ));
        }
        if self.use_temporary_file_name && self.temporary_file_suffix.is_empty() {
            return Err(TransferError::InvalidConfig(
                "temporary_file_suffix must not be empty when temporary names are used"
                    .to_string(),
            ));
        }
        if let RemoteDirectory::Header { name, .. } = &self.remote_directory {
            if name.trim().is_empty() {
                return Err(TransferError::InvalidConfig(
                    "remote directory header name must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Fluent builder for `TransferConfig`.
#[derive(Debug, Default)]
pub struct TransferConfigBuilder {
    config: TransferConfig,
}

impl TransferConfigBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists_mode(mut self, mode: FileExistsMode) -> Self {
        self.config.exists_mode = mode;
        self
    }

    pub fn use_temporary_file_name(mut self, enabled: bool) -> Self {
        self.config.use_temporary_file_name = enabled;
        self
    }

    pub fn temporary_file_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.config.temporary_file_suffix = suffix.into();
        self
    }

    pub fn remote_directory(mut self, directory: RemoteDirectory) -> Self {
        self.config.remote_directory = directory;
        self
    }

    pub fn auto_create_directory(mut self, enabled: bool) -> Self {
        self.config.auto_create_directory = enabled;
        self
    }

    pub fn remote_path_separator(mut self, separator: impl Into<String>) -> Self {
        self.config.remote_path_separator = separator.into();
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<TransferConfig, TransferError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
