//! What a remote write does when the destination already exists.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TransferError;

/// Existence policy for remote writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileExistsMode {
    /// Overwrite the destination.
    #[default]
    Replace,
    /// Append to the destination.
    Append,
    /// Refuse with `TransferError::DestinationExists`; nothing is written.
    Fail,
    /// Skip silently; nothing is written and the send succeeds.
    Ignore,
}

impl FileExistsMode {
    /// Whether the destination must be probed before writing.
    pub fn checks_existence(&self) -> bool {
        matches!(self, FileExistsMode::Fail | FileExistsMode::Ignore)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileExistsMode::Replace => "REPLACE",
            FileExistsMode::Append => "APPEND",
            FileExistsMode::Fail => "FAIL",
            FileExistsMode::Ignore => "IGNORE",
        }
    }
}

impl fmt::Display for FileExistsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileExistsMode {
    type Err = TransferError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "REPLACE" => Ok(FileExistsMode::Replace),
            "APPEND" => Ok(FileExistsMode::Append),
            "FAIL" => Ok(FileExistsMode::Fail),
            "IGNORE" => Ok(FileExistsMode::Ignore),
            other => Err(TransferError::InvalidConfig(format!(
                "unknown file exists mode '{other}' (expected REPLACE, APPEND, FAIL or IGNORE)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("append".parse::<FileExistsMode>().unwrap(), FileExistsMode::Append);
        assert_eq!(" Ignore ".parse::<FileExistsMode>().unwrap(), FileExistsMode::Ignore);
        assert!("overwrite".parse::<FileExistsMode>().is_err());
    }

    #[test]
    fn test_serde_uses_upper_case_names() {
        let json = serde_json::to_string(&FileExistsMode::Fail).unwrap();
        assert_eq!(json, "\"FAIL\"");
        let mode: FileExistsMode = serde_json::from_str("\"REPLACE\"").unwrap();
        assert_eq!(mode, FileExistsMode::Replace);
    }

    #[test]
    fn test_only_fail_and_ignore_probe() {
        assert!(FileExistsMode::Fail.checks_existence());
        assert!(FileExistsMode::Ignore.checks_existence());
        assert!(!FileExistsMode::Replace.checks_existence());
        assert!(!FileExistsMode::Append.checks_existence());
    }
}
