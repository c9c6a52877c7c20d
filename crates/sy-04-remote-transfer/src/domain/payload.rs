//! Transfer payloads.

use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

/// Content to be written to a remote file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferPayload {
    Bytes(Vec<u8>),
    Text(String),
    /// A local file, streamed when sent.
    File(PathBuf),
}

impl TransferPayload {
    /// Open the content for reading.
    pub fn open(&self) -> io::Result<Box<dyn Read + Send + '_>> {
        match self {
            TransferPayload::Bytes(bytes) => Ok(Box::new(Cursor::new(bytes.as_slice()))),
            TransferPayload::Text(text) => Ok(Box::new(Cursor::new(text.as_bytes()))),
            TransferPayload::File(path) => Ok(Box::new(File::open(path)?)),
        }
    }

    /// Default remote name: the local file name for file payloads.
    pub fn file_name(&self) -> Option<&str> {
        match self {
            TransferPayload::File(path) => path.file_name().and_then(|name| name.to_str()),
            _ => None,
        }
    }

    pub fn local_path(&self) -> Option<&Path> {
        match self {
            TransferPayload::File(path) => Some(path),
            _ => None,
        }
    }
}

impl From<Vec<u8>> for TransferPayload {
    fn from(bytes: Vec<u8>) -> Self {
        TransferPayload::Bytes(bytes)
    }
}

impl From<String> for TransferPayload {
    fn from(text: String) -> Self {
        TransferPayload::Text(text)
    }
}

impl From<&str> for TransferPayload {
    fn from(text: &str) -> Self {
        TransferPayload::Text(text.to_string())
    }
}

impl From<PathBuf> for TransferPayload {
    fn from(path: PathBuf) -> Self {
        TransferPayload::File(path)
    }
}
