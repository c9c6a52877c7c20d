//! Remote path construction.

use sy_types::{keys, HeaderError, Message};

use crate::domain::payload::TransferPayload;

/// Join a directory and a file name with `separator`.
pub fn join(directory: &str, file_name: &str, separator: &str) -> String {
    if directory.is_empty() {
        file_name.to_string()
    } else if directory.ends_with(separator) {
        format!("{directory}{file_name}")
    } else {
        format!("{directory}{separator}{file_name}")
    }
}

/// In-flight name for an upload to `path`.
pub fn temporary(path: &str, suffix: &str) -> String {
    format!("{path}{suffix}")
}

/// Remote file name: the `file-name` header, else the payload's local file
/// name, else `<message id>.msg`.
pub fn file_name(message: &Message<TransferPayload>) -> Result<String, HeaderError> {
    if let Some(name) = message.headers().get_as::<String>(keys::FILE_NAME)? {
        return Ok(name);
    }
    if let Some(name) = message.payload().file_name() {
        return Ok(name.to_string());
    }
    Ok(format!("{}.msg", message.id()))
}
