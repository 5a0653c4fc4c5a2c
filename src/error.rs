//! Error types and result definitions for configuration operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors produced while loading, merging or saving configuration.
///
/// Callers can always tell "value absent" apart from "source broken":
/// tree lookups return `Option`/no-ops and never surface here, while
/// every source-level problem maps onto one of these variants.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The top-level input is neither a readable path, a mapping, nor a tree.
    #[error("invalid configuration source: {0}")]
    InvalidSource(String),

    /// The path is missing, unreadable, or a directory where a file was expected.
    #[error("the file {} is not readable", path.display())]
    FileNotReadable {
        path: PathBuf,
        #[source]
        source: Option<io::Error>,
    },

    /// The file exists but its contents do not parse as the claimed format.
    #[error("the {format} file {} is not valid: {reason}", path.display())]
    Malformed {
        path: PathBuf,
        format: &'static str,
        reason: String,
    },

    /// No driver is registered for the given extension.
    #[error("no driver registered for the extension {0:?}")]
    UnsupportedFormat(String),

    /// The save path's extension does not match the driver being used.
    #[error("the provided path {} must end in one of {expected:?}", path.display())]
    UnsupportedExtension {
        path: PathBuf,
        expected: &'static [&'static str],
    },

    /// The save path's parent directory does not exist and cannot be created.
    #[error("unable to create the target directory {}", path.display())]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The save path cannot be written to.
    #[error("unable to write to {}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Any other I/O failure while writing a file.
    #[error("I/O error on {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Snapshot bytes could not be encoded.
    #[error("snapshot encoding failed")]
    SnapshotEncode(#[from] rmp_serde::encode::Error),

    /// Snapshot bytes could not be decoded.
    #[error("snapshot decoding failed")]
    SnapshotDecode(#[from] rmp_serde::decode::Error),
}
