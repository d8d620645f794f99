// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::metadata::{Extension, Sha256Digest},
    thiserror::Error,
};

/// The category of an [ExtractError].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    UnsupportedFormat,
    MalformedInput,
    Io,
    Internal,
}

/// Error type for installer metadata extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The input is not a recognized installer.
    ///
    /// The digest of the full input is still reported.
    #[error("unsupported installer format (sha256 {sha256})")]
    UnsupportedFormat { sha256: Sha256Digest },

    /// The format was identified but its content is invalid.
    #[error("malformed {format} installer: {message}")]
    MalformedInput { format: Extension, message: String },

    /// Reading the source failed or a size cap was exceeded.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ExtractError {
    /// Construct a [ExtractError::MalformedInput].
    pub fn malformed(format: Extension, message: impl ToString) -> Self {
        Self::MalformedInput {
            format,
            message: message.to_string(),
        }
    }

    /// Construct the error reported when an input exceeds a size cap.
    pub fn too_large() -> Self {
        Self::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "input too large",
        ))
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            Self::MalformedInput { .. } => ErrorKind::MalformedInput,
            Self::Io(_) => ErrorKind::Io,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The digest of the input, if this error carries one.
    pub fn sha256(&self) -> Option<&Sha256Digest> {
        match self {
            Self::UnsupportedFormat { sha256 } => Some(sha256),
            _ => None,
        }
    }
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, ExtractError>;
