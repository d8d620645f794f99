// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Error handling. */

use thiserror::Error;

/// Primary crate error type.
#[derive(Debug, Error)]
pub enum DebianError {
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    #[error("control file line {line}: {reason}")]
    ControlSyntax { line: usize, reason: &'static str },

    #[error("Control file lacks a paragraph")]
    ControlFileNoParagraph,

    #[error("Control file not found")]
    ControlFileNotFound,

    #[error("control file exceeds {0} bytes")]
    ControlFileTooLarge(u64),

    #[error("deb archive does not start with debian-binary; got {0}")]
    DebMissingDebianBinary(String),

    #[error("deb archive has no control.tar member")]
    DebMissingControlTar,

    #[error("unrecognized compression on control.tar: {0}")]
    DebUnknownCompression(String),
}

/// Result wrapper for this crate.
pub type Result<T> = std::result::Result<T, DebianError>;
