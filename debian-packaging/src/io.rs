// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! I/O helpers. */

use {
    crate::error::{DebianError, Result},
    std::io::Read,
};

/// Compression format used by Debian primitives.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Compression {
    /// No compression (no extension).
    None,

    /// XZ compression (.xz extension).
    Xz,

    /// Gzip compression (.gz extension).
    Gzip,

    /// Bzip2 compression (.bz2 extension).
    Bzip2,

    /// Zstandard compression (.zst extension).
    Zstd,
}

impl Compression {
    /// Filename extension for files compressed in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Xz => ".xz",
            Self::Gzip => ".gz",
            Self::Bzip2 => ".bz2",
            Self::Zstd => ".zst",
        }
    }

    /// Resolve the compression of a file from the part of its name after a known stem.
    ///
    /// e.g. for `control.tar.xz` with stem `control.tar`, `suffix` is `.xz`.
    pub fn from_extension(suffix: &str) -> Option<Self> {
        [Self::None, Self::Xz, Self::Gzip, Self::Bzip2, Self::Zstd]
            .into_iter()
            .find(|c| c.extension() == suffix)
    }
}

/// Wrap a reader with transparent decompression.
pub fn read_decompressed<'a>(
    stream: impl Read + 'a,
    compression: Compression,
) -> Result<Box<dyn Read + 'a>> {
    Ok(match compression {
        Compression::None => Box::new(stream),
        Compression::Gzip => Box::new(flate2::read::GzDecoder::new(stream)),
        Compression::Xz => Box::new(xz2::read::XzDecoder::new(stream)),
        Compression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(stream)),
        Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(stream)?),
    })
}

/// Wrap a reader for a named member with transparent decompression.
///
/// The compression is derived from what follows `stem` in `name`.
pub fn read_decompressed_member<'a>(
    stream: impl Read + 'a,
    name: &str,
    stem: &str,
) -> Result<Box<dyn Read + 'a>> {
    let suffix = name.strip_prefix(stem).unwrap_or(name);

    let compression = Compression::from_extension(suffix)
        .ok_or_else(|| DebianError::DebUnknownCompression(name.to_string()))?;

    read_decompressed(stream, compression)
}

/// Drain content from a reader to a black hole.
pub fn drain_reader(mut reader: impl Read) -> std::io::Result<u64> {
    std::io::copy(&mut reader, &mut std::io::sink())
}
