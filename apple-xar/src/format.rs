// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::{Error, XarResult},
    scroll::{IOread, Pread, SizeWith},
};

/// `xar!` as a big endian integer.
pub const XAR_MAGIC: u32 = 0x7861_7221;

/// Size of the fixed portion of [XarHeader].
pub const XAR_HEADER_SIZE: u16 = 28;

/// A XAR archive header.
///
/// The header effectively defines a table of contents, which
/// holds information about the content of the archive.
#[derive(Clone, Copy, Debug, IOread, Pread, SizeWith)]
pub struct XarHeader {
    /// File magic. `xar!`.
    pub magic: u32,

    /// Size of this header + magic.
    pub size: u16,

    /// Format version number.
    pub version: u16,

    /// Size in bytes of zlib compressed table of contents.
    pub toc_length_compressed: i64,

    /// Size in bytes of uncompressed table of contents.
    pub toc_length_uncompressed: i64,

    /// Checksum algorithm used.
    pub checksum_algorithm_id: u32,
}

impl XarHeader {
    /// Verify the header describes an archive we can read.
    pub fn validate(&self) -> XarResult<()> {
        if self.magic != XAR_MAGIC {
            return Err(Error::BadMagic(self.magic));
        }
        if self.size < XAR_HEADER_SIZE {
            return Err(Error::BadHeaderSize(self.size));
        }
        if self.toc_length_compressed <= 0 {
            return Err(Error::BadTocLength(self.toc_length_compressed));
        }
        if self.toc_length_uncompressed < 0 {
            return Err(Error::BadTocLength(self.toc_length_uncompressed));
        }

        XarChecksum::try_from(self.checksum_algorithm_id)?;

        Ok(())
    }

    /// The checksum algorithm protecting the table of contents.
    pub fn checksum(&self) -> XarResult<XarChecksum> {
        XarChecksum::try_from(self.checksum_algorithm_id)
    }

    /// Number of header bytes following the fixed fields.
    pub fn extra_size(&self) -> u64 {
        self.size.saturating_sub(XAR_HEADER_SIZE) as u64
    }
}

/// Checksum format used in file.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum XarChecksum {
    None,
    Sha1,
    Md5,
    Sha256,
    Sha512,
}

impl TryFrom<u32> for XarChecksum {
    type Error = Error;

    fn try_from(i: u32) -> Result<Self, Self::Error> {
        match i {
            0 => Ok(Self::None),
            1 => Ok(Self::Sha1),
            2 => Ok(Self::Md5),
            3 => Ok(Self::Sha256),
            4 => Ok(Self::Sha512),
            _ => Err(Error::UnknownChecksumAlgorithm(i)),
        }
    }
}
