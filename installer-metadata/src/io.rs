// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Installer sources and stream adapters. */

use {
    crate::{error::ExtractError, metadata::Sha256Digest},
    sha2::{Digest, Sha256},
    std::{
        fs::File,
        io::{self, Read, Seek, SeekFrom},
        path::{Path, PathBuf},
    },
};

/// Number of bytes inspected to identify a format.
pub const PEEK_SIZE: usize = 262;

/// A rewindable stream over an installer materialized on local storage.
///
/// Extractors that need random access open [InstallerSource::path] themselves.
pub trait InstallerSource: Read + Seek {
    /// Filesystem path of the content backing this source.
    fn path(&self) -> &Path;
}

/// An [InstallerSource] backed by a regular file.
#[derive(Debug)]
pub struct FileSource {
    file: File,
    path: PathBuf,
}

impl FileSource {
    /// Open a file for reading.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;

        Ok(Self { file, path })
    }
}

impl Read for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Seek for FileSource {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.file.seek(pos)
    }
}

impl InstallerSource for FileSource {
    fn path(&self) -> &Path {
        &self.path
    }
}

impl<S: InstallerSource + ?Sized> InstallerSource for &mut S {
    fn path(&self) -> &Path {
        (**self).path()
    }
}

/// Read up to [PEEK_SIZE] leading bytes and rewind.
pub fn peek_prefix(source: &mut (impl Read + Seek + ?Sized)) -> io::Result<Vec<u8>> {
    source.seek(SeekFrom::Start(0))?;

    let mut prefix = Vec::with_capacity(PEEK_SIZE);
    Read::take(&mut *source, PEEK_SIZE as u64).read_to_end(&mut prefix)?;

    source.seek(SeekFrom::Start(0))?;

    Ok(prefix)
}

/// A [Read] adapter that computes a SHA-256 digest of everything read through it.
///
/// Errors from the source reader are remembered so callers can tell them apart
/// from errors raised by consumers parsing the data.
pub struct HashingReader<R> {
    hasher: Sha256,
    source: R,
    bytes_read: u64,
    source_error: Option<io::Error>,
}

impl<R: Read> HashingReader<R> {
    /// Construct a new instance from a source reader.
    pub fn new(source: R) -> Self {
        Self {
            hasher: Sha256::new(),
            source,
            bytes_read: 0,
            source_error: None,
        }
    }

    /// Number of bytes hashed so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// Take the error raised by the source reader, if any.
    pub fn take_source_error(&mut self) -> Option<io::Error> {
        self.source_error.take()
    }

    /// Read and hash all remaining content.
    ///
    /// Returns the number of bytes drained.
    pub fn drain(&mut self) -> io::Result<u64> {
        let drained = io::copy(self, &mut io::sink());

        // Prefer the original error over a copy of it.
        match (drained, self.source_error.take()) {
            (Ok(count), _) => Ok(count),
            (Err(_), Some(source_error)) => Err(source_error),
            (Err(e), None) => Err(e),
        }
    }

    /// Finish the stream.
    ///
    /// Returns the source reader and the digest of all content read.
    pub fn finish(self) -> (R, Sha256Digest) {
        (self.source, Sha256Digest::new(self.hasher.finalize().into()))
    }
}

impl<R: Read> Read for HashingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.source.read(buf) {
            Ok(size) => {
                self.hasher.update(&buf[..size]);
                self.bytes_read += size as u64;

                Ok(size)
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Err(e),
            Err(e) => {
                self.source_error = Some(io::Error::new(e.kind(), e.to_string()));

                Err(e)
            }
        }
    }
}

/// Read a whole file into memory, refusing files larger than `limit` bytes.
pub(crate) fn read_file_bounded(path: &Path, limit: u64) -> crate::error::Result<Vec<u8>> {
    let file = File::open(path)?;

    if file.metadata()?.len() > limit {
        return Err(ExtractError::too_large());
    }

    let mut data = vec![];
    file.take(limit + 1).read_to_end(&mut data)?;

    // The file grew since its size was checked.
    if data.len() as u64 > limit {
        return Err(ExtractError::too_large());
    }

    Ok(data)
}
