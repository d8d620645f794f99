// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Streaming reading of .deb files. */

use {
    crate::{
        control::ControlParagraph,
        error::{DebianError, Result},
        io::{drain_reader, read_decompressed_member},
    },
    log::debug,
    std::{io::Read, path::Path},
};

/// Name of the ar member holding the archive format version.
const DEBIAN_BINARY: &str = "debian-binary";

/// Name stem of the ar member holding package metadata.
const CONTROL_TAR: &str = "control.tar";

/// A forward-only reader of binary package `.deb` files.
///
/// Only the control metadata is decoded. Other members are skipped.
pub struct BinaryPackageReader<R: Read> {
    archive: ar::Archive<R>,
    entries_read: usize,
}

impl<R: Read> BinaryPackageReader<R> {
    /// Construct a new instance from a reader of `.deb` content.
    pub fn new(reader: R) -> Self {
        Self {
            archive: ar::Archive::new(reader),
            entries_read: 0,
        }
    }

    /// Read the first paragraph of the `control` file in `control.tar`.
    ///
    /// Members preceding `control.tar` are skipped. The decompressed `control`
    /// file may not exceed `limit` bytes.
    pub fn read_control(&mut self, limit: u64) -> Result<ControlParagraph> {
        loop {
            let mut entry = match self.archive.next_entry() {
                Some(entry) => entry?,
                None => return Err(DebianError::DebMissingControlTar),
            };

            // GNU ar terminates member names with a slash.
            let name = String::from_utf8_lossy(entry.header().identifier())
                .trim_end_matches('/')
                .to_string();

            self.entries_read += 1;
            if self.entries_read == 1 && name != DEBIAN_BINARY {
                return Err(DebianError::DebMissingDebianBinary(name));
            }

            if !name.starts_with(CONTROL_TAR) {
                debug!("skipping deb member {}", name);
                continue;
            }

            let reader = read_decompressed_member(&mut entry, &name, CONTROL_TAR)?;
            let data = read_control_file(reader, limit)?;

            return parse_control_paragraph(&data);
        }
    }

    /// Read all remaining archive members.
    pub fn drain(&mut self) -> Result<()> {
        while let Some(entry) = self.archive.next_entry() {
            drain_reader(entry?)?;
        }

        Ok(())
    }
}

/// Extract the `control` file from a `control.tar` stream.
fn read_control_file(reader: impl Read, limit: u64) -> Result<Vec<u8>> {
    let mut archive = tar::Archive::new(reader);

    for entry in archive.entries()? {
        let mut entry = entry?;

        let is_control = {
            let path = entry.path()?;
            path == Path::new("control") || path == Path::new("./control")
        };
        if !is_control {
            continue;
        }

        if entry.header().size()? > limit {
            return Err(DebianError::ControlFileTooLarge(limit));
        }

        let mut data = vec![];
        entry.by_ref().take(limit + 1).read_to_end(&mut data)?;
        if data.len() as u64 > limit {
            return Err(DebianError::ControlFileTooLarge(limit));
        }

        return Ok(data);
    }

    Err(DebianError::ControlFileNotFound)
}

fn parse_control_paragraph(data: &[u8]) -> Result<ControlParagraph> {
    let text = String::from_utf8_lossy(data);

    ControlParagraph::parse_first(&text)?.ok_or(DebianError::ControlFileNoParagraph)
}
