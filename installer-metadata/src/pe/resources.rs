// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PE resource directory traversal.
//!
//! Resources form a three level tree of type, name and language directories
//! whose leaves describe data by relative virtual address.

use {
    super::{PeError, PeResult},
    scroll::{Pread, SizeWith},
};

/// Resource type of version information.
pub const RT_VERSION: u32 = 16;

/// Set on entry offsets referring to a subdirectory and on entry names that are strings.
const HIGH_BIT: u32 = 0x8000_0000;

#[derive(Clone, Copy, Debug, Pread, SizeWith)]
struct ResourceDirectoryTable {
    characteristics: u32,
    time_date_stamp: u32,
    major_version: u16,
    minor_version: u16,
    number_of_name_entries: u16,
    number_of_id_entries: u16,
}

#[derive(Clone, Copy, Debug, Pread, SizeWith)]
struct ResourceDirectoryEntry {
    name: u32,
    offset: u32,
}

impl ResourceDirectoryEntry {
    fn id(&self) -> Option<u32> {
        if self.name & HIGH_BIT == 0 {
            Some(self.name)
        } else {
            None
        }
    }

    fn subdirectory(&self) -> Option<usize> {
        if self.offset & HIGH_BIT != 0 {
            Some((self.offset & !HIGH_BIT) as usize)
        } else {
            None
        }
    }
}

#[derive(Clone, Copy, Debug, Pread, SizeWith)]
struct ResourceDataEntry {
    data_rva: u32,
    size: u32,
    codepage: u32,
    reserved: u32,
}

/// The raw content of a PE resource section.
pub struct ResourceSection<'a> {
    data: &'a [u8],
    virtual_address: u32,
    root: usize,
}

impl<'a> ResourceSection<'a> {
    /// Construct an instance from section data.
    ///
    /// `root` is the offset of the root directory within the section.
    pub fn new(data: &'a [u8], virtual_address: u32, root: usize) -> Self {
        Self {
            data,
            virtual_address,
            root,
        }
    }

    fn directory(&self, offset: usize) -> PeResult<Vec<ResourceDirectoryEntry>> {
        let offset = self.root + offset;
        let table = self
            .data
            .pread_with::<ResourceDirectoryTable>(offset, scroll::LE)?;

        let count = table.number_of_name_entries as usize + table.number_of_id_entries as usize;

        (0..count)
            .map(|i| {
                self.data
                    .pread_with::<ResourceDirectoryEntry>(offset + 16 + i * 8, scroll::LE)
                    .map_err(PeError::from)
            })
            .collect()
    }

    fn first_subdirectory(&self, offset: usize, level: &str) -> PeResult<Option<usize>> {
        match self.directory(offset)?.first() {
            Some(entry) => entry.subdirectory().map(Some).ok_or_else(|| {
                PeError::ResourceTree(format!("{} entry is not a directory", level))
            }),
            None => Ok(None),
        }
    }

    /// Resolve the data of the first resource of a type.
    pub fn find_first(&self, resource_type: u32) -> PeResult<Option<&'a [u8]>> {
        let names = match self
            .directory(0)?
            .into_iter()
            .find(|entry| entry.id() == Some(resource_type))
        {
            Some(entry) => entry.subdirectory().ok_or_else(|| {
                PeError::ResourceTree("type entry is not a directory".to_string())
            })?,
            None => return Ok(None),
        };

        let languages = match self.first_subdirectory(names, "name")? {
            Some(offset) => offset,
            None => return Ok(None),
        };

        let leaf = match self.directory(languages)?.first() {
            Some(entry) if entry.subdirectory().is_none() => entry.offset as usize,
            Some(_) => {
                return Err(PeError::ResourceTree(
                    "language entry is a directory".to_string(),
                ))
            }
            None => return Ok(None),
        };

        let entry = self
            .data
            .pread_with::<ResourceDataEntry>(self.root + leaf, scroll::LE)?;

        let start = entry
            .data_rva
            .checked_sub(self.virtual_address)
            .ok_or_else(|| {
                PeError::ResourceTree(format!("data RVA {:#x} precedes section", entry.data_rva))
            })? as usize;

        self.data
            .get(start..start + entry.size as usize)
            .map(Some)
            .ok_or_else(|| {
                PeError::ResourceTree(format!(
                    "data at RVA {:#x} extends past section",
                    entry.data_rva
                ))
            })
    }
}
