// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Compound File Binary reading.

A compound file is a small FAT filesystem. A 512 byte header locates the
sectors holding the file allocation table (FAT), a directory of named
entries, and a *mini stream* holding streams smaller than a cutoff in 64
byte mini sectors tracked by a separate mini FAT.

See [MS-CFB] at <https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-cfb/>.
*/

use {
    super::{stream_name::decode_stream_name, MsiError, MsiResult},
    scroll::{Pread, SizeWith},
};

/// `D0 CF 11 E0 A1 B1 1A E1` read as a little endian integer.
pub const CFB_SIGNATURE: u64 = 0xe11a_b1a1_e011_cfd0;

pub const BYTE_ORDER_MARK: u16 = 0xfffe;

pub const MAX_REGULAR_SECTOR: u32 = 0xffff_fffa;
pub const FAT_SECTOR: u32 = 0xffff_fffd;
pub const END_OF_CHAIN: u32 = 0xffff_fffe;
pub const FREE_SECTOR: u32 = 0xffff_ffff;
pub const NO_STREAM: u32 = 0xffff_ffff;

/// Size of [CfbHeader] on disk.
const HEADER_FIELDS_SIZE: usize = 76;

/// Number of FAT sector locations stored in the header.
const HEADER_DIFAT_ENTRIES: usize = 109;

const DIRECTORY_ENTRY_SIZE: usize = 128;
const DIRECTORY_NAME_SIZE: usize = 64;

/// Fixed fields of the compound file header.
///
/// The header DIFAT array follows these fields.
#[derive(Clone, Copy, Debug, Pread, SizeWith)]
pub struct CfbHeader {
    pub signature: u64,
    pub clsid_low: u64,
    pub clsid_high: u64,
    pub minor_version: u16,
    pub major_version: u16,
    pub byte_order: u16,
    pub sector_shift: u16,
    pub mini_sector_shift: u16,
    pub reserved1: u16,
    pub reserved2: u32,
    pub num_directory_sectors: u32,
    pub num_fat_sectors: u32,
    pub first_directory_sector: u32,
    pub transaction_signature: u32,
    pub mini_stream_cutoff: u32,
    pub first_mini_fat_sector: u32,
    pub num_mini_fat_sectors: u32,
    pub first_difat_sector: u32,
    pub num_difat_sectors: u32,
}

impl CfbHeader {
    fn validate(&self) -> MsiResult<()> {
        if self.signature != CFB_SIGNATURE {
            return Err(MsiError::BadSignature);
        }
        if self.byte_order != BYTE_ORDER_MARK {
            return Err(MsiError::BadByteOrder(self.byte_order));
        }

        match (self.major_version, self.sector_shift) {
            (3, 9) | (4, 12) => {}
            _ => return Err(MsiError::UnsupportedVersion(self.major_version)),
        }

        if self.mini_sector_shift != 6 {
            return Err(MsiError::UnsupportedVersion(self.major_version));
        }

        Ok(())
    }
}

/// Trailing fields of a directory entry, after the 64 byte name.
#[derive(Clone, Copy, Debug, Pread, SizeWith)]
struct DirectoryEntryFields {
    name_length: u16,
    object_type: u8,
    color: u8,
    left_sibling: u32,
    right_sibling: u32,
    child: u32,
    clsid_low: u64,
    clsid_high: u64,
    state_bits: u32,
    creation_time: u64,
    modified_time: u64,
    start_sector: u32,
    size: u64,
}

/// The type of object a directory entry describes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ObjectType {
    Unallocated,
    Storage,
    Stream,
    Root,
}

impl TryFrom<u8> for ObjectType {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::Unallocated),
            1 => Ok(Self::Storage),
            2 => Ok(Self::Stream),
            5 => Ok(Self::Root),
            _ => Err(v),
        }
    }
}

/// A parsed directory entry.
#[derive(Clone, Debug)]
pub struct DirectoryEntry {
    /// Decoded name of the entry.
    pub name: String,
    pub object_type: ObjectType,
    pub left_sibling: u32,
    pub right_sibling: u32,
    pub child: u32,
    pub start_sector: u32,
    pub size: u64,
}

impl DirectoryEntry {
    fn parse(index: usize, data: &[u8], major_version: u16) -> MsiResult<Self> {
        let fields = data.pread_with::<DirectoryEntryFields>(DIRECTORY_NAME_SIZE, scroll::LE)?;

        let object_type = ObjectType::try_from(fields.object_type)
            .map_err(|_| MsiError::BadDirectoryEntry(index as u32))?;

        // The length counts bytes including the terminating NUL.
        let units = (fields.name_length as usize / 2)
            .saturating_sub(1)
            .min(DIRECTORY_NAME_SIZE / 2 - 1);
        let name = data[..units * 2]
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect::<Vec<_>>();

        // Version 3 files may carry garbage in the high bits.
        let size = if major_version == 3 {
            fields.size & 0xffff_ffff
        } else {
            fields.size
        };

        Ok(Self {
            name: decode_stream_name(&name),
            object_type,
            left_sibling: fields.left_sibling,
            right_sibling: fields.right_sibling,
            child: fields.child,
            start_sector: fields.start_sector,
            size,
        })
    }
}

fn le_u32s(data: &[u8]) -> impl Iterator<Item = u32> + '_ {
    data.chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
}

/// A compound file held in memory.
pub struct CompoundFile<'a> {
    data: &'a [u8],
    sector_size: usize,
    mini_stream_cutoff: u64,
    fat: Vec<u32>,
    mini_fat: Vec<u32>,
    mini_stream: Vec<u8>,
    entries: Vec<DirectoryEntry>,
}

impl<'a> CompoundFile<'a> {
    /// Parse the allocation tables and directory of a compound file.
    pub fn parse(data: &'a [u8]) -> MsiResult<Self> {
        let header = data.pread_with::<CfbHeader>(0, scroll::LE)?;
        header.validate()?;

        let mut cfb = Self {
            data,
            sector_size: 1 << header.sector_shift,
            mini_stream_cutoff: header.mini_stream_cutoff as u64,
            fat: vec![],
            mini_fat: vec![],
            mini_stream: vec![],
            entries: vec![],
        };

        cfb.fat = cfb.read_fat(&header)?;

        let directory = cfb.read_chain_data(header.first_directory_sector, &cfb.fat)?;
        cfb.entries = directory
            .chunks_exact(DIRECTORY_ENTRY_SIZE)
            .enumerate()
            .map(|(i, entry)| DirectoryEntry::parse(i, entry, header.major_version))
            .collect::<MsiResult<Vec<_>>>()?;

        let root = cfb.entries.first().ok_or(MsiError::NoRootEntry)?;
        if root.object_type != ObjectType::Root {
            return Err(MsiError::NoRootEntry);
        }
        let (root_start, root_size) = (root.start_sector, root.size);

        if header.num_mini_fat_sectors > 0 {
            let mini_fat = cfb.read_chain_data(header.first_mini_fat_sector, &cfb.fat)?;
            cfb.mini_fat = le_u32s(&mini_fat).collect();
        }

        if root_size > 0 {
            cfb.mini_stream = cfb.read_regular(root_start, root_size, "Root Entry")?;
        }

        Ok(cfb)
    }

    fn sector(&self, id: u32) -> MsiResult<&'a [u8]> {
        // The header occupies the first sector slot.
        let start = (id as usize + 1)
            .checked_mul(self.sector_size)
            .ok_or(MsiError::BadSector(id))?;

        if id > MAX_REGULAR_SECTOR || start >= self.data.len() {
            return Err(MsiError::BadSector(id));
        }

        let end = std::cmp::min(start + self.sector_size, self.data.len());

        Ok(&self.data[start..end])
    }

    /// Number of sectors present in the file.
    fn sector_count(&self) -> usize {
        (self.data.len().saturating_sub(1)) / self.sector_size
    }

    fn read_fat(&self, header: &CfbHeader) -> MsiResult<Vec<u32>> {
        let mut fat_sectors = self
            .data
            .get(HEADER_FIELDS_SIZE..HEADER_FIELDS_SIZE + HEADER_DIFAT_ENTRIES * 4)
            .map(|difat| le_u32s(difat).collect::<Vec<_>>())
            .ok_or(MsiError::BadSignature)?;

        let mut next = header.first_difat_sector;
        let mut remaining = header.num_difat_sectors;
        let per_sector = self.sector_size / 4 - 1;

        while remaining > 0 && next <= MAX_REGULAR_SECTOR {
            if fat_sectors.len() > self.sector_count() + HEADER_DIFAT_ENTRIES {
                return Err(MsiError::ChainCycle(header.first_difat_sector));
            }

            let sector = le_u32s(self.sector(next)?).collect::<Vec<_>>();
            fat_sectors.extend(sector.iter().take(per_sector));
            next = *sector.get(per_sector).ok_or(MsiError::BadSector(next))?;
            remaining -= 1;
        }

        if header.num_fat_sectors as usize > self.sector_count() {
            return Err(MsiError::BadSector(header.num_fat_sectors));
        }

        let mut fat = Vec::with_capacity(header.num_fat_sectors as usize * self.sector_size / 4);
        for id in fat_sectors
            .into_iter()
            .filter(|id| *id <= MAX_REGULAR_SECTOR)
            .take(header.num_fat_sectors as usize)
        {
            fat.extend(le_u32s(self.sector(id)?));
        }

        Ok(fat)
    }

    /// Resolve the sectors of a chain.
    fn chain(start: u32, table: &[u32]) -> MsiResult<Vec<u32>> {
        let mut chain = vec![];
        let mut current = start;

        while current != END_OF_CHAIN {
            if chain.len() >= table.len() {
                return Err(MsiError::ChainCycle(start));
            }

            let next = *table
                .get(current as usize)
                .ok_or(MsiError::BadSector(current))?;
            chain.push(current);
            current = next;
        }

        Ok(chain)
    }

    fn read_chain_data(&self, start: u32, table: &[u32]) -> MsiResult<Vec<u8>> {
        let mut data = vec![];
        for id in Self::chain(start, table)? {
            data.extend_from_slice(self.sector(id)?);
        }

        Ok(data)
    }

    fn read_regular(&self, start: u32, size: u64, name: &str) -> MsiResult<Vec<u8>> {
        let mut data = self.read_chain_data(start, &self.fat)?;

        if (data.len() as u64) < size {
            return Err(MsiError::TruncatedStream(name.to_string()));
        }
        data.truncate(size as usize);

        Ok(data)
    }

    fn read_mini(&self, start: u32, size: u64, name: &str) -> MsiResult<Vec<u8>> {
        const MINI_SECTOR_SIZE: usize = 64;

        let mut data = vec![];
        for id in Self::chain(start, &self.mini_fat)? {
            let offset = id as usize * MINI_SECTOR_SIZE;
            let sector = self
                .mini_stream
                .get(offset..offset + MINI_SECTOR_SIZE)
                .ok_or_else(|| MsiError::TruncatedStream(name.to_string()))?;
            data.extend_from_slice(sector);
        }

        if (data.len() as u64) < size {
            return Err(MsiError::TruncatedStream(name.to_string()));
        }
        data.truncate(size as usize);

        Ok(data)
    }

    /// All directory entries.
    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    /// Entries directly below the root storage.
    pub fn root_children(&self) -> MsiResult<Vec<&DirectoryEntry>> {
        let mut visited = vec![false; self.entries.len()];
        let mut children = vec![];
        let mut pending = vec![self.entries[0].child];

        while let Some(id) = pending.pop() {
            if id == NO_STREAM {
                continue;
            }

            let index = id as usize;
            let entry = self
                .entries
                .get(index)
                .ok_or(MsiError::BadDirectoryEntry(id))?;
            if visited[index] {
                return Err(MsiError::DirectoryCycle);
            }
            visited[index] = true;

            children.push(entry);
            pending.push(entry.left_sibling);
            pending.push(entry.right_sibling);
        }

        Ok(children)
    }

    /// Find a stream directly below the root storage by decoded name.
    pub fn find_stream(&self, name: &str) -> MsiResult<Option<&DirectoryEntry>> {
        Ok(self
            .root_children()?
            .into_iter()
            .find(|e| e.object_type == ObjectType::Stream && e.name == name))
    }

    /// Read the content of a stream.
    pub fn read_stream(&self, entry: &DirectoryEntry) -> MsiResult<Vec<u8>> {
        if entry.size == 0 {
            Ok(vec![])
        } else if entry.size < self.mini_stream_cutoff {
            self.read_mini(entry.start_sector, entry.size, &entry.name)
        } else {
            self.read_regular(entry.start_sector, entry.size, &entry.name)
        }
    }
}
