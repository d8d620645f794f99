// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! RPM package extraction.

An RPM file is a 96 byte *lead*, a *signature* header, the main header and
a compressed cpio payload. Both headers share a layout: a 16 byte intro,
an index of 16 byte entries and a data store the entries point into. The
signature header is padded to a multiple of 8 bytes.

See <https://rpm-software-management.github.io/rpm/manual/format.html>.
*/

use {
    crate::{
        error::{ExtractError, Result},
        metadata::{ExtractedMetadata, Extension},
        options::ExtractOptions,
    },
    log::debug,
    scroll::{IOread, SizeWith},
    std::io::{self, BufRead, BufReader, Read},
};

pub const RPM_LEAD_MAGIC: [u8; 4] = [0xed, 0xab, 0xee, 0xdb];
pub const RPM_LEAD_SIZE: usize = 96;

/// Magic and version of header structures.
pub const HEADER_MAGIC: u32 = 0x8ead_e801;

/// Upper bound on header index entries.
const MAX_INDEX_ENTRIES: u32 = 0x10000;

/// Upper bound on a header's data store.
const MAX_DATA_STORE_SIZE: u32 = 256 * 1024 * 1024;

pub const RPMTAG_NAME: u32 = 1000;
pub const RPMTAG_VERSION: u32 = 1001;
pub const RPM_STRING_TYPE: u32 = 6;

/// The fixed leading part of a header structure.
#[derive(Clone, Copy, Debug, IOread, SizeWith)]
pub struct HeaderIntro {
    pub magic: u32,
    pub reserved: u32,
    pub index_count: u32,
    pub data_size: u32,
}

/// An entry in a header's index.
#[derive(Clone, Copy, Debug, IOread, SizeWith)]
pub struct IndexEntry {
    pub tag: u32,
    pub value_type: u32,
    pub offset: u32,
    pub count: u32,
}

fn malformed(message: impl ToString) -> ExtractError {
    ExtractError::malformed(Extension::Rpm, message)
}

fn io_error(e: io::Error) -> ExtractError {
    malformed(format!("truncated or unreadable header: {}", e))
}

fn read_intro(reader: &mut impl Read) -> Result<HeaderIntro> {
    let intro = reader
        .ioread_with::<HeaderIntro>(scroll::BE)
        .map_err(io_error)?;

    if intro.magic != HEADER_MAGIC || intro.reserved != 0 {
        return Err(malformed("bad header magic"));
    }
    if intro.index_count > MAX_INDEX_ENTRIES {
        return Err(malformed(format!(
            "header has {} index entries",
            intro.index_count
        )));
    }
    if intro.data_size > MAX_DATA_STORE_SIZE {
        return Err(malformed(format!(
            "header data store is {} bytes",
            intro.data_size
        )));
    }

    Ok(intro)
}

fn skip(reader: &mut impl Read, count: u64) -> Result<()> {
    let skipped = io::copy(&mut reader.take(count), &mut io::sink()).map_err(io_error)?;

    if skipped != count {
        Err(malformed("unexpected end of header"))
    } else {
        Ok(())
    }
}

/// Read NUL terminated strings out of a data store at the given offsets.
///
/// Offsets are visited in increasing order so the store is read forward only.
fn read_store_strings(
    reader: &mut impl Read,
    store_size: u32,
    wanted: &mut [(u32, u32)],
    limit: u64,
) -> Result<Vec<(u32, String)>> {
    wanted.sort_by_key(|(offset, _)| *offset);

    let mut store = BufReader::new(reader.take(store_size as u64));
    let mut position = 0u64;
    let mut values: Vec<(u32, String)> = vec![];
    let mut last: Option<(u32, String)> = None;

    for (offset, tag) in wanted.iter().copied() {
        let offset = offset as u64;

        if offset < position {
            // Tags sharing a string share the offset.
            match &last {
                Some((last_offset, value)) if *last_offset as u64 == offset => {
                    values.push((tag, value.clone()));
                    continue;
                }
                _ => return Err(malformed("overlapping header strings")),
            }
        }
        if offset >= store_size as u64 {
            return Err(malformed(format!("tag {} points outside data store", tag)));
        }

        skip(&mut store, offset - position)?;

        let mut data = vec![];
        (&mut store)
            .take(limit + 1)
            .read_until(0, &mut data)
            .map_err(io_error)?;
        position = offset + data.len() as u64;

        if data.last() != Some(&0) {
            return Err(if data.len() as u64 > limit {
                malformed(format!("tag {} value larger than {} bytes", tag, limit))
            } else {
                malformed(format!("tag {} value is not terminated", tag))
            });
        }
        data.pop();

        let value = String::from_utf8_lossy(&data).to_string();
        last = Some((offset as u32, value.clone()));
        values.push((tag, value));
    }

    // Consume the remainder of the store.
    io::copy(&mut store, &mut io::sink()).map_err(io_error)?;
    if store.into_inner().limit() != 0 {
        return Err(malformed("unexpected end of header"));
    }

    Ok(values)
}

/// Extract metadata from an RPM stream.
///
/// The stream is consumed up to the end of the main header. The payload is
/// left for the caller to drain.
pub(crate) fn extract(mut reader: impl Read, options: &ExtractOptions) -> Result<ExtractedMetadata> {
    let mut lead = [0u8; RPM_LEAD_SIZE];
    reader.read_exact(&mut lead).map_err(io_error)?;
    if lead[0..4] != RPM_LEAD_MAGIC {
        return Err(malformed("bad lead magic"));
    }

    let signature = read_intro(&mut reader)?;
    let signature_size = signature.index_count as u64 * 16 + signature.data_size as u64;
    let padding = (8 - signature.data_size as u64 % 8) % 8;
    debug!(
        "skipping {} byte RPM signature header",
        signature_size + padding
    );
    skip(&mut reader, signature_size + padding)?;

    let header = read_intro(&mut reader)?;
    let mut wanted = vec![];
    for _ in 0..header.index_count {
        let entry = reader
            .ioread_with::<IndexEntry>(scroll::BE)
            .map_err(io_error)?;

        if matches!(entry.tag, RPMTAG_NAME | RPMTAG_VERSION) && entry.value_type == RPM_STRING_TYPE
        {
            wanted.push((entry.offset, entry.tag));
        }
    }

    let values = read_store_strings(
        &mut reader,
        header.data_size,
        &mut wanted,
        options.max_metadata_size,
    )?;

    let value = |tag: u32| {
        values
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    };

    Ok(ExtractedMetadata {
        name: value(RPMTAG_NAME),
        version: value(RPMTAG_VERSION),
        ..Default::default()
    })
}
