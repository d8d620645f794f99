// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Windows Installer database tables.
//!
//! Strings in all tables are references into a shared pool stored in two
//! streams. `_StringPool` holds a codepage word followed by a
//! `(length, refcount)` pair per string, and `_StringData` holds the
//! concatenated string bytes. Table streams store their rows column-major.

use {
    super::{MsiError, MsiResult},
    encoding_rs::Encoding,
    log::warn,
    scroll::Pread,
    std::collections::HashMap,
};

pub const STRING_POOL_STREAM: &str = "Table._StringPool";
pub const STRING_DATA_STREAM: &str = "Table._StringData";
pub const PROPERTY_TABLE_STREAM: &str = "Table.Property";

/// Codepage flag indicating string references are 3 bytes wide.
const LONG_STRING_REFS: u32 = 0x8000_0000;

/// Resolve the text encoding of a database codepage.
///
/// The neutral codepage 0 is treated as Windows-1252. Unknown codepages fall
/// back to UTF-8.
fn codepage_encoding(codepage: u32) -> &'static Encoding {
    match codepage {
        0 | 1252 => encoding_rs::WINDOWS_1252,
        65001 => encoding_rs::UTF_8,
        866 => encoding_rs::IBM866,
        874 => encoding_rs::WINDOWS_874,
        932 => encoding_rs::SHIFT_JIS,
        936 => encoding_rs::GBK,
        949 => encoding_rs::EUC_KR,
        950 => encoding_rs::BIG5,
        1250 => encoding_rs::WINDOWS_1250,
        1251 => encoding_rs::WINDOWS_1251,
        1253 => encoding_rs::WINDOWS_1253,
        1254 => encoding_rs::WINDOWS_1254,
        1255 => encoding_rs::WINDOWS_1255,
        1256 => encoding_rs::WINDOWS_1256,
        1257 => encoding_rs::WINDOWS_1257,
        1258 => encoding_rs::WINDOWS_1258,
        _ => {
            warn!("unsupported MSI codepage {}; decoding strings as UTF-8", codepage);
            encoding_rs::UTF_8
        }
    }
}

fn pool_error(message: impl ToString) -> MsiError {
    MsiError::StringPool(message.to_string())
}

/// The database string pool.
#[derive(Clone, Debug)]
pub struct StringPool {
    codepage: u32,
    reference_size: usize,
    strings: Vec<String>,
}

impl StringPool {
    /// Construct an instance from the `_StringPool` and `_StringData` streams.
    pub fn parse(pool: &[u8], data: &[u8]) -> MsiResult<Self> {
        let header = pool.pread_with::<u32>(0, scroll::LE)?;
        let reference_size = if header & LONG_STRING_REFS != 0 { 3 } else { 2 };
        let codepage = header & !LONG_STRING_REFS;
        let encoding = codepage_encoding(codepage);

        let mut strings = vec![];
        let mut pool_offset = 4;
        let mut data_offset = 0usize;

        while pool_offset + 4 <= pool.len() {
            let length = pool.pread_with::<u16>(pool_offset, scroll::LE)? as usize;
            let refcount = pool.pread_with::<u16>(pool_offset + 2, scroll::LE)? as usize;
            pool_offset += 4;

            // Strings longer than 0xffff bytes store their length in the following entry.
            let length = if length == 0 && refcount != 0 {
                let low = pool.pread_with::<u16>(pool_offset, scroll::LE)? as usize;
                let high = pool.pread_with::<u16>(pool_offset + 2, scroll::LE)? as usize;
                pool_offset += 4;

                (high << 16) | low
            } else {
                length
            };

            let raw = data
                .get(data_offset..data_offset + length)
                .ok_or_else(|| pool_error(format!("string {} out of bounds", strings.len() + 1)))?;
            data_offset += length;

            let (text, _) = encoding.decode_without_bom_handling(raw);
            strings.push(text.into_owned());
        }

        Ok(Self {
            codepage,
            reference_size,
            strings,
        })
    }

    /// The codepage strings are encoded in.
    pub fn codepage(&self) -> u32 {
        self.codepage
    }

    /// Width in bytes of string references in table streams.
    pub fn reference_size(&self) -> usize {
        self.reference_size
    }

    /// Resolve a string reference.
    ///
    /// Reference 0 is the null string.
    pub fn get(&self, id: u32) -> MsiResult<Option<&str>> {
        if id == 0 {
            return Ok(None);
        }

        self.strings
            .get(id as usize - 1)
            .map(|s| Some(s.as_str()))
            .ok_or_else(|| pool_error(format!("string reference {} out of range", id)))
    }
}

/// Parse the `Property` table into a map of property names to values.
pub fn parse_property_table(table: &[u8], pool: &StringPool) -> MsiResult<HashMap<String, String>> {
    let width = pool.reference_size();
    let row_size = width * 2;

    if table.len() % row_size != 0 {
        return Err(MsiError::PropertyTable(format!(
            "{} bytes is not a multiple of the {} byte row size",
            table.len(),
            row_size
        )));
    }

    let rows = table.len() / row_size;
    let column = |index: usize| -> u32 {
        table[index..index + width]
            .iter()
            .rev()
            .fold(0u32, |acc, b| (acc << 8) | *b as u32)
    };

    let mut properties = HashMap::with_capacity(rows);

    for row in 0..rows {
        let key = pool.get(column(row * width))?;
        let value = pool.get(column((rows + row) * width))?;

        if let Some(key) = key {
            properties.insert(key.to_string(), value.unwrap_or_default().to_string());
        }
    }

    Ok(properties)
}
