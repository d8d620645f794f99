// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! `VS_VERSIONINFO` parsing.

Version information is a tree of nodes. Each node is a length, a value
length, a type, a NUL terminated UTF-16 key and a value, followed by child
nodes. Values and children start on 4 byte boundaries.
*/

use {
    super::{PeError, PeResult},
    scroll::{Pread, SizeWith},
};

pub const VS_VERSION_INFO_KEY: &str = "VS_VERSION_INFO";
pub const VS_FFI_SIGNATURE: u32 = 0xfeef_04bd;

/// Node value type for text.
const TEXT_VALUE: u16 = 1;

/// The `VS_FIXEDFILEINFO` structure.
#[derive(Clone, Copy, Debug, Pread, SizeWith)]
pub struct FixedFileInfo {
    pub signature: u32,
    pub struc_version: u32,
    pub file_version_ms: u32,
    pub file_version_ls: u32,
    pub product_version_ms: u32,
    pub product_version_ls: u32,
    pub file_flags_mask: u32,
    pub file_flags: u32,
    pub file_os: u32,
    pub file_type: u32,
    pub file_subtype: u32,
    pub file_date_ms: u32,
    pub file_date_ls: u32,
}

fn format_version(ms: u32, ls: u32) -> Option<String> {
    if ms == 0 && ls == 0 {
        None
    } else {
        Some(format!(
            "{}.{}.{}.{}",
            ms >> 16,
            ms & 0xffff,
            ls >> 16,
            ls & 0xffff
        ))
    }
}

impl FixedFileInfo {
    /// The binary file version, formatted as 4 dotted components.
    pub fn file_version(&self) -> Option<String> {
        format_version(self.file_version_ms, self.file_version_ls)
    }

    /// The binary product version, formatted as 4 dotted components.
    pub fn product_version(&self) -> Option<String> {
        format_version(self.product_version_ms, self.product_version_ls)
    }
}

/// A `StringTable` from `StringFileInfo`.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StringTable {
    /// Language and codepage as 8 hex digits.
    pub key: String,
    pub strings: Vec<(String, String)>,
}

impl StringTable {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.strings
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Parsed version information.
#[derive(Clone, Debug, Default)]
pub struct VersionInfo {
    pub fixed: Option<FixedFileInfo>,
    pub string_tables: Vec<StringTable>,
}

impl VersionInfo {
    /// Find the first non-empty string value for a key across string tables.
    pub fn string(&self, key: &str) -> Option<&str> {
        self.string_tables
            .iter()
            .filter_map(|table| table.get(key))
            .find(|value| !value.trim().is_empty())
    }
}

fn align4(offset: usize) -> usize {
    (offset + 3) & !3
}

fn decode_utf16(data: &[u8]) -> String {
    let units = data
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .take_while(|u| *u != 0)
        .collect::<Vec<_>>();

    String::from_utf16_lossy(&units)
}

struct Node<'a> {
    key: String,
    value_type: u16,
    value: &'a [u8],
    children: &'a [u8],
}

impl<'a> Node<'a> {
    /// Parse the node at the start of `data`, returning it and the offset of its successor.
    fn parse(data: &'a [u8]) -> PeResult<(Self, usize)> {
        let length = data.pread_with::<u16>(0, scroll::LE)? as usize;
        let value_length = data.pread_with::<u16>(2, scroll::LE)? as usize;
        let value_type = data.pread_with::<u16>(4, scroll::LE)?;

        if length < 6 || length > data.len() {
            return Err(PeError::VersionInfo(format!(
                "node length {} out of bounds",
                length
            )));
        }
        let node = &data[..length];

        let mut offset = 6;
        let mut key = vec![];
        loop {
            let unit = node.pread_with::<u16>(offset, scroll::LE)?;
            offset += 2;

            if unit == 0 {
                break;
            }
            key.push(unit);
        }
        let key = String::from_utf16_lossy(&key);

        offset = std::cmp::min(align4(offset), length);

        // Text values are counted in UTF-16 units.
        let value_size = if value_type == TEXT_VALUE {
            value_length * 2
        } else {
            value_length
        };
        let value_end = std::cmp::min(offset + value_size, length);
        let value = &node[offset..value_end];

        let children = &node[std::cmp::min(align4(value_end), length)..];

        Ok((
            Self {
                key,
                value_type,
                value,
                children,
            },
            align4(length),
        ))
    }

    fn children(&self) -> PeResult<Vec<Node<'a>>> {
        let mut children = vec![];
        let mut data = self.children;

        while data.len() >= 6 {
            // Trailing padding.
            if data.pread_with::<u16>(0, scroll::LE)? == 0 {
                break;
            }

            let (child, next) = Node::parse(data)?;
            children.push(child);
            data = data.get(next..).unwrap_or_default();
        }

        Ok(children)
    }

    fn text(&self) -> String {
        if self.value_type == TEXT_VALUE {
            decode_utf16(self.value)
        } else {
            String::from_utf8_lossy(self.value)
                .trim_end_matches('\0')
                .to_string()
        }
    }
}

impl VersionInfo {
    /// Parse a `VS_VERSIONINFO` resource.
    pub fn parse(data: &[u8]) -> PeResult<Self> {
        let (root, _) = Node::parse(data)?;

        if root.key != VS_VERSION_INFO_KEY {
            return Err(PeError::VersionInfo(format!(
                "unexpected root key {}",
                root.key
            )));
        }

        let fixed = if root.value.is_empty() {
            None
        } else {
            let fixed = root.value.pread_with::<FixedFileInfo>(0, scroll::LE)?;
            if fixed.signature != VS_FFI_SIGNATURE {
                return Err(PeError::VersionInfo(format!(
                    "bad fixed file info signature {:#x}",
                    fixed.signature
                )));
            }

            Some(fixed)
        };

        let mut string_tables = vec![];
        for child in root.children()? {
            if child.key != "StringFileInfo" {
                continue;
            }

            for table in child.children()? {
                string_tables.push(StringTable {
                    strings: table
                        .children()?
                        .into_iter()
                        .map(|s| (s.key.clone(), s.text()))
                        .collect(),
                    key: table.key,
                });
            }
        }

        Ok(Self {
            fixed,
            string_tables,
        })
    }
}
