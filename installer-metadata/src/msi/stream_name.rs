// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Windows Installer stream name encoding.
//!
//! Compound file names are limited to 31 UTF-16 code units, so Windows
//! Installer packs up to two characters of a 64 symbol alphabet into a single
//! code unit. A leading `0x4840` marks streams backing database tables.

/// The 64 symbols that can be packed.
const ALPHABET: &[u8; 64] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz._";

const PAIR_START: u16 = 0x3800;
const SINGLE_START: u16 = 0x4800;
const TABLE_PREFIX: u16 = 0x4840;

/// What the table prefix code unit decodes to.
pub const TABLE_PREFIX_NAME: &str = "Table.";

/// Decode a raw compound file entry name.
pub fn decode_stream_name(units: &[u16]) -> String {
    let mut name = String::with_capacity(units.len() * 2);

    for unit in char::decode_utf16(units.iter().copied()) {
        let unit = match unit {
            Ok(c) => c as u32,
            Err(_) => {
                name.push(char::REPLACEMENT_CHARACTER);
                continue;
            }
        };

        match unit {
            u if (PAIR_START as u32..SINGLE_START as u32).contains(&u) => {
                let value = (u - PAIR_START as u32) as usize;
                name.push(ALPHABET[value & 0x3f] as char);
                name.push(ALPHABET[(value >> 6) & 0x3f] as char);
            }
            u if (SINGLE_START as u32..TABLE_PREFIX as u32).contains(&u) => {
                name.push(ALPHABET[(u - SINGLE_START as u32) as usize] as char);
            }
            u if u == TABLE_PREFIX as u32 => {
                name.push_str(TABLE_PREFIX_NAME);
            }
            u => {
                name.push(char::from_u32(u).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
        }
    }

    name
}

/// Encode a stream name the way Windows Installer does.
#[cfg(test)]
pub fn encode_stream_name(name: &str, table: bool) -> Vec<u16> {
    let index = |c: char| ALPHABET.iter().position(|a| *a as char == c);

    let mut units = vec![];
    if table {
        units.push(TABLE_PREFIX);
    }

    let chars = name.chars().collect::<Vec<_>>();
    let mut i = 0;
    while i < chars.len() {
        match (index(chars[i]), chars.get(i + 1).and_then(|c| index(*c))) {
            (Some(first), Some(second)) => {
                units.push(PAIR_START + first as u16 + ((second as u16) << 6));
                i += 2;
            }
            (Some(first), None) => {
                units.push(SINGLE_START + first as u16);
                i += 1;
            }
            (None, _) => {
                let mut buf = [0u16; 2];
                units.extend_from_slice(chars[i].encode_utf16(&mut buf));
                i += 1;
            }
        }
    }

    units
}
