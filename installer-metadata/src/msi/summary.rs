// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `SummaryInformation` property set.

use {
    super::{MsiError, MsiResult},
    log::debug,
    scroll::Pread,
};

/// Name of the stream holding summary information.
pub const SUMMARY_INFORMATION_STREAM: &str = "\u{5}SummaryInformation";

pub const PID_TITLE: u32 = 2;
pub const PID_SUBJECT: u32 = 3;
pub const PID_REVNUMBER: u32 = 9;

const VT_LPSTR: u32 = 30;
const VT_LPWSTR: u32 = 31;

/// Offset of the first section's offset field.
const FIRST_SECTION_OFFSET: usize = 44;

/// String properties of interest in the summary information stream.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SummaryInformation {
    pub title: Option<String>,
    pub subject: Option<String>,
    pub revision_number: Option<String>,
}

fn summary_error(message: impl ToString) -> MsiError {
    MsiError::SummaryInformation(message.to_string())
}

fn read_string(data: &[u8], offset: usize) -> MsiResult<Option<String>> {
    let value_type = data.pread_with::<u32>(offset, scroll::LE)? & 0xffff;
    let length = data.pread_with::<u32>(offset + 4, scroll::LE)? as usize;
    let start = offset + 8;

    let value = match value_type {
        VT_LPSTR => {
            let raw = data
                .get(start..start.saturating_add(length))
                .ok_or_else(|| summary_error("string property out of bounds"))?;

            String::from_utf8_lossy(raw).to_string()
        }
        VT_LPWSTR => {
            let raw = data
                .get(start..start.saturating_add(length.saturating_mul(2)))
                .ok_or_else(|| summary_error("string property out of bounds"))?;

            String::from_utf16_lossy(
                &raw.chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .collect::<Vec<_>>(),
            )
        }
        _ => {
            debug!("ignoring summary property of type {}", value_type);
            return Ok(None);
        }
    };

    Ok(Some(value.trim_end_matches('\0').to_string()))
}

impl SummaryInformation {
    /// Parse the content of the summary information stream.
    pub fn parse(data: &[u8]) -> MsiResult<Self> {
        let byte_order = data.pread_with::<u16>(0, scroll::LE)?;
        if byte_order != 0xfffe {
            return Err(summary_error(format!("bad byte order {:#x}", byte_order)));
        }

        let section = data.pread_with::<u32>(FIRST_SECTION_OFFSET, scroll::LE)? as usize;
        let count = data.pread_with::<u32>(section + 4, scroll::LE)? as usize;

        if count > data.len() / 8 {
            return Err(summary_error(format!("{} properties in section", count)));
        }

        let mut info = Self::default();

        for i in 0..count {
            let entry = section + 8 + i * 8;
            let id = data.pread_with::<u32>(entry, scroll::LE)?;
            let offset = data.pread_with::<u32>(entry + 4, scroll::LE)? as usize;

            let slot = match id {
                PID_TITLE => &mut info.title,
                PID_SUBJECT => &mut info.subject,
                PID_REVNUMBER => &mut info.revision_number,
                _ => continue,
            };

            *slot = read_string(data, section + offset)?;
        }

        Ok(info)
    }
}
