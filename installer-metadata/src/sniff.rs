// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Installer format identification from leading bytes.

use std::path::Path;

/// A container format recognized from an input's leading bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    /// XAR archive, i.e. an Apple flat package.
    Xar,
    /// `ar` archive starting with `debian-binary`.
    Deb,
    /// Compound file, i.e. a Windows Installer database.
    Msi,
    /// Portable executable.
    Pe,
    /// RPM package.
    Rpm,
    /// ZIP archive. Possibly an iOS application archive.
    Zip,
    /// Gzip stream. Possibly a tarball.
    Gzip,
    /// Nothing recognized.
    Unknown,
}

const XAR_MAGIC: &[u8] = b"xar!";
const AR_MAGIC: &[u8] = b"!<arch>\n";
const CFB_MAGIC: &[u8] = &[0xd0, 0xcf];
const DOS_MAGIC: &[u8] = b"MZ";
const PE_SIGNATURE: &[u8] = b"PE\0\0";
const RPM_MAGIC: &[u8] = &[0xed, 0xab, 0xee, 0xdb];
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];

/// Offset of the PE header pointer in the DOS header.
const PE_POINTER_OFFSET: usize = 0x3c;

/// Classify an input from its first bytes.
///
/// Rules are evaluated in a fixed order and the first match wins.
pub fn sniff(prefix: &[u8]) -> Format {
    if prefix.starts_with(XAR_MAGIC) {
        Format::Xar
    } else if is_deb(prefix) {
        Format::Deb
    } else if prefix.starts_with(CFB_MAGIC) {
        Format::Msi
    } else if is_pe(prefix) {
        Format::Pe
    } else if prefix.starts_with(RPM_MAGIC) {
        Format::Rpm
    } else if is_zip(prefix) {
        Format::Zip
    } else if prefix.starts_with(GZIP_MAGIC) {
        Format::Gzip
    } else {
        Format::Unknown
    }
}

fn is_deb(prefix: &[u8]) -> bool {
    prefix.starts_with(AR_MAGIC) && prefix.get(8..14) == Some(&b"debian"[..])
}

fn is_pe(prefix: &[u8]) -> bool {
    if !prefix.starts_with(DOS_MAGIC) {
        return false;
    }

    // e_lfanew is a 32-bit field.
    let pointer = match prefix.get(PE_POINTER_OFFSET..PE_POINTER_OFFSET + 4) {
        Some(b) => u32::from_le_bytes([b[0], b[1], b[2], b[3]]) as usize,
        None => return false,
    };

    pointer
        .checked_add(PE_SIGNATURE.len())
        .and_then(|end| prefix.get(pointer..end))
        == Some(PE_SIGNATURE)
}

fn is_zip(prefix: &[u8]) -> bool {
    matches!(prefix.get(0..4), Some(b"PK\x03\x04") | Some(b"PK\x05\x06"))
}

/// Whether a path names an application bundle directory.
pub fn is_app_bundle_path(path: &Path) -> bool {
    path.is_dir()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.ends_with(".app"))
            .unwrap_or(false)
}
