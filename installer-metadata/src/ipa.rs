// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! iOS application archive (`.ipa`) extraction.

use {
    crate::{
        app_bundle::metadata_from_info_plist,
        error::{ExtractError, Result},
        metadata::{ExtractedMetadata, Extension},
        options::ExtractOptions,
    },
    log::debug,
    std::{
        fs::File,
        io::{Read, Seek},
        path::Path,
    },
    zip::{result::ZipError, ZipArchive},
};

/// Whether a zip member path has the form `Payload/<name>.app/Info.plist`.
pub fn is_app_info_plist(name: &str) -> bool {
    let parts = name.split('/').collect::<Vec<_>>();

    matches!(
        parts.as_slice(),
        ["Payload", app, "Info.plist"] if app.len() > 4 && app.ends_with(".app")
    )
}

fn zip_error(e: ZipError) -> ExtractError {
    match e {
        ZipError::Io(e) => ExtractError::Io(e),
        e => ExtractError::malformed(Extension::Ipa, e),
    }
}

/// Extract metadata from a zip archive readable with random access.
///
/// Returns `None` if the archive is not an application archive.
pub(crate) fn extract_from_reader(
    reader: impl Read + Seek,
    options: &ExtractOptions,
) -> Result<Option<ExtractedMetadata>> {
    let mut archive = match ZipArchive::new(reader) {
        Ok(archive) => archive,
        Err(ZipError::Io(e)) => return Err(e.into()),
        Err(e) => {
            debug!("not a readable zip archive: {}", e);
            return Ok(None);
        }
    };

    let mut index = None;
    for i in 0..archive.len() {
        let name = archive.by_index_raw(i).map_err(zip_error)?.name().to_string();

        if is_app_info_plist(&name) {
            debug!("found application Info.plist at {}", name);
            index = Some(i);
            break;
        }
    }

    let index = match index {
        Some(index) => index,
        None => return Ok(None),
    };

    let entry = archive.by_index(index).map_err(zip_error)?;
    if entry.size() > options.max_metadata_size {
        return Err(ExtractError::malformed(
            Extension::Ipa,
            format!("Info.plist larger than {} bytes", options.max_metadata_size),
        ));
    }

    let mut data = vec![];
    entry
        .take(options.max_metadata_size + 1)
        .read_to_end(&mut data)
        .map_err(|e| ExtractError::malformed(Extension::Ipa, format!("reading Info.plist: {}", e)))?;

    if data.len() as u64 > options.max_metadata_size {
        return Err(ExtractError::malformed(
            Extension::Ipa,
            format!("Info.plist larger than {} bytes", options.max_metadata_size),
        ));
    }

    metadata_from_info_plist(&data, Extension::Ipa).map(Some)
}

/// Extract metadata from the zip file at a path.
pub(crate) fn extract(path: &Path, options: &ExtractOptions) -> Result<Option<ExtractedMetadata>> {
    let file = File::open(path)?;

    if file.metadata()?.len() > options.max_random_access_size {
        return Err(ExtractError::too_large());
    }

    extract_from_reader(file, options)
}
