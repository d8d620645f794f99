// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gzip compressed tarball recognition.

use {
    crate::{
        error::{ExtractError, Result},
        metadata::{ExtractedMetadata, Extension},
    },
    flate2::read::GzDecoder,
    log::debug,
    std::io::Read,
};

fn malformed(message: impl ToString) -> ExtractError {
    ExtractError::malformed(Extension::TarGz, message)
}

/// Verify a stream is a gzip compressed tar archive.
///
/// Every entry header is validated. Nothing is extracted.
pub(crate) fn extract(reader: impl Read) -> Result<ExtractedMetadata> {
    let mut archive = tar::Archive::new(GzDecoder::new(reader));

    let mut count = 0;
    for entry in archive.entries().map_err(malformed)? {
        let entry = entry.map_err(malformed)?;
        entry.path().map_err(malformed)?;
        count += 1;
    }

    if count == 0 {
        return Err(malformed("archive has no entries"));
    }
    debug!("tarball has {} entries", count);

    Ok(ExtractedMetadata::default())
}
