// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Debian binary package (`.deb`) extraction.

use {
    crate::{
        error::{ExtractError, Result},
        metadata::{ExtractedMetadata, Extension},
        options::ExtractOptions,
    },
    debian_packaging::{deb::reader::BinaryPackageReader, error::DebianError},
    std::io::Read,
};

impl From<DebianError> for ExtractError {
    fn from(e: DebianError) -> Self {
        match e {
            DebianError::DebUnknownCompression(_) => ExtractError::malformed(
                Extension::Deb,
                "unrecognized compression on control.tar",
            ),
            e => ExtractError::malformed(Extension::Deb, e),
        }
    }
}

/// Extract metadata from a `.deb` stream.
///
/// All archive members are read so the stream is left at its end.
pub(crate) fn extract(reader: impl Read, options: &ExtractOptions) -> Result<ExtractedMetadata> {
    let mut deb = BinaryPackageReader::new(reader);

    let control = deb.read_control(options.max_metadata_size)?;
    deb.drain()?;

    Ok(ExtractedMetadata {
        name: control.field_str("Package").unwrap_or_default().to_string(),
        version: control.field_str("Version").unwrap_or_default().to_string(),
        ..Default::default()
    })
}
