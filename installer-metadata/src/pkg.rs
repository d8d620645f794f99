// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Apple flat package (`.pkg`) extraction.

use {
    crate::{
        error::{ExtractError, Result},
        metadata::{ExtractedMetadata, Extension},
        options::ExtractOptions,
    },
    apple_flat_package::PkgReader,
    log::{debug, warn},
    std::io::Read,
};

impl From<apple_flat_package::Error> for ExtractError {
    fn from(e: apple_flat_package::Error) -> Self {
        match e {
            apple_flat_package::Error::Xar(apple_xar::Error::FileTooLarge(limit)) => {
                ExtractError::malformed(
                    Extension::Pkg,
                    format!("metadata file larger than {} bytes", limit),
                )
            }
            e => ExtractError::malformed(Extension::Pkg, e),
        }
    }
}

/// Extract metadata from a flat package stream.
///
/// The stream is consumed up to the end of the metadata file.
pub(crate) fn extract(reader: impl Read, options: &ExtractOptions) -> Result<ExtractedMetadata> {
    let mut pkg = PkgReader::new(reader)?;
    debug!("flat package flavor: {:?}", pkg.flavor());

    let info = match pkg.installer_info(options.max_metadata_size)? {
        Some(info) => info,
        None => {
            warn!("flat package has neither Distribution nor PackageInfo");
            return Ok(ExtractedMetadata::default());
        }
    };

    // Flat packages never report a bundle identifier.
    Ok(ExtractedMetadata {
        name: info.name,
        version: info.version,
        bundle_identifier: String::new(),
        package_ids: info.package_ids,
    })
}
