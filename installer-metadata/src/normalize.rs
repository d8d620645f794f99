// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Conversion of extractor output into [InstallerMetadata].

use crate::metadata::{ExtractedMetadata, Extension, InstallerMetadata, Sha256Digest};

/// Produce the final descriptor from an extractor's output.
pub(crate) fn normalize(
    extracted: ExtractedMetadata,
    extension: Extension,
    sha256: Sha256Digest,
) -> InstallerMetadata {
    let name = extracted.name.trim().to_string();
    let version = extracted.version.trim().to_string();
    let bundle_identifier = extracted.bundle_identifier.trim().to_string();

    let package_ids = if !bundle_identifier.is_empty() {
        vec![bundle_identifier.clone()]
    } else {
        let mut ids: Vec<String> = vec![];
        for id in extracted.package_ids.iter().map(|id| id.trim()) {
            if !id.is_empty() && !ids.iter().any(|existing| existing == id) {
                ids.push(id.to_string());
            }
        }

        if ids.is_empty() && !name.is_empty() {
            ids.push(name.clone());
        }

        ids
    };

    InstallerMetadata {
        name,
        version,
        bundle_identifier,
        package_ids,
        extension,
        sha256,
    }
}
