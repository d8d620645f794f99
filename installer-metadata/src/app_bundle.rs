// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Apple application bundle (`.app`) directories and their `Info.plist`.

use {
    crate::{
        error::{ExtractError, Result},
        io::read_file_bounded,
        metadata::{ExtractedMetadata, Extension},
        options::ExtractOptions,
    },
    log::debug,
    std::path::Path,
};

/// Read a string value from an `Info.plist` dictionary.
fn string_value<'a>(dict: &'a plist::Dictionary, key: &str) -> Option<&'a str> {
    dict.get(key)
        .and_then(|v| v.as_string())
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
}

/// Produce metadata from `Info.plist` content.
///
/// Binary and XML property lists are both accepted. `format` is the
/// installer kind errors are attributed to.
pub(crate) fn metadata_from_info_plist(data: &[u8], format: Extension) -> Result<ExtractedMetadata> {
    let value = plist::Value::from_reader(std::io::Cursor::new(data))
        .map_err(|e| ExtractError::malformed(format, format!("parsing Info.plist: {}", e)))?;
    let dict = value
        .into_dictionary()
        .ok_or_else(|| ExtractError::malformed(format, "Info.plist is not a dictionary"))?;

    let bundle_identifier = string_value(&dict, "CFBundleIdentifier")
        .ok_or_else(|| ExtractError::malformed(format, "Info.plist lacks CFBundleIdentifier"))?;

    let name = match format {
        Extension::App => string_value(&dict, "CFBundleDisplayName")
            .or_else(|| string_value(&dict, "CFBundleName")),
        _ => string_value(&dict, "CFBundleName"),
    };

    let version = string_value(&dict, "CFBundleShortVersionString")
        .or_else(|| string_value(&dict, "CFBundleVersion"));

    Ok(ExtractedMetadata {
        name: name.unwrap_or_default().to_string(),
        version: version.unwrap_or_default().to_string(),
        bundle_identifier: bundle_identifier.to_string(),
        package_ids: vec![],
    })
}

/// Extract metadata from an application bundle directory.
pub(crate) fn extract(path: &Path, options: &ExtractOptions) -> Result<ExtractedMetadata> {
    let bundle_plist = path.join("Contents").join("Info.plist");
    let shallow_plist = path.join("Info.plist");

    let plist_path = if bundle_plist.is_file() {
        bundle_plist
    } else if shallow_plist.is_file() {
        debug!("{} is a shallow bundle", path.display());
        shallow_plist
    } else {
        return Err(ExtractError::malformed(
            Extension::App,
            format!("{} has no Info.plist", path.display()),
        ));
    };

    if std::fs::metadata(&plist_path)?.len() > options.max_metadata_size {
        return Err(ExtractError::malformed(
            Extension::App,
            format!("Info.plist larger than {} bytes", options.max_metadata_size),
        ));
    }

    let data = read_file_bounded(&plist_path, options.max_metadata_size)?;

    metadata_from_info_plist(&data, Extension::App)
}
