// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Installer level metadata derived from package XML files.

/// What a flat package says it installs.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InstallerInfo {
    /// Human readable product name. May be empty.
    pub name: String,

    /// Version of the installed product. May be empty.
    pub version: String,

    /// The identifier best describing the installed product.
    ///
    /// This is usually the bundle identifier of the installed application
    /// and falls back to package identifiers.
    pub identifier: String,

    /// Package identifiers the installer registers with the package database.
    ///
    /// Document order is preserved and duplicates are removed.
    pub package_ids: Vec<String>,
}

/// Test whether an install path refers to an application bundle.
///
/// Bare file names are accepted as is. Otherwise only `.app` bundles
/// directly in `Applications/` qualify. Returns the base name of the bundle.
pub fn app_bundle_name(path: &str) -> Option<&str> {
    let (directory, file) = match path.rfind('/') {
        Some(pos) => (&path[..=pos], &path[pos + 1..]),
        None => ("", path),
    };

    if file.is_empty() {
        None
    } else if directory.is_empty() || (directory == "Applications/" && file.ends_with(".app")) {
        Some(file)
    } else {
        None
    }
}

/// Append a value to a list if it is non-empty and not already present.
pub(crate) fn push_unique(values: &mut Vec<String>, value: &str) {
    let value = value.trim();

    if !value.is_empty() && !values.iter().any(|v| v == value) {
        values.push(value.to_string());
    }
}
