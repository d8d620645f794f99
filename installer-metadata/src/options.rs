// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extraction settings.

use serde::{Deserialize, Serialize};

/// Default cap on a single decompressed metadata file.
pub const DEFAULT_MAX_METADATA_SIZE: u64 = 1024 * 1024;

/// Default cap on inputs that must be read with random access.
pub const DEFAULT_MAX_RANDOM_ACCESS_SIZE: u64 = 3 * 1024 * 1024 * 1024;

/// Settings controlling an extraction.
///
/// Instances are passed to each call. There is no global state.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtractOptions {
    /// Maximum size of a decompressed metadata file (control file, XML document, plist).
    ///
    /// Larger files are treated as malformed.
    pub max_metadata_size: u64,

    /// Maximum size of inputs that are buffered for random access (MSI, PE, ZIP).
    ///
    /// Larger inputs are rejected with an I/O error.
    pub max_random_access_size: u64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            max_metadata_size: DEFAULT_MAX_METADATA_SIZE,
            max_random_access_size: DEFAULT_MAX_RANDOM_ACCESS_SIZE,
        }
    }
}

impl ExtractOptions {
    /// Set the maximum decompressed metadata file size.
    pub fn set_max_metadata_size(mut self, size: u64) -> Self {
        self.max_metadata_size = size;
        self
    }

    /// Set the maximum size of inputs read with random access.
    pub fn set_max_random_access_size(mut self, size: u64) -> Self {
        self.max_random_access_size = size;
        self
    }
}
