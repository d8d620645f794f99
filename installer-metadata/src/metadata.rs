// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The installer descriptor and its component types.

use {
    serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer},
    std::fmt::{Display, Formatter},
};

/// The kind of installer a descriptor was extracted from.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Extension {
    /// Apple flat package.
    #[serde(rename = "pkg")]
    Pkg,
    /// Windows Installer database.
    #[serde(rename = "msi")]
    Msi,
    /// Windows executable.
    #[serde(rename = "exe")]
    Exe,
    /// Debian binary package.
    #[serde(rename = "deb")]
    Deb,
    /// RPM package.
    #[serde(rename = "rpm")]
    Rpm,
    /// iOS application archive.
    #[serde(rename = "ipa")]
    Ipa,
    /// Apple application bundle directory.
    #[serde(rename = "app")]
    App,
    /// Gzip compressed tarball.
    #[serde(rename = "tar.gz")]
    TarGz,
}

impl Extension {
    /// The tag string of this extension.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pkg => "pkg",
            Self::Msi => "msi",
            Self::Exe => "exe",
            Self::Deb => "deb",
            Self::Rpm => "rpm",
            Self::Ipa => "ipa",
            Self::App => "app",
            Self::TarGz => "tar.gz",
        }
    }
}

impl Display for Extension {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A SHA-256 content digest.
#[derive(Clone, Copy, Default, Eq, Hash, PartialEq)]
pub struct Sha256Digest([u8; 32]);

impl Sha256Digest {
    pub fn new(digest: [u8; 32]) -> Self {
        Self(digest)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Whether this is the all-zero placeholder used when no content was hashed.
    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl std::fmt::Debug for Sha256Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sha256Digest({})", self.to_hex())
    }
}

impl Display for Sha256Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Sha256Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Sha256Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;

        let mut digest = [0u8; 32];
        hex::decode_to_slice(&s, &mut digest).map_err(D::Error::custom)?;

        Ok(Self(digest))
    }
}

/// Normalized metadata describing an installer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct InstallerMetadata {
    /// Human readable product name. May be empty.
    pub name: String,

    /// Version as declared by the installer. May be empty.
    pub version: String,

    /// Apple bundle identifier. Empty for other platforms.
    pub bundle_identifier: String,

    /// Identifiers the platform package manager knows the installed software by.
    ///
    /// Never contains empty strings or duplicates.
    pub package_ids: Vec<String>,

    /// The kind of installer.
    pub extension: Extension,

    /// Digest of the entire input.
    pub sha256: Sha256Digest,
}

/// Metadata as produced by a format extractor, before normalization.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct ExtractedMetadata {
    pub name: String,
    pub version: String,
    pub bundle_identifier: String,
    pub package_ids: Vec<String>,
}
