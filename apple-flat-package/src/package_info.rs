// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `PackageInfo` XML files.

use {
    crate::{
        distribution::Bundle,
        installer_info::{app_bundle_name, push_unique, InstallerInfo},
        PkgResult,
    },
    serde::{Deserialize, Serialize},
    std::io::Read,
};

/// Provides information about the package to install.
///
/// Attributes that only influence install behavior are not modeled.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename = "pkg-info", rename_all = "kebab-case")]
pub struct PackageInfo {
    /// Authentication requirements for the package install.
    ///
    /// Values include `none` and `root`.
    pub auth: Option<String>,

    /// Format version of the package.
    ///
    /// Value is likely `2`.
    pub format_version: Option<String>,

    /// Identifies the tool that assembled this package.
    pub generator_version: Option<String>,

    /// Uniform type identifier that defines the package.
    #[serde(default)]
    pub identifier: String,

    /// Default location where the payload hierarchy should be installed.
    pub install_location: Option<String>,

    /// Display name of the package. Rarely present.
    pub title: Option<String>,

    /// Version of the package.
    ///
    /// This is the version of the package itself, not the version of the application
    /// being installed.
    #[serde(default)]
    pub version: String,

    /// Versioning information about bundles within the payload.
    #[serde(default)]
    pub bundle: Vec<Bundle>,

    /// Provides information on the content being installed.
    pub payload: Option<Payload>,
}

impl PackageInfo {
    /// Parse PackageInfo XML from a reader.
    pub fn from_reader(reader: impl Read) -> PkgResult<Self> {
        let mut de =
            serde_xml_rs::Deserializer::new_from_reader(reader).non_contiguous_seq_elements(true);

        Ok(Self::deserialize(&mut de)?)
    }

    /// Parse PackageInfo XML from a string.
    pub fn from_xml(s: &str) -> PkgResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// The location a bundle is installed to, relative to the volume root.
    pub fn bundle_install_path(&self, bundle: &Bundle) -> Option<String> {
        let path = bundle.path.as_deref()?;
        let path = path.strip_prefix("./").unwrap_or(path);

        let joined = match self.install_location.as_deref() {
            Some(location) if !location.is_empty() => {
                format!("{}/{}", location.trim_end_matches('/'), path)
            }
            _ => path.to_string(),
        };

        Some(
            joined
                .trim_start_matches('/')
                .trim_start_matches("./")
                .to_string(),
        )
    }

    /// Derive installer metadata from this package.
    pub fn installer_info(&self) -> InstallerInfo {
        let mut package_ids = vec![];
        let mut app_name = String::new();
        let mut app_version = String::new();

        for bundle in &self.bundle {
            if let Some(id) = &bundle.id {
                push_unique(&mut package_ids, id);
            }

            if let Some(path) = self.bundle_install_path(bundle) {
                if let Some(name) = app_bundle_name(&path) {
                    app_name = name.to_string();
                    app_version = bundle
                        .cf_bundle_short_version_string
                        .clone()
                        .unwrap_or_default();
                }
            }
        }

        if package_ids.is_empty() {
            push_unique(&mut package_ids, &self.identifier);
        }

        let name = match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => app_name,
        };

        let version = if app_version.is_empty() {
            self.version.clone()
        } else {
            app_version
        };

        InstallerInfo {
            name,
            version,
            identifier: self.identifier.clone(),
            package_ids,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Payload {
    #[serde(rename = "numberOfFiles")]
    pub number_of_files: Option<u64>,
    #[serde(rename = "installKBytes")]
    pub install_kbytes: Option<u64>,
}
