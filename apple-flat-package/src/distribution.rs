// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Distribution XML file format.
//!
//! See https://developer.apple.com/library/archive/documentation/DeveloperTools/Reference/DistributionDefinitionRef/Chapters/Distribution_XML_Ref.html
//! for Apple's documentation of this file format.
//!
//! Only elements describing what gets installed are modeled. Presentation
//! elements (`background`, `welcome`, `choices-outline`, ...) are ignored.

use {
    crate::{
        installer_info::{app_bundle_name, push_unique, InstallerInfo},
        PkgResult,
    },
    serde::{Deserialize, Serialize},
    std::io::Read,
};

/// Placeholder title left behind by some packaging templates.
const PLACEHOLDER_TITLE: &str = "DISTRIBUTION_TITLE";

/// Represents a distribution XML file.
///
/// The root element is `installer-gui-script` (or the older `installer-script`).
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename = "installer-gui-script", rename_all = "kebab-case")]
pub struct Distribution {
    #[serde(rename = "minSpecVersion")]
    pub min_spec_version: Option<String>,
    pub title: Option<Title>,
    pub product: Option<Product>,
    #[serde(default)]
    pub pkg_ref: Vec<PkgRef>,
}

impl Distribution {
    /// Parse Distribution XML from a reader.
    pub fn from_reader(reader: impl Read) -> PkgResult<Self> {
        let mut de =
            serde_xml_rs::Deserializer::new_from_reader(reader).non_contiguous_seq_elements(true);

        Ok(Self::deserialize(&mut de)?)
    }

    /// Parse Distribution XML from a string.
    pub fn from_xml(s: &str) -> PkgResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Derive installer metadata from this distribution.
    pub fn installer_info(&self) -> InstallerInfo {
        // Prefer package ids that actually install something.
        let mut package_ids = vec![];
        for pkg in self.pkg_ref.iter().filter(|p| p.installs_content()) {
            push_unique(&mut package_ids, pkg.identifier());
        }
        if package_ids.is_empty() {
            for pkg in &self.pkg_ref {
                push_unique(&mut package_ids, pkg.identifier());
            }
        }

        // An application bundle installed at a top-level location is the best
        // description of the product.
        let app = self
            .pkg_ref
            .iter()
            .flat_map(|pkg| pkg.bundle_version.iter())
            .flat_map(|versions| versions.bundle.iter())
            .find_map(|bundle| {
                bundle
                    .path
                    .as_deref()
                    .and_then(app_bundle_name)
                    .map(|name| (bundle, name))
            });

        let mut identifier = app
            .and_then(|(bundle, _)| bundle.id.clone())
            .unwrap_or_default();

        if identifier.is_empty() {
            identifier = self
                .pkg_ref
                .iter()
                .find_map(|pkg| pkg.must_close.as_ref().and_then(|mc| mc.app.first()))
                .map(|app| app.id.clone())
                .unwrap_or_default();
        }

        if identifier.is_empty() {
            identifier = self
                .pkg_ref
                .iter()
                .map(|pkg| pkg.identifier())
                .find(|id| !id.is_empty())
                .unwrap_or_default()
                .to_string();
        }

        if identifier.is_empty() {
            if let Some(id) = self.product.as_ref().and_then(|p| p.id.as_ref()) {
                identifier = id.clone();
            }
        }

        if package_ids.is_empty() {
            push_unique(&mut package_ids, &identifier);
        }

        let name = match self.title.as_ref().map(|t| t.title.trim()) {
            Some(title) if !title.is_empty() && title != PLACEHOLDER_TITLE => title.to_string(),
            _ => app.map(|(_, name)| name.to_string()).unwrap_or_default(),
        };

        let product_version = self
            .product
            .as_ref()
            .and_then(|p| p.version.clone())
            .unwrap_or_default();
        let app_version = app
            .and_then(|(bundle, _)| bundle.cf_bundle_short_version_string.clone())
            .unwrap_or_default();

        let version = if !product_version.is_empty() {
            product_version
        } else if !app_version.is_empty() {
            app_version
        } else {
            self.pkg_ref
                .iter()
                .filter_map(|pkg| pkg.version.as_deref())
                .filter(|v| !v.is_empty())
                .last()
                .unwrap_or_default()
                .to_string()
        };

        InstallerInfo {
            name,
            version,
            identifier,
            package_ids,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct App {
    pub id: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Bundle {
    #[serde(rename = "CFBundleShortVersionString")]
    pub cf_bundle_short_version_string: Option<String>,
    #[serde(rename = "CFBundleVersion")]
    pub cf_bundle_version: Option<String>,
    pub id: Option<String>,
    pub path: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BundleVersion {
    #[serde(default)]
    pub bundle: Vec<Bundle>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MustClose {
    #[serde(default)]
    pub app: Vec<App>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PkgRef {
    pub id: Option<String>,
    #[serde(rename = "packageIdentifier")]
    pub package_identifier: Option<String>,
    #[serde(rename = "installKBytes")]
    pub install_kbytes: Option<String>,
    pub version: Option<String>,
    #[serde(rename = "must-close")]
    pub must_close: Option<MustClose>,
    #[serde(default, rename = "bundle-version")]
    pub bundle_version: Vec<BundleVersion>,
}

impl PkgRef {
    /// The package identifier this reference resolves to.
    ///
    /// `packageIdentifier` wins over `id`. May be empty.
    pub fn identifier(&self) -> &str {
        match (self.package_identifier.as_deref(), self.id.as_deref()) {
            (Some(id), _) if !id.is_empty() => id,
            (_, Some(id)) => id,
            _ => "",
        }
    }

    /// Whether this reference declares a non-zero install size.
    pub fn installs_content(&self) -> bool {
        matches!(self.install_kbytes.as_deref().map(str::trim), Some(size) if !size.is_empty() && size != "0")
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Product {
    pub id: Option<String>,
    pub version: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Title {
    #[serde(default, rename = "$value")]
    pub title: String,
}
