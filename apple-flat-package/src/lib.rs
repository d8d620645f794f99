// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reading metadata from macOS `.pkg` installers.
//!
//! A `.pkg` is a XAR archive (see the `apple-xar` crate). Two layouts exist:
//!
//! * A *product* archive carries a `Distribution` XML file at its root,
//!   naming the product and listing the component packages it installs.
//!   See [Distribution] and Apple's
//!   [Distribution XML reference](https://developer.apple.com/library/archive/documentation/DeveloperTools/Reference/DistributionDefinitionRef/Chapters/Distribution_XML_Ref.html).
//! * A *component* archive carries a single `PackageInfo` XML file at its
//!   root. See [PackageInfo].
//!
//! [PkgReader] reads whichever of these is present in a single forward pass
//! and [InstallerInfo] condenses it into a name, version and package ids.
//! Payloads are never unpacked.

pub mod distribution;
pub use distribution::Distribution;
pub mod installer_info;
pub use installer_info::InstallerInfo;
pub mod package_info;
pub use package_info::PackageInfo;
pub mod reader;
pub use reader::{PkgFlavor, PkgReader};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    SerdeXml(#[from] serde_xml_rs::Error),

    #[error("xar error: {0}")]
    Xar(#[from] apple_xar::Error),
}

/// Result type for this crate.
pub type PkgResult<T> = std::result::Result<T, Error>;
