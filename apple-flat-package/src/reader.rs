// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Reading support for Apple flat package (`.pkg`) installers.

use {
    crate::{
        distribution::Distribution, installer_info::InstallerInfo, package_info::PackageInfo,
        PkgResult,
    },
    apple_xar::reader::XarReader,
    log::debug,
    std::io::{Cursor, Read},
};

/// The type of a flat package.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PkgFlavor {
    /// A *component* installer.
    ///
    /// This consists of a single component.
    Component,

    /// A *product* installer.
    ///
    /// This consists of multiple components, described by a `Distribution` file.
    Product,
}

/// Read-only interface to a single flat package XAR archive.
///
/// Like [XarReader], this reader only moves forward through the archive,
/// so at most one of the metadata files can be read.
pub struct PkgReader<R: Read> {
    xar: XarReader<R>,
    flavor: PkgFlavor,
}

impl<R: Read> PkgReader<R> {
    /// Construct an instance from a reader.
    ///
    /// The reader will read the contents of a XAR archive. This is likely
    /// a `.pkg` file.
    pub fn new(reader: R) -> PkgResult<Self> {
        let xar = XarReader::new(reader)?;

        let flavor = if xar.table_of_contents().root_file("Distribution").is_some() {
            PkgFlavor::Product
        } else {
            PkgFlavor::Component
        };

        Ok(Self { xar, flavor })
    }

    /// Return the inner reader, consuming self.
    pub fn into_inner(self) -> XarReader<R> {
        self.xar
    }

    /// Obtain the flavor of the flat package.
    pub fn flavor(&self) -> PkgFlavor {
        self.flavor
    }

    fn root_file_data(&mut self, name: &str, limit: u64) -> PkgResult<Option<Vec<u8>>> {
        let file = match self.xar.table_of_contents().root_file(name) {
            Some(file) => file.clone(),
            None => return Ok(None),
        };

        Ok(Some(self.xar.read_file_data_decoded(&file, limit)?))
    }

    /// Obtain the parsed `Distribution` XML file describing the installer.
    ///
    /// Not all flat packages have a `Distribution` file, so this may resolve to
    /// `None`. Decoded content larger than `limit` is an error.
    pub fn distribution(&mut self, limit: u64) -> PkgResult<Option<Distribution>> {
        if let Some(xml_data) = self.root_file_data("Distribution", limit)? {
            Ok(Some(Distribution::from_reader(Cursor::new(xml_data))?))
        } else {
            Ok(None)
        }
    }

    /// Obtain the parsed `PackageInfo` XML file at the root of the archive.
    ///
    /// This only exists for component packages.
    pub fn root_package_info(&mut self, limit: u64) -> PkgResult<Option<PackageInfo>> {
        if let Some(xml_data) = self.root_file_data("PackageInfo", limit)? {
            Ok(Some(PackageInfo::from_reader(Cursor::new(xml_data))?))
        } else {
            Ok(None)
        }
    }

    /// Resolve what this installer installs.
    ///
    /// Product packages are described by their `Distribution` file and component
    /// packages by their `PackageInfo` file. `None` is returned when neither exists.
    pub fn installer_info(&mut self, limit: u64) -> PkgResult<Option<InstallerInfo>> {
        match self.flavor {
            PkgFlavor::Product => {
                debug!("reading installer metadata from Distribution");
                Ok(self.distribution(limit)?.map(|d| d.installer_info()))
            }
            PkgFlavor::Component => {
                debug!("reading installer metadata from PackageInfo");
                Ok(self.root_package_info(limit)?.map(|p| p.installer_info()))
            }
        }
    }
}
