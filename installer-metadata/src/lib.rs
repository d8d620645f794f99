// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Software installer identification and metadata extraction.
//!
//! Given an installer file, this crate determines its format from its leading
//! bytes, extracts the product name, version and package identifiers the
//! target platform uses for it, and computes the SHA-256 of the whole file.
//!
//! Supported formats:
//!
//! * Apple flat packages (`.pkg`, XAR archives).
//! * Windows Installer databases (`.msi`, compound files).
//! * Windows executables (`.exe`, via their version resource).
//! * Debian binary packages (`.deb`).
//! * RPM packages (`.rpm`).
//! * iOS application archives (`.ipa`).
//! * Apple application bundles (`.app` directories).
//! * Gzip compressed tarballs (`.tar.gz`), recognized but carrying no metadata.
//!
//! The main entry point is [extract()], which consumes an [InstallerSource]
//! and returns an [InstallerMetadata]. Inputs are read as a stream wherever
//! the format allows. Formats needing random access (MSI, PE, ZIP) are hashed
//! first and then opened by path.
//!
//! # Example
//!
//! ```no_run
//! use installer_metadata::{extract, FileSource};
//!
//! let mut source = FileSource::open("installer.pkg")?;
//! let metadata = extract(&mut source)?;
//! println!("{} {} {}", metadata.name, metadata.version, metadata.sha256);
//! # Ok::<(), installer_metadata::ExtractError>(())
//! ```

mod app_bundle;
mod deb;
mod dispatch;
pub use dispatch::{
    extract, extract_app_bundle, extract_app_bundle_with_options, extract_path,
    extract_with_options,
};
pub mod error;
pub use error::{ErrorKind, ExtractError, Result};
pub mod io;
pub use io::{FileSource, HashingReader, InstallerSource};
mod ipa;
pub mod metadata;
pub use metadata::{Extension, InstallerMetadata, Sha256Digest};
pub mod msi;
mod normalize;
pub mod options;
pub use options::ExtractOptions;
pub mod pe;
mod pkg;
mod rpm;
pub mod sniff;
mod tarball;

#[cfg(test)]
mod testutil;
