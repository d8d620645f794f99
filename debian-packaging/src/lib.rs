// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Debian packaging primitives.

Readers for the pieces of Debian binary packages needed to identify them.

# Scope

This crate is concerned with reading metadata out of binary package `.deb` files
as they stream by. Nothing is written and nothing is seeked, so a `.deb` can be
inspected while it is being hashed or downloaded.

# A Tour of Functionality

A `.deb` file defines a Debian package. To read the control metadata of a `.deb` defining a
binary package, use [deb::reader::BinaryPackageReader].

Package metadata lives in a *control file*: blank line separated stanzas of
`Name: value` fields. [control::ControlParagraph] holds one stanza and
[control::Stanzas] iterates over the stanzas of a control file's text.

[io] defines I/O helpers, notably transparent decompression of archive members
based on their file extension.
*/

pub mod control;
pub mod deb;
pub mod error;
pub mod io;
