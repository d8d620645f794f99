// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Interfaces for .deb package files.

The .deb format is documented at <https://manpages.debian.org/unstable/dpkg-dev/deb.5.en.html>.

A .deb is an `ar` archive whose first member is `debian-binary`, followed by
`control.tar[.<compression>]` holding package metadata and
`data.tar[.<compression>]` holding installed files.
*/

pub mod reader;
