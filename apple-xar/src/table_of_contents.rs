// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! XAR XML table of contents data structure.
//!
//! Only the elements needed to locate and decode file data are modeled.
//! Everything else in the XML (timestamps, ownership, signatures) is ignored.

use {
    crate::{Error, XarResult},
    serde::Deserialize,
    std::io::Read,
};

/// An XML table of contents in a XAR file.
///
/// The document root is `<xar>`, holding a single `<toc>`.
#[derive(Clone, Debug, Deserialize)]
pub struct TableOfContents {
    toc: Toc,
}

#[derive(Clone, Debug, Default, Deserialize)]
struct Toc {
    checksum: Option<Checksum>,
    #[serde(default, rename = "file")]
    entries: Vec<File>,
}

impl TableOfContents {
    /// Parse XML table of contents from a reader.
    pub fn from_reader(reader: impl Read) -> XarResult<Self> {
        Ok(serde_xml_rs::from_reader(reader)?)
    }

    /// Location of the archive checksum in the heap, if any.
    pub fn checksum(&self) -> Option<&Checksum> {
        self.toc.checksum.as_ref()
    }

    /// Entries at the root of the archive.
    pub fn root_entries(&self) -> &[File] {
        &self.toc.entries
    }

    /// Find an entry in the root directory of the archive.
    pub fn root_file(&self, name: &str) -> Option<&File> {
        self.toc
            .entries
            .iter()
            .find(|f| f.name().map_or(false, |n| n == name))
    }

    /// Every entry in the archive with its slash delimited path.
    ///
    /// Entries are ordered by their numeric id.
    pub fn files(&self) -> XarResult<Vec<(String, &File)>> {
        let mut pending = self
            .toc
            .entries
            .iter()
            .map(|f| (None, f))
            .collect::<Vec<(Option<String>, &File)>>();
        let mut files = vec![];

        while let Some((parent, file)) = pending.pop() {
            let path = match parent {
                Some(parent) => format!("{}/{}", parent, file.name()?),
                None => file.name()?.to_string(),
            };

            pending.extend(file.children.iter().map(|c| (Some(path.clone()), c)));
            files.push((path, file));
        }

        files.sort_by_key(|(_, f)| f.id);

        Ok(files)
    }

    /// Find an entry by its full path.
    pub fn find(&self, path: &str) -> XarResult<Option<&File>> {
        Ok(self
            .files()?
            .into_iter()
            .find_map(|(p, f)| (p == path).then(|| f)))
    }
}

/// Heap location of the archive checksum.
#[derive(Clone, Debug, Deserialize)]
pub struct Checksum {
    /// Digest name, e.g. `sha1`.
    pub style: String,
    pub offset: u64,
    pub size: u64,
}

/// A `<file>` record.
#[derive(Clone, Debug, Deserialize)]
pub struct File {
    pub id: u64,
    /// Some Apple tools emit more than one `<name>`. The last one wins.
    #[serde(default, rename = "name")]
    names: Vec<String>,
    #[serde(default, rename = "type")]
    pub file_type: FileType,
    pub data: Option<FileData>,
    #[serde(default, rename = "file")]
    children: Vec<File>,
}

impl File {
    pub fn name(&self) -> XarResult<&str> {
        self.names
            .last()
            .map(String::as_str)
            .ok_or(Error::TableOfContentsCorrupted("missing file name"))
    }

    /// Entries nested under this one, when it is a directory.
    pub fn children(&self) -> &[File] {
        &self.children
    }
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    File,
    Directory,
    HardLink,
    Link,
    Symlink,
    /// Devices, fifos, sockets and anything else, or a missing `<type>`.
    #[default]
    #[serde(other)]
    Other,
}

/// Location and encoding of a file's content in the heap.
#[derive(Clone, Debug, Deserialize)]
pub struct FileData {
    /// Offset of the archived bytes relative to the start of the heap.
    pub offset: u64,
    /// Size of the decoded content.
    pub size: u64,
    /// Size of the archived (possibly encoded) content.
    pub length: u64,
    pub encoding: FileEncoding,
}

#[derive(Clone, Debug, Deserialize)]
pub struct FileEncoding {
    /// Media type, e.g. `application/x-gzip`.
    pub style: String,
}
