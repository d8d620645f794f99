// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! XAR file format.

XAR archives consist of a fixed size header, a zlib compressed XML
*table of contents* and a *heap* holding file data. This crate reads
archives in a single forward pass: the header and table of contents are
decoded up front and file data is then pulled from the heap in increasing
offset order. This allows reading from non-seekable streams.
*/

pub mod format;
pub mod reader;
pub mod table_of_contents;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("(de)serialization error: {0}")]
    Scroll(#[from] scroll::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    SerdeXml(#[from] serde_xml_rs::Error),

    #[error("bad XAR magic: {0:#010x}")]
    BadMagic(u32),

    #[error("header size {0} is smaller than the fixed header")]
    BadHeaderSize(u16),

    #[error("unknown checksum algorithm: {0}")]
    UnknownChecksumAlgorithm(u32),

    #[error("invalid table of contents length: {0}")]
    BadTocLength(i64),

    #[error("table of contents exceeds {0} bytes")]
    TocTooLarge(u64),

    #[error("table of contents is corrupted: {0}")]
    TableOfContentsCorrupted(&'static str),

    #[error("File has no data")]
    FileNoData,

    #[error("file data exceeds {0} bytes")]
    FileTooLarge(u64),

    #[error("Unimplemented file encoding: {0}")]
    UnimplementedFileEncoding(String),

    #[error("Operation not supported: {0}")]
    Unsupported(&'static str),
}

pub type XarResult<T> = std::result::Result<T, Error>;
