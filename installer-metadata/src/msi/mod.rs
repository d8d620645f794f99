// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Windows Installer (`.msi`) extraction.

An MSI is a relational database serialized into a compound file. Product
metadata comes from two places: the summary information property set and
the `Property` table.
*/

pub mod cfb;
pub mod stream_name;
pub mod summary;
pub mod tables;

use {
    crate::{
        error::{ExtractError, Result},
        io::read_file_bounded,
        metadata::{ExtractedMetadata, Extension},
        options::ExtractOptions,
    },
    cfb::CompoundFile,
    log::{debug, warn},
    std::{collections::HashMap, path::Path},
    summary::{SummaryInformation, SUMMARY_INFORMATION_STREAM},
    tables::{StringPool, PROPERTY_TABLE_STREAM, STRING_DATA_STREAM, STRING_POOL_STREAM},
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum MsiError {
    #[error("data parsing error: {0}")]
    Scroll(#[from] scroll::Error),

    #[error("not a compound file")]
    BadSignature,

    #[error("unsupported compound file version {0}")]
    UnsupportedVersion(u16),

    #[error("bad byte order mark {0:#x}")]
    BadByteOrder(u16),

    #[error("sector {0} is out of bounds")]
    BadSector(u32),

    #[error("sector chain starting at {0} does not terminate")]
    ChainCycle(u32),

    #[error("stream {0} is truncated")]
    TruncatedStream(String),

    #[error("invalid directory entry {0}")]
    BadDirectoryEntry(u32),

    #[error("directory tree contains a cycle")]
    DirectoryCycle,

    #[error("compound file has no root entry")]
    NoRootEntry,

    #[error("summary information: {0}")]
    SummaryInformation(String),

    #[error("string pool: {0}")]
    StringPool(String),

    #[error("Property table: {0}")]
    PropertyTable(String),
}

pub type MsiResult<T> = std::result::Result<T, MsiError>;

impl From<MsiError> for ExtractError {
    fn from(e: MsiError) -> Self {
        ExtractError::malformed(Extension::Msi, e)
    }
}

fn read_named_stream(cfb: &CompoundFile, name: &str) -> MsiResult<Option<Vec<u8>>> {
    match cfb.find_stream(name)? {
        Some(entry) => Ok(Some(cfb.read_stream(entry)?)),
        None => Ok(None),
    }
}

/// Read the `Property` table, if the database has one.
fn read_properties(cfb: &CompoundFile) -> MsiResult<HashMap<String, String>> {
    let pool = read_named_stream(cfb, STRING_POOL_STREAM)?;
    let data = read_named_stream(cfb, STRING_DATA_STREAM)?;
    let table = read_named_stream(cfb, PROPERTY_TABLE_STREAM)?;

    match (pool, data, table) {
        (Some(pool), Some(data), Some(table)) => {
            let pool = StringPool::parse(&pool, &data)?;
            debug!("MSI string pool codepage {}", pool.codepage());

            tables::parse_property_table(&table, &pool)
        }
        _ => {
            warn!("MSI database has no Property table");
            Ok(HashMap::new())
        }
    }
}

/// Extract metadata from an in-memory MSI database.
pub(crate) fn extract_from_bytes(data: &[u8]) -> MsiResult<ExtractedMetadata> {
    let cfb = CompoundFile::parse(data)?;

    let summary = match read_named_stream(&cfb, SUMMARY_INFORMATION_STREAM)? {
        Some(data) => SummaryInformation::parse(&data)?,
        None => {
            warn!("MSI database has no summary information");
            SummaryInformation::default()
        }
    };

    let mut properties = read_properties(&cfb)?;
    let mut property = |key: &str| properties.remove(key).filter(|v| !v.trim().is_empty());

    let name = property("ProductName")
        .or_else(|| summary.subject.clone().filter(|v| !v.trim().is_empty()))
        .or_else(|| summary.title.clone())
        .unwrap_or_default();
    let version = property("ProductVersion")
        .or_else(|| summary.revision_number.clone())
        .unwrap_or_default();

    Ok(ExtractedMetadata {
        name,
        version,
        bundle_identifier: String::new(),
        package_ids: property("ProductCode").into_iter().collect(),
    })
}

/// Extract metadata from the MSI file at a path.
pub(crate) fn extract(path: &Path, options: &ExtractOptions) -> Result<ExtractedMetadata> {
    let data = read_file_bounded(path, options.max_random_access_size)?;

    Ok(extract_from_bytes(&data)?)
}
