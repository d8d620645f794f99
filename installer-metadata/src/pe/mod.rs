// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Windows executable (`.exe`) extraction.

Installer executables describe themselves with a `VS_VERSIONINFO` resource.
Only the PE headers and the resource section are read.
*/

pub mod resources;
pub mod version_info;

use {
    crate::{
        error::{ExtractError, Result},
        metadata::{ExtractedMetadata, Extension},
        options::ExtractOptions,
    },
    goblin::pe::{
        header::{Header, PE_MAGIC, SIZEOF_COFF_HEADER, SIZEOF_PE_MAGIC},
        section_table::SectionTable,
    },
    log::{debug, warn},
    resources::{ResourceSection, RT_VERSION},
    std::{
        fs::File,
        io::{Read, Seek, SeekFrom},
        path::Path,
    },
    thiserror::Error,
    version_info::VersionInfo,
};

/// Number of leading bytes read to parse headers and the section table.
const HEADER_READ_SIZE: u64 = 64 * 1024;

const RESOURCE_SECTION_NAME: &str = ".rsrc";

#[derive(Debug, Error)]
pub enum PeError {
    #[error("PE parsing error: {0}")]
    Goblin(#[from] goblin::error::Error),

    #[error("data parsing error: {0}")]
    Scroll(#[from] scroll::Error),

    #[error("bad PE signature {0:#x}")]
    BadSignature(u32),

    #[error("resource section extends past end of file")]
    TruncatedResources,

    #[error("resource tree: {0}")]
    ResourceTree(String),

    #[error("version information: {0}")]
    VersionInfo(String),
}

pub type PeResult<T> = std::result::Result<T, PeError>;

impl From<PeError> for ExtractError {
    fn from(e: PeError) -> Self {
        ExtractError::malformed(Extension::Exe, e)
    }
}

/// Locate the section holding resources and the root directory offset within it.
fn find_resource_section(header: &Header, sections: &[SectionTable]) -> Option<(SectionTable, usize)> {
    let rva = header
        .optional_header
        .and_then(|optional| *optional.data_directories.get_resource_table())
        .map(|dir| dir.virtual_address)
        .filter(|rva| *rva != 0);

    if let Some(rva) = rva {
        let section = sections.iter().find(|section| {
            let size = std::cmp::max(section.virtual_size, section.size_of_raw_data);
            rva >= section.virtual_address && rva - section.virtual_address < size
        });

        if let Some(section) = section {
            return Some((section.clone(), (rva - section.virtual_address) as usize));
        }
    }

    sections
        .iter()
        .find(|section| matches!(section.name(), Ok(RESOURCE_SECTION_NAME)))
        .map(|section| (section.clone(), 0))
}

/// Extract metadata from a PE image readable with random access.
pub(crate) fn extract_from_reader(
    reader: &mut (impl Read + Seek),
    file_size: u64,
) -> Result<ExtractedMetadata> {
    reader.seek(SeekFrom::Start(0))?;
    let mut header_data = vec![];
    Read::take(&mut *reader, HEADER_READ_SIZE).read_to_end(&mut header_data)?;

    let header = Header::parse(&header_data).map_err(PeError::from)?;
    if header.signature != PE_MAGIC {
        return Err(PeError::BadSignature(header.signature).into());
    }

    let mut offset = header.dos_header.pe_pointer as usize
        + SIZEOF_PE_MAGIC
        + SIZEOF_COFF_HEADER
        + header.coff_header.size_of_optional_header as usize;
    let sections = header
        .coff_header
        .sections(&header_data, &mut offset)
        .map_err(PeError::from)?;

    let (section, root) = match find_resource_section(&header, &sections) {
        Some(v) => v,
        None => {
            warn!("PE image has no resource section");
            return Ok(ExtractedMetadata::default());
        }
    };
    debug!(
        "reading {} byte resource section at {:#x}",
        section.size_of_raw_data, section.pointer_to_raw_data
    );

    let start = section.pointer_to_raw_data as u64;
    let size = section.size_of_raw_data as u64;
    if start + size > file_size {
        return Err(PeError::TruncatedResources.into());
    }

    let mut section_data = vec![0u8; size as usize];
    reader.seek(SeekFrom::Start(start))?;
    reader.read_exact(&mut section_data)?;

    let resources = ResourceSection::new(&section_data, section.virtual_address, root);

    let version_data = match resources.find_first(RT_VERSION)? {
        Some(data) => data,
        None => {
            warn!("PE image has no version resource");
            return Ok(ExtractedMetadata::default());
        }
    };

    let info = VersionInfo::parse(version_data)?;

    let version = info
        .string("ProductVersion")
        .or_else(|| info.string("FileVersion"))
        .map(|s| s.to_string())
        .or_else(|| info.fixed.and_then(|fixed| fixed.product_version()))
        .or_else(|| info.fixed.and_then(|fixed| fixed.file_version()))
        .unwrap_or_default();

    let name = info
        .string("ProductName")
        .or_else(|| info.string("FileDescription"))
        .unwrap_or_default()
        .to_string();

    Ok(ExtractedMetadata {
        name,
        version,
        ..Default::default()
    })
}

/// Extract metadata from the PE file at a path.
pub(crate) fn extract(path: &Path, options: &ExtractOptions) -> Result<ExtractedMetadata> {
    let mut file = File::open(path)?;
    let file_size = file.metadata()?.len();

    if file_size > options.max_random_access_size {
        return Err(ExtractError::too_large());
    }

    extract_from_reader(&mut file, file_size)
}
