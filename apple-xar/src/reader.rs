// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::{
        format::XarHeader,
        table_of_contents::{File, FileData, TableOfContents},
        Error, XarResult,
    },
    log::debug,
    scroll::IOread,
    std::io::{self, Read},
};

/// Upper bound on the decompressed size of a table of contents.
pub const MAX_TOC_SIZE: u64 = 64 * 1024 * 1024;

/// Forward-only reader of a single XAR archive.
///
/// The reader never seeks. File data must be requested in increasing heap
/// offset order, which is the order in which tools write it.
#[derive(Debug)]
pub struct XarReader<R: Read> {
    /// Reader of raw XAR archive content.
    reader: R,

    /// Parsed file header.
    header: XarHeader,

    /// Parsed table of contents.
    toc: TableOfContents,

    /// Current offset of `reader` relative to the start of the heap.
    heap_position: u64,
}

impl<R: Read> XarReader<R> {
    /// Construct a new XAR reader from a stream reader.
    ///
    /// Consumes the header and the table of contents. On return the
    /// stream is positioned at the start of the heap.
    pub fn new(mut reader: R) -> XarResult<Self> {
        let header = reader.ioread_with::<XarHeader>(scroll::BE)?;
        header.validate()?;

        skip_exact(&mut reader, header.extra_size())?;

        // serde_xml_rs takes ownership of its reader, so the decompressed
        // table of contents is buffered before being handed to the parser.
        let compressed = header.toc_length_compressed as u64;
        let mut toc_reader = flate2::read::ZlibDecoder::new(reader.by_ref().take(compressed));

        let capacity = std::cmp::min(header.toc_length_uncompressed as u64, MAX_TOC_SIZE);
        let mut toc_data = Vec::with_capacity(capacity as usize);
        toc_reader
            .by_ref()
            .take(MAX_TOC_SIZE + 1)
            .read_to_end(&mut toc_data)?;
        if toc_data.len() as u64 > MAX_TOC_SIZE {
            return Err(Error::TocTooLarge(MAX_TOC_SIZE));
        }

        // The zlib stream may end before the declared compressed length.
        let mut remaining = toc_reader.into_inner();
        io::copy(&mut remaining, &mut io::sink())?;
        if remaining.limit() != 0 {
            return Err(Error::Io(io::ErrorKind::UnexpectedEof.into()));
        }

        let toc = TableOfContents::from_reader(io::Cursor::new(toc_data))?;

        debug!(
            "parsed XAR table of contents ({} compressed bytes, {} root entries)",
            compressed,
            toc.root_entries().len()
        );

        Ok(Self {
            reader,
            header,
            toc,
            heap_position: 0,
        })
    }

    /// Obtain the inner reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Obtain the parsed [XarHeader] file header.
    pub fn header(&self) -> &XarHeader {
        &self.header
    }

    /// Obtain the table of contents for this archive.
    pub fn table_of_contents(&self) -> &TableOfContents {
        &self.toc
    }

    /// Current read position relative to the start of the heap.
    pub fn heap_position(&self) -> u64 {
        self.heap_position
    }

    /// Attempt to find the [File] entry for a given path in the archive.
    pub fn find_file(&self, filename: &str) -> XarResult<Option<File>> {
        Ok(self.toc.find(filename)?.cloned())
    }

    /// Advance the stream to a heap offset.
    fn seek_heap_forward(&mut self, offset: u64) -> XarResult<()> {
        if offset < self.heap_position {
            return Err(Error::Unsupported("reading heap data out of order"));
        }

        skip_exact(&mut self.reader, offset - self.heap_position)?;
        self.heap_position = offset;

        Ok(())
    }

    /// Read the raw heap bytes backing a file.
    ///
    /// The returned data is possibly encoded. `limit` bounds the number of
    /// bytes buffered.
    pub fn read_file_data_heap(&mut self, file: &File, limit: u64) -> XarResult<Vec<u8>> {
        let data = file.data.as_ref().ok_or(Error::FileNoData)?;

        if data.length > limit {
            return Err(Error::FileTooLarge(limit));
        }

        self.seek_heap_forward(data.offset)?;

        let mut buffer = vec![0; data.length as usize];
        self.reader.read_exact(&mut buffer)?;
        self.heap_position += data.length;

        Ok(buffer)
    }

    /// Read and decode the content of a file.
    ///
    /// Both the archived and the decoded sizes are bounded by `limit`.
    pub fn read_file_data_decoded(&mut self, file: &File, limit: u64) -> XarResult<Vec<u8>> {
        let raw = self.read_file_data_heap(file, limit)?;
        let data = file.data.as_ref().ok_or(Error::FileNoData)?;

        decode_file_data(data, &raw, limit)
    }

    /// Resolve decoded data for a given path.
    pub fn get_file_data_from_path(
        &mut self,
        path: &str,
        limit: u64,
    ) -> XarResult<Option<Vec<u8>>> {
        if let Some(file) = self.find_file(path)? {
            Ok(Some(self.read_file_data_decoded(&file, limit)?))
        } else {
            Ok(None)
        }
    }
}

/// Decode archived file data according to its declared encoding.
pub fn decode_file_data(data: &FileData, raw: &[u8], limit: u64) -> XarResult<Vec<u8>> {
    let mut reader = match data.encoding.style.as_str() {
        "application/octet-stream" => Box::new(raw) as Box<dyn Read + '_>,
        "application/x-bzip2" => Box::new(bzip2::read::BzDecoder::new(raw)) as Box<dyn Read + '_>,
        // The media type is arguably wrong, as there is no gzip header.
        "application/x-gzip" => {
            Box::new(flate2::read::ZlibDecoder::new(raw)) as Box<dyn Read + '_>
        }
        "application/x-lzma" => Box::new(xz2::read::XzDecoder::new(raw)) as Box<dyn Read + '_>,
        encoding => {
            return Err(Error::UnimplementedFileEncoding(encoding.to_string()));
        }
    };

    let mut buffer = Vec::with_capacity(std::cmp::min(data.size, limit) as usize);
    reader.by_ref().take(limit + 1).read_to_end(&mut buffer)?;

    if buffer.len() as u64 > limit {
        return Err(Error::FileTooLarge(limit));
    }

    Ok(buffer)
}

/// Discard exactly `count` bytes from a reader.
fn skip_exact(reader: &mut impl Read, count: u64) -> io::Result<()> {
    let skipped = io::copy(&mut reader.take(count), &mut io::sink())?;

    if skipped != count {
        Err(io::ErrorKind::UnexpectedEof.into())
    } else {
        Ok(())
    }
}
