// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Synthesized installer images for tests.

use {
    crate::msi::{
        cfb::{CFB_SIGNATURE, END_OF_CHAIN, FAT_SECTOR, FREE_SECTOR, NO_STREAM},
        stream_name::encode_stream_name,
        summary::{PID_REVNUMBER, PID_SUBJECT, PID_TITLE, SUMMARY_INFORMATION_STREAM},
    },
    std::io::{Cursor, Write},
};

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Build a XAR archive whose members are zlib encoded.
pub fn build_xar(members: &[(&str, &str)]) -> Vec<u8> {
    let mut heap = vec![];
    let mut toc = String::from("<?xml version=\"1.0\"?><xar><toc>");

    for (i, (name, content)) in members.iter().enumerate() {
        let archived = zlib(content.as_bytes());
        toc.push_str(&format!(
            "<file id=\"{}\"><name>{}</name><type>file</type><data>\
             <length>{}</length><offset>{}</offset><size>{}</size>\
             <encoding style=\"application/x-gzip\"/></data></file>",
            i + 1,
            name,
            archived.len(),
            heap.len(),
            content.len(),
        ));
        heap.extend(archived);
    }
    toc.push_str("</toc></xar>");

    let compressed = zlib(toc.as_bytes());

    let mut data = vec![];
    data.extend(b"xar!");
    data.extend(28u16.to_be_bytes());
    data.extend(1u16.to_be_bytes());
    data.extend((compressed.len() as i64).to_be_bytes());
    data.extend((toc.len() as i64).to_be_bytes());
    data.extend(0u32.to_be_bytes());
    data.extend(compressed);
    data.extend(heap);

    data
}

fn tar_archive(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());

    for (path, content) in members {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as _);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, path, *content).unwrap();
    }

    builder.into_inner().unwrap()
}

pub fn build_tar_gz(members: &[(&str, &[u8])]) -> Vec<u8> {
    gzip(&tar_archive(members))
}

/// Build a `.deb` whose control archive is compressed according to `extension`.
///
/// Unknown extensions leave the archive uncompressed.
pub fn build_deb(extension: &str, control: &str) -> Vec<u8> {
    let compress = |data: Vec<u8>| match extension {
        ".gz" => gzip(&data),
        ".zst" => zstd::encode_all(&data[..], 3).unwrap(),
        _ => data,
    };

    let control_tar = tar_archive(&[
        ("./md5sums", b"abcdef".as_ref()),
        ("./control", control.as_bytes()),
    ]);

    let members = [
        ("debian-binary".to_string(), b"2.0\n".to_vec()),
        (format!("control.tar{}", extension), compress(control_tar)),
        (format!("data.tar{}", extension), compress(vec![0; 1024])),
    ];

    let mut builder = ar::Builder::new(Vec::new());
    for (name, data) in &members {
        let mut header = ar::Header::new(name.as_bytes().to_vec(), data.len() as _);
        header.set_mode(0o644);
        builder.append(&header, &data[..]).unwrap();
    }

    builder.into_inner().unwrap()
}

fn rpm_header(entries: &[(u32, u32, u32)], store: &[u8]) -> Vec<u8> {
    let mut data = vec![];
    data.extend(0x8ead_e801u32.to_be_bytes());
    data.extend(0u32.to_be_bytes());
    data.extend((entries.len() as u32).to_be_bytes());
    data.extend((store.len() as u32).to_be_bytes());

    for (tag, value_type, offset) in entries {
        data.extend(tag.to_be_bytes());
        data.extend(value_type.to_be_bytes());
        data.extend(offset.to_be_bytes());
        data.extend(1u32.to_be_bytes());
    }
    data.extend(store);

    data
}

/// Build an RPM with a name and version and a small payload.
pub fn build_rpm(name: &str, version: &str) -> Vec<u8> {
    let mut data = vec![0xed, 0xab, 0xee, 0xdb, 3, 0, 0, 0, 0, 1];
    let mut lead_name = name.as_bytes().to_vec();
    lead_name.resize(66, 0);
    data.extend(lead_name);
    data.extend(1u16.to_be_bytes());
    data.extend(5u16.to_be_bytes());
    data.extend([0u8; 16]);
    assert_eq!(data.len(), 96);

    // Signature header holding a payload size, padded to 8 bytes.
    data.extend(rpm_header(&[(1000, 4, 0)], &32u32.to_be_bytes()));
    data.extend([0u8; 4]);

    let mut store = vec![];
    store.extend(name.as_bytes());
    store.push(0);
    let version_offset = store.len() as u32;
    store.extend(version.as_bytes());
    store.push(0);
    data.extend(rpm_header(&[(1000, 6, 0), (1001, 6, version_offset)], &store));

    data.extend(gzip(&[0u8; 32]));

    data
}

/// A stream to place in a compound file.
pub struct CfbStream {
    /// Raw directory entry name.
    pub name: Vec<u16>,
    pub data: Vec<u8>,
}

const SECTOR_SIZE: usize = 512;
const MINI_SECTOR_SIZE: usize = 64;
const MINI_STREAM_CUTOFF: usize = 4096;

fn sectors_for(len: usize, size: usize) -> usize {
    (len + size - 1) / size
}

fn push_u16(data: &mut Vec<u8>, v: u16) {
    data.extend(v.to_le_bytes());
}

fn push_u32(data: &mut Vec<u8>, v: u32) {
    data.extend(v.to_le_bytes());
}

fn directory_entry(name: &[u16], object_type: u8, right: u32, child: u32, start: u32, size: u64) -> Vec<u8> {
    let mut entry = vec![];
    for unit in name {
        push_u16(&mut entry, *unit);
    }
    entry.resize(64, 0);

    let name_len = if object_type == 0 { 0 } else { (name.len() + 1) * 2 };
    push_u16(&mut entry, name_len as u16);
    entry.push(object_type);
    entry.push(1);
    push_u32(&mut entry, NO_STREAM);
    push_u32(&mut entry, right);
    push_u32(&mut entry, child);
    entry.extend([0u8; 16]);
    push_u32(&mut entry, 0);
    entry.extend([0u8; 16]);
    push_u32(&mut entry, start);
    entry.extend(size.to_le_bytes());
    assert_eq!(entry.len(), 128);

    entry
}

/// Build a version 3 compound file holding streams below the root storage.
pub fn build_cfb(streams: &[CfbStream]) -> Vec<u8> {
    // Mini stream allocation.
    let mut mini_stream = vec![];
    let mut mini_fat: Vec<u32> = vec![];
    let mut starts = vec![END_OF_CHAIN; streams.len()];

    for (i, stream) in streams.iter().enumerate() {
        if stream.data.is_empty() || stream.data.len() >= MINI_STREAM_CUTOFF {
            continue;
        }

        let first = mini_fat.len() as u32;
        let count = sectors_for(stream.data.len(), MINI_SECTOR_SIZE);
        for j in 0..count {
            mini_fat.push(if j + 1 == count {
                END_OF_CHAIN
            } else {
                first + j as u32 + 1
            });
        }
        starts[i] = first;

        let mut data = stream.data.clone();
        data.resize(count * MINI_SECTOR_SIZE, 0);
        mini_stream.extend(data);
    }

    let directory_sectors = sectors_for((streams.len() + 1) * 128, SECTOR_SIZE);
    let mini_fat_sectors = sectors_for(mini_fat.len() * 4, SECTOR_SIZE);
    let mini_stream_sectors = sectors_for(mini_stream.len(), SECTOR_SIZE);
    let large_sectors = streams
        .iter()
        .filter(|s| s.data.len() >= MINI_STREAM_CUTOFF)
        .map(|s| sectors_for(s.data.len(), SECTOR_SIZE))
        .sum::<usize>();
    let content_sectors = directory_sectors + mini_fat_sectors + mini_stream_sectors + large_sectors;

    let mut fat_sectors = 1;
    while fat_sectors * SECTOR_SIZE / 4 < content_sectors + fat_sectors {
        fat_sectors += 1;
    }
    assert!(fat_sectors <= 109);

    let mut fat = vec![FAT_SECTOR; fat_sectors];
    let mut sectors: Vec<Vec<u8>> = vec![];

    let mut allocate = |fat: &mut Vec<u32>, data: &[u8]| -> u32 {
        let first = fat.len() as u32;
        let count = sectors_for(data.len(), SECTOR_SIZE);
        for j in 0..count {
            fat.push(if j + 1 == count {
                END_OF_CHAIN
            } else {
                first + j as u32 + 1
            });

            let end = std::cmp::min((j + 1) * SECTOR_SIZE, data.len());
            let mut sector = data[j * SECTOR_SIZE..end].to_vec();
            sector.resize(SECTOR_SIZE, 0);
            sectors.push(sector);
        }

        first
    };

    // Directory.
    let mut directory = directory_entry(
        &"Root Entry".encode_utf16().collect::<Vec<_>>(),
        5,
        NO_STREAM,
        if streams.is_empty() { NO_STREAM } else { 1 },
        if mini_stream.is_empty() {
            END_OF_CHAIN
        } else {
            (fat_sectors + directory_sectors + mini_fat_sectors) as u32
        },
        mini_stream.len() as u64,
    );

    let mut large_start = (fat_sectors + directory_sectors + mini_fat_sectors + mini_stream_sectors) as u32;
    for (i, stream) in streams.iter().enumerate() {
        let start = if stream.data.len() >= MINI_STREAM_CUTOFF {
            let start = large_start;
            large_start += sectors_for(stream.data.len(), SECTOR_SIZE) as u32;
            start
        } else {
            starts[i]
        };

        let right = if i + 1 == streams.len() {
            NO_STREAM
        } else {
            i as u32 + 2
        };

        directory.extend(directory_entry(
            &stream.name,
            2,
            right,
            NO_STREAM,
            start,
            stream.data.len() as u64,
        ));
    }
    while directory.len() < directory_sectors * SECTOR_SIZE {
        directory.extend(directory_entry(&[], 0, NO_STREAM, NO_STREAM, FREE_SECTOR, 0));
    }

    let first_directory = allocate(&mut fat, &directory);

    let first_mini_fat = if mini_fat.is_empty() {
        END_OF_CHAIN
    } else {
        let mut data = vec![];
        for v in &mini_fat {
            push_u32(&mut data, *v);
        }
        data.resize(mini_fat_sectors * SECTOR_SIZE, 0xff);
        allocate(&mut fat, &data)
    };

    if !mini_stream.is_empty() {
        allocate(&mut fat, &mini_stream);
    }

    for stream in streams {
        if stream.data.len() >= MINI_STREAM_CUTOFF {
            allocate(&mut fat, &stream.data);
        }
    }

    assert_eq!(fat.len(), fat_sectors + content_sectors);
    fat.resize(fat_sectors * SECTOR_SIZE / 4, FREE_SECTOR);

    let mut data = vec![];
    data.extend(CFB_SIGNATURE.to_le_bytes());
    data.extend([0u8; 16]);
    push_u16(&mut data, 0x3e);
    push_u16(&mut data, 3);
    push_u16(&mut data, 0xfffe);
    push_u16(&mut data, 9);
    push_u16(&mut data, 6);
    push_u16(&mut data, 0);
    push_u32(&mut data, 0);
    push_u32(&mut data, 0);
    push_u32(&mut data, fat_sectors as u32);
    push_u32(&mut data, first_directory);
    push_u32(&mut data, 0);
    push_u32(&mut data, MINI_STREAM_CUTOFF as u32);
    push_u32(&mut data, first_mini_fat);
    push_u32(&mut data, mini_fat_sectors as u32);
    push_u32(&mut data, END_OF_CHAIN);
    push_u32(&mut data, 0);
    for i in 0..109 {
        push_u32(&mut data, if i < fat_sectors { i as u32 } else { FREE_SECTOR });
    }
    assert_eq!(data.len(), SECTOR_SIZE);

    for v in fat {
        push_u32(&mut data, v);
    }
    for sector in sectors {
        data.extend(sector);
    }

    data
}

/// Build a summary information property set holding string properties.
pub fn build_summary_information(properties: &[(u32, &str)]) -> Vec<u8> {
    let mut values = vec![];
    let mut offsets = vec![];
    let values_start = 8 + properties.len() * 8;

    for (id, value) in properties {
        offsets.push((*id, (values_start + values.len()) as u32));

        push_u32(&mut values, 30);
        push_u32(&mut values, value.len() as u32 + 1);
        values.extend(value.as_bytes());
        values.push(0);
        while values.len() % 4 != 0 {
            values.push(0);
        }
    }

    let mut data = vec![];
    push_u16(&mut data, 0xfffe);
    push_u16(&mut data, 0);
    push_u32(&mut data, 0x0002_0006);
    data.extend([0u8; 16]);
    push_u32(&mut data, 1);
    data.extend([
        0xe0, 0x85, 0x9f, 0xf2, 0xf9, 0x4f, 0x68, 0x10, 0xab, 0x91, 0x08, 0x00, 0x2b, 0x27, 0xb3,
        0xd9,
    ]);
    push_u32(&mut data, 48);

    push_u32(&mut data, (values_start + values.len()) as u32);
    push_u32(&mut data, properties.len() as u32);
    for (id, offset) in offsets {
        push_u32(&mut data, id);
        push_u32(&mut data, offset);
    }
    data.extend(values);

    data
}

/// Build `_StringPool` and `_StringData` stream content.
pub fn build_string_pool(strings: &[&str], long_refs: bool) -> (Vec<u8>, Vec<u8>) {
    let mut pool = vec![];
    push_u32(&mut pool, 65001 | if long_refs { 0x8000_0000 } else { 0 });

    let mut data = vec![];
    for s in strings {
        let len = s.len();
        if len > 0xffff {
            push_u16(&mut pool, 0);
            push_u16(&mut pool, 1);
            push_u16(&mut pool, (len & 0xffff) as u16);
            push_u16(&mut pool, (len >> 16) as u16);
        } else {
            push_u16(&mut pool, len as u16);
            push_u16(&mut pool, if len == 0 { 0 } else { 1 });
        }
        data.extend(s.as_bytes());
    }

    (pool, data)
}

/// Build a `Property` table stream from string id pairs.
pub fn build_property_table(rows: &[(u32, u32)], reference_size: usize) -> Vec<u8> {
    let mut data = vec![];

    for id in rows.iter().map(|(k, _)| *k).chain(rows.iter().map(|(_, v)| *v)) {
        data.extend(&id.to_le_bytes()[..reference_size]);
    }

    data
}

/// Content of a synthesized Windows Installer database.
pub struct MsiFixture {
    pub subject: Option<&'static str>,
    pub title: Option<&'static str>,
    pub revision: Option<&'static str>,
    pub properties: Vec<(&'static str, &'static str)>,
}

pub fn build_msi(fixture: &MsiFixture) -> Vec<u8> {
    let mut streams = vec![];

    let summary = [
        (PID_TITLE, fixture.title),
        (PID_SUBJECT, fixture.subject),
        (PID_REVNUMBER, fixture.revision),
    ]
    .into_iter()
    .filter_map(|(id, value)| value.map(|v| (id, v)))
    .collect::<Vec<_>>();

    if !summary.is_empty() {
        streams.push(CfbStream {
            name: SUMMARY_INFORMATION_STREAM.encode_utf16().collect(),
            data: build_summary_information(&summary),
        });
    }

    if !fixture.properties.is_empty() {
        let strings = fixture
            .properties
            .iter()
            .flat_map(|(k, v)| [*k, *v])
            .collect::<Vec<_>>();
        let (pool, data) = build_string_pool(&strings, false);
        let rows = (0..fixture.properties.len() as u32)
            .map(|i| (i * 2 + 1, i * 2 + 2))
            .collect::<Vec<_>>();

        streams.push(CfbStream {
            name: encode_stream_name("_StringPool", true),
            data: pool,
        });
        streams.push(CfbStream {
            name: encode_stream_name("_StringData", true),
            data,
        });
        streams.push(CfbStream {
            name: encode_stream_name("Property", true),
            data: build_property_table(&rows, 2),
        });
    }

    // Stored in regular sectors.
    streams.push(CfbStream {
        name: encode_stream_name("Binary.Padding", false),
        data: vec![0x5a; 5000],
    });

    build_cfb(&streams)
}

fn version_node(key: &str, value_type: u16, value: &[u8], value_length: u16, children: &[Vec<u8>]) -> Vec<u8> {
    let pad = |data: &mut Vec<u8>| {
        while data.len() % 4 != 0 {
            data.push(0);
        }
    };

    let mut data = vec![0u8; 6];
    for unit in key.encode_utf16() {
        push_u16(&mut data, unit);
    }
    push_u16(&mut data, 0);
    pad(&mut data);
    data.extend(value);

    for child in children {
        pad(&mut data);
        data.extend(child);
    }

    let length = data.len() as u16;
    data[0..2].copy_from_slice(&length.to_le_bytes());
    data[2..4].copy_from_slice(&value_length.to_le_bytes());
    data[4..6].copy_from_slice(&value_type.to_le_bytes());

    data
}

/// Build a `VS_VERSIONINFO` resource.
///
/// `fixed` holds the most and least significant version words used for both
/// the file and product versions.
pub fn build_version_info(fixed: Option<(u32, u32)>, strings: &[(&str, &str)]) -> Vec<u8> {
    let fixed = match fixed {
        Some((ms, ls)) => {
            let mut data = vec![];
            for v in [0xfeef_04bd, 0x0001_0000, ms, ls, ms, ls, 0x3f, 0, 4, 1, 0, 0, 0] {
                push_u32(&mut data, v);
            }
            data
        }
        None => vec![],
    };

    let strings = strings
        .iter()
        .map(|(key, value)| {
            let mut encoded = vec![];
            for unit in value.encode_utf16().chain(std::iter::once(0)) {
                push_u16(&mut encoded, unit);
            }

            version_node(key, 1, &encoded, (encoded.len() / 2) as u16, &[])
        })
        .collect::<Vec<_>>();

    let table = version_node("040904b0", 1, &[], 0, &strings);
    let string_file_info = version_node("StringFileInfo", 1, &[], 0, &[table]);

    version_node(
        "VS_VERSION_INFO",
        0,
        &fixed,
        fixed.len() as u16,
        &[string_file_info],
    )
}

/// Build a resource section holding a single `RT_VERSION` resource.
pub fn build_resource_section(virtual_address: u32, resource: &[u8]) -> Vec<u8> {
    let mut data = vec![];

    let directory = |data: &mut Vec<u8>, id: u32, offset: u32| {
        data.extend([0u8; 12]);
        push_u16(data, 0);
        push_u16(data, 1);
        push_u32(data, id);
        push_u32(data, offset);
    };

    directory(&mut data, 16, 0x8000_0000 | 0x18);
    directory(&mut data, 1, 0x8000_0000 | 0x30);
    directory(&mut data, 0x409, 0x48);

    push_u32(&mut data, virtual_address + 0x58);
    push_u32(&mut data, resource.len() as u32);
    push_u32(&mut data, 0);
    push_u32(&mut data, 0);
    assert_eq!(data.len(), 0x58);

    data.extend(resource);

    data
}

/// Build a PE32 image with a single resource section at file offset 0x200.
pub fn build_pe(version_info: Option<Vec<u8>>) -> Vec<u8> {
    const RESOURCE_VA: u32 = 0x1000;

    let section = match version_info {
        Some(resource) => build_resource_section(RESOURCE_VA, &resource),
        // An empty root directory.
        None => vec![0u8; 16],
    };

    let mut data = vec![0u8; 0x80];
    data[0..2].copy_from_slice(b"MZ");
    data[0x3c..0x40].copy_from_slice(&0x80u32.to_le_bytes());

    data.extend(b"PE\0\0");

    // COFF header.
    push_u16(&mut data, 0x14c);
    push_u16(&mut data, 1);
    push_u32(&mut data, 0);
    push_u32(&mut data, 0);
    push_u32(&mut data, 0);
    push_u16(&mut data, 0xe0);
    push_u16(&mut data, 0x0102);

    // Optional header standard fields.
    push_u16(&mut data, 0x10b);
    data.extend([14, 0]);
    for _ in 0..6 {
        push_u32(&mut data, 0);
    }

    // Windows fields.
    push_u32(&mut data, 0x0040_0000);
    push_u32(&mut data, 0x1000);
    push_u32(&mut data, 0x200);
    for v in [6u16, 0, 0, 0, 6, 0] {
        push_u16(&mut data, v);
    }
    push_u32(&mut data, 0);
    push_u32(&mut data, 0x2000);
    push_u32(&mut data, 0x200);
    push_u32(&mut data, 0);
    push_u16(&mut data, 2);
    push_u16(&mut data, 0);
    for v in [0x10_0000u32, 0x1000, 0x10_0000, 0x1000, 0, 16] {
        push_u32(&mut data, v);
    }

    // Data directories. Index 2 is the resource table.
    for i in 0..16 {
        if i == 2 {
            push_u32(&mut data, RESOURCE_VA);
            push_u32(&mut data, section.len() as u32);
        } else {
            push_u32(&mut data, 0);
            push_u32(&mut data, 0);
        }
    }
    assert_eq!(data.len(), 0x178);

    // Section table.
    data.extend(b".rsrc\0\0\0");
    push_u32(&mut data, section.len() as u32);
    push_u32(&mut data, RESOURCE_VA);
    push_u32(&mut data, section.len() as u32);
    push_u32(&mut data, 0x200);
    push_u32(&mut data, 0);
    push_u32(&mut data, 0);
    push_u16(&mut data, 0);
    push_u16(&mut data, 0);
    push_u32(&mut data, 0x4000_0040);

    data.resize(0x200, 0);
    data.extend(section);

    data
}

/// Render an XML property list of string values.
pub fn info_plist_xml(values: &[(&str, &str)]) -> Vec<u8> {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!DOCTYPE plist PUBLIC \"-//Apple//DTD PLIST 1.0//EN\" \
         \"http://www.apple.com/DTDs/PropertyList-1.0.dtd\">\n\
         <plist version=\"1.0\">\n<dict>\n",
    );

    for (key, value) in values {
        xml.push_str(&format!(
            "    <key>{}</key>\n    <string>{}</string>\n",
            key, value
        ));
    }
    xml.push_str("</dict>\n</plist>\n");

    xml.into_bytes()
}

/// Build a zip archive of stored members.
pub fn build_zip(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (name, data) in members {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }

    writer.finish().unwrap().into_inner()
}
