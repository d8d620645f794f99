// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Extraction entry points.

use {
    crate::{
        app_bundle, deb,
        error::{ExtractError, Result},
        io::{peek_prefix, FileSource, HashingReader, InstallerSource},
        ipa,
        metadata::{ExtractedMetadata, Extension, InstallerMetadata, Sha256Digest},
        msi,
        normalize::normalize,
        options::ExtractOptions,
        pe, pkg, rpm,
        sniff::{is_app_bundle_path, sniff, Format},
        tarball,
    },
    log::debug,
    std::{
        io::{Read, Seek, SeekFrom},
        path::Path,
    },
};

/// Extract metadata from an installer with default options.
///
/// The source is read to its end so the digest covers all content, and it is
/// rewound before returning.
pub fn extract<S: InstallerSource + ?Sized>(source: &mut S) -> Result<InstallerMetadata> {
    extract_with_options(source, &ExtractOptions::default())
}

/// Extract metadata from an installer.
///
/// The source is rewound before returning, whether or not extraction succeeded.
pub fn extract_with_options<S: InstallerSource + ?Sized>(
    source: &mut S,
    options: &ExtractOptions,
) -> Result<InstallerMetadata> {
    let res = extract_source(source, options);
    let rewind = source.seek(SeekFrom::Start(0));

    match (res, rewind) {
        (Ok(metadata), Ok(_)) => Ok(metadata),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), _) => Err(e),
    }
}

/// Extract metadata from an application bundle directory.
///
/// No content is hashed. The digest of the result is all zeros.
pub fn extract_app_bundle(path: impl AsRef<Path>) -> Result<InstallerMetadata> {
    extract_app_bundle_with_options(path, &ExtractOptions::default())
}

/// Extract metadata from an application bundle directory with explicit options.
pub fn extract_app_bundle_with_options(
    path: impl AsRef<Path>,
    options: &ExtractOptions,
) -> Result<InstallerMetadata> {
    let path = path.as_ref();
    debug!("extracting application bundle {}", path.display());

    let extracted = app_bundle::extract(path, options)?;

    Ok(normalize(extracted, Extension::App, Sha256Digest::default()))
}

/// Extract metadata from a filesystem path.
///
/// `.app` directories are handled as application bundles. Anything else is
/// opened and read as a stream.
pub fn extract_path(path: impl AsRef<Path>, options: &ExtractOptions) -> Result<InstallerMetadata> {
    let path = path.as_ref();

    if is_app_bundle_path(path) {
        extract_app_bundle_with_options(path, options)
    } else {
        let mut source = FileSource::open(path)?;
        extract_with_options(&mut source, options)
    }
}

/// Run a streaming extractor over the hashing reader.
///
/// Errors are reported as I/O errors when reading the source failed.
fn run_streaming<R: Read>(
    tee: &mut HashingReader<R>,
    extractor: impl FnOnce(&mut HashingReader<R>) -> Result<ExtractedMetadata>,
) -> Result<ExtractedMetadata> {
    extractor(&mut *tee).map_err(|e| match tee.take_source_error() {
        Some(source_error) => ExtractError::Io(source_error),
        None => e,
    })
}

fn finish_streaming<R: Read>(
    mut tee: HashingReader<R>,
    extracted: ExtractedMetadata,
    extension: Extension,
) -> Result<InstallerMetadata> {
    let drained = tee.drain()?;
    debug!("drained {} trailing bytes", drained);

    let (_, sha256) = tee.finish();

    Ok(normalize(extracted, extension, sha256))
}

fn extract_source<S: InstallerSource + ?Sized>(
    source: &mut S,
    options: &ExtractOptions,
) -> Result<InstallerMetadata> {
    let prefix = peek_prefix(source)?;
    let format = sniff(&prefix);
    debug!("sniffed format {:?} from {} byte prefix", format, prefix.len());

    let path = source.path().to_path_buf();
    let mut tee = HashingReader::new(&mut *source);

    match format {
        Format::Xar => {
            let extracted = run_streaming(&mut tee, |r| pkg::extract(r, options))?;
            finish_streaming(tee, extracted, Extension::Pkg)
        }
        Format::Deb => {
            let extracted = run_streaming(&mut tee, |r| deb::extract(r, options))?;
            finish_streaming(tee, extracted, Extension::Deb)
        }
        Format::Rpm => {
            let extracted = run_streaming(&mut tee, |r| rpm::extract(r, options))?;
            finish_streaming(tee, extracted, Extension::Rpm)
        }
        Format::Msi | Format::Pe | Format::Zip => {
            // Hash everything up front. These extractors open the file themselves.
            let size = tee.drain()?;
            let (_, sha256) = tee.finish();
            debug!("hashed {} bytes before random access extraction", size);

            let (extracted, extension) = match format {
                Format::Msi => (msi::extract(&path, options)?, Extension::Msi),
                Format::Pe => (pe::extract(&path, options)?, Extension::Exe),
                _ => match ipa::extract(&path, options)? {
                    Some(extracted) => (extracted, Extension::Ipa),
                    None => {
                        debug!("zip archive is not an application archive");
                        return Err(ExtractError::UnsupportedFormat { sha256 });
                    }
                },
            };

            Ok(normalize(extracted, extension, sha256))
        }
        Format::Gzip | Format::Unknown => {
            let probe = tarball::extract(&mut tee);
            if let Some(source_error) = tee.take_source_error() {
                return Err(source_error.into());
            }

            tee.drain()?;
            let (_, sha256) = tee.finish();

            match probe {
                Ok(extracted) => Ok(normalize(extracted, Extension::TarGz, sha256)),
                Err(e) => {
                    debug!("not a tarball: {}", e);
                    Err(ExtractError::UnsupportedFormat { sha256 })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            error::ErrorKind,
            testutil::{
                build_deb, build_msi, build_pe, build_rpm, build_tar_gz, build_version_info,
                build_xar, build_zip, info_plist_xml, MsiFixture,
            },
        },
        sha2::{Digest, Sha256},
        std::{
            io::{self, Cursor},
            path::PathBuf,
        },
        tempfile::TempDir,
    };

    fn temp_dir() -> io::Result<TempDir> {
        tempfile::Builder::new()
            .prefix("installer-metadata-")
            .tempdir()
    }

    fn sha256(data: &[u8]) -> Sha256Digest {
        Sha256Digest::new(Sha256::digest(data).into())
    }

    fn write_source(td: &TempDir, name: &str, data: &[u8]) -> io::Result<FileSource> {
        let path = td.path().join(name);
        std::fs::write(&path, data)?;

        FileSource::open(path)
    }

    fn corpus() -> Vec<(&'static str, Vec<u8>)> {
        vec![
            (
                "foo.pkg",
                build_xar(&[(
                    "PackageInfo",
                    r#"<pkg-info identifier="com.example.foo" version="1.2.3" title="Foo"/>"#,
                )]),
            ),
            (
                "hello.msi",
                build_msi(&MsiFixture {
                    subject: Some("Hello Subject"),
                    title: Some("Installation Database"),
                    revision: None,
                    properties: vec![
                        ("ProductName", "Hello"),
                        ("ProductVersion", "2.0.0.0"),
                        ("ProductCode", "{11111111-2222-3333-4444-555555555555}"),
                    ],
                }),
            ),
            (
                "setup.exe",
                build_pe(Some(build_version_info(
                    None,
                    &[("ProductName", "Hello world"), ("ProductVersion", "1.0.0")],
                ))),
            ),
            ("foobar.deb", build_deb(".zst", "Package: foobar\nVersion: 1.2.3\n")),
            ("foobar.rpm", build_rpm("foobar", "1.2.3")),
            (
                "foo.ipa",
                build_zip(&[(
                    "Payload/Foo.app/Info.plist",
                    info_plist_xml(&[
                        ("CFBundleIdentifier", "com.example.foo"),
                        ("CFBundleName", "Foo"),
                        ("CFBundleShortVersionString", "3.4"),
                    ])
                    .as_slice(),
                )]),
            ),
            ("foo.tar.gz", build_tar_gz(&[("foo/README", b"hello".as_ref())])),
            ("foo.zip", build_zip(&[("README", b"hello".as_ref())])),
            ("notes.txt", b"not a pkg\n".to_vec()),
            ("empty", vec![]),
        ]
    }

    fn check(
        metadata: &InstallerMetadata,
        extension: Extension,
        name: &str,
        version: &str,
        package_ids: &[&str],
        bundle_identifier: &str,
    ) {
        assert_eq!(metadata.extension, extension);
        assert_eq!(metadata.name, name);
        assert_eq!(metadata.version, version);
        assert_eq!(metadata.package_ids, package_ids);
        assert_eq!(metadata.bundle_identifier, bundle_identifier);
    }

    #[test]
    fn scenarios() -> Result<()> {
        let td = temp_dir()?;
        let corpus = corpus();
        let input = |name: &str| -> Result<FileSource> {
            let data = &corpus
                .iter()
                .find(|(n, _)| *n == name)
                .ok_or_else(|| ExtractError::Internal(name.to_string()))?
                .1;

            Ok(write_source(&td, name, data)?)
        };

        let metadata = extract(&mut input("foo.pkg")?)?;
        check(&metadata, Extension::Pkg, "Foo", "1.2.3", &["com.example.foo"], "");

        let metadata = extract(&mut input("hello.msi")?)?;
        check(
            &metadata,
            Extension::Msi,
            "Hello",
            "2.0.0.0",
            &["{11111111-2222-3333-4444-555555555555}"],
            "",
        );

        let metadata = extract(&mut input("setup.exe")?)?;
        check(&metadata, Extension::Exe, "Hello world", "1.0.0", &["Hello world"], "");

        let metadata = extract(&mut input("foobar.deb")?)?;
        check(&metadata, Extension::Deb, "foobar", "1.2.3", &["foobar"], "");

        let metadata = extract(&mut input("foobar.rpm")?)?;
        check(&metadata, Extension::Rpm, "foobar", "1.2.3", &["foobar"], "");

        let metadata = extract(&mut input("foo.ipa")?)?;
        check(
            &metadata,
            Extension::Ipa,
            "Foo",
            "3.4",
            &["com.example.foo"],
            "com.example.foo",
        );

        let err = extract(&mut input("notes.txt")?).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
        assert_eq!(err.sha256(), Some(&sha256(b"not a pkg\n")));

        let data = build_deb(".lz4", "Package: foobar\nVersion: 1.2.3\n");
        match extract(&mut write_source(&td, "lz4.deb", &data)?) {
            Err(ExtractError::MalformedInput { format, message }) => {
                assert_eq!(format, Extension::Deb);
                assert_eq!(message, "unrecognized compression on control.tar");
            }
            res => panic!("unexpected result: {:?}", res),
        }

        Ok(())
    }

    #[test]
    fn tarball_and_plain_zip() -> Result<()> {
        let td = temp_dir()?;

        let data = build_tar_gz(&[("foo/README", b"hello".as_ref())]);
        let metadata = extract(&mut write_source(&td, "foo.tar.gz", &data)?)?;
        check(&metadata, Extension::TarGz, "", "", &[], "");
        assert_eq!(metadata.sha256, sha256(&data));

        let data = build_zip(&[("README", b"hello".as_ref())]);
        let err = extract(&mut write_source(&td, "foo.zip", &data)?).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
        assert_eq!(err.sha256(), Some(&sha256(&data)));

        Ok(())
    }

    #[test]
    fn corpus_properties() -> Result<()> {
        let td = temp_dir()?;

        for (name, data) in corpus() {
            let mut source = write_source(&td, name, &data)?;
            let expected = sha256(&data);

            let first = extract(&mut source);
            // Rewound.
            assert_eq!(source.stream_position()?, 0, "{}", name);

            let digest = match &first {
                Ok(metadata) => metadata.sha256,
                Err(e) => *e.sha256().ok_or_else(|| ExtractError::Internal(e.to_string()))?,
            };
            assert_eq!(digest, expected, "{}", name);

            let second = extract(&mut source);
            match (&first, &second) {
                (Ok(a), Ok(b)) => assert_eq!(a, b, "{}", name),
                (Err(a), Err(b)) => assert_eq!(a.to_string(), b.to_string(), "{}", name),
                _ => panic!("{} yielded different outcomes", name),
            }

            if let Ok(metadata) = first {
                if !metadata.bundle_identifier.is_empty() {
                    assert_eq!(metadata.package_ids, vec![metadata.bundle_identifier.clone()]);
                }
                assert!(metadata.package_ids.iter().all(|id| !id.is_empty()), "{}", name);
            }
        }

        Ok(())
    }

    #[test]
    fn rewinds_after_partial_read() -> Result<()> {
        let td = temp_dir()?;
        let data = build_rpm("foobar", "1.2.3");
        let mut source = write_source(&td, "foobar.rpm", &data)?;

        source.seek(SeekFrom::Start(10))?;
        let metadata = extract(&mut source)?;
        assert_eq!(metadata.name, "foobar");
        assert_eq!(metadata.sha256, sha256(&data));
        assert_eq!(source.stream_position()?, 0);

        Ok(())
    }

    /// A source whose reads fail past an offset.
    struct FailingSource {
        inner: Cursor<Vec<u8>>,
        fail_at: u64,
        path: PathBuf,
    }

    impl Read for FailingSource {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.inner.position() >= self.fail_at {
                return Err(io::Error::new(io::ErrorKind::Other, "device went away"));
            }

            let available = (self.fail_at - self.inner.position()) as usize;
            let len = std::cmp::min(buf.len(), available);
            self.inner.read(&mut buf[..len])
        }
    }

    impl Seek for FailingSource {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    impl InstallerSource for FailingSource {
        fn path(&self) -> &Path {
            &self.path
        }
    }

    #[test]
    fn source_errors_are_io() {
        for data in [
            build_deb(".gz", "Package: foobar\nVersion: 1.2.3\n"),
            build_rpm("foobar", "1.2.3"),
            build_xar(&[(
                "PackageInfo",
                r#"<pkg-info identifier="com.example.foo" version="1.2.3"/>"#,
            )]),
            b"not a pkg\n but a bit longer than the prefix".to_vec(),
        ] {
            let fail_at = data.len() as u64 - 1;
            let mut source = FailingSource {
                inner: Cursor::new(data),
                fail_at,
                path: PathBuf::from("/nonexistent"),
            };

            let err = extract(&mut source).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Io, "{}", err);
            assert_eq!(source.inner.position(), 0);
        }
    }

    #[test]
    fn app_bundles() -> Result<()> {
        let td = temp_dir()?;
        let bundle = td.path().join("Hello.app");
        std::fs::create_dir_all(bundle.join("Contents"))?;
        std::fs::write(
            bundle.join("Contents").join("Info.plist"),
            info_plist_xml(&[
                ("CFBundleIdentifier", "com.example.hello"),
                ("CFBundleName", "hello"),
                ("CFBundleDisplayName", "Hello"),
                ("CFBundleShortVersionString", "1.0"),
            ]),
        )?;

        let metadata = extract_app_bundle(&bundle)?;
        check(
            &metadata,
            Extension::App,
            "Hello",
            "1.0",
            &["com.example.hello"],
            "com.example.hello",
        );
        assert!(metadata.sha256.is_zero());

        assert_eq!(extract_path(&bundle, &ExtractOptions::default())?, metadata);

        let rpm = td.path().join("foobar.rpm");
        std::fs::write(&rpm, build_rpm("foobar", "1.2.3"))?;
        assert_eq!(
            extract_path(&rpm, &ExtractOptions::default())?.extension,
            Extension::Rpm
        );

        Ok(())
    }

    #[test]
    fn random_access_cap() -> Result<()> {
        let td = temp_dir()?;
        let data = build_pe(None);
        let mut source = write_source(&td, "setup.exe", &data)?;

        let options = ExtractOptions::default().set_max_random_access_size(64);
        let err = extract_with_options(&mut source, &options).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("input too large"));

        Ok(())
    }
}
