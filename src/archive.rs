use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use tracing::debug;
use zip::ZipArchive;
use crate::error::{AddonError, Result};

/// Archive formats remote content may come in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
    Tar,
}

impl ArchiveKind {
    /// Guesses the format from a file name or URL. Anything unrecognised is
    /// treated as zip.
    pub fn detect(name: &str) -> ArchiveKind {
        let name = name.to_ascii_lowercase();
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            ArchiveKind::TarGz
        } else if name.ends_with(".tar") {
            ArchiveKind::Tar
        } else {
            ArchiveKind::Zip
        }
    }
}

/// Last path segment of `url`, without query or fragment.
pub fn archive_file_name(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let path = path.split_once("://").map(|(_, rest)| rest).unwrap_or(path);
    // first segment is the host
    match path.trim_end_matches('/').split('/').skip(1).last() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => "archive.zip".to_string(),
    }
}

/// Downloads `url` into the file `dest`.
///
/// # Errors
/// [`AddonError::RemoteContentFetch`] on network errors and non-success
/// status codes.
pub fn download(client: &Client, url: &str, dest: &Path) -> Result<()> {
    let fail = |reason: String| AddonError::RemoteContentFetch { url: url.to_string(), reason };
    debug!(url, dest = %dest.display(), "downloading");

    let mut response = client
        .get(url)
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(|e| fail(e.to_string()))?;
    let mut file = File::create(dest).map_err(|e| fail(format!("{}: {}", dest.display(), e)))?;
    let bytes = response.copy_to(&mut file).map_err(|e| fail(e.to_string()))?;
    debug!(url, bytes, "download finished");
    Ok(())
}

/// Unpacks `archive` into `dest`, creating `dest` if needed.
///
/// Entries that would land outside `dest` are refused by the underlying
/// archive readers.
pub fn extract(archive: &Path, dest: &Path) -> Result<()> {
    let fail = |reason: String| AddonError::Extract { archive: archive.to_path_buf(), reason };
    fs::create_dir_all(dest).map_err(|e| AddonError::io(dest, e))?;
    let file = File::open(archive).map_err(|e| fail(e.to_string()))?;
    let name = archive.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();

    match ArchiveKind::detect(&name) {
        ArchiveKind::Zip => {
            let mut zip = ZipArchive::new(BufReader::new(file)).map_err(|e| fail(e.to_string()))?;
            zip.extract(dest).map_err(|e| fail(e.to_string()))?;
        }
        ArchiveKind::TarGz => {
            tar::Archive::new(GzDecoder::new(BufReader::new(file)))
                .unpack(dest)
                .map_err(|e| fail(e.to_string()))?;
        }
        ArchiveKind::Tar => {
            tar::Archive::new(BufReader::new(file))
                .unpack(dest)
                .map_err(|e| fail(e.to_string()))?;
        }
    }
    debug!(archive = %archive.display(), dest = %dest.display(), "extracted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        zip.start_file("models/readme.txt", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"hello").unwrap();
        zip.finish().unwrap();
    }

    #[test]
    fn test_detect() {
        assert_eq!(ArchiveKind::detect("data.zip"), ArchiveKind::Zip);
        assert_eq!(ArchiveKind::detect("DATA.TAR.GZ"), ArchiveKind::TarGz);
        assert_eq!(ArchiveKind::detect("data.tgz"), ArchiveKind::TarGz);
        assert_eq!(ArchiveKind::detect("data.tar"), ArchiveKind::Tar);
        assert_eq!(ArchiveKind::detect("download"), ArchiveKind::Zip);
    }

    #[test]
    fn test_archive_file_name() {
        assert_eq!(archive_file_name("https://x.org/a/data.tar.gz?dl=1"), "data.tar.gz");
        assert_eq!(archive_file_name("https://x.org/a/data.zip"), "data.zip");
        assert_eq!(archive_file_name("https://x.org/"), "archive.zip");
    }

    #[test]
    fn test_extract_zip() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("content.zip");
        write_zip(&archive);
        let dest = dir.path().join("out");
        extract(&archive, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("models").join("readme.txt")).unwrap(), "hello");
    }

    #[test]
    fn test_extract_tar_gz() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("content.tar.gz");
        let mut builder = tar::Builder::new(GzEncoder::new(
            File::create(&archive).unwrap(),
            Compression::default(),
        ));
        let data = b"tar content";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, "scene/info.txt", &data[..]).unwrap();
        builder.into_inner().unwrap().finish().unwrap();

        let dest = dir.path().join("out");
        extract(&archive, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("scene").join("info.txt")).unwrap(), "tar content");
    }

    #[test]
    fn test_extract_garbage_fails() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("broken.zip");
        fs::write(&archive, b"definitely not a zip").unwrap();
        assert!(matches!(
            extract(&archive, &dir.path().join("out")),
            Err(AddonError::Extract { .. })
        ));
    }

    #[test]
    fn test_download() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/content.zip")
            .with_status(200)
            .with_body("zip bytes")
            .create();
        let dir = tempdir().unwrap();
        let dest = dir.path().join("content.zip");
        download(&Client::new(), &format!("{}/content.zip", server.url()), &dest).unwrap();
        mock.assert();
        assert_eq!(fs::read_to_string(dest).unwrap(), "zip bytes");
    }

    #[test]
    fn test_download_not_found() {
        let mut server = mockito::Server::new();
        let _mock = server.mock("GET", "/missing.zip").with_status(404).create();
        let dir = tempdir().unwrap();
        let err = download(
            &Client::new(),
            &format!("{}/missing.zip", server.url()),
            &dir.path().join("missing.zip"),
        )
        .unwrap_err();
        assert!(matches!(err, AddonError::RemoteContentFetch { .. }));
    }
}
