//! KMZ archive assembly and atomic output.
//!
//! A KMZ is a zip container with the KML document stored as `doc.kml` at the
//! archive root and any embedded assets alongside it. The archive is built
//! fully in memory, written to a temporary sibling path, and renamed onto
//! the output path so a failure never leaves a partial file behind.

use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use zip::write::FileOptions;
use zip::CompressionMethod;

use crate::extract::PlacemarkRecord;
use crate::kml;

/// Archive-level failure. Unlike extraction errors these are fatal: nothing
/// is written and the caller is told why.
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("no geotagged images survived extraction; nothing to write")]
    EmptyRecordSet,
    #[error("I/O failure: {0}")]
    IoFailure(String),
}

impl From<std::io::Error> for WriteError {
    fn from(e: std::io::Error) -> Self {
        Self::IoFailure(e.to_string())
    }
}

impl From<zip::result::ZipError> for WriteError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::IoFailure(e.to_string())
    }
}

/// Transient in-memory archive: built once, written once, then discarded.
#[derive(Debug)]
pub struct KmzArchive {
    pub kml_document: String,
    /// Archive-relative path and content of each embedded asset, in
    /// placemark order.
    pub embedded_files: Vec<(String, Vec<u8>)>,
}

impl KmzArchive {
    /// Assemble the archive contents from the surviving records.
    ///
    /// `thumbnails` runs parallel to `records`; a `Some` entry is embedded
    /// under `images/<index>.jpg` and referenced from that placemark's
    /// description. Fails with `EmptyRecordSet` when no records remain.
    pub fn build(
        records: &[PlacemarkRecord],
        thumbnails: &[Option<Vec<u8>>],
    ) -> Result<Self, WriteError> {
        if records.is_empty() {
            return Err(WriteError::EmptyRecordSet);
        }

        let mut embedded_files = Vec::new();
        let mut image_hrefs = Vec::with_capacity(records.len());
        for (index, thumbnail) in thumbnails.iter().enumerate() {
            match thumbnail {
                Some(bytes) => {
                    let archive_path = format!("images/{index}.jpg");
                    image_hrefs.push(Some(archive_path.clone()));
                    embedded_files.push((archive_path, bytes.clone()));
                }
                None => image_hrefs.push(None),
            }
        }

        let kml_document = kml::build_kml(records, &image_hrefs)
            .map_err(|e| WriteError::IoFailure(e.to_string()))?;
        Ok(Self {
            kml_document,
            embedded_files,
        })
    }

    /// Serialize to zip bytes. Entry order and timestamps are fixed, so the
    /// same archive contents always produce the same bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, WriteError> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            // Deflate the XML; store the thumbnails, they are already JPEG.
            let deflated: FileOptions<'_, ()> = FileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .last_modified_time(zip::DateTime::default());
            let stored: FileOptions<'_, ()> = FileOptions::default()
                .compression_method(CompressionMethod::Stored)
                .last_modified_time(zip::DateTime::default());

            zip.start_file("doc.kml", deflated)?;
            zip.write_all(self.kml_document.as_bytes())?;
            for (archive_path, bytes) in &self.embedded_files {
                zip.start_file(archive_path.as_str(), stored.clone())?;
                zip.write_all(bytes)?;
            }
            zip.finish()?;
        }
        Ok(buf)
    }
}

/// Write the archive to `output_path` via a temporary sibling and rename.
pub fn write_kmz(archive: &KmzArchive, output_path: &Path) -> Result<(), WriteError> {
    let bytes = archive.to_bytes()?;
    let tmp_path = temp_sibling(output_path);
    std::fs::write(&tmp_path, &bytes)?;
    if let Err(e) = std::fs::rename(&tmp_path, output_path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

/// Temporary path in the same directory as the target, so the final rename
/// stays on one filesystem.
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "out.kmz".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use std::path::PathBuf;
    use zip::ZipArchive;

    fn record(label: &str, lat: f64, lon: f64) -> PlacemarkRecord {
        PlacemarkRecord {
            source_path: PathBuf::from(format!("{label}.jpg")),
            latitude: lat,
            longitude: lon,
            altitude_m: None,
            timestamp: None,
            orientation: 1,
            label: label.to_string(),
        }
    }

    fn read_entry(bytes: &[u8], name: &str) -> Vec<u8> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut out = Vec::new();
        entry.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn test_empty_record_set_is_an_error() {
        let err = KmzArchive::build(&[], &[]).unwrap_err();
        assert!(matches!(err, WriteError::EmptyRecordSet));
    }

    #[test]
    fn test_doc_kml_at_archive_root() {
        let records = vec![record("a", 1.0, 2.0)];
        let archive = KmzArchive::build(&records, &[None]).unwrap();
        let bytes = archive.to_bytes().unwrap();

        let kml = String::from_utf8(read_entry(&bytes, "doc.kml")).unwrap();
        assert!(kml.contains("<Placemark>"));
        assert!(kml.contains("<coordinates>2,1</coordinates>"));
    }

    #[test]
    fn test_thumbnails_under_deterministic_paths() {
        let records = vec![record("a", 1.0, 2.0), record("b", 3.0, 4.0)];
        // Only the second record has a thumbnail; its index is still its
        // position in the record list.
        let thumbnails = vec![None, Some(vec![0xFF, 0xD8, 0xFF, 0xD9])];
        let archive = KmzArchive::build(&records, &thumbnails).unwrap();
        assert_eq!(archive.embedded_files.len(), 1);
        assert_eq!(archive.embedded_files[0].0, "images/1.jpg");

        let bytes = archive.to_bytes().unwrap();
        assert_eq!(read_entry(&bytes, "images/1.jpg"), vec![0xFF, 0xD8, 0xFF, 0xD9]);
        let kml = String::from_utf8(read_entry(&bytes, "doc.kml")).unwrap();
        assert!(kml.contains("images/1.jpg"));
    }

    #[test]
    fn test_rebuild_is_byte_identical() {
        let records = vec![record("a", 1.0, 2.0), record("b", 3.0, 4.0)];
        let thumbnails = vec![Some(vec![1, 2, 3]), None];
        let first = KmzArchive::build(&records, &thumbnails)
            .unwrap()
            .to_bytes()
            .unwrap();
        let second = KmzArchive::build(&records, &thumbnails)
            .unwrap()
            .to_bytes()
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_write_kmz_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("photos.kmz");
        let archive = KmzArchive::build(&[record("a", 1.0, 2.0)], &[None]).unwrap();
        write_kmz(&archive, &out).unwrap();

        assert!(out.exists());
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path() != out)
            .collect();
        assert!(leftovers.is_empty());
    }
}
