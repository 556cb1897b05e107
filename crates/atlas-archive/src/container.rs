use std::io::{Cursor, Read};

use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::{ArchiveError, ArchiveResult};

/// One entry of a decoded container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Position inside the container, used for random access.
    pub index: usize,
    /// Path with `/` separators, as stored in the container.
    pub path: String,
    /// Uncompressed size in bytes.
    pub size: u64,
    pub is_dir: bool,
}

impl ArchiveEntry {
    /// Final path component.
    pub fn file_name(&self) -> &str {
        self.path.trim_end_matches('/').rsplit('/').next().unwrap_or(&self.path)
    }
}

/// Random-access reader over an in-memory zip container.
///
/// The entry list is indexed once at construction; reads decompress one
/// entry at a time.
pub struct AssetArchive {
    zip: ZipArchive<Cursor<Vec<u8>>>,
    entries: Vec<ArchiveEntry>,
}

impl AssetArchive {
    /// Decode the container directory from raw bytes.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> ArchiveResult<Self> {
        let mut zip = ZipArchive::new(Cursor::new(data.into()))
            .map_err(|e| ArchiveError::Malformed(e.to_string()))?;

        let mut entries = Vec::with_capacity(zip.len());
        for index in 0..zip.len() {
            let file = zip
                .by_index(index)
                .map_err(|e| ArchiveError::Malformed(e.to_string()))?;
            entries.push(ArchiveEntry {
                index,
                path: file.name().to_string(),
                size: file.size(),
                is_dir: file.is_dir(),
            });
        }
        debug!(entries = entries.len(), "archive indexed");
        Ok(Self { zip, entries })
    }

    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First file entry whose path ends with `suffix`.
    pub fn find_by_suffix(&self, suffix: &str) -> Option<ArchiveEntry> {
        let mut matches = self
            .entries
            .iter()
            .filter(|e| !e.is_dir && e.path.ends_with(suffix));
        let first = matches.next()?.clone();
        let extra = matches.count();
        if extra > 0 {
            warn!(suffix, chosen = %first.path, extra, "multiple entries match suffix, using the first");
        }
        Some(first)
    }

    /// Like [`Self::find_by_suffix`] but a missing entry is an error.
    pub fn require_by_suffix(&self, what: &'static str, suffix: &str) -> ArchiveResult<ArchiveEntry> {
        self.find_by_suffix(suffix).ok_or_else(|| ArchiveError::MissingEntry {
            what,
            suffix: suffix.to_string(),
        })
    }

    /// Decompress one entry into a byte buffer.
    pub fn read(&mut self, entry: &ArchiveEntry) -> ArchiveResult<Vec<u8>> {
        let mut file = self
            .zip
            .by_index(entry.index)
            .map_err(|e| ArchiveError::EntryRead {
                path: entry.path.clone(),
                reason: e.to_string(),
            })?;
        let mut buf = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut buf).map_err(|e| ArchiveError::EntryRead {
            path: entry.path.clone(),
            reason: e.to_string(),
        })?;
        Ok(buf)
    }

    /// Decompress one entry as UTF-8 text.
    pub fn read_to_string(&mut self, entry: &ArchiveEntry) -> ArchiveResult<String> {
        let bytes = self.read(entry)?;
        String::from_utf8(bytes).map_err(|_| ArchiveError::NotUtf8 {
            path: entry.path.clone(),
        })
    }
}

impl std::fmt::Debug for AssetArchive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetArchive")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::ArchiveWriter;

    fn bundle() -> Vec<u8> {
        let mut w = ArchiveWriter::new();
        w.add_directory("a/").unwrap();
        w.add_file("a/Atlas_GPe1_L.glb", b"glb-bytes").unwrap();
        w.add_file("meta/config.json", br#"{"folders":["a/"]}"#).unwrap();
        w.add_file("meta/colors.txt", b"GPe1: 1 0 0\n").unwrap();
        w.finish().unwrap()
    }

    #[test]
    fn indexes_entries_in_order() {
        let archive = AssetArchive::from_bytes(bundle()).unwrap();
        let paths: Vec<&str> = archive.entries().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["a/", "a/Atlas_GPe1_L.glb", "meta/config.json", "meta/colors.txt"]
        );
        assert!(archive.entries()[0].is_dir);
        assert_eq!(archive.entries()[1].size, 9);
        assert_eq!(archive.entries()[1].file_name(), "Atlas_GPe1_L.glb");
    }

    #[test]
    fn find_and_read() {
        let mut archive = AssetArchive::from_bytes(bundle()).unwrap();
        let manifest = archive.find_by_suffix("config.json").unwrap();
        assert_eq!(manifest.path, "meta/config.json");
        let text = archive.read_to_string(&manifest).unwrap();
        assert!(text.contains("folders"));

        let asset = archive.find_by_suffix(".glb").unwrap();
        assert_eq!(archive.read(&asset).unwrap(), b"glb-bytes");
    }

    #[test]
    fn missing_required_entry() {
        let archive = AssetArchive::from_bytes(bundle()).unwrap();
        let err = archive.require_by_suffix("color table", "palette.txt").unwrap_err();
        assert!(matches!(err, ArchiveError::MissingEntry { what: "color table", .. }));
    }

    #[test]
    fn garbage_is_malformed() {
        let err = AssetArchive::from_bytes(b"definitely not a zip".to_vec()).unwrap_err();
        assert!(matches!(err, ArchiveError::Malformed(_)));
    }

    #[test]
    fn non_utf8_entry() {
        let mut w = ArchiveWriter::new();
        w.add_file("colors.txt", &[0xFF, 0xFE, 0x00]).unwrap();
        let mut archive = AssetArchive::from_bytes(w.finish().unwrap()).unwrap();
        let entry = archive.find_by_suffix("colors.txt").unwrap();
        assert!(matches!(
            archive.read_to_string(&entry).unwrap_err(),
            ArchiveError::NotUtf8 { .. }
        ));
    }
}
