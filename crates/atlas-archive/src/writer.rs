use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{ArchiveError, ArchiveResult};

/// Builds a bundle container in memory.
pub struct ArchiveWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    files: usize,
}

impl ArchiveWriter {
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default(),
            files: 0,
        }
    }

    /// Add a file entry. `path` uses `/` separators.
    pub fn add_file(&mut self, path: &str, data: &[u8]) -> ArchiveResult<()> {
        self.zip
            .start_file(path, self.options)
            .map_err(|e| ArchiveError::Write(e.to_string()))?;
        self.zip.write_all(data)?;
        self.files += 1;
        Ok(())
    }

    pub fn add_directory(&mut self, path: &str) -> ArchiveResult<()> {
        self.zip
            .add_directory(path, self.options)
            .map_err(|e| ArchiveError::Write(e.to_string()))
    }

    /// Number of file entries added so far.
    pub fn file_count(&self) -> usize {
        self.files
    }

    /// Finish the container and return its bytes.
    pub fn finish(self) -> ArchiveResult<Vec<u8>> {
        let cursor = self
            .zip
            .finish()
            .map_err(|e| ArchiveError::Write(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}

impl Default for ArchiveWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::AssetArchive;

    #[test]
    fn empty_container_decodes() {
        let bytes = ArchiveWriter::new().finish().unwrap();
        let archive = AssetArchive::from_bytes(bytes).unwrap();
        assert!(archive.is_empty());
    }

    #[test]
    fn counts_files_not_directories() {
        let mut w = ArchiveWriter::new();
        w.add_directory("a/").unwrap();
        w.add_file("a/x.glb", b"x").unwrap();
        assert_eq!(w.file_count(), 1);
    }
}
