//! Bundle manifest parsing and entry scoping.

use serde_json::Value;

use crate::container::ArchiveEntry;
use crate::error::{ManifestError, ManifestResult};

/// Structural manifest: the folder prefixes whose assets are in scope.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Manifest {
    folders: Vec<String>,
}

impl Manifest {
    /// Build a manifest directly from folder prefixes.
    pub fn new(folders: Vec<String>) -> ManifestResult<Self> {
        if folders.is_empty() {
            return Err(ManifestError::EmptyFolders);
        }
        if let Some(index) = folders.iter().position(|f| f.is_empty()) {
            return Err(ManifestError::InvalidFolder { index });
        }
        Ok(Self { folders })
    }

    /// Parse the manifest JSON: `{ "folders": ["a/", "b/"] }`.
    ///
    /// Other top-level keys are ignored.
    pub fn parse(data: &[u8]) -> ManifestResult<Self> {
        let value: Value =
            serde_json::from_slice(data).map_err(|e| ManifestError::InvalidJson(e.to_string()))?;
        let folders = value
            .get("folders")
            .and_then(Value::as_array)
            .ok_or(ManifestError::MissingFolders)?;
        let folders = folders
            .iter()
            .enumerate()
            .map(|(index, v)| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or(ManifestError::InvalidFolder { index })
            })
            .collect::<ManifestResult<Vec<String>>>()?;
        Self::new(folders)
    }

    pub fn folders(&self) -> &[String] {
        &self.folders
    }

    /// Whether `path` sits under one of the manifest folders.
    pub fn includes(&self, path: &str) -> bool {
        self.folders.iter().any(|f| path.starts_with(f.as_str()))
    }

    /// Filter `entries` down to in-scope assets, preserving archive order.
    ///
    /// An entry is kept when it is a file, its path ends with `extension`
    /// (ASCII case-insensitive), and it is under a manifest folder. An empty
    /// result is a valid, empty batch.
    pub fn resolve(&self, entries: &[ArchiveEntry], extension: &str) -> Vec<ArchiveEntry> {
        let extension = extension.to_ascii_lowercase();
        entries
            .iter()
            .filter(|e| !e.is_dir)
            .filter(|e| e.path.to_ascii_lowercase().ends_with(&extension))
            .filter(|e| self.includes(&e.path))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index: usize, path: &str) -> ArchiveEntry {
        ArchiveEntry {
            index,
            path: path.to_string(),
            size: 0,
            is_dir: path.ends_with('/'),
        }
    }

    fn ab() -> Manifest {
        Manifest::parse(br#"{"folders": ["a/", "b/"]}"#).unwrap()
    }

    #[test]
    fn folder_prefix_scoping() {
        let m = ab();
        assert!(m.includes("a/x.glb"));
        assert!(!m.includes("c/x.glb"));
    }

    #[test]
    fn resolve_filters_extension_and_folders() {
        let entries = vec![
            entry(0, "a/"),
            entry(1, "a/x.glb"),
            entry(2, "a/readme.txt"),
            entry(3, "b/sub/Y.GLB"),
            entry(4, "c/x.glb"),
            entry(5, "config.json"),
        ];
        let resolved = ab().resolve(&entries, ".glb");
        let paths: Vec<&str> = resolved.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a/x.glb", "b/sub/Y.GLB"]);
    }

    #[test]
    fn resolve_empty_is_not_an_error() {
        let entries = vec![entry(0, "c/x.glb")];
        assert!(ab().resolve(&entries, ".glb").is_empty());
    }

    #[test]
    fn missing_folders() {
        let err = Manifest::parse(br#"{"name": "x"}"#).unwrap_err();
        assert_eq!(err, ManifestError::MissingFolders);
    }

    #[test]
    fn folders_not_an_array() {
        let err = Manifest::parse(br#"{"folders": "a/"}"#).unwrap_err();
        assert_eq!(err, ManifestError::MissingFolders);
    }

    #[test]
    fn empty_folders() {
        let err = Manifest::parse(br#"{"folders": []}"#).unwrap_err();
        assert_eq!(err, ManifestError::EmptyFolders);
    }

    #[test]
    fn non_string_folder() {
        let err = Manifest::parse(br#"{"folders": ["a/", 3]}"#).unwrap_err();
        assert_eq!(err, ManifestError::InvalidFolder { index: 1 });
    }

    #[test]
    fn invalid_json() {
        let err = Manifest::parse(b"{not json").unwrap_err();
        assert!(matches!(err, ManifestError::InvalidJson(_)));
    }
}
