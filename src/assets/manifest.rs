use super::AssetError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub name: String,
    pub url: String,
}

/// Ordered model list. Position in the list is the model's manifest index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
    base_dir: PathBuf,
}

impl Manifest {
    pub fn new(entries: Vec<ManifestEntry>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            entries,
            base_dir: base_dir.into(),
        }
    }

    /// Parses a JSON array of `{ "name", "url" }` objects.
    pub fn from_json(json: &str, base_dir: impl Into<PathBuf>) -> Result<Self, AssetError> {
        let entries: Vec<ManifestEntry> = serde_json::from_str(json)?;
        Ok(Self::new(entries, base_dir))
    }

    /// Entry URLs resolve relative to the manifest's own directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| AssetError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self::from_json(&json, base_dir)
    }

    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_entries_in_order() {
        let manifest = Manifest::from_json(
            r#"[
                { "name": "Duck", "url": "duck/duck.gltf" },
                { "name": "Box", "url": "box.gltf" }
            ]"#,
            "models",
        )
        .unwrap();
        assert_eq!(manifest.len(), 2);
        assert_eq!(manifest.entries()[0].name, "Duck");
        assert_eq!(manifest.entries()[1].url, "box.gltf");
        assert_eq!(manifest.base_dir(), Path::new("models"));
    }

    #[test]
    fn rejects_entries_without_url() {
        let err = Manifest::from_json(r#"[{ "name": "Duck" }]"#, ".").unwrap_err();
        assert!(matches!(err, AssetError::Manifest(_)));
    }

    #[test]
    fn load_uses_manifest_directory_as_base() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample-models.json");
        std::fs::write(&path, r#"[{ "name": "A", "url": "a.gltf" }]"#).unwrap();
        let manifest = Manifest::load(&path).unwrap();
        assert_eq!(manifest.base_dir(), dir.path());
        assert_eq!(manifest.entries()[0].name, "A");
    }

    #[test]
    fn missing_manifest_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Manifest::load(dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, AssetError::Read { .. }));
    }
}
