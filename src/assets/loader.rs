use super::{AssetError, AssetLoader, ManifestEntry};
use crate::scene::{asset_up_correction, Mesh, MeshGeometry, SceneObject, Transform};
use glam::{Mat4, Vec3};
use gltf::mesh::Mode;
use std::path::PathBuf;
use std::sync::Arc;

/// Loads `.gltf`/`.glb` files named by manifest URLs relative to `base_dir`.
/// Only triangle primitives are kept; the hierarchy is flattened into
/// meshes carrying their accumulated node transform.
#[derive(Debug, Clone)]
pub struct GltfLoader {
    base_dir: PathBuf,
}

impl GltfLoader {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }
}

impl AssetLoader for GltfLoader {
    fn load(&self, entry: &ManifestEntry) -> Result<SceneObject, AssetError> {
        let path = self.base_dir.join(&entry.url);
        let display = path.display().to_string();
        let (document, buffers, _images) =
            gltf::import(&path).map_err(|source| AssetError::Import {
                path: display.clone(),
                source,
            })?;

        let mut meshes = Vec::new();
        let roots: Vec<gltf::Node> = match document
            .default_scene()
            .or_else(|| document.scenes().next())
        {
            Some(scene) => scene.nodes().collect(),
            None => document.nodes().collect(),
        };
        for node in roots {
            collect_meshes(&node, Mat4::IDENTITY, &buffers, &mut meshes);
        }
        if meshes.is_empty() {
            return Err(AssetError::NoGeometry { path: display });
        }

        let transform = Transform {
            rotation: asset_up_correction(),
            ..Transform::IDENTITY
        };
        log::debug!("Decoded '{}' ({} meshes) from {}", entry.name, meshes.len(), display);
        Ok(SceneObject::new(entry.name.clone(), transform, meshes))
    }
}

fn collect_meshes(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<Mesh>,
) {
    let local = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if primitive.mode() != Mode::Triangles {
                continue;
            }
            let reader = primitive
                .reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));
            let Some(positions) = reader.read_positions() else {
                continue;
            };
            let positions: Vec<Vec3> = positions.map(Vec3::from_array).collect();
            if positions.is_empty() {
                continue;
            }
            let indices: Vec<u32> = reader
                .read_indices()
                .map(|read| read.into_u32().collect())
                .unwrap_or_else(|| (0..positions.len() as u32).collect());
            let name = node
                .name()
                .or_else(|| mesh.name())
                .map(str::to_string);
            out.push(Mesh::new(
                name,
                local,
                Arc::new(MeshGeometry::new(positions, indices)),
            ));
        }
    }
    for child in node.children() {
        collect_meshes(&child, local, buffers, out);
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    /// One triangle (0,0,0) (1,0,0) (0,1,0) under a parent node offset by +2 on X.
    pub(crate) const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [
            { "name": "offset", "translation": [2.0, 0.0, 0.0], "children": [1] },
            { "name": "triangle", "mesh": 0 }
        ],
        "meshes": [{
            "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1, "mode": 4 }]
        }],
        "buffers": [{
            "byteLength": 44,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAAAAABAAIAAAA="
        }],
        "bufferViews": [
            { "buffer": 0, "byteOffset": 0, "byteLength": 36, "target": 34962 },
            { "buffer": 0, "byteOffset": 36, "byteLength": 6, "target": 34963 }
        ],
        "accessors": [
            {
                "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
                "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]
            },
            { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
        ]
    }"#;
}

#[cfg(test)]
mod tests {
    use super::test_support::TRIANGLE_GLTF;
    use super::*;
    use crate::geometry;

    fn entry(url: &str) -> ManifestEntry {
        ManifestEntry {
            name: "Triangle".to_string(),
            url: url.to_string(),
        }
    }

    #[test]
    fn loads_hierarchy_and_stands_it_upright() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("triangle.gltf"), TRIANGLE_GLTF).unwrap();

        let object = GltfLoader::new(dir.path()).load(&entry("triangle.gltf")).unwrap();
        assert_eq!(object.name, "Triangle");
        assert_eq!(object.meshes().len(), 1);
        assert_eq!(object.triangle_count(), 1);
        assert_eq!(object.meshes()[0].name.as_deref(), Some("triangle"));

        // Parent offset applies, then +Y becomes +Z.
        let bounds = geometry::bounding_box(&object);
        assert!((bounds.min - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
        assert!((bounds.max - Vec3::new(3.0, 0.0, 1.0)).length() < 1e-5);
    }

    #[test]
    fn missing_file_is_an_import_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = GltfLoader::new(dir.path()).load(&entry("absent.gltf")).unwrap_err();
        assert!(matches!(err, AssetError::Import { .. }));
    }

    #[test]
    fn document_without_meshes_has_no_geometry() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("empty.gltf"),
            r#"{ "asset": { "version": "2.0" }, "scenes": [{ "nodes": [0] }], "nodes": [{ "name": "lonely" }] }"#,
        )
        .unwrap();
        let err = GltfLoader::new(dir.path()).load(&entry("empty.gltf")).unwrap_err();
        assert!(matches!(err, AssetError::NoGeometry { .. }));
    }
}
