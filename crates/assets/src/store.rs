use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content-addressed asset id, derived from the decoded content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u64);

/// Errors from asset import and registry operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("glTF import error: {0}")]
    Gltf(String),
    #[error("image decode error: {0}")]
    Image(String),
    #[error("cubemap faces must be square and equally sized: {0}")]
    CubemapShape(String),
}

/// CPU-side mesh: flat attribute arrays plus indices, node transforms
/// already flattened in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub indices: Vec<u32>,
    /// Base color factor from the source material.
    pub base_color: [f32; 4],
}

/// Decoded RGBA8 texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Six decoded square faces in px, nx, py, ny, pz, nz order.
#[derive(Debug, Clone, PartialEq)]
pub struct CubemapData {
    pub size: u32,
    pub faces: [Vec<u8>; 6],
}

/// An asset in the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum Asset {
    /// A model file may contain several meshes; they are kept together so
    /// one path resolves to one drawable set.
    Model(Vec<MeshData>),
    Texture(TextureData),
    Cubemap(CubemapData),
}

/// Content-addressed asset registry with a path index.
#[derive(Debug, Default)]
pub struct AssetStore {
    assets: BTreeMap<AssetId, Asset>,
    by_path: BTreeMap<String, AssetId>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an asset under its scene-relative path. Identical content
    /// maps to the same id regardless of path.
    pub fn insert(&mut self, path: &str, asset: Asset) -> AssetId {
        let id = content_id(&asset);
        self.by_path.insert(path.to_string(), id);
        self.assets.entry(id).or_insert(asset);
        id
    }

    pub fn get(&self, id: AssetId) -> Option<&Asset> {
        self.assets.get(&id)
    }

    /// Resolve a scene-relative path to its asset, if loaded.
    pub fn by_path(&self, path: &str) -> Option<&Asset> {
        self.by_path.get(path).and_then(|id| self.assets.get(id))
    }

    pub fn model(&self, path: &str) -> Option<&[MeshData]> {
        match self.by_path(path) {
            Some(Asset::Model(meshes)) => Some(meshes),
            _ => None,
        }
    }

    pub fn texture(&self, path: &str) -> Option<&TextureData> {
        match self.by_path(path) {
            Some(Asset::Texture(t)) => Some(t),
            _ => None,
        }
    }

    pub fn cubemap(&self, path: &str) -> Option<&CubemapData> {
        match self.by_path(path) {
            Some(Asset::Cubemap(c)) => Some(c),
            _ => None,
        }
    }

    /// Number of distinct assets (paths sharing content count once).
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Registered paths in deterministic order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.by_path.keys().map(String::as_str)
    }
}

/// Hash the decoded content into an id (first eight digest bytes).
fn content_id(asset: &Asset) -> AssetId {
    let mut hasher = Sha256::new();
    match asset {
        Asset::Model(meshes) => {
            for mesh in meshes {
                hasher.update(mesh.name.as_bytes());
                for p in &mesh.positions {
                    for c in p {
                        hasher.update(c.to_le_bytes());
                    }
                }
                for i in &mesh.indices {
                    hasher.update(i.to_le_bytes());
                }
            }
        }
        Asset::Texture(t) => {
            hasher.update(t.width.to_le_bytes());
            hasher.update(t.height.to_le_bytes());
            hasher.update(&t.pixels);
        }
        Asset::Cubemap(c) => {
            hasher.update(c.size.to_le_bytes());
            for face in &c.faces {
                hasher.update(face);
            }
        }
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    AssetId(u64::from_le_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker_texture() -> Asset {
        Asset::Texture(TextureData {
            width: 2,
            height: 2,
            pixels: vec![255; 16],
        })
    }

    #[test]
    fn insert_and_resolve_by_path() {
        let mut store = AssetStore::new();
        store.insert("textures/moon.jpeg", checker_texture());
        assert!(store.texture("textures/moon.jpeg").is_some());
        assert!(store.texture("textures/missing.png").is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn identical_content_dedups() {
        let mut store = AssetStore::new();
        let a = store.insert("a.png", checker_texture());
        let b = store.insert("b.png", checker_texture());
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
        // Both paths still resolve.
        assert!(store.texture("a.png").is_some());
        assert!(store.texture("b.png").is_some());
    }

    #[test]
    fn different_content_gets_different_ids() {
        let mut store = AssetStore::new();
        let a = store.insert("a.png", checker_texture());
        let b = store.insert(
            "b.png",
            Asset::Texture(TextureData {
                width: 2,
                height: 2,
                pixels: vec![0; 16],
            }),
        );
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn typed_accessors_reject_wrong_kinds() {
        let mut store = AssetStore::new();
        store.insert("tex.png", checker_texture());
        assert!(store.model("tex.png").is_none());
        assert!(store.cubemap("tex.png").is_none());
    }
}
