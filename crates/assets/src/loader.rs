use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;

use crate::gltf_import::import_gltf;
use crate::store::{Asset, AssetError, AssetStore};
use crate::texture::{load_cubemap, load_texture};

/// A decode request. `key` is the scene-relative path the scene uses to
/// reference the asset; `path`/`paths` are the resolved filesystem locations.
#[derive(Debug, Clone)]
pub enum LoadRequest {
    Model { key: String, path: PathBuf },
    Texture { key: String, path: PathBuf },
    Cubemap { key: String, paths: [PathBuf; 6] },
}

impl LoadRequest {
    fn key(&self) -> &str {
        match self {
            LoadRequest::Model { key, .. }
            | LoadRequest::Texture { key, .. }
            | LoadRequest::Cubemap { key, .. } => key,
        }
    }

    fn run(self) -> Result<Asset, AssetError> {
        match self {
            LoadRequest::Model { path, .. } => Ok(Asset::Model(import_gltf(path)?)),
            LoadRequest::Texture { path, .. } => Ok(Asset::Texture(load_texture(path)?)),
            LoadRequest::Cubemap { paths, .. } => Ok(Asset::Cubemap(load_cubemap(&paths)?)),
        }
    }
}

/// Asynchronous asset loader.
///
/// Each request decodes on its own short-lived worker thread; the result
/// crosses back over a channel and is merged into the store only when
/// [`poll`](AssetLoader::poll) runs, so the store mutates at exactly one
/// point in the frame loop. There is no cancellation and no timeout: a load
/// completes or fails, and a failure is logged and dropped.
pub struct AssetLoader {
    tx: Sender<(String, Result<Asset, AssetError>)>,
    rx: Receiver<(String, Result<Asset, AssetError>)>,
    pending: usize,
}

impl Default for AssetLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetLoader {
    pub fn new() -> Self {
        let (tx, rx) = channel();
        Self { tx, rx, pending: 0 }
    }

    /// Start a load on a worker thread.
    pub fn request(&mut self, request: LoadRequest) {
        let key = request.key().to_string();
        tracing::debug!(%key, "asset load started");
        let tx = self.tx.clone();
        self.pending += 1;
        thread::spawn(move || {
            let result = request.run();
            // The receiver only disappears on shutdown; a failed send just
            // means nobody is left to care.
            let _ = tx.send((key, result));
        });
    }

    /// Loads still in flight.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Merge every completed load into the store. Returns how many assets
    /// were added this call. Failed loads are logged and ignored.
    pub fn poll(&mut self, store: &mut AssetStore) -> usize {
        let mut merged = 0;
        while let Ok((key, result)) = self.rx.try_recv() {
            self.pending -= 1;
            match result {
                Ok(asset) => {
                    store.insert(&key, asset);
                    tracing::info!(%key, "asset loaded");
                    merged += 1;
                }
                Err(error) => {
                    tracing::error!(%key, %error, "asset load failed");
                }
            }
        }
        merged
    }

    /// Block until every outstanding load has been delivered. Used by the
    /// headless CLI; the viewer never blocks.
    pub fn wait_all(&mut self, store: &mut AssetStore) {
        while self.pending > 0 {
            match self.rx.recv() {
                Ok((key, result)) => {
                    self.pending -= 1;
                    match result {
                        Ok(asset) => {
                            store.insert(&key, asset);
                            tracing::info!(%key, "asset loaded");
                        }
                        Err(error) => {
                            tracing::error!(%key, %error, "asset load failed");
                        }
                    }
                }
                Err(_) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    #[test]
    fn texture_load_lands_only_at_poll() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.png");
        ImageBuffer::from_pixel(2, 2, Rgba([1u8, 2, 3, 255]))
            .save(&path)
            .unwrap();

        let mut loader = AssetLoader::new();
        let mut store = AssetStore::new();
        loader.request(LoadRequest::Texture {
            key: "textures/t.png".into(),
            path,
        });
        assert_eq!(loader.pending(), 1);

        loader.wait_all(&mut store);
        assert_eq!(loader.pending(), 0);
        assert!(store.texture("textures/t.png").is_some());
    }

    #[test]
    fn failed_load_leaves_the_store_unchanged() {
        let mut loader = AssetLoader::new();
        let mut store = AssetStore::new();
        loader.request(LoadRequest::Model {
            key: "models/ghost.glb".into(),
            path: PathBuf::from("nope/ghost.glb"),
        });
        loader.wait_all(&mut store);
        assert!(store.is_empty());
        assert_eq!(loader.pending(), 0);
    }

    #[test]
    fn poll_drains_incrementally() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.png");
        ImageBuffer::from_pixel(1, 1, Rgba([9u8, 9, 9, 255]))
            .save(&path)
            .unwrap();

        let mut loader = AssetLoader::new();
        let mut store = AssetStore::new();
        loader.request(LoadRequest::Texture {
            key: "t.png".into(),
            path,
        });

        // Worker threads finish quickly; poll until the result shows up.
        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(10);
        let mut merged = 0;
        while merged == 0 && std::time::Instant::now() < deadline {
            merged = loader.poll(&mut store);
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert_eq!(merged, 1);
        assert!(store.texture("t.png").is_some());
    }
}
