//! Asset pipeline: content-addressed registry plus real importers.
//!
//! Assets are identified by a hash of their decoded content, so identical
//! payloads dedup. The scene refers to assets by their configured relative
//! path; the store keeps a path index so renderers can resolve "is this
//! loaded yet" every frame without touching the filesystem.
//!
//! Loading is asynchronous: [`AssetLoader`] decodes on worker threads and
//! delivers results over a channel. The app drains the channel once per
//! frame ([`AssetLoader::poll`]), which is the only point where the store
//! mutates. A load may therefore land an arbitrary number of frames after
//! the scene starts rendering, and the scene simply renders without the
//! asset until then. Failures are logged and dropped; there is no retry and
//! no fallback asset.

mod gltf_import;
mod loader;
mod store;
mod texture;

pub use gltf_import::import_gltf;
pub use loader::{AssetLoader, LoadRequest};
pub use store::{Asset, AssetError, AssetId, AssetStore, CubemapData, MeshData, TextureData};
pub use texture::{load_cubemap, load_texture};
