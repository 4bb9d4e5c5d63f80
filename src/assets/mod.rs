pub mod loader;
pub mod sequencer;

pub use loader::{AssetLoader, FsAssetLoader};
pub use sequencer::{load_environment, LoadError, LoadEvent, LoadProgress, LoadSequencer, LodSource};

use crate::lod::LodKey;
use crate::scene::material::{Texture, TextureChannel};
use crate::scene::SceneNode;
use std::collections::BTreeMap;

/// A loaded LOD: mesh hierarchy plus the normal map authored for it.
#[derive(Debug, Clone, PartialEq)]
pub struct LodAsset {
    pub key: LodKey,
    pub mesh: SceneNode,
    pub normal_map: Texture,
}

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse mesh description {path}: {source}")]
    ParseMesh {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to decode texture {path}: {source}")]
    DecodeTexture {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Loaded LOD assets and their default textures.
///
/// Entries are treated as immutable: the scene only ever receives clones.
#[derive(Debug, Default)]
pub struct AssetStore {
    assets: BTreeMap<LodKey, LodAsset>,
    default_textures: BTreeMap<(LodKey, TextureChannel), Texture>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites the entry for `asset.key`, returning the old one.
    pub fn put(&mut self, asset: LodAsset) -> Option<LodAsset> {
        let key = asset.key;
        let previous = self.assets.insert(key, asset);
        if previous.is_some() {
            log::info!("Replaced stored asset for {}", key);
        } else {
            log::debug!("Stored asset for {}", key);
        }
        previous
    }

    pub fn get(&self, key: LodKey) -> Option<&LodAsset> {
        self.assets.get(&key)
    }

    pub fn has(&self, key: LodKey) -> bool {
        self.assets.contains_key(&key)
    }

    pub fn loaded_keys(&self) -> Vec<LodKey> {
        self.assets.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn normal_map(&self, key: LodKey) -> Option<&Texture> {
        self.assets.get(&key).map(|asset| &asset.normal_map)
    }

    pub fn register_default_texture(
        &mut self,
        key: LodKey,
        channel: TextureChannel,
        texture: Texture,
    ) {
        self.default_textures.insert((key, channel), texture);
    }

    pub fn default_texture(&self, key: LodKey, channel: TextureChannel) -> Option<&Texture> {
        self.default_textures.get(&(key, channel))
    }
}
