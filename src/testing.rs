//! Scripted collaborators shared by unit tests.

use crate::assets::{AssetError, AssetLoader, AssetStore, LoadSequencer, LodSource};
use crate::lod::LodKey;
use crate::scene::material::{Material, PhysicalMaterial, Texture, TextureId};
use crate::scene::{
    Geometry, GroupNode, LightKind, LightNode, MeshNode, SceneNode, Transform,
};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::sync::Arc;

pub const SOURCE_ALBEDO_ID: TextureId = TextureId(10_000);

pub fn default_sources() -> Vec<LodSource> {
    LodKey::ALL
        .into_iter()
        .map(|key| LodSource {
            key,
            mesh: format!("{key}.json"),
            normal_map: format!("normal_{key}.png"),
            base_color_map: None,
            aorm_map: None,
        })
        .collect()
}

pub fn source_albedo() -> Texture {
    Texture::new(SOURCE_ALBEDO_ID, "source_albedo", [64, 64])
}

fn mesh(name: &str, triangles: u32, material: Material) -> SceneNode {
    SceneNode::Mesh(MeshNode {
        name: name.to_string(),
        transform: Transform::from_position_rotation_scale([0.0, 1.0, 0.0], [0.0; 3], [1.0; 3]),
        geometry: Arc::new(Geometry {
            positions: vec![[0.0, 0.0, 0.0]; 3],
            indices: Some(vec![0; (triangles * 3) as usize]),
        }),
        material,
        cast_shadow: false,
        receive_shadow: false,
        visible: true,
    })
}

/// Two submeshes: `body` carries its own albedo, `trim` has no maps.
pub fn sample_mesh(name: &str, detail: u32) -> SceneNode {
    SceneNode::Group(GroupNode {
        name: name.to_string(),
        transform: Transform::from_position_rotation_scale([3.0, 0.0, -2.0], [0.0, 45.0, 0.0], [2.0; 3]),
        children: vec![
            mesh(
                "body",
                12 * detail,
                Material::Physical(PhysicalMaterial {
                    map: Some(source_albedo()),
                    ..PhysicalMaterial::default()
                }),
            ),
            mesh("trim", 4 * detail, Material::Physical(PhysicalMaterial::default())),
            SceneNode::Light(LightNode {
                name: "baked".to_string(),
                transform: Transform::IDENTITY,
                kind: LightKind::Ambient,
                color: [1.0, 1.0, 1.0],
                intensity: 0.1,
                cast_shadow: false,
                shadow_map_size: 512,
            }),
        ],
    })
}

/// Loader that serves synthetic assets, fails the paths it was told to and
/// never finishes the stalling ones.
pub struct MockLoader {
    failing: HashSet<String>,
    stalling: HashSet<String>,
    requests: RefCell<Vec<String>>,
    next_id: Cell<u64>,
}

impl MockLoader {
    pub fn new() -> Self {
        Self {
            failing: HashSet::new(),
            stalling: HashSet::new(),
            requests: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    pub fn failing(mut self, path: &str) -> Self {
        self.failing.insert(path.to_string());
        self
    }

    pub fn stalling(mut self, path: &str) -> Self {
        self.stalling.insert(path.to_string());
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    async fn record(&self, kind: &str, path: &str) -> Result<(), AssetError> {
        self.requests.borrow_mut().push(format!("{kind}:{path}"));
        if self.stalling.contains(path) {
            std::future::pending::<()>().await;
        }
        if self.failing.contains(path) {
            return Err(AssetError::Read {
                path: path.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted failure"),
            });
        }
        Ok(())
    }
}

impl AssetLoader for MockLoader {
    async fn load_mesh(&self, path: &str) -> Result<SceneNode, AssetError> {
        self.record("mesh", path).await?;
        let detail = LodKey::ALL
            .into_iter()
            .zip([4, 3, 2, 1])
            .find(|(key, _)| path.contains(key.as_str()))
            .map(|(_, detail)| detail)
            .unwrap_or(1);
        Ok(sample_mesh(path, detail))
    }

    async fn load_texture(&self, path: &str) -> Result<Texture, AssetError> {
        self.record("texture", path).await?;
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        Ok(Texture::new(TextureId(id), path, [16, 16]))
    }
}

/// Store with the given LODs loaded through the real sequencer.
pub fn store_with(keys: &[LodKey]) -> AssetStore {
    let sources = default_sources()
        .into_iter()
        .filter(|source| keys.contains(&source.key))
        .collect();
    let mut sequencer = LoadSequencer::new(sources);
    let mut store = AssetStore::new();
    let loader = MockLoader::new();
    pollster::block_on(sequencer.load_all(&loader, &mut store, |_, _| {}))
        .expect("mock loads succeed");
    store
}
