use super::AssetError;
use crate::scene::material::{Material, PhysicalMaterial, Texture, TextureId, UnlitMaterial};
use crate::scene::{Geometry, GroupNode, LightKind, LightNode, MeshNode, SceneNode, Transform};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Asset fetching as provided by the engine. Both calls may suspend.
#[allow(async_fn_in_trait)]
pub trait AssetLoader {
    async fn load_mesh(&self, path: &str) -> Result<SceneNode, AssetError>;
    async fn load_texture(&self, path: &str) -> Result<Texture, AssetError>;
}

/// Loads JSON mesh descriptions and image textures from a directory.
///
/// Textures are inspected (format and dimensions) but not decoded; the same
/// file always maps to the same texture handle.
pub struct FsAssetLoader {
    root: PathBuf,
    next_texture_id: Cell<u64>,
    textures: RefCell<HashMap<PathBuf, Texture>>,
}

impl FsAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            next_texture_id: Cell::new(1),
            textures: RefCell::new(HashMap::new()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let candidate = Path::new(path);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.root.join(candidate)
        }
    }

    fn texture_at(&self, path: &Path) -> Result<Texture, AssetError> {
        if let Some(texture) = self.textures.borrow().get(path) {
            return Ok(texture.clone());
        }
        let display = path.display().to_string();
        std::fs::metadata(path).map_err(|source| AssetError::Read {
            path: display.clone(),
            source,
        })?;
        let (width, height) =
            image::image_dimensions(path).map_err(|source| AssetError::DecodeTexture {
                path: display.clone(),
                source,
            })?;

        let id = TextureId(self.next_texture_id.get());
        self.next_texture_id.set(id.0 + 1);
        let label = path
            .file_name()
            .and_then(|value| value.to_str())
            .unwrap_or("texture")
            .to_string();
        let texture = Texture::new(id, label, [width, height]);
        let [width, height] = texture.size();
        log::debug!(
            "Texture {} '{}' {}x{} from {}",
            texture.id(),
            texture.label(),
            width,
            height,
            display
        );
        self.textures
            .borrow_mut()
            .insert(path.to_path_buf(), texture.clone());
        Ok(texture)
    }
}

impl AssetLoader for FsAssetLoader {
    async fn load_mesh(&self, path: &str) -> Result<SceneNode, AssetError> {
        let mesh_path = self.resolve(path);
        let display = mesh_path.display().to_string();
        let json = std::fs::read_to_string(&mesh_path).map_err(|source| AssetError::Read {
            path: display.clone(),
            source,
        })?;
        let descriptor: NodeDescriptor =
            serde_json::from_str(&json).map_err(|source| AssetError::ParseMesh {
                path: display.clone(),
                source,
            })?;

        let base_dir = mesh_path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut references = Vec::new();
        descriptor.collect_texture_refs(&mut references);
        let mut textures = HashMap::new();
        for reference in references {
            if textures.contains_key(&reference) {
                continue;
            }
            let texture = self.texture_at(&base_dir.join(&reference))?;
            textures.insert(reference, texture);
        }

        let node = descriptor.build(&textures);
        log::info!("Loaded mesh '{}' ({} submeshes)", display, node.mesh_count());
        Ok(node)
    }

    async fn load_texture(&self, path: &str) -> Result<Texture, AssetError> {
        self.texture_at(&self.resolve(path))
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
struct TransformDescriptor {
    position: [f32; 3],
    rotation_deg: [f32; 3],
    scale: [f32; 3],
}

impl Default for TransformDescriptor {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
            rotation_deg: [0.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
        }
    }
}

impl TransformDescriptor {
    fn to_transform(&self) -> Transform {
        Transform::from_position_rotation_scale(self.position, self.rotation_deg, self.scale)
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
struct MaterialDescriptor {
    unlit: bool,
    color: [f32; 3],
    roughness: Option<f32>,
    metalness: Option<f32>,
    map: Option<String>,
    roughness_map: Option<String>,
    metalness_map: Option<String>,
    ao_map: Option<String>,
}

impl Default for MaterialDescriptor {
    fn default() -> Self {
        Self {
            unlit: false,
            color: [1.0, 1.0, 1.0],
            roughness: None,
            metalness: None,
            map: None,
            roughness_map: None,
            metalness_map: None,
            ao_map: None,
        }
    }
}

impl MaterialDescriptor {
    fn texture_refs(&self) -> impl Iterator<Item = &String> {
        [
            &self.map,
            &self.roughness_map,
            &self.metalness_map,
            &self.ao_map,
        ]
        .into_iter()
        .flatten()
    }

    fn build(&self, textures: &HashMap<String, Texture>) -> Material {
        let lookup = |slot: &Option<String>| slot.as_ref().and_then(|r| textures.get(r)).cloned();
        if self.unlit {
            return Material::Unlit(UnlitMaterial {
                color: self.color,
                map: lookup(&self.map),
                wireframe: false,
            });
        }
        let defaults = PhysicalMaterial::default();
        Material::Physical(PhysicalMaterial {
            color: self.color,
            map: lookup(&self.map),
            roughness_map: lookup(&self.roughness_map),
            metalness_map: lookup(&self.metalness_map),
            ao_map: lookup(&self.ao_map),
            roughness: self.roughness.unwrap_or(defaults.roughness),
            metalness: self.metalness.unwrap_or(defaults.metalness),
            ..defaults
        })
    }
}

fn default_light_color() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_light_intensity() -> f32 {
    1.0
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum NodeDescriptor {
    Mesh {
        name: String,
        #[serde(default)]
        transform: TransformDescriptor,
        positions: Vec<[f32; 3]>,
        #[serde(default)]
        indices: Option<Vec<u32>>,
        #[serde(default)]
        material: MaterialDescriptor,
    },
    Group {
        name: String,
        #[serde(default)]
        transform: TransformDescriptor,
        #[serde(default)]
        children: Vec<NodeDescriptor>,
    },
    Light {
        name: String,
        #[serde(default)]
        transform: TransformDescriptor,
        #[serde(default = "default_light_color")]
        color: [f32; 3],
        #[serde(default = "default_light_intensity")]
        intensity: f32,
    },
}

impl NodeDescriptor {
    fn collect_texture_refs(&self, out: &mut Vec<String>) {
        match self {
            NodeDescriptor::Mesh { material, .. } => {
                out.extend(material.texture_refs().cloned());
            }
            NodeDescriptor::Group { children, .. } => {
                for child in children {
                    child.collect_texture_refs(out);
                }
            }
            NodeDescriptor::Light { .. } => {}
        }
    }

    fn build(&self, textures: &HashMap<String, Texture>) -> SceneNode {
        match self {
            NodeDescriptor::Mesh {
                name,
                transform,
                positions,
                indices,
                material,
            } => SceneNode::Mesh(MeshNode {
                name: name.clone(),
                transform: transform.to_transform(),
                geometry: Arc::new(Geometry {
                    positions: positions.clone(),
                    indices: indices.clone(),
                }),
                material: material.build(textures),
                cast_shadow: false,
                receive_shadow: false,
                visible: true,
            }),
            NodeDescriptor::Group {
                name,
                transform,
                children,
            } => SceneNode::Group(GroupNode {
                name: name.clone(),
                transform: transform.to_transform(),
                children: children.iter().map(|child| child.build(textures)).collect(),
            }),
            NodeDescriptor::Light {
                name,
                transform,
                color,
                intensity,
            } => SceneNode::Light(LightNode {
                name: name.clone(),
                transform: transform.to_transform(),
                kind: LightKind::Point {
                    distance: 0.0,
                    decay: 2.0,
                },
                color: *color,
                intensity: *intensity,
                cast_shadow: false,
                shadow_map_size: 512,
            }),
        }
    }
}
