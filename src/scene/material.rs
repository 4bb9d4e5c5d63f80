use std::fmt;

/// Opaque engine texture id, allocated by the loader that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

impl fmt::Display for TextureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tex#{}", self.0)
    }
}

/// Handle to a texture owned by the rendering engine. Cloning the handle
/// never duplicates the GPU resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    id: TextureId,
    label: String,
    size: [u32; 2],
}

impl Texture {
    pub fn new(id: TextureId, label: impl Into<String>, size: [u32; 2]) -> Self {
        Self {
            id,
            label: label.into(),
            size,
        }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn size(&self) -> [u32; 2] {
        self.size
    }
}

/// Map slots that can fall back to a per-LOD default texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TextureChannel {
    BaseColor,
    Roughness,
    Metalness,
    AmbientOcclusion,
}

impl TextureChannel {
    /// Channels packed into a single AORM texture.
    pub const AORM: [TextureChannel; 3] = [
        TextureChannel::AmbientOcclusion,
        TextureChannel::Roughness,
        TextureChannel::Metalness,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Side {
    #[default]
    Front,
    Double,
}

/// Physically based material state, the engine's PBR-capable material.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalMaterial {
    pub color: [f32; 3],
    pub map: Option<Texture>,
    pub roughness_map: Option<Texture>,
    pub metalness_map: Option<Texture>,
    pub ao_map: Option<Texture>,
    pub normal_map: Option<Texture>,
    pub normal_scale: [f32; 2],
    pub wireframe: bool,
    pub side: Side,
    pub roughness: f32,
    pub metalness: f32,
    pub clearcoat: f32,
    pub clearcoat_roughness: f32,
    pub transmission: f32,
    pub thickness: f32,
    pub ior: f32,
    pub reflectivity: f32,
    pub sheen: f32,
    pub sheen_roughness: f32,
    pub sheen_color: [f32; 3],
    pub specular_intensity: f32,
    pub specular_color: [f32; 3],
    pub iridescence: f32,
    pub iridescence_ior: f32,
    pub iridescence_thickness_range: [f32; 2],
}

impl Default for PhysicalMaterial {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            map: None,
            roughness_map: None,
            metalness_map: None,
            ao_map: None,
            normal_map: None,
            normal_scale: [1.0, 1.0],
            wireframe: false,
            side: Side::Front,
            roughness: 1.0,
            metalness: 0.0,
            clearcoat: 0.0,
            clearcoat_roughness: 0.0,
            transmission: 0.0,
            thickness: 0.0,
            ior: 1.5,
            reflectivity: 0.5,
            sheen: 0.0,
            sheen_roughness: 1.0,
            sheen_color: [0.0, 0.0, 0.0],
            specular_intensity: 1.0,
            specular_color: [1.0, 1.0, 1.0],
            iridescence: 0.0,
            iridescence_ior: 1.3,
            iridescence_thickness_range: [100.0, 400.0],
        }
    }
}

/// Flat shaded material without lighting response. Source assets may carry
/// it, but it can never be a synthesis target.
#[derive(Debug, Clone, PartialEq)]
pub struct UnlitMaterial {
    pub color: [f32; 3],
    pub map: Option<Texture>,
    pub wireframe: bool,
}

impl Default for UnlitMaterial {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            map: None,
            wireframe: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Material {
    Physical(PhysicalMaterial),
    Unlit(UnlitMaterial),
}

impl Material {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Material::Physical(_) => "physical",
            Material::Unlit(_) => "unlit",
        }
    }

    pub fn as_physical(&self) -> Option<&PhysicalMaterial> {
        match self {
            Material::Physical(material) => Some(material),
            Material::Unlit(_) => None,
        }
    }

    pub fn as_physical_mut(&mut self) -> Option<&mut PhysicalMaterial> {
        match self {
            Material::Physical(material) => Some(material),
            Material::Unlit(_) => None,
        }
    }

    /// Texture currently bound to `channel`, if the material has that slot.
    pub fn channel_map(&self, channel: TextureChannel) -> Option<&Texture> {
        match (self, channel) {
            (Material::Physical(m), TextureChannel::BaseColor) => m.map.as_ref(),
            (Material::Physical(m), TextureChannel::Roughness) => m.roughness_map.as_ref(),
            (Material::Physical(m), TextureChannel::Metalness) => m.metalness_map.as_ref(),
            (Material::Physical(m), TextureChannel::AmbientOcclusion) => m.ao_map.as_ref(),
            (Material::Unlit(m), TextureChannel::BaseColor) => m.map.as_ref(),
            (Material::Unlit(_), _) => None,
        }
    }
}

/// Engine-side material construction.
pub trait MaterialFactory {
    fn create_pbr(&self) -> Material;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PhysicalMaterialFactory;

impl MaterialFactory for PhysicalMaterialFactory {
    fn create_pbr(&self) -> Material {
        Material::Physical(PhysicalMaterial::default())
    }
}
