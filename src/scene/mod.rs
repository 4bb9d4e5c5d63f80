pub mod material;
pub mod serialization;

use glam::{Quat, Vec3};
use material::{Material, Texture};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Handle of a node attached to a [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(u32);

impl Entity {
    pub fn id(self) -> u32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    /// Canonical origin placement.
    pub const IDENTITY: Transform = Transform {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_position_rotation_scale(
        position: [f32; 3],
        rotation_deg: [f32; 3],
        scale: [f32; 3],
    ) -> Self {
        // Rotation order: Z (roll) * Y (yaw) * X (pitch)
        let rotation = Quat::from_rotation_z(rotation_deg[2].to_radians())
            * Quat::from_rotation_y(rotation_deg[1].to_radians())
            * Quat::from_rotation_x(rotation_deg[0].to_radians());
        Self {
            translation: Vec3::from_array(position),
            rotation,
            scale: Vec3::from_array(scale),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Vertex/index data shared between an asset and all of its clones.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Geometry {
    pub positions: Vec<[f32; 3]>,
    pub indices: Option<Vec<u32>>,
}

impl Geometry {
    pub fn triangle_count(&self) -> u64 {
        match &self.indices {
            Some(indices) => (indices.len() / 3) as u64,
            None => (self.positions.len() / 3) as u64,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshNode {
    pub name: String,
    pub transform: Transform,
    pub geometry: Arc<Geometry>,
    pub material: Material,
    pub cast_shadow: bool,
    pub receive_shadow: bool,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupNode {
    pub name: String,
    pub transform: Transform,
    pub children: Vec<SceneNode>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Ambient,
    Directional { direction: [f32; 3] },
    Point { distance: f32, decay: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LightNode {
    pub name: String,
    pub transform: Transform,
    pub kind: LightKind,
    pub color: [f32; 3],
    pub intensity: f32,
    pub cast_shadow: bool,
    pub shadow_map_size: u32,
}

/// Closed set of node kinds the harness traverses.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneNode {
    Mesh(MeshNode),
    Group(GroupNode),
    Light(LightNode),
}

impl SceneNode {
    pub fn name(&self) -> &str {
        match self {
            SceneNode::Mesh(node) => &node.name,
            SceneNode::Group(node) => &node.name,
            SceneNode::Light(node) => &node.name,
        }
    }

    pub fn transform(&self) -> &Transform {
        match self {
            SceneNode::Mesh(node) => &node.transform,
            SceneNode::Group(node) => &node.transform,
            SceneNode::Light(node) => &node.transform,
        }
    }

    pub fn transform_mut(&mut self) -> &mut Transform {
        match self {
            SceneNode::Mesh(node) => &mut node.transform,
            SceneNode::Group(node) => &mut node.transform,
            SceneNode::Light(node) => &mut node.transform,
        }
    }

    /// Depth-first, pre-order visit of every mesh below (and including) this node.
    pub fn visit_meshes<F: FnMut(&MeshNode)>(&self, f: &mut F) {
        match self {
            SceneNode::Mesh(mesh) => f(mesh),
            SceneNode::Group(group) => {
                for child in &group.children {
                    child.visit_meshes(f);
                }
            }
            SceneNode::Light(_) => {}
        }
    }

    /// Same order as [`SceneNode::visit_meshes`].
    pub fn visit_meshes_mut<F: FnMut(&mut MeshNode)>(&mut self, f: &mut F) {
        match self {
            SceneNode::Mesh(mesh) => f(mesh),
            SceneNode::Group(group) => {
                for child in &mut group.children {
                    child.visit_meshes_mut(f);
                }
            }
            SceneNode::Light(_) => {}
        }
    }

    pub fn mesh_count(&self) -> usize {
        let mut count = 0;
        self.visit_meshes(&mut |_| count += 1);
        count
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Environment {
    pub name: String,
    pub texture: Texture,
    pub intensity: f32,
}

/// Per-frame statistics shown next to the controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub triangles: u64,
    pub draw_calls: u32,
}

/// The engine's scene graph as seen by the harness.
pub trait SceneGraph {
    fn add(&mut self, node: SceneNode) -> Entity;
    fn remove(&mut self, entity: Entity) -> Option<SceneNode>;
    fn node(&self, entity: Entity) -> Option<&SceneNode>;
    fn node_mut(&mut self, entity: Entity) -> Option<&mut SceneNode>;
    fn set_environment(&mut self, environment: Option<Environment>);
    fn stats(&self) -> RenderStats;
}

/// In-memory scene graph.
#[derive(Debug, Default)]
pub struct Scene {
    nodes: BTreeMap<Entity, SceneNode>,
    next_id: u32,
    environment: Option<Environment>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn environment(&self) -> Option<&Environment> {
        self.environment.as_ref()
    }
}

impl SceneGraph for Scene {
    fn add(&mut self, node: SceneNode) -> Entity {
        let entity = Entity(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        log::debug!("Scene add {:?} '{}'", entity, node.name());
        self.nodes.insert(entity, node);
        entity
    }

    fn remove(&mut self, entity: Entity) -> Option<SceneNode> {
        let removed = self.nodes.remove(&entity);
        if removed.is_some() {
            log::debug!("Scene remove {:?}", entity);
        }
        removed
    }

    fn node(&self, entity: Entity) -> Option<&SceneNode> {
        self.nodes.get(&entity)
    }

    fn node_mut(&mut self, entity: Entity) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&entity)
    }

    fn set_environment(&mut self, environment: Option<Environment>) {
        self.environment = environment;
    }

    fn stats(&self) -> RenderStats {
        let mut stats = RenderStats::default();
        for node in self.nodes.values() {
            node.visit_meshes(&mut |mesh| {
                if mesh.visible {
                    stats.triangles += mesh.geometry.triangle_count();
                    stats.draw_calls += 1;
                }
            });
        }
        stats
    }
}
