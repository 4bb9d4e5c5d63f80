use super::LodKey;
use crate::assets::AssetStore;
use crate::render::synthesis::synthesize;
use crate::scene::material::{Material, MaterialFactory, PhysicalMaterialFactory};
use crate::scene::{Entity, SceneGraph, SceneNode, Transform};
use crate::ui::{MaterialParameters, ParameterState, ShadowSettings};

#[derive(Debug, thiserror::Error)]
pub enum LodError {
    #[error("LOD {0} not loaded")]
    NotLoaded(LodKey),
}

/// The scene-attached clone of one stored LOD.
#[derive(Debug)]
pub struct ActiveModel {
    key: LodKey,
    entity: Entity,
    /// Source material of every submesh, in traversal order.
    source_materials: Vec<Material>,
}

impl ActiveModel {
    pub fn entity(&self) -> Entity {
        self.entity
    }
}

/// Owns the displayed LOD and keeps its materials in sync with the
/// current parameters.
pub struct LodController<F: MaterialFactory = PhysicalMaterialFactory> {
    factory: F,
    active: Option<ActiveModel>,
}

impl LodController<PhysicalMaterialFactory> {
    pub fn new() -> Self {
        Self::with_factory(PhysicalMaterialFactory)
    }
}

impl Default for LodController<PhysicalMaterialFactory> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: MaterialFactory> LodController<F> {
    pub fn with_factory(factory: F) -> Self {
        Self {
            factory,
            active: None,
        }
    }

    pub fn active(&self) -> Option<&ActiveModel> {
        self.active.as_ref()
    }

    pub fn current_key(&self) -> Option<LodKey> {
        self.active().map(|model| model.key)
    }

    /// Replaces the displayed model with a fresh clone of `key`.
    ///
    /// Fails without touching the scene when `key` is not in `store`.
    pub fn switch_to<S: SceneGraph>(
        &mut self,
        key: LodKey,
        store: &AssetStore,
        scene: &mut S,
        params: &ParameterState,
    ) -> Result<(), LodError> {
        let Some(asset) = store.get(key) else {
            log::warn!(
                "Cannot switch to {}: not loaded (showing {:?})",
                key,
                self.current_key()
            );
            return Err(LodError::NotLoaded(key));
        };

        if let Some(previous) = self.active.take() {
            scene.remove(previous.entity);
        }

        let mut model = asset.mesh.clone();
        *model.transform_mut() = Transform::IDENTITY;

        let mut source_materials = Vec::new();
        let factory = &self.factory;
        let cast_shadows = params.shadows.use_shadows;
        model.visit_meshes_mut(&mut |mesh| {
            let source = mesh.material.clone();
            let mut target = factory.create_pbr();
            match synthesize(&mut target, Some(&source), key, &params.material, store) {
                Ok(()) => mesh.material = target,
                Err(err) => log::warn!("Skipping material for '{}': {}", mesh.name, err),
            }
            mesh.cast_shadow = cast_shadows;
            mesh.receive_shadow = cast_shadows;
            source_materials.push(source);
        });

        let entity = scene.add(model);
        log::info!(
            "Switched to {} ({} submeshes, entity {})",
            key,
            source_materials.len(),
            entity.id()
        );
        self.active = Some(ActiveModel {
            key,
            entity,
            source_materials,
        });
        Ok(())
    }

    /// Re-synthesizes every submesh material of the displayed model in place.
    /// Returns how many submeshes were updated.
    pub fn refresh_materials<S: SceneGraph>(
        &self,
        store: &AssetStore,
        scene: &mut S,
        params: &MaterialParameters,
    ) -> usize {
        let Some(model) = &self.active else {
            return 0;
        };
        let Some(node) = scene.node_mut(model.entity) else {
            log::warn!("Active model entity {} missing from scene", model.entity.id());
            return 0;
        };

        let factory = &self.factory;
        let mut index = 0;
        let mut updated = 0;
        node.visit_meshes_mut(&mut |mesh| {
            let source = model.source_materials.get(index);
            index += 1;
            let mut target = factory.create_pbr();
            match synthesize(&mut target, source, model.key, params, store) {
                Ok(()) => {
                    mesh.material = target;
                    updated += 1;
                }
                Err(err) => log::warn!("Skipping material for '{}': {}", mesh.name, err),
            }
        });
        log::debug!("Refreshed {} of {} materials", updated, index);
        updated
    }

    pub fn apply_shadows<S: SceneGraph>(&self, scene: &mut S, shadows: &ShadowSettings) {
        if let Some(node) = self.active_node_mut(scene) {
            let enabled = shadows.use_shadows;
            node.visit_meshes_mut(&mut |mesh| {
                mesh.cast_shadow = enabled;
                mesh.receive_shadow = enabled;
            });
        }
    }

    pub fn active_node_mut<'s, S: SceneGraph>(&self, scene: &'s mut S) -> Option<&'s mut SceneNode> {
        scene.node_mut(self.active()?.entity())
    }
}
