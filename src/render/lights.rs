use crate::scene::{Entity, LightKind, LightNode, SceneGraph, SceneNode, Transform};
use crate::ui::ShadowSettings;
use glam::Vec3;

const KEY_LIGHT_DIRECTION: [f32; 3] = [-0.5, -1.0, -0.4];
const PARTICLE_ORBIT_RADIUS: f32 = 3.0;
const PARTICLE_ORBIT_HEIGHT: f32 = 1.5;
const PARTICLE_ORBIT_SPEED: f32 = 0.6;

/// Key directional light, orbiting point ("particle") light and ambient fill.
#[derive(Debug, Default)]
pub struct LightRig {
    directional: Option<Entity>,
    particle: Option<Entity>,
    ambient: Option<Entity>,
}

impl LightRig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install<S: SceneGraph>(&mut self, scene: &mut S, shadows: &ShadowSettings) {
        self.remove(scene);

        let direction = Vec3::from_array(KEY_LIGHT_DIRECTION).normalize();
        self.directional = Some(scene.add(SceneNode::Light(LightNode {
            name: "key light".to_string(),
            transform: Transform {
                translation: -direction * 10.0,
                ..Transform::IDENTITY
            },
            kind: LightKind::Directional {
                direction: direction.to_array(),
            },
            color: [1.0, 1.0, 1.0],
            intensity: 3.0,
            cast_shadow: directional_casts(shadows),
            shadow_map_size: shadows.resolution.pixels(),
        })));
        self.particle = Some(scene.add(SceneNode::Light(LightNode {
            name: "particle light".to_string(),
            transform: Transform {
                translation: particle_position(0.0),
                ..Transform::IDENTITY
            },
            kind: LightKind::Point {
                distance: 0.0,
                decay: 2.0,
            },
            color: [1.0, 0.9, 0.8],
            intensity: 2.0,
            cast_shadow: particle_casts(shadows),
            shadow_map_size: shadows.resolution.pixels(),
        })));
        self.ambient = Some(scene.add(SceneNode::Light(LightNode {
            name: "ambient".to_string(),
            transform: Transform::IDENTITY,
            kind: LightKind::Ambient,
            color: [1.0, 1.0, 1.0],
            intensity: 0.2,
            cast_shadow: false,
            shadow_map_size: shadows.resolution.pixels(),
        })));
        log::info!(
            "Light rig installed (shadows {}, {}px)",
            shadows.use_shadows,
            shadows.resolution.pixels()
        );
    }

    pub fn remove<S: SceneGraph>(&mut self, scene: &mut S) {
        for entity in [self.directional.take(), self.particle.take(), self.ambient.take()]
            .into_iter()
            .flatten()
        {
            scene.remove(entity);
        }
    }

    pub fn apply_shadows<S: SceneGraph>(&self, scene: &mut S, shadows: &ShadowSettings) {
        let updates = [
            (self.directional, directional_casts(shadows)),
            (self.particle, particle_casts(shadows)),
            (self.ambient, false),
        ];
        for (entity, cast_shadow) in updates {
            let Some(entity) = entity else {
                continue;
            };
            if let Some(SceneNode::Light(light)) = scene.node_mut(entity) {
                light.cast_shadow = cast_shadow;
                light.shadow_map_size = shadows.resolution.pixels();
            }
        }
        log::debug!("Shadow settings applied: {:?}", shadows);
    }

    /// Moves the particle light along its orbit.
    pub fn animate<S: SceneGraph>(&self, scene: &mut S, elapsed_secs: f32) {
        let Some(entity) = self.particle else {
            return;
        };
        if let Some(node) = scene.node_mut(entity) {
            node.transform_mut().translation = particle_position(elapsed_secs);
        }
    }
}

fn directional_casts(shadows: &ShadowSettings) -> bool {
    shadows.use_shadows && shadows.use_directional_light_shadow
}

fn particle_casts(shadows: &ShadowSettings) -> bool {
    shadows.use_shadows && shadows.use_particle_light_shadow
}

fn particle_position(elapsed_secs: f32) -> Vec3 {
    let angle = elapsed_secs * PARTICLE_ORBIT_SPEED;
    Vec3::new(
        angle.cos() * PARTICLE_ORBIT_RADIUS,
        PARTICLE_ORBIT_HEIGHT,
        angle.sin() * PARTICLE_ORBIT_RADIUS,
    )
}
