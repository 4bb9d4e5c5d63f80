use crate::assets::AssetStore;
use crate::lod::LodKey;
use crate::scene::material::{Material, Side, Texture, TextureChannel};
use crate::ui::MaterialParameters;

const NEUTRAL_TINT: [f32; 3] = [1.0, 1.0, 1.0];

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("material synthesis needs a PBR-capable target, got a {kind} material")]
    InvalidMaterialTarget { kind: &'static str },
}

/// Writes the complete material state for one submesh into `target`.
///
/// Every field is overwritten, so repeated calls with the same inputs leave
/// the target in the same state. Map slots resolve from the submesh's
/// source material first and then from the per-LOD defaults in `store`;
/// the normal map always comes from `params.selected_normal_map`.
pub fn synthesize(
    target: &mut Material,
    source: Option<&Material>,
    lod: LodKey,
    params: &MaterialParameters,
    store: &AssetStore,
) -> Result<(), SynthesisError> {
    let kind = target.kind_name();
    let Some(material) = target.as_physical_mut() else {
        return Err(SynthesisError::InvalidMaterialTarget { kind });
    };

    let resolve = |enabled: bool, channel: TextureChannel| -> Option<Texture> {
        if !enabled {
            return None;
        }
        source
            .and_then(|source| source.channel_map(channel))
            .or_else(|| store.default_texture(lod, channel))
            .cloned()
    };

    material.map = resolve(params.use_base_color_map, TextureChannel::BaseColor);
    material.roughness_map = resolve(params.use_aorm_maps, TextureChannel::Roughness);
    material.metalness_map = resolve(params.use_aorm_maps, TextureChannel::Metalness);
    material.ao_map = resolve(params.use_aorm_maps, TextureChannel::AmbientOcclusion);

    material.normal_map = if params.normal_map_enabled {
        let normal = store.normal_map(params.selected_normal_map).cloned();
        if normal.is_none() {
            log::debug!(
                "Normal map for {} not loaded yet; rendering without one",
                params.selected_normal_map
            );
        }
        normal
    } else {
        None
    };
    material.normal_scale = params.normal_scale;
    material.wireframe = params.wireframe_enabled;

    material.color = if material.map.is_some() {
        NEUTRAL_TINT
    } else {
        params.color
    };

    material.roughness = params.roughness;
    material.metalness = params.metalness;
    material.clearcoat = params.clearcoat;
    material.clearcoat_roughness = params.clearcoat_roughness;
    material.transmission = params.transmission;
    material.thickness = params.thickness;
    material.ior = params.ior;
    material.reflectivity = params.reflectivity;
    material.sheen = params.sheen;
    material.sheen_roughness = params.sheen_roughness;
    material.sheen_color = params.sheen_color;
    material.specular_intensity = params.specular_intensity;
    material.specular_color = params.specular_color;
    material.iridescence = params.iridescence;
    material.iridescence_ior = params.iridescence_ior;
    material.iridescence_thickness_range = params.iridescence_thickness_range;

    material.side = if params.double_sided {
        Side::Double
    } else {
        Side::Front
    };
    Ok(())
}
