pub mod controls;

use crate::lod::LodKey;
use std::fmt;

/// User-tunable PBR inputs read by material synthesis.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MaterialParameters {
    pub color: [f32; 3],
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
    pub normal_scale: [f32; 2],
    pub use_base_color_map: bool,
    pub use_aorm_maps: bool,
    pub normal_map_enabled: bool,
    pub wireframe_enabled: bool,
    pub double_sided: bool,
    /// Normal map source. Independent of the displayed LOD unless
    /// `normal_map_tracks_lod` is set.
    pub selected_normal_map: LodKey,
    pub normal_map_tracks_lod: bool,
}

impl Default for MaterialParameters {
    fn default() -> Self {
        Self {
            color: [1.0, 1.0, 1.0],
            roughness: 0.5,
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
            normal_scale: [1.0, 1.0],
            use_base_color_map: true,
            use_aorm_maps: true,
            normal_map_enabled: true,
            wireframe_enabled: false,
            double_sided: false,
            selected_normal_map: LodKey::Lod1,
            normal_map_tracks_lod: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum ShadowResolution {
    R256,
    R512,
    R1024,
    R2048,
    R4096,
}

impl ShadowResolution {
    pub const ALL: [ShadowResolution; 5] = [
        ShadowResolution::R256,
        ShadowResolution::R512,
        ShadowResolution::R1024,
        ShadowResolution::R2048,
        ShadowResolution::R4096,
    ];

    pub fn pixels(self) -> u32 {
        match self {
            ShadowResolution::R256 => 256,
            ShadowResolution::R512 => 512,
            ShadowResolution::R1024 => 1024,
            ShadowResolution::R2048 => 2048,
            ShadowResolution::R4096 => 4096,
        }
    }
}

impl From<ShadowResolution> for u32 {
    fn from(value: ShadowResolution) -> Self {
        value.pixels()
    }
}

impl TryFrom<u32> for ShadowResolution {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        ShadowResolution::ALL
            .into_iter()
            .find(|resolution| resolution.pixels() == value)
            .ok_or_else(|| format!("unsupported shadow map size {value}"))
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    pub use_shadows: bool,
    pub use_directional_light_shadow: bool,
    pub use_particle_light_shadow: bool,
    pub resolution: ShadowResolution,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            use_shadows: true,
            use_directional_light_shadow: true,
            use_particle_light_shadow: false,
            resolution: ShadowResolution::R1024,
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentMap {
    VeniceSunset,
    RoyalEsplanade,
    StudioSmall,
}

impl EnvironmentMap {
    pub const ALL: [EnvironmentMap; 3] = [
        EnvironmentMap::VeniceSunset,
        EnvironmentMap::RoyalEsplanade,
        EnvironmentMap::StudioSmall,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            EnvironmentMap::VeniceSunset => "venice_sunset",
            EnvironmentMap::RoyalEsplanade => "royal_esplanade",
            EnvironmentMap::StudioSmall => "studio_small",
        }
    }
}

impl fmt::Display for EnvironmentMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EnvironmentSettings {
    pub map: EnvironmentMap,
    pub intensity: f32,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            map: EnvironmentMap::VeniceSunset,
            intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    pub lod: LodKey,
    pub rotate_plane: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            lod: LodKey::Lod1,
            rotate_plane: false,
        }
    }
}

/// Everything the control surface can edit. One long-lived instance is
/// created at startup and passed by reference to whoever reads it.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ParameterState {
    pub material: MaterialParameters,
    pub shadows: ShadowSettings,
    pub environment: EnvironmentSettings,
    pub general: GeneralSettings,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_resolution_serializes_as_pixel_count() {
        let json = serde_json::to_string(&ShadowResolution::R2048).unwrap();
        assert_eq!(json, "2048");
        let parsed: ShadowResolution = serde_json::from_str("512").unwrap();
        assert_eq!(parsed, ShadowResolution::R512);
        assert!(serde_json::from_str::<ShadowResolution>("1000").is_err());
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let json = r#"{ "material": { "roughness": 0.9 }, "general": { "lod": "lod3" } }"#;
        let state: ParameterState = serde_json::from_str(json).unwrap();
        assert_eq!(state.material.roughness, 0.9);
        assert_eq!(state.material.ior, MaterialParameters::default().ior);
        assert_eq!(state.general.lod, LodKey::Lod3);
        assert_eq!(state.shadows, ShadowSettings::default());
    }

    #[test]
    fn environment_names_are_stable() {
        let names: Vec<&str> = EnvironmentMap::ALL.iter().map(|map| map.as_str()).collect();
        assert_eq!(names, ["venice_sunset", "royal_esplanade", "studio_small"]);
        let json = serde_json::to_string(&EnvironmentMap::RoyalEsplanade).unwrap();
        assert_eq!(json, "\"royal_esplanade\"");
    }
}
