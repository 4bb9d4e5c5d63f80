use crate::assets::LodSource;
use crate::lod::LodKey;
use crate::ui::controls::clamp_parameters;
use crate::ui::{EnvironmentMap, ParameterState};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Startup description of the harness: where assets live and the initial
/// parameter values.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub asset_root: PathBuf,
    pub lods: Vec<LodSource>,
    pub environments: BTreeMap<EnvironmentMap, String>,
    pub parameters: ParameterState,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let lods = LodKey::ALL
            .into_iter()
            .map(|key| LodSource {
                key,
                mesh: format!("models/{key}.json"),
                normal_map: format!("textures/normal_{key}.png"),
                base_color_map: None,
                aorm_map: None,
            })
            .collect();
        let environments = EnvironmentMap::ALL
            .into_iter()
            .map(|map| (map, format!("textures/equirectangular/{}_1k.hdr", map.as_str())))
            .collect();
        Self {
            asset_root: PathBuf::from("assets"),
            lods,
            environments,
            parameters: ParameterState::default(),
        }
    }
}

impl HarnessConfig {
    pub fn environment_path(&self, map: EnvironmentMap) -> Option<&str> {
        self.environments.get(&map).map(String::as_str)
    }
}

pub fn load_config(path: &Path) -> Result<HarnessConfig, ConfigError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: HarnessConfig =
        serde_json::from_str(&json).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    clamp_parameters(&mut config.parameters);
    log::info!(
        "Loaded config {} ({} LOD sources, root {})",
        path.display(),
        config.lods.len(),
        config.asset_root.display()
    );
    Ok(config)
}
