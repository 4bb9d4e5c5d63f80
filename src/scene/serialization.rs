use crate::ui::controls::clamp_parameters;
use crate::ui::ParameterState;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SerializationError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SerializationError>;

pub fn save_preset_to_file(params: &ParameterState, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(params)?;
    std::fs::write(path, json)?;
    log::info!("Preset saved to {}", path.display());
    Ok(())
}

/// Missing fields take their defaults; out-of-range values are clamped.
pub fn load_preset_from_file(path: &Path) -> Result<ParameterState> {
    let json = std::fs::read_to_string(path)?;
    let mut params: ParameterState = serde_json::from_str(&json)?;
    clamp_parameters(&mut params);
    log::info!("Preset loaded from {}", path.display());
    Ok(params)
}
