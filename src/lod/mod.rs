mod controller;

pub use controller::{LodController, LodError};

use std::fmt;
use std::str::FromStr;

/// Discrete level of detail, ordered from most to least detailed.
///
/// The derived `Ord` is the load priority: `Lod1` is fetched first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum LodKey {
    Lod1,
    Lod2,
    Lod3,
    Lod4,
}

impl LodKey {
    pub const ALL: [LodKey; 4] = [LodKey::Lod1, LodKey::Lod2, LodKey::Lod3, LodKey::Lod4];

    pub fn as_str(self) -> &'static str {
        match self {
            LodKey::Lod1 => "lod1",
            LodKey::Lod2 => "lod2",
            LodKey::Lod3 => "lod3",
            LodKey::Lod4 => "lod4",
        }
    }
}

impl fmt::Display for LodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown LOD key '{0}' (expected lod1..lod4)")]
pub struct ParseLodKeyError(String);

impl FromStr for LodKey {
    type Err = ParseLodKeyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        LodKey::ALL
            .into_iter()
            .find(|key| key.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseLodKeyError(trimmed.to_string()))
    }
}
