use serde::{Deserialize, Serialize};
use tagflash_types::BuildingType;

/// Display snapshot of one building type's configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    pub building: BuildingType,
    /// Value written to tags right now.
    pub effective: u8,
    /// Catalogue default.
    pub default: u8,
    /// An override exists, even if it equals the default.
    pub overridden: bool,
}

/// Result of mapping a byte back to a building type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    Known(BuildingType),
    /// No type currently has this effective value. Not an error.
    Unknown(u8),
}

impl Resolution {
    pub fn building(&self) -> Option<BuildingType> {
        match self {
            Self::Known(t) => Some(*t),
            Self::Unknown(_) => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}
