//! Species domain model — the read-mostly catalog of keepable animals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{VivariaError, VivariaResult};

/// Coarse climate category shared by species and terrariums. The
/// primary hard-compatibility axis: a terrarium only ever houses
/// animals from a single biome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Biome {
    Tropical,
    Desert,
    Temperate,
}

impl Biome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Biome::Tropical => "tropical",
            Biome::Desert => "desert",
            Biome::Temperate => "temperate",
        }
    }
}

impl std::fmt::Display for Biome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive numeric range. Used for temperature (°C) and relative
/// humidity (%).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

/// Environmental parameters a species requires its enclosure to hold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentalParameters {
    /// Required temperature range in °C (bounds within 0–50).
    pub temperature: Range,
    /// Required relative humidity range in % (bounds within 0–100).
    pub humidity: Range,
    /// Required UV index (0–14).
    pub uv_index: f64,
}

/// Minimum enclosure space a species needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpaceRequirements {
    pub min_liters: u32,
    pub min_height_cm: u32,
    pub arboreal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    pub id: Uuid,
    pub scientific_name: String,
    pub common_name: String,
    pub family: String,
    pub biome: Biome,
    pub parameters: EnvironmentalParameters,
    pub requirements: SpaceRequirements,
    /// Free-form husbandry tags (e.g. `solitary`, `communal`,
    /// `female-groups`). Descriptive metadata only; never
    /// mechanically enforced by the compatibility engine.
    pub compatibility: Vec<String>,
    pub image_url: Option<String>,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSpecies {
    pub scientific_name: String,
    pub common_name: String,
    pub family: String,
    pub biome: Biome,
    pub parameters: EnvironmentalParameters,
    pub requirements: SpaceRequirements,
    pub compatibility: Option<Vec<String>>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateSpecies {
    pub common_name: Option<String>,
    pub family: Option<String>,
    pub parameters: Option<EnvironmentalParameters>,
    pub requirements: Option<SpaceRequirements>,
    pub compatibility: Option<Vec<String>>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub image_url: Option<Option<String>>,
    pub description: Option<String>,
}

impl EnvironmentalParameters {
    /// Validate bounds and ordering. Rejected inputs never reach the
    /// compatibility engine or storage.
    pub fn validate(&self) -> VivariaResult<()> {
        let check = |range: &Range, label: &str, lo: f64, hi: f64| {
            if range.min < lo || range.max > hi {
                return Err(VivariaError::Validation {
                    message: format!("{label} bounds must lie within {lo}..={hi}"),
                });
            }
            if range.min > range.max {
                return Err(VivariaError::Validation {
                    message: format!("{label} min must not exceed max"),
                });
            }
            Ok(())
        };
        check(&self.temperature, "temperature", 0.0, 50.0)?;
        check(&self.humidity, "humidity", 0.0, 100.0)?;
        if !(0.0..=14.0).contains(&self.uv_index) {
            return Err(VivariaError::Validation {
                message: "uv_index must lie within 0..=14".into(),
            });
        }
        Ok(())
    }
}

impl CreateSpecies {
    pub fn validate(&self) -> VivariaResult<()> {
        if self.scientific_name.trim().is_empty() {
            return Err(VivariaError::Validation {
                message: "scientific_name is required".into(),
            });
        }
        if self.common_name.trim().is_empty() {
            return Err(VivariaError::Validation {
                message: "common_name is required".into(),
            });
        }
        self.parameters.validate()
    }
}
