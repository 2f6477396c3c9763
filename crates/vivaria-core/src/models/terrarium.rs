//! Terrarium domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{VivariaError, VivariaResult};
use crate::models::species::Biome;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TerrariumKind {
    Glass,
    Mesh,
    Hybrid,
}

/// Enclosure dimensions in centimeters. Each side must be at least
/// 10 cm.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Dimensions {
    pub width_cm: u32,
    pub depth_cm: u32,
    pub height_cm: u32,
}

/// Last-known sensor readings. Write-only telemetry: the system
/// stores them for display and never closes a control loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
pub struct SensorReadings {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Terrarium {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub dimensions: Dimensions,
    pub kind: TerrariumKind,
    /// Declared at creation, independent of occupants.
    pub biome: Biome,
    pub sensors: SensorReadings,
    pub image_url: Option<String>,
    pub notes: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Terrarium {
    /// Volume in liters, derived from dimensions, never stored.
    pub fn liters(&self) -> u32 {
        let Dimensions {
            width_cm,
            depth_cm,
            height_cm,
        } = self.dimensions;
        let cubic_cm = width_cm as f64 * depth_cm as f64 * height_cm as f64;
        (cubic_cm / 1000.0).round() as u32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTerrarium {
    pub owner_id: Uuid,
    pub name: String,
    pub dimensions: Dimensions,
    pub kind: TerrariumKind,
    pub biome: Biome,
    pub image_url: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateTerrarium {
    pub name: Option<String>,
    pub dimensions: Option<Dimensions>,
    pub kind: Option<TerrariumKind>,
    pub biome: Option<Biome>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub image_url: Option<Option<String>>,
    pub notes: Option<String>,
}

impl Dimensions {
    pub fn validate(&self) -> VivariaResult<()> {
        if self.width_cm < 10 || self.depth_cm < 10 || self.height_cm < 10 {
            return Err(VivariaError::Validation {
                message: "each terrarium dimension must be at least 10 cm".into(),
            });
        }
        Ok(())
    }
}

impl CreateTerrarium {
    pub fn validate(&self) -> VivariaResult<()> {
        if self.name.trim().is_empty() {
            return Err(VivariaError::Validation {
                message: "terrarium name is required".into(),
            });
        }
        if self.name.len() > 100 {
            return Err(VivariaError::Validation {
                message: "terrarium name must not exceed 100 characters".into(),
            });
        }
        self.dimensions.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Terrarium {
        Terrarium {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            name: "Test".into(),
            dimensions: Dimensions {
                width_cm: 60,
                depth_cm: 45,
                height_cm: 45,
            },
            kind: TerrariumKind::Glass,
            biome: Biome::Tropical,
            sensors: SensorReadings::default(),
            image_url: None,
            notes: String::new(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn liters_rounds_cubic_centimeters() {
        // 60 * 45 * 45 = 121_500 cm³ -> 121.5 L -> rounds to 122.
        assert_eq!(base().liters(), 122);
    }

    #[test]
    fn dimensions_below_minimum_rejected() {
        let mut t = base();
        t.dimensions.height_cm = 9;
        assert!(t.dimensions.validate().is_err());
    }
}
