//! Animal domain model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{VivariaError, VivariaResult};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animal {
    pub id: Uuid,
    /// Owning user. Only the owner (or an elevated role) may mutate.
    pub owner_id: Uuid,
    pub name: String,
    pub sex: Sex,
    pub birth_date: Option<NaiveDate>,
    /// Required species reference, fixed at creation in practice.
    /// Changing it while housed re-validates biome compatibility.
    pub species_id: Uuid,
    /// Current enclosure; `None` means unhoused. The only field the
    /// assignment coordinator mutates under compatibility control.
    pub terrarium_id: Option<Uuid>,
    pub weight_grams: Option<f64>,
    pub notes: String,
    pub image_url: Option<String>,
    pub gallery: Vec<String>,
    /// Soft-delete flag. Inactive animals are excluded from occupancy
    /// and every compatibility computation.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAnimal {
    pub owner_id: Uuid,
    pub name: String,
    pub sex: Sex,
    pub birth_date: Option<NaiveDate>,
    pub species_id: Uuid,
    pub terrarium_id: Option<Uuid>,
    pub weight_grams: Option<f64>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateAnimal {
    pub name: Option<String>,
    pub sex: Option<Sex>,
    /// `Some(Some(val))` = set, `Some(None)` = clear, `None` = no change.
    pub birth_date: Option<Option<NaiveDate>>,
    pub species_id: Option<Uuid>,
    /// `Some(Some(id))` = move into a terrarium, `Some(None)` = unhouse,
    /// `None` = leave untouched.
    pub terrarium_id: Option<Option<Uuid>>,
    pub weight_grams: Option<Option<f64>>,
    pub notes: Option<String>,
    pub image_url: Option<Option<String>>,
    pub gallery: Option<Vec<String>>,
}

impl CreateAnimal {
    pub fn validate(&self) -> VivariaResult<()> {
        if self.name.trim().is_empty() {
            return Err(VivariaError::Validation {
                message: "animal name is required".into(),
            });
        }
        if self.name.len() > 50 {
            return Err(VivariaError::Validation {
                message: "animal name must not exceed 50 characters".into(),
            });
        }
        if let Some(w) = self.weight_grams
            && w < 0.0
        {
            return Err(VivariaError::Validation {
                message: "weight_grams must not be negative".into(),
            });
        }
        Ok(())
    }
}
