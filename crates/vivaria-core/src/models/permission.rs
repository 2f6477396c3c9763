//! Permission domain model — a single grantable capability.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    pub name: String,
    /// Stable machine identifier (`[a-z_]+`), e.g. `manage_species`.
    pub slug: String,
    pub description: String,
    /// Grouping for admin display (`users`, `terrariums`, `system`, …).
    pub category: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePermission {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub category: String,
}
