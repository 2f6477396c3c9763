//! Role domain model — a named set of permissions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    /// Permission ids granted to this role.
    pub permissions: Vec<Uuid>,
    /// System roles (e.g. `admin`) cannot be deleted.
    pub is_system: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub permissions: Vec<Uuid>,
    pub is_system: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<Vec<Uuid>>,
    pub is_active: Option<bool>,
}
