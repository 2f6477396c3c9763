//! Schema definitions and migration runner for SurrealDB.
//!
//! All table definitions use SCHEMAFULL mode for data integrity.
//! UUIDs are stored as strings. Enums are stored as lowercase strings
//! with ASSERT constraints matching the wire format.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1: initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Species catalog (global, admin-managed reference data)
-- =======================================================================
DEFINE TABLE species SCHEMAFULL;
DEFINE FIELD scientific_name ON TABLE species TYPE string;
DEFINE FIELD common_name ON TABLE species TYPE string;
DEFINE FIELD family ON TABLE species TYPE string;
DEFINE FIELD biome ON TABLE species TYPE string \
    ASSERT $value IN ['tropical', 'desert', 'temperate'];
DEFINE FIELD parameters ON TABLE species TYPE object;
DEFINE FIELD parameters.temperature ON TABLE species TYPE object;
DEFINE FIELD parameters.temperature.min ON TABLE species TYPE float \
    ASSERT $value >= 0 AND $value <= 50;
DEFINE FIELD parameters.temperature.max ON TABLE species TYPE float \
    ASSERT $value >= 0 AND $value <= 50;
DEFINE FIELD parameters.humidity ON TABLE species TYPE object;
DEFINE FIELD parameters.humidity.min ON TABLE species TYPE float \
    ASSERT $value >= 0 AND $value <= 100;
DEFINE FIELD parameters.humidity.max ON TABLE species TYPE float \
    ASSERT $value >= 0 AND $value <= 100;
DEFINE FIELD parameters.uv_index ON TABLE species TYPE float \
    ASSERT $value >= 0 AND $value <= 14;
DEFINE FIELD requirements ON TABLE species TYPE object;
DEFINE FIELD requirements.min_liters ON TABLE species TYPE int;
DEFINE FIELD requirements.min_height_cm ON TABLE species TYPE int;
DEFINE FIELD requirements.arboreal ON TABLE species TYPE bool \
    DEFAULT false;
DEFINE FIELD compatibility ON TABLE species TYPE array DEFAULT [];
DEFINE FIELD compatibility.* ON TABLE species TYPE string;
DEFINE FIELD image_url ON TABLE species TYPE option<string>;
DEFINE FIELD description ON TABLE species TYPE string DEFAULT '';
DEFINE FIELD created_at ON TABLE species TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE species TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_species_scientific_name ON TABLE species \
    COLUMNS scientific_name UNIQUE;
DEFINE INDEX idx_species_biome ON TABLE species COLUMNS biome;

-- =======================================================================
-- Terrariums (owner-scoped, soft delete)
-- =======================================================================
DEFINE TABLE terrarium SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE terrarium TYPE string;
DEFINE FIELD name ON TABLE terrarium TYPE string;
DEFINE FIELD dimensions ON TABLE terrarium TYPE object;
DEFINE FIELD dimensions.width_cm ON TABLE terrarium TYPE int \
    ASSERT $value >= 10;
DEFINE FIELD dimensions.depth_cm ON TABLE terrarium TYPE int \
    ASSERT $value >= 10;
DEFINE FIELD dimensions.height_cm ON TABLE terrarium TYPE int \
    ASSERT $value >= 10;
DEFINE FIELD kind ON TABLE terrarium TYPE string \
    ASSERT $value IN ['glass', 'mesh', 'hybrid'];
DEFINE FIELD biome ON TABLE terrarium TYPE string \
    ASSERT $value IN ['tropical', 'desert', 'temperate'];
DEFINE FIELD sensors ON TABLE terrarium TYPE object DEFAULT {};
DEFINE FIELD sensors.temperature ON TABLE terrarium \
    TYPE option<float>;
DEFINE FIELD sensors.humidity ON TABLE terrarium TYPE option<float>;
DEFINE FIELD sensors.last_updated ON TABLE terrarium \
    TYPE option<datetime>;
DEFINE FIELD image_url ON TABLE terrarium TYPE option<string>;
DEFINE FIELD notes ON TABLE terrarium TYPE string DEFAULT '';
DEFINE FIELD is_active ON TABLE terrarium TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE terrarium TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE terrarium TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_terrarium_owner_active ON TABLE terrarium \
    COLUMNS owner_id, is_active;

-- =======================================================================
-- Animals (owner-scoped, soft delete, back-reference to terrarium)
-- =======================================================================
DEFINE TABLE animal SCHEMAFULL;
DEFINE FIELD owner_id ON TABLE animal TYPE string;
DEFINE FIELD name ON TABLE animal TYPE string;
DEFINE FIELD sex ON TABLE animal TYPE string \
    ASSERT $value IN ['male', 'female', 'unknown'];
DEFINE FIELD birth_date ON TABLE animal TYPE option<string>;
DEFINE FIELD species_id ON TABLE animal TYPE string;
DEFINE FIELD terrarium_id ON TABLE animal TYPE option<string>;
DEFINE FIELD weight_grams ON TABLE animal TYPE option<float>;
DEFINE FIELD notes ON TABLE animal TYPE string DEFAULT '';
DEFINE FIELD image_url ON TABLE animal TYPE option<string>;
DEFINE FIELD gallery ON TABLE animal TYPE array DEFAULT [];
DEFINE FIELD gallery.* ON TABLE animal TYPE string;
DEFINE FIELD is_active ON TABLE animal TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE animal TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE animal TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_animal_owner_active ON TABLE animal \
    COLUMNS owner_id, is_active;
DEFINE INDEX idx_animal_terrarium ON TABLE animal \
    COLUMNS terrarium_id;
DEFINE INDEX idx_animal_species ON TABLE animal COLUMNS species_id;

-- =======================================================================
-- Users
-- =======================================================================
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD name ON TABLE user TYPE string;
DEFINE FIELD email ON TABLE user TYPE string;
DEFINE FIELD username ON TABLE user TYPE string;
DEFINE FIELD password_hash ON TABLE user TYPE string;
DEFINE FIELD role_id ON TABLE user TYPE string;
DEFINE FIELD is_active ON TABLE user TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE user TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_email ON TABLE user COLUMNS email UNIQUE;
DEFINE INDEX idx_user_username ON TABLE user COLUMNS username UNIQUE;

-- =======================================================================
-- Roles
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD name ON TABLE role TYPE string;
DEFINE FIELD slug ON TABLE role TYPE string;
DEFINE FIELD description ON TABLE role TYPE string DEFAULT '';
DEFINE FIELD permissions ON TABLE role TYPE array DEFAULT [];
DEFINE FIELD permissions.* ON TABLE role TYPE string;
DEFINE FIELD is_system ON TABLE role TYPE bool DEFAULT false;
DEFINE FIELD is_active ON TABLE role TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_slug ON TABLE role COLUMNS slug UNIQUE;

-- =======================================================================
-- Permissions
-- =======================================================================
DEFINE TABLE permission SCHEMAFULL;
DEFINE FIELD name ON TABLE permission TYPE string;
DEFINE FIELD slug ON TABLE permission TYPE string \
    ASSERT string::matches($value, '^[a-z_]+$');
DEFINE FIELD description ON TABLE permission TYPE string DEFAULT '';
DEFINE FIELD category ON TABLE permission TYPE string \
    ASSERT $value IN ['users', 'roles', 'terrariums', 'animals', \
    'species', 'system', 'general'];
DEFINE FIELD is_active ON TABLE permission TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE permission TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE permission TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_permission_slug ON TABLE permission \
    COLUMNS slug UNIQUE;
DEFINE INDEX idx_permission_category ON TABLE permission \
    COLUMNS category;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}
