//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Occupancy is always derived by
//! query over the animal→terrarium back-reference; it is never stored
//! on the terrarium record.

use uuid::Uuid;

use crate::error::VivariaResult;
use crate::models::{
    animal::{Animal, CreateAnimal, UpdateAnimal},
    permission::{CreatePermission, Permission},
    role::{CreateRole, Role, UpdateRole},
    species::{Biome, CreateSpecies, Species, UpdateSpecies},
    terrarium::{CreateTerrarium, SensorReadings, Terrarium, UpdateTerrarium},
    user::{CreateUser, UpdateUser, User},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Filters for species catalog listing.
#[derive(Debug, Clone, Default)]
pub struct SpeciesFilter {
    pub biome: Option<Biome>,
    /// Case-insensitive substring match on common or scientific name.
    pub search: Option<String>,
}

// ---------------------------------------------------------------------------
// Species catalog (global, admin-managed reference data)
// ---------------------------------------------------------------------------

pub trait SpeciesRepository: Send + Sync {
    fn create(&self, input: CreateSpecies) -> impl Future<Output = VivariaResult<Species>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VivariaResult<Species>> + Send;
    fn get_by_scientific_name(
        &self,
        scientific_name: &str,
    ) -> impl Future<Output = VivariaResult<Species>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateSpecies,
    ) -> impl Future<Output = VivariaResult<Species>> + Send;
    /// Hard delete: the catalog has no soft-delete semantics.
    fn delete(&self, id: Uuid) -> impl Future<Output = VivariaResult<()>> + Send;
    fn list(
        &self,
        filter: SpeciesFilter,
        pagination: Pagination,
    ) -> impl Future<Output = VivariaResult<PaginatedResult<Species>>> + Send;
}

// ---------------------------------------------------------------------------
// Animals (owner-scoped, soft delete)
// ---------------------------------------------------------------------------

pub trait AnimalRepository: Send + Sync {
    fn create(&self, input: CreateAnimal) -> impl Future<Output = VivariaResult<Animal>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VivariaResult<Animal>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateAnimal,
    ) -> impl Future<Output = VivariaResult<Animal>> + Send;

    /// Soft delete / restore. Deactivating also clears the terrarium
    /// pointer so an inactive animal never occupies an enclosure.
    fn set_active(&self, id: Uuid, active: bool) -> impl Future<Output = VivariaResult<()>> + Send;

    /// The single-field commit the assignment coordinator performs.
    fn set_terrarium(
        &self,
        id: Uuid,
        terrarium_id: Option<Uuid>,
    ) -> impl Future<Output = VivariaResult<Animal>> + Send;

    /// Active occupants of a terrarium, optionally excluding one animal
    /// (the self-move case). Soft-deleted records never appear.
    fn find_active_by_terrarium(
        &self,
        terrarium_id: Uuid,
        exclude: Option<Uuid>,
    ) -> impl Future<Output = VivariaResult<Vec<Animal>>> + Send;

    /// Cascade on terrarium soft delete: clear the pointer on every
    /// animal assigned to it. Returns the number of animals unhoused.
    fn clear_terrarium(
        &self,
        terrarium_id: Uuid,
    ) -> impl Future<Output = VivariaResult<u64>> + Send;

    fn list_by_owner(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = VivariaResult<PaginatedResult<Animal>>> + Send;
}

// ---------------------------------------------------------------------------
// Terrariums (owner-scoped, soft delete)
// ---------------------------------------------------------------------------

pub trait TerrariumRepository: Send + Sync {
    fn create(
        &self,
        input: CreateTerrarium,
    ) -> impl Future<Output = VivariaResult<Terrarium>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VivariaResult<Terrarium>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateTerrarium,
    ) -> impl Future<Output = VivariaResult<Terrarium>> + Send;
    fn set_active(&self, id: Uuid, active: bool) -> impl Future<Output = VivariaResult<()>> + Send;

    /// Store last-known sensor readings. Telemetry only; no control
    /// action is ever derived from these.
    fn record_sensors(
        &self,
        id: Uuid,
        readings: SensorReadings,
    ) -> impl Future<Output = VivariaResult<Terrarium>> + Send;

    fn list_by_owner(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = VivariaResult<PaginatedResult<Terrarium>>> + Send;
}

// ---------------------------------------------------------------------------
// Users, roles, permissions (RBAC surface)
// ---------------------------------------------------------------------------

pub trait UserRepository: Send + Sync {
    fn create(&self, input: CreateUser) -> impl Future<Output = VivariaResult<User>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VivariaResult<User>> + Send;
    fn get_by_email(&self, email: &str) -> impl Future<Output = VivariaResult<User>> + Send;
    fn get_by_username(&self, username: &str)
    -> impl Future<Output = VivariaResult<User>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateUser,
    ) -> impl Future<Output = VivariaResult<User>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = VivariaResult<PaginatedResult<User>>> + Send;
}

pub trait RoleRepository: Send + Sync {
    fn create(&self, input: CreateRole) -> impl Future<Output = VivariaResult<Role>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VivariaResult<Role>> + Send;
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = VivariaResult<Role>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateRole,
    ) -> impl Future<Output = VivariaResult<Role>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = VivariaResult<PaginatedResult<Role>>> + Send;

    /// Resolve a role's granted permissions in one call, the input to
    /// the per-request capability set.
    fn permissions_for_role(
        &self,
        role_id: Uuid,
    ) -> impl Future<Output = VivariaResult<Vec<Permission>>> + Send;
}

pub trait PermissionRepository: Send + Sync {
    fn create(
        &self,
        input: CreatePermission,
    ) -> impl Future<Output = VivariaResult<Permission>> + Send;
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = VivariaResult<Permission>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = VivariaResult<PaginatedResult<Permission>>> + Send;
}
