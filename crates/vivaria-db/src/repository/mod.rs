//! SurrealDB repository implementations.

mod animal;
mod permission;
mod role;
mod species;
mod terrarium;
mod user;

pub use animal::SurrealAnimalRepository;
pub use permission::SurrealPermissionRepository;
pub use role::SurrealRoleRepository;
pub use species::SurrealSpeciesRepository;
pub use terrarium::SurrealTerrariumRepository;
pub use user::SurrealUserRepository;

use vivaria_core::models::species::Biome;

use crate::error::DbError;

pub(crate) fn parse_biome(s: &str) -> Result<Biome, DbError> {
    match s {
        "tropical" => Ok(Biome::Tropical),
        "desert" => Ok(Biome::Desert),
        "temperate" => Ok(Biome::Temperate),
        other => Err(DbError::Migration(format!("unknown biome: {other}"))),
    }
}
