//! Idempotent bootstrap data: base permissions, system roles, and a
//! starter species catalog.
//!
//! Every record is keyed by its unique slug or scientific name, so
//! re-running the seed on an already-populated database is a no-op.

use surrealdb::{Connection, Surreal};
use tracing::info;
use uuid::Uuid;
use vivaria_core::error::{VivariaError, VivariaResult};
use vivaria_core::models::permission::{CreatePermission, Permission};
use vivaria_core::models::role::CreateRole;
use vivaria_core::models::species::{
    Biome, CreateSpecies, EnvironmentalParameters, Range, SpaceRequirements,
};
use vivaria_core::repository::{PermissionRepository, RoleRepository, SpeciesRepository};
use vivaria_db::repository::{
    SurrealPermissionRepository, SurrealRoleRepository, SurrealSpeciesRepository,
};

struct PermissionSeed {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    category: &'static str,
}

const BASE_PERMISSIONS: &[PermissionSeed] = &[
    PermissionSeed {
        name: "Manage Users",
        slug: "manage_users",
        description: "Create, edit, and delete users",
        category: "users",
    },
    PermissionSeed {
        name: "View Users",
        slug: "view_users",
        description: "List the system's users",
        category: "users",
    },
    PermissionSeed {
        name: "Manage Roles",
        slug: "manage_roles",
        description: "Create, edit, and delete roles",
        category: "roles",
    },
    PermissionSeed {
        name: "Manage All Terrariums",
        slug: "manage_all_terrariums",
        description: "Access terrariums of every user",
        category: "terrariums",
    },
    PermissionSeed {
        name: "View All Terrariums",
        slug: "view_all_terrariums",
        description: "See terrariums of every user",
        category: "terrariums",
    },
    PermissionSeed {
        name: "Manage All Animals",
        slug: "manage_all_animals",
        description: "Access animals of every user",
        category: "animals",
    },
    PermissionSeed {
        name: "Manage Species",
        slug: "manage_species",
        description: "Create, edit, and delete catalog species",
        category: "species",
    },
    PermissionSeed {
        name: "View Statistics",
        slug: "view_statistics",
        description: "See system-wide statistics",
        category: "system",
    },
    PermissionSeed {
        name: "Access Admin Panel",
        slug: "access_admin_panel",
        description: "Open the administration panel",
        category: "system",
    },
];

fn starter_species() -> Vec<CreateSpecies> {
    let species = |scientific: &str,
                   common: &str,
                   family: &str,
                   biome: Biome,
                   temp: (f64, f64),
                   hum: (f64, f64),
                   uv: f64,
                   liters: u32,
                   height: u32,
                   arboreal: bool,
                   tags: &[&str],
                   description: &str| CreateSpecies {
        scientific_name: scientific.into(),
        common_name: common.into(),
        family: family.into(),
        biome,
        parameters: EnvironmentalParameters {
            temperature: Range {
                min: temp.0,
                max: temp.1,
            },
            humidity: Range {
                min: hum.0,
                max: hum.1,
            },
            uv_index: uv,
        },
        requirements: SpaceRequirements {
            min_liters: liters,
            min_height_cm: height,
            arboreal,
        },
        compatibility: Some(tags.iter().map(|t| t.to_string()).collect()),
        image_url: None,
        description: Some(description.into()),
    };

    vec![
        species(
            "Eublepharis macularius",
            "Leopard Gecko",
            "Eublepharidae",
            Biome::Desert,
            (24.0, 32.0),
            (30.0, 40.0),
            2.0,
            75,
            30,
            false,
            &["solitary", "female-groups"],
            "Nocturnal gecko from Afghanistan, Pakistan, and India. A good beginner species.",
        ),
        species(
            "Correlophus ciliatus",
            "Crested Gecko",
            "Diplodactylidae",
            Biome::Tropical,
            (22.0, 27.0),
            (60.0, 80.0),
            2.0,
            60,
            45,
            true,
            &["communal", "female-groups"],
            "Arboreal gecko from New Caledonia. Needs no special lighting and handles well.",
        ),
        species(
            "Python regius",
            "Ball Python",
            "Pythonidae",
            Biome::Tropical,
            (26.0, 32.0),
            (50.0, 60.0),
            0.0,
            120,
            30,
            false,
            &["solitary"],
            "African snake known for curling into a ball when threatened.",
        ),
        species(
            "Pogona vitticeps",
            "Bearded Dragon",
            "Agamidae",
            Biome::Desert,
            (25.0, 40.0),
            (30.0, 40.0),
            10.0,
            200,
            40,
            false,
            &["solitary", "male-female-pair"],
            "Australian lizard, popular for its sociable temperament.",
        ),
        species(
            "Dendrobates tinctorius",
            "Dyeing Poison Dart Frog",
            "Dendrobatidae",
            Biome::Tropical,
            (22.0, 26.0),
            (80.0, 100.0),
            2.0,
            40,
            30,
            false,
            &["communal", "same-species-groups"],
            "Vividly colored frog from Suriname. Loses its toxicity in captivity.",
        ),
    ]
}

async fn ensure_permission<C: Connection>(
    repo: &SurrealPermissionRepository<C>,
    seed: &PermissionSeed,
) -> VivariaResult<Permission> {
    match repo.get_by_slug(seed.slug).await {
        Ok(existing) => Ok(existing),
        Err(VivariaError::NotFound { .. }) => {
            repo.create(CreatePermission {
                name: seed.name.into(),
                slug: seed.slug.into(),
                description: seed.description.into(),
                category: seed.category.into(),
            })
            .await
        }
        Err(e) => Err(e),
    }
}

async fn ensure_role<C: Connection>(
    repo: &SurrealRoleRepository<C>,
    input: CreateRole,
) -> VivariaResult<()> {
    match repo.get_by_slug(&input.slug).await {
        Ok(_) => Ok(()),
        Err(VivariaError::NotFound { .. }) => {
            info!(slug = %input.slug, "Creating system role");
            repo.create(input).await?;
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Seed base permissions, the `admin` and `keeper` system roles, and
/// the starter species catalog.
pub async fn run<C: Connection>(db: &Surreal<C>) -> VivariaResult<()> {
    let permissions = SurrealPermissionRepository::new(db.clone());
    let roles = SurrealRoleRepository::new(db.clone());
    let species = SurrealSpeciesRepository::new(db.clone());

    let mut all_permission_ids: Vec<Uuid> = Vec::with_capacity(BASE_PERMISSIONS.len());
    for seed in BASE_PERMISSIONS {
        let permission = ensure_permission(&permissions, seed).await?;
        all_permission_ids.push(permission.id);
    }
    info!(count = BASE_PERMISSIONS.len(), "Base permissions ensured");

    // Admin holds every capability; keeper works only on owned records.
    ensure_role(
        &roles,
        CreateRole {
            name: "Administrator".into(),
            slug: "admin".into(),
            description: "Full system access".into(),
            permissions: all_permission_ids,
            is_system: true,
        },
    )
    .await?;
    ensure_role(
        &roles,
        CreateRole {
            name: "Keeper".into(),
            slug: "keeper".into(),
            description: "Manages own terrariums and animals".into(),
            permissions: vec![],
            is_system: true,
        },
    )
    .await?;

    let mut created = 0;
    for input in starter_species() {
        match species.get_by_scientific_name(&input.scientific_name).await {
            Ok(_) => {}
            Err(VivariaError::NotFound { .. }) => {
                species.create(input).await?;
                created += 1;
            }
            Err(e) => return Err(e),
        }
    }
    info!(created, "Starter species catalog ensured");

    Ok(())
}
