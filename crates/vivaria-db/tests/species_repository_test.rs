//! Integration tests for the species catalog repository using
//! in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use vivaria_core::error::VivariaError;
use vivaria_core::models::species::{
    Biome, CreateSpecies, EnvironmentalParameters, Range, SpaceRequirements, UpdateSpecies,
};
use vivaria_core::repository::{Pagination, SpeciesFilter, SpeciesRepository};
use vivaria_db::repository::SurrealSpeciesRepository;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    vivaria_db::run_migrations(&db).await.unwrap();
    db
}

fn leopard_gecko() -> CreateSpecies {
    CreateSpecies {
        scientific_name: "Eublepharis macularius".into(),
        common_name: "Leopard Gecko".into(),
        family: "Eublepharidae".into(),
        biome: Biome::Desert,
        parameters: EnvironmentalParameters {
            temperature: Range {
                min: 24.0,
                max: 32.0,
            },
            humidity: Range {
                min: 30.0,
                max: 40.0,
            },
            uv_index: 2.0,
        },
        requirements: SpaceRequirements {
            min_liters: 75,
            min_height_cm: 30,
            arboreal: false,
        },
        compatibility: Some(vec!["solitary".into(), "female-groups".into()]),
        image_url: None,
        description: Some("Nocturnal ground gecko, good for beginners.".into()),
    }
}

fn crested_gecko() -> CreateSpecies {
    CreateSpecies {
        scientific_name: "Correlophus ciliatus".into(),
        common_name: "Crested Gecko".into(),
        family: "Diplodactylidae".into(),
        biome: Biome::Tropical,
        parameters: EnvironmentalParameters {
            temperature: Range {
                min: 22.0,
                max: 27.0,
            },
            humidity: Range {
                min: 60.0,
                max: 80.0,
            },
            uv_index: 2.0,
        },
        requirements: SpaceRequirements {
            min_liters: 60,
            min_height_cm: 45,
            arboreal: true,
        },
        compatibility: Some(vec!["communal".into()]),
        image_url: None,
        description: None,
    }
}

#[tokio::test]
async fn create_and_get_species() {
    let db = setup().await;
    let repo = SurrealSpeciesRepository::new(db);

    let created = repo.create(leopard_gecko()).await.unwrap();
    assert_eq!(created.scientific_name, "Eublepharis macularius");
    assert_eq!(created.biome, Biome::Desert);
    assert_eq!(created.parameters.temperature.min, 24.0);
    assert_eq!(created.requirements.min_liters, 75);
    assert_eq!(created.compatibility, vec!["solitary", "female-groups"]);

    let fetched = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.parameters, created.parameters);
}

#[tokio::test]
async fn get_by_scientific_name() {
    let db = setup().await;
    let repo = SurrealSpeciesRepository::new(db);

    let created = repo.create(leopard_gecko()).await.unwrap();
    let fetched = repo
        .get_by_scientific_name("Eublepharis macularius")
        .await
        .unwrap();
    assert_eq!(fetched.id, created.id);
}

#[tokio::test]
async fn duplicate_scientific_name_is_rejected() {
    let db = setup().await;
    let repo = SurrealSpeciesRepository::new(db);

    repo.create(leopard_gecko()).await.unwrap();
    let result = repo.create(leopard_gecko()).await;
    assert!(result.is_err(), "unique index must reject the duplicate");
}

#[tokio::test]
async fn invalid_parameters_never_reach_storage() {
    let db = setup().await;
    let repo = SurrealSpeciesRepository::new(db);

    let mut input = leopard_gecko();
    input.parameters.temperature = Range {
        min: 30.0,
        max: 20.0,
    };
    let err = repo.create(input).await.unwrap_err();
    assert!(matches!(err, VivariaError::Validation { .. }));

    let mut input = leopard_gecko();
    input.parameters.humidity = Range {
        min: -5.0,
        max: 40.0,
    };
    let err = repo.create(input).await.unwrap_err();
    assert!(matches!(err, VivariaError::Validation { .. }));
}

#[tokio::test]
async fn update_species_parameters() {
    let db = setup().await;
    let repo = SurrealSpeciesRepository::new(db);

    let created = repo.create(leopard_gecko()).await.unwrap();
    let updated = repo
        .update(
            created.id,
            UpdateSpecies {
                parameters: Some(EnvironmentalParameters {
                    temperature: Range {
                        min: 25.0,
                        max: 33.0,
                    },
                    humidity: Range {
                        min: 30.0,
                        max: 45.0,
                    },
                    uv_index: 3.0,
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.parameters.temperature.max, 33.0);
    assert_eq!(updated.parameters.uv_index, 3.0);
    assert_eq!(updated.scientific_name, created.scientific_name); // unchanged
}

#[tokio::test]
async fn list_filters_by_biome_and_search() {
    let db = setup().await;
    let repo = SurrealSpeciesRepository::new(db);

    repo.create(leopard_gecko()).await.unwrap();
    repo.create(crested_gecko()).await.unwrap();

    let desert_only = repo
        .list(
            SpeciesFilter {
                biome: Some(Biome::Desert),
                search: None,
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(desert_only.total, 1);
    assert_eq!(desert_only.items[0].common_name, "Leopard Gecko");

    let geckos = repo
        .list(
            SpeciesFilter {
                biome: None,
                search: Some("gecko".into()),
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(geckos.total, 2);

    let crested = repo
        .list(
            SpeciesFilter {
                biome: None,
                search: Some("ciliatus".into()),
            },
            Pagination::default(),
        )
        .await
        .unwrap();
    assert_eq!(crested.total, 1);
}

#[tokio::test]
async fn delete_species() {
    let db = setup().await;
    let repo = SurrealSpeciesRepository::new(db);

    let created = repo.create(leopard_gecko()).await.unwrap();
    repo.delete(created.id).await.unwrap();

    let result = repo.get_by_id(created.id).await;
    assert!(matches!(result, Err(VivariaError::NotFound { .. })));
}
