//! Integration tests for the terrarium repository using in-memory
//! SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;
use vivaria_core::error::VivariaError;
use vivaria_core::models::species::Biome;
use vivaria_core::models::terrarium::{
    CreateTerrarium, Dimensions, SensorReadings, TerrariumKind, UpdateTerrarium,
};
use vivaria_core::repository::{Pagination, TerrariumRepository};
use vivaria_db::repository::SurrealTerrariumRepository;

/// Helper: spin up in-memory DB and run migrations.
async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    vivaria_db::run_migrations(&db).await.unwrap();
    db
}

fn vivarium(owner: Uuid, name: &str) -> CreateTerrarium {
    CreateTerrarium {
        owner_id: owner,
        name: name.into(),
        dimensions: Dimensions {
            width_cm: 90,
            depth_cm: 45,
            height_cm: 60,
        },
        kind: TerrariumKind::Glass,
        biome: Biome::Tropical,
        image_url: None,
        notes: Some("planted build".into()),
    }
}

#[tokio::test]
async fn create_and_get_terrarium() {
    let db = setup().await;
    let repo = SurrealTerrariumRepository::new(db);
    let owner = Uuid::new_v4();

    let created = repo.create(vivarium(owner, "Rainforest 90")).await.unwrap();
    assert_eq!(created.name, "Rainforest 90");
    assert_eq!(created.owner_id, owner);
    assert_eq!(created.kind, TerrariumKind::Glass);
    assert_eq!(created.biome, Biome::Tropical);
    assert!(created.is_active);
    assert_eq!(created.sensors, SensorReadings::default());
    // 90 * 45 * 60 = 243_000 cm³ -> 243 L, derived rather than stored.
    assert_eq!(created.liters(), 243);

    let fetched = repo.get_by_id(created.id).await.unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.dimensions, created.dimensions);
}

#[tokio::test]
async fn undersized_dimensions_are_rejected() {
    let db = setup().await;
    let repo = SurrealTerrariumRepository::new(db);

    let mut input = vivarium(Uuid::new_v4(), "Too Small");
    input.dimensions.width_cm = 9;
    let err = repo.create(input).await.unwrap_err();
    assert!(matches!(err, VivariaError::Validation { .. }));
}

#[tokio::test]
async fn update_terrarium_fields() {
    let db = setup().await;
    let repo = SurrealTerrariumRepository::new(db);

    let created = repo
        .create(vivarium(Uuid::new_v4(), "Before"))
        .await
        .unwrap();

    let updated = repo
        .update(
            created.id,
            UpdateTerrarium {
                name: Some("After".into()),
                kind: Some(TerrariumKind::Hybrid),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "After");
    assert_eq!(updated.kind, TerrariumKind::Hybrid);
    assert_eq!(updated.biome, created.biome); // unchanged
    assert!(updated.updated_at >= created.updated_at);
}

#[tokio::test]
async fn record_sensors_stores_last_known_readings() {
    let db = setup().await;
    let repo = SurrealTerrariumRepository::new(db);

    let created = repo
        .create(vivarium(Uuid::new_v4(), "Sensored"))
        .await
        .unwrap();

    let stamp = chrono::Utc::now();
    let updated = repo
        .record_sensors(
            created.id,
            SensorReadings {
                temperature: Some(26.4),
                humidity: Some(71.0),
                last_updated: Some(stamp),
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.sensors.temperature, Some(26.4));
    assert_eq!(updated.sensors.humidity, Some(71.0));
    assert!(updated.sensors.last_updated.is_some());
}

#[tokio::test]
async fn list_by_owner_skips_inactive() {
    let db = setup().await;
    let repo = SurrealTerrariumRepository::new(db);
    let owner = Uuid::new_v4();

    let keep = repo.create(vivarium(owner, "Keep")).await.unwrap();
    let drop = repo.create(vivarium(owner, "Drop")).await.unwrap();
    repo.create(vivarium(Uuid::new_v4(), "Other"))
        .await
        .unwrap();

    repo.set_active(drop.id, false).await.unwrap();

    let page = repo.list_by_owner(owner, Pagination::default()).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, keep.id);
}
