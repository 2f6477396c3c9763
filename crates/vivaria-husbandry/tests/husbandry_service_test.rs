//! Integration tests for the husbandry service, wired against the
//! SurrealDB repositories on the in-memory engine.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db, Mem};
use uuid::Uuid;
use vivaria_core::compat::EnvelopeAxis;
use vivaria_core::error::VivariaError;
use vivaria_core::models::animal::{Animal, CreateAnimal, Sex, UpdateAnimal};
use vivaria_core::models::species::{
    Biome, CreateSpecies, EnvironmentalParameters, Range, SpaceRequirements, Species,
};
use vivaria_core::models::terrarium::{CreateTerrarium, Dimensions, Terrarium, TerrariumKind};
use vivaria_core::repository::{AnimalRepository, SpeciesRepository};
use vivaria_db::repository::{
    SurrealAnimalRepository, SurrealSpeciesRepository, SurrealTerrariumRepository,
};
use vivaria_husbandry::access::{AccessContext, caps};
use vivaria_husbandry::service::HusbandryService;

type Service = HusbandryService<
    SurrealAnimalRepository<Db>,
    SurrealTerrariumRepository<Db>,
    SurrealSpeciesRepository<Db>,
>;

struct TestEnv {
    svc: Service,
    animals: SurrealAnimalRepository<Db>,
    species: SurrealSpeciesRepository<Db>,
    keeper: AccessContext,
    desert_gecko: Species,
    desert_dragon: Species,
    tropical_frog: Species,
}

fn species_input(
    scientific_name: &str,
    common_name: &str,
    biome: Biome,
    temp: (f64, f64),
    hum: (f64, f64),
) -> CreateSpecies {
    CreateSpecies {
        scientific_name: scientific_name.into(),
        common_name: common_name.into(),
        family: "Testidae".into(),
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
            uv_index: 2.0,
        },
        requirements: SpaceRequirements {
            min_liters: 60,
            min_height_cm: 30,
            arboreal: false,
        },
        compatibility: None,
        image_url: None,
        description: None,
    }
}

fn animal_input(owner: Uuid, name: &str, sex: Sex, species: &Species) -> CreateAnimal {
    CreateAnimal {
        owner_id: owner,
        name: name.into(),
        sex,
        birth_date: None,
        species_id: species.id,
        terrarium_id: None,
        weight_grams: None,
        notes: None,
        image_url: None,
    }
}

fn terrarium_input(owner: Uuid, name: &str, biome: Biome) -> CreateTerrarium {
    CreateTerrarium {
        owner_id: owner,
        name: name.into(),
        dimensions: Dimensions {
            width_cm: 60,
            depth_cm: 45,
            height_cm: 45,
        },
        kind: TerrariumKind::Glass,
        biome,
        image_url: None,
        notes: None,
    }
}

/// Spin up the in-memory DB, run migrations, seed three species, and
/// build a service plus a plain keeper context.
async fn setup() -> TestEnv {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    vivaria_db::run_migrations(&db).await.unwrap();

    let species = SurrealSpeciesRepository::new(db.clone());
    let animals = SurrealAnimalRepository::new(db.clone());
    let terrariums = SurrealTerrariumRepository::new(db.clone());

    let desert_gecko = species
        .create(species_input(
            "Eublepharis macularius",
            "Leopard Gecko",
            Biome::Desert,
            (24.0, 32.0),
            (30.0, 40.0),
        ))
        .await
        .unwrap();
    let desert_dragon = species
        .create(species_input(
            "Pogona vitticeps",
            "Bearded Dragon",
            Biome::Desert,
            (25.0, 40.0),
            (30.0, 40.0),
        ))
        .await
        .unwrap();
    let tropical_frog = species
        .create(species_input(
            "Dendrobates tinctorius",
            "Dyeing Poison Dart Frog",
            Biome::Tropical,
            (22.0, 26.0),
            (80.0, 100.0),
        ))
        .await
        .unwrap();

    let svc = HusbandryService::new(animals.clone(), terrariums, species.clone());
    let keeper = AccessContext::with_permissions(Uuid::new_v4(), []);

    TestEnv {
        svc,
        animals,
        species,
        keeper,
        desert_gecko,
        desert_dragon,
        tropical_frog,
    }
}

impl TestEnv {
    async fn terrarium(&self, biome: Biome) -> Terrarium {
        self.svc
            .create_terrarium(
                &self.keeper,
                terrarium_input(self.keeper.user_id, "Enclosure", biome),
            )
            .await
            .unwrap()
    }

    async fn housed_animal(&self, name: &str, sex: Sex, species: &Species, t: &Terrarium) -> Animal {
        let mut input = animal_input(self.keeper.user_id, name, sex, species);
        input.terrarium_id = Some(t.id);
        self.svc.create_animal(&self.keeper, input).await.unwrap()
    }
}

// -----------------------------------------------------------------------
// Assignment: biome gate
// -----------------------------------------------------------------------

#[tokio::test]
async fn empty_terrarium_accepts_any_species() {
    let env = setup().await;
    // Declared biome is independent of occupants: a frog may enter a
    // terrarium declared desert as long as no occupant conflicts.
    let t = env.terrarium(Biome::Desert).await;

    let frog = env
        .housed_animal("Azul", Sex::Female, &env.tropical_frog, &t)
        .await;
    assert_eq!(frog.terrarium_id, Some(t.id));
}

#[tokio::test]
async fn mixed_biome_creation_is_rejected_with_diagnostics() {
    let env = setup().await;
    let t = env.terrarium(Biome::Desert).await;
    env.housed_animal("G", Sex::Female, &env.desert_gecko, &t)
        .await;

    let mut input = animal_input(env.keeper.user_id, "F", Sex::Female, &env.tropical_frog);
    input.terrarium_id = Some(t.id);
    let err = env.svc.create_animal(&env.keeper, input).await.unwrap_err();

    let VivariaError::BiomeConflict(conflict) = err else {
        panic!("expected BiomeConflict, got {err:?}");
    };
    assert_eq!(conflict.new_biome, Biome::Tropical);
    assert_eq!(conflict.existing_biomes, vec![Biome::Desert]);
    assert_eq!(conflict.existing_animals.len(), 1);
    assert_eq!(conflict.existing_animals[0].name, "G");
    assert_eq!(conflict.existing_animals[0].biome, Some(Biome::Desert));

    // The rejected animal was never created.
    let occupants = env
        .animals
        .find_active_by_terrarium(t.id, None)
        .await
        .unwrap();
    assert_eq!(occupants.len(), 1);
}

#[tokio::test]
async fn mixed_biome_move_leaves_pointer_untouched() {
    let env = setup().await;
    let desert = env.terrarium(Biome::Desert).await;
    let tropical = env.terrarium(Biome::Tropical).await;
    env.housed_animal("G", Sex::Female, &env.desert_gecko, &desert)
        .await;
    let frog = env
        .housed_animal("Azul", Sex::Female, &env.tropical_frog, &tropical)
        .await;

    let err = env
        .svc
        .assign_animal(&env.keeper, frog.id, Some(desert.id))
        .await
        .unwrap_err();
    assert!(matches!(err, VivariaError::BiomeConflict(_)));

    // Rejection is fully rolled back; the frog stays where it was.
    let frog = env.animals.get_by_id(frog.id).await.unwrap();
    assert_eq!(frog.terrarium_id, Some(tropical.id));
}

#[tokio::test]
async fn same_biome_cohabitation_is_accepted() {
    let env = setup().await;
    let t = env.terrarium(Biome::Desert).await;
    env.housed_animal("G", Sex::Female, &env.desert_gecko, &t)
        .await;

    let dragon = env
        .housed_animal("Rex", Sex::Female, &env.desert_dragon, &t)
        .await;
    assert_eq!(dragon.terrarium_id, Some(t.id));
}

#[tokio::test]
async fn self_move_never_conflicts() {
    let env = setup().await;
    let t = env.terrarium(Biome::Desert).await;
    let gecko = env
        .housed_animal("G", Sex::Female, &env.desert_gecko, &t)
        .await;

    // Re-assigning to the same terrarium must not see the animal as
    // its own incompatible neighbor.
    let moved = env
        .svc
        .assign_animal(&env.keeper, gecko.id, Some(t.id))
        .await
        .unwrap();
    assert_eq!(moved.terrarium_id, Some(t.id));
}

#[tokio::test]
async fn unhousing_is_always_accepted() {
    let env = setup().await;
    let t = env.terrarium(Biome::Desert).await;
    let gecko = env
        .housed_animal("G", Sex::Female, &env.desert_gecko, &t)
        .await;

    let removed = env
        .svc
        .assign_animal(&env.keeper, gecko.id, None)
        .await
        .unwrap();
    assert_eq!(removed.terrarium_id, None);
}

#[tokio::test]
async fn soft_deleted_occupants_do_not_block() {
    let env = setup().await;
    let t = env.terrarium(Biome::Desert).await;
    let gecko = env
        .housed_animal("G", Sex::Female, &env.desert_gecko, &t)
        .await;

    env.svc.remove_animal(&env.keeper, gecko.id).await.unwrap();

    // The inactive gecko no longer establishes the biome.
    let mut input = animal_input(env.keeper.user_id, "Azul", Sex::Female, &env.tropical_frog);
    input.terrarium_id = Some(t.id);
    let frog = env.svc.create_animal(&env.keeper, input).await.unwrap();
    assert_eq!(frog.terrarium_id, Some(t.id));

    // And its own pointer was cleared on deactivation.
    let gecko = env.animals.get_by_id(gecko.id).await.unwrap();
    assert!(!gecko.is_active);
    assert_eq!(gecko.terrarium_id, None);
}

#[tokio::test]
async fn species_change_while_housed_revalidates_biome() {
    let env = setup().await;
    let t = env.terrarium(Biome::Desert).await;
    env.housed_animal("Rex", Sex::Female, &env.desert_dragon, &t)
        .await;
    let gecko = env
        .housed_animal("G", Sex::Female, &env.desert_gecko, &t)
        .await;

    // Reclassifying the gecko as a tropical species would put a
    // tropical animal next to the desert dragon.
    let err = env
        .svc
        .update_animal(
            &env.keeper,
            gecko.id,
            UpdateAnimal {
                species_id: Some(env.tropical_frog.id),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, VivariaError::BiomeConflict(_)));

    let gecko = env.animals.get_by_id(gecko.id).await.unwrap();
    assert_eq!(gecko.species_id, env.desert_gecko.id);
}

#[tokio::test]
async fn concurrent_incompatible_assigns_are_linearized() {
    let env = setup().await;
    let t = env.terrarium(Biome::Desert).await;

    let gecko = env
        .svc
        .create_animal(
            &env.keeper,
            animal_input(env.keeper.user_id, "G", Sex::Female, &env.desert_gecko),
        )
        .await
        .unwrap();
    let frog = env
        .svc
        .create_animal(
            &env.keeper,
            animal_input(env.keeper.user_id, "F", Sex::Female, &env.tropical_frog),
        )
        .await
        .unwrap();

    // Both validated against the same empty terrarium would both pass;
    // the per-terrarium lock forces one to observe the other's commit.
    let (a, b) = tokio::join!(
        env.svc.assign_animal(&env.keeper, gecko.id, Some(t.id)),
        env.svc.assign_animal(&env.keeper, frog.id, Some(t.id)),
    );

    let outcomes = [a, b];
    let committed = outcomes.iter().filter(|r| r.is_ok()).count();
    let rejected = outcomes
        .iter()
        .filter(|r| matches!(r, Err(VivariaError::BiomeConflict(_))))
        .count();
    assert_eq!(committed, 1, "exactly one assign must commit");
    assert_eq!(rejected, 1, "the loser must see a biome conflict");

    let occupants = env
        .animals
        .find_active_by_terrarium(t.id, None)
        .await
        .unwrap();
    assert_eq!(occupants.len(), 1);
}

// -----------------------------------------------------------------------
// Cascade and advisory reads
// -----------------------------------------------------------------------

#[tokio::test]
async fn terrarium_removal_unhouses_every_resident() {
    let env = setup().await;
    let t = env.terrarium(Biome::Desert).await;
    let g1 = env
        .housed_animal("G1", Sex::Female, &env.desert_gecko, &t)
        .await;
    let g2 = env
        .housed_animal("G2", Sex::Female, &env.desert_gecko, &t)
        .await;

    env.svc.remove_terrarium(&env.keeper, t.id).await.unwrap();

    for id in [g1.id, g2.id] {
        let animal = env.animals.get_by_id(id).await.unwrap();
        assert_eq!(animal.terrarium_id, None);
        assert!(animal.is_active);
    }

    // The terrarium itself is gone from the addressable set.
    let err = env
        .svc
        .terrarium_profile(&env.keeper, t.id)
        .await
        .unwrap_err();
    assert!(matches!(err, VivariaError::NotFound { .. }));
}

#[tokio::test]
async fn two_males_of_one_species_flag_the_advisory() {
    let env = setup().await;
    let t = env.terrarium(Biome::Desert).await;
    env.housed_animal("G1", Sex::Male, &env.desert_gecko, &t)
        .await;

    // Same species means same biome, so the mutation is accepted.
    let g2 = env
        .housed_animal("G2", Sex::Male, &env.desert_gecko, &t)
        .await;
    assert_eq!(g2.terrarium_id, Some(t.id));

    // The advisory surfaces on the next read.
    let profile = env
        .svc
        .terrarium_profile(&env.keeper, t.id)
        .await
        .unwrap();
    assert!(profile.has_compatibility_issue);
}

#[tokio::test]
async fn profile_reports_the_intersected_envelope() {
    let env = setup().await;
    let a = env
        .species
        .create(species_input(
            "Testus unus",
            "Low Band",
            Biome::Tropical,
            (20.0, 25.0),
            (50.0, 70.0),
        ))
        .await
        .unwrap();
    let b = env
        .species
        .create(species_input(
            "Testus duo",
            "High Band",
            Biome::Tropical,
            (23.0, 30.0),
            (60.0, 80.0),
        ))
        .await
        .unwrap();

    let t = env.terrarium(Biome::Tropical).await;
    env.housed_animal("A", Sex::Unknown, &a, &t).await;
    env.housed_animal("B", Sex::Unknown, &b, &t).await;

    let profile = env
        .svc
        .terrarium_profile(&env.keeper, t.id)
        .await
        .unwrap();
    let envelope = profile.envelope.unwrap();
    assert!(envelope.is_compatible);
    assert_eq!(envelope.temperature.min, 23.0);
    assert_eq!(envelope.temperature.max, 25.0);
    assert_eq!(envelope.humidity.min, 60.0);
    assert_eq!(envelope.humidity.max, 70.0);
    assert!(!profile.has_compatibility_issue);
}

#[tokio::test]
async fn disjoint_ranges_surface_as_advisory_not_rejection() {
    let env = setup().await;
    let cold = env
        .species
        .create(species_input(
            "Testus frigidus",
            "Cold Keeper",
            Biome::Desert,
            (20.0, 22.0),
            (30.0, 40.0),
        ))
        .await
        .unwrap();
    let hot = env
        .species
        .create(species_input(
            "Testus fervidus",
            "Heat Keeper",
            Biome::Desert,
            (25.0, 30.0),
            (30.0, 40.0),
        ))
        .await
        .unwrap();

    let t = env.terrarium(Biome::Desert).await;
    env.housed_animal("Frosty", Sex::Unknown, &cold, &t).await;
    // Same biome, so housing them together is permitted…
    env.housed_animal("Ember", Sex::Unknown, &hot, &t).await;

    // …but the read warns that no single range satisfies both.
    let profile = env
        .svc
        .terrarium_profile(&env.keeper, t.id)
        .await
        .unwrap();
    let envelope = profile.envelope.unwrap();
    assert!(!envelope.is_compatible);
    assert_eq!(envelope.temperature.min, 25.0);
    assert_eq!(envelope.temperature.max, 22.0);
    assert_eq!(envelope.errors.len(), 1);
    assert_eq!(envelope.errors[0].axis, EnvelopeAxis::Temperature);
}

#[tokio::test]
async fn list_terrariums_enriches_each_entry() {
    let env = setup().await;
    let t1 = env.terrarium(Biome::Desert).await;
    env.housed_animal("G1", Sex::Male, &env.desert_gecko, &t1)
        .await;
    env.housed_animal("G2", Sex::Male, &env.desert_gecko, &t1)
        .await;
    let t2 = env.terrarium(Biome::Tropical).await;

    let page = env
        .svc
        .list_terrariums(&env.keeper, Default::default())
        .await
        .unwrap();
    assert_eq!(page.total, 2);

    let flagged = page.items.iter().find(|p| p.terrarium.id == t1.id).unwrap();
    assert!(flagged.has_compatibility_issue);
    let quiet = page.items.iter().find(|p| p.terrarium.id == t2.id).unwrap();
    assert!(!quiet.has_compatibility_issue);
    assert!(quiet.envelope.is_none());
}

// -----------------------------------------------------------------------
// Ownership and validation
// -----------------------------------------------------------------------

#[tokio::test]
async fn foreign_terrarium_requires_elevated_capability() {
    let env = setup().await;
    let t = env.terrarium(Biome::Desert).await;

    let stranger = AccessContext::with_permissions(Uuid::new_v4(), []);
    let animal = env
        .svc
        .create_animal(
            &env.keeper,
            animal_input(env.keeper.user_id, "G", Sex::Female, &env.desert_gecko),
        )
        .await
        .unwrap();

    // A stranger may move neither the animal nor use the terrarium.
    let err = env
        .svc
        .assign_animal(&stranger, animal.id, Some(t.id))
        .await
        .unwrap_err();
    assert!(matches!(err, VivariaError::PermissionDenied { .. }));

    // An elevated context bypasses both ownership checks.
    let admin = AccessContext::with_permissions(
        Uuid::new_v4(),
        [
            caps::MANAGE_ALL_ANIMALS.to_string(),
            caps::MANAGE_ALL_TERRARIUMS.to_string(),
        ],
    );
    let moved = env
        .svc
        .assign_animal(&admin, animal.id, Some(t.id))
        .await
        .unwrap();
    assert_eq!(moved.terrarium_id, Some(t.id));
}

#[tokio::test]
async fn species_writes_require_the_catalog_capability() {
    let env = setup().await;

    let err = env
        .svc
        .create_species(
            &env.keeper,
            species_input(
                "Testus novus",
                "New Species",
                Biome::Temperate,
                (18.0, 24.0),
                (40.0, 60.0),
            ),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, VivariaError::PermissionDenied { .. }));

    let curator =
        AccessContext::with_permissions(Uuid::new_v4(), [caps::MANAGE_SPECIES.to_string()]);
    let created = env
        .svc
        .create_species(
            &curator,
            species_input(
                "Testus novus",
                "New Species",
                Biome::Temperate,
                (18.0, 24.0),
                (40.0, 60.0),
            ),
        )
        .await
        .unwrap();
    assert_eq!(created.common_name, "New Species");
}

#[tokio::test]
async fn unknown_species_reference_is_rejected() {
    let env = setup().await;
    let mut input = animal_input(env.keeper.user_id, "G", Sex::Female, &env.desert_gecko);
    input.species_id = Uuid::new_v4();

    let err = env.svc.create_animal(&env.keeper, input).await.unwrap_err();
    assert!(matches!(err, VivariaError::NotFound { .. }));
}

#[tokio::test]
async fn assigning_to_a_removed_terrarium_fails() {
    let env = setup().await;
    let t = env.terrarium(Biome::Desert).await;
    let gecko = env
        .svc
        .create_animal(
            &env.keeper,
            animal_input(env.keeper.user_id, "G", Sex::Female, &env.desert_gecko),
        )
        .await
        .unwrap();

    env.svc.remove_terrarium(&env.keeper, t.id).await.unwrap();

    let err = env
        .svc
        .assign_animal(&env.keeper, gecko.id, Some(t.id))
        .await
        .unwrap_err();
    assert!(matches!(err, VivariaError::NotFound { .. }));
}

#[tokio::test]
async fn malformed_input_is_rejected_before_the_engine_runs() {
    let env = setup().await;

    let mut bad_terrarium = terrarium_input(env.keeper.user_id, "Tiny", Biome::Desert);
    bad_terrarium.dimensions.height_cm = 5;
    let err = env
        .svc
        .create_terrarium(&env.keeper, bad_terrarium)
        .await
        .unwrap_err();
    assert!(matches!(err, VivariaError::Validation { .. }));

    let bad_animal = animal_input(env.keeper.user_id, "", Sex::Unknown, &env.desert_gecko);
    let err = env
        .svc
        .create_animal(&env.keeper, bad_animal)
        .await
        .unwrap_err();
    assert!(matches!(err, VivariaError::Validation { .. }));
}
