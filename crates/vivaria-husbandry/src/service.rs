//! Husbandry service — terrarium assignment coordination and enriched
//! reads.
//!
//! The compatibility engine is pure; this service is the only place a
//! detected conflict becomes a rejected mutation. Every mutation ends
//! committed or rejected; a rejected assignment leaves the animal's
//! terrarium pointer untouched.

use chrono::Utc;
use tracing::info;
use uuid::Uuid;
use vivaria_core::compat::{
    self, BiomeCheck, EnvironmentalEnvelope, Occupant,
};
use vivaria_core::error::{VivariaError, VivariaResult};
use vivaria_core::models::animal::{Animal, CreateAnimal, UpdateAnimal};
use vivaria_core::models::species::{CreateSpecies, Species, UpdateSpecies};
use vivaria_core::models::terrarium::{
    CreateTerrarium, SensorReadings, Terrarium, UpdateTerrarium,
};
use vivaria_core::repository::{
    AnimalRepository, PaginatedResult, Pagination, SpeciesFilter, SpeciesRepository,
    TerrariumRepository,
};

use crate::access::{AccessContext, caps};
use crate::locks::TerrariumLocks;

/// A terrarium enriched with everything the compatibility engine can
/// say about its current occupants. Computed on every read, never
/// cached or stored.
#[derive(Debug, Clone)]
pub struct TerrariumProfile {
    pub terrarium: Terrarium,
    pub occupants: Vec<Occupant>,
    pub has_compatibility_issue: bool,
    /// `None` when no occupant has a resolved species.
    pub envelope: Option<EnvironmentalEnvelope>,
}

/// Husbandry service.
///
/// Generic over repository implementations so that the coordination
/// layer has no dependency on the database crate.
pub struct HusbandryService<A, T, S>
where
    A: AnimalRepository,
    T: TerrariumRepository,
    S: SpeciesRepository,
{
    animals: A,
    terrariums: T,
    species: S,
    locks: TerrariumLocks,
}

impl<A, T, S> HusbandryService<A, T, S>
where
    A: AnimalRepository,
    T: TerrariumRepository,
    S: SpeciesRepository,
{
    pub fn new(animals: A, terrariums: T, species: S) -> Self {
        Self {
            animals,
            terrariums,
            species,
            locks: TerrariumLocks::new(),
        }
    }

    // -------------------------------------------------------------------
    // Assignment coordination
    // -------------------------------------------------------------------

    /// Move an animal into a terrarium (or out of any, with `None`).
    ///
    /// Removing an animal never creates a conflict and is accepted
    /// unconditionally. Moving into a terrarium runs the biome gate
    /// against the target's current occupants, excluding the animal
    /// itself so a self-move can never conflict with itself.
    pub async fn assign_animal(
        &self,
        ctx: &AccessContext,
        animal_id: Uuid,
        target: Option<Uuid>,
    ) -> VivariaResult<Animal> {
        // 1. Load the animal; soft-deleted animals are not addressable.
        let animal = self.active_animal(animal_id).await?;
        ctx.authorize_owned(animal.owner_id, caps::MANAGE_ALL_ANIMALS)?;

        // 2. Unhousing is always accepted.
        let Some(target_id) = target else {
            return self.animals.set_terrarium(animal_id, None).await;
        };

        // 3. The caller must control the target terrarium too.
        let terrarium = self.active_terrarium(target_id).await?;
        ctx.authorize_owned(terrarium.owner_id, caps::MANAGE_ALL_TERRARIUMS)?;

        // 4. The candidate's species must resolve; its biome drives
        //    the gate.
        let species = self.species.get_by_id(animal.species_id).await?;

        // 5–6. Validate against the occupant set and commit, serialized
        //      per target terrarium so no concurrent assign can slip an
        //      incompatible occupant past a stale read.
        let _guard = self.locks.acquire(target_id).await;
        let occupants = self.load_occupants(target_id, Some(animal_id)).await?;

        match compat::check_biome(&occupants, species.biome) {
            BiomeCheck::Compatible => {
                let updated = self.animals.set_terrarium(animal_id, Some(target_id)).await?;
                info!(animal = %animal_id, terrarium = %target_id, "Animal assigned");
                Ok(updated)
            }
            BiomeCheck::Incompatible(conflict) => {
                info!(
                    animal = %animal_id,
                    terrarium = %target_id,
                    new_biome = %conflict.new_biome,
                    "Assignment rejected: biome conflict"
                );
                Err(VivariaError::BiomeConflict(conflict))
            }
        }
    }

    /// Register a new animal, optionally housing it immediately. The
    /// biome gate applies exactly as it does for a move.
    pub async fn create_animal(
        &self,
        ctx: &AccessContext,
        input: CreateAnimal,
    ) -> VivariaResult<Animal> {
        input.validate()?;
        ctx.authorize_owned(input.owner_id, caps::MANAGE_ALL_ANIMALS)?;

        // The species must exist before anything is persisted.
        let species = self.species.get_by_id(input.species_id).await?;

        let Some(target_id) = input.terrarium_id else {
            return self.animals.create(input).await;
        };

        let terrarium = self.active_terrarium(target_id).await?;
        ctx.authorize_owned(terrarium.owner_id, caps::MANAGE_ALL_TERRARIUMS)?;

        let _guard = self.locks.acquire(target_id).await;
        let occupants = self.load_occupants(target_id, None).await?;

        match compat::check_biome(&occupants, species.biome) {
            BiomeCheck::Compatible => self.animals.create(input).await,
            BiomeCheck::Incompatible(conflict) => Err(VivariaError::BiomeConflict(conflict)),
        }
    }

    /// General-purpose animal update. A terrarium change re-runs the
    /// biome gate against the new target; a species change while
    /// housed re-runs it against the current terrarium.
    pub async fn update_animal(
        &self,
        ctx: &AccessContext,
        animal_id: Uuid,
        input: UpdateAnimal,
    ) -> VivariaResult<Animal> {
        let animal = self.active_animal(animal_id).await?;
        ctx.authorize_owned(animal.owner_id, caps::MANAGE_ALL_ANIMALS)?;

        // A changed species must resolve even when no biome gate runs.
        let new_species = match input.species_id {
            Some(s) if s != animal.species_id => Some(self.species.get_by_id(s).await?),
            _ => None,
        };
        let species_changed = new_species.is_some();

        // Resolve the terrarium the animal will occupy after the
        // update, and whether that requires re-validation.
        let (check_target, moving) = match input.terrarium_id {
            Some(Some(new_target)) => (Some(new_target), true),
            // Explicit unhousing never conflicts.
            Some(None) => (None, false),
            // Staying put: only a species change needs re-validation.
            None => (animal.terrarium_id, false),
        };

        if let Some(target_id) = check_target
            && (moving || species_changed)
        {
            let terrarium = self.active_terrarium(target_id).await?;
            ctx.authorize_owned(terrarium.owner_id, caps::MANAGE_ALL_TERRARIUMS)?;

            let effective_biome = match &new_species {
                Some(species) => species.biome,
                None => self.species.get_by_id(animal.species_id).await?.biome,
            };

            let _guard = self.locks.acquire(target_id).await;
            let occupants = self.load_occupants(target_id, Some(animal_id)).await?;
            if let BiomeCheck::Incompatible(conflict) =
                compat::check_biome(&occupants, effective_biome)
            {
                return Err(VivariaError::BiomeConflict(conflict));
            }
            // Commit while still holding the terrarium lock.
            return self.animals.update(animal_id, input).await;
        }

        self.animals.update(animal_id, input).await
    }

    /// Soft-delete an animal. Its terrarium pointer is cleared so it
    /// stops counting toward occupancy immediately.
    pub async fn remove_animal(&self, ctx: &AccessContext, animal_id: Uuid) -> VivariaResult<()> {
        let animal = self.active_animal(animal_id).await?;
        ctx.authorize_owned(animal.owner_id, caps::MANAGE_ALL_ANIMALS)?;
        self.animals.set_active(animal_id, false).await
    }

    pub async fn animal(&self, ctx: &AccessContext, animal_id: Uuid) -> VivariaResult<Animal> {
        let animal = self.active_animal(animal_id).await?;
        ctx.authorize_owned(animal.owner_id, caps::MANAGE_ALL_ANIMALS)?;
        Ok(animal)
    }

    pub async fn list_animals(
        &self,
        ctx: &AccessContext,
        pagination: Pagination,
    ) -> VivariaResult<PaginatedResult<Animal>> {
        self.animals.list_by_owner(ctx.user_id, pagination).await
    }

    // -------------------------------------------------------------------
    // Terrariums
    // -------------------------------------------------------------------

    pub async fn create_terrarium(
        &self,
        ctx: &AccessContext,
        input: CreateTerrarium,
    ) -> VivariaResult<Terrarium> {
        input.validate()?;
        ctx.authorize_owned(input.owner_id, caps::MANAGE_ALL_TERRARIUMS)?;
        self.terrariums.create(input).await
    }

    pub async fn update_terrarium(
        &self,
        ctx: &AccessContext,
        terrarium_id: Uuid,
        input: UpdateTerrarium,
    ) -> VivariaResult<Terrarium> {
        let terrarium = self.active_terrarium(terrarium_id).await?;
        ctx.authorize_owned(terrarium.owner_id, caps::MANAGE_ALL_TERRARIUMS)?;
        self.terrariums.update(terrarium_id, input).await
    }

    /// Soft-delete a terrarium and unhouse every animal assigned to
    /// it, so no animal ever points at a deleted enclosure.
    pub async fn remove_terrarium(
        &self,
        ctx: &AccessContext,
        terrarium_id: Uuid,
    ) -> VivariaResult<()> {
        let terrarium = self.active_terrarium(terrarium_id).await?;
        ctx.authorize_owned(terrarium.owner_id, caps::MANAGE_ALL_TERRARIUMS)?;

        let _guard = self.locks.acquire(terrarium_id).await;
        self.terrariums.set_active(terrarium_id, false).await?;
        let unhoused = self.animals.clear_terrarium(terrarium_id).await?;
        info!(terrarium = %terrarium_id, unhoused, "Terrarium removed");
        Ok(())
    }

    /// Store last-known sensor readings. Telemetry only.
    pub async fn record_sensors(
        &self,
        ctx: &AccessContext,
        terrarium_id: Uuid,
        temperature: Option<f64>,
        humidity: Option<f64>,
    ) -> VivariaResult<Terrarium> {
        let terrarium = self.active_terrarium(terrarium_id).await?;
        ctx.authorize_owned(terrarium.owner_id, caps::MANAGE_ALL_TERRARIUMS)?;

        let readings = SensorReadings {
            temperature,
            humidity,
            last_updated: Some(Utc::now()),
        };
        self.terrariums.record_sensors(terrarium_id, readings).await
    }

    /// Enriched terrarium read: occupants, the combined advisory flag,
    /// and the environmental envelope.
    pub async fn terrarium_profile(
        &self,
        ctx: &AccessContext,
        terrarium_id: Uuid,
    ) -> VivariaResult<TerrariumProfile> {
        let terrarium = self.active_terrarium(terrarium_id).await?;
        ctx.authorize_owned(terrarium.owner_id, caps::VIEW_ALL_TERRARIUMS)?;

        let occupants = self.load_occupants(terrarium_id, None).await?;
        Ok(Self::profile_of(terrarium, occupants))
    }

    /// All of the caller's terrariums, each enriched like
    /// [`Self::terrarium_profile`].
    pub async fn list_terrariums(
        &self,
        ctx: &AccessContext,
        pagination: Pagination,
    ) -> VivariaResult<PaginatedResult<TerrariumProfile>> {
        let page = self.terrariums.list_by_owner(ctx.user_id, pagination).await?;

        let mut items = Vec::with_capacity(page.items.len());
        for terrarium in page.items {
            let occupants = self.load_occupants(terrarium.id, None).await?;
            items.push(Self::profile_of(terrarium, occupants));
        }

        Ok(PaginatedResult {
            items,
            total: page.total,
            offset: page.offset,
            limit: page.limit,
        })
    }

    // -------------------------------------------------------------------
    // Species catalog
    // -------------------------------------------------------------------

    pub async fn create_species(
        &self,
        ctx: &AccessContext,
        input: CreateSpecies,
    ) -> VivariaResult<Species> {
        ctx.authorize(caps::MANAGE_SPECIES)?;
        self.species.create(input).await
    }

    pub async fn update_species(
        &self,
        ctx: &AccessContext,
        species_id: Uuid,
        input: UpdateSpecies,
    ) -> VivariaResult<Species> {
        ctx.authorize(caps::MANAGE_SPECIES)?;
        self.species.update(species_id, input).await
    }

    pub async fn delete_species(&self, ctx: &AccessContext, species_id: Uuid) -> VivariaResult<()> {
        ctx.authorize(caps::MANAGE_SPECIES)?;
        self.species.delete(species_id).await
    }

    pub async fn species(&self, species_id: Uuid) -> VivariaResult<Species> {
        self.species.get_by_id(species_id).await
    }

    pub async fn search_species(
        &self,
        filter: SpeciesFilter,
        pagination: Pagination,
    ) -> VivariaResult<PaginatedResult<Species>> {
        self.species.list(filter, pagination).await
    }

    // -------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------

    async fn active_animal(&self, id: Uuid) -> VivariaResult<Animal> {
        let animal = self.animals.get_by_id(id).await?;
        if !animal.is_active {
            return Err(VivariaError::NotFound {
                entity: "animal".into(),
                id: id.to_string(),
            });
        }
        Ok(animal)
    }

    async fn active_terrarium(&self, id: Uuid) -> VivariaResult<Terrarium> {
        let terrarium = self.terrariums.get_by_id(id).await?;
        if !terrarium.is_active {
            return Err(VivariaError::NotFound {
                entity: "terrarium".into(),
                id: id.to_string(),
            });
        }
        Ok(terrarium)
    }

    /// Load the active occupants of a terrarium with their species.
    /// A failed species lookup leaves the occupant biome-less rather
    /// than failing the whole read.
    async fn load_occupants(
        &self,
        terrarium_id: Uuid,
        exclude: Option<Uuid>,
    ) -> VivariaResult<Vec<Occupant>> {
        let animals = self
            .animals
            .find_active_by_terrarium(terrarium_id, exclude)
            .await?;

        let mut occupants = Vec::with_capacity(animals.len());
        for animal in animals {
            let species = match self.species.get_by_id(animal.species_id).await {
                Ok(species) => Some(species),
                Err(VivariaError::NotFound { .. }) => None,
                Err(e) => return Err(e),
            };
            occupants.push(Occupant::new(animal, species));
        }
        Ok(occupants)
    }

    fn profile_of(terrarium: Terrarium, occupants: Vec<Occupant>) -> TerrariumProfile {
        TerrariumProfile {
            has_compatibility_issue: compat::has_compatibility_issue(&occupants),
            envelope: compat::environmental_envelope(&occupants),
            terrarium,
            occupants,
        }
    }
}
