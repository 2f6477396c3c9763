//! SurrealDB implementation of [`AnimalRepository`].
//!
//! `birth_date` is stored as an ISO `YYYY-MM-DD` string; occupancy is
//! always derived from the `terrarium_id` back-reference, never stored
//! on the terrarium.

use chrono::{DateTime, NaiveDate, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use vivaria_core::error::VivariaResult;
use vivaria_core::models::animal::{Animal, CreateAnimal, Sex, UpdateAnimal};
use vivaria_core::repository::{AnimalRepository, PaginatedResult, Pagination};

use crate::error::DbError;

fn parse_sex(s: &str) -> Result<Sex, DbError> {
    match s {
        "male" => Ok(Sex::Male),
        "female" => Ok(Sex::Female),
        "unknown" => Ok(Sex::Unknown),
        other => Err(DbError::Migration(format!("unknown sex: {other}"))),
    }
}

fn sex_to_str(sex: Sex) -> &'static str {
    match sex {
        Sex::Male => "male",
        Sex::Female => "female",
        Sex::Unknown => "unknown",
    }
}

fn parse_birth_date(s: Option<String>) -> Result<Option<NaiveDate>, DbError> {
    s.map(|s| {
        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map_err(|e| DbError::Migration(format!("invalid birth_date: {e}")))
    })
    .transpose()
}

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct AnimalRow {
    owner_id: String,
    name: String,
    sex: String,
    birth_date: Option<String>,
    species_id: String,
    terrarium_id: Option<String>,
    weight_grams: Option<f64>,
    notes: String,
    image_url: Option<String>,
    gallery: Vec<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct AnimalRowWithId {
    record_id: String,
    owner_id: String,
    name: String,
    sex: String,
    birth_date: Option<String>,
    species_id: String,
    terrarium_id: Option<String>,
    weight_grams: Option<f64>,
    notes: String,
    image_url: Option<String>,
    gallery: Vec<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AnimalRow {
    fn into_animal(self, id: Uuid) -> Result<Animal, DbError> {
        let owner_id = Uuid::parse_str(&self.owner_id)
            .map_err(|e| DbError::Migration(format!("invalid owner UUID: {e}")))?;
        let species_id = Uuid::parse_str(&self.species_id)
            .map_err(|e| DbError::Migration(format!("invalid species UUID: {e}")))?;
        let terrarium_id = self
            .terrarium_id
            .map(|s| {
                Uuid::parse_str(&s)
                    .map_err(|e| DbError::Migration(format!("invalid terrarium UUID: {e}")))
            })
            .transpose()?;
        Ok(Animal {
            id,
            owner_id,
            name: self.name,
            sex: parse_sex(&self.sex)?,
            birth_date: parse_birth_date(self.birth_date)?,
            species_id,
            terrarium_id,
            weight_grams: self.weight_grams,
            notes: self.notes,
            image_url: self.image_url,
            gallery: self.gallery,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl AnimalRowWithId {
    fn try_into_animal(self) -> Result<Animal, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        AnimalRow {
            owner_id: self.owner_id,
            name: self.name,
            sex: self.sex,
            birth_date: self.birth_date,
            species_id: self.species_id,
            terrarium_id: self.terrarium_id,
            weight_grams: self.weight_grams,
            notes: self.notes,
            image_url: self.image_url,
            gallery: self.gallery,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_animal(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Animal repository.
#[derive(Clone)]
pub struct SurrealAnimalRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAnimalRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> AnimalRepository for SurrealAnimalRepository<C> {
    async fn create(&self, input: CreateAnimal) -> VivariaResult<Animal> {
        input.validate()?;

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('animal', $id) SET \
                 owner_id = $owner_id, \
                 name = $name, \
                 sex = $sex, \
                 birth_date = $birth_date, \
                 species_id = $species_id, \
                 terrarium_id = $terrarium_id, \
                 weight_grams = $weight_grams, \
                 notes = $notes, \
                 image_url = $image_url, \
                 gallery = []",
            )
            .bind(("id", id_str.clone()))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("name", input.name))
            .bind(("sex", sex_to_str(input.sex).to_string()))
            .bind(("birth_date", input.birth_date.map(|d| d.to_string())))
            .bind(("species_id", input.species_id.to_string()))
            .bind(("terrarium_id", input.terrarium_id.map(|t| t.to_string())))
            .bind(("weight_grams", input.weight_grams))
            .bind(("notes", input.notes.unwrap_or_default()))
            .bind(("image_url", input.image_url))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<AnimalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "animal".into(),
            id: id_str,
        })?;

        Ok(row.into_animal(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> VivariaResult<Animal> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('animal', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AnimalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "animal".into(),
            id: id_str,
        })?;

        Ok(row.into_animal(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateAnimal) -> VivariaResult<Animal> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.sex.is_some() {
            sets.push("sex = $sex");
        }
        if input.birth_date.is_some() {
            sets.push("birth_date = $birth_date");
        }
        if input.species_id.is_some() {
            sets.push("species_id = $species_id");
        }
        if input.terrarium_id.is_some() {
            sets.push("terrarium_id = $terrarium_id");
        }
        if input.weight_grams.is_some() {
            sets.push("weight_grams = $weight_grams");
        }
        if input.notes.is_some() {
            sets.push("notes = $notes");
        }
        if input.image_url.is_some() {
            sets.push("image_url = $image_url");
        }
        if input.gallery.is_some() {
            sets.push("gallery = $gallery");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('animal', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(sex) = input.sex {
            builder = builder.bind(("sex", sex_to_str(sex).to_string()));
        }
        if let Some(birth_date) = input.birth_date {
            // Option<Option<NaiveDate>>: Some(Some(d)) = set, Some(None) = clear
            builder = builder.bind(("birth_date", birth_date.map(|d| d.to_string())));
        }
        if let Some(species_id) = input.species_id {
            builder = builder.bind(("species_id", species_id.to_string()));
        }
        if let Some(terrarium_id) = input.terrarium_id {
            builder = builder.bind(("terrarium_id", terrarium_id.map(|t| t.to_string())));
        }
        if let Some(weight_grams) = input.weight_grams {
            builder = builder.bind(("weight_grams", weight_grams));
        }
        if let Some(notes) = input.notes {
            builder = builder.bind(("notes", notes));
        }
        if let Some(image_url) = input.image_url {
            builder = builder.bind(("image_url", image_url));
        }
        if let Some(gallery) = input.gallery {
            builder = builder.bind(("gallery", gallery));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<AnimalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "animal".into(),
            id: id_str,
        })?;

        Ok(row.into_animal(id)?)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> VivariaResult<()> {
        // Deactivation also unhouses the animal so it can never count
        // toward occupancy while inactive.
        let query = if active {
            "UPDATE type::record('animal', $id) SET \
             is_active = true, updated_at = time::now()"
        } else {
            "UPDATE type::record('animal', $id) SET \
             is_active = false, terrarium_id = NONE, \
             updated_at = time::now()"
        };

        self.db
            .query(query)
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn set_terrarium(&self, id: Uuid, terrarium_id: Option<Uuid>) -> VivariaResult<Animal> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('animal', $id) SET \
                 terrarium_id = $terrarium_id, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("terrarium_id", terrarium_id.map(|t| t.to_string())))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<AnimalRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "animal".into(),
            id: id_str,
        })?;

        Ok(row.into_animal(id)?)
    }

    async fn find_active_by_terrarium(
        &self,
        terrarium_id: Uuid,
        exclude: Option<Uuid>,
    ) -> VivariaResult<Vec<Animal>> {
        let mut query = "SELECT meta::id(id) AS record_id, * FROM animal \
                         WHERE terrarium_id = $terrarium_id \
                         AND is_active = true"
            .to_string();
        if exclude.is_some() {
            query.push_str(" AND meta::id(id) != $exclude");
        }

        let mut builder = self
            .db
            .query(&query)
            .bind(("terrarium_id", terrarium_id.to_string()));
        if let Some(exclude) = exclude {
            builder = builder.bind(("exclude", exclude.to_string()));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<AnimalRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(rows
            .into_iter()
            .map(|row| row.try_into_animal())
            .collect::<Result<Vec<_>, DbError>>()?)
    }

    async fn clear_terrarium(&self, terrarium_id: Uuid) -> VivariaResult<u64> {
        let mut result = self
            .db
            .query(
                "UPDATE animal SET terrarium_id = NONE, \
                 updated_at = time::now() \
                 WHERE terrarium_id = $terrarium_id",
            )
            .bind(("terrarium_id", terrarium_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AnimalRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.len() as u64)
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> VivariaResult<PaginatedResult<Animal>> {
        let owner_id_str = owner_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM animal \
                 WHERE owner_id = $owner_id AND is_active = true \
                 GROUP ALL",
            )
            .bind(("owner_id", owner_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM animal \
                 WHERE owner_id = $owner_id AND is_active = true \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("owner_id", owner_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AnimalRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_animal())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
