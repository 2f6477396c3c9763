//! SurrealDB implementation of [`TerrariumRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use vivaria_core::error::VivariaResult;
use vivaria_core::models::species::Biome;
use vivaria_core::models::terrarium::{
    CreateTerrarium, Dimensions, SensorReadings, Terrarium, TerrariumKind, UpdateTerrarium,
};
use vivaria_core::repository::{PaginatedResult, Pagination, TerrariumRepository};

use crate::error::DbError;
use crate::repository::parse_biome;

fn parse_kind(s: &str) -> Result<TerrariumKind, DbError> {
    match s {
        "glass" => Ok(TerrariumKind::Glass),
        "mesh" => Ok(TerrariumKind::Mesh),
        "hybrid" => Ok(TerrariumKind::Hybrid),
        other => Err(DbError::Migration(format!("unknown terrarium kind: {other}"))),
    }
}

fn kind_to_str(kind: TerrariumKind) -> &'static str {
    match kind {
        TerrariumKind::Glass => "glass",
        TerrariumKind::Mesh => "mesh",
        TerrariumKind::Hybrid => "hybrid",
    }
}

#[derive(Debug, Clone, SurrealValue)]
struct DimensionsRow {
    width_cm: u32,
    depth_cm: u32,
    height_cm: u32,
}

impl From<Dimensions> for DimensionsRow {
    fn from(d: Dimensions) -> Self {
        Self {
            width_cm: d.width_cm,
            depth_cm: d.depth_cm,
            height_cm: d.height_cm,
        }
    }
}

impl From<DimensionsRow> for Dimensions {
    fn from(d: DimensionsRow) -> Self {
        Self {
            width_cm: d.width_cm,
            depth_cm: d.depth_cm,
            height_cm: d.height_cm,
        }
    }
}

#[derive(Debug, Clone, SurrealValue)]
struct SensorsRow {
    temperature: Option<f64>,
    humidity: Option<f64>,
    last_updated: Option<DateTime<Utc>>,
}

impl From<SensorReadings> for SensorsRow {
    fn from(s: SensorReadings) -> Self {
        Self {
            temperature: s.temperature,
            humidity: s.humidity,
            last_updated: s.last_updated,
        }
    }
}

impl From<SensorsRow> for SensorReadings {
    fn from(s: SensorsRow) -> Self {
        Self {
            temperature: s.temperature,
            humidity: s.humidity,
            last_updated: s.last_updated,
        }
    }
}

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct TerrariumRow {
    owner_id: String,
    name: String,
    dimensions: DimensionsRow,
    kind: String,
    biome: String,
    sensors: SensorsRow,
    image_url: Option<String>,
    notes: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct TerrariumRowWithId {
    record_id: String,
    owner_id: String,
    name: String,
    dimensions: DimensionsRow,
    kind: String,
    biome: String,
    sensors: SensorsRow,
    image_url: Option<String>,
    notes: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TerrariumRow {
    fn into_terrarium(self, id: Uuid) -> Result<Terrarium, DbError> {
        let owner_id = Uuid::parse_str(&self.owner_id)
            .map_err(|e| DbError::Migration(format!("invalid owner UUID: {e}")))?;
        Ok(Terrarium {
            id,
            owner_id,
            name: self.name,
            dimensions: self.dimensions.into(),
            kind: parse_kind(&self.kind)?,
            biome: parse_biome(&self.biome)?,
            sensors: self.sensors.into(),
            image_url: self.image_url,
            notes: self.notes,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl TerrariumRowWithId {
    fn try_into_terrarium(self) -> Result<Terrarium, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        TerrariumRow {
            owner_id: self.owner_id,
            name: self.name,
            dimensions: self.dimensions,
            kind: self.kind,
            biome: self.biome,
            sensors: self.sensors,
            image_url: self.image_url,
            notes: self.notes,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_terrarium(id)
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Terrarium repository.
#[derive(Clone)]
pub struct SurrealTerrariumRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTerrariumRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> TerrariumRepository for SurrealTerrariumRepository<C> {
    async fn create(&self, input: CreateTerrarium) -> VivariaResult<Terrarium> {
        input.validate()?;

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('terrarium', $id) SET \
                 owner_id = $owner_id, \
                 name = $name, \
                 dimensions = $dimensions, \
                 kind = $kind, \
                 biome = $biome, \
                 sensors = {}, \
                 image_url = $image_url, \
                 notes = $notes",
            )
            .bind(("id", id_str.clone()))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("name", input.name))
            .bind(("dimensions", DimensionsRow::from(input.dimensions)))
            .bind(("kind", kind_to_str(input.kind).to_string()))
            .bind(("biome", input.biome.as_str().to_string()))
            .bind(("image_url", input.image_url))
            .bind(("notes", input.notes.unwrap_or_default()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<TerrariumRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "terrarium".into(),
            id: id_str,
        })?;

        Ok(row.into_terrarium(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> VivariaResult<Terrarium> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('terrarium', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TerrariumRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "terrarium".into(),
            id: id_str,
        })?;

        Ok(row.into_terrarium(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateTerrarium) -> VivariaResult<Terrarium> {
        if let Some(ref dimensions) = input.dimensions {
            dimensions.validate()?;
        }

        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.dimensions.is_some() {
            sets.push("dimensions = $dimensions");
        }
        if input.kind.is_some() {
            sets.push("kind = $kind");
        }
        if input.biome.is_some() {
            sets.push("biome = $biome");
        }
        if input.image_url.is_some() {
            sets.push("image_url = $image_url");
        }
        if input.notes.is_some() {
            sets.push("notes = $notes");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('terrarium', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(dimensions) = input.dimensions {
            builder = builder.bind(("dimensions", DimensionsRow::from(dimensions)));
        }
        if let Some(kind) = input.kind {
            builder = builder.bind(("kind", kind_to_str(kind).to_string()));
        }
        if let Some(biome) = input.biome {
            builder = builder.bind(("biome", biome.as_str().to_string()));
        }
        if let Some(image_url) = input.image_url {
            // Option<Option<String>>: Some(Some(v)) = set, Some(None) = clear
            builder = builder.bind(("image_url", image_url));
        }
        if let Some(notes) = input.notes {
            builder = builder.bind(("notes", notes));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<TerrariumRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "terrarium".into(),
            id: id_str,
        })?;

        Ok(row.into_terrarium(id)?)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> VivariaResult<()> {
        self.db
            .query(
                "UPDATE type::record('terrarium', $id) SET \
                 is_active = $active, updated_at = time::now()",
            )
            .bind(("id", id.to_string()))
            .bind(("active", active))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn record_sensors(&self, id: Uuid, readings: SensorReadings) -> VivariaResult<Terrarium> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('terrarium', $id) SET \
                 sensors = $sensors, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("sensors", SensorsRow::from(readings)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<TerrariumRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "terrarium".into(),
            id: id_str,
        })?;

        Ok(row.into_terrarium(id)?)
    }

    async fn list_by_owner(
        &self,
        owner_id: Uuid,
        pagination: Pagination,
    ) -> VivariaResult<PaginatedResult<Terrarium>> {
        let owner_id_str = owner_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM terrarium \
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
                "SELECT meta::id(id) AS record_id, * FROM terrarium \
                 WHERE owner_id = $owner_id AND is_active = true \
                 ORDER BY created_at DESC \
                 LIMIT $limit START $offset",
            )
            .bind(("owner_id", owner_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<TerrariumRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_terrarium())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
