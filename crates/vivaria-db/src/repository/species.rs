//! SurrealDB implementation of [`SpeciesRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use vivaria_core::error::VivariaResult;
use vivaria_core::models::species::{
    CreateSpecies, EnvironmentalParameters, Range, SpaceRequirements, Species, UpdateSpecies,
};
use vivaria_core::repository::{PaginatedResult, Pagination, SpeciesFilter, SpeciesRepository};

use crate::error::DbError;
use crate::repository::parse_biome;

#[derive(Debug, Clone, SurrealValue)]
struct RangeRow {
    min: f64,
    max: f64,
}

impl From<Range> for RangeRow {
    fn from(r: Range) -> Self {
        Self {
            min: r.min,
            max: r.max,
        }
    }
}

impl From<RangeRow> for Range {
    fn from(r: RangeRow) -> Self {
        Self {
            min: r.min,
            max: r.max,
        }
    }
}

#[derive(Debug, Clone, SurrealValue)]
struct ParametersRow {
    temperature: RangeRow,
    humidity: RangeRow,
    uv_index: f64,
}

impl From<EnvironmentalParameters> for ParametersRow {
    fn from(p: EnvironmentalParameters) -> Self {
        Self {
            temperature: p.temperature.into(),
            humidity: p.humidity.into(),
            uv_index: p.uv_index,
        }
    }
}

#[derive(Debug, Clone, SurrealValue)]
struct RequirementsRow {
    min_liters: u32,
    min_height_cm: u32,
    arboreal: bool,
}

impl From<SpaceRequirements> for RequirementsRow {
    fn from(r: SpaceRequirements) -> Self {
        Self {
            min_liters: r.min_liters,
            min_height_cm: r.min_height_cm,
            arboreal: r.arboreal,
        }
    }
}

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct SpeciesRow {
    scientific_name: String,
    common_name: String,
    family: String,
    biome: String,
    parameters: ParametersRow,
    requirements: RequirementsRow,
    compatibility: Vec<String>,
    image_url: Option<String>,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct SpeciesRowWithId {
    record_id: String,
    scientific_name: String,
    common_name: String,
    family: String,
    biome: String,
    parameters: ParametersRow,
    requirements: RequirementsRow,
    compatibility: Vec<String>,
    image_url: Option<String>,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SpeciesRow {
    fn into_species(self, id: Uuid) -> Result<Species, DbError> {
        Ok(Species {
            id,
            scientific_name: self.scientific_name,
            common_name: self.common_name,
            family: self.family,
            biome: parse_biome(&self.biome)?,
            parameters: EnvironmentalParameters {
                temperature: self.parameters.temperature.into(),
                humidity: self.parameters.humidity.into(),
                uv_index: self.parameters.uv_index,
            },
            requirements: SpaceRequirements {
                min_liters: self.requirements.min_liters,
                min_height_cm: self.requirements.min_height_cm,
                arboreal: self.requirements.arboreal,
            },
            compatibility: self.compatibility,
            image_url: self.image_url,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl SpeciesRowWithId {
    fn try_into_species(self) -> Result<Species, DbError> {
        let id = Uuid::parse_str(&self.record_id)
            .map_err(|e| DbError::Migration(format!("invalid UUID: {e}")))?;
        Ok(Species {
            id,
            scientific_name: self.scientific_name,
            common_name: self.common_name,
            family: self.family,
            biome: parse_biome(&self.biome)?,
            parameters: EnvironmentalParameters {
                temperature: self.parameters.temperature.into(),
                humidity: self.parameters.humidity.into(),
                uv_index: self.parameters.uv_index,
            },
            requirements: SpaceRequirements {
                min_liters: self.requirements.min_liters,
                min_height_cm: self.requirements.min_height_cm,
                arboreal: self.requirements.arboreal,
            },
            compatibility: self.compatibility,
            image_url: self.image_url,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the species catalog.
#[derive(Clone)]
pub struct SurrealSpeciesRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSpeciesRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SpeciesRepository for SurrealSpeciesRepository<C> {
    async fn create(&self, input: CreateSpecies) -> VivariaResult<Species> {
        input.validate()?;

        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('species', $id) SET \
                 scientific_name = $scientific_name, \
                 common_name = $common_name, \
                 family = $family, \
                 biome = $biome, \
                 parameters = $parameters, \
                 requirements = $requirements, \
                 compatibility = $compatibility, \
                 image_url = $image_url, \
                 description = $description",
            )
            .bind(("id", id_str.clone()))
            .bind(("scientific_name", input.scientific_name))
            .bind(("common_name", input.common_name))
            .bind(("family", input.family))
            .bind(("biome", input.biome.as_str().to_string()))
            .bind(("parameters", ParametersRow::from(input.parameters)))
            .bind(("requirements", RequirementsRow::from(input.requirements)))
            .bind(("compatibility", input.compatibility.unwrap_or_default()))
            .bind(("image_url", input.image_url))
            .bind(("description", input.description.unwrap_or_default()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<SpeciesRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "species".into(),
            id: id_str,
        })?;

        Ok(row.into_species(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> VivariaResult<Species> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('species', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SpeciesRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "species".into(),
            id: id_str,
        })?;

        Ok(row.into_species(id)?)
    }

    async fn get_by_scientific_name(&self, scientific_name: &str) -> VivariaResult<Species> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM species \
                 WHERE scientific_name = $scientific_name",
            )
            .bind(("scientific_name", scientific_name.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SpeciesRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "species".into(),
            id: format!("scientific_name={scientific_name}"),
        })?;

        Ok(row.try_into_species()?)
    }

    async fn update(&self, id: Uuid, input: UpdateSpecies) -> VivariaResult<Species> {
        if let Some(ref parameters) = input.parameters {
            parameters.validate()?;
        }

        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.common_name.is_some() {
            sets.push("common_name = $common_name");
        }
        if input.family.is_some() {
            sets.push("family = $family");
        }
        if input.parameters.is_some() {
            sets.push("parameters = $parameters");
        }
        if input.requirements.is_some() {
            sets.push("requirements = $requirements");
        }
        if input.compatibility.is_some() {
            sets.push("compatibility = $compatibility");
        }
        if input.image_url.is_some() {
            sets.push("image_url = $image_url");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('species', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(common_name) = input.common_name {
            builder = builder.bind(("common_name", common_name));
        }
        if let Some(family) = input.family {
            builder = builder.bind(("family", family));
        }
        if let Some(parameters) = input.parameters {
            builder = builder.bind(("parameters", ParametersRow::from(parameters)));
        }
        if let Some(requirements) = input.requirements {
            builder = builder.bind(("requirements", RequirementsRow::from(requirements)));
        }
        if let Some(compatibility) = input.compatibility {
            builder = builder.bind(("compatibility", compatibility));
        }
        if let Some(image_url) = input.image_url {
            // Option<Option<String>>: Some(Some(v)) = set, Some(None) = clear
            builder = builder.bind(("image_url", image_url));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<SpeciesRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "species".into(),
            id: id_str,
        })?;

        Ok(row.into_species(id)?)
    }

    async fn delete(&self, id: Uuid) -> VivariaResult<()> {
        self.db
            .query("DELETE type::record('species', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        filter: SpeciesFilter,
        pagination: Pagination,
    ) -> VivariaResult<PaginatedResult<Species>> {
        let mut conditions = Vec::new();
        if filter.biome.is_some() {
            conditions.push("biome = $biome");
        }
        if filter.search.is_some() {
            conditions.push(
                "(string::contains(string::lowercase(common_name), $search) \
                 OR string::contains(string::lowercase(scientific_name), $search))",
            );
        }
        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let search = filter.search.map(|s| s.to_lowercase());

        let count_query = format!("SELECT count() AS total FROM species{where_clause} GROUP ALL");
        let mut count_builder = self.db.query(&count_query);
        if let Some(biome) = filter.biome {
            count_builder = count_builder.bind(("biome", biome.as_str().to_string()));
        }
        if let Some(ref search) = search {
            count_builder = count_builder.bind(("search", search.clone()));
        }
        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM species{where_clause} \
             ORDER BY common_name ASC \
             LIMIT $limit START $offset"
        );
        let mut builder = self
            .db
            .query(&list_query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        if let Some(biome) = filter.biome {
            builder = builder.bind(("biome", biome.as_str().to_string()));
        }
        if let Some(search) = search {
            builder = builder.bind(("search", search));
        }

        let mut result = builder.await.map_err(DbError::from)?;
        let rows: Vec<SpeciesRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_species())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
