//! Terrarium compatibility engine.
//!
//! Pure computation over a terrarium's (hypothetical) occupant set:
//! biome conflict detection, same-species male rivalry detection, and
//! environmental envelope intersection. No side effects and no storage
//! access: callers load occupants and species, this module only
//! evaluates them. The engine never returns errors; it returns
//! structured results, and only the assignment coordinator turns a
//! conflict into a rejected mutation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::animal::{Animal, Sex};
use crate::models::species::{Biome, Range, Species};

/// One resident of a terrarium, paired with its resolved species.
///
/// `species` is `None` when the catalog lookup failed; such an
/// occupant is biome-less and contributes nothing to any check.
#[derive(Debug, Clone)]
pub struct Occupant {
    pub animal: Animal,
    pub species: Option<Species>,
}

impl Occupant {
    pub fn new(animal: Animal, species: Option<Species>) -> Self {
        Self { animal, species }
    }

    fn biome(&self) -> Option<Biome> {
        self.species.as_ref().map(|s| s.biome)
    }
}

/// Diagnostic line for one existing occupant in a conflict payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OccupantSummary {
    pub name: String,
    pub species: Option<String>,
    pub biome: Option<Biome>,
}

/// Full diagnostic payload for a rejected assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BiomeConflict {
    pub new_biome: Biome,
    /// Distinct biomes among existing occupants, first-seen order.
    pub existing_biomes: Vec<Biome>,
    pub existing_animals: Vec<OccupantSummary>,
}

impl std::fmt::Display for BiomeConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let existing: Vec<&str> = self.existing_biomes.iter().map(Biome::as_str).collect();
        write!(
            f,
            "{} cannot join a terrarium housing {}",
            self.new_biome,
            existing.join(", "),
        )
    }
}

/// Outcome of the biome gate, the only check that blocks a mutation.
#[derive(Debug, Clone)]
pub enum BiomeCheck {
    Compatible,
    Incompatible(BiomeConflict),
}

impl BiomeCheck {
    pub fn is_compatible(&self) -> bool {
        matches!(self, BiomeCheck::Compatible)
    }
}

/// A terrarium may only ever contain animals from a single biome; the
/// occupant set at evaluation time establishes the biome for the
/// enclosure.
///
/// An empty occupant set, a set whose species lookups all failed, or a
/// candidate matching any existing biome is compatible.
pub fn check_biome(occupants: &[Occupant], candidate: Biome) -> BiomeCheck {
    let mut existing_biomes: Vec<Biome> = Vec::new();
    for occupant in occupants {
        if let Some(biome) = occupant.biome()
            && !existing_biomes.contains(&biome)
        {
            existing_biomes.push(biome);
        }
    }

    if existing_biomes.is_empty() || existing_biomes.contains(&candidate) {
        return BiomeCheck::Compatible;
    }

    BiomeCheck::Incompatible(BiomeConflict {
        new_biome: candidate,
        existing_biomes,
        existing_animals: occupants
            .iter()
            .map(|o| OccupantSummary {
                name: o.animal.name.clone(),
                species: o.species.as_ref().map(|s| s.common_name.clone()),
                biome: o.biome(),
            })
            .collect(),
    })
}

/// True when any single species has more than one male among the
/// occupants. Advisory: surfaced on reads, never a mutation gate.
pub fn male_rivalry(occupants: &[Occupant]) -> bool {
    let mut males_seen: Vec<Uuid> = Vec::new();
    for occupant in occupants {
        if occupant.animal.sex != Sex::Male || occupant.species.is_none() {
            continue;
        }
        let species_id = occupant.animal.species_id;
        if males_seen.contains(&species_id) {
            return true;
        }
        males_seen.push(species_id);
    }
    false
}

/// Combined advisory flag shown on terrarium reads: mixed biomes or
/// same-species male rivalry. A lone occupant never has an issue.
pub fn has_compatibility_issue(occupants: &[Occupant]) -> bool {
    if occupants.len() < 2 {
        return false;
    }
    let mut biomes = occupants.iter().filter_map(Occupant::biome);
    let mixed = match biomes.next() {
        Some(first) => biomes.any(|b| b != first),
        None => false,
    };
    mixed || male_rivalry(occupants)
}

/// Axis of an environmental envelope conflict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EnvelopeAxis {
    Temperature,
    Humidity,
}

/// One species' own requirement on a conflicting axis, for diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpeciesRange {
    pub animal: String,
    pub species: String,
    pub min: f64,
    pub max: f64,
}

/// No single range on `axis` satisfies every occupant. Lists each
/// contributing species' own range so the keeper can see who clashes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvelopeConflict {
    pub axis: EnvelopeAxis,
    pub ranges: Vec<SpeciesRange>,
}

/// Intersected bounds on one axis. `min > max` signals a conflict;
/// both raw values are still reported.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EnvelopeBounds {
    pub min: f64,
    pub max: f64,
}

/// The target environmental range an enclosure must hold to satisfy
/// every occupant, or a structured explanation of why none exists.
/// Advisory; never blocks an assignment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnvironmentalEnvelope {
    pub is_compatible: bool,
    pub errors: Vec<EnvelopeConflict>,
    pub temperature: EnvelopeBounds,
    pub humidity: EnvelopeBounds,
}

/// Intersect the occupants' temperature and humidity requirements:
/// max of mins, min of maxes, exact bound comparison (equal bounds
/// intersect in a single point and are compatible).
///
/// Returns `None` when no occupant has a resolved species; there is
/// nothing to compute an envelope from.
pub fn environmental_envelope(occupants: &[Occupant]) -> Option<EnvironmentalEnvelope> {
    let qualifying: Vec<(&Animal, &Species)> = occupants
        .iter()
        .filter_map(|o| o.species.as_ref().map(|s| (&o.animal, s)))
        .collect();

    if qualifying.is_empty() {
        return None;
    }

    let axis_bounds = |pick: fn(&Species) -> Range| {
        let mut min = f64::MIN;
        let mut max = f64::MAX;
        for (_, species) in &qualifying {
            let range = pick(species);
            min = min.max(range.min);
            max = max.min(range.max);
        }
        EnvelopeBounds { min, max }
    };

    let temperature = axis_bounds(|s| s.parameters.temperature);
    let humidity = axis_bounds(|s| s.parameters.humidity);

    let conflict_ranges = |pick: fn(&Species) -> Range| {
        qualifying
            .iter()
            .map(|(animal, species)| {
                let range = pick(species);
                SpeciesRange {
                    animal: animal.name.clone(),
                    species: species.common_name.clone(),
                    min: range.min,
                    max: range.max,
                }
            })
            .collect()
    };

    let mut errors = Vec::new();
    if temperature.min > temperature.max {
        errors.push(EnvelopeConflict {
            axis: EnvelopeAxis::Temperature,
            ranges: conflict_ranges(|s| s.parameters.temperature),
        });
    }
    if humidity.min > humidity.max {
        errors.push(EnvelopeConflict {
            axis: EnvelopeAxis::Humidity,
            ranges: conflict_ranges(|s| s.parameters.humidity),
        });
    }

    Some(EnvironmentalEnvelope {
        is_compatible: errors.is_empty(),
        errors,
        temperature,
        humidity,
    })
}
