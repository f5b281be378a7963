//! Cost catalog
//!
//! Static lookup from game entities to their resource cost, built once from
//! the halfon `units_buildings_techs.<edition>.json` data file:
//!
//! ```json
//! {
//!   "units_buildings": { "83": { "cost": { "food": 50 }, "name": "VMDL", "localised_name": "Villager" } },
//!   "techs": { "22": { "cost": { "food": 50 }, "name": "Loom", "localised_name": "Loom" } }
//! }
//! ```
//!
//! Units and buildings share one id space and technologies have another, so
//! every lookup names its namespace through [`EntityId`]. Keys are parsed to
//! integers at load time; lookups are exact matches and fail with
//! [`CatalogError::NotFound`] instead of returning a zero cost.

mod edition;

pub use edition::{GameEdition, ParseEditionError};

use hashbrown::HashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::economy::{Resource, ResourceVector};

/// Catalog key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityId {
    /// Unit or building id (`units_buildings` section)
    UnitOrBuilding(u32),
    /// Technology id (`techs` section)
    Technology(u32),
}

impl EntityId {
    /// Numeric id without its namespace
    pub fn raw(self) -> u32 {
        match self {
            EntityId::UnitOrBuilding(id) | EntityId::Technology(id) => id,
        }
    }

    fn section(self) -> &'static str {
        match self {
            EntityId::UnitOrBuilding(_) => UNITS_SECTION,
            EntityId::Technology(_) => TECHS_SECTION,
        }
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::UnitOrBuilding(id) => write!(f, "unit/building {}", id),
            EntityId::Technology(id) => write!(f, "technology {}", id),
        }
    }
}

const UNITS_SECTION: &str = "units_buildings";
const TECHS_SECTION: &str = "techs";

/// Catalog entry
#[derive(Debug, Clone, PartialEq)]
pub struct CostEntry {
    pub id: EntityId,
    /// Cost of one unit, building or research
    pub cost: ResourceVector,
    /// Display name (localised when the data has one)
    pub name: String,
}

/// Catalog errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Entity absent from the catalog
    #[error("{0} not found in cost catalog")]
    NotFound(EntityId),

    /// Data file could not be read
    #[error("failed to read cost catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Data file is not valid JSON or has the wrong shape
    #[error("invalid cost catalog JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Section key that is not an entity id
    #[error("invalid key {key:?} in {section} section")]
    InvalidKey { section: &'static str, key: String },

    /// Two section keys naming the same entity
    #[error("duplicate key {key:?} for {id}")]
    DuplicateKey { id: EntityId, key: String },

    /// Negative or non-finite cost component
    #[error("invalid {resource} cost {value} for {id}")]
    InvalidCost {
        id: EntityId,
        resource: Resource,
        value: f64,
    },
}

#[derive(Debug, Deserialize)]
struct RawCatalog {
    #[serde(default)]
    units_buildings: BTreeMap<String, RawEntry>,
    #[serde(default)]
    techs: BTreeMap<String, RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(default)]
    cost: ResourceVector,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    localised_name: Option<String>,
}

impl RawEntry {
    fn display_name(&self, id: EntityId) -> String {
        [&self.localised_name, &self.name]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| id.to_string())
    }
}

/// Immutable cost lookup
#[derive(Debug, Clone, Default)]
pub struct CostCatalog {
    units_buildings: HashMap<u32, CostEntry>,
    techs: HashMap<u32, CostEntry>,
}

impl CostCatalog {
    /// Start building a catalog by hand
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::default()
    }

    /// Parse a catalog from halfon JSON
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let raw: RawCatalog = serde_json::from_str(json)?;

        let units_buildings =
            load_section(UNITS_SECTION, raw.units_buildings, EntityId::UnitOrBuilding)?;
        let techs = load_section(TECHS_SECTION, raw.techs, EntityId::Technology)?;

        Ok(Self {
            units_buildings,
            techs,
        })
    }

    /// Load a catalog from a halfon JSON file
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        tracing::info!("Loading cost catalog from {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&content)?;
        tracing::info!(
            "Loaded {} units/buildings and {} technologies",
            catalog.units_buildings.len(),
            catalog.techs.len()
        );
        Ok(catalog)
    }

    /// Load the data file for `edition` from a halfon data directory
    pub fn from_edition_dir(dir: &Path, edition: GameEdition) -> Result<Self, CatalogError> {
        Self::from_file(&dir.join(edition.data_file_name()))
    }

    /// Look up an entity
    pub fn lookup(&self, id: EntityId) -> Result<&CostEntry, CatalogError> {
        let section = match id {
            EntityId::UnitOrBuilding(_) => &self.units_buildings,
            EntityId::Technology(_) => &self.techs,
        };
        section.get(&id.raw()).ok_or(CatalogError::NotFound(id))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.lookup(id).is_ok()
    }

    /// Total number of entries across both sections
    pub fn len(&self) -> usize {
        self.units_buildings.len() + self.techs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn load_section(
    section: &'static str,
    raw: BTreeMap<String, RawEntry>,
    make_id: fn(u32) -> EntityId,
) -> Result<HashMap<u32, CostEntry>, CatalogError> {
    let mut entries = HashMap::with_capacity(raw.len());

    for (key, entry) in raw {
        let numeric: u32 = key.trim().parse().map_err(|_| CatalogError::InvalidKey {
            section,
            key: key.clone(),
        })?;
        let id = make_id(numeric);
        debug_assert_eq!(id.section(), section);

        if entries.contains_key(&numeric) {
            return Err(CatalogError::DuplicateKey { id, key });
        }

        validate_cost(id, &entry.cost)?;
        let name = entry.display_name(id);
        entries.insert(
            numeric,
            CostEntry {
                id,
                cost: entry.cost,
                name,
            },
        );
    }

    Ok(entries)
}

fn validate_cost(id: EntityId, cost: &ResourceVector) -> Result<(), CatalogError> {
    for resource in Resource::LEDGER_ORDER {
        let value = cost[resource];
        if !value.is_finite() || value < 0.0 {
            return Err(CatalogError::InvalidCost {
                id,
                resource,
                value,
            });
        }
    }
    Ok(())
}

/// Programmatic catalog construction
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    catalog: CostCatalog,
}

impl CatalogBuilder {
    /// Add a unit or building
    pub fn unit(mut self, id: u32, name: &str, cost: ResourceVector) -> Self {
        self.catalog.units_buildings.insert(
            id,
            CostEntry {
                id: EntityId::UnitOrBuilding(id),
                cost,
                name: name.to_string(),
            },
        );
        self
    }

    /// Add a technology
    pub fn technology(mut self, id: u32, name: &str, cost: ResourceVector) -> Self {
        self.catalog.techs.insert(
            id,
            CostEntry {
                id: EntityId::Technology(id),
                cost,
                name: name.to_string(),
            },
        );
        self
    }

    pub fn build(self) -> CostCatalog {
        self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "units_buildings": {
            "83": { "cost": { "food": 50 }, "name": "VMDL", "localised_name": "Villager" },
            "70": { "cost": { "wood": 25 }, "name": "House", "localised_name": "" },
            " 12 ": { "cost": { "wood": 175 }, "name": "Barracks" }
        },
        "techs": {
            "22": { "cost": { "gold": 50 }, "name": "Loom", "localised_name": "Loom" },
            "101": { "cost": { "food": 500 }, "name": "Middle Age", "localised_name": "Feudal Age" },
            "15": { "cost": { "food": 200, "wood": 200 }, "name": "Guilds" }
        },
        "civ_names": {}
    }"#;

    #[test]
    fn test_parse_sample_catalog() {
        let catalog = CostCatalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(catalog.len(), 6);

        let villager = catalog.lookup(EntityId::UnitOrBuilding(83)).unwrap();
        assert_eq!(villager.cost, ResourceVector::new(0.0, 50.0, 0.0, 0.0));
        assert_eq!(villager.name, "Villager");

        let guilds = catalog.lookup(EntityId::Technology(15)).unwrap();
        assert_eq!(guilds.cost.wood, 200.0);
        assert_eq!(guilds.cost.food, 200.0);
    }

    #[test]
    fn test_localised_name_preferred_when_present() {
        let catalog = CostCatalog::from_json_str(SAMPLE).unwrap();
        assert_eq!(
            catalog.lookup(EntityId::Technology(101)).unwrap().name,
            "Feudal Age"
        );
        // Empty localised name falls back to the internal name
        assert_eq!(
            catalog.lookup(EntityId::UnitOrBuilding(70)).unwrap().name,
            "House"
        );
    }

    #[test]
    fn test_keys_are_normalised_at_load() {
        let catalog = CostCatalog::from_json_str(SAMPLE).unwrap();
        assert!(catalog.contains(EntityId::UnitOrBuilding(12)));
    }

    #[test]
    fn test_lookup_miss_is_an_error_not_zero() {
        let catalog = CostCatalog::from_json_str(SAMPLE).unwrap();
        let err = catalog.lookup(EntityId::UnitOrBuilding(9999)).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(EntityId::UnitOrBuilding(9999))));
        assert_eq!(err.to_string(), "unit/building 9999 not found in cost catalog");
    }

    #[test]
    fn test_namespaces_are_separate() {
        let catalog = CostCatalog::from_json_str(SAMPLE).unwrap();
        // 22 is a technology, not a unit
        assert!(catalog.contains(EntityId::Technology(22)));
        assert!(!catalog.contains(EntityId::UnitOrBuilding(22)));
    }

    #[test]
    fn test_invalid_key_rejected() {
        let json = r#"{ "techs": { "loom": { "cost": {} } } }"#;
        let err = CostCatalog::from_json_str(json).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidKey { section: "techs", .. }));
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let json = r#"{ "units_buildings": {
            "12": { "cost": { "wood": 175 }, "name": "Barracks" },
            " 12 ": { "cost": { "wood": 1 }, "name": "Not Barracks" }
        } }"#;
        let err = CostCatalog::from_json_str(json).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::DuplicateKey {
                id: EntityId::UnitOrBuilding(12),
                ..
            }
        ));
    }

    #[test]
    fn test_negative_cost_rejected() {
        let json = r#"{ "units_buildings": { "4": { "cost": { "gold": -45 } } } }"#;
        let err = CostCatalog::from_json_str(json).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::InvalidCost {
                resource: Resource::Gold,
                ..
            }
        ));
    }

    #[test]
    fn test_missing_name_uses_entity_id() {
        let json = r#"{ "units_buildings": { "4": { "cost": { "wood": 25, "gold": 45 } } } }"#;
        let catalog = CostCatalog::from_json_str(json).unwrap();
        assert_eq!(
            catalog.lookup(EntityId::UnitOrBuilding(4)).unwrap().name,
            "unit/building 4"
        );
    }

    #[test]
    fn test_builder() {
        let catalog = CostCatalog::builder()
            .technology(22, "Loom", ResourceVector::single(Resource::Stone, 50.0))
            .unit(83, "Villager", ResourceVector::single(Resource::Food, 50.0))
            .build();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.lookup(EntityId::Technology(22)).unwrap().name, "Loom");
    }

    #[test]
    fn test_from_edition_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("units_buildings_techs.de.json"), SAMPLE).unwrap();

        let catalog = CostCatalog::from_edition_dir(dir.path(), GameEdition::De).unwrap();
        assert_eq!(catalog.len(), 6);

        let err = CostCatalog::from_edition_dir(dir.path(), GameEdition::Hd).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
