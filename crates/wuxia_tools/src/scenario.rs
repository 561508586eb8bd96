//! Scenario loading and configuration.
//!
//! A scenario describes one fight: a location, the entities standing in it,
//! how they split into teams and the seed to resolve it with. Entities
//! refer to techniques by name; names resolve against the technique catalog
//! plus any techniques defined inline in the scenario.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use wuxia_core::combat::{CombatContext, CombatStarter, Location, TeamRule};
use wuxia_core::config::CombatConfig;
use wuxia_core::cultivation::Cultivation;
use wuxia_core::data::TechniqueCatalog;
use wuxia_core::entity::{Entity, EntityKind};
use wuxia_core::error::CombatError;
use wuxia_core::loadout::Loadout;
use wuxia_core::stats::Stats;
use wuxia_core::technique::Technique;

/// Error type for scenario operations.
#[derive(Error, Debug)]
pub enum ScenarioError {
    /// File not found.
    #[error("Scenario file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read scenario file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse scenario: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// An entity knows a technique nobody defined.
    #[error("Entity '{entity}' knows unknown technique '{technique}'")]
    UnknownTechnique {
        /// Entity id.
        entity: String,
        /// Technique name.
        technique: String,
    },
    /// Team selection names an entity that is not at the location.
    #[error("Entity not found at the location: {0}")]
    UnknownEntity(String),
    /// Catalog loading failed.
    #[error("Failed to load techniques: {0}")]
    Techniques(#[from] crate::validate::ValidateError),
    /// Combat setup or resolution failed.
    #[error("Combat error: {0}")]
    Combat(#[from] CombatError),
}

/// An entity as written in a scenario file.
///
/// Hp and stamina start full unless `hp` is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySpec {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Kind; decides the default tags.
    pub kind: EntityKind,
    /// Tags on top of the kind's defaults.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Base stats.
    pub stats: Stats,
    /// Qi and soul reserves.
    #[serde(default)]
    pub cultivation: Cultivation,
    /// Equipped items.
    #[serde(default)]
    pub loadout: Option<Loadout>,
    /// Names of known techniques.
    #[serde(default)]
    pub techniques: Vec<String>,
    /// Starting hp, if not full.
    #[serde(default)]
    pub hp: Option<f64>,
}

impl EntitySpec {
    /// Build the entity, resolving technique names in `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`ScenarioError::UnknownTechnique`] for a name missing from
    /// `catalog`.
    pub fn build(&self, catalog: &TechniqueCatalog) -> Result<Entity, ScenarioError> {
        let mut entity = Entity::new(&*self.id, &*self.name, self.kind, self.stats.clone())
            .with_cultivation(self.cultivation);
        entity.tags.extend(self.tags.iter().cloned());
        if let Some(loadout) = &self.loadout {
            entity = entity.with_loadout(loadout.clone());
        }
        if let Some(hp) = self.hp {
            entity.hp = hp.min(entity.max_hp());
        }

        for name in &self.techniques {
            let technique = catalog
                .get(name)
                .ok_or_else(|| ScenarioError::UnknownTechnique {
                    entity: self.id.clone(),
                    technique: name.clone(),
                })?;
            entity = entity.with_technique(technique.clone());
        }
        Ok(entity)
    }
}

/// Where the fight happens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSpec {
    /// Display name.
    pub name: String,
    /// Tags; a size tag sets the field size.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Everyone present.
    pub entities: Vec<EntitySpec>,
}

/// How the location's entities become teams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TeamSelection {
    /// Explicit rules; the first matching rule wins.
    Tags(Vec<TeamRule>),
    /// The player against everything sharing the named entity's tags.
    Target(String),
    /// One team per named commander.
    Commanders(Vec<String>),
}

/// A complete scenario configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// The location and its entities.
    pub location: LocationSpec,
    /// Team selection.
    pub teams: TeamSelection,
    /// Seed for the combat's random source.
    #[serde(default)]
    pub seed: u64,
    /// Techniques defined only for this scenario.
    #[serde(default)]
    pub techniques: Vec<Technique>,
    /// Commands fed to the player in order when simulating.
    #[serde(default)]
    pub player_commands: Vec<String>,
    /// Combat tunables, if not the defaults.
    #[serde(default)]
    pub config: Option<CombatConfig>,
}

impl Scenario {
    /// Load a scenario from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ScenarioError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let scenario: Scenario = ron::from_str(&contents)?;
        Ok(scenario)
    }

    /// Load from a RON string (useful for embedded scenarios).
    pub fn from_ron_str(ron: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = ron::from_str(ron)?;
        Ok(scenario)
    }

    /// `base` plus this scenario's inline techniques.
    ///
    /// # Errors
    ///
    /// Returns an error if an inline technique is invalid or shadows a
    /// catalog name.
    pub fn catalog(&self, base: &TechniqueCatalog) -> Result<TechniqueCatalog, ScenarioError> {
        let mut catalog = base.clone();
        for technique in &self.techniques {
            catalog.insert(technique.clone())?;
        }
        Ok(catalog)
    }

    /// Build the location with every entity resolved.
    ///
    /// # Errors
    ///
    /// Returns an error if an entity knows an unknown technique.
    pub fn location(&self, catalog: &TechniqueCatalog) -> Result<Location, ScenarioError> {
        let entities = self
            .location
            .entities
            .iter()
            .map(|spec| spec.build(catalog))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Location {
            name: self.location.name.clone(),
            tags: self.location.tags.clone(),
            entities,
        })
    }

    /// Group the location into a combat context.
    ///
    /// # Errors
    ///
    /// Returns an error if techniques don't resolve, a named entity is
    /// missing, or team assignment fails.
    pub fn build_context(&self, base: &TechniqueCatalog) -> Result<CombatContext, ScenarioError> {
        let catalog = self.catalog(base)?;
        let starter = CombatStarter::new(self.location(&catalog)?);

        let context = match &self.teams {
            TeamSelection::Tags(rules) => starter.group_by_tags(rules)?,
            TeamSelection::Target(id) => {
                let target = find_entity(starter.location(), id)?;
                starter.group_by_target_tags(target)?
            }
            TeamSelection::Commanders(ids) => {
                let commanders = ids
                    .iter()
                    .map(|id| find_entity(starter.location(), id).cloned())
                    .collect::<Result<Vec<_>, _>>()?;
                starter.group_by_commanders(&commanders)?
            }
        };

        tracing::info!(
            scenario = %self.name,
            field_size = %starter.field_size(),
            combatants = context.len(),
            "Scenario ready"
        );
        Ok(context)
    }
}

fn find_entity<'a>(location: &'a Location, id: &str) -> Result<&'a Entity, ScenarioError> {
    location
        .entities
        .iter()
        .find(|entity| entity.id == id)
        .ok_or_else(|| ScenarioError::UnknownEntity(id.to_string()))
}

/// Load combat tunables from a RON file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CombatConfig, ScenarioError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ScenarioError::FileNotFound(path.display().to_string()));
    }
    let contents = std::fs::read_to_string(path)?;
    Ok(CombatConfig::from_ron_str(&contents)?)
}
