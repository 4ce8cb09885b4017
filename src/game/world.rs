//! World data loading.
//!
//! The world is three JSON documents (`locations.json`, `creatures.json` and
//! `quests.json`), each an object keyed by id. They are read once at session
//! start and exposed read-only through [`WorldLookup`]. Any failure, from a
//! missing file to an exit pointing nowhere, surfaces as
//! [`GameError::DataUnavailable`].

use log::{debug, info};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::game::errors::GameError;
use crate::game::types::{Creature, Location, QuestRecord};

pub const LOCATIONS_FILE: &str = "locations.json";
pub const CREATURES_FILE: &str = "creatures.json";
pub const QUESTS_FILE: &str = "quests.json";

/// Read-only lookup of static world data by id.
pub trait WorldLookup: Send + Sync {
    fn location(&self, id: &str) -> Option<&Location>;
    fn creature(&self, id: &str) -> Option<&Creature>;
    fn quest(&self, id: &str) -> Option<&QuestRecord>;
    fn location_ids(&self) -> Vec<&str>;
    fn quest_ids(&self) -> Vec<&str>;
}

#[derive(Debug, Clone, Default)]
pub struct WorldData {
    pub locations: BTreeMap<String, Location>,
    pub creatures: BTreeMap<String, Creature>,
    pub quests: BTreeMap<String, QuestRecord>,
}

impl WorldLookup for WorldData {
    fn location(&self, id: &str) -> Option<&Location> {
        self.locations.get(id)
    }

    fn creature(&self, id: &str) -> Option<&Creature> {
        self.creatures.get(id)
    }

    fn quest(&self, id: &str) -> Option<&QuestRecord> {
        self.quests.get(id)
    }

    fn location_ids(&self) -> Vec<&str> {
        self.locations.keys().map(String::as_str).collect()
    }

    fn quest_ids(&self) -> Vec<&str> {
        self.quests.keys().map(String::as_str).collect()
    }
}

impl WorldData {
    /// Load all three documents from `dir` and check that `start_location`
    /// and every exit resolve to a known location.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P, start_location: &str) -> Result<Self, GameError> {
        let dir = dir.as_ref();
        let world = Self {
            locations: load_document(&dir.join(LOCATIONS_FILE))?,
            creatures: load_document(&dir.join(CREATURES_FILE))?,
            quests: load_document(&dir.join(QUESTS_FILE))?,
        };
        world.validate(start_location)?;
        info!(
            "World loaded from {}: {} locations, {} creatures, {} quests",
            dir.display(),
            world.locations.len(),
            world.creatures.len(),
            world.quests.len()
        );
        Ok(world)
    }

    /// Build a world from in-memory JSON strings (same shape as the files).
    pub fn from_json(
        locations: &str,
        creatures: &str,
        quests: &str,
        start_location: &str,
    ) -> Result<Self, GameError> {
        let world = Self {
            locations: parse_document(LOCATIONS_FILE, locations)?,
            creatures: parse_document(CREATURES_FILE, creatures)?,
            quests: parse_document(QUESTS_FILE, quests)?,
        };
        world.validate(start_location)?;
        Ok(world)
    }

    fn validate(&self, start_location: &str) -> Result<(), GameError> {
        if !self.locations.contains_key(start_location) {
            return Err(GameError::DataUnavailable(format!(
                "start location '{}' is not defined",
                start_location
            )));
        }
        for (key, location) in &self.locations {
            if key != &location.id {
                return Err(GameError::DataUnavailable(format!(
                    "location keyed '{}' declares id '{}'",
                    key, location.id
                )));
            }
            for (direction, target) in &location.exits {
                if !self.locations.contains_key(target) {
                    return Err(GameError::DataUnavailable(format!(
                        "exit {} from '{}' leads to unknown location '{}'",
                        direction, key, target
                    )));
                }
            }
            for creature in &location.creatures {
                if !self.creatures.contains_key(creature) {
                    debug!("location '{}' lists unknown creature '{}'", key, creature);
                }
            }
        }
        Ok(())
    }
}

fn load_document<T: DeserializeOwned>(path: &Path) -> Result<BTreeMap<String, T>, GameError> {
    let contents = fs::read_to_string(path).map_err(|e| {
        GameError::DataUnavailable(format!("failed to read {}: {}", path.display(), e))
    })?;
    parse_document(&path.display().to_string(), &contents)
}

fn parse_document<T: DeserializeOwned>(
    name: &str,
    text: &str,
) -> Result<BTreeMap<String, T>, GameError> {
    serde_json::from_str(text)
        .map_err(|e| GameError::DataUnavailable(format!("failed to parse {}: {}", name, e)))
}
