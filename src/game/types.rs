use chrono::{DateTime, Utc};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::game::world::WorldLookup;

pub const SAVE_SCHEMA_VERSION: u8 = 1;
pub const JOB_UNLOCK_LEVEL: u32 = 5;

/// Write-once field: starts `Unset` and can be chosen exactly one time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum Choice<T> {
    Unset,
    Chosen(T),
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Choice::Unset
    }
}

impl<T: Copy> Choice<T> {
    pub fn is_chosen(&self) -> bool {
        matches!(self, Choice::Chosen(_))
    }

    pub fn value(&self) -> Option<T> {
        match self {
            Choice::Unset => None,
            Choice::Chosen(v) => Some(*v),
        }
    }

    /// Lock in `value`. Fails with the existing choice if one was already made.
    pub fn choose(&mut self, value: T) -> Result<(), T> {
        match self {
            Choice::Chosen(existing) => Err(*existing),
            Choice::Unset => {
                *self = Choice::Chosen(value);
                Ok(())
            }
        }
    }
}

impl<T: fmt::Display> fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::Unset => f.write_str("?"),
            Choice::Chosen(v) => v.fmt(f),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Unidentified,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Unidentified];

    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unidentified => "unidentified",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.label() == label)
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Job {
    Shaman,
    Warrior,
    Scholar,
    Explorer,
}

impl Job {
    pub const ALL: [Job; 4] = [Job::Shaman, Job::Warrior, Job::Scholar, Job::Explorer];

    pub fn label(&self) -> &'static str {
        match self {
            Job::Shaman => "shaman",
            Job::Warrior => "warrior",
            Job::Scholar => "scholar",
            Job::Explorer => "explorer",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|j| j.label() == label)
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Direction name to destination location id. Edges need not be symmetric.
    #[serde(default)]
    pub exits: BTreeMap<String, String>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub creatures: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creature {
    pub id: String,
    pub name: String,
    pub description: String,
    pub symbolic_meaning: String,
    pub abilities: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    #[default]
    Inactive,
    Active,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QuestRequirements {
    #[serde(default)]
    pub item: Option<String>,
    #[serde(default)]
    pub creature_interaction: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub player_level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QuestRewards {
    #[serde(default)]
    pub exp: f64,
    #[serde(default)]
    pub item: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub requirements: QuestRequirements,
    #[serde(default)]
    pub rewards: QuestRewards,
    /// Initial status; the live status is tracked per player in [`GameState`].
    #[serde(default)]
    pub status: QuestStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    pub level: u32,
    pub experience: f64,
    #[serde(default)]
    pub gender: Choice<Gender>,
    #[serde(default)]
    pub job: Choice<Job>,
    /// Item ids in acquisition order.
    #[serde(default)]
    pub inventory: Vec<String>,
    pub current_location: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_online: DateTime<Utc>,
    #[serde(default)]
    pub game_started: bool,
    /// Set once the level-5 job unlock has been announced.
    #[serde(default)]
    pub job_unlock_announced: bool,
    /// Creature ids the player has examined.
    #[serde(default)]
    pub interactions: Vec<String>,
}

impl PlayerRecord {
    pub fn new(starting_location: &str, now: DateTime<Utc>) -> Self {
        Self {
            level: 1,
            experience: 0.0,
            gender: Choice::Unset,
            job: Choice::Unset,
            inventory: Vec::new(),
            current_location: starting_location.to_string(),
            last_online: now,
            game_started: false,
            job_unlock_announced: false,
            interactions: Vec::new(),
        }
    }

    pub fn has_item(&self, item: &str) -> bool {
        self.inventory.iter().any(|i| i == item)
    }

    pub fn record_interaction(&mut self, creature_id: &str) {
        if !self.interactions.iter().any(|c| c == creature_id) {
            self.interactions.push(creature_id.to_string());
        }
    }
}

/// Everything that changes during play: the player plus the mutable slice of
/// the world. Static location text, exits and creatures stay in [`WorldLookup`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub player: PlayerRecord,
    /// Items currently lying in each location, keyed by location id.
    #[serde(default)]
    pub location_items: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub quest_status: BTreeMap<String, QuestStatus>,
    /// Whether offline experience has been credited during this process.
    #[serde(skip)]
    pub offline_credited: bool,
    #[serde(default = "default_schema_version")]
    pub schema_version: u8,
}

fn default_schema_version() -> u8 {
    SAVE_SCHEMA_VERSION
}

impl GameState {
    /// Fresh state for a brand-new player standing at `start_location`.
    pub fn new(world: &dyn WorldLookup, start_location: &str, now: DateTime<Utc>) -> Self {
        let mut state = Self {
            player: PlayerRecord::new(start_location, now),
            location_items: BTreeMap::new(),
            quest_status: BTreeMap::new(),
            offline_credited: false,
            schema_version: SAVE_SCHEMA_VERSION,
        };
        state.reconcile(world, start_location);
        state
    }

    /// Bring a (possibly rehydrated) state in line with the loaded world:
    /// seed item lists and quest statuses the state has never seen, and move
    /// the player back to `start_location` if their location no longer exists.
    pub fn reconcile(&mut self, world: &dyn WorldLookup, start_location: &str) {
        for id in world.location_ids() {
            if let Some(location) = world.location(id) {
                self.location_items
                    .entry(id.to_string())
                    .or_insert_with(|| location.items.clone());
            }
        }
        for id in world.quest_ids() {
            if let Some(quest) = world.quest(id) {
                self.quest_status.entry(id.to_string()).or_insert(quest.status);
            }
        }
        if world.location(&self.player.current_location).is_none() {
            warn!(
                "player location '{}' not in world, resetting to '{}'",
                self.player.current_location, start_location
            );
            self.player.current_location = start_location.to_string();
        }
        self.schema_version = SAVE_SCHEMA_VERSION;
    }

    pub fn items_at(&self, location_id: &str) -> &[String] {
        self.location_items
            .get(location_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Move one occurrence of `item` from the player's location into the
    /// inventory. Returns false (and changes nothing) when it is not there.
    pub fn take_item(&mut self, item: &str) -> bool {
        let Some(items) = self.location_items.get_mut(&self.player.current_location) else {
            return false;
        };
        let Some(pos) = items.iter().position(|i| i == item) else {
            return false;
        };
        let taken = items.remove(pos);
        self.player.inventory.push(taken);
        true
    }

    pub fn quest_status(&self, quest_id: &str) -> QuestStatus {
        self.quest_status.get(quest_id).copied().unwrap_or_default()
    }
}
