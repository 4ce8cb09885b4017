//! Sled-backed save store.
//!
//! One record per user id, last write wins. Records hold the game state as
//! JSON text so the HTTP service can accept snapshots from any client, while
//! the record envelope itself is bincode like every other sled value here.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use sled::IVec;

use crate::game::errors::GameError;
use crate::game::types::GameState;
use crate::logutil::short_id;

const TREE_SAVES: &str = "realm_saves";
const SAVE_PREFIX: &str = "saves:";

pub const SAVE_RECORD_SCHEMA_VERSION: u8 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    pub user_id: String,
    /// Snapshot exactly as the client sent it, serialized as JSON.
    pub game_state: String,
    pub last_updated: DateTime<Utc>,
    pub schema_version: u8,
}

/// Helper builder so tests can create throwaway stores.
pub struct GameStoreBuilder {
    path: PathBuf,
    flush_on_write: bool,
}

impl GameStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            flush_on_write: true,
        }
    }

    /// Skip the fsync after every save.
    pub fn without_flush(mut self) -> Self {
        self.flush_on_write = false;
        self
    }

    pub fn open(self) -> Result<GameStore, GameError> {
        GameStore::open_with_options(self.path, self.flush_on_write)
    }
}

pub struct GameStore {
    _db: sled::Db,
    saves: sled::Tree,
    flush_on_write: bool,
}

impl GameStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        Self::open_with_options(path, true)
    }

    fn open_with_options<P: AsRef<Path>>(path: P, flush_on_write: bool) -> Result<Self, GameError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let saves = db.open_tree(TREE_SAVES)?;
        debug!("Opened save store at {}", path_ref.display());
        Ok(Self {
            _db: db,
            saves,
            flush_on_write,
        })
    }

    fn save_key(user_id: &str) -> Vec<u8> {
        format!("{}{}", SAVE_PREFIX, user_id).into_bytes()
    }

    fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, GameError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, GameError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    /// Insert or replace the snapshot stored for `user_id`.
    pub fn save(&self, user_id: &str, game_state: &serde_json::Value) -> Result<(), GameError> {
        if user_id.is_empty() {
            return Err(GameError::InvalidArgument("user id must not be empty".into()));
        }
        let record = SaveRecord {
            user_id: user_id.to_string(),
            game_state: serde_json::to_string(game_state)?,
            last_updated: Utc::now(),
            schema_version: SAVE_RECORD_SCHEMA_VERSION,
        };
        self.saves
            .insert(Self::save_key(user_id), Self::serialize(&record)?)?;
        if self.flush_on_write {
            self.saves.flush()?;
        }
        debug!("Saved game state for user {}", short_id(user_id));
        Ok(())
    }

    /// Fetch the full record for `user_id`.
    pub fn get_record(&self, user_id: &str) -> Result<SaveRecord, GameError> {
        let Some(bytes) = self.saves.get(Self::save_key(user_id))? else {
            return Err(GameError::NotFound(format!("save: {}", user_id)));
        };
        let record: SaveRecord = Self::deserialize(bytes)?;
        if record.schema_version != SAVE_RECORD_SCHEMA_VERSION {
            return Err(GameError::SchemaMismatch {
                entity: "save",
                expected: SAVE_RECORD_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(record)
    }

    /// Stored snapshot for `user_id`, or `None` if the user never saved.
    pub fn load(&self, user_id: &str) -> Result<Option<serde_json::Value>, GameError> {
        match self.get_record(user_id) {
            Ok(record) => Ok(Some(serde_json::from_str(&record.game_state)?)),
            Err(GameError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub fn save_state(&self, user_id: &str, state: &GameState) -> Result<(), GameError> {
        self.save(user_id, &serde_json::to_value(state)?)
    }

    pub fn load_state(&self, user_id: &str) -> Result<Option<GameState>, GameError> {
        match self.load(user_id)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store() -> (TempDir, GameStore) {
        let dir = TempDir::new().expect("tempdir");
        let store = GameStoreBuilder::new(dir.path().join("saves"))
            .without_flush()
            .open()
            .expect("store");
        (dir, store)
    }

    #[test]
    fn save_then_load_returns_snapshot() {
        let (_dir, store) = store();
        let snapshot = json!({"player": {"level": 3}, "currentLocation": "dense_forest"});
        store.save("user-1", &snapshot).unwrap();
        assert_eq!(store.load("user-1").unwrap(), Some(snapshot));
    }

    #[test]
    fn later_save_wins() {
        let (_dir, store) = store();
        store.save("u", &json!({"v": 1})).unwrap();
        store.save("u", &json!({"v": 2})).unwrap();
        assert_eq!(store.load("u").unwrap(), Some(json!({"v": 2})));
    }

    #[test]
    fn unknown_user_is_none() {
        let (_dir, store) = store();
        assert_eq!(store.load("nobody").unwrap(), None);
        assert!(matches!(
            store.get_record("nobody"),
            Err(GameError::NotFound(_))
        ));
    }

    #[test]
    fn empty_user_id_is_rejected() {
        let (_dir, store) = store();
        assert!(matches!(
            store.save("", &json!({})),
            Err(GameError::InvalidArgument(_))
        ));
    }
}
