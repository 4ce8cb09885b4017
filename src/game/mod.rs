//! Game engine: world data, player state, progression and the interpreter.

pub mod commands;
pub mod errors;
pub mod generation;
pub mod interpreter;
pub mod progression;
pub mod quests;
pub mod session;
pub mod storage;
pub mod types;
pub mod world;

pub use errors::{GameError, Precondition};
pub use interpreter::{Clock, FixedClock, GameRules, Interpreter, SystemClock, Turn};
pub use session::Session;
pub use storage::{GameStore, GameStoreBuilder};
pub use types::{Choice, GameState, Gender, Job, PlayerRecord};
pub use world::{WorldData, WorldLookup};
