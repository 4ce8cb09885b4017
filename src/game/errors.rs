use thiserror::Error;

use crate::game::types::Job;

/// Gating conditions a recognised verb can fail on. Each one renders its own
/// player-facing message so callers can tell them apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Precondition {
    #[error("Type \"start\" to begin your adventure.")]
    NotStarted,

    #[error("The game has already started.")]
    AlreadyStarted,

    #[error("Your gender has already been chosen.")]
    GenderAlreadyChosen,

    #[error("You must reach Level {required} before choosing a job (you are Level {current}).")]
    LevelTooLow { required: u32, current: u32 },

    #[error("You are already a {0}.")]
    JobAlreadyChosen(Job),

    #[error("'{0}' is not a job. Choose from: shaman, warrior, scholar, explorer.")]
    InvalidJob(String),

    #[error("You cannot go {0} from here.")]
    NoExit(String),

    #[error("There is no {0} here.")]
    ItemNotHere(String),

    #[error("Cannot find or examine {0}.")]
    TargetNotFound(String),

    #[error("You need to say what to {0}.")]
    MissingTarget(&'static str),
}

/// Errors raised by the game engine, its world loader and its persistence layer.
#[derive(Debug, Error)]
pub enum GameError {
    /// Unrecognised verb or malformed argument.
    #[error("{0}")]
    InvalidCommand(String),

    /// Valid verb whose gating condition does not hold.
    #[error(transparent)]
    Precondition(#[from] Precondition),

    /// World data failed to load; no session can start.
    #[error("world data unavailable: {0}")]
    DataUnavailable(String),

    /// Generation or persistence collaborator failure.
    #[error("service error: {0}")]
    Service(String),

    /// Rejected numeric input (negative or non-finite experience).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn precondition_messages_are_distinct() {
        let low = GameError::from(Precondition::LevelTooLow {
            required: 5,
            current: 4,
        });
        let chosen = GameError::from(Precondition::JobAlreadyChosen(Job::Shaman));
        let invalid = GameError::from(Precondition::InvalidJob("baker".into()));
        assert!(low.to_string().contains("Level 5"));
        assert_eq!(chosen.to_string(), "You are already a shaman.");
        assert!(invalid.to_string().starts_with("'baker' is not a job"));
    }
}
