//! Shared fixtures for integration tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use realm::game::errors::GameError;
use realm::game::generation::TextGenerator;
use realm::game::interpreter::{Clock, FixedClock, GameRules, Interpreter};
use realm::game::{GameState, WorldData};

pub const START: &str = "starting_village";

/// The world shipped with the crate under `data/world`.
pub fn world_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("data").join("world")
}

#[allow(dead_code)]
pub fn shipped_world() -> WorldData {
    WorldData::load_from_dir(world_dir(), START).expect("shipped world loads")
}

#[allow(dead_code)]
pub fn rules() -> GameRules {
    GameRules {
        start_location: START.to_string(),
        offline_exp_rate: 0.1,
    }
}

/// A clock that only moves when a test advances it. Clones share the instant.
#[derive(Clone)]
#[allow(dead_code)]
pub struct SteppingClock(Arc<Mutex<DateTime<Utc>>>);

#[allow(dead_code)]
impl SteppingClock {
    pub fn starting_at(now: DateTime<Utc>) -> Self {
        Self(Arc::new(Mutex::new(now)))
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Generator that replays a fixed reply (or failure) and remembers prompts.
#[derive(Clone, Default)]
pub struct ScriptedGenerator {
    reply: Option<String>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl ScriptedGenerator {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            prompts: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GameError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply
            .clone()
            .ok_or_else(|| GameError::Service("connection refused".to_string()))
    }
}

#[allow(dead_code)]
pub fn interpreter_at(
    generator: ScriptedGenerator,
    now: DateTime<Utc>,
) -> Interpreter<ScriptedGenerator, FixedClock> {
    Interpreter::new(Arc::new(shipped_world()), generator, FixedClock(now), rules())
}

/// Run `lines` in order and return the final state plus the last turn's output.
#[allow(dead_code)]
pub async fn run(
    interp: &Interpreter<ScriptedGenerator, FixedClock>,
    mut state: GameState,
    lines: &[&str],
) -> (GameState, Vec<String>) {
    let mut output = Vec::new();
    for line in lines {
        let turn = interp.interpret(state, line).await;
        state = turn.state;
        output = turn.output;
    }
    (state, output)
}
