//! One player's session.
//!
//! A session owns the current [`GameState`] between lines. Taking `&mut self`
//! per line keeps at most one mutation in flight. When world data failed to
//! load the session is blocked and answers every line with the same notice.

use std::sync::Arc;

use log::{info, warn};

use crate::game::errors::GameError;
use crate::game::generation::TextGenerator;
use crate::game::interpreter::{Clock, GameRules, Interpreter};
use crate::game::storage::GameStore;
use crate::game::types::GameState;
use crate::game::world::WorldData;
use crate::logutil::short_id;

enum Engine<G, C> {
    Ready {
        interpreter: Interpreter<G, C>,
        state: GameState,
    },
    Unavailable(String),
}

pub struct Session<G, C> {
    user_id: String,
    engine: Engine<G, C>,
    greeting: Vec<String>,
}

impl<G: TextGenerator, C: Clock> Session<G, C> {
    /// Start a session from the outcome of loading the world. A saved
    /// `snapshot` is resumed (with offline credit); otherwise a new game begins.
    pub fn open(
        user_id: impl Into<String>,
        world: Result<WorldData, GameError>,
        generator: G,
        clock: C,
        rules: GameRules,
        snapshot: Option<GameState>,
    ) -> Self {
        let user_id = user_id.into();
        let world = match world {
            Ok(world) => world,
            Err(e) => {
                warn!("Session {} blocked: {}", short_id(&user_id), e);
                return Self {
                    user_id,
                    engine: Engine::Unavailable(e.to_string()),
                    greeting: Vec::new(),
                };
            }
        };

        let interpreter = Interpreter::new(Arc::new(world), generator, clock, rules);
        let (state, mut greeting) = match snapshot {
            Some(saved) => {
                info!("Resuming saved game for {}", short_id(&user_id));
                let turn = interpreter.resume(saved);
                (turn.state, turn.output)
            }
            None => (interpreter.new_game(), Vec::new()),
        };
        if !state.player.game_started {
            greeting.insert(0, "Type \"start\" to begin your adventure.".to_string());
        }
        Self {
            user_id,
            engine: Engine::Ready { interpreter, state },
            greeting,
        }
    }

    /// Lines to show before the first prompt.
    pub fn greeting(&self) -> &[String] {
        &self.greeting
    }

    pub fn is_available(&self) -> bool {
        matches!(self.engine, Engine::Ready { .. })
    }

    pub fn state(&self) -> Option<&GameState> {
        match &self.engine {
            Engine::Ready { state, .. } => Some(state),
            Engine::Unavailable(_) => None,
        }
    }

    pub async fn handle(&mut self, line: &str) -> Vec<String> {
        match &mut self.engine {
            Engine::Unavailable(reason) => {
                vec![format!("World data unavailable: {}", reason)]
            }
            Engine::Ready { interpreter, state } => {
                let turn = interpreter.interpret(state.clone(), line).await;
                *state = turn.state;
                turn.output
            }
        }
    }

    /// Stamp `last_online` and persist the current state. Blocked sessions
    /// have nothing to save.
    pub fn save(&mut self, store: &GameStore) -> Result<(), GameError> {
        match &mut self.engine {
            Engine::Ready { interpreter, state } => {
                interpreter.checkpoint(state);
                store.save_state(&self.user_id, state)
            }
            Engine::Unavailable(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::generation::DisabledGenerator;
    use crate::game::interpreter::FixedClock;
    use chrono::Utc;

    fn rules() -> GameRules {
        GameRules {
            start_location: "starting_village".to_string(),
            offline_exp_rate: 0.1,
        }
    }

    #[tokio::test]
    async fn blocked_session_repeats_notice() {
        let mut session = Session::open(
            "u",
            Err(GameError::DataUnavailable("locations.json missing".into())),
            DisabledGenerator,
            FixedClock(Utc::now()),
            rules(),
            None,
        );
        assert!(!session.is_available());
        for line in ["start", "look", "help"] {
            let out = session.handle(line).await;
            assert_eq!(out.len(), 1);
            assert!(out[0].starts_with("World data unavailable"));
        }
        assert!(session.state().is_none());
    }
}
