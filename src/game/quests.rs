//! Quest activation and turn-in.
//!
//! Quest definitions are static; each player's progress lives in
//! [`GameState::quest_status`]. Evaluation runs when the player opens the
//! quest log, so picking up an item never changes the inventory behind the
//! player's back.

use log::{info, warn};

use crate::game::progression::{grant_experience, LevelUpReport};
use crate::game::types::{GameState, QuestRecord, QuestStatus};
use crate::game::world::WorldLookup;

#[derive(Debug, Clone, PartialEq)]
pub enum QuestEvent {
    Activated {
        quest_id: String,
        name: String,
    },
    Completed {
        quest_id: String,
        name: String,
        exp: f64,
        item: Option<String>,
        level_up: LevelUpReport,
    },
}

fn can_activate(quest: &QuestRecord, state: &GameState) -> bool {
    let req = &quest.requirements;
    let at_location = req
        .location
        .as_deref()
        .map_or(true, |loc| loc == state.player.current_location);
    let high_enough = req
        .player_level
        .map_or(true, |lvl| state.player.level >= lvl);
    at_location && high_enough
}

fn requirements_met(quest: &QuestRecord, state: &GameState) -> bool {
    let req = &quest.requirements;
    let player = &state.player;
    req.item.as_deref().map_or(true, |item| player.has_item(item))
        && req
            .creature_interaction
            .as_deref()
            .map_or(true, |c| player.interactions.iter().any(|i| i == c))
        && can_activate(quest, state)
}

/// Advance every quest the player qualifies for. Inactive quests activate
/// and may complete in the same pass; completed quests never change again.
pub fn evaluate_quests(world: &dyn WorldLookup, state: &mut GameState) -> Vec<QuestEvent> {
    let mut events = Vec::new();
    for id in world.quest_ids() {
        let Some(quest) = world.quest(id) else {
            continue;
        };
        let mut status = state.quest_status(id);

        if status == QuestStatus::Inactive && can_activate(quest, state) {
            status = QuestStatus::Active;
            state.quest_status.insert(id.to_string(), status);
            events.push(QuestEvent::Activated {
                quest_id: id.to_string(),
                name: quest.name.clone(),
            });
        }

        if status != QuestStatus::Active || !requirements_met(quest, state) {
            continue;
        }

        let level_up = match grant_experience(&mut state.player, quest.rewards.exp) {
            Ok(report) => report,
            Err(e) => {
                warn!("quest '{}' has an unusable reward: {}", id, e);
                continue;
            }
        };
        if let Some(item) = &quest.rewards.item {
            state.player.inventory.push(item.clone());
        }
        state.quest_status.insert(id.to_string(), QuestStatus::Complete);
        info!("quest '{}' completed", id);
        events.push(QuestEvent::Completed {
            quest_id: id.to_string(),
            name: quest.name.clone(),
            exp: quest.rewards.exp,
            item: quest.rewards.item.clone(),
            level_up,
        });
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::world::WorldData;
    use chrono::Utc;

    const LOCATIONS: &str = r#"{
        "village": {"id":"village","name":"Village","description":"d","exits":{"north":"forest"},"items":["stone"]},
        "forest": {"id":"forest","name":"Forest","description":"d","exits":{"south":"village"},"creatures":["fox"]}
    }"#;
    const QUESTS: &str = r#"{
        "stone": {"id":"stone","name":"Stone","description":"d",
            "requirements":{"item":"stone","location":"village"},
            "rewards":{"exp":50,"item":"coin"},"status":"active"},
        "fox": {"id":"fox","name":"Fox","description":"d",
            "requirements":{"creature_interaction":"fox","location":"forest","player_level":3},
            "rewards":{"exp":150},"status":"inactive"}
    }"#;

    fn setup() -> (WorldData, GameState) {
        let world = WorldData::from_json(LOCATIONS, "{}", QUESTS, "village").unwrap();
        let state = GameState::new(&world, "village", Utc::now());
        (world, state)
    }

    #[test]
    fn nothing_happens_without_the_item() {
        let (world, mut state) = setup();
        assert!(evaluate_quests(&world, &mut state).is_empty());
        assert_eq!(state.quest_status("stone"), QuestStatus::Active);
    }

    #[test]
    fn item_quest_completes_once() {
        let (world, mut state) = setup();
        assert!(state.take_item("stone"));
        let events = evaluate_quests(&world, &mut state);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], QuestEvent::Completed { exp, .. } if *exp == 50.0));
        assert_eq!(state.player.experience, 50.0);
        assert_eq!(state.player.level, 2);
        assert_eq!(state.player.inventory, vec!["stone", "coin"]);
        assert_eq!(state.quest_status("stone"), QuestStatus::Complete);

        assert!(evaluate_quests(&world, &mut state).is_empty());
        assert_eq!(state.player.experience, 50.0);
    }

    #[test]
    fn level_gated_quest_activates_then_completes() {
        let (world, mut state) = setup();
        state.player.current_location = "forest".to_string();
        assert!(evaluate_quests(&world, &mut state).is_empty());
        assert_eq!(state.quest_status("fox"), QuestStatus::Inactive);

        state.player.level = 3;
        let events = evaluate_quests(&world, &mut state);
        assert!(matches!(&events[..], [QuestEvent::Activated { .. }]));

        state.player.record_interaction("fox");
        let events = evaluate_quests(&world, &mut state);
        assert!(matches!(&events[..], [QuestEvent::Completed { item: None, .. }]));
        assert_eq!(state.quest_status("fox"), QuestStatus::Complete);
    }
}
