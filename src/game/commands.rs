//! Command line parsing.
//!
//! Input is trimmed, lowercased and split on single spaces. The first token is
//! the verb; the remaining tokens, rejoined with single spaces, are the
//! argument.

use crate::game::types::Gender;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameCommand {
    Start,                 // START
    ChooseGender(Gender),  // MALE | FEMALE | UNIDENTIFIED
    Help,                  // HELP
    Go(String),            // GO north, or a bare direction
    Look,                  // LOOK, L
    Take(String),          // TAKE item
    Inventory,             // INVENTORY, INV, I
    Stats,                 // STATS
    ChooseJob(String),     // CHOOSE JOB name
    Examine(String),       // EXAMINE target, X target
    SuggestQuest,          // SUGGEST QUEST
    Talk(String),          // TALK [npc]
    Imagine(String),       // IMAGINE target
    Quests,                // QUESTS
    Unknown(String),
}

impl GameCommand {
    /// Only these verbs are accepted before the game has started.
    pub fn allowed_before_start(&self) -> bool {
        matches!(self, GameCommand::Start | GameCommand::Help)
    }

    /// Whether a successful run of this command is worth the +1 activity experience.
    /// The quest log pays out through quest rewards instead.
    pub fn grants_activity_experience(&self) -> bool {
        !matches!(
            self,
            GameCommand::Help | GameCommand::Quests | GameCommand::Unknown(_)
        )
    }
}

/// Split a raw line into `(verb, argument)`.
pub fn split_line(raw: &str) -> (String, String) {
    let lowered = raw.trim().to_lowercase();
    let mut parts = lowered.split(' ');
    let verb = parts.next().unwrap_or_default().to_string();
    let argument = parts.collect::<Vec<_>>().join(" ");
    (verb, argument)
}

/// Parse raw input into a [`GameCommand`].
pub fn parse_command(raw: &str) -> GameCommand {
    let (verb, argument) = split_line(raw);

    match verb.as_str() {
        "start" => GameCommand::Start,
        "help" | "?" => GameCommand::Help,
        "go" | "move" => GameCommand::Go(argument),
        "north" | "south" | "east" | "west" | "up" | "down" => GameCommand::Go(verb),
        "n" => GameCommand::Go("north".into()),
        "s" => GameCommand::Go("south".into()),
        "e" => GameCommand::Go("east".into()),
        "w" => GameCommand::Go("west".into()),
        "look" | "l" => GameCommand::Look,
        "take" | "get" => GameCommand::Take(argument),
        "inventory" | "inv" | "i" => GameCommand::Inventory,
        "stats" | "score" => GameCommand::Stats,
        "choose" if argument == "job" => GameCommand::ChooseJob(String::new()),
        "choose" => match argument.strip_prefix("job ") {
            Some(rest) => GameCommand::ChooseJob(rest.trim().to_string()),
            None => GameCommand::Unknown(verb),
        },
        "examine" | "x" => GameCommand::Examine(argument),
        "suggest" if argument == "quest" => GameCommand::SuggestQuest,
        "talk" => GameCommand::Talk(argument),
        "imagine" => GameCommand::Imagine(argument),
        "quests" | "quest" => GameCommand::Quests,
        other => match Gender::from_label(other) {
            Some(gender) => GameCommand::ChooseGender(gender),
            None => GameCommand::Unknown(verb),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_verb_and_argument() {
        assert_eq!(
            split_line("  TAKE Shining_Stone  "),
            ("take".to_string(), "shining_stone".to_string())
        );
        assert_eq!(split_line("look"), ("look".to_string(), String::new()));
        assert_eq!(
            split_line("imagine an ancient sword"),
            ("imagine".to_string(), "an ancient sword".to_string())
        );
    }

    #[test]
    fn movement_forms() {
        assert_eq!(parse_command("go north"), GameCommand::Go("north".into()));
        assert_eq!(parse_command("N"), GameCommand::Go("north".into()));
        assert_eq!(parse_command("east"), GameCommand::Go("east".into()));
        assert_eq!(parse_command("go"), GameCommand::Go(String::new()));
    }

    #[test]
    fn compound_verbs() {
        assert_eq!(parse_command("choose job shaman"), GameCommand::ChooseJob("shaman".into()));
        assert_eq!(parse_command("choose job"), GameCommand::ChooseJob(String::new()));
        assert_eq!(parse_command("choose hat"), GameCommand::Unknown("choose".into()));
        assert_eq!(parse_command("suggest quest"), GameCommand::SuggestQuest);
        assert_eq!(parse_command("suggest food"), GameCommand::Unknown("suggest".into()));
    }

    #[test]
    fn gender_labels_are_verbs() {
        assert_eq!(parse_command("Female"), GameCommand::ChooseGender(Gender::Female));
        assert_eq!(
            parse_command("unidentified"),
            GameCommand::ChooseGender(Gender::Unidentified)
        );
    }

    #[test]
    fn gating_and_experience_flags() {
        assert!(parse_command("start").allowed_before_start());
        assert!(parse_command("help").allowed_before_start());
        assert!(!parse_command("look").allowed_before_start());
        assert!(!GameCommand::Help.grants_activity_experience());
        assert!(GameCommand::Look.grants_activity_experience());
        assert!(!GameCommand::Quests.grants_activity_experience());
    }

    #[test]
    fn unknown_and_empty() {
        assert_eq!(parse_command("dance"), GameCommand::Unknown("dance".into()));
        assert_eq!(parse_command("   "), GameCommand::Unknown(String::new()));
    }
}
