//! The command interpreter.
//!
//! [`Interpreter::interpret`] takes a [`GameState`] by value together with one
//! raw input line and hands back the next state plus the lines to print.
//! Rejections leave the state untouched and grant nothing; every other verb
//! except `help` and `quests` earns one point of activity experience.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::config::GameConfig;
use crate::game::commands::{parse_command, GameCommand};
use crate::game::errors::{GameError, Precondition};
use crate::game::generation::{imagine_prompt, suggest_quest_prompt, talk_prompt, TextGenerator};
use crate::game::progression::{apply_offline_experience, grant_experience, LevelUpReport};
use crate::game::quests::{evaluate_quests, QuestEvent};
use crate::game::types::{GameState, Gender, Job, Location, QuestStatus, JOB_UNLOCK_LEVEL};
use crate::game::world::WorldLookup;
use crate::logutil::escape_log;

/// Experience earned by every successful non-help command.
pub const ACTIVITY_EXP: f64 = 1.0;

const DEFAULT_NPC: &str = "Village Elder";

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stuck at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct GameRules {
    pub start_location: String,
    pub offline_exp_rate: f64,
}

impl From<&GameConfig> for GameRules {
    fn from(config: &GameConfig) -> Self {
        Self {
            start_location: config.start_location.clone(),
            offline_exp_rate: config.offline_exp_rate,
        }
    }
}

/// Result of one interpreted line.
#[derive(Debug, Clone)]
pub struct Turn {
    pub state: GameState,
    pub output: Vec<String>,
}

/// What a successful handler produced. `progressed` is false for purely
/// informational replies that should not earn activity experience.
struct Reply {
    lines: Vec<String>,
    progressed: bool,
}

impl Reply {
    fn progress(lines: Vec<String>) -> Self {
        Self {
            lines,
            progressed: true,
        }
    }

    fn info(lines: Vec<String>) -> Self {
        Self {
            lines,
            progressed: false,
        }
    }
}

pub struct Interpreter<G, C = SystemClock> {
    world: Arc<dyn WorldLookup>,
    generator: G,
    clock: C,
    rules: GameRules,
}

impl<G: TextGenerator, C: Clock> Interpreter<G, C> {
    pub fn new(world: Arc<dyn WorldLookup>, generator: G, clock: C, rules: GameRules) -> Self {
        Self {
            world,
            generator,
            clock,
            rules,
        }
    }

    /// Fresh state at the configured start location.
    pub fn new_game(&self) -> GameState {
        GameState::new(
            self.world.as_ref(),
            &self.rules.start_location,
            self.clock.now(),
        )
    }

    /// Rehydrate a saved state: reconcile it with the loaded world and, if the
    /// player already picked a gender, credit the time spent offline.
    pub fn resume(&self, mut state: GameState) -> Turn {
        state.offline_credited = false;
        state.reconcile(self.world.as_ref(), &self.rules.start_location);
        let mut output = Vec::new();
        if state.player.gender.is_chosen() {
            self.credit_offline(&mut state, &mut output);
        }
        Turn { state, output }
    }

    /// Mark the player as online right now. Called before a snapshot is
    /// written so the next resume only credits time spent away.
    pub fn checkpoint(&self, state: &mut GameState) {
        state.player.last_online = self.clock.now();
    }

    pub async fn interpret(&self, mut state: GameState, line: &str) -> Turn {
        let command = parse_command(line);
        debug!("command {:?} from input '{}'", command, escape_log(line));

        if !state.player.game_started && !command.allowed_before_start() {
            return Turn {
                state,
                output: vec![Precondition::NotStarted.to_string()],
            };
        }

        let earns_activity = command.grants_activity_experience();
        let result = match command {
            GameCommand::Start => self.handle_start(&mut state),
            GameCommand::ChooseGender(gender) => self.handle_gender(&mut state, gender),
            GameCommand::Help => Ok(Reply::info(help_lines())),
            GameCommand::Go(direction) => self.handle_go(&mut state, &direction),
            GameCommand::Look => self.handle_look(&state),
            GameCommand::Take(item) => self.handle_take(&mut state, &item),
            GameCommand::Inventory => Ok(Reply::progress(vec![inventory_line(&state)])),
            GameCommand::Stats => Ok(Reply::progress(vec![stats_line(&state)])),
            GameCommand::ChooseJob(name) => self.handle_choose_job(&mut state, &name),
            GameCommand::Examine(target) => self.handle_examine(&mut state, &target),
            GameCommand::SuggestQuest => self.handle_suggest_quest(&state).await,
            GameCommand::Talk(npc) => self.handle_talk(&state, &npc).await,
            GameCommand::Imagine(target) => self.handle_imagine(&target).await,
            GameCommand::Quests => Ok(self.handle_quests(&mut state)),
            GameCommand::Unknown(_) => Err(GameError::InvalidCommand(
                "Unknown command. Type \"help\" for a list of commands.".to_string(),
            )),
        };

        let output = match result {
            Ok(mut reply) => {
                if reply.progressed && earns_activity {
                    self.award(&mut state, ACTIVITY_EXP, &mut reply.lines);
                }
                reply.lines
            }
            Err(GameError::Service(reason)) => {
                warn!("generation failed: {}", escape_log(&reason));
                vec![format!(
                    "Sorry, the spirits could not be reached right now: {}",
                    reason
                )]
            }
            Err(e) => vec![e.to_string()],
        };
        Turn { state, output }
    }

    fn award(&self, state: &mut GameState, amount: f64, lines: &mut Vec<String>) {
        match grant_experience(&mut state.player, amount) {
            Ok(report) => lines.extend(level_up_lines(&report)),
            Err(e) => warn!("experience grant of {} rejected: {}", amount, e),
        }
    }

    fn credit_offline(&self, state: &mut GameState, lines: &mut Vec<String>) {
        if state.offline_credited {
            return;
        }
        match apply_offline_experience(
            &mut state.player,
            self.clock.now(),
            self.rules.offline_exp_rate,
        ) {
            Ok(report) => {
                if report.gained > 0.0 {
                    lines.push(format!(
                        "While you were away you gained {:.2} EXP ({:.0}% of your offline potential).",
                        report.gained, report.percentage
                    ));
                }
                lines.extend(level_up_lines(&report.level_up));
            }
            Err(e) => warn!("offline experience not applied: {}", e),
        }
        state.offline_credited = true;
    }

    fn current_location<'a>(&'a self, state: &GameState) -> Result<&'a Location, GameError> {
        self.world
            .location(&state.player.current_location)
            .ok_or_else(|| {
                GameError::DataUnavailable(format!(
                    "location '{}' is missing from the world",
                    state.player.current_location
                ))
            })
    }

    fn describe_location(&self, state: &GameState) -> Result<Vec<String>, GameError> {
        let location = self.current_location(state)?;
        let mut lines = vec![
            format!("You are at: {}", location.name),
            location.description.clone(),
        ];
        if !location.exits.is_empty() {
            let exits: Vec<&str> = location.exits.keys().map(String::as_str).collect();
            lines.push(format!("Exits: {}", exits.join(", ")));
        }
        let items = state.items_at(&location.id);
        if !items.is_empty() {
            lines.push(format!("You see: {}", items.join(", ")));
        }
        if !location.creatures.is_empty() {
            let names: Vec<&str> = location
                .creatures
                .iter()
                .map(|id| {
                    self.world
                        .creature(id)
                        .map(|c| c.name.as_str())
                        .unwrap_or(id.as_str())
                })
                .collect();
            lines.push(format!("Creatures here: {}", names.join(", ")));
        }
        Ok(lines)
    }

    fn handle_start(&self, state: &mut GameState) -> Result<Reply, GameError> {
        if state.player.game_started {
            return Err(Precondition::AlreadyStarted.into());
        }
        state.player.game_started = true;
        Ok(Reply::progress(vec![
            "Your adventure begins! You wake in a small village ringed by dense forest. \
             The air is damp and strange sounds drift in from afar."
                .to_string(),
            "You are a newborn soul. What is your gender? (male/female/unidentified)".to_string(),
        ]))
    }

    fn handle_gender(&self, state: &mut GameState, gender: Gender) -> Result<Reply, GameError> {
        if state.player.gender.choose(gender).is_err() {
            return Err(Precondition::GenderAlreadyChosen.into());
        }
        let mut lines = vec![format!(
            "You chose gender: {}. Your journey is about to begin!",
            gender
        )];
        lines.extend(self.describe_location(state)?);
        self.credit_offline(state, &mut lines);
        Ok(Reply::progress(lines))
    }

    fn handle_go(&self, state: &mut GameState, direction: &str) -> Result<Reply, GameError> {
        let location = self.current_location(state)?;
        let Some(destination) = location.exits.get(direction) else {
            return Err(Precondition::NoExit(direction.to_string()).into());
        };
        if self.world.location(destination).is_none() {
            return Err(Precondition::NoExit(direction.to_string()).into());
        }
        state.player.current_location = destination.clone();
        let mut lines = vec![format!("You walk {}.", direction)];
        lines.extend(self.describe_location(state)?);
        Ok(Reply::progress(lines))
    }

    fn handle_look(&self, state: &GameState) -> Result<Reply, GameError> {
        Ok(Reply::progress(self.describe_location(state)?))
    }

    fn handle_take(&self, state: &mut GameState, item: &str) -> Result<Reply, GameError> {
        if item.is_empty() {
            return Err(Precondition::MissingTarget("take").into());
        }
        if !state.take_item(item) {
            return Err(Precondition::ItemNotHere(item.to_string()).into());
        }
        Ok(Reply::progress(vec![
            format!("You take the {}.", item),
            format!("Your inventory now: {}", state.player.inventory.join(", ")),
        ]))
    }

    fn handle_choose_job(&self, state: &mut GameState, name: &str) -> Result<Reply, GameError> {
        let player = &state.player;
        if player.level < JOB_UNLOCK_LEVEL {
            return Err(Precondition::LevelTooLow {
                required: JOB_UNLOCK_LEVEL,
                current: player.level,
            }
            .into());
        }
        if let Some(job) = player.job.value() {
            return Err(Precondition::JobAlreadyChosen(job).into());
        }
        if name.is_empty() {
            return Ok(Reply::info(vec![format!(
                "Choose your job: {}. (Type \"choose job <name>\")",
                job_list()
            )]));
        }
        let Some(job) = Job::from_label(name) else {
            return Err(Precondition::InvalidJob(name.to_string()).into());
        };
        if let Err(existing) = state.player.job.choose(job) {
            return Err(Precondition::JobAlreadyChosen(existing).into());
        }
        Ok(Reply::progress(vec![format!(
            "You are now a {}! Your path has changed.",
            job
        )]))
    }

    fn handle_examine(&self, state: &mut GameState, target: &str) -> Result<Reply, GameError> {
        if target.is_empty() {
            return Err(Precondition::MissingTarget("examine").into());
        }
        let location = self.current_location(state)?;
        let creature = location
            .creatures
            .iter()
            .filter_map(|id| self.world.creature(id))
            .find(|c| c.name.to_lowercase() == target || c.id == target);
        if let Some(creature) = creature {
            let lines = vec![
                format!("--- {} ---", creature.name),
                format!("Description: {}", creature.description),
                format!("Meaning: {}", creature.symbolic_meaning),
                format!("Abilities: {}", creature.abilities),
            ];
            state.player.record_interaction(&creature.id);
            return Ok(Reply::progress(lines));
        }

        let here = state.items_at(&location.id).iter().any(|i| i == target);
        if here || state.player.has_item(target) {
            return Ok(Reply::progress(vec![
                format!("--- {} ---", capitalize(target)),
                format!("This is a {}. It seems useful.", target),
            ]));
        }
        Err(Precondition::TargetNotFound(target.to_string()).into())
    }

    async fn handle_suggest_quest(&self, state: &GameState) -> Result<Reply, GameError> {
        let location = self.current_location(state)?;
        let prompt = suggest_quest_prompt(
            &location.name,
            state.player.level,
            &state.player.inventory,
        );
        let text = self.generator.generate(&prompt).await?;
        Ok(Reply::progress(vec![
            "A quest idea from the Keeper of Myths:".to_string(),
            text,
        ]))
    }

    async fn handle_talk(&self, state: &GameState, npc: &str) -> Result<Reply, GameError> {
        let location = self.current_location(state)?;
        let npc_name = if npc.is_empty() {
            DEFAULT_NPC.to_string()
        } else {
            capitalize(npc)
        };
        let prompt = talk_prompt(&npc_name, state.player.level, &location.name);
        let text = self.generator.generate(&prompt).await?;
        Ok(Reply::progress(vec![
            format!("You approach the {}.", npc_name),
            format!("{} says: \"{}\"", npc_name, text),
        ]))
    }

    async fn handle_imagine(&self, target: &str) -> Result<Reply, GameError> {
        if target.is_empty() {
            return Err(Precondition::MissingTarget("imagine").into());
        }
        let text = self.generator.generate(&imagine_prompt(target)).await?;
        Ok(Reply::progress(vec![
            format!("You imagine the {}:", target),
            text,
        ]))
    }

    fn handle_quests(&self, state: &mut GameState) -> Reply {
        let mut lines = Vec::new();
        for event in evaluate_quests(self.world.as_ref(), state) {
            match event {
                QuestEvent::Activated { name, .. } => lines.push(format!("New quest: {}", name)),
                QuestEvent::Completed {
                    name,
                    exp,
                    item,
                    level_up,
                    ..
                } => {
                    let reward = match item {
                        Some(item) => format!("{} EXP and a {}", exp, item),
                        None => format!("{} EXP", exp),
                    };
                    lines.push(format!("Quest complete: {}! You receive {}.", name, reward));
                    lines.extend(level_up_lines(&level_up));
                }
            }
        }

        let mut log = Vec::new();
        for id in self.world.quest_ids() {
            let Some(quest) = self.world.quest(id) else {
                continue;
            };
            match state.quest_status(id) {
                QuestStatus::Active => {
                    log.push(format!("- {} [active]: {}", quest.name, quest.description))
                }
                QuestStatus::Complete => log.push(format!("- {} [complete]", quest.name)),
                QuestStatus::Inactive => {}
            }
        }
        if log.is_empty() {
            lines.push("You have no quests yet.".to_string());
        } else {
            lines.push("Quests:".to_string());
            lines.extend(log);
        }
        Reply::info(lines)
    }
}

fn level_up_lines(report: &LevelUpReport) -> Vec<String> {
    let mut lines = Vec::new();
    if report.levels_gained() > 0 {
        lines.push(format!(
            "Congratulations! You reached Level {}!",
            report.new_level
        ));
    }
    if report.job_unlocked {
        lines.push(format!(
            "Job selection unlocked! Type \"choose job <name>\" to pick one of: {}.",
            job_list()
        ));
    }
    lines
}

fn job_list() -> String {
    Job::ALL
        .iter()
        .map(Job::label)
        .collect::<Vec<_>>()
        .join(", ")
}

fn inventory_line(state: &GameState) -> String {
    if state.player.inventory.is_empty() {
        "Your inventory is empty.".to_string()
    } else {
        format!("Your inventory: {}", state.player.inventory.join(", "))
    }
}

fn stats_line(state: &GameState) -> String {
    let player = &state.player;
    format!(
        "Level: {}, EXP: {}, Gender: {}, Job: {}",
        player.level,
        player.experience.round(),
        player.gender,
        player.job
    )
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn help_lines() -> Vec<String> {
    [
        "Available commands:",
        "- start: begin the game",
        "- male/female/unidentified: choose your gender at the start",
        "- go <direction>: move (north, south, east, west); n/s/e/w also work",
        "- look: look around",
        "- take <item>: pick up an item",
        "- inventory: list what you carry",
        "- stats: show your character",
        "- choose job <name>: pick a job once you reach Level 5",
        "- examine <creature/item>: study a creature or item",
        "- quests: check and turn in your quests",
        "- suggest quest: ask for a new quest idea",
        "- talk [npc]: talk to a villager",
        "- imagine <target>: conjure a description of anything",
    ]
    .iter()
    .map(|line| line.to_string())
    .collect()
}
