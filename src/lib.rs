//! # Realm - a Shan Hai Jing text adventure
//!
//! Realm is a small text adventure set in the world of the Classic of
//! Mountains and Seas. Players wander between locations, pick up items,
//! examine mythical creatures, level up and eventually choose a job. A
//! companion HTTP service stores game snapshots per user and computes the
//! experience earned while offline.
//!
//! ## Features
//!
//! - **Explicit state**: [`game::Interpreter::interpret`] takes a
//!   [`game::GameState`] and returns the next one, so every transition is testable.
//! - **Progression**: cumulative experience against a rising
//!   `25 * L * (L + 1)` threshold, with offline accrual on resume.
//! - **Quests**: turned in from the quest log once their requirements hold.
//! - **Generated flavour text**: `talk`, `imagine` and `suggest quest` call a
//!   hosted model through [`game::generation::TextGenerator`].
//! - **Persistence**: sled-backed save store shared by the CLI and the HTTP service.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use realm::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     realm::server::serve(&config).await
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - world data, player state, interpreter, sessions and the save store
//! - [`server`] - axum router for save/load and offline experience
//! - [`config`] - TOML configuration
//! - [`logutil`] - helpers for single-line log output

pub mod config;
pub mod game;
pub mod logutil;
pub mod server;
