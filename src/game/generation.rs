//! Text generation collaborator.
//!
//! The interpreter only knows [`TextGenerator`]: hand it a prompt, get text
//! back or a [`GameError::Service`]. The HTTP implementation talks to a
//! `generateContent`-style model endpoint; tests substitute a scripted fake.

use std::future::Future;

use log::{debug, warn};

use crate::config::GenerationConfig;
use crate::game::errors::GameError;

pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, GameError>> + Send;
}

/// Always fails; used when generation is switched off in the config.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGenerator;

impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GameError> {
        Err(GameError::Service("text generation is disabled".to_string()))
    }
}

#[cfg(feature = "generation")]
pub use http::HttpGenerator;

#[cfg(feature = "generation")]
mod http {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;
    use tokio::time::timeout;

    #[derive(Debug, Serialize)]
    struct GenerateRequest<'a> {
        contents: Vec<Content<'a>>,
    }

    #[derive(Debug, Serialize)]
    struct Content<'a> {
        role: &'static str,
        parts: Vec<Part<'a>>,
    }

    #[derive(Debug, Serialize)]
    struct Part<'a> {
        text: &'a str,
    }

    #[derive(Debug, Deserialize)]
    struct GenerateResponse {
        #[serde(default)]
        candidates: Vec<Candidate>,
    }

    #[derive(Debug, Deserialize)]
    struct Candidate {
        content: Option<CandidateContent>,
    }

    #[derive(Debug, Deserialize)]
    struct CandidateContent {
        #[serde(default)]
        parts: Vec<CandidatePart>,
    }

    #[derive(Debug, Deserialize)]
    struct CandidatePart {
        text: Option<String>,
    }

    /// Calls a hosted model over HTTP.
    pub struct HttpGenerator {
        config: GenerationConfig,
        client: reqwest::Client,
    }

    impl HttpGenerator {
        pub fn new(config: GenerationConfig) -> Self {
            Self {
                config,
                client: reqwest::Client::new(),
            }
        }

        pub fn build_url(&self) -> String {
            format!(
                "{}/models/{}:generateContent?key={}",
                self.config.endpoint.trim_end_matches('/'),
                self.config.model,
                urlencoding::encode(&self.config.api_key)
            )
        }

        async fn call(&self, prompt: &str) -> Result<String, GameError> {
            let body = GenerateRequest {
                contents: vec![Content {
                    role: "user",
                    parts: vec![Part { text: prompt }],
                }],
            };
            let response = self
                .client
                .post(self.build_url())
                .json(&body)
                .send()
                .await
                .map_err(|e| GameError::Service(format!("HTTP request failed: {}", e)))?;

            if !response.status().is_success() {
                return Err(GameError::Service(format!(
                    "model endpoint returned status: {}",
                    response.status()
                )));
            }

            let parsed: GenerateResponse = response
                .json()
                .await
                .map_err(|e| GameError::Service(format!("failed to parse model response: {}", e)))?;

            parsed
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.content)
                .and_then(|c| c.parts.into_iter().next())
                .and_then(|p| p.text)
                .ok_or_else(|| GameError::Service("model response had an unexpected structure".into()))
        }
    }

    impl TextGenerator for HttpGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GameError> {
            debug!("Requesting generation from model {}", self.config.model);
            let limit = Duration::from_secs(self.config.timeout_seconds);
            match timeout(limit, self.call(prompt)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Generation timed out after {}s", self.config.timeout_seconds);
                    Err(GameError::Service(format!(
                        "request timeout after {}s",
                        self.config.timeout_seconds
                    )))
                }
            }
        }
    }
}

/// Generator selected from configuration at startup.
pub enum ConfiguredGenerator {
    #[cfg(feature = "generation")]
    Http(HttpGenerator),
    Disabled(DisabledGenerator),
}

impl ConfiguredGenerator {
    #[cfg(feature = "generation")]
    pub fn from_config(config: &GenerationConfig) -> Self {
        if !config.enabled {
            return ConfiguredGenerator::Disabled(DisabledGenerator);
        }
        if config.api_key.is_empty() {
            warn!("Generation enabled but no API key configured");
        }
        ConfiguredGenerator::Http(HttpGenerator::new(config.clone()))
    }

    #[cfg(not(feature = "generation"))]
    pub fn from_config(config: &GenerationConfig) -> Self {
        if config.enabled {
            warn!("Generation enabled in config but this build lacks the `generation` feature");
        }
        ConfiguredGenerator::Disabled(DisabledGenerator)
    }
}

impl TextGenerator for ConfiguredGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GameError> {
        match self {
            #[cfg(feature = "generation")]
            ConfiguredGenerator::Http(g) => g.generate(prompt).await,
            ConfiguredGenerator::Disabled(g) => g.generate(prompt).await,
        }
    }
}

pub fn suggest_quest_prompt(location_name: &str, level: u32, inventory: &[String]) -> String {
    let items = if inventory.is_empty() {
        "nothing".to_string()
    } else {
        inventory.join(", ")
    };
    format!(
        "As the Game Master of a text RPG inspired by the Shan Hai Jing, suggest a short quest idea \
         for the player. The player is currently in {}, is level {}, and carries: {}. \
         Focus on creatures or concepts from the Shan Hai Jing.",
        location_name, level, items
    )
}

pub fn talk_prompt(npc_name: &str, level: u32, location_name: &str) -> String {
    format!(
        "As {} in an ancient village inspired by the Shan Hai Jing, greet a level {} adventurer \
         who is in {}. Give a short greeting and perhaps a vague hint about the world or a quest.",
        npc_name, level, location_name
    )
}

pub fn imagine_prompt(target: &str) -> String {
    format!(
        "Imagine and describe in detail a {} in the narrative style of the Classic of Mountains \
         and Seas (Shan Hai Jing). Include details about its appearance, its aura, or its \
         potential mythological powers.",
        target
    )
}
