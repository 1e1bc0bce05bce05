//! Application configuration.
//!
//! One YAML document with `engine`, `navigation`, `embedder` and `selectors`
//! sections. Every field has a default, so a partial file is valid.

use std::time::Duration;

use focus_engine::{EngineConfig, NavigationConfig, RestoreStrategy, UnavailablePolicy};
use focusfeed_core_types::SelectorTable;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use topic_embedder::HashingEmbedder;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub threshold: f32,
    pub unavailable_policy: UnavailablePolicy,
    pub placeholder_min_width: f64,
    pub placeholder_min_height: f64,
    pub restore: RestoreStrategy,
}

impl Default for EngineSection {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            threshold: engine.threshold,
            unavailable_policy: engine.unavailable_policy,
            placeholder_min_width: engine.placeholder_min_width,
            placeholder_min_height: engine.placeholder_min_height,
            restore: engine.restore,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    /// Number of hash buckets in the bundled model.
    pub dimension: usize,
    /// Simulated model load time.
    pub warmup_ms: u64,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            dimension: 256,
            warmup_ms: 750,
        }
    }
}

impl EmbedderConfig {
    pub fn build(&self) -> HashingEmbedder {
        HashingEmbedder::new(self.dimension, Duration::from_millis(self.warmup_ms))
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineSection,
    pub navigation: NavigationConfig,
    pub embedder: EmbedderConfig,
    pub selectors: SelectorTable,
}

impl Config {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            threshold: self.engine.threshold,
            unavailable_policy: self.engine.unavailable_policy,
            placeholder_min_width: self.engine.placeholder_min_width,
            placeholder_min_height: self.engine.placeholder_min_height,
            restore: self.engine.restore,
            navigation: self.navigation.clone(),
            selectors: self.selectors.clone(),
        }
    }

    pub fn problems(&self) -> Vec<String> {
        let mut problems = self.engine_config().validate();
        if self.embedder.dimension < HashingEmbedder::MIN_DIM {
            problems.push(format!(
                "embedder.dimension must be at least {}",
                HashingEmbedder::MIN_DIM
            ));
        }
        problems
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let problems = self.problems();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}
