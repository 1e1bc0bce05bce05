use std::time::Duration;

use focusfeed_core_types::{BoxSize, SelectorTable};
use serde::{Deserialize, Serialize};

/// What to do with an item whose relevance could not be judged because the scoring
/// model is unavailable.
///
/// This is the one place that decides the fate of unscorable items. `Hide` treats
/// them as filtered (fail-safe hide); `Keep` leaves them on the page untouched. Items
/// with no extractable text are never affected by this switch.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailablePolicy {
    #[default]
    Hide,
    Keep,
}

/// How the page is put back on deactivation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreStrategy {
    /// Remove placeholders and styles, then ask the host for a full reload.
    #[default]
    Reload,
    /// Remove placeholders, markers and styles without reloading. Filtered items are
    /// not brought back.
    InPlace,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    pub poll_interval_ms: u64,
    pub content_wait_ms: u64,
    pub content_poll_ms: u64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            content_wait_ms: 5_000,
            content_poll_ms: 100,
        }
    }
}

impl NavigationConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn content_wait(&self) -> Duration {
        Duration::from_millis(self.content_wait_ms)
    }

    pub fn content_poll(&self) -> Duration {
        Duration::from_millis(self.content_poll_ms.max(1))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum cosine similarity for an item to count as relevant.
    pub threshold: f32,
    pub unavailable_policy: UnavailablePolicy,
    pub placeholder_min_width: f64,
    pub placeholder_min_height: f64,
    pub restore: RestoreStrategy,
    pub navigation: NavigationConfig,
    pub selectors: SelectorTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            unavailable_policy: UnavailablePolicy::default(),
            placeholder_min_width: 120.0,
            placeholder_min_height: 90.0,
            restore: RestoreStrategy::default(),
            navigation: NavigationConfig::default(),
            selectors: SelectorTable::default(),
        }
    }
}

impl EngineConfig {
    pub fn placeholder_floor(&self) -> BoxSize {
        BoxSize::new(self.placeholder_min_width, self.placeholder_min_height)
    }

    /// Problems that would make the pipeline misbehave, as human-readable strings.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !(-1.0..=1.0).contains(&self.threshold) {
            problems.push(format!("threshold {} is outside [-1, 1]", self.threshold));
        }
        if self.placeholder_min_width < 0.0 || self.placeholder_min_height < 0.0 {
            problems.push("placeholder minimums must not be negative".to_string());
        }
        if self.navigation.content_poll_ms > self.navigation.content_wait_ms {
            problems.push("navigation.content_poll_ms exceeds content_wait_ms".to_string());
        }
        for role in self.selectors.missing_roles() {
            problems.push(format!("no selector configured for role {}", role.as_str()));
        }
        problems
    }
}
