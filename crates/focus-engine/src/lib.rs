//! Live relevance filtering for a re-rendering content feed.
//!
//! A [`LifecycleController`] owns the single focus session. While active, a
//! [`MutationListener`] and a [`NavigationWatcher`] discover content items and funnel
//! them through one [`Pipeline`]: the [`RelevanceClassifier`] scores each item against
//! the topic vector and the [`PageMutator`] keeps it or swaps it for a placeholder of
//! the same size. All page access goes through [`page_port::DocumentPort`].
pub mod classifier;
pub mod config;
pub mod controller;
pub mod errors;
pub mod events;
pub mod listener;
pub mod metrics;
pub mod mutator;
pub mod navigation;
pub mod pipeline;
pub mod session;
pub mod styles;
pub mod topic;

pub use classifier::{disposition, judge, ContentItem, Disposition, RelevanceClassifier};
pub use config::{EngineConfig, NavigationConfig, RestoreStrategy, UnavailablePolicy};
pub use controller::{LifecycleController, ToggleOutcome};
pub use errors::{EngineError, Result};
pub use listener::MutationListener;
pub use metrics::{EngineMetrics, MetricSnapshot};
pub use mutator::{Applied, PageMutator, PLACEHOLDER_SELECTOR, PROCESSED_SELECTOR};
pub use navigation::NavigationWatcher;
pub use pipeline::{Outcome, PendingGuard, PendingSet, Pipeline, ScanReport};
pub use session::{FocusSession, SessionState, TopicPhase};
pub use styles::{StyleInjector, STYLE_MARKER};
pub use topic::{derive_topic, normalize_topic, FocusCommand};
