use std::fmt;

use uuid::Uuid;

mod selectors;

pub use selectors::{PathExclusion, Role, SelectorTable};

/// Identity of one focus session. Logged with every pipeline event.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable identity of a live document node.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Handle for one subtree observer registered on a document.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ObserverId(pub u64);

/// Measured layout box of a node, in CSS pixels.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoxSize {
    pub width: f64,
    pub height: f64,
}

impl BoxSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Clamp each dimension to at least the given floor.
    pub fn floored(self, floor: BoxSize) -> Self {
        Self {
            width: self.width.max(floor.width),
            height: self.height.max(floor.height),
        }
    }
}

/// Why a classification could not produce a relevance judgement.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum UnavailableReason {
    /// No title, channel or description text was found on the node.
    EmptyContent,
    /// The scoring model failed, is missing, or the session has no topic vector.
    ModelUnavailable,
}

/// Outcome of classifying one content item.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Verdict {
    Relevant { similarity: f32 },
    Filtered { similarity: Option<f32> },
    Unavailable(UnavailableReason),
}

impl Verdict {
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Relevant { .. } => "relevant",
            Verdict::Filtered { .. } => "filtered",
            Verdict::Unavailable(UnavailableReason::EmptyContent) => "unavailable:empty",
            Verdict::Unavailable(UnavailableReason::ModelUnavailable) => "unavailable:model",
        }
    }
}

/// Processing status of a content item as seen by the pipeline.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ItemStatus {
    Unprocessed,
    InFlight,
    Relevant,
    Filtered,
}
