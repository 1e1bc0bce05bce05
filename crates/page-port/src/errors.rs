use focusfeed_core_types::NodeId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PortError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),
    #[error("node has no parent: {0}")]
    Detached(NodeId),
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("cannot build `<{tag}>`: {reason}")]
    InvalidElement { tag: String, reason: String },
    #[error("internal error: {0}")]
    Internal(String),
}

impl PortError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn invalid_element(tag: &str, reason: impl Into<String>) -> Self {
        Self::InvalidElement {
            tag: tag.to_string(),
            reason: reason.into(),
        }
    }

    pub fn invalid_selector(selector: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PortError>;
