use page_port::PortError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("focus topic is empty")]
    EmptyTopic,

    #[error("no page container matched `{0}`")]
    ContainerMissing(String),

    #[error("content did not appear within {waited_ms}ms")]
    NavigationTimeout { waited_ms: u64 },

    #[error("document port error: {0}")]
    Port(#[from] PortError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
