//! Topic embedding resource.
//!
//! The scoring model is slow to initialise and fast afterwards. It is wrapped in an
//! [`EmbedderHandle`] that is built once per process and passed by reference to every
//! focus session, so a warm model survives deactivate/activate cycles.
pub mod errors;
pub mod handle;
pub mod hashing;
pub mod similarity;

use async_trait::async_trait;

pub use errors::{EmbedError, Result};
pub use handle::EmbedderHandle;
pub use hashing::HashingEmbedder;
pub use similarity::{cosine_similarity, l2_normalize};

/// A text → vector scoring model.
///
/// Implementations are not required to support concurrent calls; callers serialise
/// access.
#[async_trait]
pub trait TopicEmbedder: Send + Sync {
    /// Load whatever the model needs. Called at most once successfully.
    async fn initialize(&self) -> Result<()>;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn dimension(&self) -> usize;
}
