use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

use crate::errors::{EmbedError, Result};
use crate::similarity::l2_normalize;
use crate::TopicEmbedder;

struct HandleInner {
    model: Arc<dyn TopicEmbedder>,
    warm: OnceCell<()>,
    init_attempts: AtomicU64,
    /// Held across each model call; the model is not assumed to be reentrant.
    calls: Mutex<()>,
}

/// Process-wide handle to the scoring model.
///
/// Cloning is cheap and every clone shares the same warm state. A successful warm-up is
/// remembered for the life of the handle; a failed one is not, so the next caller tries
/// again.
#[derive(Clone)]
pub struct EmbedderHandle {
    inner: Arc<HandleInner>,
}

impl EmbedderHandle {
    pub fn new(model: Arc<dyn TopicEmbedder>) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                model,
                warm: OnceCell::new(),
                init_attempts: AtomicU64::new(0),
                calls: Mutex::new(()),
            }),
        }
    }

    pub fn is_warm(&self) -> bool {
        self.inner.warm.initialized()
    }

    /// Number of times the underlying model's `initialize` has been invoked.
    pub fn init_attempts(&self) -> u64 {
        self.inner.init_attempts.load(Ordering::Relaxed)
    }

    pub fn dimension(&self) -> usize {
        self.inner.model.dimension()
    }

    /// Initialise the model unless it is already warm.
    pub async fn warm_up(&self) -> Result<()> {
        if self.is_warm() {
            debug!(target: "topic.embedder", "model already warm; skipping initialisation");
            return Ok(());
        }
        let inner = Arc::clone(&self.inner);
        self.inner
            .warm
            .get_or_try_init(|| async move {
                let attempt = inner.init_attempts.fetch_add(1, Ordering::Relaxed) + 1;
                match inner.model.initialize().await {
                    Ok(()) => {
                        info!(target: "topic.embedder", attempt, "model warm");
                        Ok(())
                    }
                    Err(err) => {
                        warn!(target: "topic.embedder", attempt, %err, "model initialisation failed");
                        Err(err)
                    }
                }
            })
            .await
            .map(|_| ())
    }

    /// Embed text into an L2-normalised vector. The model must be warm.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if !self.is_warm() {
            return Err(EmbedError::NotInitialized);
        }
        let raw = {
            let _call = self.inner.calls.lock().await;
            self.inner.model.embed(text).await?
        };
        if raw.is_empty() {
            return Err(EmbedError::InvalidVector("empty vector".into()));
        }
        if raw.iter().any(|v| !v.is_finite()) {
            return Err(EmbedError::InvalidVector("non-finite component".into()));
        }
        Ok(l2_normalize(raw))
    }
}

impl std::fmt::Debug for EmbedderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbedderHandle")
            .field("warm", &self.is_warm())
            .field("dimension", &self.dimension())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicBool;

    struct FlakyModel {
        fail_next: AtomicBool,
    }

    #[async_trait]
    impl TopicEmbedder for FlakyModel {
        async fn initialize(&self) -> Result<()> {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                Err(EmbedError::InitFailed("weights missing".into()))
            } else {
                Ok(())
            }
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![3.0, 4.0])
        }

        fn dimension(&self) -> usize {
            2
        }
    }

    fn flaky(fail_first: bool) -> EmbedderHandle {
        EmbedderHandle::new(Arc::new(FlakyModel {
            fail_next: AtomicBool::new(fail_first),
        }))
    }

    #[tokio::test]
    async fn warm_up_runs_once() {
        let handle = flaky(false);
        handle.warm_up().await.unwrap();
        handle.clone().warm_up().await.unwrap();
        assert_eq!(handle.init_attempts(), 1);
        assert!(handle.is_warm());
    }

    #[tokio::test]
    async fn failed_warm_up_is_retried() {
        let handle = flaky(true);
        assert!(matches!(handle.warm_up().await, Err(EmbedError::InitFailed(_))));
        assert!(!handle.is_warm());
        handle.warm_up().await.unwrap();
        assert_eq!(handle.init_attempts(), 2);
    }

    #[tokio::test]
    async fn embed_requires_warm_model_and_normalises() {
        let handle = flaky(false);
        assert_eq!(handle.embed("x").await, Err(EmbedError::NotInitialized));
        handle.warm_up().await.unwrap();
        let v = handle.embed("x").await.unwrap();
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }
}
