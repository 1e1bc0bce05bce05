use std::hash::BuildHasher;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use ahash::RandomState;
use async_trait::async_trait;
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use crate::errors::{EmbedError, Result};
use crate::similarity::l2_normalize;
use crate::TopicEmbedder;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.35;

/// Local feature-hashing model: word unigrams plus character trigrams projected into a
/// fixed number of signed buckets.
///
/// Hashing uses fixed seeds so that identical text always yields an identical vector
/// within a process. The warm-up delay stands in for loading model weights.
pub struct HashingEmbedder {
    dim: usize,
    warmup: Duration,
    hasher: RandomState,
    ready: AtomicBool,
}

impl HashingEmbedder {
    /// Smallest bucket count; smaller requests are raised to it.
    pub const MIN_DIM: usize = 16;

    pub fn new(dim: usize, warmup: Duration) -> Self {
        Self {
            dim: dim.max(Self::MIN_DIM),
            warmup,
            hasher: RandomState::with_seeds(
                0x6a09_e667_f3bc_c908,
                0xbb67_ae85_84ca_a73b,
                0x3c6e_f372_fe94_f82b,
                0xa54f_f53a_5f1d_36f1,
            ),
            ready: AtomicBool::new(false),
        }
    }

    fn bump(&self, vec: &mut [f32], feature: &str, weight: f32) {
        let hash = BuildHasher::hash_one(&self.hasher, feature);
        let bucket = (hash % self.dim as u64) as usize;
        let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
        vec[bucket] += sign * weight;
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let mut vec = vec![0.0; self.dim];
        for word in text.unicode_words() {
            let word = word.to_lowercase();
            self.bump(&mut vec, &word, WORD_WEIGHT);

            let padded: Vec<char> = std::iter::once('#')
                .chain(word.chars())
                .chain(std::iter::once('#'))
                .collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.bump(&mut vec, &trigram, TRIGRAM_WEIGHT);
            }
        }
        l2_normalize(vec)
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(256, Duration::from_millis(750))
    }
}

#[async_trait]
impl TopicEmbedder for HashingEmbedder {
    async fn initialize(&self) -> Result<()> {
        if self.ready.load(Ordering::Acquire) {
            return Ok(());
        }
        debug!(target: "topic.embedder", dim = self.dim, warmup_ms = self.warmup.as_millis() as u64, "loading hashing model");
        tokio::time::sleep(self.warmup).await;
        self.ready.store(true, Ordering::Release);
        Ok(())
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if !self.ready.load(Ordering::Acquire) {
            return Err(EmbedError::NotInitialized);
        }
        Ok(self.encode(text))
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::similarity::cosine_similarity;

    async fn ready_model() -> HashingEmbedder {
        let model = HashingEmbedder::new(256, Duration::ZERO);
        model.initialize().await.unwrap();
        model
    }

    #[tokio::test]
    async fn embed_before_initialize_fails() {
        let model = HashingEmbedder::new(64, Duration::ZERO);
        assert_eq!(model.embed("x").await, Err(EmbedError::NotInitialized));
    }

    #[tokio::test]
    async fn identical_text_is_deterministic() {
        let model = ready_model().await;
        let a = model.embed("Intro to SOHCAHTOA").await.unwrap();
        let b = model.embed("intro to sohcahtoa").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 256);
    }

    #[tokio::test]
    async fn shared_words_score_higher_than_unrelated() {
        let model = ready_model().await;
        let topic = model.embed("trigonometry").await.unwrap();
        let close = model.embed("trigonometry full tutorial").await.unwrap();
        let far = model.embed("epic fail compilation").await.unwrap();
        assert!(cosine_similarity(&topic, &close) > cosine_similarity(&topic, &far));
    }

    #[tokio::test]
    async fn empty_text_is_zero_vector() {
        let model = ready_model().await;
        let v = model.embed("").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn dimension_has_floor() {
        assert_eq!(HashingEmbedder::new(2, Duration::ZERO).dimension(), HashingEmbedder::MIN_DIM);
    }
}
