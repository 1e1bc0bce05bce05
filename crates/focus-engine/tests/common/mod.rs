//! Shared fixtures for the focus-engine scenario tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use focus_engine::{EngineConfig, LifecycleController};
use focusfeed_core_types::NodeId;
use page_port::{DocumentPort, ElementSpec, InMemoryDocument};
use topic_embedder::{EmbedError, EmbedderHandle, TopicEmbedder};

pub const TOPIC: &str = "trigonometry";
pub const HOME: &str = "https://www.youtube.com/";
pub const SETTLE: Duration = Duration::from_secs(60);

/// Similarity the scripted model gives on-topic items.
pub const ON_TOPIC: f32 = 0.82;
/// Similarity the scripted model gives everything else.
pub const OFF_TOPIC: f32 = 0.12;

/// Two-dimensional model with fixed answers: the topic maps to the x axis, text
/// mentioning "sine" sits at 0.82 from it, anything else at 0.12.
pub struct ScriptedEmbedder {
    pub fail_init: AtomicBool,
    pub init_delay: Duration,
    pub embed_delay: Duration,
    pub embeds: AtomicUsize,
}

impl ScriptedEmbedder {
    pub fn new() -> Arc<Self> {
        Self::with_delays(Duration::from_millis(200), Duration::from_millis(5))
    }

    pub fn with_delays(init_delay: Duration, embed_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            fail_init: AtomicBool::new(false),
            init_delay,
            embed_delay,
            embeds: AtomicUsize::new(0),
        })
    }

    pub fn failing() -> Arc<Self> {
        let model = Self::new();
        model.fail_init.store(true, Ordering::SeqCst);
        model
    }

    pub fn embed_count(&self) -> usize {
        self.embeds.load(Ordering::SeqCst)
    }

    fn at(cosine: f32) -> Vec<f32> {
        vec![cosine, (1.0 - cosine * cosine).sqrt()]
    }
}

#[async_trait]
impl TopicEmbedder for ScriptedEmbedder {
    async fn initialize(&self) -> topic_embedder::Result<()> {
        tokio::time::sleep(self.init_delay).await;
        if self.fail_init.load(Ordering::SeqCst) {
            return Err(EmbedError::InitFailed("weights missing".into()));
        }
        Ok(())
    }

    async fn embed(&self, text: &str) -> topic_embedder::Result<Vec<f32>> {
        self.embeds.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.embed_delay).await;
        Ok(if text == TOPIC {
            vec![1.0, 0.0]
        } else if text.contains("sine") {
            Self::at(ON_TOPIC)
        } else {
            Self::at(OFF_TOPIC)
        })
    }

    fn dimension(&self) -> usize {
        2
    }
}

pub fn video(title: &str) -> ElementSpec {
    ElementSpec::new("ytd-video-renderer")
        .with_size(300.0, 170.0)
        .with_child(ElementSpec::new("a").with_id("video-title").with_text(title))
        .with_child(
            ElementSpec::new("div")
                .with_id("channel-name")
                .with_text("Some Channel"),
        )
}

pub fn blank_video() -> ElementSpec {
    ElementSpec::new("ytd-video-renderer").with_size(300.0, 170.0)
}

pub fn shelf() -> ElementSpec {
    ElementSpec::new("ytd-reel-shelf-renderer").with_child(video("shorts about sine"))
}

pub fn app(items: Vec<ElementSpec>) -> ElementSpec {
    let contents = items
        .into_iter()
        .fold(ElementSpec::new("div").with_id("contents"), ElementSpec::with_child);
    ElementSpec::new("ytd-app").with_child(contents)
}

/// A home page holding the given items; returns the document and the feed node.
pub fn home_page(items: Vec<ElementSpec>) -> (Arc<InMemoryDocument>, NodeId) {
    let doc = Arc::new(InMemoryDocument::new(HOME));
    doc.append_child(doc.body(), app(items)).unwrap();
    let feed = contents(&doc);
    (doc, feed)
}

pub fn contents(doc: &InMemoryDocument) -> NodeId {
    doc.query_all("ytd-app #contents").unwrap()[0]
}

pub fn controller(
    doc: &Arc<InMemoryDocument>,
    model: &Arc<ScriptedEmbedder>,
    config: EngineConfig,
) -> LifecycleController {
    let document: Arc<dyn DocumentPort> = doc.clone();
    let embedder = EmbedderHandle::new(model.clone());
    LifecycleController::new(document, embedder, config)
}

pub fn placeholders(doc: &InMemoryDocument) -> Vec<NodeId> {
    doc.query_all(focus_engine::PLACEHOLDER_SELECTOR).unwrap()
}

pub fn marked(doc: &InMemoryDocument) -> Vec<NodeId> {
    doc.query_all(focus_engine::PROCESSED_SELECTOR).unwrap()
}

pub fn videos(doc: &InMemoryDocument) -> Vec<NodeId> {
    doc.query_all("ytd-video-renderer").unwrap()
}
