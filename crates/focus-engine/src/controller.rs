use std::sync::Arc;
use std::time::Duration;

use page_port::DocumentPort;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use topic_embedder::EmbedderHandle;
use tracing::{debug, info, warn};

use crate::classifier::RelevanceClassifier;
use crate::config::{EngineConfig, RestoreStrategy};
use crate::errors::{EngineError, Result};
use crate::listener::MutationListener;
use crate::metrics::{EngineMetrics, MetricSnapshot};
use crate::mutator::PageMutator;
use crate::navigation::NavigationWatcher;
use crate::pipeline::Pipeline;
use crate::session::{FocusSession, SessionState};
use crate::styles::StyleInjector;
use crate::topic::{derive_topic, normalize_topic, FocusCommand};

const SETTLE_POLL: Duration = Duration::from_millis(10);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    Activated(String),
    Deactivated,
    /// Focus mode was off and the page offered no topic.
    NoTopic,
}

/// Owns the focus session and wires the pipeline components together.
pub struct LifecycleController {
    document: Arc<dyn DocumentPort>,
    embedder: EmbedderHandle,
    config: EngineConfig,
    session: Arc<SessionState>,
    metrics: Arc<EngineMetrics>,
    pipeline: Arc<Pipeline>,
    listener: Arc<MutationListener>,
    navigation: Arc<NavigationWatcher>,
    styles: StyleInjector,
    warmup: Mutex<Option<JoinHandle<()>>>,
}

impl LifecycleController {
    pub fn new(
        document: Arc<dyn DocumentPort>,
        embedder: EmbedderHandle,
        config: EngineConfig,
    ) -> Self {
        let session = Arc::new(SessionState::new());
        let metrics = Arc::new(EngineMetrics::default());
        let selectors = &config.selectors;
        let classifier = RelevanceClassifier::new(
            Arc::clone(&document),
            embedder.clone(),
            Arc::clone(&session),
            Arc::clone(&metrics),
            selectors,
            config.threshold,
        );
        let mutator = PageMutator::new(
            Arc::clone(&document),
            selectors,
            config.unavailable_policy,
            config.placeholder_floor(),
        );
        let pipeline = Arc::new(Pipeline::new(
            Arc::clone(&document),
            Arc::clone(&session),
            classifier,
            mutator,
            Arc::clone(&metrics),
            selectors,
        ));
        let listener = Arc::new(MutationListener::new(Arc::clone(&pipeline), selectors));
        let navigation = Arc::new(NavigationWatcher::new(
            Arc::clone(&pipeline),
            Arc::clone(&listener),
            Arc::clone(&session),
            Arc::clone(&metrics),
            config.navigation.clone(),
            selectors,
        ));
        let styles = StyleInjector::new(Arc::clone(&document), selectors);
        Self {
            document,
            embedder,
            config,
            session,
            metrics,
            pipeline,
            listener,
            navigation,
            styles,
            warmup: Mutex::new(None),
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    pub fn session(&self) -> Option<FocusSession> {
        self.session.snapshot()
    }

    pub fn metrics(&self) -> MetricSnapshot {
        self.metrics.snapshot()
    }

    pub fn pending_len(&self) -> usize {
        self.pipeline.pending().len()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn listener_connected(&self) -> bool {
        self.listener.is_connected()
    }

    pub fn navigation_running(&self) -> bool {
        self.navigation.is_running()
    }

    pub fn embedder(&self) -> &EmbedderHandle {
        &self.embedder
    }

    /// Start filtering for `topic`. Returns once the listener is attached; the model
    /// warms up in the background and a full scan follows.
    pub async fn activate(&self, topic: &str) -> Result<()> {
        let topic = normalize_topic(topic).ok_or(EngineError::EmptyTopic)?;
        if let Some(previous) = self.session.end() {
            info!(
                target: "focus.controller",
                previous = %previous.topic,
                "replacing active focus session"
            );
            self.teardown();
        }

        let session = self.session.begin(topic.clone());
        info!(
            target: "focus.controller",
            session = %session.id,
            generation = session.generation,
            topic = %topic,
            "focus mode activated"
        );
        if let Err(err) = self.styles.inject() {
            warn!(target: "focus.controller", %err, "stylesheet not injected");
        }
        if let Err(err) = self.pipeline.mutator().sync_topic_header(&topic) {
            warn!(target: "focus.controller", %err, "topic header not shown");
        }
        self.navigation.start();
        if let Err(err) = self.listener.connect() {
            warn!(target: "focus.controller", %err, "mutation listener not attached");
        }

        let task = tokio::spawn(warm_up(
            self.embedder.clone(),
            Arc::clone(&self.session),
            Arc::clone(&self.pipeline),
            session.generation,
            topic,
        ));
        *self.warmup.lock() = Some(task);
        Ok(())
    }

    /// Stop filtering and put the page back. Returns false when nothing was active.
    pub fn deactivate(&self) -> bool {
        let Some(ended) = self.session.end() else {
            return false;
        };
        self.teardown();
        if self.config.restore == RestoreStrategy::Reload {
            if let Err(err) = self.document.reload() {
                warn!(target: "focus.controller", %err, "page reload request failed");
            }
        }
        info!(
            target: "focus.controller",
            session = %ended.id,
            topic = %ended.topic,
            "focus mode deactivated"
        );
        true
    }

    /// Detach everything and strip pipeline output. The session must already be ended.
    fn teardown(&self) {
        self.listener.disconnect();
        self.navigation.stop();
        match self.styles.remove() {
            Ok(removed) => debug!(target: "focus.controller", removed, "styles removed"),
            Err(err) => warn!(target: "focus.controller", %err, "stylesheet removal failed"),
        }
        let restored = self.pipeline.mutator().restore();
        debug!(target: "focus.controller", restored, "pipeline output removed");
    }

    /// Flip focus mode, deriving the topic from the page when turning it on.
    pub async fn toggle(&self) -> Result<ToggleOutcome> {
        if self.is_active() {
            self.deactivate();
            return Ok(ToggleOutcome::Deactivated);
        }
        match derive_topic(self.document.as_ref(), &self.config.selectors) {
            Some(topic) => {
                self.activate(&topic).await?;
                Ok(ToggleOutcome::Activated(topic))
            }
            None => {
                info!(
                    target: "focus.controller",
                    location = %self.document.location(),
                    "no topic on this page; toggle ignored"
                );
                Ok(ToggleOutcome::NoTopic)
            }
        }
    }

    pub async fn handle(&self, command: FocusCommand) -> Result<ToggleOutcome> {
        match command {
            FocusCommand::ToggleFocusMode => self.toggle().await,
        }
    }

    fn is_idle(&self) -> bool {
        let warming = self
            .warmup
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished());
        !warming
            && self.pipeline.pending().is_empty()
            && !self.listener.is_draining()
            && !self.navigation.is_busy()
    }

    /// Wait for warm-up, scans and queued mutations to finish. Returns false on timeout.
    pub async fn wait_until_settled(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut idle_polls = 0;
        loop {
            idle_polls = if self.is_idle() { idle_polls + 1 } else { 0 };
            // two quiet polls in a row: batches sent before the first are drained
            if idle_polls >= 2 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            time::sleep(SETTLE_POLL).await;
        }
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        self.listener.disconnect();
        self.navigation.stop();
    }
}

async fn warm_up(
    embedder: EmbedderHandle,
    session: Arc<SessionState>,
    pipeline: Arc<Pipeline>,
    generation: u64,
    topic: String,
) {
    let embedded = match embedder.warm_up().await {
        Ok(()) => embedder.embed(&topic).await,
        Err(err) => Err(err),
    };
    match embedded {
        Ok(vector) => {
            if session.mark_ready(generation, vector) {
                info!(target: "focus.controller", generation, "topic embedding ready");
            }
        }
        Err(err) => {
            if session.mark_unavailable(generation) {
                warn!(
                    target: "focus.controller",
                    generation,
                    %err,
                    "scoring model unavailable; unscored items follow the unavailable policy"
                );
            }
        }
    }
    if session.is_current(generation) {
        let report = pipeline.full_scan().await;
        debug!(target: "focus.controller", generation, ?report, "post warm-up scan finished");
    }
}
