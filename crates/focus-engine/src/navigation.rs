use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use focusfeed_core_types::{Role, SelectorTable};
use page_port::DocumentPort;
use parking_lot::Mutex;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::NavigationConfig;
use crate::errors::{EngineError, Result};
use crate::events;
use crate::listener::MutationListener;
use crate::metrics::EngineMetrics;
use crate::pipeline::Pipeline;
use crate::session::SessionState;

/// Detects in-page navigation by polling the location and rescans the new page.
pub struct NavigationWatcher {
    document: Arc<dyn DocumentPort>,
    pipeline: Arc<Pipeline>,
    listener: Arc<MutationListener>,
    session: Arc<SessionState>,
    metrics: Arc<EngineMetrics>,
    config: NavigationConfig,
    container: String,
    cancel: Mutex<Option<CancellationToken>>,
    busy: AtomicBool,
}

impl NavigationWatcher {
    pub fn new(
        pipeline: Arc<Pipeline>,
        listener: Arc<MutationListener>,
        session: Arc<SessionState>,
        metrics: Arc<EngineMetrics>,
        config: NavigationConfig,
        selectors: &SelectorTable,
    ) -> Self {
        Self {
            document: Arc::clone(pipeline.document()),
            pipeline,
            listener,
            session,
            metrics,
            config,
            container: selectors.group(Role::PageContainer),
            cancel: Mutex::new(None),
            busy: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.cancel.lock().is_some()
    }

    /// True while a navigation is being handled.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn start(self: &Arc<Self>) {
        let mut slot = self.cancel.lock();
        if slot.is_some() {
            return;
        }
        let cancel = CancellationToken::new();
        *slot = Some(cancel.clone());
        let watcher = Arc::clone(self);
        tokio::spawn(async move { watcher.watch(cancel).await });
    }

    pub fn stop(&self) {
        if let Some(cancel) = self.cancel.lock().take() {
            cancel.cancel();
        }
    }

    async fn watch(&self, cancel: CancellationToken) {
        let mut last = self.document.location();
        let mut ticker = time::interval(self.config.poll_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!(target: "focus.navigation", location = %last, "watching location");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            let current = self.document.location();
            if current == last {
                continue;
            }
            let previous = std::mem::replace(&mut last, current.clone());
            if !self.session.is_active() {
                continue;
            }
            self.busy.store(true, Ordering::SeqCst);
            self.on_navigation(&previous, &current, &cancel).await;
            self.busy.store(false, Ordering::SeqCst);
        }
        debug!(target: "focus.navigation", "watcher stopped");
    }

    async fn on_navigation(&self, from: &str, to: &str, cancel: &CancellationToken) {
        // claims held by the old drain must be back before the rescan collects
        self.listener.detach().await;
        let waited = self.wait_for_content(cancel).await;
        let content_ready = match &waited {
            Ok(()) => true,
            Err(EngineError::NavigationTimeout { waited_ms }) => {
                debug!(target: "focus.navigation", waited_ms, "content wait timed out");
                false
            }
            Err(err) => {
                warn!(target: "focus.navigation", %err, "content wait failed");
                false
            }
        };
        self.metrics.record_navigation(!content_ready);
        events::emit_navigation(from, to, content_ready);

        if cancel.is_cancelled() || !self.session.is_active() {
            return;
        }
        if let Some(topic) = self.session.topic() {
            if let Err(err) = self.pipeline.mutator().sync_topic_header(&topic) {
                warn!(target: "focus.navigation", %err, "topic header not updated");
            }
        }
        self.pipeline.full_scan().await;
        if cancel.is_cancelled() || !self.session.is_active() {
            return;
        }
        if let Err(err) = self.listener.connect() {
            warn!(target: "focus.navigation", %err, "listener not reattached after navigation");
        }
    }

    /// Whether some page container currently holds at least one content item.
    fn content_present(&self) -> bool {
        let content = self.pipeline.content_selector();
        match self.document.query_all(&self.container) {
            Ok(containers) => containers.into_iter().any(|container| {
                self.document
                    .query_within(container, content)
                    .is_ok_and(|items| !items.is_empty())
            }),
            Err(_) => false,
        }
    }

    /// Poll until content appears, giving up after the configured ceiling.
    pub async fn wait_for_content(&self, cancel: &CancellationToken) -> Result<()> {
        let started = Instant::now();
        let deadline = started + self.config.content_wait();
        loop {
            if self.content_present() {
                return Ok(());
            }
            if Instant::now() >= deadline || cancel.is_cancelled() {
                return Err(EngineError::NavigationTimeout {
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = time::sleep(self.config.content_poll()) => {}
            }
        }
    }
}
