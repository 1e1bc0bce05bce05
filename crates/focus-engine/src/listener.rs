use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use focusfeed_core_types::{NodeId, ObserverId, Role, SelectorTable};
use page_port::MutationBatch;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::errors::{EngineError, Result};
use crate::pipeline::{PendingGuard, Pipeline};

struct Attachment {
    observer: ObserverId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Number of drains working through claimed items; each drain holds one count.
#[derive(Clone, Default)]
struct DrainCount(Arc<AtomicUsize>);

struct Draining(Arc<AtomicUsize>);

impl DrainCount {
    fn enter(&self) -> Draining {
        self.0.fetch_add(1, Ordering::SeqCst);
        Draining(Arc::clone(&self.0))
    }

    fn busy(&self) -> bool {
        self.0.load(Ordering::SeqCst) > 0
    }
}

impl Drop for Draining {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Watches the page container for inserted subtrees and feeds new content items into
/// the pipeline, one at a time.
pub struct MutationListener {
    pipeline: Arc<Pipeline>,
    /// Container selectors in order of preference.
    containers: Vec<String>,
    attachment: Mutex<Option<Attachment>>,
    draining: DrainCount,
}

impl MutationListener {
    pub fn new(pipeline: Arc<Pipeline>, selectors: &SelectorTable) -> Self {
        Self {
            pipeline,
            containers: selectors.selectors(Role::PageContainer).to_vec(),
            attachment: Mutex::new(None),
            draining: DrainCount::default(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.attachment.lock().is_some()
    }

    /// True while any drain, current or detached, is working through claimed items.
    pub fn is_draining(&self) -> bool {
        self.draining.busy()
    }

    /// First match of the most preferred container selector.
    fn find_container(&self) -> Result<NodeId> {
        let document = self.pipeline.document();
        for selector in &self.containers {
            if let Some(root) = document.query_all(selector)?.first() {
                return Ok(*root);
            }
        }
        Err(EngineError::ContainerMissing(self.containers.join(", ")))
    }

    /// Observe the page container and start the drain task. Connecting twice keeps
    /// the existing subscription.
    pub fn connect(&self) -> Result<ObserverId> {
        let mut attachment = self.attachment.lock();
        if let Some(existing) = attachment.as_ref() {
            return Ok(existing.observer);
        }
        let root = self.find_container()?;
        let document = self.pipeline.document();
        let (tx, rx) = mpsc::unbounded_channel();
        let observer = document.observe_subtree(root, tx)?;
        let cancel = CancellationToken::new();
        let task = tokio::spawn(drain(
            Arc::clone(&self.pipeline),
            rx,
            cancel.clone(),
            self.draining.clone(),
        ));
        debug!(target: "focus.listener", %root, ?observer, "listener attached");
        *attachment = Some(Attachment {
            observer,
            cancel,
            task,
        });
        Ok(observer)
    }

    fn take_attachment(&self) -> Option<Attachment> {
        let attachment = self.attachment.lock().take()?;
        self.pipeline.document().disconnect(attachment.observer);
        attachment.cancel.cancel();
        debug!(target: "focus.listener", observer = ?attachment.observer, "listener detached");
        Some(attachment)
    }

    /// Stop observing. An item already being scored finishes on its own; nothing
    /// further is scheduled.
    pub fn disconnect(&self) {
        self.take_attachment();
    }

    /// Stop observing and wait for the drain task to exit. Items it had claimed but not
    /// scored are released by then, so a following scan can pick them up.
    pub async fn detach(&self) {
        let Some(attachment) = self.take_attachment() else {
            return;
        };
        if let Err(err) = attachment.task.await {
            warn!(target: "focus.listener", %err, "drain task ended abnormally");
        }
    }
}

fn absorb(pipeline: &Pipeline, batch: MutationBatch, queue: &mut VecDeque<PendingGuard>) {
    if batch.added.is_empty() {
        return;
    }
    pipeline.purge();
    let claimed = pipeline.claim_candidates(&batch.added);
    trace!(
        target: "focus.listener",
        added = batch.added.len(),
        claimed = claimed.len(),
        "batch absorbed"
    );
    queue.extend(claimed);
}

fn absorb_queued(
    pipeline: &Pipeline,
    rx: &mut mpsc::UnboundedReceiver<MutationBatch>,
    queue: &mut VecDeque<PendingGuard>,
) {
    while let Ok(batch) = rx.try_recv() {
        absorb(pipeline, batch, queue);
    }
}

async fn drain(
    pipeline: Arc<Pipeline>,
    mut rx: mpsc::UnboundedReceiver<MutationBatch>,
    cancel: CancellationToken,
    draining: DrainCount,
) {
    loop {
        let batch = tokio::select! {
            _ = cancel.cancelled() => break,
            batch = rx.recv() => match batch {
                Some(batch) => batch,
                None => break,
            },
        };
        let _busy = draining.enter();
        // let the rest of the current render land before collecting
        tokio::task::yield_now().await;

        let mut queue = VecDeque::new();
        absorb(&pipeline, batch, &mut queue);
        absorb_queued(&pipeline, &mut rx, &mut queue);
        while let Some(claim) = queue.pop_front() {
            if cancel.is_cancelled() {
                break;
            }
            pipeline.process(claim).await;
            absorb_queued(&pipeline, &mut rx, &mut queue);
        }
        if !queue.is_empty() {
            trace!(target: "focus.listener", released = queue.len(), "releasing unscored claims");
        }
    }
    trace!(target: "focus.listener", "drain task finished");
}
