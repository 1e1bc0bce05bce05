//! Shared scoring lane.
//!
//! The listener, full scans and navigation rescans all funnel items through one
//! [`Pipeline`]. Items are claimed in the [`PendingSet`] when discovered and scored one
//! at a time behind the lane lock, in claim order.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use focusfeed_core_types::{ItemStatus, NodeId, Role, SelectorTable, UnavailableReason, Verdict};
use page_port::DocumentPort;
use parking_lot::Mutex;
use tracing::debug;

use crate::classifier::RelevanceClassifier;
use crate::events;
use crate::metrics::EngineMetrics;
use crate::mutator::{Applied, PageMutator};
use crate::session::SessionState;

/// Node identities currently between discovery and verdict application.
#[derive(Clone, Default)]
pub struct PendingSet {
    inner: Arc<Mutex<HashSet<NodeId>>>,
}

/// Membership of one node in the [`PendingSet`]; released on drop.
#[derive(Debug)]
pub struct PendingGuard {
    set: Arc<Mutex<HashSet<NodeId>>>,
    node: NodeId,
}

impl PendingGuard {
    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.set.lock().remove(&self.node);
    }
}

impl PendingSet {
    /// Claim `node`, or `None` when it is already pending.
    pub fn try_claim(&self, node: NodeId) -> Option<PendingGuard> {
        self.inner.lock().insert(node).then(|| PendingGuard {
            set: Arc::clone(&self.inner),
            node,
        })
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.inner.lock().contains(&node)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

/// What happened to one claimed item.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outcome {
    Applied(Verdict, Applied),
    /// The verdict arrived after its session ended or its node left the page.
    Discarded,
    /// Already handled by the time the item reached the lane.
    Skipped,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub candidates: usize,
    pub relevant: usize,
    pub replaced: usize,
    pub untouched: usize,
    pub discarded: usize,
    pub purged: usize,
}

impl ScanReport {
    fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Applied(_, Applied::Marked) => self.relevant += 1,
            Outcome::Applied(_, Applied::Replaced { .. }) => self.replaced += 1,
            Outcome::Applied(_, Applied::Untouched) | Outcome::Skipped => self.untouched += 1,
            Outcome::Discarded => self.discarded += 1,
        }
    }
}

pub struct Pipeline {
    document: Arc<dyn DocumentPort>,
    session: Arc<SessionState>,
    classifier: RelevanceClassifier,
    mutator: PageMutator,
    metrics: Arc<EngineMetrics>,
    pending: PendingSet,
    lane: tokio::sync::Mutex<()>,
    content_item: String,
}

impl Pipeline {
    pub fn new(
        document: Arc<dyn DocumentPort>,
        session: Arc<SessionState>,
        classifier: RelevanceClassifier,
        mutator: PageMutator,
        metrics: Arc<EngineMetrics>,
        selectors: &SelectorTable,
    ) -> Self {
        Self {
            document,
            session,
            classifier,
            mutator,
            metrics,
            pending: PendingSet::default(),
            lane: tokio::sync::Mutex::new(()),
            content_item: selectors.group(Role::ContentItem),
        }
    }

    pub fn document(&self) -> &Arc<dyn DocumentPort> {
        &self.document
    }

    pub fn mutator(&self) -> &PageMutator {
        &self.mutator
    }

    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    pub fn content_selector(&self) -> &str {
        &self.content_item
    }

    /// Whether a node may still be enqueued: attached, not already handled, not pending.
    fn eligible(&self, node: NodeId) -> bool {
        self.document.is_connected(node)
            && !self.mutator.is_placeholder(node)
            && !self.mutator.is_marked(node)
            && !self.pending.contains(node)
    }

    /// Content items at, around or below the given insertion roots, in discovery order.
    pub fn collect_candidates(&self, added: &[NodeId]) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();
        for root in added {
            if !self.document.is_connected(*root) || self.mutator.is_placeholder(*root) {
                continue;
            }
            // an insertion inside an item counts as a mutation of that item
            if let Ok(Some(item)) = self.document.closest(*root, &self.content_item) {
                found.push(item);
            }
            match self.document.query_within(*root, &self.content_item) {
                Ok(nested) => found.extend(nested),
                Err(err) => debug!(target: "focus.listener", node = %root, %err, "candidate lookup failed"),
            }
        }
        found.retain(|node| seen.insert(*node) && self.eligible(*node));
        found
    }

    /// Claim every eligible candidate under `added`.
    pub fn claim_candidates(&self, added: &[NodeId]) -> Vec<PendingGuard> {
        self.collect_candidates(added)
            .into_iter()
            .filter_map(|node| self.pending.try_claim(node))
            .collect()
    }

    /// Remove excluded sections and count them.
    pub fn purge(&self) -> usize {
        let removed = self.mutator.purge_excluded();
        self.metrics.record_purged(removed);
        removed
    }

    /// Score one claimed item and apply its verdict. The claim is released on return.
    pub async fn process(&self, claim: PendingGuard) -> Outcome {
        let node = claim.node();
        let Some(generation) = self.session.current_generation() else {
            return Outcome::Skipped;
        };
        let _lane = self.lane.lock().await;

        if !self.document.is_connected(node) || self.mutator.is_marked(node) {
            return Outcome::Skipped;
        }

        let verdict = self.classifier.classify(node, generation).await;

        // checked and applied under the session lock so teardown cannot interleave
        let applied = self
            .session
            .with_current(generation, |session| {
                self.document
                    .is_connected(node)
                    .then(|| self.mutator.apply(node, &verdict, &session.topic))
            })
            .flatten();
        let applied = match applied {
            Some(Ok(applied)) => applied,
            Some(Err(err)) => {
                debug!(target: "focus.mutator", %node, %err, "verdict not applied");
                return Outcome::Skipped;
            }
            None => {
                self.metrics.record_stale();
                events::emit_discarded(node, generation);
                return Outcome::Discarded;
            }
        };
        self.record(&verdict, &applied);
        Outcome::Applied(verdict, applied)
    }

    fn record(&self, verdict: &Verdict, applied: &Applied) {
        match (verdict, applied) {
            (Verdict::Relevant { .. }, _) => self.metrics.record_relevant(),
            (Verdict::Unavailable(UnavailableReason::EmptyContent), _) => {
                self.metrics.record_skipped_empty()
            }
            (_, Applied::Replaced { .. }) => self.metrics.record_filtered(),
            _ => self.metrics.record_kept_unavailable(),
        }
    }

    /// Purge excluded sections, then score every unprocessed content item on the page.
    pub async fn full_scan(&self) -> ScanReport {
        let started = Instant::now();
        let mut report = ScanReport {
            purged: self.purge(),
            ..ScanReport::default()
        };
        let claims: Vec<PendingGuard> = match self.document.query_all(&self.content_item) {
            Ok(items) => items
                .into_iter()
                .filter(|node| self.eligible(*node))
                .filter_map(|node| self.pending.try_claim(node))
                .collect(),
            Err(err) => {
                debug!(target: "focus.pipeline", %err, "content query failed");
                Vec::new()
            }
        };
        report.candidates = claims.len();
        for claim in claims {
            let outcome = self.process(claim).await;
            report.record(&outcome);
        }
        self.metrics.record_scan();
        events::emit_scan(report.candidates, started.elapsed());
        report
    }

    pub fn status_of(&self, node: NodeId) -> ItemStatus {
        if self.pending.contains(node) {
            ItemStatus::InFlight
        } else if self.mutator.is_marked(node) {
            ItemStatus::Relevant
        } else if self.mutator.placeholder_for(node).is_some() {
            ItemStatus::Filtered
        } else {
            ItemStatus::Unprocessed
        }
    }
}
