use std::time::Duration;

use focusfeed_core_types::{NodeId, Verdict};
use tracing::{debug, info, warn};

pub fn emit_verdict(node: NodeId, verdict: &Verdict, duration: Duration) {
    let similarity = match verdict {
        Verdict::Relevant { similarity } => Some(*similarity),
        Verdict::Filtered { similarity } => *similarity,
        Verdict::Unavailable(_) => None,
    };
    debug!(
        target: "focus.classifier",
        %node,
        verdict = verdict.label(),
        similarity,
        elapsed_ms = duration.as_millis() as u64,
        "item.classified"
    );
}

pub fn emit_discarded(node: NodeId, generation: u64) {
    debug!(
        target: "focus.pipeline",
        %node,
        generation,
        "item.verdict_discarded"
    );
}

pub fn emit_scan(candidates: usize, duration: Duration) {
    debug!(
        target: "focus.pipeline",
        candidates,
        elapsed_ms = duration.as_millis() as u64,
        "scan.completed"
    );
}

pub fn emit_purge(removed: usize) {
    if removed > 0 {
        debug!(target: "focus.mutator", removed, "sections.purged");
    }
}

pub fn emit_navigation(from: &str, to: &str, content_ready: bool) {
    if content_ready {
        info!(target: "focus.navigation", from, to, "navigation.rescanned");
    } else {
        warn!(
            target: "focus.navigation",
            from,
            to,
            "content did not appear before timeout; scanning anyway"
        );
    }
}
