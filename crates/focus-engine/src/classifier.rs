use std::sync::Arc;
use std::time::Instant;

use focusfeed_core_types::{NodeId, Role, SelectorTable, UnavailableReason, Verdict};
use page_port::DocumentPort;
use topic_embedder::{cosine_similarity, EmbedderHandle};
use tracing::debug;

use crate::config::UnavailablePolicy;
use crate::events;
use crate::metrics::EngineMetrics;
use crate::session::SessionState;

/// Text view of one content item.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentItem {
    pub node: NodeId,
    /// Title, channel and description joined by single spaces and case-folded.
    pub text: String,
}

/// What the page mutator should do with a classified item.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Disposition {
    /// Tag the node as processed and leave it in place.
    Keep,
    /// Swap the node for a placeholder.
    Replace,
    /// Do nothing; the node may be looked at again if it mutates.
    Untouched,
}

/// Map a verdict to a disposition.
///
/// Model-unavailable verdicts go through `policy`; with the default
/// [`UnavailablePolicy::Hide`] they are replaced like filtered items. Empty-content
/// verdicts always leave the node untouched.
pub fn disposition(verdict: &Verdict, policy: UnavailablePolicy) -> Disposition {
    match verdict {
        Verdict::Relevant { .. } => Disposition::Keep,
        Verdict::Filtered { .. } => Disposition::Replace,
        Verdict::Unavailable(UnavailableReason::EmptyContent) => Disposition::Untouched,
        Verdict::Unavailable(UnavailableReason::ModelUnavailable) => match policy {
            UnavailablePolicy::Hide => Disposition::Replace,
            UnavailablePolicy::Keep => Disposition::Untouched,
        },
    }
}

/// Compare a similarity against the relevance threshold.
pub fn judge(similarity: f32, threshold: f32) -> Verdict {
    if similarity >= threshold {
        Verdict::Relevant { similarity }
    } else {
        Verdict::Filtered {
            similarity: Some(similarity),
        }
    }
}

pub struct RelevanceClassifier {
    document: Arc<dyn DocumentPort>,
    embedder: EmbedderHandle,
    session: Arc<SessionState>,
    metrics: Arc<EngineMetrics>,
    threshold: f32,
    title: String,
    channel: String,
    description: String,
}

impl RelevanceClassifier {
    pub fn new(
        document: Arc<dyn DocumentPort>,
        embedder: EmbedderHandle,
        session: Arc<SessionState>,
        metrics: Arc<EngineMetrics>,
        selectors: &SelectorTable,
        threshold: f32,
    ) -> Self {
        Self {
            document,
            embedder,
            session,
            metrics,
            threshold,
            title: selectors.group(Role::TitleField),
            channel: selectors.group(Role::ChannelField),
            description: selectors.group(Role::DescriptionField),
        }
    }

    fn field_text(&self, node: NodeId, selector: &str) -> String {
        if selector.is_empty() {
            return String::new();
        }
        match self.document.query_within(node, selector) {
            Ok(found) => found
                .first()
                .and_then(|field| self.document.text_content(*field).ok())
                .unwrap_or_default(),
            Err(err) => {
                debug!(target: "focus.classifier", %node, %err, "field lookup failed");
                String::new()
            }
        }
    }

    /// Pull the visible text out of a content node. Missing fields contribute nothing.
    pub fn extract(&self, node: NodeId) -> ContentItem {
        let fields = [
            self.field_text(node, &self.title),
            self.field_text(node, &self.channel),
            self.field_text(node, &self.description),
        ];
        let text = fields
            .iter()
            .flat_map(|field| field.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        ContentItem { node, text }
    }

    /// Classify a live node for the session of `generation`.
    pub async fn classify(&self, node: NodeId, generation: u64) -> Verdict {
        let item = self.extract(node);
        self.classify_item(&item, generation).await
    }

    pub async fn classify_item(&self, item: &ContentItem, generation: u64) -> Verdict {
        let started = Instant::now();
        let verdict = if item.text.is_empty() {
            Verdict::Unavailable(UnavailableReason::EmptyContent)
        } else {
            match self.session.topic_vector(generation).await {
                Some(topic) => self.score(&item.text, &topic).await,
                None => Verdict::Unavailable(UnavailableReason::ModelUnavailable),
            }
        };
        events::emit_verdict(item.node, &verdict, started.elapsed());
        verdict
    }

    /// Score text against a topic vector. Same text and vector give the same verdict.
    pub async fn score(&self, text: &str, topic: &[f32]) -> Verdict {
        match self.embedder.embed(text).await {
            Ok(vector) => judge(cosine_similarity(&vector, topic), self.threshold),
            Err(err) => {
                self.metrics.record_embed_failure();
                debug!(target: "focus.classifier", %err, "item embedding failed");
                Verdict::Unavailable(UnavailableReason::ModelUnavailable)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_port::{ElementSpec, InMemoryDocument};
    use std::time::Duration;
    use topic_embedder::HashingEmbedder;

    async fn ready_classifier(topic: &str) -> (Arc<InMemoryDocument>, RelevanceClassifier, u64) {
        let doc = Arc::new(InMemoryDocument::new("https://www.youtube.com/"));
        let embedder = EmbedderHandle::new(Arc::new(HashingEmbedder::new(256, Duration::ZERO)));
        embedder.warm_up().await.unwrap();
        let session = Arc::new(SessionState::new());
        let generation = session.begin(topic.to_string()).generation;
        let vector = embedder.embed(topic).await.unwrap();
        assert!(session.mark_ready(generation, vector));
        let classifier = RelevanceClassifier::new(
            doc.clone(),
            embedder,
            session,
            Arc::new(EngineMetrics::default()),
            &SelectorTable::default(),
            0.5,
        );
        (doc, classifier, generation)
    }

    #[tokio::test]
    async fn classifying_the_same_item_twice_agrees() {
        let (doc, classifier, generation) = ready_classifier("trigonometry").await;
        let item = doc
            .append_child(
                doc.body(),
                ElementSpec::new("ytd-video-renderer").with_child(
                    ElementSpec::new("a")
                        .with_id("video-title")
                        .with_text("Trigonometry: the law of sines"),
                ),
            )
            .unwrap();

        let first = classifier.classify(item, generation).await;
        let second = classifier.classify(item, generation).await;
        assert!(!matches!(first, Verdict::Unavailable(_)));
        assert_eq!(first, second);
        assert_eq!(classifier.extract(item).text, "trigonometry: the law of sines");
    }

    #[tokio::test]
    async fn items_without_text_are_left_alone() {
        let (doc, classifier, generation) = ready_classifier("trigonometry").await;
        let shell = doc
            .append_child(doc.body(), ElementSpec::new("ytd-video-renderer"))
            .unwrap();
        assert_eq!(
            classifier.classify(shell, generation).await,
            Verdict::Unavailable(UnavailableReason::EmptyContent)
        );
    }

    #[test]
    fn judge_is_inclusive_at_threshold() {
        assert_eq!(judge(0.5, 0.5), Verdict::Relevant { similarity: 0.5 });
        assert_eq!(
            judge(0.12, 0.5),
            Verdict::Filtered {
                similarity: Some(0.12)
            }
        );
    }

    #[test]
    fn unavailable_policy_is_the_only_switch() {
        let model = Verdict::Unavailable(UnavailableReason::ModelUnavailable);
        let empty = Verdict::Unavailable(UnavailableReason::EmptyContent);
        assert_eq!(disposition(&model, UnavailablePolicy::Hide), Disposition::Replace);
        assert_eq!(disposition(&model, UnavailablePolicy::Keep), Disposition::Untouched);
        for policy in [UnavailablePolicy::Hide, UnavailablePolicy::Keep] {
            assert_eq!(disposition(&empty, policy), Disposition::Untouched);
            assert_eq!(
                disposition(&Verdict::Relevant { similarity: 0.9 }, policy),
                Disposition::Keep
            );
            assert_eq!(
                disposition(&Verdict::Filtered { similarity: None }, policy),
                Disposition::Replace
            );
        }
    }
}
