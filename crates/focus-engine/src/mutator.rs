use std::collections::HashMap;
use std::sync::Arc;

use focusfeed_core_types::{BoxSize, NodeId, Role, SelectorTable, Verdict};
use page_port::{location_path, DocumentPort, ElementSpec};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::classifier::{disposition, Disposition};
use crate::config::UnavailablePolicy;
use crate::errors::Result;
use crate::events;

/// Attribute set on every node the pipeline has accepted.
pub const PROCESSED_ATTR: &str = "data-focusfeed";
pub const PROCESSED_VALUE: &str = "relevant";
/// Attribute carried by placeholders; its value is the original node id.
pub const PLACEHOLDER_ATTR: &str = "data-focusfeed-placeholder";
pub const PLACEHOLDER_CLASS: &str = "focusfeed-placeholder";
pub const PLACEHOLDER_SELECTOR: &str = "[data-focusfeed-placeholder]";
pub const PROCESSED_SELECTOR: &str = "[data-focusfeed]";
/// Id of the "Focusing on" header shown on watch pages.
pub const HEADER_ID: &str = "focusfeed-topic-header";
const HEADER_SELECTOR: &str = "#focusfeed-topic-header";
const WATCH_PATH: &str = "/watch";

/// Result of applying a verdict.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Applied {
    Marked,
    Replaced { placeholder: NodeId, size: BoxSize },
    Untouched,
}

/// Build the stand-in for a filtered node.
pub fn placeholder_spec(original: NodeId, size: BoxSize, topic: &str) -> ElementSpec {
    ElementSpec::new("div")
        .with_class(PLACEHOLDER_CLASS)
        .with_attr(PLACEHOLDER_ATTR, original.0.to_string())
        .with_attr("data-topic", topic)
        .with_attr(
            "style",
            format!("width:{}px;height:{}px", size.width, size.height),
        )
        .with_size(size.width, size.height)
        .with_child(
            ElementSpec::new("span")
                .with_class("focusfeed-placeholder-label")
                .with_text(format!("Hidden while focusing on \u{201c}{topic}\u{201d}")),
        )
}

/// Build the header announcing the session topic.
pub fn topic_header_spec(topic: &str) -> ElementSpec {
    ElementSpec::new("div")
        .with_id(HEADER_ID)
        .with_class("focusfeed-topic-header")
        .with_child(
            ElementSpec::new("h2")
                .with_text("Focusing on: ")
                .with_child(ElementSpec::new("span").with_class("topic").with_text(topic)),
        )
}

/// Applies verdicts to the live document.
pub struct PageMutator {
    document: Arc<dyn DocumentPort>,
    policy: UnavailablePolicy,
    floor: BoxSize,
    excluded: String,
    selectors: SelectorTable,
    /// Original node → placeholder standing in for it.
    replacements: Mutex<HashMap<NodeId, NodeId>>,
}

impl PageMutator {
    pub fn new(
        document: Arc<dyn DocumentPort>,
        selectors: &SelectorTable,
        policy: UnavailablePolicy,
        floor: BoxSize,
    ) -> Self {
        Self {
            document,
            policy,
            floor,
            excluded: selectors.group(Role::ExcludedSection),
            selectors: selectors.clone(),
            replacements: Mutex::new(HashMap::new()),
        }
    }

    pub fn is_placeholder(&self, node: NodeId) -> bool {
        matches!(self.document.attribute(node, PLACEHOLDER_ATTR), Ok(Some(_)))
    }

    pub fn is_marked(&self, node: NodeId) -> bool {
        matches!(
            self.document.attribute(node, PROCESSED_ATTR),
            Ok(Some(value)) if value == PROCESSED_VALUE
        )
    }

    /// Placeholder currently standing in for `original`, if it is still attached.
    pub fn placeholder_for(&self, original: NodeId) -> Option<NodeId> {
        let mut replacements = self.replacements.lock();
        let placeholder = *replacements.get(&original)?;
        if self.document.is_connected(placeholder) {
            Some(placeholder)
        } else {
            replacements.remove(&original);
            None
        }
    }

    /// Replacements whose placeholder is still on the page.
    pub fn tracked_replacements(&self) -> usize {
        self.replacements.lock().len()
    }

    /// Forget replacements whose placeholder has left the page.
    fn prune_replacements(&self) -> usize {
        let mut replacements = self.replacements.lock();
        let before = replacements.len();
        replacements.retain(|_, placeholder| self.document.is_connected(*placeholder));
        before - replacements.len()
    }

    pub fn apply(&self, node: NodeId, verdict: &Verdict, topic: &str) -> Result<Applied> {
        match disposition(verdict, self.policy) {
            Disposition::Keep => {
                self.document
                    .set_attribute(node, PROCESSED_ATTR, PROCESSED_VALUE)?;
                Ok(Applied::Marked)
            }
            Disposition::Replace => {
                let measured = self.document.measure(node)?;
                let size = measured.floored(self.floor);
                let placeholder = self
                    .document
                    .replace_node(node, placeholder_spec(node, size, topic))?;
                self.replacements.lock().insert(node, placeholder);
                debug!(
                    target: "focus.mutator",
                    %node,
                    %placeholder,
                    width = size.width,
                    height = size.height,
                    "item replaced"
                );
                Ok(Applied::Replaced { placeholder, size })
            }
            Disposition::Untouched => Ok(Applied::Untouched),
        }
    }

    /// Remove every excluded section, plus the exclusions for the current path.
    /// Independent of any per-item verdict.
    pub fn purge_excluded(&self) -> usize {
        let path = location_path(&self.document.location());
        let mut groups: Vec<&str> = Vec::new();
        if !self.excluded.is_empty() {
            groups.push(&self.excluded);
        }
        groups.extend(self.selectors.exclusions_for_path(&path));

        let mut removed = 0;
        for group in groups {
            let found = match self.document.query_all(group) {
                Ok(found) => found,
                Err(err) => {
                    warn!(target: "focus.mutator", selector = group, %err, "excluded-section query failed");
                    continue;
                }
            };
            for section in found {
                // nested matches vanish with their ancestor
                if !self.document.is_connected(section) {
                    continue;
                }
                if self.document.remove_node(section).is_ok() {
                    removed += 1;
                }
            }
        }
        events::emit_purge(removed);
        let pruned = self.prune_replacements();
        if pruned > 0 {
            debug!(target: "focus.mutator", pruned, "dropped replacements that left the page");
        }
        removed
    }

    /// Show the topic header on watch pages and drop it everywhere else. Returns the
    /// header when one is on the page afterwards.
    pub fn sync_topic_header(&self, topic: &str) -> Result<Option<NodeId>> {
        let existing = self.document.query_all(HEADER_SELECTOR)?;
        if location_path(&self.document.location()) != WATCH_PATH {
            for header in existing {
                self.document.remove_node(header)?;
            }
            return Ok(None);
        }
        if let Some(header) = existing.first() {
            return Ok(Some(*header));
        }
        let sidebar = self.selectors.group(Role::Sidebar);
        if sidebar.is_empty() {
            return Ok(None);
        }
        let Some(column) = self.document.query_all(&sidebar)?.first().copied() else {
            debug!(target: "focus.mutator", "no sidebar for the topic header");
            return Ok(None);
        };
        let header = self
            .document
            .prepend_child(column, topic_header_spec(topic))?;
        debug!(target: "focus.mutator", %header, topic, "topic header shown");
        Ok(Some(header))
    }

    /// Strip every trace of the pipeline: placeholders, the topic header and processed
    /// markers. Discarded originals are not brought back.
    pub fn restore(&self) -> usize {
        let mut touched = 0;
        for selector in [PLACEHOLDER_SELECTOR, HEADER_SELECTOR] {
            if let Ok(found) = self.document.query_all(selector) {
                for node in found {
                    if self.document.remove_node(node).is_ok() {
                        touched += 1;
                    }
                }
            }
        }
        if let Ok(marked) = self.document.query_all(PROCESSED_SELECTOR) {
            for node in marked {
                if self.document.remove_attribute(node, PROCESSED_ATTR).is_ok() {
                    touched += 1;
                }
            }
        }
        self.replacements.lock().clear();
        touched
    }
}
