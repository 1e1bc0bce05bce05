use focusfeed_core_types::{BoxSize, NodeId, ObserverId};
use tokio::sync::mpsc;

use crate::errors::Result;
use crate::model::{ElementSpec, MutationBatch};

/// Narrow view of the host document used by the filtering pipeline.
///
/// Every call is synchronous: inspection and mutation never suspend. Insertions are
/// reported asynchronously through [`DocumentPort::observe_subtree`].
pub trait DocumentPort: Send + Sync {
    /// Nodes matching a selector group, in document order.
    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>>;

    /// Descendants of `node` (excluding itself) matching a selector group.
    fn query_within(&self, node: NodeId, selector: &str) -> Result<Vec<NodeId>>;

    fn matches(&self, node: NodeId, selector: &str) -> Result<bool>;

    /// Nearest inclusive ancestor of `node` matching a selector group.
    fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>>;

    /// Whether the node is still attached to the document.
    fn is_connected(&self, node: NodeId) -> bool;

    fn text_content(&self, node: NodeId) -> Result<String>;

    fn measure(&self, node: NodeId) -> Result<BoxSize>;

    fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>>;

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<()>;

    fn remove_attribute(&self, node: NodeId, name: &str) -> Result<()>;

    /// Swap `old` for a freshly built subtree at the same position. Returns the new root.
    fn replace_node(&self, old: NodeId, replacement: ElementSpec) -> Result<NodeId>;

    fn remove_node(&self, node: NodeId) -> Result<()>;

    /// Insert a freshly built subtree as the first child of `parent`. Returns its root.
    fn prepend_child(&self, parent: NodeId, spec: ElementSpec) -> Result<NodeId>;

    /// Append a `<style id=marker>` element holding `css` to the document head.
    fn insert_style(&self, marker: &str, css: &str) -> Result<NodeId>;

    /// Remove every `<style>` element carrying `marker` as its id. Returns how many went.
    fn remove_style(&self, marker: &str) -> Result<usize>;

    /// Current location, as a full URL.
    fn location(&self) -> String;

    /// Ask the host to reload the page.
    fn reload(&self) -> Result<()>;

    /// Report insertions anywhere under `root` to `sink` until disconnected.
    fn observe_subtree(
        &self,
        root: NodeId,
        sink: mpsc::UnboundedSender<MutationBatch>,
    ) -> Result<ObserverId>;

    fn disconnect(&self, observer: ObserverId);
}

/// Path component of a location, or "/" when it cannot be parsed.
pub fn location_path(location: &str) -> String {
    url::Url::parse(location)
        .map(|url| url.path().to_string())
        .unwrap_or_else(|_| "/".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_path_extracts_path() {
        assert_eq!(
            location_path("https://www.youtube.com/results?search_query=trig"),
            "/results"
        );
        assert_eq!(location_path("not a url"), "/");
    }
}
