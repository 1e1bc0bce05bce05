use std::collections::{BTreeMap, HashMap};

use ego_tree::NodeId as TreeId;
use focusfeed_core_types::{BoxSize, NodeId, ObserverId};
use parking_lot::Mutex;
use scraper::{ElementRef, Html, Node, Selector};
use tokio::sync::mpsc;
use tracing::trace;

use crate::errors::{PortError, Result};
use crate::model::{ElementSpec, MutationBatch, PageFixture};
use crate::ports::DocumentPort;

const SKELETON: &str = "<!DOCTYPE html><html><head></head><body></body></html>";

/// Elements whose text is not entity-decoded by the parser.
const RAW_TEXT: &[&str] = &["style", "script"];

fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn escape_into(out: &mut String, raw: &str, attribute: bool) {
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' if attribute => out.push_str("&quot;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
}

/// Parse one element, with optional text, into detached node values.
fn parse_element(
    tag: &str,
    attrs: &BTreeMap<String, String>,
    text: Option<&str>,
) -> Result<(Node, Option<Node>)> {
    let tag = tag.to_ascii_lowercase();
    if !valid_name(&tag) {
        return Err(PortError::invalid_element(&tag, "bad tag name"));
    }
    let mut markup = format!("<{tag}");
    for (name, value) in attrs {
        if !valid_name(name) {
            return Err(PortError::invalid_element(&tag, format!("bad attribute `{name}`")));
        }
        markup.push(' ');
        markup.push_str(name);
        markup.push_str("=\"");
        escape_into(&mut markup, value, true);
        markup.push('"');
    }
    markup.push('>');
    if let Some(text) = text {
        if RAW_TEXT.contains(&tag.as_str()) {
            markup.push_str(text);
        } else {
            escape_into(&mut markup, text, false);
        }
    }
    markup.push_str("</");
    markup.push_str(&tag);
    markup.push('>');

    let fragment = Html::parse_fragment(&markup);
    let element = fragment
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == tag)
        .ok_or_else(|| PortError::invalid_element(&tag, "not allowed in body content"))?;
    let text = element
        .first_child()
        .filter(|child| child.value().is_text())
        .map(|child| child.value().clone());
    Ok((Node::Element(element.value().clone()), text))
}

/// An element subtree validated and parsed, ready to be grafted without failing.
struct Prepared {
    element: Node,
    text: Option<Node>,
    size: BoxSize,
    children: Vec<Prepared>,
}

impl Prepared {
    fn new(spec: &ElementSpec) -> Result<Self> {
        let mut attrs = spec.attributes.clone();
        if let Some(element_id) = &spec.id {
            attrs.insert("id".to_string(), element_id.clone());
        }
        if !spec.classes.is_empty() {
            attrs.insert("class".to_string(), spec.classes.join(" "));
        }
        let (element, text) = parse_element(&spec.tag, &attrs, spec.text.as_deref())?;
        Ok(Self {
            element,
            text,
            size: spec.size(),
            children: spec
                .children
                .iter()
                .map(Prepared::new)
                .collect::<Result<_>>()?,
        })
    }
}

struct Observer {
    id: ObserverId,
    root: TreeId,
    sink: mpsc::UnboundedSender<MutationBatch>,
}

struct DomTree {
    html: Html,
    head: TreeId,
    body: TreeId,
    handles: HashMap<NodeId, TreeId>,
    nodes: HashMap<TreeId, NodeId>,
    sizes: HashMap<NodeId, BoxSize>,
    selectors: HashMap<String, Selector>,
    next_node: u64,
    next_observer: u64,
    observers: Vec<Observer>,
    location: String,
    reloads: u32,
}

impl DomTree {
    fn new(location: String) -> Self {
        let html = Html::parse_document(SKELETON);
        let root = html.root_element();
        let section = |name: &str| {
            root.children()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == name)
                .map_or_else(|| root.id(), |el| el.id())
        };
        let (head, body) = (section("head"), section("body"));
        let skeleton: Vec<TreeId> = html
            .tree
            .root()
            .descendants()
            .filter(|node| node.value().is_element())
            .map(|node| node.id())
            .collect();

        let mut tree = Self {
            html,
            head,
            body,
            handles: HashMap::new(),
            nodes: HashMap::new(),
            sizes: HashMap::new(),
            selectors: HashMap::new(),
            next_node: 1,
            next_observer: 1,
            observers: Vec::new(),
            location,
            reloads: 0,
        };
        for id in skeleton {
            tree.register(id, BoxSize::default());
        }
        tree
    }

    fn register(&mut self, id: TreeId, size: BoxSize) -> NodeId {
        let node = NodeId(self.next_node);
        self.next_node += 1;
        self.handles.insert(node, id);
        self.nodes.insert(id, node);
        self.sizes.insert(node, size);
        node
    }

    fn handle(&self, node: NodeId) -> Result<TreeId> {
        self.handles
            .get(&node)
            .copied()
            .ok_or(PortError::NodeNotFound(node))
    }

    fn node_of(&self, id: TreeId) -> Option<NodeId> {
        self.nodes.get(&id).copied()
    }

    fn element(&self, node: NodeId) -> Result<ElementRef<'_>> {
        let id = self.handle(node)?;
        self.html
            .tree
            .get(id)
            .and_then(ElementRef::wrap)
            .ok_or_else(|| PortError::internal("handle does not point at an element"))
    }

    fn selector(&mut self, selector: &str) -> Result<Selector> {
        if let Some(parsed) = self.selectors.get(selector) {
            return Ok(parsed.clone());
        }
        let parsed = Selector::parse(selector)
            .map_err(|err| PortError::invalid_selector(selector, err.to_string()))?;
        self.selectors.insert(selector.to_string(), parsed.clone());
        Ok(parsed)
    }

    fn graft(&mut self, prepared: Prepared) -> TreeId {
        let mut node = self.html.tree.orphan(prepared.element);
        if let Some(text) = prepared.text {
            node.append(text);
        }
        let id = node.id();
        self.register(id, prepared.size);
        for child in prepared.children {
            let child_id = self.graft(child);
            if let Some(mut parent) = self.html.tree.get_mut(id) {
                parent.append_id(child_id);
            }
        }
        id
    }

    /// Detach a subtree and drop every handle into it.
    fn forget(&mut self, id: TreeId) {
        let gone: Vec<TreeId> = match self.html.tree.get(id) {
            Some(node) => node.descendants().map(|n| n.id()).collect(),
            None => return,
        };
        for tree_id in gone {
            if let Some(node) = self.nodes.remove(&tree_id) {
                self.handles.remove(&node);
                self.sizes.remove(&node);
            }
        }
        if let Some(mut node) = self.html.tree.get_mut(id) {
            node.detach();
        }
    }

    fn parent_of(&self, node: NodeId) -> Result<TreeId> {
        let id = self.handle(node)?;
        self.html
            .tree
            .get(id)
            .and_then(|n| n.parent())
            .filter(|parent| parent.value().is_element())
            .map(|parent| parent.id())
            .ok_or(PortError::Detached(node))
    }

    fn text_of(&self, id: TreeId) -> String {
        self.html
            .tree
            .get(id)
            .and_then(ElementRef::wrap)
            .map(|el| el.text().collect())
            .unwrap_or_default()
    }

    fn snapshot(&self, id: TreeId) -> Option<ElementSpec> {
        let node = self.html.tree.get(id)?;
        let element = node.value().as_element()?;
        let handle = self.node_of(id)?;
        let mut attributes: BTreeMap<String, String> = element
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        let element_id = attributes.remove("id");
        let classes = attributes
            .remove("class")
            .map(|c| c.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let text: String = node
            .children()
            .filter_map(|child| child.value().as_text())
            .map(|text| &**text)
            .collect();
        let size = self.sizes.get(&handle).copied().unwrap_or_default();
        Some(ElementSpec {
            tag: element.name().to_string(),
            id: element_id,
            classes,
            attributes,
            text: (!text.is_empty()).then_some(text),
            width: (size.width > 0.0).then_some(size.width),
            height: (size.height > 0.0).then_some(size.height),
            children: node
                .children()
                .filter_map(|child| self.snapshot(child.id()))
                .collect(),
        })
    }

    fn notify(&mut self, parent: TreeId, added: Vec<NodeId>) {
        if added.is_empty() {
            return;
        }
        let Some(parent_ref) = self.html.tree.get(parent) else {
            return;
        };
        let mut closed = Vec::new();
        for observer in &self.observers {
            let inside = parent == observer.root
                || parent_ref.ancestors().any(|a| a.id() == observer.root);
            if !inside {
                continue;
            }
            let batch = MutationBatch {
                observer: observer.id,
                added: added.clone(),
            };
            if observer.sink.send(batch).is_err() {
                closed.push(observer.id);
            }
        }
        if !closed.is_empty() {
            self.observers.retain(|o| !closed.contains(&o.id));
        }
    }

    fn append(&mut self, parent: TreeId, specs: &[ElementSpec]) -> Result<Vec<NodeId>> {
        let prepared = specs
            .iter()
            .map(Prepared::new)
            .collect::<Result<Vec<_>>>()?;
        if self.html.tree.get(parent).is_none() {
            return Err(PortError::internal("append target missing"));
        }
        let mut added = Vec::with_capacity(prepared.len());
        for subtree in prepared {
            let id = self.graft(subtree);
            if let Some(mut target) = self.html.tree.get_mut(parent) {
                target.append_id(id);
            }
            added.extend(self.node_of(id));
        }
        self.notify(parent, added.clone());
        Ok(added)
    }

    fn clear_children(&mut self, parent: TreeId) {
        let children: Vec<TreeId> = match self.html.tree.get(parent) {
            Some(node) => node.children().map(|c| c.id()).collect(),
            None => return,
        };
        for child in children {
            self.forget(child);
        }
    }

    fn query(&mut self, scope: TreeId, include_scope: bool, selector: &str) -> Result<Vec<NodeId>> {
        let selector = self.selector(selector)?;
        let scope = self
            .html
            .tree
            .get(scope)
            .ok_or_else(|| PortError::internal("query scope missing"))?;
        Ok(scope
            .descendants()
            .skip(usize::from(!include_scope))
            .filter_map(ElementRef::wrap)
            .filter(|el| selector.matches(el))
            .filter_map(|el| self.node_of(el.id()))
            .collect())
    }

    /// Rebuild an element's value with edited attributes, keeping its children.
    fn edit_attributes(
        &mut self,
        node: NodeId,
        edit: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<()> {
        let (tag, mut attrs) = {
            let element = self.element(node)?;
            let attrs: BTreeMap<String, String> = element
                .value()
                .attrs()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect();
            (element.value().name().to_string(), attrs)
        };
        edit(&mut attrs);
        let (element, _) = parse_element(&tag, &attrs, None)?;
        let id = self.handle(node)?;
        if let Some(mut slot) = self.html.tree.get_mut(id) {
            *slot.value() = element;
        }
        Ok(())
    }
}

/// In-memory document adapter.
///
/// Backs the pipeline in tests and the CLI. The page is a `scraper` HTML tree, queried
/// with real CSS selectors. Every mutation made through the [`DocumentPort`] methods or
/// the page-scripting helpers below is reported to the observers registered on an
/// enclosing subtree, one batch per call.
pub struct InMemoryDocument {
    tree: Mutex<DomTree>,
}

impl InMemoryDocument {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            tree: Mutex::new(DomTree::new(location.into())),
        }
    }

    pub fn from_fixture(fixture: &PageFixture) -> Result<Self> {
        let document = Self::new(fixture.url.clone());
        document.append_children(document.body(), &fixture.body)?;
        Ok(document)
    }

    pub fn body(&self) -> NodeId {
        let tree = self.tree.lock();
        tree.node_of(tree.body).unwrap_or(NodeId(0))
    }

    pub fn head(&self) -> NodeId {
        let tree = self.tree.lock();
        tree.node_of(tree.head).unwrap_or(NodeId(0))
    }

    /// Append subtrees under `parent`, reported to observers as one batch.
    pub fn append_children(&self, parent: NodeId, specs: &[ElementSpec]) -> Result<Vec<NodeId>> {
        let mut tree = self.tree.lock();
        let parent = tree.handle(parent)?;
        tree.append(parent, specs)
    }

    pub fn append_child(&self, parent: NodeId, spec: ElementSpec) -> Result<NodeId> {
        let added = self.append_children(parent, std::slice::from_ref(&spec))?;
        added
            .first()
            .copied()
            .ok_or_else(|| PortError::internal("append produced no node"))
    }

    /// In-page navigation: change the location and swap the body for new content
    /// without a reload.
    pub fn navigate(&self, location: impl Into<String>, body: &[ElementSpec]) -> Result<Vec<NodeId>> {
        let mut tree = self.tree.lock();
        tree.location = location.into();
        let body_id = tree.body;
        tree.clear_children(body_id);
        tree.append(body_id, body)
    }

    pub fn set_location(&self, location: impl Into<String>) {
        self.tree.lock().location = location.into();
    }

    pub fn reload_count(&self) -> u32 {
        self.tree.lock().reloads
    }

    pub fn observer_count(&self) -> usize {
        self.tree.lock().observers.len()
    }

    /// Snapshot of the subtree rooted at `node`.
    pub fn outline(&self, node: NodeId) -> Option<ElementSpec> {
        let tree = self.tree.lock();
        let id = tree.handle(node).ok()?;
        tree.snapshot(id)
    }
}

impl DocumentPort for InMemoryDocument {
    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>> {
        let mut tree = self.tree.lock();
        let root = tree.html.tree.root().id();
        tree.query(root, false, selector)
    }

    fn query_within(&self, node: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let mut tree = self.tree.lock();
        let scope = tree.handle(node)?;
        tree.query(scope, false, selector)
    }

    fn matches(&self, node: NodeId, selector: &str) -> Result<bool> {
        let mut tree = self.tree.lock();
        let selector = tree.selector(selector)?;
        Ok(selector.matches(&tree.element(node)?))
    }

    fn closest(&self, node: NodeId, selector: &str) -> Result<Option<NodeId>> {
        let mut tree = self.tree.lock();
        let selector = tree.selector(selector)?;
        let element = tree.element(node)?;
        let found = std::iter::once(*element)
            .chain(element.ancestors())
            .filter_map(ElementRef::wrap)
            .find(|el| selector.matches(el))
            .and_then(|el| tree.node_of(el.id()));
        Ok(found)
    }

    fn is_connected(&self, node: NodeId) -> bool {
        self.tree.lock().handles.contains_key(&node)
    }

    fn text_content(&self, node: NodeId) -> Result<String> {
        let tree = self.tree.lock();
        let id = tree.handle(node)?;
        Ok(tree.text_of(id))
    }

    fn measure(&self, node: NodeId) -> Result<BoxSize> {
        let tree = self.tree.lock();
        tree.handle(node)?;
        Ok(tree.sizes.get(&node).copied().unwrap_or_default())
    }

    fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>> {
        let tree = self.tree.lock();
        let element = tree.element(node)?;
        Ok(element.value().attr(name).map(str::to_string))
    }

    fn set_attribute(&self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.tree.lock().edit_attributes(node, |attrs| {
            attrs.insert(name.to_string(), value.to_string());
        })
    }

    fn remove_attribute(&self, node: NodeId, name: &str) -> Result<()> {
        self.tree.lock().edit_attributes(node, |attrs| {
            attrs.remove(name);
        })
    }

    fn replace_node(&self, old: NodeId, replacement: ElementSpec) -> Result<NodeId> {
        let mut tree = self.tree.lock();
        let parent = tree.parent_of(old)?;
        let old_id = tree.handle(old)?;
        let prepared = Prepared::new(&replacement)?;
        let new_id = tree.graft(prepared);
        if let Some(mut slot) = tree.html.tree.get_mut(old_id) {
            slot.insert_id_before(new_id);
        }
        tree.forget(old_id);
        let new_node = tree
            .node_of(new_id)
            .ok_or_else(|| PortError::internal("replacement was not registered"))?;
        trace!(%old, new = %new_node, "replaced node");
        tree.notify(parent, vec![new_node]);
        Ok(new_node)
    }

    fn remove_node(&self, node: NodeId) -> Result<()> {
        let mut tree = self.tree.lock();
        tree.parent_of(node)?;
        let id = tree.handle(node)?;
        tree.forget(id);
        Ok(())
    }

    fn prepend_child(&self, parent: NodeId, spec: ElementSpec) -> Result<NodeId> {
        let mut tree = self.tree.lock();
        let parent_id = tree.handle(parent)?;
        let prepared = Prepared::new(&spec)?;
        let id = tree.graft(prepared);
        if let Some(mut target) = tree.html.tree.get_mut(parent_id) {
            target.prepend_id(id);
        }
        let node = tree
            .node_of(id)
            .ok_or_else(|| PortError::internal("prepended node was not registered"))?;
        tree.notify(parent_id, vec![node]);
        Ok(node)
    }

    fn insert_style(&self, marker: &str, css: &str) -> Result<NodeId> {
        let mut tree = self.tree.lock();
        let head = tree.head;
        let spec = ElementSpec::new("style").with_id(marker).with_text(css);
        let added = tree.append(head, std::slice::from_ref(&spec))?;
        added
            .first()
            .copied()
            .ok_or_else(|| PortError::internal("style insert produced no node"))
    }

    fn remove_style(&self, marker: &str) -> Result<usize> {
        let mut tree = self.tree.lock();
        let head = tree.head;
        let styles: Vec<NodeId> = tree
            .query(head, false, "style")?
            .into_iter()
            .filter(|node| {
                tree.element(*node)
                    .is_ok_and(|el| el.value().attr("id") == Some(marker))
            })
            .collect();
        for style in &styles {
            let id = tree.handle(*style)?;
            tree.forget(id);
        }
        Ok(styles.len())
    }

    fn location(&self) -> String {
        self.tree.lock().location.clone()
    }

    fn reload(&self) -> Result<()> {
        self.tree.lock().reloads += 1;
        Ok(())
    }

    fn observe_subtree(
        &self,
        root: NodeId,
        sink: mpsc::UnboundedSender<MutationBatch>,
    ) -> Result<ObserverId> {
        let mut tree = self.tree.lock();
        let root = tree.handle(root)?;
        let id = ObserverId(tree.next_observer);
        tree.next_observer += 1;
        tree.observers.push(Observer { id, root, sink });
        Ok(id)
    }

    fn disconnect(&self, observer: ObserverId) {
        self.tree.lock().observers.retain(|o| o.id != observer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(title: &str) -> ElementSpec {
        ElementSpec::new("ytd-video-renderer")
            .with_size(300.0, 170.0)
            .with_child(ElementSpec::new("a").with_id("video-title").with_text(title))
    }

    #[test]
    fn query_and_text() {
        let doc = InMemoryDocument::new("https://www.youtube.com/");
        let body = doc.body();
        let ids = doc.append_children(body, &[video("One"), video("Two")]).unwrap();
        assert_eq!(doc.query_all("ytd-video-renderer").unwrap(), ids);
        assert_eq!(doc.text_content(ids[1]).unwrap(), "Two");
        let titles = doc.query_within(ids[0], "#video-title").unwrap();
        assert_eq!(titles.len(), 1);
        assert!(doc.query_within(ids[0], "ytd-video-renderer").unwrap().is_empty());
        assert_eq!(doc.closest(titles[0], "ytd-video-renderer").unwrap(), Some(ids[0]));
        assert_eq!(doc.closest(ids[0], "ytd-video-renderer").unwrap(), Some(ids[0]));
        assert_eq!(doc.closest(body, "ytd-video-renderer").unwrap(), None);
        assert!(doc.matches(ids[0], "body ytd-video-renderer").unwrap());
        assert!(doc.matches(ids[0], "body > ytd-video-renderer:first-child").unwrap());
        assert!(!doc.matches(titles[0], "ytd-video-renderer").unwrap());
        assert_eq!(doc.measure(ids[0]).unwrap(), BoxSize::new(300.0, 170.0));
    }

    #[test]
    fn attributes_are_rewritten_in_place() {
        let doc = InMemoryDocument::new("https://www.youtube.com/");
        let id = doc.append_child(doc.body(), video("Quote \"this\" & that")).unwrap();
        doc.set_attribute(id, "data-state", "a \"b\" & c").unwrap();
        assert_eq!(
            doc.attribute(id, "data-state").unwrap().as_deref(),
            Some("a \"b\" & c")
        );
        assert!(doc.matches(id, "[data-state]").unwrap());
        // children survive an attribute edit
        assert_eq!(doc.text_content(id).unwrap(), "Quote \"this\" & that");
        doc.remove_attribute(id, "data-state").unwrap();
        assert_eq!(doc.attribute(id, "data-state").unwrap(), None);
        assert!(doc.set_attribute(id, "bad name", "x").is_err());
    }

    #[test]
    fn replace_keeps_position_and_drops_subtree() {
        let doc = InMemoryDocument::new("https://www.youtube.com/");
        let body = doc.body();
        let ids = doc
            .append_children(body, &[video("One"), video("Two"), video("Three")])
            .unwrap();
        let title = doc.query_within(ids[1], "#video-title").unwrap()[0];
        let placeholder = doc
            .replace_node(ids[1], ElementSpec::new("div").with_class("stand-in"))
            .unwrap();
        assert!(!doc.is_connected(ids[1]));
        assert!(!doc.is_connected(title));
        let order = doc.query_all("ytd-video-renderer, div.stand-in").unwrap();
        assert_eq!(order, vec![ids[0], placeholder, ids[2]]);
        assert_eq!(
            doc.replace_node(ids[1], ElementSpec::new("div")),
            Err(PortError::NodeNotFound(ids[1]))
        );
    }

    #[test]
    fn prepend_puts_node_first() {
        let doc = InMemoryDocument::new("https://www.youtube.com/");
        let body = doc.body();
        let later = doc.append_child(body, video("Later")).unwrap();
        let first = doc
            .prepend_child(body, ElementSpec::new("div").with_id("header"))
            .unwrap();
        assert_eq!(doc.query_all("body > *").unwrap(), vec![first, later]);
        assert!(doc.matches(first, "body > div:first-child").unwrap());
    }

    #[test]
    fn rejected_spec_leaves_no_trace() {
        let doc = InMemoryDocument::new("https://www.youtube.com/");
        let before = doc.query_all("*").unwrap().len();
        let bad = video("ok").with_child(ElementSpec::new("not a tag"));
        assert!(matches!(
            doc.append_child(doc.body(), bad),
            Err(PortError::InvalidElement { .. })
        ));
        assert_eq!(doc.query_all("*").unwrap().len(), before);
    }

    #[tokio::test]
    async fn observers_receive_batches_until_disconnected() {
        let doc = InMemoryDocument::new("https://www.youtube.com/");
        let body = doc.body();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let observer = doc.observe_subtree(body, tx).unwrap();

        let ids = doc.append_children(body, &[video("A"), video("B")]).unwrap();
        let batch = rx.recv().await.unwrap();
        assert_eq!(batch.observer, observer);
        assert_eq!(batch.added, ids);

        // insertions into the head are outside the observed subtree
        doc.insert_style("marker", "p > a { color: red }").unwrap();
        assert!(rx.try_recv().is_err());
        let style = doc.query_all("head style#marker").unwrap();
        assert_eq!(doc.text_content(style[0]).unwrap(), "p > a { color: red }");
        assert_eq!(doc.remove_style("marker").unwrap(), 1);
        assert_eq!(doc.remove_style("marker").unwrap(), 0);

        doc.disconnect(observer);
        doc.append_child(body, video("C")).unwrap();
        assert!(rx.try_recv().is_err());
        assert_eq!(doc.observer_count(), 0);
    }

    #[test]
    fn navigate_swaps_body_content() {
        let doc = InMemoryDocument::new("https://www.youtube.com/");
        let old = doc.append_child(doc.body(), video("Old")).unwrap();
        let new = doc
            .navigate("https://www.youtube.com/watch?v=1", &[video("New")])
            .unwrap();
        assert!(!doc.is_connected(old));
        assert_eq!(doc.query_all("ytd-video-renderer").unwrap(), new);
        assert_eq!(doc.location(), "https://www.youtube.com/watch?v=1");
    }

    #[test]
    fn outline_round_trips_attributes() {
        let doc = InMemoryDocument::new("https://www.youtube.com/");
        let spec = ElementSpec::new("div")
            .with_id("x")
            .with_class("a")
            .with_class("b")
            .with_attr("data-k", "v")
            .with_text("hi <there>");
        let id = doc.append_child(doc.body(), spec.clone()).unwrap();
        assert_eq!(doc.outline(id).unwrap(), spec);
    }
}
