//! The host document arena.
//!
//! Nodes live in generational slots; a destroyed node's [`NodeId`] goes
//! stale and any later dereference panics (the arena equivalent of an
//! out-of-bounds index). Structural misuse that a caller can plausibly
//! produce (inserting before a non-child, attaching a node to its own
//! descendant, element ops on text) returns [`DomError`] instead.

use compact_str::CompactString;

use super::node::{ChildList, HostElement, HostNode, HostText, NodeMeta};
use super::{Namespace, NodeId, NodeKind};
use crate::attr::{AttrValue, Attrs, AttrsExt};
use crate::component::ComponentLink;
use crate::error::{DomError, DomResult};
use crate::vnode::Key;

// =============================================================================
// MutationStats
// =============================================================================

/// Counters for every host-platform mutation performed on a document.
///
/// Reconciliation properties (idempotence, the text fast path) are stated
/// in terms of these counters.
#[derive(Debug, Default, Clone, Copy)]
#[must_use]
pub struct MutationStats {
    /// Element/text nodes freshly allocated.
    pub nodes_created: usize,
    /// Element nodes handed out of the recycle pool instead of allocated.
    pub nodes_recycled: usize,
    /// Element nodes returned to the recycle pool.
    pub nodes_pooled: usize,
    /// Nodes freed from the arena.
    pub nodes_destroyed: usize,
    /// Text-value writes.
    pub text_writes: usize,
    /// Attribute writes.
    pub attr_writes: usize,
    /// Attribute removals (counted only when the attribute was present).
    pub attr_removals: usize,
    /// Child appends.
    pub appends: usize,
    /// Child insertions before an anchor.
    pub inserts: usize,
    /// Explicit detaches (implicit re-parenting is counted by the
    /// append/insert that caused it).
    pub detaches: usize,
}

impl MutationStats {
    /// Total number of mutations of any kind.
    pub fn total_mutations(&self) -> usize {
        self.nodes_created
            + self.nodes_recycled
            + self.nodes_pooled
            + self.nodes_destroyed
            + self.text_writes
            + self.attr_writes
            + self.attr_removals
            + self.appends
            + self.inserts
            + self.detaches
    }
}

// =============================================================================
// HostDocument
// =============================================================================

#[derive(Debug, Clone)]
struct Entry {
    parent: Option<NodeId>,
    node: HostNode,
}

#[derive(Debug, Clone)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// The live, mutable host tree.
#[derive(Debug, Default)]
pub struct HostDocument {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    stats: MutationStats,
}

fn entry_in(slots: &[Slot], id: NodeId) -> &Entry {
    match slots.get(id.index()) {
        Some(slot) if slot.generation == id.generation() => match &slot.entry {
            Some(entry) => entry,
            None => panic!("stale NodeId {id}: node was destroyed"),
        },
        _ => panic!("stale NodeId {id}: node was destroyed"),
    }
}

fn entry_in_mut(slots: &mut [Slot], id: NodeId) -> &mut Entry {
    match slots.get_mut(id.index()) {
        Some(slot) if slot.generation == id.generation() => match &mut slot.entry {
            Some(entry) => entry,
            None => panic!("stale NodeId {id}: node was destroyed"),
        },
        _ => panic!("stale NodeId {id}: node was destroyed"),
    }
}

impl HostDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Node creation
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a detached element node in the HTML namespace.
    pub fn create_element(&mut self, tag: impl Into<CompactString>) -> NodeId {
        self.create_element_ns(tag, Namespace::Html)
    }

    /// Create a detached element node in the given namespace.
    pub fn create_element_ns(
        &mut self,
        tag: impl Into<CompactString>,
        namespace: Namespace,
    ) -> NodeId {
        self.alloc(HostNode::Element(HostElement {
            tag: tag.into(),
            namespace,
            attrs: Vec::new(),
            children: ChildList::new(),
            meta: None,
        }))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, value: impl Into<CompactString>) -> NodeId {
        self.alloc(HostNode::Text(HostText {
            value: value.into(),
            managed: false,
        }))
    }

    fn alloc(&mut self, node: HostNode) -> NodeId {
        self.stats.nodes_created += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.entry = Some(Entry { parent: None, node });
            NodeId::from_raw_parts(index, slot.generation)
        } else {
            self.slots.push(Slot {
                generation: 0,
                entry: Some(Entry { parent: None, node }),
            });
            NodeId::from_raw_parts((self.slots.len() - 1) as u32, 0)
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Check whether an id still addresses a live node.
    pub fn contains(&self, id: NodeId) -> bool {
        self.slots
            .get(id.index())
            .is_some_and(|s| s.generation == id.generation() && s.entry.is_some())
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.entry.is_some()).count()
    }

    /// Category of a node.
    pub fn kind(&self, id: NodeId) -> NodeKind {
        match &entry_in(&self.slots, id).node {
            HostNode::Element(_) => NodeKind::Element,
            HostNode::Text(_) => NodeKind::Text,
        }
    }

    /// Check if a node is an element.
    pub fn is_element(&self, id: NodeId) -> bool {
        self.kind(id) == NodeKind::Element
    }

    /// Check if a node is a text node.
    pub fn is_text(&self, id: NodeId) -> bool {
        self.kind(id) == NodeKind::Text
    }

    /// Tag name of an element node (original casing).
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &entry_in(&self.slots, id).node {
            HostNode::Element(e) => Some(&e.tag),
            HostNode::Text(_) => None,
        }
    }

    /// Namespace of an element node.
    pub fn namespace(&self, id: NodeId) -> Option<Namespace> {
        match &entry_in(&self.slots, id).node {
            HostNode::Element(e) => Some(e.namespace),
            HostNode::Text(_) => None,
        }
    }

    /// Value of a text node.
    pub fn text_value(&self, id: NodeId) -> Option<&str> {
        match &entry_in(&self.slots, id).node {
            HostNode::Text(t) => Some(&t.value),
            HostNode::Element(_) => None,
        }
    }

    /// Live attribute value on an element.
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&AttrValue> {
        self.attrs(id).and_then(|a| a.get_attr(name))
    }

    /// Live attribute storage of an element.
    pub fn attrs(&self, id: NodeId) -> Option<&Attrs> {
        match &entry_in(&self.slots, id).node {
            HostNode::Element(e) => Some(&e.attrs),
            HostNode::Text(_) => None,
        }
    }

    /// Parent of a node, if attached.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        entry_in(&self.slots, id).parent
    }

    /// Children of a node (empty for text nodes).
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        match &entry_in(&self.slots, id).node {
            HostNode::Element(e) => &e.children,
            HostNode::Text(_) => &[],
        }
    }

    /// Number of children.
    pub fn child_count(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// Child at the given index.
    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    /// First child, if any.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.child_at(id, 0)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations (counted)
    // ─────────────────────────────────────────────────────────────────────────

    /// Write a text node's value.
    pub fn set_text(&mut self, id: NodeId, value: impl Into<CompactString>) -> DomResult<()> {
        match &mut entry_in_mut(&mut self.slots, id).node {
            HostNode::Text(t) => t.value = value.into(),
            HostNode::Element(_) => return Err(DomError::NotAText(id)),
        }
        self.stats.text_writes += 1;
        Ok(())
    }

    /// Write an attribute via the HTML accessor.
    pub fn set_attr(
        &mut self,
        id: NodeId,
        name: impl Into<CompactString>,
        value: impl Into<AttrValue>,
    ) -> DomResult<()> {
        self.set_attr_ns(id, name, value, Namespace::Html)
    }

    /// Write an attribute via the accessor for the given namespace.
    ///
    /// Both accessors share the same storage in this in-process host; the
    /// parameter mirrors the platform's namespaced/plain accessor split so
    /// the attribute differ can thread SVG mode through.
    pub fn set_attr_ns(
        &mut self,
        id: NodeId,
        name: impl Into<CompactString>,
        value: impl Into<AttrValue>,
        _namespace: Namespace,
    ) -> DomResult<()> {
        match &mut entry_in_mut(&mut self.slots, id).node {
            HostNode::Element(e) => e.attrs.set_attr(name, value),
            HostNode::Text(_) => return Err(DomError::NotAnElement(id)),
        }
        self.stats.attr_writes += 1;
        Ok(())
    }

    /// Remove an attribute from an element.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> DomResult<()> {
        let removed = match &mut entry_in_mut(&mut self.slots, id).node {
            HostNode::Element(e) => e.attrs.remove_attr(name).is_some(),
            HostNode::Text(_) => return Err(DomError::NotAnElement(id)),
        };
        if removed {
            self.stats.attr_removals += 1;
        }
        Ok(())
    }

    /// Append `child` as the last child of `parent`, detaching it from its
    /// current parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        if !self.is_element(parent) {
            return Err(DomError::NotAnElement(parent));
        }
        if self.would_cycle(parent, child) {
            return Err(DomError::WouldCycle { node: child });
        }
        self.detach_internal(child);
        if let HostNode::Element(e) = &mut entry_in_mut(&mut self.slots, parent).node {
            e.children.push(child);
        }
        entry_in_mut(&mut self.slots, child).parent = Some(parent);
        self.stats.appends += 1;
        Ok(())
    }

    /// Insert `child` immediately before `before` under `parent`,
    /// detaching it from its current parent first. Inserting a node before
    /// itself is a no-op.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: NodeId,
    ) -> DomResult<()> {
        if !self.is_element(parent) {
            return Err(DomError::NotAnElement(parent));
        }
        if before == child {
            return Ok(());
        }
        if self.parent(before) != Some(parent) {
            return Err(DomError::NotAChild {
                child: before,
                parent,
            });
        }
        if self.would_cycle(parent, child) {
            return Err(DomError::WouldCycle { node: child });
        }
        self.detach_internal(child);
        if let HostNode::Element(e) = &mut entry_in_mut(&mut self.slots, parent).node {
            let index = e
                .children
                .iter()
                .position(|&c| c == before)
                .unwrap_or(e.children.len());
            e.children.insert(index, child);
        }
        entry_in_mut(&mut self.slots, child).parent = Some(parent);
        self.stats.inserts += 1;
        Ok(())
    }

    /// Detach a node from its parent. Returns whether it was attached.
    pub fn detach(&mut self, child: NodeId) -> bool {
        let detached = self.detach_internal(child);
        if detached {
            self.stats.detaches += 1;
        }
        detached
    }

    fn detach_internal(&mut self, child: NodeId) -> bool {
        let Some(parent) = entry_in(&self.slots, child).parent else {
            return false;
        };
        if let HostNode::Element(e) = &mut entry_in_mut(&mut self.slots, parent).node {
            e.children.retain(|c| *c != child);
        }
        entry_in_mut(&mut self.slots, child).parent = None;
        true
    }

    /// Free a node's slot, invalidating its id. Remaining children are
    /// left alive but orphaned; callers reclaiming a subtree detach the
    /// children first.
    pub fn destroy(&mut self, id: NodeId) {
        self.detach_internal(id);
        let children: ChildList = match &entry_in(&self.slots, id).node {
            HostNode::Element(e) => e.children.clone(),
            HostNode::Text(_) => ChildList::new(),
        };
        for child in children {
            entry_in_mut(&mut self.slots, child).parent = None;
        }
        let slot = &mut self.slots[id.index()];
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index() as u32);
        self.stats.nodes_destroyed += 1;
    }

    fn would_cycle(&self, parent: NodeId, child: NodeId) -> bool {
        let mut current = Some(parent);
        while let Some(node) = current {
            if node == child {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Attached metadata
    // ─────────────────────────────────────────────────────────────────────────

    /// Attached metadata of an element, if managed.
    pub fn meta(&self, id: NodeId) -> Option<&NodeMeta> {
        match &entry_in(&self.slots, id).node {
            HostNode::Element(e) => e.meta.as_deref(),
            HostNode::Text(_) => None,
        }
    }

    /// Mutable attached metadata of an element, if managed.
    pub fn meta_mut(&mut self, id: NodeId) -> Option<&mut NodeMeta> {
        match &mut entry_in_mut(&mut self.slots, id).node {
            HostNode::Element(e) => e.meta.as_deref_mut(),
            HostNode::Text(_) => None,
        }
    }

    /// Attached metadata of an element, created empty if absent.
    ///
    /// # Panics
    ///
    /// Panics when called on a text node; text nodes carry only the
    /// managed flag (see [`HostDocument::mark_managed`]).
    pub fn ensure_meta(&mut self, id: NodeId) -> &mut NodeMeta {
        match &mut entry_in_mut(&mut self.slots, id).node {
            HostNode::Element(e) => &mut **e.meta.get_or_insert_with(Box::default),
            HostNode::Text(_) => panic!("ensure_meta on text node {id}"),
        }
    }

    /// Whether the node was produced (or adopted) by the reconciler.
    pub fn is_managed(&self, id: NodeId) -> bool {
        match &entry_in(&self.slots, id).node {
            HostNode::Element(e) => e.meta.is_some(),
            HostNode::Text(t) => t.managed,
        }
    }

    /// Mark a node as reconciler-managed: attaches empty metadata to an
    /// element, sets the managed flag on a text node.
    pub fn mark_managed(&mut self, id: NodeId) {
        match &mut entry_in_mut(&mut self.slots, id).node {
            HostNode::Element(e) => {
                e.meta.get_or_insert_with(Box::default);
            }
            HostNode::Text(t) => t.managed = true,
        }
    }

    /// Component attachment of a node, if any.
    pub fn component(&self, id: NodeId) -> Option<&ComponentLink> {
        self.meta(id).and_then(|m| m.component.as_ref())
    }

    /// Attach a component instance to an element. Replaces any previous
    /// attachment.
    pub fn attach_component(&mut self, id: NodeId, link: ComponentLink) -> DomResult<()> {
        if !self.is_element(id) {
            return Err(DomError::NotAnElement(id));
        }
        self.ensure_meta(id).component = Some(link);
        Ok(())
    }

    /// Clear the component attachment of a node, if present.
    pub fn clear_component(&mut self, id: NodeId) {
        if let Some(meta) = self.meta_mut(id) {
            meta.component = None;
        }
    }

    /// Reconciliation key of a host child: the attached component's
    /// declared key when a component is present, else the cached explicit
    /// key.
    pub fn node_key(&self, id: NodeId) -> Option<Key> {
        let meta = self.meta(id)?;
        match &meta.component {
            Some(link) => link.key.clone(),
            None => meta.key.clone(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Stats
    // ─────────────────────────────────────────────────────────────────────────

    /// Mutation counters accumulated so far.
    pub fn stats(&self) -> &MutationStats {
        &self.stats
    }

    /// Reset the mutation counters.
    pub fn reset_stats(&mut self) {
        self.stats = MutationStats::default();
    }

    pub(crate) fn note_recycled(&mut self) {
        self.stats.nodes_recycled += 1;
    }

    pub(crate) fn note_pooled(&mut self) {
        self.stats.nodes_pooled += 1;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Serialization (for assertions and diagnostics)
    // ─────────────────────────────────────────────────────────────────────────

    /// Render a subtree as HTML-ish markup.
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        match &entry_in(&self.slots, id).node {
            HostNode::Text(t) => out.push_str(&t.value),
            HostNode::Element(e) => {
                out.push('<');
                out.push_str(&e.tag);
                for (name, value) in &e.attrs {
                    match value {
                        AttrValue::Null | AttrValue::Bool(false) => {}
                        AttrValue::Bool(true) => {
                            out.push(' ');
                            out.push_str(name);
                        }
                        AttrValue::Text(text) => {
                            out.push(' ');
                            out.push_str(name);
                            out.push_str("=\"");
                            out.push_str(text);
                            out.push('"');
                        }
                    }
                }
                out.push('>');
                for &child in &e.children {
                    self.write_html(child, out);
                }
                out.push_str("</");
                out.push_str(&e.tag);
                out.push('>');
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_read() {
        let mut doc = HostDocument::new();
        let div = doc.create_element("div");
        let text = doc.create_text("hello");

        assert_eq!(doc.kind(div), NodeKind::Element);
        assert_eq!(doc.tag(div), Some("div"));
        assert_eq!(doc.namespace(div), Some(Namespace::Html));
        assert_eq!(doc.text_value(text), Some("hello"));
        assert_eq!(doc.parent(div), None);
        assert_eq!(doc.node_count(), 2);
        assert_eq!(doc.stats().nodes_created, 2);
    }

    #[test]
    fn test_append_and_insert() {
        let mut doc = HostDocument::new();
        let parent = doc.create_element("ul");
        let a = doc.create_element("li");
        let b = doc.create_element("li");
        let c = doc.create_element("li");

        doc.append_child(parent, a).unwrap();
        doc.append_child(parent, c).unwrap();
        doc.insert_before(parent, b, c).unwrap();

        assert_eq!(doc.children(parent), &[a, b, c]);
        assert_eq!(doc.parent(b), Some(parent));

        // Re-inserting an attached child moves it.
        doc.insert_before(parent, c, a).unwrap();
        assert_eq!(doc.children(parent), &[c, a, b]);
    }

    #[test]
    fn test_structural_errors() {
        let mut doc = HostDocument::new();
        let parent = doc.create_element("div");
        let other = doc.create_element("div");
        let child = doc.create_element("span");
        let text = doc.create_text("x");

        doc.append_child(other, child).unwrap();

        assert!(matches!(
            doc.append_child(text, child),
            Err(DomError::NotAnElement(_))
        ));
        assert!(matches!(
            doc.insert_before(parent, text, child),
            Err(DomError::NotAChild { .. })
        ));
        assert!(matches!(
            doc.set_text(parent, "x"),
            Err(DomError::NotAText(_))
        ));

        // A node cannot become its own descendant.
        doc.append_child(parent, other).unwrap();
        assert!(matches!(
            doc.append_child(child, parent),
            Err(DomError::WouldCycle { .. })
        ));
    }

    #[test]
    fn test_detach_and_destroy() {
        let mut doc = HostDocument::new();
        let parent = doc.create_element("div");
        let child = doc.create_element("span");
        doc.append_child(parent, child).unwrap();

        assert!(doc.detach(child));
        assert_eq!(doc.parent(child), None);
        assert!(doc.children(parent).is_empty());
        assert!(!doc.detach(child));

        doc.destroy(child);
        assert!(!doc.contains(child));
        assert_eq!(doc.stats().nodes_destroyed, 1);

        // The freed slot is reused under a new generation.
        let fresh = doc.create_element("em");
        assert!(doc.contains(fresh));
        assert_ne!(fresh, child);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn test_stale_id_panics() {
        let mut doc = HostDocument::new();
        let node = doc.create_element("div");
        doc.destroy(node);
        let _ = doc.tag(node);
    }

    #[test]
    fn test_attr_mutations_counted() {
        let mut doc = HostDocument::new();
        let div = doc.create_element("div");

        doc.set_attr(div, "class", "a").unwrap();
        doc.set_attr(div, "class", "b").unwrap();
        doc.remove_attr(div, "class").unwrap();
        doc.remove_attr(div, "missing").unwrap();

        assert_eq!(doc.stats().attr_writes, 2);
        assert_eq!(doc.stats().attr_removals, 1);
        assert_eq!(doc.attr(div, "class"), None);
    }

    #[test]
    fn test_managed_flags() {
        let mut doc = HostDocument::new();
        let div = doc.create_element("div");
        let text = doc.create_text("x");

        assert!(!doc.is_managed(div));
        assert!(!doc.is_managed(text));

        doc.mark_managed(div);
        doc.mark_managed(text);
        assert!(doc.is_managed(div));
        assert!(doc.is_managed(text));
        assert!(doc.meta(div).is_some());
    }

    #[test]
    fn test_node_key_prefers_component_key() {
        use crate::component::{ComponentLink, CtorId, InstanceId};

        let mut doc = HostDocument::new();
        let div = doc.create_element("div");
        doc.ensure_meta(div).key = Some(Key::new("attr-key"));
        assert_eq!(doc.node_key(div), Some(Key::new("attr-key")));

        doc.attach_component(
            div,
            ComponentLink {
                instance: InstanceId::new(1),
                ctor: CtorId::new(1),
                key: Some(Key::new("component-key")),
            },
        )
        .unwrap();
        assert_eq!(doc.node_key(div), Some(Key::new("component-key")));
    }

    #[test]
    fn test_outer_html() {
        let mut doc = HostDocument::new();
        let div = doc.create_element("div");
        let em = doc.create_element("em");
        let text = doc.create_text("x");
        doc.set_attr(div, "class", "note").unwrap();
        doc.set_attr(div, "hidden", true).unwrap();
        doc.append_child(div, em).unwrap();
        doc.append_child(em, text).unwrap();

        assert_eq!(
            doc.outer_html(div),
            "<div class=\"note\" hidden><em>x</em></div>"
        );
    }
}
