//! Host-node recycle pool.
//!
//! Discarded element nodes are detached and parked here keyed by
//! normalized tag name, then handed back out instead of allocating when a
//! node of the same kind is needed. A pooled node acquires a new identity
//! the instant it is handed out: only its component association is cleared
//! on release; attributes are deliberately left in place for the next
//! attribute diff to reconcile against.

use compact_str::CompactString;
use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::host::{HostDocument, Namespace, NodeId};

/// Lowercased tag name, the pool key and the cached form stamped onto
/// managed nodes.
pub(crate) fn normalized(tag: &str) -> CompactString {
    CompactString::from(tag.to_ascii_lowercase())
}

// =============================================================================
// RecyclerConfig
// =============================================================================

/// Configuration for the recycle pool.
///
/// The pool is bounded per tag so churn-heavy workloads cannot grow the
/// arena without limit; releases beyond the bound report not-pooled and
/// the node is destroyed by reclamation instead.
#[derive(Debug, Clone, Copy)]
pub struct RecyclerConfig {
    /// Maximum pooled nodes per normalized tag name. Default: 32.
    pub max_per_tag: usize,
}

impl Default for RecyclerConfig {
    fn default() -> Self {
        Self { max_per_tag: 32 }
    }
}

impl RecyclerConfig {
    /// Create a config with a custom per-tag bound.
    pub fn new(max_per_tag: usize) -> Self {
        Self { max_per_tag }
    }

    /// No bound: every released node is pooled.
    pub fn unbounded() -> Self {
        Self {
            max_per_tag: usize::MAX,
        }
    }

    /// Small pool for memory-tight embeddings.
    pub fn small() -> Self {
        Self { max_per_tag: 4 }
    }
}

// =============================================================================
// Recycler
// =============================================================================

/// Pool of detached, component-cleared element nodes awaiting reuse.
#[derive(Debug, Default)]
pub struct Recycler {
    pool: FxHashMap<CompactString, Vec<NodeId>>,
    config: RecyclerConfig,
}

impl Recycler {
    /// Create a pool with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pool with a custom configuration.
    pub fn with_config(config: RecyclerConfig) -> Self {
        Self {
            pool: FxHashMap::default(),
            config,
        }
    }

    /// The active configuration.
    pub fn config(&self) -> RecyclerConfig {
        self.config
    }

    /// Hand out a node of the given tag: a pooled one when available,
    /// otherwise a fresh element in the requested namespace. Always stamps
    /// the normalized tag name onto the returned node.
    pub fn acquire(&mut self, doc: &mut HostDocument, tag: &str, svg: bool) -> NodeId {
        let name = normalized(tag);
        if let Some(node) = self.pool.get_mut(&name).and_then(|bucket| bucket.pop()) {
            trace!(%tag, "recycle pool hit");
            doc.note_recycled();
            doc.ensure_meta(node).normalized_tag = name;
            return node;
        }
        let namespace = if svg { Namespace::Svg } else { Namespace::Html };
        let node = doc.create_element_ns(tag, namespace);
        doc.ensure_meta(node).normalized_tag = name;
        node
    }

    /// Park an element node for reuse: detach it, clear its component
    /// back-reference, pool it under its normalized tag. Returns whether
    /// the node was pooled: `false` for text nodes and when the per-tag
    /// bound is reached, in which case the caller owns disposal.
    pub fn release(&mut self, doc: &mut HostDocument, node: NodeId) -> bool {
        doc.detach(node);
        if !doc.is_element(node) {
            return false;
        }
        doc.clear_component(node);

        let name = match doc.meta(node).map(|m| m.normalized_tag.clone()) {
            Some(cached) if !cached.is_empty() => cached,
            _ => {
                let fresh = normalized(doc.tag(node).unwrap_or(""));
                doc.ensure_meta(node).normalized_tag = fresh.clone();
                fresh
            }
        };

        let bucket = self.pool.entry(name.clone()).or_default();
        if bucket.len() >= self.config.max_per_tag {
            debug!(tag = %name, cap = self.config.max_per_tag, "recycle pool full; releasing node for disposal");
            return false;
        }
        bucket.push(node);
        doc.note_pooled();
        true
    }

    /// Total pooled nodes across all tags.
    pub fn pooled_count(&self) -> usize {
        self.pool.values().map(Vec::len).sum()
    }

    /// Pooled nodes for one tag.
    pub fn pooled_for(&self, tag: &str) -> usize {
        self.pool.get(&normalized(tag)).map_or(0, Vec::len)
    }

    /// Destroy every pooled node and empty the pool.
    pub fn clear(&mut self, doc: &mut HostDocument) {
        for (_, bucket) in self.pool.drain() {
            for node in bucket {
                doc.destroy(node);
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
    use crate::component::{ComponentLink, CtorId, InstanceId};

    #[test]
    fn test_round_trip_returns_same_node() {
        let mut doc = HostDocument::new();
        let mut recycler = Recycler::new();

        let node = doc.create_element("div");
        assert!(recycler.release(&mut doc, node));
        assert_eq!(recycler.pooled_for("div"), 1);

        let reused = recycler.acquire(&mut doc, "div", false);
        assert_eq!(reused, node);
        assert_eq!(recycler.pooled_for("div"), 0);
        assert_eq!(doc.stats().nodes_recycled, 1);
    }

    #[test]
    fn test_miss_creates_in_requested_namespace() {
        let mut doc = HostDocument::new();
        let mut recycler = Recycler::new();

        let svg = recycler.acquire(&mut doc, "circle", true);
        assert_eq!(doc.namespace(svg), Some(Namespace::Svg));
        assert_eq!(
            doc.meta(svg).map(|m| m.normalized_tag.as_str()),
            Some("circle")
        );

        let html = recycler.acquire(&mut doc, "DIV", false);
        assert_eq!(doc.namespace(html), Some(Namespace::Html));
        assert_eq!(doc.meta(html).map(|m| m.normalized_tag.as_str()), Some("div"));
    }

    #[test]
    fn test_release_clears_component_but_not_attrs() {
        let mut doc = HostDocument::new();
        let mut recycler = Recycler::new();

        let node = doc.create_element("input");
        doc.set_attr(node, "value", "typed").unwrap();
        doc.attach_component(
            node,
            ComponentLink {
                instance: InstanceId::new(1),
                ctor: CtorId::new(1),
                key: None,
            },
        )
        .unwrap();

        assert!(recycler.release(&mut doc, node));
        assert!(doc.component(node).is_none());
        assert_eq!(doc.attr(node, "value"), Some(&"typed".into()));
    }

    #[test]
    fn test_bound_rejects_overflow() {
        let mut doc = HostDocument::new();
        let mut recycler = Recycler::with_config(RecyclerConfig::new(1));

        let a = doc.create_element("div");
        let b = doc.create_element("div");
        assert!(recycler.release(&mut doc, a));
        assert!(!recycler.release(&mut doc, b));
        assert_eq!(recycler.pooled_for("div"), 1);
    }

    #[test]
    fn test_clear_destroys_pooled_nodes() {
        let mut doc = HostDocument::new();
        let mut recycler = Recycler::new();

        let node = doc.create_element("div");
        recycler.release(&mut doc, node);
        recycler.clear(&mut doc);

        assert_eq!(recycler.pooled_count(), 0);
        assert!(!doc.contains(node));
    }
}
