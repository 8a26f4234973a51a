//! The diff orchestrator.
//!
//! [`Reconciler`] is the entry point of the crate: it walks a virtual tree
//! against an existing host subtree and applies the minimal mutations that
//! make the host match, preserving existing nodes (and their attached
//! state) wherever possible.
//!
//! The reconciler owns the pass-scoped ambient state: a recursion-depth
//! counter, the SVG-namespace mode, the hydration flag, the recycle pool
//! and the deferred mount-notification queue. Only the outermost call of a
//! pass samples the ambient state, and only the outermost exit flushes the
//! mount queue. Mounting a component may synchronously trigger nested
//! reconciliation, so notifications must wait until the whole subtree is
//! stable.

mod attrs;
mod children;
mod reclaim;

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::component::{ComponentSystem, Context, InstanceId};
use crate::error::DomResult;
use crate::host::{HostDocument, Namespace, NodeId};
use crate::recycler::{Recycler, RecyclerConfig, normalized};
use crate::vnode::{VKind, VNode};

// =============================================================================
// Reconciler
// =============================================================================

/// Stateful reconciliation engine. One instance drives any number of
/// passes; the recycle pool and mount queue persist across them.
#[derive(Debug, Default)]
pub struct Reconciler {
    recycler: Recycler,
    mount_queue: VecDeque<InstanceId>,
    depth: u32,
    svg_mode: bool,
    hydrating: bool,
}

impl Reconciler {
    /// Create a reconciler with the default recycler configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a reconciler with a custom recycler configuration.
    pub fn with_config(config: RecyclerConfig) -> Self {
        Self {
            recycler: Recycler::with_config(config),
            ..Self::default()
        }
    }

    /// The recycle pool.
    pub fn recycler(&self) -> &Recycler {
        &self.recycler
    }

    /// Mutable access to the recycle pool.
    pub fn recycler_mut(&mut self) -> &mut Recycler {
        &mut self.recycler
    }

    /// Whether the current pass is adopting markup not produced by this
    /// reconciler.
    pub fn is_hydrating(&self) -> bool {
        self.hydrating
    }

    /// Number of instances awaiting their mount notification.
    pub fn pending_mounts(&self) -> usize {
        self.mount_queue.len()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mount-notification queue
    // ─────────────────────────────────────────────────────────────────────────

    /// Record a newly attached component instance for deferred
    /// notification. Called by the component system during a pass.
    pub fn enqueue_mount(&mut self, instance: InstanceId) {
        trace!(%instance, "mount enqueued");
        self.mount_queue.push_back(instance);
    }

    /// Drain the mount queue, notifying each instance exactly once, in
    /// the order enqueued (depth-first, children before the parent that
    /// mounted them). Fires automatically when the outermost call of a
    /// pass returns; exposed for entry points that suppress auto-flush
    /// via `component_root`.
    pub fn flush_mounts(&mut self, components: &mut dyn ComponentSystem, doc: &mut HostDocument) {
        if !self.mount_queue.is_empty() {
            debug!(count = self.mount_queue.len(), "flushing mount notifications");
        }
        while let Some(instance) = self.mount_queue.pop_front() {
            components.notify_mounted(self, doc, instance);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Entry points
    // ─────────────────────────────────────────────────────────────────────────

    /// Reconcile `vnode` against `existing`, returning the host node that
    /// now represents it.
    pub fn reconcile(
        &mut self,
        components: &mut dyn ComponentSystem,
        doc: &mut HostDocument,
        existing: Option<NodeId>,
        vnode: &VNode,
        ctx: &Context,
        mount_all: bool,
    ) -> DomResult<NodeId> {
        self.reconcile_into(components, doc, existing, vnode, ctx, mount_all, None, false)
    }

    /// Full-signature entry point.
    ///
    /// When `host_parent` is given and the result ends up in a different
    /// container, the result is appended into that parent. When
    /// `component_root` is set the call is a component system rendering
    /// its own output: the mount queue is left for the enclosing
    /// top-level pass (or an explicit [`Reconciler::flush_mounts`]).
    #[allow(clippy::too_many_arguments)]
    pub fn reconcile_into(
        &mut self,
        components: &mut dyn ComponentSystem,
        doc: &mut HostDocument,
        existing: Option<NodeId>,
        vnode: &VNode,
        ctx: &Context,
        mount_all: bool,
        host_parent: Option<NodeId>,
        component_root: bool,
    ) -> DomResult<NodeId> {
        self.depth += 1;
        if self.depth == 1 {
            self.svg_mode =
                host_parent.is_some_and(|p| doc.namespace(p) == Some(Namespace::Svg));
            self.hydrating = existing.is_some_and(|n| !doc.is_managed(n));
            trace!(
                hydrating = self.hydrating,
                svg = self.svg_mode,
                "top-level reconcile pass"
            );
        }

        let result = self.diff_and_place(components, doc, existing, vnode, ctx, mount_all, host_parent);

        self.depth -= 1;
        if self.depth == 0 {
            self.hydrating = false;
            if !component_root {
                self.flush_mounts(components, doc);
            }
        }
        result
    }

    #[allow(clippy::too_many_arguments)]
    fn diff_and_place(
        &mut self,
        components: &mut dyn ComponentSystem,
        doc: &mut HostDocument,
        existing: Option<NodeId>,
        vnode: &VNode,
        ctx: &Context,
        mount_all: bool,
        host_parent: Option<NodeId>,
    ) -> DomResult<NodeId> {
        let node = self.idiff(components, doc, existing, vnode, ctx, mount_all)?;
        if let Some(parent) = host_parent {
            if doc.parent(node) != Some(parent) {
                doc.append_child(parent, node)?;
            }
        }
        Ok(node)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal diff
    // ─────────────────────────────────────────────────────────────────────────

    /// Diff one virtual node, without touching pass-scoped bookkeeping.
    /// Child recursion goes through here, not the public entry points.
    fn idiff(
        &mut self,
        components: &mut dyn ComponentSystem,
        doc: &mut HostDocument,
        existing: Option<NodeId>,
        vnode: &VNode,
        ctx: &Context,
        mount_all: bool,
    ) -> DomResult<NodeId> {
        // Stateless kinds are pure substitutions: resolve them eagerly and
        // repeatedly until the kind is concrete.
        let mut resolved: Option<VNode> = None;
        loop {
            let current = resolved.as_ref().unwrap_or(vnode);
            let f = match &current.kind {
                VKind::Stateless(f) => *f,
                _ => break,
            };
            let props = current.props();
            resolved = Some(f(&props, ctx).unwrap_or_else(VNode::empty));
        }
        let vnode = resolved.as_ref().unwrap_or(vnode);

        match &vnode.kind {
            VKind::Component(_) => {
                components.build_from_vnode(self, doc, existing, vnode, ctx, mount_all)
            }
            VKind::Text(value) => self.diff_text(components, doc, existing, value.as_str()),
            VKind::Element(tag) => {
                self.diff_element(components, doc, existing, vnode, tag.as_str(), ctx, mount_all)
            }
            VKind::Stateless(_) => unreachable!("stateless kinds are resolved before dispatch"),
        }
    }

    /// Text-node path: update in place when possible, otherwise substitute
    /// a fresh text node and reclaim the old one.
    fn diff_text(
        &mut self,
        components: &mut dyn ComponentSystem,
        doc: &mut HostDocument,
        existing: Option<NodeId>,
        value: &str,
    ) -> DomResult<NodeId> {
        if let Some(node) = existing {
            if doc.is_text(node) {
                if doc.text_value(node) != Some(value) {
                    doc.set_text(node, value)?;
                }
                doc.mark_managed(node);
                return Ok(node);
            }
            let out = doc.create_text(value);
            doc.mark_managed(out);
            if let Some(parent) = doc.parent(node) {
                doc.insert_before(parent, out, node)?;
            }
            self.reclaim(components, doc, node, false)?;
            return Ok(out);
        }
        let out = doc.create_text(value);
        doc.mark_managed(out);
        Ok(out)
    }

    /// Host-element path: identity, attributes, children, ref, in that
    /// order.
    #[allow(clippy::too_many_arguments)]
    fn diff_element(
        &mut self,
        components: &mut dyn ComponentSystem,
        doc: &mut HostDocument,
        existing: Option<NodeId>,
        vnode: &VNode,
        tag: &str,
        ctx: &Context,
        mount_all: bool,
    ) -> DomResult<NodeId> {
        // Namespace mode is scoped to this subtree.
        let prev_svg = self.svg_mode;
        if tag.eq_ignore_ascii_case("svg") {
            self.svg_mode = true;
        } else if tag.eq_ignore_ascii_case("foreignObject") {
            self.svg_mode = false;
        }

        let out = match existing {
            Some(node) if is_named_node(doc, node, tag) => node,
            Some(node) => {
                // Tag changed: move realized children onto a replacement
                // node instead of destroying the whole subtree.
                let fresh = self.recycler.acquire(doc, tag, self.svg_mode);
                while let Some(child) = doc.first_child(node) {
                    doc.append_child(fresh, child)?;
                }
                if let Some(parent) = doc.parent(node) {
                    doc.insert_before(parent, fresh, node)?;
                }
                self.reclaim(components, doc, node, false)?;
                fresh
            }
            None => self.recycler.acquire(doc, tag, self.svg_mode),
        };

        // First encounter of a node produced outside this reconciler:
        // snapshot the host's live attributes as the previous cache.
        if doc.meta(out).is_none() {
            let snapshot = doc.attrs(out).cloned().unwrap_or_default();
            let meta = doc.ensure_meta(out);
            meta.cached_attrs = snapshot;
            meta.normalized_tag = normalized(tag);
        }

        attrs::diff_attributes(doc, out, &vnode.attrs, self.svg_mode)?;
        doc.ensure_meta(out).key = vnode.key.clone();

        // Fast path: a single bare-string child over a lone text child is
        // the most common update shape and must stay O(1).
        let single_text = match vnode.children.as_slice() {
            [only] => match &only.kind {
                VKind::Text(t) => Some(t.as_str()),
                _ => None,
            },
            _ => None,
        };
        let lone_text_child = match doc.children(out) {
            [only] if doc.is_text(*only) => Some(*only),
            _ => None,
        };

        match (single_text, lone_text_child) {
            (Some(text), Some(child)) if !self.hydrating => {
                if doc.text_value(child) != Some(text) {
                    doc.set_text(child, text)?;
                }
            }
            _ => {
                if !vnode.children.is_empty() || doc.first_child(out).is_some() {
                    self.diff_children(components, doc, out, &vnode.children, ctx, mount_all)?;
                }
            }
        }

        if let Some(vref) = &vnode.vref {
            doc.ensure_meta(out).ref_cb = Some(vref.clone());
            vref.invoke(Some(out));
        }

        self.svg_mode = prev_svg;
        Ok(out)
    }
}

/// Whether a host node can represent the given tag: an element whose
/// normalized tag matches case-insensitively.
pub(crate) fn is_named_node(doc: &HostDocument, node: NodeId, tag: &str) -> bool {
    if !doc.is_element(node) {
        return false;
    }
    match doc.meta(node) {
        Some(meta) if !meta.normalized_tag.is_empty() => {
            meta.normalized_tag.eq_ignore_ascii_case(tag)
        }
        _ => doc.tag(node).is_some_and(|t| t.eq_ignore_ascii_case(tag)),
    }
}

// =============================================================================
// Tests
// =============================================================================
