//! rivet-dom - Retained-mode reconciler for a live host tree
//!
//! Given a previously rendered host subtree and a freshly built virtual
//! tree, the reconciler applies the minimal set of host mutations that
//! make the two match, preserving existing host nodes (and the state
//! attached to them) wherever possible.
//!
//! ## Core Concepts
//!
//! **Keyed + positional matching**: children claim existing host nodes by
//! explicit key first, then by type at a forward-only cursor.
//!
//! **Node recycling**: discarded elements park in a tag-keyed pool and are
//! handed back out instead of allocating.
//!
//! **Batched mounts**: component mount notifications are queued during a
//! pass and flushed only when the outermost call returns, so handlers
//! always observe a fully consistent tree.
//!
//! ## Modules
//! - `vnode`: virtual tree description (`VNode`, `VKind`, `Props`)
//! - `host`: the live host tree (`HostDocument`, `NodeId`, `MutationStats`)
//! - `reconcile`: the diff orchestrator (`Reconciler`)
//! - `recycler`: tag-keyed node pool
//! - `component`: boundary to an external component system
//! - `attr`: attribute storage and values
//! - `shared`: `parking_lot`-guarded shared handle
//!
//! ## Usage
//!
//! ```ignore
//! use rivet_dom::prelude::*;
//!
//! let mut doc = HostDocument::new();
//! let mut rec = Reconciler::new();
//! let mut components = NullComponents;
//! let ctx = Context::default();
//!
//! let view = VNode::element("div")
//!     .attr("class", "greeting")
//!     .child(VNode::text("Hello"));
//!
//! let root = rec.reconcile(&mut components, &mut doc, None, &view, &ctx, false)?;
//! assert_eq!(doc.outer_html(root), "<div class=\"greeting\">Hello</div>");
//! ```

// =============================================================================
// Core modules
// =============================================================================

/// Attribute types
pub mod attr;

/// Component-system boundary
pub mod component;

/// Error types
pub mod error;

/// The live host tree
pub mod host;

/// Prelude for common imports
pub mod prelude;

/// The diff orchestrator
pub mod reconcile;

/// Host-node recycle pool
pub mod recycler;

/// Shared reconciler handle
pub mod shared;

/// Virtual node model
pub mod vnode;

// =============================================================================
// Re-exports
// =============================================================================

// Virtual tree
pub use vnode::{Key, Props, RefCallback, StatelessFn, VKind, VNode};

// Attributes
pub use attr::{AttrValue, Attrs, AttrsExt};

// Host tree
pub use host::{HostDocument, MutationStats, Namespace, NodeId, NodeKind, NodeMeta};

// Reconciliation
pub use reconcile::Reconciler;
pub use recycler::{Recycler, RecyclerConfig};
pub use shared::SharedReconciler;

// Component boundary
pub use component::{ComponentLink, ComponentSystem, Context, CtorId, InstanceId, NullComponents};

// Error types
pub use error::{DomError, DomResult};

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use rustc_hash::FxHashMap;
    use static_assertions::assert_impl_all;

    use crate::prelude::*;

    assert_impl_all!(Reconciler: Send);
    assert_impl_all!(SharedReconciler: Send, Sync);

    fn setup() -> (HostDocument, Reconciler, NullComponents, Context) {
        (
            HostDocument::new(),
            Reconciler::new(),
            NullComponents,
            Context::default(),
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mock component system
    // ─────────────────────────────────────────────────────────────────────────

    type RenderFn = fn(&Props, &Context) -> VNode;

    struct MockInstance {
        node: Option<NodeId>,
    }

    #[derive(Default)]
    struct MockComponents {
        renderers: FxHashMap<CtorId, RenderFn>,
        instances: Vec<MockInstance>,
        events: Rc<RefCell<Vec<String>>>,
    }

    impl MockComponents {
        fn with_renderer(mut self, ctor: CtorId, render: RenderFn) -> Self {
            self.renderers.insert(ctor, render);
            self
        }
    }

    impl ComponentSystem for MockComponents {
        fn build_from_vnode(
            &mut self,
            reconciler: &mut Reconciler,
            doc: &mut HostDocument,
            existing: Option<NodeId>,
            vnode: &VNode,
            ctx: &Context,
            mount_all: bool,
        ) -> DomResult<NodeId> {
            let ctor = match vnode.kind {
                VKind::Component(ctor) => ctor,
                _ => panic!("mock asked to build a non-component vnode"),
            };
            let reuse = existing
                .and_then(|n| doc.component(n).cloned())
                .filter(|link| link.ctor == ctor);
            let (instance, is_new) = match reuse {
                Some(link) => (link.instance, false),
                None => {
                    let id = InstanceId::new(self.instances.len() as u64);
                    self.instances.push(MockInstance { node: None });
                    (id, true)
                }
            };

            let render = self.renderers[&ctor];
            let rendered = render(&vnode.props(), ctx);
            let node = reconciler.reconcile_into(
                &mut *self,
                doc,
                existing,
                &rendered,
                ctx,
                mount_all,
                None,
                true,
            )?;

            doc.attach_component(
                node,
                ComponentLink {
                    instance,
                    ctor,
                    key: vnode.key.clone(),
                },
            )?;
            self.instances[instance.as_u64() as usize].node = Some(node);
            if is_new {
                reconciler.enqueue_mount(instance);
            }
            Ok(node)
        }

        fn unmount_component(
            &mut self,
            reconciler: &mut Reconciler,
            doc: &mut HostDocument,
            instance: InstanceId,
            detach_host: bool,
        ) -> DomResult<()> {
            self.events.borrow_mut().push(format!("unmount:{instance}"));
            let node = self.instances[instance.as_u64() as usize].node.take();
            if let Some(node) = node {
                doc.clear_component(node);
                reconciler.reclaim(&mut *self, doc, node, !detach_host)?;
            }
            Ok(())
        }

        fn notify_mounted(
            &mut self,
            _reconciler: &mut Reconciler,
            doc: &mut HostDocument,
            instance: InstanceId,
        ) {
            self.events
                .borrow_mut()
                .push(format!("mounted:{instance}@{}", doc.stats().total_mutations()));
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reconciliation properties
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_second_identical_pass_is_mutation_free() {
        let (mut doc, mut rec, mut cs, ctx) = setup();
        let view = || {
            VNode::element("section")
                .attr("class", "card")
                .child(VNode::element("h1").child(VNode::text("Title")))
                .child(
                    VNode::element("p")
                        .attr("data-x", "1")
                        .child(VNode::text("Body")),
                )
        };

        let root = rec
            .reconcile(&mut cs, &mut doc, None, &view(), &ctx, false)
            .unwrap();
        let before = doc.stats().total_mutations();

        let same = rec
            .reconcile(&mut cs, &mut doc, Some(root), &view(), &ctx, false)
            .unwrap();

        assert_eq!(same, root);
        assert_eq!(doc.stats().total_mutations(), before);
    }

    #[test]
    fn test_text_fast_path() {
        let (mut doc, mut rec, mut cs, ctx) = setup();
        let view = |s: &str| VNode::element("div").child(VNode::text(s));

        let root = rec
            .reconcile(&mut cs, &mut doc, None, &view("hello"), &ctx, false)
            .unwrap();
        let before = *doc.stats();

        // Unchanged string: no value write.
        rec.reconcile(&mut cs, &mut doc, Some(root), &view("hello"), &ctx, false)
            .unwrap();
        assert_eq!(doc.stats().text_writes, before.text_writes);

        // Changed string: exactly one value write, nothing created or
        // removed.
        rec.reconcile(&mut cs, &mut doc, Some(root), &view("world"), &ctx, false)
            .unwrap();
        let after = doc.stats();
        assert_eq!(after.text_writes, before.text_writes + 1);
        assert_eq!(after.nodes_created, before.nodes_created);
        assert_eq!(after.nodes_destroyed, before.nodes_destroyed);
        assert_eq!(after.nodes_pooled, before.nodes_pooled);
        assert_eq!(doc.outer_html(root), "<div>world</div>");
    }

    #[test]
    fn test_keyed_reorder_reuses_all_nodes() {
        let (mut doc, mut rec, mut cs, ctx) = setup();
        let view = |keys: &[&str]| {
            VNode::element("ul").children(
                keys.iter()
                    .map(|k| VNode::element("li").key(*k).child(VNode::text(k.to_uppercase()))),
            )
        };

        let root = rec
            .reconcile(&mut cs, &mut doc, None, &view(&["a", "b", "c"]), &ctx, false)
            .unwrap();
        let ids: Vec<NodeId> = doc.children(root).to_vec();
        let before = *doc.stats();

        rec.reconcile(&mut cs, &mut doc, Some(root), &view(&["c", "a", "b"]), &ctx, false)
            .unwrap();

        assert_eq!(doc.children(root), &[ids[2], ids[0], ids[1]]);
        let after = doc.stats();
        assert_eq!(after.nodes_created, before.nodes_created);
        assert_eq!(after.nodes_destroyed, before.nodes_destroyed);
        assert_eq!(after.nodes_pooled, before.nodes_pooled);
        assert_eq!(doc.outer_html(root), "<ul><li>C</li><li>A</li><li>B</li></ul>");
    }

    #[test]
    fn test_orphan_reclamation() {
        let (mut doc, mut rec, mut cs, ctx) = setup();
        let view = |n: usize| {
            VNode::element("div")
                .children((0..n).map(|_| VNode::element("span").child(VNode::text("x"))))
        };

        let root = rec
            .reconcile(&mut cs, &mut doc, None, &view(3), &ctx, false)
            .unwrap();
        let first = doc.first_child(root).unwrap();

        rec.reconcile(&mut cs, &mut doc, Some(root), &view(1), &ctx, false)
            .unwrap();

        assert_eq!(doc.children(root), &[first]);
        assert_eq!(rec.recycler().pooled_for("span"), 2);
    }

    #[test]
    fn test_reclaimed_nodes_are_reused() {
        let (mut doc, mut rec, mut cs, ctx) = setup();
        let view = |tags: &[&str]| {
            VNode::element("div")
                .children(tags.iter().map(|t| VNode::element(*t)))
        };

        let root = rec
            .reconcile(&mut cs, &mut doc, None, &view(&["em", "em"]), &ctx, false)
            .unwrap();
        let second = doc.child_at(root, 1).unwrap();

        rec.reconcile(&mut cs, &mut doc, Some(root), &view(&["em"]), &ctx, false)
            .unwrap();
        assert_eq!(rec.recycler().pooled_for("em"), 1);

        // Growing the list again drains the pool before allocating.
        let created = doc.stats().nodes_created;
        rec.reconcile(&mut cs, &mut doc, Some(root), &view(&["em", "em"]), &ctx, false)
            .unwrap();
        assert_eq!(doc.stats().nodes_created, created);
        assert_eq!(doc.child_at(root, 1), Some(second));
    }

    #[test]
    fn test_tag_change_preserves_descendants() {
        let (mut doc, mut rec, mut cs, ctx) = setup();

        let before = VNode::element("span").child(VNode::element("em").child(VNode::text("x")));
        let root = rec
            .reconcile(&mut cs, &mut doc, None, &before, &ctx, false)
            .unwrap();
        let em = doc.first_child(root).unwrap();

        let after = VNode::element("div").child(VNode::element("em").child(VNode::text("x")));
        let replaced = rec
            .reconcile(&mut cs, &mut doc, Some(root), &after, &ctx, false)
            .unwrap();

        assert_ne!(replaced, root);
        assert_eq!(doc.first_child(replaced), Some(em));
        assert_eq!(rec.recycler().pooled_for("span"), 1);
        assert_eq!(doc.outer_html(replaced), "<div><em>x</em></div>");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Component integration
    // ─────────────────────────────────────────────────────────────────────────

    const OUTER: CtorId = CtorId::new(1);
    const MIDDLE: CtorId = CtorId::new(2);
    const INNER: CtorId = CtorId::new(3);

    fn render_outer(_: &Props, _: &Context) -> VNode {
        VNode::element("div")
            .attr("class", "outer")
            .child(VNode::component(MIDDLE))
    }

    fn render_middle(_: &Props, _: &Context) -> VNode {
        VNode::element("span").child(VNode::component(INNER))
    }

    fn render_inner(_: &Props, _: &Context) -> VNode {
        VNode::element("em").child(VNode::text("leaf"))
    }

    #[test]
    fn test_mount_notifications_batch_child_first() {
        let mut doc = HostDocument::new();
        let mut rec = Reconciler::new();
        let ctx = Context::default();
        let mut cs = MockComponents::default()
            .with_renderer(OUTER, render_outer)
            .with_renderer(MIDDLE, render_middle)
            .with_renderer(INNER, render_inner);
        let events = cs.events.clone();

        let root = rec
            .reconcile(&mut cs, &mut doc, None, &VNode::component(OUTER), &ctx, false)
            .unwrap();

        assert_eq!(
            doc.outer_html(root),
            "<div class=\"outer\"><span><em>leaf</em></span></div>"
        );
        assert_eq!(rec.pending_mounts(), 0);

        // Exactly three notifications, deepest child first, each observing
        // the fully mutated tree.
        let total = doc.stats().total_mutations();
        assert_eq!(
            events.borrow().as_slice(),
            &[
                format!("mounted:inst:2@{total}"),
                format!("mounted:inst:1@{total}"),
                format!("mounted:inst:0@{total}"),
            ]
        );
    }

    #[test]
    fn test_component_identity_matching() {
        fn render_alt(_: &Props, _: &Context) -> VNode {
            VNode::element("em").child(VNode::text("other"))
        }
        const ALT: CtorId = CtorId::new(9);

        let mut doc = HostDocument::new();
        let mut rec = Reconciler::new();
        let ctx = Context::default();
        let mut cs = MockComponents::default()
            .with_renderer(INNER, render_inner)
            .with_renderer(ALT, render_alt);
        let events = cs.events.clone();

        let view = |ctor: CtorId| VNode::element("div").child(VNode::component(ctor));

        let root = rec
            .reconcile(&mut cs, &mut doc, None, &view(INNER), &ctx, false)
            .unwrap();
        let hosted = doc.first_child(root).unwrap();

        // Same constructor: the instance's host node is claimed again.
        rec.reconcile(&mut cs, &mut doc, Some(root), &view(INNER), &ctx, false)
            .unwrap();
        assert_eq!(doc.first_child(root), Some(hosted));
        assert_eq!(events.borrow().iter().filter(|e| e.starts_with("unmount")).count(), 0);

        // Different constructor: the old instance unmounts and a new host
        // subtree is built.
        rec.reconcile(&mut cs, &mut doc, Some(root), &view(ALT), &ctx, false)
            .unwrap();
        assert_eq!(
            events.borrow().iter().filter(|e| e.starts_with("unmount")).count(),
            1
        );
        assert_eq!(doc.outer_html(root), "<div><em>other</em></div>");
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Hydration
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_hydration_adopts_server_markup() {
        let (mut doc, mut rec, mut cs, ctx) = setup();

        // Markup produced outside the reconciler: no attached metadata.
        let root = doc.create_element("div");
        let span = doc.create_element("span");
        let text = doc.create_text("hi");
        doc.set_attr(root, "class", "server").unwrap();
        doc.append_child(root, span).unwrap();
        doc.append_child(span, text).unwrap();

        let view = VNode::element("div")
            .attr("class", "client")
            .child(VNode::element("span").child(VNode::text("hi")));
        let out = rec
            .reconcile(&mut cs, &mut doc, Some(root), &view, &ctx, true)
            .unwrap();

        // Adopted, not replaced: same nodes, updated attributes.
        assert_eq!(out, root);
        assert!(doc.is_managed(root));
        assert_eq!(doc.first_child(root), Some(span));
        assert_eq!(doc.first_child(span), Some(text));
        assert_eq!(doc.attr(root, "class"), Some(&"client".into()));
    }

    #[test]
    fn test_mount_all_adopts_markup_for_components() {
        fn render_widget(_: &Props, _: &Context) -> VNode {
            VNode::element("p").child(VNode::text("w"))
        }
        const WIDGET: CtorId = CtorId::new(4);

        let mut doc = HostDocument::new();
        let mut rec = Reconciler::new();
        let ctx = Context::default();
        let mut cs = MockComponents::default().with_renderer(WIDGET, render_widget);

        let root = doc.create_element("div");
        let p = doc.create_element("p");
        let text = doc.create_text("w");
        doc.append_child(root, p).unwrap();
        doc.append_child(p, text).unwrap();

        let view = VNode::element("div").child(VNode::component(WIDGET));
        let out = rec
            .reconcile(&mut cs, &mut doc, Some(root), &view, &ctx, true)
            .unwrap();

        assert_eq!(out, root);
        assert_eq!(doc.children(root), &[p]);
        assert!(doc.component(p).is_some());
    }
}
