//! Child-list reconciliation.
//!
//! Matches an ordered sequence of virtual children against a host
//! element's existing children: keyed children strictly by key equality,
//! unkeyed children by relative order among remaining candidates via a
//! forward-only cursor. The cursor scan is a deliberate O(n)
//! approximation (first forward match wins, the cursor never rewinds),
//! kept for behavioral compatibility over optimal tree-edit distance.

use rustc_hash::FxHashMap;

use super::{Reconciler, is_named_node};
use crate::component::{ComponentSystem, Context};
use crate::error::DomResult;
use crate::host::{HostDocument, NodeId};
use crate::vnode::{Key, VKind, VNode};

impl Reconciler {
    /// Reconcile `vchildren` against the existing children of `parent`,
    /// reordering, reusing, creating and reclaiming host nodes as needed.
    pub(crate) fn diff_children(
        &mut self,
        components: &mut dyn ComponentSystem,
        doc: &mut HostDocument,
        parent: NodeId,
        vchildren: &[VNode],
        ctx: &Context,
        mount_all: bool,
    ) -> DomResult<()> {
        let mut keyed: FxHashMap<Key, NodeId> = FxHashMap::default();
        let mut candidates: Vec<Option<NodeId>> = Vec::new();

        // Partition existing children. During hydration every child is an
        // adoption candidate; otherwise only managed children are, and a
        // foreign node is never matched and never touched.
        let existing: Vec<NodeId> = doc.children(parent).to_vec();
        for child in existing {
            let managed = doc.is_managed(child);
            let key = if managed { doc.node_key(child) } else { None };
            match key {
                Some(key) => {
                    keyed.insert(key, child);
                }
                None if managed || self.is_hydrating() => candidates.push(Some(child)),
                None => {}
            }
        }

        let mut cursor = 0usize;

        for (index, vchild) in vchildren.iter().enumerate() {
            let mut child: Option<NodeId> = None;

            // Keyed children claim strictly by key equality.
            if let Some(key) = &vchild.key {
                if let Some(node) = keyed.remove(key) {
                    child = Some(node);
                }
            }

            // Unkeyed: first same-type candidate at or after the cursor.
            if child.is_none() {
                for j in cursor..candidates.len() {
                    let Some(candidate) = candidates[j] else { continue };
                    if same_node_type(doc, candidate, vchild) {
                        child = Some(candidate);
                        candidates[j] = None;
                        if j == cursor {
                            cursor += 1;
                        }
                        break;
                    }
                }
            }

            // A component child in a mount-all pass adopts whatever markup
            // is present.
            if child.is_none() && mount_all && matches!(vchild.kind, VKind::Component(_)) {
                for j in cursor..candidates.len() {
                    let Some(candidate) = candidates[j] else { continue };
                    child = Some(candidate);
                    candidates[j] = None;
                    if j == cursor {
                        cursor += 1;
                    }
                    break;
                }
            }

            let result = self.idiff(components, doc, child, vchild, ctx, mount_all)?;

            // Reposition: append past the end, else insert before the node
            // currently occupying the target index.
            let occupant = doc.child_at(parent, index);
            if occupant != Some(result) {
                match occupant {
                    None => doc.append_child(parent, result)?,
                    Some(anchor) => doc.insert_before(parent, result, anchor)?,
                }
            }
        }

        // Reclaim orphans: keyed children never claimed first, then
        // unclaimed candidates in reverse.
        for (_, node) in keyed.drain() {
            self.reclaim(components, doc, node, false)?;
        }
        for j in (0..candidates.len()).rev() {
            if let Some(node) = candidates[j] {
                self.reclaim(components, doc, node, false)?;
            }
        }
        Ok(())
    }
}

/// The closed same-node-type equivalence: text host node for a text
/// vnode, identical constructor for a component vnode, matching normalized
/// tag for an element vnode. No other pairing is equivalent. A node owned
/// by a component instance is never matched by tag name.
fn same_node_type(doc: &HostDocument, node: NodeId, vnode: &VNode) -> bool {
    match &vnode.kind {
        VKind::Text(_) => doc.is_text(node),
        VKind::Element(tag) => doc.component(node).is_none() && is_named_node(doc, node, tag),
        VKind::Component(ctor) => doc.component(node).is_some_and(|link| link.ctor == *ctor),
        VKind::Stateless(_) => false,
    }
}

// =============================================================================
// Tests
// =============================================================================
