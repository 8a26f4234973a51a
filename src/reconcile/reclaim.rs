//! Tree reclamation.
//!
//! Tears down a host subtree the virtual tree no longer references:
//! component-owned nodes are handed back to the component system, refs are
//! told about the detachment, element nodes return to the recycle pool.

use tracing::trace;

use super::Reconciler;
use crate::component::ComponentSystem;
use crate::error::DomResult;
use crate::host::{HostDocument, NodeId};

impl Reconciler {
    /// Reclaim a host subtree.
    ///
    /// With `unmount_only` the host nodes stay where they are and only the
    /// attached behavior goes away: component instances unmount, refs fire
    /// with `None`. Without it the subtree is detached and element nodes
    /// return to the recycle pool (or are destroyed once their children
    /// have been reclaimed, when the pool is full). Children are visited
    /// in both modes so nested instances unmount even when the outer node
    /// is left in place.
    pub fn reclaim(
        &mut self,
        components: &mut dyn ComponentSystem,
        doc: &mut HostDocument,
        node: NodeId,
        unmount_only: bool,
    ) -> DomResult<()> {
        // A component-owned subtree is never manipulated directly.
        if let Some(link) = doc.component(node).cloned() {
            trace!(instance = %link.instance, "reclaim delegates to component system");
            return components.unmount_component(self, doc, link.instance, !unmount_only);
        }

        if let Some(ref_cb) = doc.meta(node).and_then(|m| m.ref_cb.clone()) {
            ref_cb.invoke(None);
        }

        if !unmount_only && doc.is_text(node) {
            doc.detach(node);
            doc.destroy(node);
            return Ok(());
        }

        let children: Vec<NodeId> = doc.children(node).to_vec();
        let pooled = if unmount_only {
            true
        } else {
            self.recycler_mut().release(doc, node)
        };

        for child in children.into_iter().rev() {
            self.reclaim(components, doc, child, unmount_only)?;
        }

        if !unmount_only && !pooled {
            doc.destroy(node);
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
