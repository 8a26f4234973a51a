//! Shared reconciler handle.
//!
//! The recycle pool and mount queue are mutable state with no internal
//! locking, which is safe in the single-threaded model this crate assumes. An
//! embedding that drives render passes from more than one place gets its
//! exclusion here: one process-wide [`SharedReconciler`] guarding the
//! reconciler behind a `parking_lot` mutex.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::component::{ComponentSystem, Context};
use crate::error::DomResult;
use crate::host::{HostDocument, NodeId};
use crate::reconcile::Reconciler;
use crate::recycler::RecyclerConfig;
use crate::vnode::VNode;

/// Thread-safe shared handle to a [`Reconciler`].
#[derive(Debug)]
pub struct SharedReconciler {
    inner: Arc<Mutex<Reconciler>>,
}

impl Clone for SharedReconciler {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for SharedReconciler {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedReconciler {
    /// Create a shared reconciler with the default configuration.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Reconciler::new())),
        }
    }

    /// Create a shared reconciler with a custom recycler configuration.
    pub fn with_config(config: RecyclerConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Reconciler::with_config(config))),
        }
    }

    /// Execute a closure with exclusive access to the reconciler.
    pub fn with<R>(&self, f: impl FnOnce(&mut Reconciler) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    /// Run a reconciliation pass under the lock.
    pub fn reconcile(
        &self,
        components: &mut dyn ComponentSystem,
        doc: &mut HostDocument,
        existing: Option<NodeId>,
        vnode: &VNode,
        ctx: &Context,
        mount_all: bool,
    ) -> DomResult<NodeId> {
        self.with(|rec| rec.reconcile(components, doc, existing, vnode, ctx, mount_all))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::NullComponents;

    #[test]
    fn test_clones_share_the_pool() {
        let shared = SharedReconciler::new();
        let clone = shared.clone();

        let mut doc = HostDocument::new();
        let mut cs = NullComponents;
        let ctx = Context::default();

        let root = shared
            .reconcile(&mut cs, &mut doc, None, &VNode::element("div").child(VNode::element("span")), &ctx, false)
            .unwrap();
        clone
            .reconcile(&mut cs, &mut doc, Some(root), &VNode::element("div"), &ctx, false)
            .unwrap();

        assert_eq!(shared.with(|rec| rec.recycler().pooled_for("span")), 1);
    }
}
