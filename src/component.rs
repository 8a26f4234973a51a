//! Component-system boundary.
//!
//! The reconciler does not own components: a virtual node whose kind is a
//! component constructor is forwarded intact to an external
//! [`ComponentSystem`], which creates or reuses the instance, delivers
//! props and context, and calls back into the reconciler for its rendered
//! output. The reconciler only tracks the attachment (a [`ComponentLink`]
//! on the host node's metadata) and the deferred mount-notification queue.

use std::fmt;

use compact_str::CompactString;
use rustc_hash::FxHashMap;

use crate::attr::AttrValue;
use crate::error::{DomError, DomResult};
use crate::host::{HostDocument, NodeId};
use crate::reconcile::Reconciler;
use crate::vnode::{Key, VNode};

// =============================================================================
// Identity handles
// =============================================================================

/// Identity of a component constructor. Two virtual nodes describe the
/// same component type iff their `CtorId`s are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CtorId(u64);

impl CtorId {
    /// Create a constructor id from a raw value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CtorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ctor:{}", self.0)
    }
}

/// Identity of a live component instance, minted by the component system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Create an instance id from a raw value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "inst:{}", self.0)
    }
}

/// Ambient context threaded through a render pass and handed to stateless
/// functions and the component system. Opaque to the reconciler.
pub type Context = FxHashMap<CompactString, AttrValue>;

// =============================================================================
// ComponentLink
// =============================================================================

/// Back-reference from a host node to the component instance it hosts.
///
/// A host node carries at most one of these at a time; while present, the
/// node is owned by that component and is never independently matched by
/// tag name.
#[derive(Debug, Clone)]
pub struct ComponentLink {
    /// The attached instance.
    pub instance: InstanceId,
    /// Constructor the instance was built from, for same-type matching.
    pub ctor: CtorId,
    /// The key the component declared, taking precedence over the host
    /// node's own cached key during child reconciliation.
    pub key: Option<Key>,
}

// =============================================================================
// ComponentSystem
// =============================================================================

/// The external component system consumed by the reconciler.
///
/// `build_from_vnode` must itself call back into
/// [`Reconciler::reconcile_into`] (with `component_root = true`) for the
/// instance's rendered output, attach a [`ComponentLink`] to the resulting
/// host node, and enqueue newly created instances via
/// [`Reconciler::enqueue_mount`].
pub trait ComponentSystem {
    /// Build or update the component described by `vnode` against
    /// `existing`, returning the host node that now represents it.
    fn build_from_vnode(
        &mut self,
        reconciler: &mut Reconciler,
        doc: &mut HostDocument,
        existing: Option<NodeId>,
        vnode: &VNode,
        ctx: &Context,
        mount_all: bool,
    ) -> DomResult<NodeId>;

    /// Unmount an instance. When `detach_host` is set the instance's host
    /// subtree is also reclaimed; otherwise only the instance (and any
    /// nested instances) go away and the host nodes are left in place.
    fn unmount_component(
        &mut self,
        reconciler: &mut Reconciler,
        doc: &mut HostDocument,
        instance: InstanceId,
        detach_host: bool,
    ) -> DomResult<()>;

    /// Deliver the deferred post-mount notification for an instance.
    /// Called by [`Reconciler::flush_mounts`], exactly once per enqueued
    /// instance, strictly after the host mutations of the pass.
    fn notify_mounted(
        &mut self,
        reconciler: &mut Reconciler,
        doc: &mut HostDocument,
        instance: InstanceId,
    );
}

/// Component system for component-free virtual trees: building is an
/// error, unmount and notify are no-ops.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullComponents;

impl ComponentSystem for NullComponents {
    fn build_from_vnode(
        &mut self,
        _reconciler: &mut Reconciler,
        _doc: &mut HostDocument,
        _existing: Option<NodeId>,
        vnode: &VNode,
        _ctx: &Context,
        _mount_all: bool,
    ) -> DomResult<NodeId> {
        match vnode.kind {
            crate::vnode::VKind::Component(ctor) => Err(DomError::NoComponentSystem(ctor)),
            _ => Err(DomError::NoComponentSystem(CtorId::new(0))),
        }
    }

    fn unmount_component(
        &mut self,
        _reconciler: &mut Reconciler,
        _doc: &mut HostDocument,
        _instance: InstanceId,
        _detach_host: bool,
    ) -> DomResult<()> {
        Ok(())
    }

    fn notify_mounted(
        &mut self,
        _reconciler: &mut Reconciler,
        _doc: &mut HostDocument,
        _instance: InstanceId,
    ) {
    }
}
