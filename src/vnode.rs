//! Virtual node model.
//!
//! A [`VNode`] is an immutable description of desired UI shape for one tree
//! position, produced fresh on every render pass and never mutated in
//! place. Its kind is a closed union ([`VKind`]): text, host element,
//! stateless rendering function, or stateful component constructor. The
//! reconciler dispatches by matching the variant, never by probing.
//!
//! The reconciliation `key` and the `ref` callback are dedicated fields
//! rather than reserved attribute names; both end up cached on the host
//! node's metadata once applied.

use std::fmt;
use std::rc::Rc;

use compact_str::CompactString;

use crate::attr::{AttrValue, Attrs, AttrsExt};
use crate::component::{Context, CtorId};
use crate::host::NodeId;

// =============================================================================
// Key
// =============================================================================

/// Application-supplied reconciliation identity for a child position.
///
/// Keys must be unique among keyed siblings; unkeyed siblings are matched
/// by order and type only.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key(CompactString);

impl Key {
    /// Create a new key.
    pub fn new(key: impl Into<CompactString>) -> Self {
        Self(key.into())
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// RefCallback
// =============================================================================

/// Callback invoked with the realized host node after a diff of the
/// declaring virtual node, and with `None` when the node is reclaimed.
#[derive(Clone)]
pub struct RefCallback(Rc<dyn Fn(Option<NodeId>)>);

impl RefCallback {
    /// Wrap a closure as a ref callback.
    pub fn new(f: impl Fn(Option<NodeId>) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invoke the callback.
    pub fn invoke(&self, node: Option<NodeId>) {
        (self.0)(node);
    }
}

impl fmt::Debug for RefCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefCallback")
    }
}

// =============================================================================
// VKind / VNode
// =============================================================================

/// A stateless rendering function: invoked with the node's props and the
/// ambient context, substituted by whatever it returns. Returning `None`
/// substitutes the canonical empty node.
pub type StatelessFn = fn(&Props, &Context) -> Option<VNode>;

/// The kind of a virtual node: a closed, mutually exclusive variant.
#[derive(Debug, Clone, PartialEq)]
pub enum VKind {
    /// Raw text content.
    Text(CompactString),
    /// Host element with the given tag name.
    Element(CompactString),
    /// Plain rendering function with no identity in the host tree.
    Stateless(StatelessFn),
    /// Stateful component constructor, built by the external component
    /// system.
    Component(CtorId),
}

/// Immutable description of desired UI shape for one tree position.
#[derive(Debug, Clone)]
pub struct VNode {
    /// What this node is.
    pub kind: VKind,
    /// Attribute mapping (props, for component and stateless kinds).
    pub attrs: Attrs,
    /// Reconciliation identity among siblings.
    pub key: Option<Key>,
    /// Callback handed the realized host node.
    pub vref: Option<RefCallback>,
    /// Ordered child descriptions.
    pub children: Vec<VNode>,
}

impl VNode {
    fn with_kind(kind: VKind) -> Self {
        Self {
            kind,
            attrs: Vec::new(),
            key: None,
            vref: None,
            children: Vec::new(),
        }
    }

    /// Create a text node description.
    pub fn text(value: impl Into<CompactString>) -> Self {
        Self::with_kind(VKind::Text(value.into()))
    }

    /// Create a host-element description.
    pub fn element(tag: impl Into<CompactString>) -> Self {
        Self::with_kind(VKind::Element(tag.into()))
    }

    /// Create a stateless-function description.
    pub fn stateless(f: StatelessFn) -> Self {
        Self::with_kind(VKind::Stateless(f))
    }

    /// Create a component description for the given constructor.
    pub fn component(ctor: CtorId) -> Self {
        Self::with_kind(VKind::Component(ctor))
    }

    /// The canonical empty node: what a stateless function that returns
    /// nothing resolves to.
    pub fn empty() -> Self {
        Self::text("")
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builder
    // ─────────────────────────────────────────────────────────────────────────

    /// Set an attribute.
    pub fn attr(mut self, name: impl Into<CompactString>, value: impl Into<AttrValue>) -> Self {
        self.attrs.set_attr(name, value);
        self
    }

    /// Set the reconciliation key.
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Attach a ref callback.
    pub fn with_ref(mut self, f: impl Fn(Option<NodeId>) + 'static) -> Self {
        self.vref = Some(RefCallback::new(f));
        self
    }

    /// Append a child description.
    pub fn child(mut self, child: VNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append several child descriptions.
    pub fn children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        self.children.extend(children);
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    /// The tag name, if this is a host-element description.
    pub fn tag(&self) -> Option<&str> {
        match &self.kind {
            VKind::Element(tag) => Some(tag),
            _ => None,
        }
    }

    /// Reconstruct component-style props from this node: its attributes
    /// plus key plus children, as handed to stateless functions and the
    /// component system.
    pub fn props(&self) -> Props {
        Props {
            attrs: self.attrs.clone(),
            key: self.key.clone(),
            children: self.children.clone(),
        }
    }
}

// =============================================================================
// Props
// =============================================================================

/// Attributes-plus-children bundle for stateless functions and components.
#[derive(Debug, Clone, Default)]
pub struct Props {
    /// Attribute mapping of the originating virtual node.
    pub attrs: Attrs,
    /// Key of the originating virtual node.
    pub key: Option<Key>,
    /// Children of the originating virtual node.
    pub children: Vec<VNode>,
}

impl Props {
    /// Get an attribute's string content by name.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.attrs.get_str(name)
    }
}

// =============================================================================
// Tests
// =============================================================================
