//! Host node storage types.
//!
//! An element that has passed through the reconciler carries a
//! [`NodeMeta`]: the attached metadata that is not part of the host
//! platform's native node shape. Its presence marks a node as managed;
//! nodes without it (e.g. server-rendered markup being hydrated) are
//! foreign until first encountered.

use compact_str::CompactString;
use smallvec::SmallVec;

use super::{Namespace, NodeId};
use crate::attr::Attrs;
use crate::component::ComponentLink;
use crate::vnode::{Key, RefCallback};

/// Child-list collection for element nodes.
pub type ChildList = SmallVec<[NodeId; 8]>;

/// A node in the host tree: either element or text.
#[derive(Debug, Clone)]
pub enum HostNode {
    Element(HostElement),
    Text(HostText),
}

/// Element node: tag, namespace, live attribute storage, children, and
/// optional attached metadata.
#[derive(Debug, Clone)]
pub struct HostElement {
    /// Tag name as created (original casing preserved).
    pub tag: CompactString,
    /// Namespace the element was created in.
    pub namespace: Namespace,
    /// The host platform's live attribute storage.
    pub attrs: Attrs,
    /// Ordered child handles.
    pub children: ChildList,
    /// Attached reconciler metadata; `None` means unmanaged/foreign.
    pub meta: Option<Box<NodeMeta>>,
}

/// Leaf text node.
#[derive(Debug, Clone)]
pub struct HostText {
    /// Current text value.
    pub value: CompactString,
    /// Whether this node was produced (or adopted) by the reconciler.
    pub managed: bool,
}

/// Metadata the reconciler attaches to an element node it manages.
#[derive(Debug, Clone, Default)]
pub struct NodeMeta {
    /// Cached copy of currently-applied attributes: the "previous" side
    /// of attribute diffing, so diffs never re-read host storage.
    pub cached_attrs: Attrs,
    /// Back-reference to the attached component instance, if any.
    pub component: Option<ComponentLink>,
    /// Normalized (lowercased) tag name, stamped by the recycler; empty
    /// until first stamped.
    pub normalized_tag: CompactString,
    /// The key applied by the last diff of this node.
    pub key: Option<Key>,
    /// The ref callback applied by the last diff, invoked with `None` on
    /// reclamation.
    pub ref_cb: Option<RefCallback>,
}
