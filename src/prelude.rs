//! Prelude module for common imports.
//!
//! ```ignore
//! use rivet_dom::prelude::*;
//! ```

// Virtual tree
pub use crate::vnode::{Key, Props, RefCallback, StatelessFn, VKind, VNode};

// Attributes
pub use crate::attr::{AttrValue, Attrs, AttrsExt};

// Host tree
pub use crate::host::{
    HostDocument, MutationStats, Namespace, NodeId, NodeKind, NodeMeta,
};

// Reconciliation
pub use crate::reconcile::Reconciler;
pub use crate::recycler::{Recycler, RecyclerConfig};
pub use crate::shared::SharedReconciler;

// Component boundary
pub use crate::component::{
    ComponentLink, ComponentSystem, Context, CtorId, InstanceId, NullComponents,
};

// Error types
pub use crate::error::{DomError, DomResult};
