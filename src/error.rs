//! Error types for rivet-dom.
//!
//! The reconciliation algorithm itself has no error taxonomy: a malformed
//! virtual tree is a programming error and propagates. What *can* fail are
//! structural operations against the host document, and those failures
//! surface here and travel up through the reconciler unchanged: there are
//! no retries and no recovery.

use thiserror::Error;

use crate::component::CtorId;
use crate::host::NodeId;

/// Errors that can occur while mutating the host document.
#[derive(Debug, Error)]
pub enum DomError {
    /// An element-only operation was applied to a text node.
    #[error("node {0} is not an element")]
    NotAnElement(NodeId),

    /// A text-only operation was applied to an element node.
    #[error("node {0} is not a text node")]
    NotAText(NodeId),

    /// The insertion anchor is not a child of the target parent.
    #[error("node {child} is not a child of {parent}")]
    NotAChild {
        /// The anchor node that was expected under `parent`.
        child: NodeId,
        /// The parent the anchor was looked up in.
        parent: NodeId,
    },

    /// Attaching the node would make it its own ancestor.
    #[error("attaching {node} would create a cycle")]
    WouldCycle {
        /// The node whose attachment was rejected.
        node: NodeId,
    },

    /// A component-kind virtual node reached a component system that
    /// cannot build instances (see `NullComponents`).
    #[error("no component system can build constructor {0}")]
    NoComponentSystem(CtorId),
}

/// Result type alias for host-document and reconciliation operations.
pub type DomResult<T> = Result<T, DomError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomError::NotAnElement(NodeId::from_raw_parts(3, 1));
        assert_eq!(err.to_string(), "node #3.1 is not an element");

        let err = DomError::NotAChild {
            child: NodeId::from_raw_parts(4, 0),
            parent: NodeId::from_raw_parts(1, 0),
        };
        assert_eq!(err.to_string(), "node #4.0 is not a child of #1.0");

        let err = DomError::NoComponentSystem(CtorId::new(7));
        assert_eq!(err.to_string(), "no component system can build constructor ctor:7");
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DomError>();
    }
}
