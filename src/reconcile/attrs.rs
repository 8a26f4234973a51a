//! Attribute differ.
//!
//! Diffs a virtual node's attribute mapping against the cached previous
//! mapping on the host node's metadata, applying only the deltas. The
//! cache is mutated in place and becomes the new previous side.

use compact_str::CompactString;

use crate::attr::{Attrs, AttrsExt};
use crate::error::DomResult;
use crate::host::{HostDocument, Namespace, NodeId};

/// Names that never reach host attribute storage: they describe children
/// or inject raw markup, concerns owned outside this core.
const RESERVED: &[&str] = &["children", "innerHTML"];

/// Attributes reflecting live host state that user interaction can change
/// between diffs; compared against the host's current value, not the
/// cache.
const VOLATILE: &[&str] = &["value", "checked"];

/// Apply attribute deltas between the cached previous mapping and
/// `new_attrs` to the host element.
pub(crate) fn diff_attributes(
    doc: &mut HostDocument,
    node: NodeId,
    new_attrs: &Attrs,
    svg: bool,
) -> DomResult<()> {
    let namespace = if svg { Namespace::Svg } else { Namespace::Html };

    // Removals: cached names missing from the new mapping, or explicitly
    // set to the removal sentinel.
    let cached_names: Vec<CompactString> = doc
        .meta(node)
        .map(|m| m.cached_attrs.iter().map(|(k, _)| k.clone()).collect())
        .unwrap_or_default();
    for name in cached_names {
        let gone = match new_attrs.get_attr(&name) {
            None => true,
            Some(value) => value.is_null(),
        };
        if gone {
            doc.remove_attr(node, &name)?;
            if let Some(meta) = doc.meta_mut(node) {
                meta.cached_attrs.remove_attr(&name);
            }
        }
    }

    // Updates: write only when the value differs from the previous one.
    for (name, value) in new_attrs {
        if value.is_null() || RESERVED.contains(&name.as_str()) {
            continue;
        }
        let differs = if VOLATILE.contains(&name.as_str()) {
            doc.attr(node, name) != Some(value)
        } else {
            doc.meta(node).and_then(|m| m.cached_attrs.get_attr(name)) != Some(value)
        };
        if differs {
            doc.set_attr_ns(node, name.clone(), value.clone(), namespace)?;
            if let Some(meta) = doc.meta_mut(node) {
                meta.cached_attrs.set_attr(name.clone(), value.clone());
            }
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
