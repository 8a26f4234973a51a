//! Attribute system for host elements and virtual nodes.
//!
//! Attributes are ordered key/value pairs; the reconciler diffs a new
//! mapping against the cached previous one, so `Attrs` stays a plain
//! `Vec` with an extension trait rather than a map type. `AttrValue::Null`
//! is the removal sentinel: a name explicitly set to `Null` is treated as
//! absent by the attribute differ.

use std::fmt;

use compact_str::CompactString;

// =============================================================================
// AttrValue
// =============================================================================

/// Value of a single attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Removal sentinel: diffing treats the attribute as absent.
    Null,
    /// Boolean attribute (`checked`, `disabled`, ...).
    Bool(bool),
    /// Ordinary string-valued attribute.
    Text(CompactString),
}

impl AttrValue {
    /// Check if this is the removal sentinel.
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    /// Get the string content, if this is a text value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(t) => Some(t),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(CompactString::from(value))
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(CompactString::from(value))
    }
}

impl From<CompactString> for AttrValue {
    fn from(value: CompactString) -> Self {
        AttrValue::Text(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Null => Ok(()),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Text(t) => write!(f, "{t}"),
        }
    }
}

// =============================================================================
// Attrs
// =============================================================================

/// Element attributes as ordered key-value pairs.
pub type Attrs = Vec<(CompactString, AttrValue)>;

/// Extension trait for attribute operations on [`Attrs`].
pub trait AttrsExt {
    /// Get an attribute value by name.
    fn get_attr(&self, name: &str) -> Option<&AttrValue>;

    /// Get an attribute's string content by name.
    fn get_str(&self, name: &str) -> Option<&str>;

    /// Check if an attribute exists.
    fn has_attr(&self, name: &str) -> bool;

    /// Set an attribute value (insert or update).
    fn set_attr(&mut self, name: impl Into<CompactString>, value: impl Into<AttrValue>);

    /// Remove an attribute by name, returning the old value if present.
    fn remove_attr(&mut self, name: &str) -> Option<AttrValue>;
}

impl AttrsExt for Attrs {
    fn get_attr(&self, name: &str) -> Option<&AttrValue> {
        self.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    fn get_str(&self, name: &str) -> Option<&str> {
        self.get_attr(name).and_then(AttrValue::as_str)
    }

    fn has_attr(&self, name: &str) -> bool {
        self.iter().any(|(k, _)| k == name)
    }

    fn set_attr(&mut self, name: impl Into<CompactString>, value: impl Into<AttrValue>) {
        let name = name.into();
        let value = value.into();
        if let Some(attr) = self.iter_mut().find(|(k, _)| k == &name) {
            attr.1 = value;
        } else {
            self.push((name, value));
        }
    }

    fn remove_attr(&mut self, name: &str) -> Option<AttrValue> {
        self.iter()
            .position(|(k, _)| k == name)
            .map(|pos| self.remove(pos).1)
    }
}

// =============================================================================
// Tests
// =============================================================================
