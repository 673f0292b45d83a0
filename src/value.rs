//! Value-level vocabulary shared by the schema, the descriptors and the backends.

use std::fmt;
use std::hash::BuildHasherDefault;
use std::rc::Rc;

use rustc_hash::FxHasher;

use serde::{Deserialize, Serialize};

/// Trait for types that have cheap (O(1), reference-counted) clones.
///
/// This makes it explicit when a clone only increments a reference count
/// (interned names, shared descriptors, expression nodes) as opposed to copying data.
pub trait CheapClone: Clone {
    /// Create a cheap (reference-counted) clone of this value.
    fn cheap_clone(&self) -> Self {
        self.clone()
    }
}

impl<T: ?Sized> CheapClone for Rc<T> {}

/// Insertion-ordered map with the Fx hasher
pub type FxIndexMap<K, V> = indexmap::IndexMap<K, V, BuildHasherDefault<FxHasher>>;

/// Reference-counted string used for every interned name in the crate
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsString(Rc<str>);

// JsString wraps Rc<str>, so clone is cheap (just reference count increment)
impl CheapClone for JsString {}

impl JsString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when both handles share the same allocation (interned together)
    pub fn ptr_eq(&self, other: &JsString) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl AsRef<str> for JsString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for JsString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for JsString {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for JsString {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString(s.into())
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        JsString(s.into())
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for JsString {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for JsString {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(JsString::from)
    }
}

/// Typed array element types understood by the schema
pub const TYPED_ARRAYS: &[&str] = &[
    "Int8Array",
    "Uint8Array",
    "Uint8ClampedArray",
    "Int16Array",
    "Uint16Array",
    "Int32Array",
    "Uint32Array",
    "Float32Array",
    "Float64Array",
];

/// The kind of value a host member produces or accepts.
///
/// This is the static tag carried by descriptors; nothing checks it at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "type", rename_all = "snake_case")]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    /// Reference to a host object of the named opaque type
    Object(JsString),
    Function,
    /// A typed array; the payload is the constructor name (or `typedarray`)
    TypedArray(JsString),
    Any,
    Void,
}

impl ValueKind {
    /// Map a schema type keyword or name to its kind.
    /// Anything that is not a builtin keyword is an object reference.
    pub fn from_type_name(name: &JsString) -> ValueKind {
        match name.as_str() {
            "string" | "DOMString" => ValueKind::String,
            "number" | "long" | "short" | "double" | "float" | "int" => ValueKind::Number,
            "boolean" => ValueKind::Boolean,
            "function" => ValueKind::Function,
            "any" => ValueKind::Any,
            "void" | "undefined" => ValueKind::Void,
            "typedarray" => ValueKind::TypedArray(name.cheap_clone()),
            n if TYPED_ARRAYS.contains(&n) => ValueKind::TypedArray(name.cheap_clone()),
            _ => ValueKind::Object(name.cheap_clone()),
        }
    }

    /// The opaque type name for object-valued kinds
    pub fn object_type(&self) -> Option<&JsString> {
        match self {
            ValueKind::Object(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, ValueKind::Object(_))
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::String => write!(f, "string"),
            ValueKind::Number => write!(f, "number"),
            ValueKind::Boolean => write!(f, "boolean"),
            ValueKind::Object(name) => write!(f, "{}", name),
            ValueKind::Function => write!(f, "function"),
            ValueKind::TypedArray(name) => write!(f, "{}", name),
            ValueKind::Any => write!(f, "any"),
            ValueKind::Void => write!(f, "void"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_kinds() {
        assert_eq!(ValueKind::from_type_name(&"string".into()), ValueKind::String);
        assert_eq!(ValueKind::from_type_name(&"long".into()), ValueKind::Number);
        assert_eq!(
            ValueKind::from_type_name(&"Float32Array".into()),
            ValueKind::TypedArray("Float32Array".into())
        );
    }

    #[test]
    fn test_interface_names_are_objects() {
        let kind = ValueKind::from_type_name(&"CSSRuleList".into());
        assert!(kind.is_object());
        assert_eq!(kind.object_type().map(|s| s.as_str()), Some("CSSRuleList"));
        assert_eq!(kind.to_string(), "CSSRuleList");
    }
}
