//! Member identifier registry
//!
//! Hands out one canonical [`MemberId`] per (declaring type, name) pair. A name
//! looked up from a subtype resolves to the identifier of the ancestor that
//! first declared it, so `HTMLFormElement.title` and `HTMLElement.title` are the
//! same member.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::string_dict::StringDict;
use crate::value::{CheapClone, FxIndexMap, JsString};

/// Owner used for members reached through untyped (dynamic) receivers
pub const DYNAMIC_OWNER: &str = "Object";

/// Immutable symbolic name of a host property or method
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MemberId {
    owner: JsString,
    name: JsString,
}

impl CheapClone for MemberId {}

impl MemberId {
    pub fn new(owner: JsString, name: JsString) -> Self {
        Self { owner, name }
    }

    /// Identifier for a member of an untyped host value
    pub fn dynamic(name: JsString) -> Self {
        Self {
            owner: JsString::from(DYNAMIC_OWNER),
            name,
        }
    }

    /// The host-side property or method name
    pub fn name(&self) -> &JsString {
        &self.name
    }

    /// The type that declared the member
    pub fn owner(&self) -> &JsString {
        &self.owner
    }
}

impl fmt::Debug for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemberId({}.{})", self.owner, self.name)
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}

pub struct MemberRegistry {
    dict: StringDict,
    parents: FxHashMap<JsString, Option<JsString>>,
    /// Members in declaration order, keyed by declaring type
    declared: FxIndexMap<JsString, FxIndexMap<JsString, MemberId>>,
}

impl MemberRegistry {
    pub fn new() -> Self {
        Self::with_dict(StringDict::with_common_strings())
    }

    pub fn with_dict(dict: StringDict) -> Self {
        Self {
            dict,
            parents: FxHashMap::default(),
            declared: FxIndexMap::default(),
        }
    }

    pub fn intern(&mut self, s: &str) -> JsString {
        self.dict.get_or_insert(s)
    }

    /// Record a type and its parent. Re-declaring a type replaces its parent.
    pub fn declare_type(&mut self, name: &str, parent: Option<&str>) -> JsString {
        let name = self.intern(name);
        let parent = parent.map(|p| self.intern(p));
        self.parents.insert(name.cheap_clone(), parent);
        name
    }

    pub fn has_type(&self, name: &str) -> bool {
        self.parents.contains_key(name)
    }

    /// Canonical identifier for `name` as seen from `ty`.
    ///
    /// Returns the identifier declared by `ty` or its nearest ancestor; when no
    /// type in the chain declared `name`, a new identifier owned by `ty` is created.
    pub fn id(&mut self, ty: &str, name: &str) -> MemberId {
        if let Some(existing) = self.lookup(ty, name) {
            return existing.cheap_clone();
        }

        let owner = if self.has_type(ty) {
            self.intern(ty)
        } else {
            self.declare_type(ty, None)
        };
        let name = self.intern(name);
        let id = MemberId::new(owner.cheap_clone(), name.cheap_clone());
        self.declared
            .entry(owner)
            .or_default()
            .insert(name, id.cheap_clone());
        id
    }

    /// Look up an identifier through the inheritance chain without inserting
    pub fn lookup(&self, ty: &str, name: &str) -> Option<&MemberId> {
        self.ancestors(ty)
            .into_iter()
            .find_map(|t| self.declared.get(t.as_str()).and_then(|m| m.get(name)))
    }

    /// `ty` followed by its ancestors, nearest first. Stops on cycles.
    pub fn ancestors(&self, ty: &str) -> Vec<JsString> {
        let mut chain = Vec::new();
        let mut seen = FxHashSet::default();
        let mut current = self.parents.get_key_value(ty).map(|(k, _)| k.cheap_clone());

        while let Some(t) = current {
            if !seen.insert(t.cheap_clone()) {
                break;
            }
            current = self.parents.get(t.as_str()).cloned().flatten();
            chain.push(t);
        }
        chain
    }

    pub fn is_subtype(&self, ty: &str, ancestor: &str) -> bool {
        self.ancestors(ty).iter().any(|t| t == &ancestor)
    }

    /// Identifiers declared directly by `ty`, in declaration order
    pub fn declared_by(&self, ty: &str) -> impl Iterator<Item = &MemberId> {
        self.declared.get(ty).into_iter().flat_map(|m| m.values())
    }

    /// Total number of distinct identifiers
    pub fn len(&self) -> usize {
        self.declared.values().map(|m| m.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemberRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ancestors_stop_on_cycle() {
        let mut registry = MemberRegistry::new();
        registry.declare_type("A", Some("B"));
        registry.declare_type("B", Some("A"));
        let chain = registry.ancestors("A");
        assert_eq!(chain.len(), 2);
    }

    #[test]
    fn test_unknown_type_is_declared_on_first_use() {
        let mut registry = MemberRegistry::new();
        let id = registry.id("Location", "href");
        assert!(registry.has_type("Location"));
        assert_eq!(id.owner(), &"Location");
    }
}
