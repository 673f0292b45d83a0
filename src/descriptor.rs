//! Member descriptors
//!
//! A descriptor is built once per type definition and shared by every use. It
//! has no per-instance state: binding to a concrete host value happens only
//! when it is applied with [`MemberDescriptor::with`].

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::expr::{Arg, Expr};
use crate::registry::MemberId;
use crate::value::{CheapClone, ValueKind};

/// Whether a member is read from an object or reached without one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberScope {
    Instance,
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum MemberShape {
    Attribute { readonly: bool },
    /// `arity` counts the fixed parameters; a variadic parameter comes after them
    Method { arity: usize, variadic: bool },
}

impl MemberShape {
    pub fn is_method(&self) -> bool {
        matches!(self, MemberShape::Method { .. })
    }

    /// Whether a call with `count` positional arguments fits this shape
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            MemberShape::Method { arity, variadic } => {
                if variadic {
                    count >= arity
                } else {
                    count == arity
                }
            }
            MemberShape::Attribute { .. } => false,
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct MemberDescriptor {
    id: MemberId,
    qualifier: Option<Rc<MemberDescriptor>>,
    kind: ValueKind,
    shape: MemberShape,
    scope: MemberScope,
}

impl MemberDescriptor {
    /// An unqualified instance member
    pub fn new(id: MemberId, kind: ValueKind, shape: MemberShape) -> Self {
        Self {
            id,
            qualifier: None,
            kind,
            shape,
            scope: MemberScope::Instance,
        }
    }

    /// An instance member, optionally reached through `qualifier` by `with_global`
    pub fn instance(
        qualifier: Option<Rc<MemberDescriptor>>,
        id: MemberId,
        kind: ValueKind,
        shape: MemberShape,
    ) -> Self {
        Self {
            qualifier,
            ..Self::new(id, kind, shape)
        }
    }

    /// A member of the global object
    pub fn global(id: MemberId, kind: ValueKind, shape: MemberShape) -> Self {
        Self::new(id, kind, shape).into_static()
    }

    /// Reach this member through `qualifier` when applied without a host value
    pub fn qualified(mut self, qualifier: Rc<MemberDescriptor>) -> Self {
        self.qualifier = Some(qualifier);
        self
    }

    pub fn into_static(mut self) -> Self {
        self.scope = MemberScope::Static;
        self
    }

    pub fn id(&self) -> &MemberId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.name().as_str()
    }

    pub fn qualifier(&self) -> Option<&Rc<MemberDescriptor>> {
        self.qualifier.as_ref()
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn shape(&self) -> MemberShape {
        self.shape
    }

    pub fn scope(&self) -> MemberScope {
        self.scope
    }

    pub fn is_static(&self) -> bool {
        self.scope == MemberScope::Static
    }

    /// Apply to a host value: `host.name`
    pub fn with(&self, host: impl Into<HostArg>) -> Expr {
        Expr::get(host.into().0, self.id.cheap_clone())
    }

    /// Apply against the implicit default target: `qualifier.name`, or `name`
    /// on the default target when there is no qualifier
    pub fn with_global(&self) -> Expr {
        Expr::get(self.global_target(), self.id.cheap_clone())
    }

    pub fn assign(&self, host: impl Into<HostArg>, value: impl Into<Expr>) -> Expr {
        Expr::set(host.into().0, self.id.cheap_clone(), value.into())
    }

    pub fn assign_global(&self, value: impl Into<Expr>) -> Expr {
        Expr::set(self.global_target(), self.id.cheap_clone(), value.into())
    }

    pub fn call(&self, host: impl Into<HostArg>, args: Vec<Arg>) -> Expr {
        Expr::call(host.into().0, self.id.cheap_clone(), args)
    }

    pub fn call_global(&self, args: Vec<Arg>) -> Expr {
        Expr::call(self.global_target(), self.id.cheap_clone(), args)
    }

    /// The expression this member is read from when no host value is given
    pub fn global_target(&self) -> Expr {
        match &self.qualifier {
            Some(qualifier) => qualifier.with_global(),
            None => Expr::Global,
        }
    }

    /// Dotted path from the default target, e.g. `history.length`
    pub fn global_path(&self) -> String {
        match &self.qualifier {
            Some(qualifier) => format!("{}.{}", qualifier.global_path(), self.name()),
            None => self.name().to_string(),
        }
    }
}

impl fmt::Debug for MemberDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemberDescriptor")
            .field("id", &self.id)
            .field("qualifier", &self.qualifier.as_ref().map(|q| q.global_path()))
            .field("kind", &self.kind)
            .field("shape", &self.shape)
            .field("scope", &self.scope)
            .finish()
    }
}

/// A host value a descriptor can be applied to: any expression or opaque wrapper
pub struct HostArg(pub Expr);

impl From<Expr> for HostArg {
    fn from(expr: Expr) -> Self {
        HostArg(expr)
    }
}

impl From<&Expr> for HostArg {
    fn from(expr: &Expr) -> Self {
        HostArg(expr.cheap_clone())
    }
}
