//! Typed binding expressions
//!
//! Every front-end operation produces an [`Expr`]. The only node with host
//! semantics is [`HostOp`]: a tagged get-property, set-property or call-method
//! that a [`Backend`](crate::lower::Backend) interprets.

use std::rc::Rc;

pub use crate::ast::Literal;
use crate::registry::MemberId;
use crate::value::{CheapClone, JsString};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A host value referenced by name (`sheet`, `event`)
    Ident(JsString),
    /// The implicit default target (`window` in a browser)
    Global,
    Literal(Literal),
    /// Opaque cast. Erased by lowering.
    Wrap(Wrap),
    Op(HostOp),
    /// The class object of an opaque type; never translatable
    ClassOf(JsString),
    InstanceOf(InstanceOf),
}

// Children are Rc-shared, so cloning copies only the top node
impl CheapClone for Expr {}

#[derive(Debug, Clone, PartialEq)]
pub struct Wrap {
    pub type_name: JsString,
    pub value: Rc<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstanceOf {
    pub value: Rc<Expr>,
    pub type_name: JsString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Get,
    Set,
    Call,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HostOp {
    pub kind: OpKind,
    pub target: Rc<Expr>,
    pub member: MemberId,
    /// Set: exactly one value. Call: positional arguments.
    pub args: Rc<[Arg]>,
}

impl HostOp {
    /// Arguments in evaluation order with variadic groups expanded in place
    pub fn positional_args(&self) -> impl Iterator<Item = &Expr> {
        self.args.iter().flat_map(|arg| match arg {
            Arg::Value(expr) => std::slice::from_ref(expr).iter(),
            Arg::Variadic(exprs) => exprs.iter(),
        })
    }
}

/// A call argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Value(Expr),
    /// Trailing variable-argument group, expanded to positional arguments
    Variadic(Vec<Expr>),
}

impl From<Expr> for Arg {
    fn from(expr: Expr) -> Self {
        Arg::Value(expr)
    }
}

impl Expr {
    pub fn ident(name: impl Into<JsString>) -> Expr {
        Expr::Ident(name.into())
    }

    pub fn string(value: impl Into<JsString>) -> Expr {
        Expr::Literal(Literal::String(value.into()))
    }

    pub fn number(value: f64) -> Expr {
        Expr::Literal(Literal::Number(value))
    }

    pub fn boolean(value: bool) -> Expr {
        Expr::Literal(Literal::Boolean(value))
    }

    pub fn null() -> Expr {
        Expr::Literal(Literal::Null)
    }

    pub fn wrap(type_name: impl Into<JsString>, value: Expr) -> Expr {
        Expr::Wrap(Wrap {
            type_name: type_name.into(),
            value: Rc::new(value),
        })
    }

    pub fn get(target: Expr, member: MemberId) -> Expr {
        Expr::Op(HostOp {
            kind: OpKind::Get,
            target: Rc::new(target),
            member,
            args: Rc::from(Vec::new()),
        })
    }

    pub fn set(target: Expr, member: MemberId, value: Expr) -> Expr {
        Expr::Op(HostOp {
            kind: OpKind::Set,
            target: Rc::new(target),
            member,
            args: Rc::from(vec![Arg::Value(value)]),
        })
    }

    pub fn call(target: Expr, member: MemberId, args: Vec<Arg>) -> Expr {
        Expr::Op(HostOp {
            kind: OpKind::Call,
            target: Rc::new(target),
            member,
            args: args.into(),
        })
    }

    pub fn class_of(type_name: impl Into<JsString>) -> Expr {
        Expr::ClassOf(type_name.into())
    }

    pub fn instance_of(value: Expr, type_name: impl Into<JsString>) -> Expr {
        Expr::InstanceOf(InstanceOf {
            value: Rc::new(value),
            type_name: type_name.into(),
        })
    }

    /// Strip opaque casts
    pub fn erased(&self) -> &Expr {
        let mut expr = self;
        while let Expr::Wrap(wrap) = expr {
            expr = &wrap.value;
        }
        expr
    }

    /// True when evaluating the expression cannot run host code. Property
    /// reads are not pure: a getter may have side effects.
    pub fn is_pure(&self) -> bool {
        match self.erased() {
            Expr::Ident(_) | Expr::Global | Expr::Literal(_) | Expr::ClassOf(_) => true,
            Expr::Op(_) => false,
            Expr::InstanceOf(i) => i.value.is_pure(),
            Expr::Wrap(_) => false,
        }
    }
}

impl From<Literal> for Expr {
    fn from(literal: Literal) -> Self {
        Expr::Literal(literal)
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::number(value)
    }
}

impl From<bool> for Expr {
    fn from(value: bool) -> Self {
        Expr::boolean(value)
    }
}

impl From<JsString> for Expr {
    fn from(value: JsString) -> Self {
        Expr::string(value)
    }
}
