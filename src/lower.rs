//! Lowering
//!
//! A typed [`Expr`] lowers to host operations through a [`Backend`]. The
//! contract every backend relies on:
//!
//! - opaque casts vanish, `new T(x)` lowers exactly like `x`
//! - `with(h)` on a member lowers to one property read of `h`
//! - call arguments are lowered left to right, variadic groups expanded in place
//! - class objects never lower
//! - `instanceof` follows [`InstanceOfPolicy`]

use log::trace;
use unicode_xid::UnicodeXID;

use crate::config::{InstanceOfPolicy, LoweringConfig};
use crate::error::BindError;
use crate::expr::{Expr, HostOp, Literal, OpKind};
use crate::registry::MemberId;
use crate::value::JsString;

/// Host-side interpretation of lowered operations
pub trait Backend {
    type Output;

    /// The implicit default target, `None` when static members are bare names
    fn global(&mut self, target: Option<&str>) -> Result<Self::Output, BindError>;

    /// A named host value
    fn reference(&mut self, name: &JsString) -> Result<Self::Output, BindError>;

    fn literal(&mut self, literal: &Literal) -> Result<Self::Output, BindError>;

    fn get(&mut self, target: Self::Output, member: &MemberId) -> Result<Self::Output, BindError>;

    fn set(
        &mut self,
        target: Self::Output,
        member: &MemberId,
        value: Self::Output,
    ) -> Result<Self::Output, BindError>;

    fn call(
        &mut self,
        target: Self::Output,
        member: &MemberId,
        args: Vec<Self::Output>,
    ) -> Result<Self::Output, BindError>;

    /// `true`, after evaluating `operand` for its effects when one is given
    fn always_true(&mut self, operand: Option<Self::Output>) -> Result<Self::Output, BindError>;

    /// Called on a call receiver before any argument is lowered
    fn receiver(&mut self, target: Self::Output) -> Result<Self::Output, BindError> {
        Ok(target)
    }

    /// Called on each call argument as soon as it is lowered
    fn argument(&mut self, value: Self::Output) -> Result<Self::Output, BindError> {
        Ok(value)
    }
}

/// Lower `expr` through `backend`
pub fn lower<B: Backend>(
    expr: &Expr,
    backend: &mut B,
    config: &LoweringConfig,
) -> Result<B::Output, BindError> {
    Lowering { backend, config }.lower(expr)
}

/// Lower to host-language source text
pub fn to_js(expr: &Expr, config: &LoweringConfig) -> Result<String, BindError> {
    lower(expr, &mut JsEmitter, config).map(|fragment| fragment.code)
}

struct Lowering<'a, B: Backend> {
    backend: &'a mut B,
    config: &'a LoweringConfig,
}

impl<B: Backend> Lowering<'_, B> {
    fn lower(&mut self, expr: &Expr) -> Result<B::Output, BindError> {
        match expr.erased() {
            Expr::Ident(name) => self.backend.reference(name),
            Expr::Global => self.backend.global(self.config.default_target.as_deref()),
            Expr::Literal(literal) => self.backend.literal(literal),
            Expr::Op(op) => self.lower_op(op),
            Expr::ClassOf(type_name) => Err(BindError::translation_error(format!(
                "The class object of opaque type '{}' has no host representation",
                type_name
            ))),
            Expr::InstanceOf(test) => match self.config.instanceof {
                InstanceOfPolicy::Reject => Err(BindError::translation_error(format!(
                    "instanceof against opaque type '{}' is not supported",
                    test.type_name
                ))),
                InstanceOfPolicy::AlwaysTrue => {
                    if test.value.is_pure() {
                        self.backend.always_true(None)
                    } else {
                        let operand = self.lower(&test.value)?;
                        self.backend.always_true(Some(operand))
                    }
                }
            },
            // erased() never returns a cast
            Expr::Wrap(wrap) => self.lower(&wrap.value),
        }
    }

    fn lower_op(&mut self, op: &HostOp) -> Result<B::Output, BindError> {
        trace!("lowering {:?} {}", op.kind, op.member);
        let target = self.lower(&op.target)?;
        match op.kind {
            OpKind::Get => self.backend.get(target, &op.member),
            OpKind::Set => {
                let mut values = op.positional_args();
                let (Some(value), None) = (values.next(), values.next()) else {
                    return Err(BindError::translation_error(format!(
                        "Assignment to '{}' needs exactly one value",
                        op.member
                    )));
                };
                let value = self.lower(value)?;
                self.backend.set(target, &op.member, value)
            }
            OpKind::Call => {
                let target = self.backend.receiver(target)?;
                let args = op
                    .positional_args()
                    .map(|arg| {
                        let value = self.lower(arg)?;
                        self.backend.argument(value)
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                self.backend.call(target, &op.member, args)
            }
        }
    }
}

// ============ SOURCE EMITTER ============

/// Binding strength of an emitted fragment, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Assignment,
    Unary,
    Member,
}

/// Host-language source for one lowered expression
#[derive(Debug, Clone, PartialEq)]
pub struct JsFragment {
    pub code: String,
    pub precedence: Precedence,
}

impl JsFragment {
    fn new(code: impl Into<String>, precedence: Precedence) -> Self {
        Self {
            code: code.into(),
            precedence,
        }
    }

    /// Source usable where at least `min` binding strength is required
    fn at_least(self, min: Precedence) -> String {
        if self.precedence >= min {
            self.code
        } else {
            format!("({})", self.code)
        }
    }

    /// Prefix for a member access; empty for bare global names
    fn receiver(self, member: &MemberId) -> String {
        let name = member.name().as_str();
        let property = if is_identifier(name) {
            format!(".{}", name)
        } else {
            format!("[{}]", quote(name))
        };
        if self.code.is_empty() {
            if is_identifier(name) {
                name.to_string()
            } else {
                format!("globalThis{}", property)
            }
        } else {
            format!("{}{}", self.at_least(Precedence::Member), property)
        }
    }
}

/// Emits source text; lowering the same expression twice yields identical text
#[derive(Debug, Default, Clone, Copy)]
pub struct JsEmitter;

impl Backend for JsEmitter {
    type Output = JsFragment;

    fn global(&mut self, target: Option<&str>) -> Result<JsFragment, BindError> {
        Ok(JsFragment::new(target.unwrap_or(""), Precedence::Member))
    }

    fn reference(&mut self, name: &JsString) -> Result<JsFragment, BindError> {
        if !is_identifier(name.as_str()) {
            return Err(BindError::translation_error(format!(
                "'{}' is not a valid host identifier",
                name
            )));
        }
        Ok(JsFragment::new(name.as_str(), Precedence::Member))
    }

    fn literal(&mut self, literal: &Literal) -> Result<JsFragment, BindError> {
        Ok(match literal {
            Literal::String(s) => JsFragment::new(quote(s.as_str()), Precedence::Member),
            Literal::Number(n) => number_fragment(*n),
            Literal::Boolean(b) => JsFragment::new(b.to_string(), Precedence::Member),
            Literal::Null => JsFragment::new("null", Precedence::Member),
            Literal::Undefined => JsFragment::new("undefined", Precedence::Member),
        })
    }

    fn get(&mut self, target: JsFragment, member: &MemberId) -> Result<JsFragment, BindError> {
        Ok(JsFragment::new(target.receiver(member), Precedence::Member))
    }

    fn set(
        &mut self,
        target: JsFragment,
        member: &MemberId,
        value: JsFragment,
    ) -> Result<JsFragment, BindError> {
        Ok(JsFragment::new(
            format!(
                "{} = {}",
                target.receiver(member),
                value.at_least(Precedence::Assignment)
            ),
            Precedence::Assignment,
        ))
    }

    fn call(
        &mut self,
        target: JsFragment,
        member: &MemberId,
        args: Vec<JsFragment>,
    ) -> Result<JsFragment, BindError> {
        let args: Vec<String> = args
            .into_iter()
            .map(|arg| arg.at_least(Precedence::Assignment))
            .collect();
        Ok(JsFragment::new(
            format!("{}({})", target.receiver(member), args.join(", ")),
            Precedence::Member,
        ))
    }

    fn always_true(&mut self, operand: Option<JsFragment>) -> Result<JsFragment, BindError> {
        Ok(match operand {
            None => JsFragment::new("true", Precedence::Member),
            Some(operand) => JsFragment::new(
                format!("({}, true)", operand.at_least(Precedence::Assignment)),
                Precedence::Member,
            ),
        })
    }
}

fn number_fragment(n: f64) -> JsFragment {
    if n.is_nan() {
        return JsFragment::new("NaN", Precedence::Member);
    }
    if n.is_infinite() {
        return if n > 0.0 {
            JsFragment::new("Infinity", Precedence::Member)
        } else {
            JsFragment::new("-Infinity", Precedence::Unary)
        };
    }
    // `1.toFixed()` does not parse, so numbers as receivers need parens
    JsFragment::new(n.to_string(), Precedence::Unary)
}

/// Double-quoted host string literal
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for ch in s.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first == '$' || first.is_xid_start() => {
            chars.all(|c| c == '$' || c.is_xid_continue())
        }
        _ => false,
    }
}
