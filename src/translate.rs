//! Binding-expression translation
//!
//! Checks parsed binding expressions against a [`Schema`] and produces typed
//! [`Expr`] trees. Receivers with a known opaque type have their members looked
//! up through the inheritance chain; untyped receivers are dynamic.

use std::rc::Rc;

use log::warn;
use rustc_hash::FxHashMap;

use crate::ast::{
    AssignExpression, CallExpression, Expression, Identifier, Literal, MemberExpression,
};
use crate::config::LoweringConfig;
use crate::descriptor::{MemberDescriptor, MemberShape};
use crate::error::BindError;
use crate::expr::{Arg, Expr};
use crate::parser::Parser;
use crate::registry::{DYNAMIC_OWNER, MemberId};
use crate::schema::{Schema, Signature};
use crate::string_dict::StringDict;
use crate::value::{CheapClone, JsString, ValueKind};

/// A translated expression with its static type
#[derive(Debug, Clone, PartialEq)]
pub struct Typed {
    pub expr: Expr,
    pub kind: ValueKind,
    /// `null` or `undefined` literal
    pub nullish: bool,
}

impl Typed {
    fn new(expr: Expr, kind: ValueKind) -> Self {
        Self {
            expr,
            kind,
            nullish: false,
        }
    }

    fn is_dynamic(&self) -> bool {
        match &self.kind {
            ValueKind::Any => true,
            ValueKind::Object(name) => name == DYNAMIC_OWNER,
            _ => false,
        }
    }
}

pub struct Translator<'s> {
    schema: &'s Schema,
    config: &'s LoweringConfig,
    bindings: FxHashMap<JsString, ValueKind>,
    dict: StringDict,
}

impl<'s> Translator<'s> {
    pub fn new(schema: &'s Schema, config: &'s LoweringConfig) -> Self {
        Self {
            schema,
            config,
            bindings: FxHashMap::default(),
            dict: StringDict::with_common_strings(),
        }
    }

    /// Give a host reference a static type. `any` and `Object` make it dynamic.
    pub fn bind(&mut self, name: &str, type_name: &str) -> Result<(), BindError> {
        let kind = match type_name {
            "any" | DYNAMIC_OWNER => ValueKind::Any,
            _ => ValueKind::Object(self.resolve_type(type_name).ok_or_else(|| {
                BindError::translation_error(format!(
                    "Cannot bind '{}': unknown type '{}'",
                    name, type_name
                ))
            })?),
        };
        let name = self.dict.get_or_insert(name);
        self.bindings.insert(name, kind);
        Ok(())
    }

    /// Parse and translate one binding expression
    pub fn translate_source(&mut self, source: &str) -> Result<Typed, BindError> {
        let expression = Parser::new(source, &mut self.dict).parse_expression_only()?;
        self.translate(&expression)
    }

    pub fn translate(&mut self, expression: &Expression) -> Result<Typed, BindError> {
        match expression {
            Expression::Identifier(id) => self.translate_identifier(id),
            Expression::Literal(lit) => Ok(translate_literal(&lit.value)),
            Expression::New(new) => {
                let type_name = self.require_type(&new.type_name)?;
                let [argument] = new.arguments.as_slice() else {
                    return Err(BindError::translation_error(format!(
                        "new {}(..) wraps exactly one host value, got {} arguments",
                        new.type_name.name,
                        new.arguments.len()
                    )));
                };
                let value = self.translate(argument)?;
                if !(value.is_dynamic() || value.kind.is_object()) {
                    return Err(BindError::translation_error(format!(
                        "Cannot wrap a {} value as {}",
                        value.kind, type_name
                    )));
                }
                Ok(Typed::new(
                    Expr::wrap(type_name.cheap_clone(), value.expr),
                    ValueKind::Object(type_name),
                ))
            }
            Expression::Member(member) => self.translate_member(member),
            Expression::Call(call) => self.translate_call(call),
            Expression::Assign(assign) => self.translate_assign(assign),
            Expression::ClassOf(id) => {
                let type_name = self.require_type(id)?;
                Ok(Typed::new(Expr::class_of(type_name), ValueKind::Any))
            }
            Expression::InstanceOf(test) => {
                let type_name = self.require_type(&test.type_name)?;
                let value = self.translate(&test.value)?;
                Ok(Typed::new(
                    Expr::instance_of(value.expr, type_name),
                    ValueKind::Boolean,
                ))
            }
        }
    }

    fn translate_identifier(&mut self, id: &Identifier) -> Result<Typed, BindError> {
        if let Some(kind) = self.bindings.get(id.name.as_str()) {
            return Ok(Typed::new(Expr::Ident(id.name.cheap_clone()), kind.clone()));
        }
        if let Some(type_name) = self.resolve_type(id.name.as_str()) {
            return Err(BindError::translation_error(format!(
                "Type '{}' used as a value (did you mean {}.member.with(..)?)",
                type_name, id.name
            )));
        }
        Ok(Typed::new(Expr::Ident(id.name.cheap_clone()), ValueKind::Any))
    }

    /// `T.member`, `expr.member`
    fn translate_member(&mut self, member: &MemberExpression) -> Result<Typed, BindError> {
        if let Some(descriptor) = self.static_member(member)? {
            if !descriptor.is_static() {
                return Err(BindError::translation_error(format!(
                    "'{}' is an instance member: use {}.{}.with(value)",
                    descriptor.id(),
                    describe_object(&member.object),
                    member.property.name
                )));
            }
            reject_method_read(&descriptor)?;
            let kind = descriptor.kind().clone();
            return Ok(Typed::new(descriptor.with_global(), kind));
        }

        let receiver = self.translate(&member.object)?;
        let name = &member.property.name;
        match self.receiver_member(&receiver, name)? {
            Some(descriptor) => {
                reject_method_read(&descriptor)?;
                let kind = descriptor.kind().clone();
                Ok(Typed::new(descriptor.with(receiver.expr), kind))
            }
            None => Ok(Typed::new(
                Expr::get(receiver.expr, MemberId::dynamic(name.cheap_clone())),
                ValueKind::Any,
            )),
        }
    }

    fn translate_call(&mut self, call: &CallExpression) -> Result<Typed, BindError> {
        let Expression::Member(callee) = call.callee.as_ref() else {
            return Err(BindError::translation_error(
                "Only member calls are supported: expr.method(args)",
            ));
        };

        // T.member.with(expr) / T.member.with()
        if callee.property.name == "with" {
            if let Expression::Member(inner) = callee.object.as_ref() {
                if let Some(descriptor) = self.static_member(inner)? {
                    return self.translate_with(&descriptor, inner, &call.arguments);
                }
            }
        }

        // T.method(args) for static methods
        if let Some(descriptor) = self.static_member(callee)? {
            if !descriptor.is_static() {
                return Err(BindError::translation_error(format!(
                    "'{}' is an instance method and needs a receiver",
                    descriptor.id()
                )));
            }
            let (iface, name) = self.member_owner(callee)?;
            let signature = self.signature(&iface, &name);
            let args = self.translate_args(&descriptor, signature.as_ref(), &call.arguments)?;
            let returns = descriptor.kind().clone();
            return Ok(Typed::new(descriptor.call_global(args), returns));
        }

        let receiver = self.translate(&callee.object)?;
        let name = &callee.property.name;
        match self.receiver_member(&receiver, name)? {
            Some(descriptor) => {
                let owner = match &receiver.kind {
                    ValueKind::Object(ty) => ty.cheap_clone(),
                    _ => descriptor.id().owner().cheap_clone(),
                };
                let signature = self.signature(&owner, name);
                let args = self.translate_args(&descriptor, signature.as_ref(), &call.arguments)?;
                let returns = descriptor.kind().clone();
                Ok(Typed::new(descriptor.call(receiver.expr, args), returns))
            }
            None => {
                let args = call
                    .arguments
                    .iter()
                    .map(|a| self.translate(a).map(|t| Arg::Value(t.expr)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Typed::new(
                    Expr::call(receiver.expr, MemberId::dynamic(name.cheap_clone()), args),
                    ValueKind::Any,
                ))
            }
        }
    }

    fn translate_with(
        &mut self,
        descriptor: &MemberDescriptor,
        member: &MemberExpression,
        arguments: &[Expression],
    ) -> Result<Typed, BindError> {
        let kind = if descriptor.shape().is_method() {
            ValueKind::Function
        } else {
            descriptor.kind().clone()
        };
        match arguments {
            [] => Ok(Typed::new(descriptor.with_global(), kind)),
            [host] => {
                let (iface, _) = self.member_owner(member)?;
                let host = self.translate(host)?;
                if !self.accepts(&ValueKind::Object(iface.cheap_clone()), &host, false) {
                    return Err(BindError::translation_error(format!(
                        "{}.with(..) expects a {} value, got {}",
                        descriptor.id(),
                        iface,
                        host.kind
                    )));
                }
                Ok(Typed::new(descriptor.with(host.expr), kind))
            }
            _ => Err(BindError::translation_error(format!(
                "{}.with(..) takes at most one host value",
                descriptor.id()
            ))),
        }
    }

    fn translate_assign(&mut self, assign: &AssignExpression) -> Result<Typed, BindError> {
        let Expression::Member(target) = assign.target.as_ref() else {
            return Err(BindError::translation_error("Invalid assignment target"));
        };
        let value = self.translate(&assign.value)?;

        if let Some(descriptor) = self.static_member(target)? {
            if !descriptor.is_static() {
                return Err(BindError::translation_error(format!(
                    "'{}' is an instance member and needs a receiver",
                    descriptor.id()
                )));
            }
            let (iface, name) = self.member_owner(target)?;
            self.check_assignable(&descriptor, &iface, &name, &value)?;
            let kind = value.kind.clone();
            return Ok(Typed::new(descriptor.assign_global(value.expr), kind));
        }

        let receiver = self.translate(&target.object)?;
        let name = &target.property.name;
        match self.receiver_member(&receiver, name)? {
            Some(descriptor) => {
                let owner = descriptor.id().owner().cheap_clone();
                self.check_assignable(&descriptor, &owner, name, &value)?;
                let kind = value.kind.clone();
                Ok(Typed::new(descriptor.assign(receiver.expr, value.expr), kind))
            }
            None => {
                let kind = value.kind.clone();
                Ok(Typed::new(
                    Expr::set(
                        receiver.expr,
                        MemberId::dynamic(name.cheap_clone()),
                        value.expr,
                    ),
                    kind,
                ))
            }
        }
    }

    // ============ HELPERS ============

    /// Schema name for a type written in an expression, with or without the prefix
    pub fn resolve_type(&self, name: &str) -> Option<JsString> {
        if let Some(iface) = self.schema.interface(name) {
            return Some(iface.name.cheap_clone());
        }
        let stripped = self.config.strip_prefix(name)?;
        match self.schema.interface(stripped) {
            Some(iface) => Some(iface.name.cheap_clone()),
            None => {
                warn!(
                    "'{}' carries the type prefix '{}' but no interface '{}' exists",
                    name, self.config.type_prefix, stripped
                );
                None
            }
        }
    }

    fn require_type(&self, id: &Identifier) -> Result<JsString, BindError> {
        self.resolve_type(id.name.as_str()).ok_or_else(|| {
            BindError::translation_error(format!(
                "Unknown type '{}' at {}:{}",
                id.name, id.span.line, id.span.column
            ))
        })
    }

    /// Resolve `T.member` where `T` names a type rather than a bound value
    fn static_member(
        &self,
        member: &MemberExpression,
    ) -> Result<Option<Rc<MemberDescriptor>>, BindError> {
        let Expression::Identifier(id) = member.object.as_ref() else {
            return Ok(None);
        };
        if self.bindings.contains_key(id.name.as_str()) {
            return Ok(None);
        }
        let Some(type_name) = self.resolve_type(id.name.as_str()) else {
            return Ok(None);
        };
        self.schema
            .descriptor(type_name.as_str(), member.property.name.as_str())
            .map(Some)
            .ok_or_else(|| unknown_member(&type_name, &member.property.name))
    }

    fn member_owner(&self, member: &MemberExpression) -> Result<(JsString, JsString), BindError> {
        match member.object.as_ref() {
            Expression::Identifier(id) => Ok((
                self.require_type(id)?,
                member.property.name.cheap_clone(),
            )),
            _ => Err(BindError::translation_error("Expected Type.member")),
        }
    }

    /// Member of a typed receiver; `None` when the receiver is dynamic
    fn receiver_member(
        &self,
        receiver: &Typed,
        name: &JsString,
    ) -> Result<Option<Rc<MemberDescriptor>>, BindError> {
        if receiver.is_dynamic() {
            return Ok(None);
        }
        match &receiver.kind {
            ValueKind::Object(ty) => self
                .schema
                .descriptor(ty.as_str(), name.as_str())
                .map(Some)
                .ok_or_else(|| unknown_member(ty, name)),
            other => Err(BindError::translation_error(format!(
                "Cannot access '{}' on a {} value",
                name, other
            ))),
        }
    }

    fn signature(&self, ty: &JsString, name: &JsString) -> Option<Signature> {
        self.schema
            .find_member(ty.as_str(), name.as_str())
            .and_then(|(_, def)| def.signature.clone())
    }

    fn translate_args(
        &mut self,
        descriptor: &MemberDescriptor,
        signature: Option<&Signature>,
        arguments: &[Expression],
    ) -> Result<Vec<Arg>, BindError> {
        let MemberShape::Method { arity, variadic } = descriptor.shape() else {
            return Err(BindError::translation_error(format!(
                "'{}' is an attribute, not a method",
                descriptor.id()
            )));
        };
        if !descriptor.shape().accepts(arguments.len()) {
            let expected = if variadic {
                format!("at least {}", arity)
            } else {
                arity.to_string()
            };
            return Err(BindError::translation_error(format!(
                "'{}' expects {} arguments, got {}",
                descriptor.id(),
                expected,
                arguments.len()
            )));
        }

        let mut fixed = Vec::with_capacity(arity + 1);
        let mut rest = Vec::new();
        for (position, argument) in arguments.iter().enumerate() {
            let value = self.translate(argument)?;
            if let Some(param) = signature.and_then(|s| s.param_for(position)) {
                if !self.accepts(&param.kind, &value, param.nullable) {
                    return Err(BindError::translation_error(format!(
                        "Argument {} ('{}') of '{}' expects {}, got {}",
                        position + 1,
                        param.name,
                        descriptor.id(),
                        param.kind,
                        value.kind
                    )));
                }
            }
            if position < arity {
                fixed.push(Arg::Value(value.expr));
            } else {
                rest.push(value.expr);
            }
        }
        if variadic && !rest.is_empty() {
            fixed.push(Arg::Variadic(rest));
        }
        Ok(fixed)
    }

    fn check_assignable(
        &self,
        descriptor: &MemberDescriptor,
        ty: &JsString,
        name: &JsString,
        value: &Typed,
    ) -> Result<(), BindError> {
        match descriptor.shape() {
            MemberShape::Attribute { readonly: true } => {
                Err(BindError::translation_error(format!(
                    "Cannot assign to read-only attribute '{}'",
                    descriptor.id()
                )))
            }
            MemberShape::Method { .. } => Err(BindError::translation_error(format!(
                "Cannot assign to method '{}'",
                descriptor.id()
            ))),
            MemberShape::Attribute { readonly: false } => {
                let nullable = self
                    .schema
                    .find_member(ty.as_str(), name.as_str())
                    .is_some_and(|(_, def)| def.nullable);
                if self.accepts(descriptor.kind(), value, nullable) {
                    Ok(())
                } else {
                    Err(BindError::translation_error(format!(
                        "'{}' expects {}, got {}",
                        descriptor.id(),
                        descriptor.kind(),
                        value.kind
                    )))
                }
            }
        }
    }

    /// Whether `value` may flow into a slot of kind `expected`
    fn accepts(&self, expected: &ValueKind, value: &Typed, nullable: bool) -> bool {
        if value.nullish {
            return nullable || matches!(expected, ValueKind::Any);
        }
        if value.is_dynamic() {
            return true;
        }
        match (expected, &value.kind) {
            (ValueKind::Any, _) => true,
            (ValueKind::Object(want), ValueKind::Object(have)) => {
                want == DYNAMIC_OWNER || self.schema.is_subtype(have.as_str(), want.as_str())
            }
            (ValueKind::TypedArray(want), ValueKind::TypedArray(have)) => {
                want == "typedarray" || want == have
            }
            (want, have) => want == have,
        }
    }
}

fn translate_literal(literal: &Literal) -> Typed {
    let kind = match literal {
        Literal::String(_) => ValueKind::String,
        Literal::Number(_) => ValueKind::Number,
        Literal::Boolean(_) => ValueKind::Boolean,
        Literal::Null | Literal::Undefined => ValueKind::Any,
    };
    Typed {
        expr: Expr::Literal(literal.clone()),
        kind,
        nullish: matches!(literal, Literal::Null | Literal::Undefined),
    }
}

fn reject_method_read(descriptor: &MemberDescriptor) -> Result<(), BindError> {
    if descriptor.shape().is_method() {
        return Err(BindError::translation_error(format!(
            "Method '{}' must be called",
            descriptor.id()
        )));
    }
    Ok(())
}

fn unknown_member(ty: &JsString, name: &JsString) -> BindError {
    BindError::translation_error(format!("'{}' has no member '{}'", ty, name))
}

fn describe_object(expr: &Expression) -> String {
    match expr {
        Expression::Identifier(id) => id.name.to_string(),
        _ => "Type".to_string(),
    }
}
