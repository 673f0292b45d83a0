//! Syntax trees for binding schemas and binding expressions

use std::rc::Rc;

use crate::lexer::Span;
use crate::value::JsString;

#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: JsString,
    pub span: Span,
}

// ============ SCHEMA ============

/// A parsed schema file: a flat list of interface declarations
#[derive(Debug, Clone)]
pub struct SchemaFile {
    pub interfaces: Vec<InterfaceDecl>,
}

#[derive(Debug, Clone)]
pub struct InterfaceDecl {
    pub name: Identifier,
    pub parent: Option<Identifier>,
    pub attributes: Vec<ExtendedAttribute>,
    pub members: Vec<MemberDecl>,
    pub span: Span,
}

impl InterfaceDecl {
    pub fn extended_attribute(&self, name: &str) -> Option<&ExtendedAttribute> {
        self.attributes.iter().find(|a| a.name.name == name)
    }
}

/// `[Name]`, `[Name=value]` or `[Name=Type.member]`
#[derive(Debug, Clone)]
pub struct ExtendedAttribute {
    pub name: Identifier,
    pub value: Option<ExtendedValue>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExtendedValue {
    Identifier(Identifier),
    Path(Identifier, Identifier),
}

#[derive(Debug, Clone)]
pub enum MemberDecl {
    Attribute(AttributeDecl),
    Operation(OperationDecl),
}

impl MemberDecl {
    pub fn name(&self) -> &Identifier {
        match self {
            MemberDecl::Attribute(a) => &a.name,
            MemberDecl::Operation(o) => &o.name,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            MemberDecl::Attribute(a) => a.span,
            MemberDecl::Operation(o) => o.span,
        }
    }

    pub fn is_static(&self) -> bool {
        match self {
            MemberDecl::Attribute(a) => a.is_static,
            MemberDecl::Operation(o) => o.is_static,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AttributeDecl {
    pub name: Identifier,
    pub ty: TypeRef,
    pub readonly: bool,
    pub is_static: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct OperationDecl {
    pub name: Identifier,
    pub return_type: TypeRef,
    pub params: Vec<ParamDecl>,
    pub is_static: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ParamDecl {
    pub name: Identifier,
    pub ty: TypeRef,
    pub variadic: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TypeRef {
    pub name: Identifier,
    pub nullable: bool,
}

// ============ EXPRESSIONS ============

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(JsString),
    Number(f64),
    Boolean(bool),
    Null,
    Undefined,
}

#[derive(Debug, Clone)]
pub enum Expression {
    Identifier(Identifier),
    Literal(LiteralExpression),
    /// `new T(value)`: an opaque cast
    New(NewExpression),
    Member(MemberExpression),
    Call(CallExpression),
    Assign(AssignExpression),
    /// `T.class`
    ClassOf(Identifier),
    InstanceOf(InstanceOfExpression),
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Identifier(id) => id.span,
            Expression::Literal(lit) => lit.span,
            Expression::New(n) => n.span,
            Expression::Member(m) => m.span,
            Expression::Call(c) => c.span,
            Expression::Assign(a) => a.span,
            Expression::ClassOf(id) => id.span,
            Expression::InstanceOf(i) => i.span,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LiteralExpression {
    pub value: Literal,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct NewExpression {
    pub type_name: Identifier,
    pub arguments: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct MemberExpression {
    pub object: Rc<Expression>,
    pub property: Identifier,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CallExpression {
    pub callee: Rc<Expression>,
    pub arguments: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct AssignExpression {
    pub target: Rc<Expression>,
    pub value: Rc<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct InstanceOfExpression {
    pub value: Rc<Expression>,
    pub type_name: Identifier,
    pub span: Span,
}
