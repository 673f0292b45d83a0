//! Parser for binding schemas and binding expressions
//!
//! Recursive descent over the shared token stream.

use std::rc::Rc;

use crate::ast::*;
use crate::error::BindError;
use crate::lexer::{Lexer, Span, Token, TokenKind};
use crate::string_dict::StringDict;
use crate::value::{CheapClone, JsString};

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
    previous: Token,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, string_dict: &'a mut StringDict) -> Self {
        let mut lexer = Lexer::new(source, string_dict);
        let current = lexer.next_token();
        Self {
            lexer,
            current,
            previous: Token::eof(0, 1, 1),
        }
    }

    #[inline]
    fn intern(&mut self, s: &str) -> JsString {
        self.lexer.string_dict().get_or_insert(s)
    }

    /// Parse a complete schema file
    pub fn parse_schema(&mut self) -> Result<SchemaFile, BindError> {
        let mut interfaces = Vec::new();

        while !self.is_at_end() {
            interfaces.push(self.parse_interface()?);
        }

        Ok(SchemaFile { interfaces })
    }

    /// Parse a single binding expression; trailing tokens are an error
    pub fn parse_expression_only(&mut self) -> Result<Expression, BindError> {
        let expr = self.parse_expression()?;
        self.match_token(&TokenKind::Semicolon);
        if !self.is_at_end() {
            return Err(self.unexpected_token("end of expression"));
        }
        Ok(expr)
    }

    // ============ SCHEMA ============

    fn parse_interface(&mut self) -> Result<InterfaceDecl, BindError> {
        let start = self.current.span;
        let attributes = self.parse_extended_attributes()?;

        self.require_token(&TokenKind::Interface)?;
        let name = self.parse_identifier()?;

        let parent = if self.match_token(&TokenKind::Colon) {
            Some(self.parse_identifier()?)
        } else {
            None
        };

        self.require_token(&TokenKind::LBrace)?;
        let mut members = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            members.push(self.parse_member()?);
        }
        self.require_token(&TokenKind::RBrace)?;
        self.match_token(&TokenKind::Semicolon);

        let span = self.span_from(start);
        Ok(InterfaceDecl {
            name,
            parent,
            attributes,
            members,
            span,
        })
    }

    fn parse_extended_attributes(&mut self) -> Result<Vec<ExtendedAttribute>, BindError> {
        let mut attributes = vec![];
        if !self.match_token(&TokenKind::LBracket) {
            return Ok(attributes);
        }

        loop {
            let start = self.current.span;
            let name = self.parse_identifier()?;
            let value = if self.match_token(&TokenKind::Eq) {
                let first = self.parse_identifier()?;
                if self.match_token(&TokenKind::Dot) {
                    let second = self.parse_name()?;
                    Some(ExtendedValue::Path(first, second))
                } else {
                    Some(ExtendedValue::Identifier(first))
                }
            } else {
                None
            };
            let span = self.span_from(start);
            attributes.push(ExtendedAttribute { name, value, span });

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }

        self.require_token(&TokenKind::RBracket)?;
        Ok(attributes)
    }

    fn parse_member(&mut self) -> Result<MemberDecl, BindError> {
        let start = self.current.span;
        let is_static = self.match_token(&TokenKind::Static);
        let readonly = self.match_token(&TokenKind::Readonly);

        if self.match_token(&TokenKind::Attribute) {
            let ty = self.parse_type_ref()?;
            let name = self.parse_name()?;
            self.require_token(&TokenKind::Semicolon)?;
            let span = self.span_from(start);
            return Ok(MemberDecl::Attribute(AttributeDecl {
                name,
                ty,
                readonly,
                is_static,
                span,
            }));
        }

        if readonly {
            return Err(self.error("'readonly' is only valid on attributes"));
        }

        let return_type = self.parse_type_ref()?;
        let name = self.parse_name()?;
        self.require_token(&TokenKind::LParen)?;
        let params = self.parse_params()?;
        self.require_token(&TokenKind::RParen)?;
        self.require_token(&TokenKind::Semicolon)?;

        let span = self.span_from(start);
        Ok(MemberDecl::Operation(OperationDecl {
            name,
            return_type,
            params,
            is_static,
            span,
        }))
    }

    fn parse_params(&mut self) -> Result<Vec<ParamDecl>, BindError> {
        let mut params = vec![];
        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            let start = self.current.span;
            let ty = self.parse_type_ref()?;
            let variadic = self.match_token(&TokenKind::DotDotDot);
            let name = self.parse_name()?;
            let span = self.span_from(start);
            params.push(ParamDecl {
                name,
                ty,
                variadic,
                span,
            });

            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        Ok(params)
    }

    fn parse_type_ref(&mut self) -> Result<TypeRef, BindError> {
        let name = self.parse_name()?;
        let nullable = self.match_token(&TokenKind::Question);
        Ok(TypeRef { name, nullable })
    }

    // ============ EXPRESSIONS ============

    pub fn parse_expression(&mut self) -> Result<Expression, BindError> {
        let start = self.current.span;
        let target = self.parse_instanceof_expression()?;

        if self.match_token(&TokenKind::Eq) {
            if !matches!(target, Expression::Member(_)) {
                return Err(BindError::syntax_error(
                    "Invalid assignment target",
                    start.line,
                    start.column,
                ));
            }
            let value = self.parse_expression()?;
            let span = self.span_from(start);
            return Ok(Expression::Assign(AssignExpression {
                target: Rc::new(target),
                value: Rc::new(value),
                span,
            }));
        }

        Ok(target)
    }

    fn parse_instanceof_expression(&mut self) -> Result<Expression, BindError> {
        let start = self.current.span;
        let mut value = self.parse_postfix_expression()?;

        while self.match_token(&TokenKind::Instanceof) {
            let type_name = self.parse_identifier()?;
            let span = self.span_from(start);
            value = Expression::InstanceOf(InstanceOfExpression {
                value: Rc::new(value),
                type_name,
                span,
            });
        }

        Ok(value)
    }

    fn parse_postfix_expression(&mut self) -> Result<Expression, BindError> {
        let start = self.current.span;
        let mut expr = self.parse_primary_expression()?;

        loop {
            if self.match_token(&TokenKind::Dot) {
                if self.match_token(&TokenKind::Class) {
                    expr = match expr {
                        Expression::Identifier(id) => Expression::ClassOf(id),
                        _ => return Err(self.error("'.class' requires a type name")),
                    };
                    continue;
                }
                let property = self.parse_name()?;
                let span = self.span_from(start);
                expr = Expression::Member(MemberExpression {
                    object: Rc::new(expr),
                    property,
                    span,
                });
            } else if self.match_token(&TokenKind::LParen) {
                let arguments = self.parse_arguments()?;
                let span = self.span_from(start);
                expr = Expression::Call(CallExpression {
                    callee: Rc::new(expr),
                    arguments,
                    span,
                });
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Parse call arguments; the opening parenthesis has been consumed
    fn parse_arguments(&mut self) -> Result<Vec<Expression>, BindError> {
        let mut arguments = vec![];
        while !self.check(&TokenKind::RParen) && !self.is_at_end() {
            arguments.push(self.parse_expression()?);
            if !self.match_token(&TokenKind::Comma) {
                break;
            }
        }
        self.require_token(&TokenKind::RParen)?;
        Ok(arguments)
    }

    fn parse_primary_expression(&mut self) -> Result<Expression, BindError> {
        let start = self.current.span;
        let literal = match &self.current.kind {
            TokenKind::Number(n) => Some(Literal::Number(*n)),
            TokenKind::String(s) => Some(Literal::String(s.cheap_clone())),
            TokenKind::True => Some(Literal::Boolean(true)),
            TokenKind::False => Some(Literal::Boolean(false)),
            TokenKind::Null => Some(Literal::Null),
            TokenKind::Undefined => Some(Literal::Undefined),
            _ => None,
        };
        if let Some(value) = literal {
            self.advance();
            return Ok(Expression::Literal(LiteralExpression { value, span: start }));
        }

        match &self.current.kind {
            TokenKind::Minus => {
                self.advance();
                match self.current.kind {
                    TokenKind::Number(n) => {
                        self.advance();
                        let span = self.span_from(start);
                        Ok(Expression::Literal(LiteralExpression {
                            value: Literal::Number(-n),
                            span,
                        }))
                    }
                    _ => Err(self.unexpected_token("number after '-'")),
                }
            }
            TokenKind::Identifier(_) => Ok(Expression::Identifier(self.parse_identifier()?)),
            TokenKind::New => {
                self.advance();
                let type_name = self.parse_identifier()?;
                self.require_token(&TokenKind::LParen)?;
                let arguments = self.parse_arguments()?;
                let span = self.span_from(start);
                Ok(Expression::New(NewExpression {
                    type_name,
                    arguments,
                    span,
                }))
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.require_token(&TokenKind::RParen)?;
                Ok(expr)
            }
            _ => Err(self.unexpected_token("expression")),
        }
    }

    // ============ HELPERS ============

    fn parse_identifier(&mut self) -> Result<Identifier, BindError> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.cheap_clone();
                let span = self.current.span;
                self.advance();
                Ok(Identifier { name, span })
            }
            _ => Err(self.unexpected_token("identifier")),
        }
    }

    /// A member or parameter name: identifiers plus any keyword
    fn parse_name(&mut self) -> Result<Identifier, BindError> {
        if let Some(text) = self.current.kind.keyword_text() {
            let span = self.current.span;
            let name = self.intern(text);
            self.advance();
            return Ok(Identifier { name, span });
        }
        self.parse_identifier()
    }

    fn advance(&mut self) {
        self.previous = std::mem::replace(&mut self.current, self.lexer.next_token());
    }

    fn require_token(&mut self, kind: &TokenKind) -> Result<(), BindError> {
        if self.check(kind) {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected_token(&format!("{:?}", kind)))
        }
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    fn span_from(&self, start: Span) -> Span {
        Span::new(
            start.start,
            self.previous.span.end,
            start.line,
            start.column,
        )
    }

    fn error(&self, message: &str) -> BindError {
        BindError::syntax_error(message, self.current.span.line, self.current.span.column)
    }

    fn unexpected_token(&self, expected: &str) -> BindError {
        BindError::syntax_error(
            format!("Unexpected {:?}, expected {}", self.current.kind, expected),
            self.current.span.line,
            self.current.span.column,
        )
    }
}
